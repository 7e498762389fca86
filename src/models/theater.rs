use serde::{Deserialize, Serialize};

/// Кинотеатр сети: адрес и что в нём есть (IMAX, 4DX, VIP-зал...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theater {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facilities_are_optional() {
        let theater: Theater = serde_json::from_str(
            r#"{"_id":"t1","name":"My Cinema Quận 1","address":"123 Lê Lợi"}"#,
        )
        .unwrap();
        assert_eq!(theater.id, "t1");
        assert!(theater.facilities.is_empty());
        assert_eq!(theater.image, None);
    }
}
