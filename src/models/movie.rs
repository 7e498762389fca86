use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub release_date: Option<NaiveDate>,
    /// Длительность в минутах.
    #[serde(default)]
    pub duration: Option<u32>,
}

/// Вкладки афиши: уже в прокате или скоро.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseStatus {
    Now,
    Upcoming,
}

impl Movie {
    /// Фильм без даты релиза считаем уже идущим.
    pub fn release_status(&self, today: NaiveDate) -> ReleaseStatus {
        match self.release_date {
            Some(date) if date > today => ReleaseStatus::Upcoming,
            _ => ReleaseStatus::Now,
        }
    }
}

/// Оставляет фильмы нужной вкладки, порядок каталога сохраняется.
pub fn filter_by_release(
    movies: Vec<Movie>,
    status: ReleaseStatus,
    today: NaiveDate,
) -> Vec<Movie> {
    movies
        .into_iter()
        .filter(|movie| movie.release_status(today) == status)
        .collect()
}

// Дата релиза приходит то как "2024-03-24", то как ISO timestamp
fn lenient_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveDate>, D::Error> {
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        s.get(..10)
            .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_mongo_style_payload() {
        let movie: Movie = serde_json::from_str(
            r#"{"_id":"65f1","title":"Exhuma","poster":"https://i.imgur.com/FHOtPWc.jpg",
                "release_date":"2024-03-24T00:00:00.000Z","duration":133}"#,
        )
        .unwrap();

        assert_eq!(movie.id, "65f1");
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(2024, 3, 24));
        assert_eq!(movie.duration, Some(133));
    }

    #[test]
    fn splits_now_showing_and_upcoming() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let movie = |id: &str, date: Option<NaiveDate>| Movie {
            id: id.to_string(),
            title: id.to_string(),
            poster: None,
            release_date: date,
            duration: None,
        };
        let movies = vec![
            movie("past", NaiveDate::from_ymd_opt(2024, 3, 24)),
            movie("today", Some(today)),
            movie("future", NaiveDate::from_ymd_opt(2024, 7, 26)),
            movie("undated", None),
        ];

        let now: Vec<String> = filter_by_release(movies.clone(), ReleaseStatus::Now, today)
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(now, ["past", "today", "undated"]);

        let upcoming = filter_by_release(movies, ReleaseStatus::Upcoming, today);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, "future");
    }

    #[test]
    fn missing_optional_fields() {
        let movie: Movie = serde_json::from_str(r#"{"id":"1","title":"Dune"}"#).unwrap();
        assert!(movie.poster.is_none());
        assert!(movie.release_date.is_none());
    }
}
