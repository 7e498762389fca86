use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Сеанс: фильм в конкретном зале, дата + время начала.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Showtime {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theater_id: Option<String>,
    pub date: NaiveDate,
    #[serde(with = "clock_time")]
    pub time: NaiveTime,
}

/// Сеансы одного дня, как их показывает шаг выбора сеанса.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShowtimesOnDate {
    pub date: NaiveDate,
    pub showtimes: Vec<Showtime>,
}

/// Группирует сеансы по дате, дни и сеансы внутри дня по возрастанию.
pub fn group_by_date(showtimes: Vec<Showtime>) -> Vec<ShowtimesOnDate> {
    let mut days: BTreeMap<NaiveDate, Vec<Showtime>> = BTreeMap::new();
    for showtime in showtimes {
        days.entry(showtime.date).or_default().push(showtime);
    }

    days.into_iter()
        .map(|(date, mut showtimes)| {
            showtimes.sort_by_key(|s| s.time);
            ShowtimesOnDate { date, showtimes }
        })
        .collect()
}

// Бэкенд отдаёт время как "13:30", chrono по умолчанию ждёт секунды
mod clock_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn showtime(id: &str, date: &str, time: &str) -> Showtime {
        serde_json::from_value(serde_json::json!({ "id": id, "date": date, "time": time }))
            .unwrap()
    }

    #[test]
    fn parses_short_and_long_clock_time() {
        assert_eq!(
            showtime("1", "2024-04-04", "13:30").time,
            NaiveTime::from_hms_opt(13, 30, 0).unwrap()
        );
        assert_eq!(
            showtime("2", "2024-04-04", "15:45:00").time,
            NaiveTime::from_hms_opt(15, 45, 0).unwrap()
        );
    }

    #[test]
    fn serializes_time_without_seconds() {
        let json = serde_json::to_value(showtime("1", "2024-04-04", "20:15")).unwrap();
        assert_eq!(json["time"], "20:15");
        assert!(json.get("movieId").is_none());
    }

    #[test]
    fn groups_by_day_in_order() {
        let grouped = group_by_date(vec![
            showtime("7", "2024-04-05", "17:30"),
            showtime("3", "2024-04-04", "18:00"),
            showtime("1", "2024-04-04", "13:30"),
            showtime("6", "2024-04-05", "14:00"),
        ]);

        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].date, NaiveDate::from_ymd_opt(2024, 4, 4).unwrap());
        let first_day: Vec<&str> = grouped[0].showtimes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(first_day, vec!["1", "3"]);
        let second_day: Vec<&str> = grouped[1].showtimes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(second_day, vec!["6", "7"]);
    }
}
