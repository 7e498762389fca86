use serde::{Deserialize, Serialize};
use std::fmt;

/// Идентификатор места: буква ряда + номер, например `A1` или `H10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatId(String);

impl SeatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    Standard,
    Vip,
    Couple,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    Booked,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    #[serde(rename = "type", alias = "category")]
    pub category: SeatCategory,
    pub status: SeatStatus,
}

impl Seat {
    pub fn new(id: impl Into<String>, category: SeatCategory, status: SeatStatus) -> Self {
        Self {
            id: SeatId::new(id),
            category,
            status,
        }
    }
}

/// Цена места по категории. Суммы в донгах, без копеек.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatPricing {
    pub standard: u64,
    pub vip: u64,
    pub couple: u64,
}

impl SeatPricing {
    pub fn price_of(&self, category: SeatCategory) -> u64 {
        match category {
            SeatCategory::Standard => self.standard,
            SeatCategory::Vip => self.vip,
            SeatCategory::Couple => self.couple,
        }
    }
}

impl Default for SeatPricing {
    fn default() -> Self {
        Self {
            standard: 100_000,
            vip: 130_000,
            couple: 150_000,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeatCounts {
    pub available: usize,
    pub selected: usize,
    pub booked: usize,
}

impl SeatCounts {
    pub fn tally(seats: &[Seat]) -> Self {
        seats.iter().fold(Self::default(), |mut counts, seat| {
            match seat.status {
                SeatStatus::Available => counts.available += 1,
                SeatStatus::Selected => counts.selected += 1,
                SeatStatus::Booked => counts.booked += 1,
            }
            counts
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_reads_type_field_from_backend() {
        let seat: Seat =
            serde_json::from_str(r#"{"id":"D4","type":"vip","status":"booked"}"#).unwrap();
        assert_eq!(seat.id, SeatId::new("D4"));
        assert_eq!(seat.category, SeatCategory::Vip);
        assert_eq!(seat.status, SeatStatus::Booked);

        let seat: Seat =
            serde_json::from_str(r#"{"id":"H1","category":"couple","status":"available"}"#)
                .unwrap();
        assert_eq!(seat.category, SeatCategory::Couple);
    }

    #[test]
    fn default_pricing_table() {
        let pricing = SeatPricing::default();
        assert_eq!(pricing.price_of(SeatCategory::Standard), 100_000);
        assert_eq!(pricing.price_of(SeatCategory::Vip), 130_000);
        assert_eq!(pricing.price_of(SeatCategory::Couple), 150_000);
    }

    #[test]
    fn tally_counts_each_status() {
        let seats = vec![
            Seat::new("A1", SeatCategory::Standard, SeatStatus::Available),
            Seat::new("A2", SeatCategory::Standard, SeatStatus::Selected),
            Seat::new("A3", SeatCategory::Standard, SeatStatus::Booked),
            Seat::new("A4", SeatCategory::Standard, SeatStatus::Booked),
        ];
        assert_eq!(
            SeatCounts::tally(&seats),
            SeatCounts { available: 1, selected: 1, booked: 2 }
        );
    }
}
