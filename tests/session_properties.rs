mod common;

use proptest::prelude::*;
use std::collections::HashSet;

use cinema_booking::booking::{BookingSession, BookingStep};
use cinema_booking::error::BookingError;
use cinema_booking::models::{SeatId, SeatPricing, SeatStatus};

use common::{hall, showtime};

const SEATS: [&str; 5] = ["A1", "A2", "A3", "D4", "H1"];

fn on_seat_step() -> BookingSession {
    let mut session = BookingSession::new(SeatPricing::default());
    session.select_showtime(showtime("S1", 4, 18), hall()).unwrap();
    session
}

proptest! {
    // Выбранные места всегда совпадают со статусами в схеме, а сумма - с ценами
    #[test]
    fn selection_matches_seat_statuses(
        toggles in prop::collection::vec(0usize..SEATS.len(), 0..40)
    ) {
        let mut session = on_seat_step();
        for i in toggles {
            let _ = session.toggle_seat(&SeatId::new(SEATS[i]));
        }

        let selected: HashSet<&SeatId> = session.selected_seats().iter().collect();
        prop_assert_eq!(selected.len(), session.selected_seats().len());

        for seat in session.seats() {
            prop_assert_eq!(seat.status == SeatStatus::Selected, selected.contains(&seat.id));
        }

        let expected: u64 = session
            .seats()
            .iter()
            .filter(|s| s.status == SeatStatus::Selected)
            .map(|s| session.pricing().price_of(s.category))
            .sum();
        prop_assert_eq!(session.total_price(), expected);
        prop_assert_eq!(session.seat_counts().selected, selected.len());
    }

    #[test]
    fn double_toggle_is_identity(
        prefix in prop::collection::vec(0usize..SEATS.len(), 0..20),
        seat in 0usize..SEATS.len()
    ) {
        let mut session = on_seat_step();
        for i in prefix {
            let _ = session.toggle_seat(&SeatId::new(SEATS[i]));
        }
        let before = session.snapshot();

        let id = SeatId::new(SEATS[seat]);
        if session.toggle_seat(&id).is_ok() {
            session.toggle_seat(&id).unwrap();
        }

        let after = session.snapshot();
        prop_assert_eq!(after.seats, before.seats);
        prop_assert_eq!(after.total_price, before.total_price);
        let a: HashSet<SeatId> = after.selected_seats.into_iter().collect();
        let b: HashSet<SeatId> = before.selected_seats.into_iter().collect();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn booked_seat_never_changes(toggles in prop::collection::vec(0usize..SEATS.len(), 0..40)) {
        let mut session = on_seat_step();
        let booked = SeatId::new("A3");
        for i in toggles {
            let id = SeatId::new(SEATS[i]);
            let result = session.toggle_seat(&id);
            if id == booked {
                prop_assert!(matches!(result, Err(BookingError::SeatUnavailable(_))));
            }
        }
        prop_assert_eq!(session.seat(&booked).map(|s| s.status), Some(SeatStatus::Booked));
        prop_assert_eq!(session.step(), BookingStep::SelectingSeats);
    }
}
