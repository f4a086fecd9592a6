use std::ops::RangeInclusive;

use rand::Rng;
use uuid::Uuid;

/// PINs are four digits without a leading zero. They are not unique across rooms.
pub const PIN_RANGE: RangeInclusive<u16> = 1000..=9999;

pub fn new_room_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn new_room_pin() -> String {
    rand::thread_rng().gen_range(PIN_RANGE).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pin_is_four_digits() {
        for _ in 0..200 {
            let pin = new_room_pin();
            assert_eq!(pin.len(), 4);
            let n: u16 = pin.parse().unwrap();
            assert!(PIN_RANGE.contains(&n));
        }
    }

    #[test]
    fn room_ids_are_uuids() {
        let a = new_room_id();
        assert!(Uuid::parse_str(&a).is_ok());
        assert_ne!(a, new_room_id());
    }
}
