// Fare calculation: ticket price from route duration and aircraft type, plus the
// checked luggage surcharge.

use crate::{
    error::InventoryError,
    reference::{route_hours, AircraftType, Airport},
};

pub const PRICE_PER_HOUR: f64 = 500.0;

// Luggage up to this weight travels free
pub const FREE_LUGGAGE_KG: u32 = 20;
pub const CHECKED_LUGGAGE_FEE: f64 = 100.0;
pub const PER_EXTRA_KG_FEE: f64 = 15.0;

pub fn aircraft_factor(aircraft: AircraftType) -> f64 {
    match aircraft {
        AircraftType::Boeing737 => 0.7,
        AircraftType::Boeing747 => 1.3,
        AircraftType::Boeing777 => 1.1,
        AircraftType::Boeing787 => 1.2,
        AircraftType::Airbus320 => 0.8,
        AircraftType::Airbus380 => 1.4,
    }
}

pub fn base_fare(
    departure: Airport,
    destination: Airport,
    aircraft: AircraftType,
) -> Result<f64, InventoryError> {
    let hours = route_hours(departure, destination)?;
    Ok(hours * PRICE_PER_HOUR * aircraft_factor(aircraft))
}

pub fn luggage_surcharge(luggage_kg: u32) -> f64 {
    if luggage_kg <= FREE_LUGGAGE_KG {
        0.0
    } else {
        CHECKED_LUGGAGE_FEE + (luggage_kg - FREE_LUGGAGE_KG) as f64 * PER_EXTRA_KG_FEE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_fare_uses_duration_and_factor() {
        // 2.0h * 500 * 0.7
        let fare = base_fare(
            Airport::BeijingCapital,
            Airport::ShanghaiPudong,
            AircraftType::Boeing737,
        )
        .unwrap();
        assert!((fare - 700.0).abs() < f64::EPSILON);

        // 0.5h * 500 * 1.4
        let fare = base_fare(
            Airport::SunanShuofang,
            Airport::ShanghaiPudong,
            AircraftType::Airbus380,
        )
        .unwrap();
        assert!((fare - 350.0).abs() < 1e-9);
    }

    #[test]
    fn test_base_fare_rejects_same_airport() {
        let result = base_fare(Airport::WuhanTianhe, Airport::WuhanTianhe, AircraftType::Boeing777);
        assert!(matches!(result, Err(InventoryError::Configuration(_))));
    }

    #[test]
    fn test_luggage_surcharge_thresholds() {
        assert_eq!(luggage_surcharge(0), 0.0);
        assert_eq!(luggage_surcharge(20), 0.0);
        assert_eq!(luggage_surcharge(21), 115.0);
        assert_eq!(luggage_surcharge(25), 175.0);
        assert_eq!(luggage_surcharge(100), 100.0 + 80.0 * 15.0);
    }
}
