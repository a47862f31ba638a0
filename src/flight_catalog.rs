// Flight catalog: owns every scheduled flight, keeps the seat counts inside
// [0, capacity] and refuses edits to flights that already carry passengers.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    error::InventoryError,
    fare,
    reference::{route_hours, AircraftType, Airport},
};

pub const DEPARTURE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";
pub const FLIGHT_NUMBER_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub flight_number: String,
    pub departure: Airport,
    pub destination: Airport,
    pub departure_time: NaiveDateTime,
    pub aircraft_type: AircraftType,
    pub capacity_seats: u32,
    pub available_seats: u32,
}

impl Flight {
    pub fn flight_hours(&self) -> Result<f64, InventoryError> {
        route_hours(self.departure, self.destination)
    }

    pub fn price(&self) -> Result<f64, InventoryError> {
        fare::base_fare(self.departure, self.destination, self.aircraft_type)
    }

    pub fn booked_seats(&self) -> u32 {
        self.capacity_seats - self.available_seats
    }

    pub fn departure_time_display(&self) -> String {
        self.departure_time.format(DEPARTURE_TIME_FORMAT).to_string()
    }
}

// Fields left as None keep their current value
#[derive(Debug, Clone, Default)]
pub struct FlightUpdate {
    pub flight_number: Option<String>,
    pub departure: Option<Airport>,
    pub destination: Option<Airport>,
    pub departure_time: Option<String>,
    pub aircraft_type: Option<AircraftType>,
    pub capacity: Option<u32>,
}

pub fn validate_flight_number(flight_number: &str) -> Result<(), InventoryError> {
    if flight_number.len() == FLIGHT_NUMBER_LEN && flight_number.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(InventoryError::Validation(format!(
            "The flight number must be {} digits: {}",
            FLIGHT_NUMBER_LEN, flight_number
        )))
    }
}

pub fn parse_departure_time(departure_time: &str) -> Result<NaiveDateTime, InventoryError> {
    NaiveDateTime::parse_from_str(departure_time.trim(), DEPARTURE_TIME_FORMAT).map_err(|e| {
        InventoryError::Validation(format!(
            "Departure time '{}' is not a valid yyyy-MM-dd HH:mm value: {}",
            departure_time, e
        ))
    })
}

fn validate_route(departure: Airport, destination: Airport) -> Result<(), InventoryError> {
    if departure == destination {
        return Err(InventoryError::Validation(format!(
            "The place of departure and destination cannot be the same: {}",
            departure
        )));
    }
    // Any accepted route must have a duration
    route_hours(departure, destination).map(|_| ())
}

fn validate_capacity(capacity: u32) -> Result<(), InventoryError> {
    if capacity == 0 {
        return Err(InventoryError::Validation(
            "The number of seats must be a positive integer".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct FlightCatalog {
    // Creation order is preserved; searches and reports rely on it
    flights: Vec<Flight>,
    has_passenger: HashMap<String, bool>,
}

impl FlightCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_flight(
        &mut self,
        flight_number: &str,
        departure: Airport,
        destination: Airport,
        departure_time: &str,
        aircraft_type: AircraftType,
        capacity: u32,
    ) -> Result<Flight, InventoryError> {
        validate_flight_number(flight_number)?;
        if self.contains(flight_number) {
            return Err(InventoryError::Validation(format!(
                "Flight number {} already exists",
                flight_number
            )));
        }
        validate_route(departure, destination)?;
        let departure_time = parse_departure_time(departure_time)?;
        validate_capacity(capacity)?;

        let flight = Flight {
            flight_number: flight_number.to_string(),
            departure,
            destination,
            departure_time,
            aircraft_type,
            capacity_seats: capacity,
            available_seats: capacity,
        };
        self.flights.push(flight.clone());
        self.has_passenger.insert(flight.flight_number.clone(), false);

        info!(
            flight_number = %flight.flight_number,
            departure = flight.departure.iata(),
            destination = flight.destination.iata(),
            capacity,
            "flight created"
        );
        Ok(flight)
    }

    pub fn find_by_number(&self, flight_number: &str) -> Option<&Flight> {
        self.flights.iter().find(|f| f.flight_number == flight_number)
    }

    pub fn contains(&self, flight_number: &str) -> bool {
        self.find_by_number(flight_number).is_some()
    }

    pub fn search(&self, departure: Airport, destination: Airport) -> Vec<&Flight> {
        self.flights
            .iter()
            .filter(|f| f.departure == departure && f.destination == destination)
            .collect()
    }

    pub fn flights(&self) -> &[Flight] {
        &self.flights
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    pub fn has_passenger(&self, flight_number: &str) -> bool {
        self.has_passenger.get(flight_number).copied().unwrap_or(false)
    }

    // Flights that can still be edited or deleted
    pub fn unlocked_flights(&self) -> Vec<&Flight> {
        self.flights
            .iter()
            .filter(|f| !self.has_passenger(&f.flight_number))
            .collect()
    }

    pub fn price(&self, flight_number: &str) -> Result<f64, InventoryError> {
        self.get(flight_number)?.price()
    }

    pub fn flight_hours(&self, flight_number: &str) -> Result<f64, InventoryError> {
        self.get(flight_number)?.flight_hours()
    }

    pub fn update_flight(
        &mut self,
        flight_number: &str,
        update: FlightUpdate,
    ) -> Result<Flight, InventoryError> {
        let idx = self.position(flight_number)?;
        self.ensure_unlocked(flight_number)?;

        // Everything is checked on a copy, the stored record is only replaced at the end
        let current = &self.flights[idx];
        let mut candidate = current.clone();

        if let Some(new_number) = update.flight_number {
            validate_flight_number(&new_number)?;
            if new_number != flight_number && self.contains(&new_number) {
                return Err(InventoryError::Validation(format!(
                    "Flight number {} already exists",
                    new_number
                )));
            }
            candidate.flight_number = new_number;
        }
        if let Some(departure) = update.departure {
            candidate.departure = departure;
        }
        if let Some(destination) = update.destination {
            candidate.destination = destination;
        }
        validate_route(candidate.departure, candidate.destination)?;
        if let Some(departure_time) = update.departure_time {
            candidate.departure_time = parse_departure_time(&departure_time)?;
        }
        if let Some(aircraft_type) = update.aircraft_type {
            candidate.aircraft_type = aircraft_type;
        }
        if let Some(capacity) = update.capacity {
            validate_capacity(capacity)?;
            // Unlocked flights have no seats taken
            candidate.capacity_seats = capacity;
            candidate.available_seats = capacity;
        }

        if candidate == *current {
            return Err(InventoryError::NoOp(format!(
                "No modification has been made to flight {}",
                flight_number
            )));
        }

        if candidate.flight_number != flight_number {
            self.has_passenger.remove(flight_number);
            self.has_passenger.insert(candidate.flight_number.clone(), false);
        }
        self.flights[idx] = candidate.clone();

        info!(
            flight_number = %flight_number,
            new_flight_number = %candidate.flight_number,
            "flight updated"
        );
        Ok(candidate)
    }

    pub fn delete_flight(&mut self, flight_number: &str) -> Result<Flight, InventoryError> {
        let idx = self.position(flight_number)?;
        self.ensure_unlocked(flight_number)?;

        let flight = self.flights.remove(idx);
        self.has_passenger.remove(flight_number);

        info!(flight_number = %flight_number, "flight deleted");
        Ok(flight)
    }

    // Returns the seats left after the reservation
    pub(crate) fn reserve_seat(&mut self, flight_number: &str) -> Result<u32, InventoryError> {
        let flight = self.get_mut(flight_number)?;
        if flight.available_seats == 0 {
            return Err(InventoryError::Capacity(format!(
                "There are no seats available on flight {}",
                flight_number
            )));
        }
        flight.available_seats -= 1;
        debug!(flight_number = %flight_number, available = flight.available_seats, "seat reserved");
        Ok(flight.available_seats)
    }

    // Returns the seats left after the release, never more than capacity
    pub(crate) fn release_seat(&mut self, flight_number: &str) -> Result<u32, InventoryError> {
        let flight = self.get_mut(flight_number)?;
        if flight.available_seats < flight.capacity_seats {
            flight.available_seats += 1;
        } else {
            warn!(flight_number = %flight_number, "seat release ignored, flight already empty");
        }
        debug!(flight_number = %flight_number, available = flight.available_seats, "seat released");
        Ok(flight.available_seats)
    }

    pub(crate) fn set_has_passenger(&mut self, flight_number: &str, has_passenger: bool) {
        if let Some(flag) = self.has_passenger.get_mut(flight_number) {
            *flag = has_passenger;
        }
    }

    pub(crate) fn get(&self, flight_number: &str) -> Result<&Flight, InventoryError> {
        self.find_by_number(flight_number)
            .ok_or_else(|| InventoryError::NotFound(format!("Flight {} does not exist", flight_number)))
    }

    fn get_mut(&mut self, flight_number: &str) -> Result<&mut Flight, InventoryError> {
        self.flights
            .iter_mut()
            .find(|f| f.flight_number == flight_number)
            .ok_or_else(|| InventoryError::NotFound(format!("Flight {} does not exist", flight_number)))
    }

    fn position(&self, flight_number: &str) -> Result<usize, InventoryError> {
        self.flights
            .iter()
            .position(|f| f.flight_number == flight_number)
            .ok_or_else(|| InventoryError::NotFound(format!("Flight {} does not exist", flight_number)))
    }

    fn ensure_unlocked(&self, flight_number: &str) -> Result<(), InventoryError> {
        if self.has_passenger(flight_number) {
            return Err(InventoryError::Locked(format!(
                "Flight {} has booked passengers and cannot be changed",
                flight_number
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_with_flight() -> FlightCatalog {
        let mut catalog = FlightCatalog::new();
        catalog
            .create_flight(
                "100001",
                Airport::BeijingCapital,
                Airport::ShanghaiPudong,
                "2025-06-01 08:30",
                AircraftType::Boeing737,
                100,
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_create_flight_starts_full_and_unlocked() {
        let catalog = catalog_with_flight();
        let flight = catalog.find_by_number("100001").unwrap();

        assert_eq!(flight.capacity_seats, 100);
        assert_eq!(flight.available_seats, 100);
        assert_eq!(flight.departure_time_display(), "2025-06-01 08:30");
        assert!(!catalog.has_passenger("100001"));
    }

    #[test]
    fn test_create_flight_rejects_bad_numbers() {
        let mut catalog = catalog_with_flight();
        for number in ["10001", "1000011", "10a001", "", "１００００１"] {
            let result = catalog.create_flight(
                number,
                Airport::BeijingCapital,
                Airport::WuhanTianhe,
                "2025-06-01 08:30",
                AircraftType::Boeing747,
                10,
            );
            assert!(matches!(result, Err(InventoryError::Validation(_))), "{number}");
        }

        let duplicate = catalog.create_flight(
            "100001",
            Airport::ChengduTianfu,
            Airport::WuhanTianhe,
            "2025-06-01 08:30",
            AircraftType::Boeing747,
            10,
        );
        assert!(matches!(duplicate, Err(InventoryError::Validation(_))));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_create_flight_rejects_same_airports_bad_time_and_zero_capacity() {
        let mut catalog = FlightCatalog::new();

        let same = catalog.create_flight(
            "200001",
            Airport::NanjingLukou,
            Airport::NanjingLukou,
            "2025-06-01 08:30",
            AircraftType::Airbus320,
            50,
        );
        assert!(matches!(same, Err(InventoryError::Validation(_))));

        for time in ["2025-02-30 10:00", "2025-06-01 24:10", "tomorrow", "2025/06/01 10:00"] {
            let result = catalog.create_flight(
                "200001",
                Airport::NanjingLukou,
                Airport::ShenzhenBaoan,
                time,
                AircraftType::Airbus320,
                50,
            );
            assert!(matches!(result, Err(InventoryError::Validation(_))), "{time}");
        }

        let empty = catalog.create_flight(
            "200001",
            Airport::NanjingLukou,
            Airport::ShenzhenBaoan,
            "2025-06-01 08:30",
            AircraftType::Airbus320,
            0,
        );
        assert!(matches!(empty, Err(InventoryError::Validation(_))));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_search_keeps_creation_order() {
        let mut catalog = catalog_with_flight();
        catalog
            .create_flight(
                "100002",
                Airport::ShanghaiPudong,
                Airport::BeijingCapital,
                "2025-06-01 12:00",
                AircraftType::Boeing777,
                80,
            )
            .unwrap();
        catalog
            .create_flight(
                "100003",
                Airport::BeijingCapital,
                Airport::ShanghaiPudong,
                "2025-06-01 06:00",
                AircraftType::Airbus380,
                400,
            )
            .unwrap();

        let found: Vec<&str> = catalog
            .search(Airport::BeijingCapital, Airport::ShanghaiPudong)
            .iter()
            .map(|f| f.flight_number.as_str())
            .collect();
        assert_eq!(found, vec!["100001", "100003"]);
        assert!(catalog
            .search(Airport::WuhanTianhe, Airport::ShanghaiPudong)
            .is_empty());
    }

    #[test]
    fn test_update_keeps_unsupplied_fields_and_moves_flag() {
        let mut catalog = catalog_with_flight();
        let updated = catalog
            .update_flight(
                "100001",
                FlightUpdate {
                    flight_number: Some("100009".to_string()),
                    capacity: Some(120),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.flight_number, "100009");
        assert_eq!(updated.departure, Airport::BeijingCapital);
        assert_eq!(updated.aircraft_type, AircraftType::Boeing737);
        assert_eq!(updated.available_seats, 120);
        assert!(catalog.find_by_number("100001").is_none());
        assert!(catalog.find_by_number("100009").is_some());
        assert!(!catalog.has_passenger("100009"));
        assert!(!catalog.has_passenger.contains_key("100001"));
    }

    #[test]
    fn test_update_collision_aborts_whole_update() {
        let mut catalog = catalog_with_flight();
        catalog
            .create_flight(
                "100002",
                Airport::GuangzhouBaiyun,
                Airport::ChengduTianfu,
                "2025-07-01 09:00",
                AircraftType::Boeing787,
                60,
            )
            .unwrap();
        let before = catalog.find_by_number("100001").unwrap().clone();

        let result = catalog.update_flight(
            "100001",
            FlightUpdate {
                flight_number: Some("100002".to_string()),
                aircraft_type: Some(AircraftType::Airbus380),
                capacity: Some(300),
                ..Default::default()
            },
        );

        assert!(matches!(result, Err(InventoryError::Validation(_))));
        assert_eq!(catalog.find_by_number("100001").unwrap(), &before);
    }

    #[test]
    fn test_update_revalidates_route() {
        let mut catalog = catalog_with_flight();
        let result = catalog.update_flight(
            "100001",
            FlightUpdate {
                destination: Some(Airport::BeijingCapital),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(InventoryError::Validation(_))));
    }

    #[test]
    fn test_update_without_changes_is_noop() {
        let mut catalog = catalog_with_flight();
        let result = catalog.update_flight(
            "100001",
            FlightUpdate {
                departure: Some(Airport::BeijingCapital),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(InventoryError::NoOp(_))));
    }

    #[test]
    fn test_locked_flight_rejects_update_and_delete() {
        let mut catalog = catalog_with_flight();
        catalog.set_has_passenger("100001", true);

        let update = catalog.update_flight(
            "100001",
            FlightUpdate {
                capacity: Some(10),
                ..Default::default()
            },
        );
        assert!(matches!(update, Err(InventoryError::Locked(_))));
        assert!(matches!(
            catalog.delete_flight("100001"),
            Err(InventoryError::Locked(_))
        ));
        assert!(catalog.unlocked_flights().is_empty());
    }

    #[test]
    fn test_delete_unknown_and_unlocked() {
        let mut catalog = catalog_with_flight();
        assert!(matches!(
            catalog.delete_flight("999999"),
            Err(InventoryError::NotFound(_))
        ));

        let deleted = catalog.delete_flight("100001").unwrap();
        assert_eq!(deleted.flight_number, "100001");
        assert!(catalog.is_empty());
        assert!(catalog.has_passenger.is_empty());
    }

    #[test]
    fn test_seat_counts_stay_in_bounds() {
        let mut catalog = FlightCatalog::new();
        catalog
            .create_flight(
                "300001",
                Airport::WuhanTianhe,
                Airport::SunanShuofang,
                "2025-06-01 08:30",
                AircraftType::Airbus320,
                2,
            )
            .unwrap();

        assert_eq!(catalog.reserve_seat("300001").unwrap(), 1);
        assert_eq!(catalog.reserve_seat("300001").unwrap(), 0);
        assert!(matches!(
            catalog.reserve_seat("300001"),
            Err(InventoryError::Capacity(_))
        ));

        assert_eq!(catalog.release_seat("300001").unwrap(), 1);
        assert_eq!(catalog.release_seat("300001").unwrap(), 2);
        // clamped at capacity
        assert_eq!(catalog.release_seat("300001").unwrap(), 2);
    }

    #[test]
    fn test_price_and_hours() {
        let catalog = catalog_with_flight();
        assert!((catalog.price("100001").unwrap() - 700.0).abs() < 1e-9);
        assert_eq!(catalog.flight_hours("100001").unwrap(), 2.0);
        assert!(matches!(
            catalog.price("000000"),
            Err(InventoryError::NotFound(_))
        ));
    }
}
