// Booking ledger: passenger records and the book / rebook / cancel transactions.
// Every transaction checks all of its preconditions before it touches the catalog,
// so a failed call leaves seat counts and bindings exactly as they were.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    error::InventoryError,
    fare,
    flight_catalog::{Flight, FlightCatalog},
};

pub const MAX_LUGGAGE_KG: u32 = 100;
pub const PHONE_DIGITS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PassengerId(pub u64);

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("Male"),
            Gender::Female => f.write_str("Female"),
        }
    }
}

impl FromStr for Gender {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "男" => Ok(Gender::Male),
            "female" | "f" | "女" => Ok(Gender::Female),
            other => Err(InventoryError::Validation(format!(
                "Gender must be Male or Female: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passenger {
    pub id: PassengerId,
    pub name: String,
    pub gender: Gender,
    pub luggage_kg: u32,
    pub phone: String,
    // None until a booking succeeds
    pub flight_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingReceipt {
    pub passenger_id: PassengerId,
    pub flight_number: String,
    pub base_fare: f64,
    pub luggage_surcharge: f64,
    pub total_cost: f64,
}

impl BookingReceipt {
    fn quote(passenger: &Passenger, flight: &Flight) -> Result<Self, InventoryError> {
        let base_fare = flight.price()?;
        let luggage_surcharge = fare::luggage_surcharge(passenger.luggage_kg);
        Ok(Self {
            passenger_id: passenger.id,
            flight_number: flight.flight_number.clone(),
            base_fare,
            luggage_surcharge,
            total_cost: base_fare + luggage_surcharge,
        })
    }
}

pub fn validate_phone(phone: &str) -> Result<(), InventoryError> {
    if phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(InventoryError::Validation(format!(
            "The phone number must be {} digits: {}",
            PHONE_DIGITS, phone
        )))
    }
}

pub fn validate_luggage(luggage_kg: u32) -> Result<(), InventoryError> {
    if luggage_kg > MAX_LUGGAGE_KG {
        return Err(InventoryError::Validation(format!(
            "Luggage weight must be between 0 and {} kg: {}",
            MAX_LUGGAGE_KG, luggage_kg
        )));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct BookingLedger {
    // Ids only grow, so key order is registration order
    passengers: BTreeMap<PassengerId, Passenger>,
    next_id: u64,
}

impl BookingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_passenger(
        &mut self,
        name: &str,
        gender: Gender,
        luggage_kg: u32,
        phone: &str,
    ) -> Result<Passenger, InventoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(InventoryError::Validation(
                "Passenger name cannot be empty".to_string(),
            ));
        }
        validate_luggage(luggage_kg)?;
        validate_phone(phone)?;

        self.next_id += 1;
        let passenger = Passenger {
            id: PassengerId(self.next_id),
            name: name.to_string(),
            gender,
            luggage_kg,
            phone: phone.to_string(),
            flight_number: None,
        };
        self.passengers.insert(passenger.id, passenger.clone());

        info!(passenger_id = %passenger.id, "passenger registered");
        Ok(passenger)
    }

    pub fn book(
        &mut self,
        catalog: &mut FlightCatalog,
        passenger_id: PassengerId,
        flight_number: &str,
    ) -> Result<BookingReceipt, InventoryError> {
        let passenger = self.get(passenger_id)?;
        if let Some(current) = &passenger.flight_number {
            return Err(InventoryError::Validation(format!(
                "Passenger {} already holds a seat on flight {}",
                passenger_id, current
            )));
        }
        let flight = catalog.get(flight_number)?;
        ensure_seat_left(flight)?;
        let receipt = BookingReceipt::quote(passenger, flight)?;

        catalog.reserve_seat(flight_number)?;
        catalog.set_has_passenger(flight_number, true);
        self.get_mut(passenger_id)?.flight_number = Some(flight_number.to_string());

        info!(
            passenger_id = %passenger_id,
            flight_number = %flight_number,
            total_cost = receipt.total_cost,
            "seat booked"
        );
        Ok(receipt)
    }

    pub fn rebook(
        &mut self,
        catalog: &mut FlightCatalog,
        passenger_id: PassengerId,
        new_flight_number: &str,
    ) -> Result<BookingReceipt, InventoryError> {
        let passenger = self.get(passenger_id)?;
        let current = bound_flight_number(passenger)?.to_string();
        catalog.get(&current)?;
        if new_flight_number == current {
            return Err(InventoryError::NoOp(format!(
                "Passenger {} is already on flight {}",
                passenger_id, current
            )));
        }
        let new_flight = catalog.get(new_flight_number)?;
        ensure_seat_left(new_flight)?;
        let receipt = BookingReceipt::quote(passenger, new_flight)?;

        catalog.release_seat(&current)?;
        catalog.reserve_seat(new_flight_number)?;
        self.get_mut(passenger_id)?.flight_number = Some(new_flight_number.to_string());
        catalog.set_has_passenger(new_flight_number, true);
        catalog.set_has_passenger(&current, self.any_bound_to(&current));

        info!(
            passenger_id = %passenger_id,
            from = %current,
            to = %new_flight_number,
            "booking moved"
        );
        Ok(receipt)
    }

    // Releases the seat and removes the passenger record
    pub fn cancel(
        &mut self,
        catalog: &mut FlightCatalog,
        passenger_id: PassengerId,
    ) -> Result<Passenger, InventoryError> {
        let passenger = self.get(passenger_id)?;
        let flight_number = bound_flight_number(passenger)?.to_string();
        catalog.get(&flight_number)?;

        catalog.release_seat(&flight_number)?;
        let removed = self
            .passengers
            .remove(&passenger_id)
            .ok_or_else(|| not_found(passenger_id))?;
        catalog.set_has_passenger(&flight_number, self.any_bound_to(&flight_number));

        info!(passenger_id = %passenger_id, flight_number = %flight_number, "booking cancelled");
        Ok(removed)
    }

    pub fn passenger(&self, passenger_id: PassengerId) -> Option<&Passenger> {
        self.passengers.get(&passenger_id)
    }

    pub fn list_passengers(&self) -> Vec<&Passenger> {
        self.passengers.values().collect()
    }

    pub fn passengers_on(&self, flight_number: &str) -> Vec<&Passenger> {
        self.passengers
            .values()
            .filter(|p| p.flight_number.as_deref() == Some(flight_number))
            .collect()
    }

    pub fn find_bound_flight<'c>(
        &self,
        catalog: &'c FlightCatalog,
        passenger_id: PassengerId,
    ) -> Option<&'c Flight> {
        let flight_number = self.passengers.get(&passenger_id)?.flight_number.as_deref()?;
        catalog.find_by_number(flight_number)
    }

    pub fn len(&self) -> usize {
        self.passengers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passengers.is_empty()
    }

    fn any_bound_to(&self, flight_number: &str) -> bool {
        self.passengers
            .values()
            .any(|p| p.flight_number.as_deref() == Some(flight_number))
    }

    fn get(&self, passenger_id: PassengerId) -> Result<&Passenger, InventoryError> {
        self.passengers
            .get(&passenger_id)
            .ok_or_else(|| not_found(passenger_id))
    }

    fn get_mut(&mut self, passenger_id: PassengerId) -> Result<&mut Passenger, InventoryError> {
        self.passengers
            .get_mut(&passenger_id)
            .ok_or_else(|| not_found(passenger_id))
    }
}

fn not_found(passenger_id: PassengerId) -> InventoryError {
    InventoryError::NotFound(format!("Passenger {} does not exist", passenger_id))
}

fn bound_flight_number(passenger: &Passenger) -> Result<&str, InventoryError> {
    passenger.flight_number.as_deref().ok_or_else(|| {
        InventoryError::NotFound(format!("Passenger {} has no booked flight", passenger.id))
    })
}

fn ensure_seat_left(flight: &Flight) -> Result<(), InventoryError> {
    if flight.available_seats == 0 {
        return Err(InventoryError::Capacity(format!(
            "There are no seats available on flight {}",
            flight.flight_number
        )));
    }
    Ok(())
}
