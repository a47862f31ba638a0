// Flight booking desk: in-memory flight and passenger inventory plus the
// weather, travel guide and report collaborators used by the console binary.

// Inventory core
pub mod booking_ledger;
pub mod error;
pub mod fare;
pub mod flight_catalog;
pub mod reference;

// Collaborators
pub mod circuit_breaker;
pub mod config;
pub mod forecast_cache;
pub mod mail;
pub mod report;
pub mod travel;
pub mod weather;

// Re-export key types for convenience
pub use booking_ledger::{BookingLedger, BookingReceipt, Gender, Passenger, PassengerId};
pub use config::{AppConfig, ConfigError, MailConfig, WeatherConfig};
pub use error::InventoryError;
pub use flight_catalog::{Flight, FlightCatalog, FlightUpdate};
pub use mail::SmtpDispatcher;
pub use reference::{AircraftType, Airport, City};
pub use report::{ConsoleDispatcher, InventorySnapshot, ReportDispatcher, ReportError};
pub use weather::{CityForecast, WeatherClient, WeatherError};
