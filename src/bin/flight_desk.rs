// Interactive console desk: flights, passengers, weather, travel tips and reports.

use std::{
    fmt::Display,
    io::{self, Write},
    str::FromStr,
};

use anyhow::{Context, Result};
use clap::Parser;
use flight_booking_desk::{
    booking_ledger::{validate_luggage, validate_phone},
    fare,
    flight_catalog::{parse_departure_time, validate_flight_number},
    travel, AircraftType, Airport, AppConfig, BookingLedger, BookingReceipt, City,
    ConsoleDispatcher, Flight, FlightCatalog, FlightUpdate, Gender, InventorySnapshot,
    PassengerId, ReportDispatcher, SmtpDispatcher, WeatherClient,
};
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "flight_desk")]
#[command(author, version, about = "Console desk for flights and passenger bookings", long_about = None)]
struct CliArgs {
    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    verbose: bool,

    /// Print reports to the console even when SMTP is configured
    #[arg(long)]
    console_report: bool,
}

#[derive(Error, Debug)]
#[error("input closed")]
struct InputClosed;

fn setup_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    let config = AppConfig::from_env().context("reading FLIGHT_DESK_* settings")?;
    let dispatcher: Box<dyn ReportDispatcher> = match &config.mail {
        Some(mail) if !args.console_report => {
            Box::new(SmtpDispatcher::new(mail).context("configuring report mail")?)
        }
        _ => Box::new(ConsoleDispatcher),
    };
    let weather = WeatherClient::new(config.weather).context("building weather client")?;

    let mut desk = Desk {
        catalog: FlightCatalog::new(),
        ledger: BookingLedger::new(),
        weather,
        dispatcher,
    };

    info!("flight desk started");
    desk.run().await;
    info!("flight desk closed");
    Ok(())
}

struct Desk {
    catalog: FlightCatalog,
    ledger: BookingLedger,
    weather: WeatherClient,
    dispatcher: Box<dyn ReportDispatcher>,
}

impl Desk {
    async fn run(&mut self) {
        loop {
            print_menu();
            let choice = match read_line("Please select an option") {
                Ok(choice) => choice,
                Err(_) => return,
            };

            let outcome = match choice.as_str() {
                "1" => self.create_flight(),
                "2" => self.modify_flight(),
                "3" => self.delete_flight(),
                "4" => self.add_passenger(),
                "5" => self.change_flight(),
                "6" => self.cancel_ticket(),
                "7" => self.show_weather().await,
                "8" => self.show_recommendations(),
                "9" => self.send_report().await,
                "10" => {
                    self.list_flights();
                    Ok(())
                }
                "11" => {
                    self.list_passengers();
                    Ok(())
                }
                "0" => return,
                other => {
                    println!("Unknown option: {other}");
                    Ok(())
                }
            };

            if let Err(e) = outcome {
                if e.downcast_ref::<InputClosed>().is_some() {
                    return;
                }
                error!("{e:#}");
                println!("Operation failed: {e:#}");
            }
        }
    }

    fn create_flight(&mut self) -> Result<()> {
        let flight_number = prompt_with("Flight number (6 digits)", |s| {
            validate_flight_number(s)?;
            Ok(s.to_string())
        })?;
        let departure: Airport = prompt_parse("Departure airport (name, IATA code or city)")?;
        let destination: Airport = prompt_parse("Destination airport (name, IATA code or city)")?;
        let departure_time = prompt_with("Departure time (YYYY-MM-DD HH:MM)", |s| {
            parse_departure_time(s)?;
            Ok(s.to_string())
        })?;
        let aircraft: AircraftType = prompt_parse("Aircraft type (e.g. Boeing 737, A380)")?;
        let capacity: u32 = prompt_parse("Capacity seats")?;

        let flight = self.catalog.create_flight(
            &flight_number,
            departure,
            destination,
            &departure_time,
            aircraft,
            capacity,
        )?;
        println!("Flight created:");
        print_flight(&flight);
        Ok(())
    }

    fn modify_flight(&mut self) -> Result<()> {
        let editable = self.catalog.unlocked_flights();
        if editable.is_empty() {
            println!("No flight can be modified.");
            return Ok(());
        }
        println!("Flights without passengers:");
        editable.iter().copied().for_each(print_flight);

        let current = prompt_with("Flight number to modify", |s| {
            pick_flight(&editable, s).cloned()
        })?;
        println!("Press Enter to keep the current value.");
        let update = FlightUpdate {
            flight_number: prompt_optional(
                &format!("Flight number [{}]", current.flight_number),
                |s| {
                    validate_flight_number(s)?;
                    Ok(s.to_string())
                },
            )?,
            departure: prompt_optional(
                &format!("Departure airport [{}]", current.departure.iata()),
                |s| Ok(s.parse::<Airport>()?),
            )?,
            destination: prompt_optional(
                &format!("Destination airport [{}]", current.destination.iata()),
                |s| Ok(s.parse::<Airport>()?),
            )?,
            departure_time: prompt_optional(
                &format!("Departure time [{}]", current.departure_time_display()),
                |s| {
                    parse_departure_time(s)?;
                    Ok(s.to_string())
                },
            )?,
            aircraft_type: prompt_optional(
                &format!("Aircraft type [{}]", current.aircraft_type),
                |s| Ok(s.parse::<AircraftType>()?),
            )?,
            capacity: prompt_optional(
                &format!("Capacity seats [{}]", current.capacity_seats),
                |s| Ok(s.parse::<u32>()?),
            )?,
        };

        // Cross-field rules (route, number collision) are checked by the catalog as a whole
        let flight = self.catalog.update_flight(&current.flight_number, update)?;
        println!("Flight updated:");
        print_flight(&flight);
        Ok(())
    }

    fn delete_flight(&mut self) -> Result<()> {
        let flight_number = read_line("Flight number to delete")?;
        let Some(flight) = self.catalog.find_by_number(&flight_number) else {
            println!("Flight {flight_number} does not exist.");
            return Ok(());
        };
        print_flight(flight);
        if !confirm("Delete this flight?")? {
            println!("Deletion cancelled.");
            return Ok(());
        }

        self.catalog.delete_flight(&flight_number)?;
        println!("Flight {flight_number} deleted.");
        Ok(())
    }

    fn add_passenger(&mut self) -> Result<()> {
        if self.catalog.is_empty() {
            println!("There are no flights to book.");
            return Ok(());
        }

        let departure: Airport = prompt_parse("Departure airport (name, IATA code or city)")?;
        let destination = prompt_with("Destination airport (name, IATA code or city)", |s| {
            let destination: Airport = s.parse()?;
            ensure_distinct_route(departure, destination)?;
            Ok(destination)
        })?;

        let matches = self.catalog.search(departure, destination);
        if matches.is_empty() {
            println!("No matching flights.");
            return Ok(());
        }
        matches.iter().copied().for_each(print_flight);
        let flight_number = prompt_with("Flight number to book", |s| {
            let flight = pick_flight(&matches, s)?;
            if flight.available_seats == 0 {
                anyhow::bail!("flight {s} is full");
            }
            Ok(flight.flight_number.clone())
        })?;

        let name = prompt_with("Passenger name", |s| {
            if s.is_empty() {
                anyhow::bail!("name cannot be empty");
            }
            Ok(s.to_string())
        })?;
        let gender: Gender = prompt_parse("Gender (Male/Female)")?;
        let luggage_kg = prompt_with("Weight of luggage in kg (0-100)", |s| {
            let kg: u32 = s.parse().context("not a whole number")?;
            validate_luggage(kg)?;
            Ok(kg)
        })?;
        let phone = prompt_with("Telephone number (11 digits)", |s| {
            validate_phone(s)?;
            Ok(s.to_string())
        })?;

        let quote = self.catalog.price(&flight_number)?
            + fare::luggage_surcharge(luggage_kg);
        if !confirm(&format!("Book flight {flight_number} for {quote:.2}?"))? {
            println!("Booking cancelled.");
            return Ok(());
        }

        let passenger = self
            .ledger
            .register_passenger(&name, gender, luggage_kg, &phone)?;
        let receipt = self
            .ledger
            .book(&mut self.catalog, passenger.id, &flight_number)?;
        print_receipt(&receipt);
        Ok(())
    }

    fn change_flight(&mut self) -> Result<()> {
        let passenger_id = PassengerId(prompt_parse("Passenger id")?);
        let Some(current) = self.ledger.find_bound_flight(&self.catalog, passenger_id) else {
            println!("Passenger {passenger_id} has no booking.");
            return Ok(());
        };
        println!("Current flight:");
        print_flight(current);

        let new_flight_number = read_line("New flight number")?;
        if !confirm(&format!("Move passenger {passenger_id} to flight {new_flight_number}?"))? {
            println!("Change cancelled.");
            return Ok(());
        }

        let receipt = self
            .ledger
            .rebook(&mut self.catalog, passenger_id, &new_flight_number)?;
        print_receipt(&receipt);
        Ok(())
    }

    fn cancel_ticket(&mut self) -> Result<()> {
        let passenger_id = PassengerId(prompt_parse("Passenger id")?);
        let Some(passenger) = self.ledger.passenger(passenger_id) else {
            println!("Passenger {passenger_id} does not exist.");
            return Ok(());
        };
        if !confirm(&format!("Cancel the ticket of {}?", passenger.name))? {
            println!("Cancellation aborted.");
            return Ok(());
        }

        let removed = self.ledger.cancel(&mut self.catalog, passenger_id)?;
        println!(
            "Ticket of {} on flight {} cancelled.",
            removed.name,
            removed.flight_number.unwrap_or_default()
        );
        Ok(())
    }

    async fn show_weather(&self) -> Result<()> {
        let answer = read_line("City (Beijing, Shanghai, ...) or 'all'")?;
        if answer.eq_ignore_ascii_case("all") {
            for (city, result) in self.weather.forecast_all().await {
                match result {
                    Ok(forecast) => println!("{forecast}"),
                    Err(e) => println!("{city}: {e}"),
                }
            }
            return Ok(());
        }

        let city: City = answer.parse()?;
        let forecast = self.weather.forecast(city).await?;
        println!("{forecast}");
        Ok(())
    }

    fn show_recommendations(&self) -> Result<()> {
        let names: Vec<&str> = travel::cities().iter().map(|c| c.name()).collect();
        let city: City = prompt_parse(&format!("City ({})", names.join(", ")))?;
        println!("{}", travel::render_guide(city));
        Ok(())
    }

    async fn send_report(&self) -> Result<()> {
        let snapshot = InventorySnapshot::capture(&self.catalog, &self.ledger);
        self.dispatcher
            .dispatch(&snapshot)
            .await
            .context("sending report")?;
        println!("Report sent.");
        Ok(())
    }

    fn list_flights(&self) {
        if self.catalog.is_empty() {
            println!("No flights.");
        }
        self.catalog.flights().iter().for_each(print_flight);
    }

    fn list_passengers(&self) {
        if self.ledger.is_empty() {
            println!("No passengers.");
        }
        for p in self.ledger.list_passengers() {
            println!(
                "[{}] {} | {} | {}kg | {} | flight {}",
                p.id,
                p.name,
                p.gender,
                p.luggage_kg,
                p.phone,
                p.flight_number.as_deref().unwrap_or("-")
            );
        }
    }
}

fn print_menu() {
    println!();
    println!("========= Flight Desk =========");
    println!(" 1. Create flight");
    println!(" 2. Modify flight");
    println!(" 3. Delete flight");
    println!(" 4. Add passenger and book");
    println!(" 5. Change flight");
    println!(" 6. Cancel ticket");
    println!(" 7. Weather");
    println!(" 8. Travel recommendations");
    println!(" 9. Send report");
    println!("10. List flights");
    println!("11. List passengers");
    println!(" 0. Exit");
}

fn print_flight(flight: &Flight) {
    println!(
        "{} | {} -> {} | {} | {} | {}/{} seats available",
        flight.flight_number,
        flight.departure.iata(),
        flight.destination.iata(),
        flight.departure_time_display(),
        flight.aircraft_type,
        flight.available_seats,
        flight.capacity_seats
    );
}

fn print_receipt(receipt: &BookingReceipt) {
    println!(
        "Passenger {} booked on flight {}: fare {:.2} + luggage {:.2} = {:.2}",
        receipt.passenger_id,
        receipt.flight_number,
        receipt.base_fare,
        receipt.luggage_surcharge,
        receipt.total_cost
    );
}

fn read_line(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Err(InputClosed.into());
    }
    Ok(line.trim().to_string())
}

// Asks again until the answer passes `check`
fn prompt_with<T>(label: &str, check: impl Fn(&str) -> Result<T>) -> Result<T> {
    loop {
        let answer = read_line(label)?;
        match check(&answer) {
            Ok(value) => return Ok(value),
            Err(e) => println!("{e:#}, please try again."),
        }
    }
}

// Empty input means "keep the current value"
fn prompt_optional<T>(label: &str, check: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
    prompt_with(label, |s| optional(s, &check))
}

fn optional<T>(answer: &str, check: impl Fn(&str) -> Result<T>) -> Result<Option<T>> {
    if answer.is_empty() {
        Ok(None)
    } else {
        check(answer).map(Some)
    }
}

fn ensure_distinct_route(departure: Airport, destination: Airport) -> Result<()> {
    if departure == destination {
        anyhow::bail!("departure and destination cannot both be {departure}");
    }
    Ok(())
}

// Only flights offered in `choices` can be picked
fn pick_flight<'a>(choices: &[&'a Flight], answer: &str) -> Result<&'a Flight> {
    choices
        .iter()
        .copied()
        .find(|f| f.flight_number == answer)
        .ok_or_else(|| anyhow::anyhow!("flight {answer} is not one of the listed flights"))
}

fn prompt_parse<T>(label: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    prompt_with(label, |s| s.parse::<T>().map_err(|e| anyhow::anyhow!("{e}")))
}

fn confirm(question: &str) -> Result<bool> {
    prompt_with(&format!("{question} (y/n)"), |s| match s.to_ascii_lowercase().as_str() {
        "y" | "yes" => Ok(true),
        "n" | "no" => Ok(false),
        _ => anyhow::bail!("answer y or n"),
    })
}
