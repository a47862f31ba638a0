// Snapshot report of the whole inventory: captured from the catalog and ledger,
// rendered as HTML tables or plain text, and handed to a dispatcher.

use std::string::FromUtf8Error;

use async_trait::async_trait;
use quick_xml::{
    events::{BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::{
    booking_ledger::{BookingLedger, Passenger},
    flight_catalog::{Flight, FlightCatalog},
};

const FLIGHT_COLUMNS: [&str; 6] = [
    "Flight number",
    "Departure",
    "Destination",
    "Departure time",
    "Aircraft type",
    "Available seats",
];

const PASSENGER_COLUMNS: [&str; 5] = [
    "Name",
    "Gender",
    "Weight of luggage",
    "Telephone number",
    "Flight number",
];

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Could not render report: {0}")]
    Render(#[from] quick_xml::Error),

    #[error("Report is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),

    #[error("Could not serialize snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid address: {0}")]
    Address(String),

    #[error("Could not build message: {0}")]
    Build(String),

    #[error("Failed to send report: {0}")]
    Transport(String),

    #[error("Report task failed: {0}")]
    Task(String),
}

// Read-only copy of the inventory at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct InventorySnapshot {
    pub flights: Vec<Flight>,
    pub passengers: Vec<Passenger>,
}

impl InventorySnapshot {
    pub fn capture(catalog: &FlightCatalog, ledger: &BookingLedger) -> Self {
        Self {
            flights: catalog.flights().to_vec(),
            passengers: ledger.list_passengers().into_iter().cloned().collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn flight_rows(&self) -> Vec<[String; 6]> {
        self.flights
            .iter()
            .map(|f| {
                [
                    f.flight_number.clone(),
                    f.departure.to_string(),
                    f.destination.to_string(),
                    f.departure_time_display(),
                    f.aircraft_type.to_string(),
                    f.available_seats.to_string(),
                ]
            })
            .collect()
    }

    fn passenger_rows(&self) -> Vec<[String; 5]> {
        self.passengers
            .iter()
            .map(|p| {
                [
                    p.name.clone(),
                    p.gender.to_string(),
                    format!("{}kg", p.luggage_kg),
                    p.phone.clone(),
                    p.flight_number.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect()
    }
}

pub fn render_html(snapshot: &InventorySnapshot) -> Result<String, ReportError> {
    let mut writer = Writer::new(Vec::new());

    writer.write_event(Event::Start(BytesStart::new("html")))?;
    writer.write_event(Event::Start(BytesStart::new("body")))?;
    write_table(&mut writer, "Flight Information", &FLIGHT_COLUMNS, &snapshot.flight_rows())?;
    write_table(
        &mut writer,
        "Passenger Information",
        &PASSENGER_COLUMNS,
        &snapshot.passenger_rows(),
    )?;
    writer.write_event(Event::End(BytesEnd::new("body")))?;
    writer.write_event(Event::End(BytesEnd::new("html")))?;

    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_table<const N: usize>(
    writer: &mut Writer<Vec<u8>>,
    title: &str,
    columns: &[&str; N],
    rows: &[[String; N]],
) -> Result<(), ReportError> {
    write_element(writer, "h2", title)?;
    writer.write_event(Event::Start(
        BytesStart::new("table").with_attributes([("border", "1")]),
    ))?;

    writer.write_event(Event::Start(BytesStart::new("tr")))?;
    for column in columns {
        write_element(writer, "th", column)?;
    }
    writer.write_event(Event::End(BytesEnd::new("tr")))?;

    for row in rows {
        writer.write_event(Event::Start(BytesStart::new("tr")))?;
        for cell in row {
            write_element(writer, "td", cell)?;
        }
        writer.write_event(Event::End(BytesEnd::new("tr")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("table")))?;
    Ok(())
}

fn write_element(writer: &mut Writer<Vec<u8>>, tag: &str, text: &str) -> Result<(), ReportError> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    // BytesText::new escapes markup characters
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

pub fn render_text(snapshot: &InventorySnapshot) -> String {
    let mut out = String::from("Flight Information\n");
    out.push_str(&text_table(&FLIGHT_COLUMNS, &snapshot.flight_rows()));
    out.push_str("\nPassenger Information\n");
    out.push_str(&text_table(&PASSENGER_COLUMNS, &snapshot.passenger_rows()));
    out
}

fn text_table<const N: usize>(columns: &[&str; N], rows: &[[String; N]]) -> String {
    let mut widths = [0usize; N];
    for (width, column) in widths.iter_mut().zip(columns) {
        *width = column.chars().count();
    }
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| {
        let padded: Vec<String> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect();
        format!("{}\n", padded.join(" | ").trim_end())
    };

    let mut out = line(columns.to_vec());
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    if rows.is_empty() {
        out.push_str("(none)\n");
    }
    out
}

#[async_trait]
pub trait ReportDispatcher: Send + Sync {
    async fn dispatch(&self, snapshot: &InventorySnapshot) -> Result<(), ReportError>;
}

// Prints the plain-text report to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDispatcher;

#[async_trait]
impl ReportDispatcher for ConsoleDispatcher {
    async fn dispatch(&self, snapshot: &InventorySnapshot) -> Result<(), ReportError> {
        println!("{}", render_text(snapshot));
        info!(
            flights = snapshot.flights.len(),
            passengers = snapshot.passengers.len(),
            "report printed to console"
        );
        Ok(())
    }
}
