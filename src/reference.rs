// Reference data: the closed sets of airports, cities and aircraft the desk works with,
// and the route duration table the fares are derived from.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InventoryError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Airport {
    BeijingCapital,
    ShanghaiPudong,
    GuangzhouBaiyun,
    NanjingLukou,
    ShenzhenBaoan,
    ChengduTianfu,
    WuhanTianhe,
    SunanShuofang,
}

impl Airport {
    // Order matches the rows of ROUTE_HOURS
    pub const ALL: [Airport; 8] = [
        Airport::BeijingCapital,
        Airport::ShanghaiPudong,
        Airport::GuangzhouBaiyun,
        Airport::NanjingLukou,
        Airport::ShenzhenBaoan,
        Airport::ChengduTianfu,
        Airport::WuhanTianhe,
        Airport::SunanShuofang,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Airport::BeijingCapital => "Beijing Capital International Airport",
            Airport::ShanghaiPudong => "Shanghai Pudong International Airport",
            Airport::GuangzhouBaiyun => "Guangzhou Baiyun International Airport",
            Airport::NanjingLukou => "Nanjing Lukou International Airport",
            Airport::ShenzhenBaoan => "Shenzhen Bao'an International Airport",
            Airport::ChengduTianfu => "Chengdu Tianfu International Airport",
            Airport::WuhanTianhe => "Wuhan Tianhe International Airport",
            Airport::SunanShuofang => "Sunan Shuofang International Airport",
        }
    }

    pub fn iata(&self) -> &'static str {
        match self {
            Airport::BeijingCapital => "PEK",
            Airport::ShanghaiPudong => "PVG",
            Airport::GuangzhouBaiyun => "CAN",
            Airport::NanjingLukou => "NKG",
            Airport::ShenzhenBaoan => "SZX",
            Airport::ChengduTianfu => "TFU",
            Airport::WuhanTianhe => "WUH",
            Airport::SunanShuofang => "WUX",
        }
    }

    pub fn city(&self) -> City {
        match self {
            Airport::BeijingCapital => City::Beijing,
            Airport::ShanghaiPudong => City::Shanghai,
            Airport::GuangzhouBaiyun => City::Guangzhou,
            Airport::NanjingLukou => City::Nanjing,
            Airport::ShenzhenBaoan => City::Shenzhen,
            Airport::ChengduTianfu => City::Chengdu,
            Airport::WuhanTianhe => City::Wuhan,
            Airport::SunanShuofang => City::Wuxi,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Accepts the full airport name, the IATA code or the city name
impl FromStr for Airport {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Airport::ALL
            .into_iter()
            .find(|a| {
                a.name().eq_ignore_ascii_case(wanted)
                    || a.iata().eq_ignore_ascii_case(wanted)
                    || a.city().name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| InventoryError::Validation(format!("Invalid airport: {}", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum City {
    Beijing,
    Shanghai,
    Guangzhou,
    Nanjing,
    Shenzhen,
    Chengdu,
    Wuhan,
    Wuxi,
}

impl City {
    pub const ALL: [City; 8] = [
        City::Beijing,
        City::Shanghai,
        City::Guangzhou,
        City::Nanjing,
        City::Shenzhen,
        City::Chengdu,
        City::Wuhan,
        City::Wuxi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            City::Beijing => "Beijing",
            City::Shanghai => "Shanghai",
            City::Guangzhou => "Guangzhou",
            City::Nanjing => "Nanjing",
            City::Shenzhen => "Shenzhen",
            City::Chengdu => "Chengdu",
            City::Wuhan => "Wuhan",
            City::Wuxi => "Wuxi",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        City::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InventoryError::Validation(format!("Unknown city: {}", wanted)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AircraftType {
    Boeing737,
    Boeing747,
    Boeing777,
    Boeing787,
    Airbus320,
    Airbus380,
}

impl AircraftType {
    pub const ALL: [AircraftType; 6] = [
        AircraftType::Boeing737,
        AircraftType::Boeing747,
        AircraftType::Boeing777,
        AircraftType::Boeing787,
        AircraftType::Airbus320,
        AircraftType::Airbus380,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AircraftType::Boeing737 => "Boeing 737",
            AircraftType::Boeing747 => "Boeing 747",
            AircraftType::Boeing777 => "Boeing 777",
            AircraftType::Boeing787 => "Boeing 787",
            AircraftType::Airbus320 => "Airbus 320",
            AircraftType::Airbus380 => "Airbus 380",
        }
    }
}

impl fmt::Display for AircraftType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AircraftType {
    type Err = InventoryError;

    // "Boeing 737", "boeing737" and "A380" style inputs are all accepted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_ascii_lowercase();
        AircraftType::ALL
            .into_iter()
            .find(|t| {
                let name: String = t.name().split_whitespace().collect::<String>().to_ascii_lowercase();
                name == compact || name.replace("airbus", "a") == compact
            })
            .ok_or_else(|| InventoryError::Validation(format!("Invalid aircraft type: {}", s.trim())))
    }
}

// Flight hours between airports, indexed in Airport::ALL order. The diagonal is never read.
const ROUTE_HOURS: [[f64; 8]; 8] = [
    [0.0, 2.0, 2.5, 1.5, 3.0, 2.0, 2.0, 2.0],
    [2.0, 0.0, 2.0, 1.0, 2.5, 3.0, 1.5, 0.5],
    [2.5, 2.0, 0.0, 2.0, 1.5, 2.0, 2.0, 1.5],
    [1.5, 1.0, 2.0, 0.0, 2.0, 1.5, 2.0, 1.5],
    [3.0, 2.5, 1.5, 2.0, 0.0, 1.5, 2.0, 2.0],
    [2.0, 3.0, 2.0, 1.5, 1.5, 0.0, 1.5, 2.0],
    [2.0, 1.5, 2.0, 2.0, 2.0, 1.5, 0.0, 1.5],
    [2.0, 0.5, 1.5, 1.5, 2.0, 2.0, 1.5, 0.0],
];

// Hours for an ordered pair of distinct airports. A same-airport pair has no entry.
pub fn route_hours(departure: Airport, destination: Airport) -> Result<f64, InventoryError> {
    if departure == destination {
        return Err(InventoryError::Configuration(format!(
            "No flight time data available between {} and {}",
            departure, destination
        )));
    }
    Ok(ROUTE_HOURS[departure.index()][destination.index()])
}
