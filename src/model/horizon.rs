use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Forecast horizons supported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Horizon {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl Horizon {
    pub const ALL: [Horizon; 6] = [
        Horizon::M1,
        Horizon::M5,
        Horizon::M15,
        Horizon::H1,
        Horizon::H4,
        Horizon::D1,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "1m",
            Self::M5 => "5m",
            Self::M15 => "15m",
            Self::H1 => "1h",
            Self::H4 => "4h",
            Self::D1 => "1d",
        }
    }

    pub fn minutes(self) -> f64 {
        match self {
            Self::M1 => 1.0,
            Self::M5 => 5.0,
            Self::M15 => 15.0,
            Self::H1 => 60.0,
            Self::H4 => 240.0,
            Self::D1 => 1_440.0,
        }
    }

    pub fn days(self) -> f64 {
        self.minutes() / 1_440.0
    }

    /// Parse a list of horizon ids, failing on the first unsupported one.
    /// Duplicates are dropped while preserving order.
    pub fn parse_list<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Horizon>, ForecastError> {
        let mut out: Vec<Horizon> = Vec::with_capacity(ids.len());
        for id in ids {
            let h: Horizon = id.as_ref().parse()?;
            if !out.contains(&h) {
                out.push(h);
            }
        }
        Ok(out)
    }
}

impl FromStr for Horizon {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1m" => Ok(Self::M1),
            "5m" => Ok(Self::M5),
            "15m" => Ok(Self::M15),
            "1h" | "60m" => Ok(Self::H1),
            "4h" => Ok(Self::H4),
            "1d" => Ok(Self::D1),
            _ => Err(ForecastError::InvalidHorizon(s.to_string())),
        }
    }
}

impl TryFrom<String> for Horizon {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Horizon> for String {
    fn from(h: Horizon) -> Self {
        h.as_str().to_string()
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_ids_case_insensitively() {
        assert_eq!("1M".parse::<Horizon>().unwrap(), Horizon::M1);
        assert_eq!(" 15m ".parse::<Horizon>().unwrap(), Horizon::M15);
        assert_eq!("60m".parse::<Horizon>().unwrap(), Horizon::H1);
        assert_eq!("1d".parse::<Horizon>().unwrap(), Horizon::D1);
    }

    #[test]
    fn rejects_unsupported_ids() {
        assert_eq!(
            "2h".parse::<Horizon>(),
            Err(ForecastError::InvalidHorizon("2h".to_string()))
        );
        assert!("".parse::<Horizon>().is_err());
    }

    #[test]
    fn parse_list_dedups_in_order() {
        let hs = Horizon::parse_list(&["1h", "5m", "1h"]).unwrap();
        assert_eq!(hs, vec![Horizon::H1, Horizon::M5]);
    }
}
