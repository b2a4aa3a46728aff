// ABOUTME: Destination port specification of a firewall rule.
// ABOUTME: Parses the wildcard, single port, and inclusive range forms.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParsePortSpecError {
    #[error("port specification cannot be empty")]
    Empty,

    #[error("invalid port number '{0}'")]
    InvalidPort(String),

    #[error("invalid port range '{0}': lower bound exceeds upper bound")]
    InvertedRange(String),
}

/// The ports a firewall rule's destination covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSpec {
    /// `*`: every port.
    Any,
    /// A single port such as `8080`.
    Single(u16),
    /// An inclusive range such as `8000-9000`.
    Range { lo: u16, hi: u16 },
}

impl PortSpec {
    pub fn parse(s: &str) -> Result<Self, ParsePortSpecError> {
        if s.is_empty() {
            return Err(ParsePortSpecError::Empty);
        }

        if s == "*" {
            return Ok(PortSpec::Any);
        }

        match s.split_once('-') {
            Some((lo, hi)) => {
                let lo = parse_port(lo)?;
                let hi = parse_port(hi)?;
                if lo > hi {
                    return Err(ParsePortSpecError::InvertedRange(s.to_string()));
                }
                Ok(PortSpec::Range { lo, hi })
            }
            None => parse_port(s).map(PortSpec::Single),
        }
    }

    pub fn covers(&self, port: u16) -> bool {
        match *self {
            PortSpec::Any => true,
            PortSpec::Single(p) => p == port,
            PortSpec::Range { lo, hi } => (lo..=hi).contains(&port),
        }
    }
}

fn parse_port(s: &str) -> Result<u16, ParsePortSpecError> {
    // u16::from_str accepts a leading '+', which is not a valid port token.
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParsePortSpecError::InvalidPort(s.to_string()));
    }
    s.parse::<u16>()
        .map_err(|_| ParsePortSpecError::InvalidPort(s.to_string()))
}

impl FromStr for PortSpec {
    type Err = ParsePortSpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortSpec::Any => write!(f, "*"),
            PortSpec::Single(p) => write!(f, "{p}"),
            PortSpec::Range { lo, hi } => write!(f, "{lo}-{hi}"),
        }
    }
}
