// ABOUTME: A workload port that must be reachable from outside the cluster.
// ABOUTME: Parses "8080", "8080:80", and "8080:80/udp" forms.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseServicePortError {
    #[error("service port cannot be empty")]
    Empty,

    #[error("invalid port number '{0}'")]
    InvalidPort(String),

    #[error("port 0 cannot be exposed")]
    ZeroPort,

    #[error("unknown protocol '{0}' (expected tcp or udp)")]
    UnknownProtocol(String),
}

/// Transport protocol of a service port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl FromStr for Protocol {
    type Err = ParseServicePortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Protocol::Tcp),
            "udp" => Ok(Protocol::Udp),
            _ => Err(ParseServicePortError::UnknownProtocol(s.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired exposure of one workload port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServicePort {
    external: u16,
    internal: u16,
    protocol: Protocol,
}

impl ServicePort {
    pub fn new(external: u16, internal: u16, protocol: Protocol) -> Self {
        Self {
            external,
            internal,
            protocol,
        }
    }

    /// Parse `external[:internal][/protocol]`. Internal defaults to external, protocol to TCP.
    pub fn parse(s: &str) -> Result<Self, ParseServicePortError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseServicePortError::Empty);
        }

        let (ports, protocol) = match s.split_once('/') {
            Some((ports, proto)) => (ports, proto.parse()?),
            None => (s, Protocol::default()),
        };

        let (external, internal) = match ports.split_once(':') {
            Some((ext, int)) => (parse_port(ext)?, parse_port(int)?),
            None => {
                let port = parse_port(ports)?;
                (port, port)
            }
        };

        Ok(Self::new(external, internal, protocol))
    }

    pub fn external(&self) -> u16 {
        self.external
    }

    pub fn internal(&self) -> u16 {
        self.internal
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }
}

fn parse_port(s: &str) -> Result<u16, ParseServicePortError> {
    let port = s
        .trim()
        .parse::<u16>()
        .map_err(|_| ParseServicePortError::InvalidPort(s.to_string()))?;
    if port == 0 {
        return Err(ParseServicePortError::ZeroPort);
    }
    Ok(port)
}

impl FromStr for ServicePort {
    type Err = ParseServicePortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ServicePort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}/{}",
            self.external,
            self.internal,
            self.protocol.as_str().to_ascii_lowercase()
        )
    }
}
