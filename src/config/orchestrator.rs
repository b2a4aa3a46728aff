// ABOUTME: Orchestrator running on the target cluster.
// ABOUTME: Selects which deployment pipeline a run uses.

use serde::de::{self, Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orchestrator {
    /// DC/OS with Marathon.
    #[default]
    Marathon,
    Kubernetes,
}

impl FromStr for Orchestrator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "marathon" | "dcos" => Ok(Orchestrator::Marathon),
            "kubernetes" | "k8s" => Ok(Orchestrator::Kubernetes),
            _ => Err(format!("unknown orchestrator: {}", s)),
        }
    }
}

impl fmt::Display for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orchestrator::Marathon => write!(f, "marathon"),
            Orchestrator::Kubernetes => write!(f, "kubernetes"),
        }
    }
}

impl<'de> Deserialize<'de> for Orchestrator {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("marathon".parse(), Ok(Orchestrator::Marathon));
        assert_eq!("DCOS".parse(), Ok(Orchestrator::Marathon));
        assert_eq!("k8s".parse(), Ok(Orchestrator::Kubernetes));
        assert!("swarm".parse::<Orchestrator>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for o in [Orchestrator::Marathon, Orchestrator::Kubernetes] {
            assert_eq!(o.to_string().parse(), Ok(o));
        }
    }
}
