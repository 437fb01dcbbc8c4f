use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::CassError;

/// Replica acknowledgement level for a request.
///
/// Stored as the protocol code so that codes this crate does not name still
/// round-trip and render instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Consistency(u16);

impl Consistency {
    pub const ANY: Consistency = Consistency(0x00);
    pub const ONE: Consistency = Consistency(0x01);
    pub const TWO: Consistency = Consistency(0x02);
    pub const THREE: Consistency = Consistency(0x03);
    pub const QUORUM: Consistency = Consistency(0x04);
    pub const ALL: Consistency = Consistency(0x05);
    pub const LOCAL_QUORUM: Consistency = Consistency(0x06);
    pub const EACH_QUORUM: Consistency = Consistency(0x07);
    pub const LOCAL_ONE: Consistency = Consistency(0x0A);

    pub const KNOWN: [Consistency; 9] = [
        Consistency::ANY,
        Consistency::ONE,
        Consistency::TWO,
        Consistency::THREE,
        Consistency::QUORUM,
        Consistency::ALL,
        Consistency::LOCAL_QUORUM,
        Consistency::EACH_QUORUM,
        Consistency::LOCAL_ONE,
    ];

    pub const fn from_code(code: u16) -> Self {
        Consistency(code)
    }

    pub const fn code(self) -> u16 {
        self.0
    }

    fn name(self) -> Option<&'static str> {
        match self {
            Consistency::ANY => Some("ANY"),
            Consistency::ONE => Some("ONE"),
            Consistency::TWO => Some("TWO"),
            Consistency::THREE => Some("THREE"),
            Consistency::QUORUM => Some("QUORUM"),
            Consistency::ALL => Some("ALL"),
            Consistency::LOCAL_QUORUM => Some("LOCAL_QUORUM"),
            Consistency::EACH_QUORUM => Some("EACH_QUORUM"),
            Consistency::LOCAL_ONE => Some("LOCAL_ONE"),
            _ => None,
        }
    }

    pub fn is_known(self) -> bool {
        self.name().is_some()
    }

    /// Name used as a metrics label. Every unknown code shares `UNKNOWN`.
    pub fn label(self) -> &'static str {
        self.name().unwrap_or("UNKNOWN")
    }
}

impl Default for Consistency {
    fn default() -> Self {
        Consistency::ONE
    }
}

impl fmt::Display for Consistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "UNKNOWN_CONS_0x{:x}", self.0),
        }
    }
}

impl FromStr for Consistency {
    type Err = CassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        Consistency::KNOWN
            .iter()
            .copied()
            .find(|c| c.name() == Some(wanted.as_str()))
            .ok_or_else(|| CassError::Config(format!("Unknown consistency level: {}", s)))
    }
}

impl Serialize for Consistency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Consistency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl TryFrom<Consistency> for scylla::statement::Consistency {
    type Error = CassError;

    fn try_from(c: Consistency) -> Result<Self, Self::Error> {
        use scylla::statement::Consistency as Driver;

        match c {
            Consistency::ANY => Ok(Driver::Any),
            Consistency::ONE => Ok(Driver::One),
            Consistency::TWO => Ok(Driver::Two),
            Consistency::THREE => Ok(Driver::Three),
            Consistency::QUORUM => Ok(Driver::Quorum),
            Consistency::ALL => Ok(Driver::All),
            Consistency::LOCAL_QUORUM => Ok(Driver::LocalQuorum),
            Consistency::EACH_QUORUM => Ok(Driver::EachQuorum),
            Consistency::LOCAL_ONE => Ok(Driver::LocalOne),
            _ => Err(CassError::Unsupported),
        }
    }
}

/// Consistency of the Paxos phase of lightweight transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SerialConsistency {
    Serial,
    LocalSerial,
}

impl fmt::Display for SerialConsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialConsistency::Serial => f.write_str("SERIAL"),
            SerialConsistency::LocalSerial => f.write_str("LOCAL_SERIAL"),
        }
    }
}

impl From<SerialConsistency> for scylla::statement::SerialConsistency {
    fn from(c: SerialConsistency) -> Self {
        match c {
            SerialConsistency::Serial => scylla::statement::SerialConsistency::Serial,
            SerialConsistency::LocalSerial => scylla::statement::SerialConsistency::LocalSerial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        let expected = [
            "ANY",
            "ONE",
            "TWO",
            "THREE",
            "QUORUM",
            "ALL",
            "LOCAL_QUORUM",
            "EACH_QUORUM",
            "LOCAL_ONE",
        ];
        for (c, name) in Consistency::KNOWN.iter().zip(expected) {
            assert_eq!(c.to_string(), name);
        }
        assert_eq!(Consistency::QUORUM.to_string(), "QUORUM");
    }

    #[test]
    fn test_unknown_code_renders_hex() {
        assert_eq!(Consistency::from_code(0xFF).to_string(), "UNKNOWN_CONS_0xff");
        assert_eq!(Consistency::from_code(0x08).to_string(), "UNKNOWN_CONS_0x8");
        assert_eq!(Consistency::from_code(0x08).label(), "UNKNOWN");
        assert_eq!(Consistency::LOCAL_ONE.label(), "LOCAL_ONE");
        assert_eq!(Consistency::from_code(u16::MAX).to_string(), "UNKNOWN_CONS_0xffff");
        assert!(!Consistency::from_code(0xFF).is_known());
    }

    #[test]
    fn test_default_is_one() {
        assert_eq!(Consistency::default(), Consistency::ONE);
        assert_eq!(Consistency::ONE.code(), 0x01);
        assert_eq!(Consistency::LOCAL_ONE.code(), 0x0A);
    }

    #[test]
    fn test_parse() {
        assert_eq!("quorum".parse::<Consistency>().unwrap(), Consistency::QUORUM);
        assert_eq!("local-one".parse::<Consistency>().unwrap(), Consistency::LOCAL_ONE);
        assert_eq!(" EACH_QUORUM ".parse::<Consistency>().unwrap(), Consistency::EACH_QUORUM);
        assert!("SERIAL".parse::<Consistency>().is_err());
    }

    #[test]
    fn test_serde_uses_names() {
        let json = serde_json::to_string(&Consistency::LOCAL_QUORUM).unwrap();
        assert_eq!(json, "\"LOCAL_QUORUM\"");
        let back: Consistency = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(back, Consistency::ALL);
        assert!(serde_json::from_str::<Consistency>("\"MOST\"").is_err());
    }

    #[test]
    fn test_driver_conversion() {
        let driver: scylla::statement::Consistency = Consistency::QUORUM.try_into().unwrap();
        assert_eq!(driver, scylla::statement::Consistency::Quorum);

        let unknown: Result<scylla::statement::Consistency, _> =
            Consistency::from_code(0x42).try_into();
        assert_eq!(unknown, Err(CassError::Unsupported));
    }
}
