//! Log severity levels
//!
//! Levels are totally ordered (`Debug < Info < Warning < Error < Critical`)
//! so filters can compare them directly. The wire/config spelling is the
//! uppercase name; `WARN` and `FATAL` are accepted as aliases.

use serde::{Deserialize, Serialize};

/// Log severity level
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    /// Diagnostic detail, normally filtered out
    Debug,
    /// Normal operation (default)
    #[default]
    Info,
    /// Something unexpected but tolerable
    #[serde(alias = "WARN")]
    Warning,
    /// An operation failed
    Error,
    /// The application cannot continue
    #[serde(alias = "FATAL")]
    Critical,
}

impl Level {
    /// Canonical uppercase name, as stored in event data
    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    /// Check if this is an error-level event (Error or Critical)
    #[inline]
    pub const fn is_error(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when a level name cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown level name: `{0}`")]
pub struct UnknownLevel(pub String);

impl std::str::FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            other => Err(UnknownLevel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warning);
        assert!(Level::Warning < Level::Error);
        assert!(Level::Error < Level::Critical);
    }

    #[test]
    fn test_level_round_trip() {
        for level in [
            Level::Debug,
            Level::Info,
            Level::Warning,
            Level::Error,
            Level::Critical,
        ] {
            assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn test_level_aliases() {
        assert_eq!("WARN".parse::<Level>().unwrap(), Level::Warning);
        assert_eq!("FATAL".parse::<Level>().unwrap(), Level::Critical);
    }

    #[test]
    fn test_level_unknown() {
        let err = "VERBOSE".parse::<Level>().unwrap_err();
        assert!(err.to_string().contains("VERBOSE"));
    }

    #[test]
    fn test_level_is_error() {
        assert!(!Level::Warning.is_error());
        assert!(Level::Error.is_error());
        assert!(Level::Critical.is_error());
    }
}
