//! Check result statuses.

use serde::{Deserialize, Serialize};

/// Status of a single check result.
///
/// The first five are the valid labels a query row may carry in its `status`
/// column. `Empty` is synthetic, recorded when a control's query returns no
/// rows at all, and never parses from a row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Alarm,
    Ok,
    Info,
    Skip,
    Error,
    Empty,
}

impl Status {
    /// Parse a row-level status label, case-insensitively.
    pub fn parse(label: &str) -> Option<Status> {
        match label.to_ascii_lowercase().as_str() {
            "alarm" => Some(Status::Alarm),
            "ok" => Some(Status::Ok),
            "info" => Some(Status::Info),
            "skip" => Some(Status::Skip),
            "error" => Some(Status::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Alarm => "alarm",
            Status::Ok => "ok",
            Status::Info => "info",
            Status::Skip => "skip",
            Status::Error => "error",
            Status::Empty => "empty",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(Status::parse("ALARM"), Some(Status::Alarm));
        assert_eq!(Status::parse("Ok"), Some(Status::Ok));
        assert_eq!(Status::parse("skip"), Some(Status::Skip));
    }

    #[test]
    fn test_empty_never_parses() {
        assert_eq!(Status::parse("empty"), None);
        assert_eq!(Status::parse("unknown"), None);
    }
}
