//! Validation status values

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of checking a node against the live scene.
///
/// `MissingSource` and `MissingDestination` are reportable outcomes, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    NotApplicable,
    Passed,
    Failed,
    MissingSource,
    MissingDestination,
}

impl Status {
    /// Roll-up precedence: `MissingSource > MissingDestination > Failed > Passed > NotApplicable`
    pub fn severity(self) -> u8 {
        match self {
            Status::NotApplicable => 0,
            Status::Passed => 1,
            Status::Failed => 2,
            Status::MissingDestination => 3,
            Status::MissingSource => 4,
        }
    }

    /// The more severe of two statuses
    pub fn worst(self, other: Status) -> Status {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// Worst-case roll-up of a sequence of statuses
    pub fn roll_up<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses
            .into_iter()
            .fold(Status::NotApplicable, Status::worst)
    }

    pub fn is_passed(self) -> bool {
        self == Status::Passed
    }

    /// True for any outcome worse than `Passed`
    pub fn is_failing(self) -> bool {
        self.severity() > Status::Passed.severity()
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::NotApplicable => "n/a",
            Status::Passed => "passed",
            Status::Failed => "failed",
            Status::MissingSource => "missing source",
            Status::MissingDestination => "missing destination",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_up_precedence() {
        assert_eq!(
            Status::roll_up([Status::Passed, Status::Failed, Status::Passed]),
            Status::Failed
        );
        assert_eq!(
            Status::roll_up([Status::MissingDestination, Status::Failed]),
            Status::MissingDestination
        );
        assert_eq!(
            Status::roll_up([
                Status::Failed,
                Status::MissingSource,
                Status::MissingDestination
            ]),
            Status::MissingSource
        );
        assert_eq!(Status::roll_up([]), Status::NotApplicable);
    }

    #[test]
    fn test_failing() {
        assert!(!Status::NotApplicable.is_failing());
        assert!(!Status::Passed.is_failing());
        assert!(Status::Failed.is_failing());
        assert!(Status::MissingSource.is_failing());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&Status::MissingDestination).unwrap();
        assert_eq!(json, "\"missing_destination\"");
    }
}
