use std::collections::HashSet;
use std::path::{Component, PathBuf};
use std::time::Duration;

use time::UtcOffset;

use crate::time_utils::DateRange;
use crate::{AppError, AppResult};

/// Everything the activity generator needs for one run.
#[derive(Debug, Clone)]
pub struct ActivityConfig {
    pub range: DateRange,
    /// Chance that a given day receives any events.
    pub probability: f64,
    pub min_events: u32,
    pub max_events: u32,
    /// First and last hour (inclusive) an event may be placed in.
    pub first_hour: u8,
    pub last_hour: u8,
    /// Paths relative to the working tree.
    pub targets: Vec<PathBuf>,
    pub annotations: Vec<String>,
    /// Pause before each dispatch to the recorder.
    pub delay: Duration,
    pub offset: UtcOffset,
}

impl ActivityConfig {
    pub fn validate(&self) -> AppResult<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(AppError::InvalidConfig(format!(
                "probability must be within [0, 1], got {}",
                self.probability
            )));
        }
        if self.min_events == 0 || self.min_events > self.max_events {
            return Err(AppError::InvalidConfig(format!(
                "events per active day must satisfy 1 <= min <= max, got [{}, {}]",
                self.min_events, self.max_events
            )));
        }
        if self.first_hour > self.last_hour || self.last_hour > 23 {
            return Err(AppError::InvalidConfig(format!(
                "business hours must satisfy first <= last <= 23, got [{}, {}]",
                self.first_hour, self.last_hour
            )));
        }
        if self.targets.is_empty() {
            return Err(AppError::InvalidConfig(
                "at least one target file is required".to_string(),
            ));
        }
        if self.annotations.is_empty() {
            return Err(AppError::InvalidConfig(
                "at least one annotation is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for target in &self.targets {
            // Plain `a/b/c` only: no root, `.` or `..` segments.
            if !target
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
            {
                return Err(AppError::InvalidConfig(format!(
                    "target {} must be a plain path inside the working tree",
                    target.display()
                )));
            }
            if !seen.insert(target) {
                return Err(AppError::InvalidConfig(format!(
                    "target {} is listed more than once",
                    target.display()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use time::Date;

    /// A valid config over `start..=end` with `targets` x `annotations` generated names.
    pub(crate) fn config(start: Date, end: Date, targets: usize, annotations: usize) -> ActivityConfig {
        ActivityConfig {
            range: DateRange::new(start, end).unwrap(),
            probability: 0.7,
            min_events: 1,
            max_events: 6,
            first_hour: 9,
            last_hour: 18,
            targets: (0..targets)
                .map(|i| PathBuf::from(format!("src/file_{i}.java")))
                .collect(),
            annotations: (0..annotations).map(|i| format!("Note {i}")).collect(),
            delay: Duration::ZERO,
            offset: UtcOffset::UTC,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::config;
    use super::*;
    use time::macros::date;

    fn base() -> ActivityConfig {
        config(date!(2025 - 05 - 04), date!(2025 - 05 - 05), 3, 2)
    }

    #[test]
    fn accepts_fixture() {
        base().validate().unwrap();
    }

    #[test]
    fn rejects_probability_outside_unit_interval() {
        for p in [-0.1, 1.01, f64::NAN] {
            let cfg = ActivityConfig {
                probability: p,
                ..base()
            };
            assert!(matches!(cfg.validate(), Err(AppError::InvalidConfig(_))), "p = {p}");
        }
    }

    #[test]
    fn rejects_bad_event_bounds() {
        let zero = ActivityConfig {
            min_events: 0,
            ..base()
        };
        assert!(zero.validate().is_err());
        let inverted = ActivityConfig {
            min_events: 4,
            max_events: 3,
            ..base()
        };
        assert!(inverted.validate().is_err());
    }

    #[test]
    fn rejects_bad_hours() {
        let inverted = ActivityConfig {
            first_hour: 19,
            last_hour: 9,
            ..base()
        };
        assert!(inverted.validate().is_err());
        let overflow = ActivityConfig {
            last_hour: 24,
            ..base()
        };
        assert!(overflow.validate().is_err());
    }

    #[test]
    fn rejects_empty_sets_and_bad_targets() {
        let no_targets = ActivityConfig {
            targets: vec![],
            ..base()
        };
        assert!(no_targets.validate().is_err());
        let no_annotations = ActivityConfig {
            annotations: vec![],
            ..base()
        };
        assert!(no_annotations.validate().is_err());
        let absolute = ActivityConfig {
            targets: vec![PathBuf::from("/etc/hosts")],
            ..base()
        };
        assert!(absolute.validate().is_err());
        let duplicate = ActivityConfig {
            targets: vec![PathBuf::from("a.rs"), PathBuf::from("a.rs")],
            ..base()
        };
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn rejects_targets_leaving_the_working_tree() {
        for bad in ["../outside.txt", "./a.txt", "src/../../b.rs", "src/./c.rs"] {
            let cfg = ActivityConfig {
                targets: vec![PathBuf::from(bad)],
                ..base()
            };
            assert!(
                matches!(cfg.validate(), Err(AppError::InvalidConfig(_))),
                "{bad} should be rejected"
            );
        }
        let nested = ActivityConfig {
            targets: vec![PathBuf::from("src/main/java/App.java")],
            ..base()
        };
        nested.validate().unwrap();
    }
}
