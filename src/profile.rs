use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::macros::date;
use time::{Date, UtcOffset};
use tracing::debug;

use crate::AppResult;
use crate::pattern::ActivityConfig;
use crate::time_utils::DateRange;

pub const DEFAULT_START: Date = date!(2025 - 05 - 04);
pub const DEFAULT_END: Date = date!(2025 - 06 - 07);
pub const DEFAULT_PROBABILITY: f64 = 0.70;
pub const DEFAULT_MIN_EVENTS: u32 = 1;
pub const DEFAULT_MAX_EVENTS: u32 = 6;
pub const DEFAULT_FIRST_HOUR: u8 = 9;
pub const DEFAULT_LAST_HOUR: u8 = 18;
pub const DEFAULT_DELAY: Duration = Duration::from_millis(100);

pub const DEFAULT_TARGETS: &[&str] = &[
    "src/main/java/com/screenshare/server/ScreenShareServer.java",
    "src/main/java/com/screenshare/server/ClientHandler.java",
    "src/main/java/com/screenshare/server/ServerConfig.java",
    "src/main/java/com/screenshare/client/ScreenShareClient.java",
    "src/main/java/com/screenshare/client/ClientConfig.java",
    "src/main/java/com/screenshare/common/Message.java",
    "src/main/java/com/screenshare/common/MessageType.java",
    "src/main/java/com/screenshare/common/Protocol.java",
    "src/main/java/com/screenshare/common/NetworkBuffer.java",
    "src/main/java/com/screenshare/util/Logger.java",
];

pub const DEFAULT_ANNOTATIONS: &[&str] = &[
    "TODO: Add unit tests",
    "FIXME: Concurrency issue needs attention",
    "NOTE: Code modularity improved",
    "Refactored network layer",
    "Enhanced thread safety",
    "Optimized socket handling",
    "Improved error logging",
    "Updated server configuration handling",
    "Codebase cleanup and style consistency",
    "Improved object serialization logic",
    "Simplified client-server handshake",
    "Modularized protocol logic",
    "Improved message parsing reliability",
    "Logging mechanism refactored",
    "Added null safety checks",
    "Thread pooling enhanced",
    "Performance tweaks for high load",
    "Removed dead code from protocol",
    "Updated JavaDoc comments",
    "Introduced proper resource cleanup",
];

/// Run settings as read from a JSON profile or the command line. Unset fields
/// fall back to the next layer, and finally to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Profile {
    #[serde(
        with = "crate::serde_helpers::date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start: Option<Date>,
    #[serde(
        with = "crate::serde_helpers::date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end: Option<Date>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_events: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_events: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_hour: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_hour: Option<u8>,
    #[serde(
        with = "crate::serde_helpers::optional_duration",
        skip_serializing_if = "Option::is_none"
    )]
    pub delay: Option<Duration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<PathBuf>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<String>>,
}

impl Profile {
    /// Read a profile from a JSON file, reporting the path of any field that fails to parse.
    #[tracing::instrument(name = "Loading profile", level = "debug")]
    pub async fn load<P: AsRef<Path> + std::fmt::Debug>(path: P) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(&path).await?;
        let profile = Self::from_json(&raw)?;
        debug!("Loaded profile: {:?}", profile);
        Ok(profile)
    }

    pub fn from_json(raw: &str) -> AppResult<Self> {
        let jd = &mut serde_json::Deserializer::from_str(raw);
        Ok(serde_path_to_error::deserialize(jd)?)
    }

    /// Layer `overrides` on top of `self`; fields set in `overrides` win.
    pub fn merge(self, overrides: Profile) -> Profile {
        Profile {
            start: overrides.start.or(self.start),
            end: overrides.end.or(self.end),
            probability: overrides.probability.or(self.probability),
            min_events: overrides.min_events.or(self.min_events),
            max_events: overrides.max_events.or(self.max_events),
            first_hour: overrides.first_hour.or(self.first_hour),
            last_hour: overrides.last_hour.or(self.last_hour),
            delay: overrides.delay.or(self.delay),
            targets: overrides.targets.or(self.targets),
            annotations: overrides.annotations.or(self.annotations),
        }
    }

    /// Fill unset fields with defaults and validate the result.
    pub fn resolve(self, offset: UtcOffset) -> AppResult<ActivityConfig> {
        let config = ActivityConfig {
            range: DateRange::new(
                self.start.unwrap_or(DEFAULT_START),
                self.end.unwrap_or(DEFAULT_END),
            )?,
            probability: self.probability.unwrap_or(DEFAULT_PROBABILITY),
            min_events: self.min_events.unwrap_or(DEFAULT_MIN_EVENTS),
            max_events: self.max_events.unwrap_or(DEFAULT_MAX_EVENTS),
            first_hour: self.first_hour.unwrap_or(DEFAULT_FIRST_HOUR),
            last_hour: self.last_hour.unwrap_or(DEFAULT_LAST_HOUR),
            targets: self
                .targets
                .unwrap_or_else(|| DEFAULT_TARGETS.iter().map(PathBuf::from).collect()),
            annotations: self
                .annotations
                .unwrap_or_else(|| DEFAULT_ANNOTATIONS.iter().map(|s| s.to_string()).collect()),
            delay: self.delay.unwrap_or(DEFAULT_DELAY),
            offset,
        };
        config.validate()?;
        Ok(config)
    }
}

impl From<&ActivityConfig> for Profile {
    fn from(config: &ActivityConfig) -> Self {
        Profile {
            start: Some(config.range.start()),
            end: Some(config.range.end()),
            probability: Some(config.probability),
            min_events: Some(config.min_events),
            max_events: Some(config.max_events),
            first_hour: Some(config.first_hour),
            last_hour: Some(config.last_hour),
            delay: Some(config.delay),
            targets: Some(config.targets.clone()),
            annotations: Some(config.annotations.clone()),
        }
    }
}
