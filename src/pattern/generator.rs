use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::AppResult;
use crate::git::Recorder;
use crate::pattern::config::ActivityConfig;
use crate::pattern::random::RandomSource;
use crate::time_utils::{TIMESTAMP_FORMAT, timestamp_on};
use crate::workspace::{Workspace, annotation_block};

/// Outcome of the activity draw for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDay {
    #[serde(with = "crate::serde_helpers::date")]
    pub date: Date,
    pub is_active: bool,
    /// Zero when inactive, otherwise within the configured events range.
    pub event_count: u32,
}

/// One simulated change, handed to the recorder and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timestamp: OffsetDateTime,
    pub target: PathBuf,
    pub annotation: String,
}

impl Event {
    pub fn commit_message(&self) -> String {
        let file_name = self
            .target
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| self.target.to_string_lossy());
        format!("Update {} - {}", file_name, self.annotation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    TargetMissing,
    AppendFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Recorded { id: String },
    Skipped(SkipReason),
}

/// Totals accumulated over a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_days: u32,
    pub active_days: u32,
    /// Events drawn across all active days.
    pub planned_events: u32,
    /// Events that reached the recorder.
    pub total_events: u32,
    pub skipped_events: u32,
    /// Distinct targets that received a recorded event.
    pub distinct_targets: u32,
}

impl RunSummary {
    pub fn active_ratio(&self) -> f64 {
        if self.total_days == 0 {
            0.0
        } else {
            f64::from(self.active_days) / f64::from(self.total_days)
        }
    }

    pub fn average_events_per_active_day(&self) -> f64 {
        if self.active_days == 0 {
            0.0
        } else {
            f64::from(self.total_events) / f64::from(self.active_days)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub days: Vec<ActivityDay>,
}

/// Walks the configured date range and dispatches randomized events to a recorder.
pub struct ActivityGenerator<R, W, C> {
    config: ActivityConfig,
    rng: R,
    workspace: W,
    recorder: C,
}

impl<R, W, C> ActivityGenerator<R, W, C>
where
    R: RandomSource,
    W: Workspace,
    C: Recorder,
{
    pub fn new(config: ActivityConfig, rng: R, workspace: W, recorder: C) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rng,
            workspace,
            recorder,
        })
    }

    /// Visit every day in the range once, in order. Recorder errors abort the run.
    #[tracing::instrument(
        name = "Generating activity",
        level = "info",
        skip(self),
        fields(range = %self.config.range, probability = self.config.probability)
    )]
    pub async fn run(&mut self) -> AppResult<RunReport> {
        let mut report = RunReport::default();
        let mut touched: HashSet<PathBuf> = HashSet::new();

        for date in self.config.range.days() {
            let day = self.plan_day(date);
            report.summary.total_days += 1;
            if !day.is_active {
                info!("{}: inactive", date);
                report.days.push(day);
                continue;
            }
            report.summary.active_days += 1;
            report.summary.planned_events += day.event_count;

            let mut events = (0..day.event_count)
                .map(|_| self.draw_event(date))
                .collect::<AppResult<Vec<Event>>>()?;
            // Keep the produced history monotonic within the day.
            events.sort_by_key(|e| e.timestamp);

            for event in &events {
                match self.dispatch(event).await? {
                    EventOutcome::Recorded { id } => {
                        report.summary.total_events += 1;
                        touched.insert(event.target.clone());
                        info!(
                            "  {} {} ({})",
                            event.timestamp.format(TIMESTAMP_FORMAT)?,
                            event.target.display(),
                            id
                        );
                    }
                    EventOutcome::Skipped(reason) => {
                        report.summary.skipped_events += 1;
                        debug!("Skipped event on {}: {:?}", event.target.display(), reason);
                    }
                }
            }
            info!("{}: {} events", date, day.event_count);
            report.days.push(day);
        }

        report.summary.distinct_targets = touched.len() as u32;
        Ok(report)
    }

    /// Draw whether `date` is active and, if so, how many events it gets.
    fn plan_day(&mut self, date: Date) -> ActivityDay {
        let is_active = self.rng.unit() < self.config.probability;
        let event_count = if is_active {
            self.rng
                .int_inclusive(self.config.min_events, self.config.max_events)
        } else {
            0
        };
        ActivityDay {
            date,
            is_active,
            event_count,
        }
    }

    /// Draw hour, minute, second, target and annotation, in that order.
    fn draw_event(&mut self, date: Date) -> AppResult<Event> {
        let hour = self.rng.int_inclusive(
            u32::from(self.config.first_hour),
            u32::from(self.config.last_hour),
        ) as u8;
        let minute = self.rng.int_inclusive(0, 59) as u8;
        let second = self.rng.int_inclusive(0, 59) as u8;
        let target = &self.config.targets[self.rng.index(self.config.targets.len())];
        let annotation = &self.config.annotations[self.rng.index(self.config.annotations.len())];
        Ok(Event {
            timestamp: timestamp_on(date, hour, minute, second, self.config.offset)?,
            target: target.clone(),
            annotation: annotation.clone(),
        })
    }

    async fn dispatch(&mut self, event: &Event) -> AppResult<EventOutcome> {
        if !self.config.delay.is_zero() {
            tokio::time::sleep(self.config.delay).await;
        }
        if !self.workspace.exists(&event.target) {
            warn!("File not found: {}", event.target.display());
            return Ok(EventOutcome::Skipped(SkipReason::TargetMissing));
        }
        let block = annotation_block(&event.target, &event.timestamp, &event.annotation)?;
        if let Err(e) = self.workspace.append(&event.target, &block) {
            error!("Error writing to {}: {}", event.target.display(), e);
            return Ok(EventOutcome::Skipped(SkipReason::AppendFailed));
        }
        self.stage_and_commit(&event.target, &event.commit_message(), &event.timestamp)
    }

    fn stage_and_commit(
        &mut self,
        target: &Path,
        message: &str,
        timestamp: &OffsetDateTime,
    ) -> AppResult<EventOutcome> {
        self.recorder.stage(target)?;
        let id = self.recorder.commit_at(message, timestamp)?;
        Ok(EventOutcome::Recorded { id })
    }
}
