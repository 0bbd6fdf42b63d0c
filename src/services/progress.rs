use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Highest percentage the simulator ever reports. 100 is reserved for the
/// real result.
pub const PERCENT_CAP: u8 = 95;

// tokio intervals reject a zero period.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStage {
    pub key: &'static str,
    pub label: &'static str,
    /// Nominal duration shown to the user; the simulator itself advances on
    /// [`ProgressConfig::stage_advance`].
    pub nominal: Duration,
}

pub const PROGRESS_STAGES: &[ProgressStage] = &[
    ProgressStage {
        key: "detect",
        label: "Detecting barcodes and QR codes",
        nominal: Duration::from_millis(2000),
    },
    ProgressStage {
        key: "extract",
        label: "Extracting text from labels",
        nominal: Duration::from_millis(3000),
    },
    ProgressStage {
        key: "verify",
        label: "Verifying against GS1 database",
        nominal: Duration::from_millis(2500),
    },
    ProgressStage {
        key: "check_compliance",
        label: "Checking regulatory compliance",
        nominal: Duration::from_millis(2000),
    },
    ProgressStage {
        key: "analyze",
        label: "AI-powered authenticity analysis",
        nominal: Duration::from_millis(3000),
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Interval between one-percent increments.
    pub tick: Duration,
    /// Interval between stage advances.
    pub stage_advance: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(150),
            stage_advance: Duration::from_millis(3000),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StageStatus {
    Completed,
    Active,
    Pending,
}

/// Point-in-time view of the simulated progress.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub current_stage: usize,
    pub completed_stages: BTreeSet<usize>,
    pub percent: u8,
    pub running: bool,
}

impl ProgressSnapshot {
    fn started() -> Self {
        Self {
            current_stage: 0,
            completed_stages: BTreeSet::new(),
            percent: 0,
            running: true,
        }
    }

    pub fn stage(&self) -> &'static ProgressStage {
        &PROGRESS_STAGES[self.current_stage.min(PROGRESS_STAGES.len() - 1)]
    }

    pub fn stage_status(&self, index: usize) -> StageStatus {
        if self.completed_stages.contains(&index) {
            StageStatus::Completed
        } else if index == self.current_stage {
            StageStatus::Active
        } else {
            StageStatus::Pending
        }
    }
}

/// Cosmetic, wall-clock driven progress indicator.
///
/// Two independent timers run while the simulator is alive: one bumps the
/// percentage, the other advances the stage. Neither knows anything about
/// the real request. [`ProgressSimulator::stop`] (or dropping the simulator)
/// cancels both; no change is published after that.
pub struct ProgressSimulator {
    state: Arc<watch::Sender<ProgressSnapshot>>,
    tasks: Vec<JoinHandle<()>>,
}

impl ProgressSimulator {
    /// Start both timers. Must be called inside a Tokio runtime.
    pub fn start(config: ProgressConfig) -> Self {
        let config = ProgressConfig {
            tick: config.tick.max(MIN_INTERVAL),
            stage_advance: config.stage_advance.max(MIN_INTERVAL),
        };
        let (tx, _) = watch::channel(ProgressSnapshot::started());
        let state = Arc::new(tx);

        let percent_task = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + config.tick, config.tick);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let bumped = state.send_if_modified(|snap| {
                        if !snap.running || snap.percent >= PERCENT_CAP {
                            return false;
                        }
                        snap.percent += 1;
                        true
                    });
                    if !bumped {
                        break;
                    }
                }
            })
        };

        let stage_task = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                let last = PROGRESS_STAGES.len() - 1;
                let mut ticker =
                    interval_at(Instant::now() + config.stage_advance, config.stage_advance);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    let advanced = state.send_if_modified(|snap| {
                        if !snap.running || snap.current_stage >= last {
                            return false;
                        }
                        snap.completed_stages.insert(snap.current_stage);
                        snap.current_stage += 1;
                        true
                    });
                    if !advanced {
                        break;
                    }
                }
            })
        };

        tracing::debug!(
            tick_ms = config.tick.as_millis() as u64,
            stage_ms = config.stage_advance.as_millis() as u64,
            "Progress simulator started"
        );

        Self {
            state,
            tasks: vec![percent_task, stage_task],
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.borrow().clone()
    }

    /// Receive every published change until the simulator is torn down.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.state.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.state.borrow().running
    }

    /// Cancel both timers and freeze the last snapshot. Idempotent.
    pub fn stop(&mut self) {
        self.state.send_if_modified(|snap| {
            let was_running = snap.running;
            snap.running = false;
            was_running
        });
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for ProgressSimulator {
    fn drop(&mut self) {
        self.stop();
    }
}
