//! Incremental simulation driver.
//!
//! The driver keeps the engine causally consistent while the solver inserts
//! hypothetical activities one at a time. Inserting after the engine's clock
//! is cheap; inserting at or before it forces a restart from time zero and a
//! replay of every previously inserted activity, an O(k) cost that cannot be
//! avoided without giving up correct resource histories.

use std::collections::BTreeSet;

use tracing::debug;

use skyplan_core::Duration;

use crate::engine::{ResourceSamples, SerializedActivity, SimulationEngine};
use crate::error::{EngineError, Result, SimulationError};

#[derive(Debug, Clone)]
struct LoggedActivity {
    name: String,
    start: Duration,
    activity: SerializedActivity,
}

/// Drives a [`SimulationEngine`] under out-of-order insertions.
#[derive(Debug)]
pub struct IncrementalDriver {
    engine: Box<dyn SimulationEngine>,
    log: Vec<LoggedActivity>,
}

impl IncrementalDriver {
    pub fn new(engine: Box<dyn SimulationEngine>) -> IncrementalDriver {
        IncrementalDriver { engine, log: Vec::new() }
    }

    /// The number of activities inserted so far.
    pub fn inserted_count(&self) -> usize {
        self.log.len()
    }

    /// The engine's current clock, the watermark behind which insertions
    /// force a restart.
    pub fn watermark(&self) -> Duration {
        self.engine.clock()
    }

    /// Inserts one activity into the running simulation.
    ///
    /// If `start` is not after the watermark, the engine restarts from time
    /// zero and replays all previously inserted activities plus this one in
    /// start order. On failure the insertion log is unchanged and the
    /// engine is restored by replaying the previous log.
    pub fn simulate_activity(
        &mut self,
        activity: SerializedActivity,
        start: Duration,
        name: &str,
    ) -> Result<()> {
        let entry = LoggedActivity { name: name.to_owned(), start, activity };

        let in_order = self.log.is_empty() || start > self.watermark();
        if in_order {
            // Schedule and advance, no replay needed.
            match self.schedule_and_step(&entry) {
                Ok(()) => {
                    self.log.push(entry);
                    return Ok(());
                }
                Err(EngineError::StartInPast { .. }) => {
                    // The engine clock moved past the start since our last
                    // look; fall through to a restart.
                }
                Err(other) => {
                    // The engine may hold a half-applied schedule; rebuild
                    // it from the log before reporting the failure.
                    let previous = self.log.clone();
                    if let Err(redo) = self.replay(&previous) {
                        debug!(error = %redo, "replay of prior schedule also failed");
                    }
                    return Err(other.into());
                }
            }
        }

        debug!(
            activity = name,
            replayed = self.log.len(),
            "restarting simulation to keep causal order"
        );
        let mut replay: Vec<LoggedActivity> = self.log.clone();
        replay.push(entry);
        replay.sort_by(|a, b| a.start.cmp(&b.start));

        match self.replay(&replay) {
            Ok(()) => {
                self.log = replay;
                Ok(())
            }
            Err(err) => {
                // Restore the engine to the pre-insertion schedule; the
                // original error is the one worth reporting.
                let previous = self.log.clone();
                if let Err(redo) = self.replay(&previous) {
                    debug!(error = %redo, "replay of prior schedule also failed");
                }
                Err(err)
            }
        }
    }

    /// Removes the named activities and replays the survivors from zero.
    pub fn remove_activities(&mut self, names: &BTreeSet<String>) -> Result<()> {
        let survivors: Vec<LoggedActivity> =
            self.log.iter().filter(|e| !names.contains(&e.name)).cloned().collect();
        if survivors.len() == self.log.len() {
            return Ok(());
        }
        debug!(removed = self.log.len() - survivors.len(), "removing activities from simulation");
        self.replay(&survivors)?;
        self.log = survivors;
        Ok(())
    }

    /// Advances the engine clock; the watermark moves with it.
    pub fn advance_to(&mut self, time: Duration) -> Result<()> {
        self.engine.step_until(time).map_err(SimulationError::from)
    }

    /// The simulated duration of a named activity, once finished.
    pub fn activity_duration(&self, name: &str) -> Option<Duration> {
        self.engine.activity_duration(name)
    }

    /// Resource samples covering `[ZERO, until]`, advancing the engine as
    /// needed.
    pub fn sample_until(&mut self, until: Duration) -> Result<ResourceSamples> {
        self.engine.step_until(until)?;
        Ok(self.engine.resource_samples(until))
    }

    /// The declared resource kinds of the underlying engine.
    pub fn resource_schemas(&self) -> std::collections::BTreeMap<String, skyplan_core::ValueKind> {
        self.engine.resource_schemas()
    }

    fn schedule_and_step(&mut self, entry: &LoggedActivity) -> std::result::Result<(), EngineError> {
        self.engine.schedule(&entry.name, entry.start, &entry.activity)?;
        self.engine.step_until(entry.start)
    }

    fn replay(&mut self, entries: &[LoggedActivity]) -> Result<()> {
        self.engine.reset();
        for entry in entries {
            self.engine.schedule(&entry.name, entry.start, &entry.activity)?;
            self.engine.step_until(entry.start)?;
        }
        Ok(())
    }
}
