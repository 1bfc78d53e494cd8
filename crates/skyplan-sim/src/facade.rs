//! The scheduler-facing simulation facade.
//!
//! The facade answers two questions for the solver: "what happens to the
//! resources if this activity exists" and "how long does this activity
//! actually take". It serializes activities across the engine boundary,
//! keeps the incremental driver causally consistent, and republishes
//! resource histories into [`SimResource`] handles that constraints hold on
//! to.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, warn};

use skyplan_core::{ActivityInstance, Duration, Parameter, PlanningHorizon, Value};

use crate::driver::IncrementalDriver;
use crate::engine::{SerializedActivity, SerializedValue, SimulationEngine};
use crate::error::{Result, SimulationError};
use crate::resource::SimResource;

/// Facade over the incremental simulation of one solve.
#[derive(Debug)]
pub struct SimulationFacade {
    driver: IncrementalDriver,
    horizon: PlanningHorizon,
    resources: BTreeMap<String, Arc<SimResource>>,
    results_dirty: bool,
    results_until: Option<Duration>,
}

impl SimulationFacade {
    pub fn new(horizon: PlanningHorizon, engine: Box<dyn SimulationEngine>) -> SimulationFacade {
        SimulationFacade {
            driver: IncrementalDriver::new(engine),
            horizon,
            resources: BTreeMap::new(),
            results_dirty: false,
            results_until: None,
        }
    }

    pub fn horizon(&self) -> &PlanningHorizon {
        &self.horizon
    }

    /// A shared handle on the named resource's history. The handle stays
    /// valid across re-simulations; its timeline is refreshed in place.
    pub fn get_resource(&mut self, name: &str) -> Arc<SimResource> {
        self.resources.entry(name.to_owned()).or_insert_with(|| SimResource::new(name)).clone()
    }

    /// Inserts one hypothetical activity into the running simulation.
    ///
    /// Deferred parameters are resolved against the activity's own times
    /// before crossing the engine boundary; a declared duration travels as
    /// the engine's `duration` argument.
    pub fn simulate_activity(&mut self, act: &ActivityInstance) -> Result<()> {
        let start = act
            .start_time()
            .ok_or_else(|| SimulationError::UnscheduledActivity(act.name().to_owned()))?;
        let serialized = self.serialize_activity(act)?;
        self.driver.simulate_activity(serialized, start, act.name())?;
        self.results_dirty = true;
        debug!(activity = act.name(), %start, "activity inserted into simulation");
        Ok(())
    }

    /// Inserts several activities, in start order so that no insertion
    /// needlessly restarts the engine.
    pub fn simulate_activities(&mut self, acts: &[&ActivityInstance]) -> Result<()> {
        let mut sorted: Vec<&ActivityInstance> = acts.to_vec();
        sorted.sort_by_key(|a| a.start_time());
        for act in sorted {
            self.simulate_activity(act)?;
        }
        Ok(())
    }

    /// Removes the named activities from the simulation, replaying the
    /// survivors.
    pub fn remove_activities_from_simulation(&mut self, names: &BTreeSet<String>) -> Result<()> {
        self.driver.remove_activities(names)?;
        self.results_dirty = true;
        Ok(())
    }

    /// The simulated duration of a named activity; absent until the
    /// activity has been simulated and has finished.
    pub fn get_activity_duration(&self, name: &str) -> Option<Duration> {
        self.driver.activity_duration(name)
    }

    /// The simulated duration of a named activity, advancing the engine to
    /// the end of the horizon if the activity has not finished yet.
    pub fn computed_activity_duration(&mut self, name: &str) -> Result<Option<Duration>> {
        if let Some(duration) = self.driver.activity_duration(name) {
            return Ok(Some(duration));
        }
        self.driver.advance_to(self.horizon.end())?;
        Ok(self.driver.activity_duration(name))
    }

    /// Ensures the published resource histories cover `[ZERO, end]` and are
    /// current.
    ///
    /// Results are cached: if they already cover the requested horizon and
    /// no insertion or removal has happened since, nothing is regenerated.
    /// Dirtiness is set on every successful insertion and cleared only
    /// here.
    pub fn get_simulation_results_until(&mut self, end: Duration) -> Result<()> {
        if !self.results_dirty && self.results_until.is_some_and(|covered| covered >= end) {
            return Ok(());
        }

        let samples = self.driver.sample_until(end)?;
        let schemas = self.driver.resource_schemas();
        for (name, kind) in &schemas {
            let resource = self.get_resource(name);
            let series = samples.get(name).map(Vec::as_slice).unwrap_or(&[]);
            if series.is_empty() {
                warn!(resource = name.as_str(), "engine reported no samples for resource");
                continue;
            }
            resource.replace_timeline(*kind, series, end)?;
        }
        self.results_dirty = false;
        self.results_until = Some(end);
        debug!(until = %end, resources = schemas.len(), "simulation results regenerated");
        Ok(())
    }

    /// Whether published results are stale with respect to the simulation.
    pub fn results_dirty(&self) -> bool {
        self.results_dirty
    }

    /// The number of activities currently inserted into the simulation.
    pub fn inserted_count(&self) -> usize {
        self.driver.inserted_count()
    }

    fn serialize_activity(&self, act: &ActivityInstance) -> Result<SerializedActivity> {
        let mut serialized = SerializedActivity::new(act.activity_type().name());
        for (name, parameter) in act.parameters() {
            let value: Value = match parameter {
                Parameter::Value(value) => value.clone(),
                Parameter::Query { .. } => parameter
                    .resolve(name, act.start_time(), act.end_time())
                    .map_err(|_| SimulationError::UnresolvedParameter {
                        activity: act.name().to_owned(),
                        parameter: name.clone(),
                    })?,
            };
            let _ = serialized.arguments.insert(name.clone(), SerializedValue::from_value(&value));
        }
        if let Some(duration) = act.duration() {
            let _ = serialized
                .arguments
                .insert("duration".to_owned(), SerializedValue::Micros(duration.in_microseconds()));
        }
        Ok(serialized)
    }
}
