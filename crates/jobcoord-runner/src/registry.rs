//! # Task Factory Registry
//!
//! Maps a procedure name to a constructor that validates the parameter
//! bag and produces a runnable task. Factories must not start work;
//! construction failures surface before the engine commits any state.

use std::sync::Arc;

use dashmap::DashMap;

use jobcoord_shared::error::{CoordError, CoordResult};
use jobcoord_shared::types::TaskSpec;

use crate::task::BoxedTask;

/// Constructor for one procedure.
pub type TaskFactory = Arc<dyn Fn(&TaskSpec) -> CoordResult<BoxedTask> + Send + Sync>;

/// Concurrent procedure-name → factory mapping.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: DashMap<String, TaskFactory>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. Fails with `AlreadyRegistered` when the name is
    /// occupied.
    pub fn add_factory<F>(&self, proc_name: &str, factory: F) -> CoordResult<()>
    where
        F: Fn(&TaskSpec) -> CoordResult<BoxedTask> + Send + Sync + 'static,
    {
        use dashmap::mapref::entry::Entry;
        match self.factories.entry(proc_name.to_string()) {
            Entry::Occupied(_) => Err(CoordError::AlreadyRegistered(proc_name.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(factory));
                Ok(())
            }
        }
    }

    /// Look up the spec's procedure and invoke its factory. Fails with
    /// `UnknownProc` when nothing is registered under the name; factory
    /// validation failures pass through as `BadParams`.
    pub fn construct(&self, spec: &TaskSpec) -> CoordResult<BoxedTask> {
        let factory = self
            .factories
            .get(&spec.proc_name)
            .ok_or_else(|| CoordError::UnknownProc(spec.proc_name.clone()))?;
        factory(spec)
    }

    /// Registered procedure names, order unspecified.
    pub fn proc_names(&self) -> Vec<String> {
        self.factories.iter().map(|e| e.key().clone()).collect()
    }
}
