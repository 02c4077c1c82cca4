//! Adapter units
//!
//! Every generated adapter is loaded into its own unit. A unit is built,
//! receives exactly one adapter, and is sealed; only a sealed unit can run.
//! Units never register anything with the class registry, so generating
//! adapters cannot shadow or pollute caller-visible classes.

use std::sync::Arc;

use invoka_sdk::{GenerationError, InvocationError, Value};

use super::GeneratedAdapter;

/// Unit lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitState {
    /// Accepting its adapter
    Building,
    /// Ready to run, no further changes
    Sealed,
}

/// Isolated execution unit holding one generated adapter
#[derive(Debug)]
pub(crate) struct AdapterUnit {
    id: u64,
    name: Arc<str>,
    state: UnitState,
    adapter: Option<GeneratedAdapter>,
}

impl AdapterUnit {
    /// Create an empty unit for the adapter called `name`
    pub(crate) fn new(id: u64, name: Arc<str>) -> Self {
        Self {
            id,
            name,
            state: UnitState::Building,
            adapter: None,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn state(&self) -> UnitState {
        self.state
    }

    /// Load the adapter. The unit accepts exactly one, carrying the unit's name.
    pub(crate) fn define(&mut self, adapter: GeneratedAdapter) -> Result<(), GenerationError> {
        if self.state != UnitState::Building {
            return Err(self.load_error("unit is sealed"));
        }
        if self.adapter.is_some() {
            return Err(self.load_error("unit already holds an adapter"));
        }
        if adapter.name() != &*self.name {
            return Err(self.load_error("adapter name does not match its unit"));
        }
        self.adapter = Some(adapter);
        Ok(())
    }

    /// Finalize the unit for execution
    pub(crate) fn seal(&mut self) -> Result<(), GenerationError> {
        if self.adapter.is_none() {
            return Err(self.load_error("unit has no adapter"));
        }
        self.state = UnitState::Sealed;
        Ok(())
    }

    /// Run the adapter
    #[inline]
    pub(crate) fn invoke(&self, receiver: Option<&Value>, args: &[Value]) -> Result<Value, InvocationError> {
        match (&self.adapter, self.state) {
            (Some(adapter), UnitState::Sealed) => adapter.invoke(receiver, args),
            _ => Err(InvocationError::Backend(format!(
                "adapter unit {} is not ready",
                self.name
            ))),
        }
    }

    fn load_error(&self, reason: &str) -> GenerationError {
        GenerationError::Load {
            name: self.name.to_string(),
            reason: reason.to_string(),
        }
    }
}
