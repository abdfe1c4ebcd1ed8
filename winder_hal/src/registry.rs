//! Backend registry for output-line buses.
//!
//! Provides a `BusRegistry` struct for registering and retrieving backend
//! factories. This uses constructor-injection rather than global state.

use crate::sim::SimulationBus;
use std::collections::HashMap;
use winder_common::hal::{BusFactory, HalError, StepBus};

/// Registry of available output-line backends.
///
/// Constructed at startup, populated via `register()`, and consulted once
/// when the controller is built. No global state — testable in isolation.
pub struct BusRegistry {
    factories: HashMap<&'static str, BusFactory>,
}

impl BusRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry with the in-tree backends pre-registered.
    ///
    /// Currently registers only `"simulation"`.
    pub fn with_builtin_backends() -> Self {
        let mut registry = Self::new();
        registry.register("simulation", create_simulation_bus);
        registry
    }

    /// Register a backend factory.
    ///
    /// # Panics
    /// Panics if a backend with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: BusFactory) {
        if self.factories.contains_key(name) {
            panic!("Backend '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a backend factory by name.
    pub fn get_factory(&self, name: &str) -> Option<BusFactory> {
        self.factories.get(name).copied()
    }

    /// Create a backend instance by name.
    ///
    /// # Errors
    /// Returns `HalError::BackendNotFound` if no backend with the given
    /// name is registered.
    pub fn create_bus(&self, name: &str) -> Result<Box<dyn StepBus>, HalError> {
        let factory = self
            .get_factory(name)
            .ok_or_else(|| HalError::BackendNotFound(name.to_string()))?;
        Ok(factory())
    }

    /// List all registered backend names.
    pub fn list_backends(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }
}

impl Default for BusRegistry {
    fn default() -> Self {
        Self::with_builtin_backends()
    }
}

fn create_simulation_bus() -> Box<dyn StepBus> {
    Box::new(SimulationBus::new())
}
