//! Module implementing the dispersion slots, i.e., the concentric rings of a dispersion unit.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Represents one ring of a dispersion unit, at a fixed range of distances from the source.
/// Cloning a slot copies its receivers, so two clones never share state.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DispersionSlot {
    /// Distance from the source to the inner boundary of the ring.
    inner_radius: f64,
    /// Gas concentration currently in the ring (non-negative).
    concentration: f64,
    /// Receiver neurons in the ring, mapped to their distance to the source.
    receivers: HashMap<usize, f64>,
}

impl DispersionSlot {
    /// Create an empty slot starting at the given distance from the source.
    pub fn new(inner_radius: f64) -> Self {
        DispersionSlot {
            inner_radius,
            concentration: 0.0,
            receivers: HashMap::new(),
        }
    }

    /// Returns the distance from the source to the inner boundary of the slot.
    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    /// Returns the gas concentration in the slot.
    pub fn concentration(&self) -> f64 {
        self.concentration
    }

    /// Set the gas concentration in the slot.
    /// Negative values are floored at zero.
    pub fn set_concentration(&mut self, concentration: f64) {
        self.concentration = concentration.max(0.0);
    }

    /// Returns the receivers of the slot, mapped to their distance to the source.
    pub fn receivers(&self) -> &HashMap<usize, f64> {
        &self.receivers
    }

    /// Returns a mutable reference to the receivers of the slot.
    pub fn receivers_mut(&mut self) -> &mut HashMap<usize, f64> {
        &mut self.receivers
    }

    /// Register a receiver at the given distance, replacing any previous distance.
    pub fn add_receiver(&mut self, neuron_id: usize, distance: f64) {
        self.receivers.insert(neuron_id, distance);
    }
}
