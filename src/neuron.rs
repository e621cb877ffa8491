//! Module implementing the neuron side of the gas signalling: positions and receptors.
//!
//! The dispersion units only ever add to a receptor's buildup. Reading, clearing or decaying
//! the buildup between two ticks is the job of the neuron model driving the simulation, and must
//! happen only after every unit of the network has updated its targets for the current tick.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Accumulates, per gas, the concentration received by a neuron.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Receptor {
    buildup: HashMap<String, f64>,
}

impl Receptor {
    pub fn new() -> Self {
        Receptor::default()
    }

    /// Returns the buildup concentration for the given gas (zero if nothing was ever received).
    pub fn buildup(&self, gas_id: &str) -> f64 {
        self.buildup.get(gas_id).copied().unwrap_or(0.0)
    }

    /// Returns the buildup concentrations of all gases.
    pub fn buildups(&self) -> &HashMap<String, f64> {
        &self.buildup
    }

    /// Add a contribution to the buildup of the given gas.
    pub fn add_buildup(&mut self, gas_id: &str, amount: f64) {
        match self.buildup.get_mut(gas_id) {
            Some(value) => *value += amount,
            None => {
                self.buildup.insert(gas_id.to_string(), amount);
            }
        }
    }

    /// Reset the buildup of every gas to zero.
    pub fn clear(&mut self) {
        self.buildup.values_mut().for_each(|value| *value = 0.0);
    }

    /// Scale the buildup of every gas by the given factor, e.g., 0.5 halves all concentrations.
    pub fn decay(&mut self, factor: f64) {
        self.buildup.values_mut().for_each(|value| *value *= factor);
    }
}

/// Represents a neuron of a gas-modulated network, as seen by the dispersion engine.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Neuron {
    id: usize,
    position: Point2<f64>,
    receptor: Receptor,
}

impl Neuron {
    /// Create a new neuron at the given position, with an empty receptor.
    pub fn new(id: usize, x: f64, y: f64) -> Self {
        Neuron {
            id,
            position: Point2::new(x, y),
            receptor: Receptor::new(),
        }
    }

    /// Returns the neuron ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Returns the neuron position in the plane.
    pub fn position(&self) -> &Point2<f64> {
        &self.position
    }

    /// Move the neuron. Units binding it must be rebound afterwards.
    pub fn set_position(&mut self, x: f64, y: f64) {
        self.position = Point2::new(x, y);
    }

    /// Returns the Euclidean distance between the two neurons.
    pub fn distance_to(&self, other: &Neuron) -> f64 {
        nalgebra::distance(&self.position, &other.position)
    }

    /// Returns the neuron receptor.
    pub fn receptor(&self) -> &Receptor {
        &self.receptor
    }

    /// Returns a mutable reference to the neuron receptor.
    pub fn receptor_mut(&mut self) -> &mut Receptor {
        &mut self.receptor
    }
}

/// Lookup from neuron ID to receptor, consumed by the dispersion units when updating their targets.
pub trait ReceptorLookup {
    /// Returns the receptor of the neuron with the given ID, if any.
    fn receptor_mut(&mut self, neuron_id: usize) -> Option<&mut Receptor>;
}

impl ReceptorLookup for HashMap<usize, Neuron> {
    fn receptor_mut(&mut self, neuron_id: usize) -> Option<&mut Receptor> {
        self.get_mut(&neuron_id).map(|neuron| neuron.receptor_mut())
    }
}

impl ReceptorLookup for [Neuron] {
    fn receptor_mut(&mut self, neuron_id: usize) -> Option<&mut Receptor> {
        self.iter_mut()
            .find(|neuron| neuron.id() == neuron_id)
            .map(|neuron| neuron.receptor_mut())
    }
}

impl ReceptorLookup for Vec<Neuron> {
    fn receptor_mut(&mut self, neuron_id: usize) -> Option<&mut Receptor> {
        self.as_mut_slice().receptor_mut(neuron_id)
    }
}
