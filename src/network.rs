//! Module implementing a gas-modulated network: neurons, gases and the dispersion units attached to them.
//!
//! The network is a thin driver around the dispersion units. It binds the receivers of every unit
//! and ticks all of them in the prescribed order, but neither decides which neurons fire nor manages
//! the receptors buildup between ticks: the caller reads it after [`Network::step`], then clears or
//! decays it before the next step.

use itertools::Itertools;
use log::debug;
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::error::GasNetError;
use super::gas::Gas;
use super::neuron::Neuron;
use super::unit::DispersionUnit;
use super::MIN_NETWORKS_PAR;

/// A dispersion unit together with the ID of the neuron emitting its gas.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Emitter {
    source_id: usize,
    unit: DispersionUnit,
}

impl Emitter {
    /// Returns the ID of the neuron emitting the gas.
    pub fn source_id(&self) -> usize {
        self.source_id
    }

    /// Returns the dispersion unit.
    pub fn unit(&self) -> &DispersionUnit {
        &self.unit
    }
}

/// Represents a gas-modulated network.
/// Cloning a network yields a fully independent copy, e.g., to seed the offspring of an evolutionary algorithm.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    neurons: HashMap<usize, Neuron>,
    gases: HashMap<String, Arc<Gas>>,
    emitters: Vec<Emitter>,
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Network::default()
    }

    /// Create a network of neurons uniformly placed in the square [0, extent) x [0, extent), without gas.
    /// Neuron IDs range from 0 to num_neurons - 1.
    pub fn rand<R: Rng>(num_neurons: usize, extent: f64, rng: &mut R) -> Result<Self, GasNetError> {
        if !(extent.is_finite() && extent > 0.0) {
            return Err(GasNetError::ConfigurationError(format!(
                "Network extent must be positive, got {}",
                extent
            )));
        }

        let coord_dist = Uniform::new(0.0, extent);
        let neurons = (0..num_neurons)
            .map(|id| {
                let x = coord_dist.sample(rng);
                let y = coord_dist.sample(rng);
                (id, Neuron::new(id, x, y))
            })
            .collect();

        Ok(Network {
            neurons,
            ..Network::default()
        })
    }

    /// Add a neuron to the network.
    /// Returns an error if a neuron with the same ID already exists.
    /// Existing units are not rebound, see [`Network::rebind`].
    pub fn add_neuron(&mut self, neuron: Neuron) -> Result<(), GasNetError> {
        if self.neurons.contains_key(&neuron.id()) {
            return Err(GasNetError::InvalidOperation(format!(
                "Neuron {} already exists",
                neuron.id()
            )));
        }
        self.neurons.insert(neuron.id(), neuron);
        Ok(())
    }

    /// Register a gas, replacing any gas with the same ID for the units created afterwards.
    pub fn add_gas(&mut self, gas: Gas) -> Arc<Gas> {
        let gas = Arc::new(gas);
        self.gases.insert(gas.id().to_string(), Arc::clone(&gas));
        gas
    }

    /// Attach a new dispersion unit of the given gas to the given source neuron, then bind its receivers.
    /// Returns the index of the new emitter.
    pub fn add_emitter(
        &mut self,
        source_id: usize,
        gas_id: &str,
        emission_radius: f64,
        initial_strength: f64,
    ) -> Result<usize, GasNetError> {
        let source = self.neurons.get(&source_id).ok_or_else(|| {
            GasNetError::ReferenceError(format!("Source neuron {} not found", source_id))
        })?;
        let gas = self
            .gases
            .get(gas_id)
            .ok_or_else(|| GasNetError::ReferenceError(format!("Gas {} not found", gas_id)))?;

        let mut unit = DispersionUnit::from_gas(emission_radius, initial_strength, Arc::clone(gas))?;
        unit.build_channel()?;
        unit.bind_receivers(self.neurons.values(), source)?;

        self.emitters.push(Emitter { source_id, unit });
        Ok(self.emitters.len() - 1)
    }

    /// Bind again the receivers of every unit, e.g., after neurons were added or moved.
    pub fn rebind(&mut self) -> Result<(), GasNetError> {
        for emitter in self.emitters.iter_mut() {
            let source = self.neurons.get(&emitter.source_id).ok_or_else(|| {
                GasNetError::ReferenceError(format!(
                    "Source neuron {} not found",
                    emitter.source_id
                ))
            })?;
            emitter.unit.bind_receivers(self.neurons.values(), source)?;
        }
        debug!("{} emitters rebound", self.emitters.len());
        Ok(())
    }

    /// Run one tick of every unit, in order of creation, given the IDs of the active neurons.
    /// The contributions are added to the receptors buildup, which is never reset here.
    pub fn step(&mut self, active_ids: &HashSet<usize>) -> Result<(), GasNetError> {
        for emitter in self.emitters.iter_mut() {
            let is_active = active_ids.contains(&emitter.source_id);
            emitter.unit.tick(is_active, &mut self.neurons)?;
        }
        Ok(())
    }

    /// Reset the buildup of every receptor.
    pub fn clear_buildups(&mut self) {
        self.neurons
            .values_mut()
            .for_each(|neuron| neuron.receptor_mut().clear());
    }

    /// Scale the buildup of every receptor by the given factor.
    pub fn decay_buildups(&mut self, factor: f64) {
        self.neurons
            .values_mut()
            .for_each(|neuron| neuron.receptor_mut().decay(factor));
    }

    /// Returns `n` independent copies of the network.
    pub fn replicate(&self, n: usize) -> Vec<Network> {
        (0..n).map(|_| self.clone()).collect()
    }

    /// Returns the neuron with the given ID, if any.
    pub fn neuron(&self, id: usize) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// Returns a mutable reference to the neuron with the given ID, if any.
    /// Moving a neuron requires a call to [`Network::rebind`].
    pub fn neuron_mut(&mut self, id: usize) -> Option<&mut Neuron> {
        self.neurons.get_mut(&id)
    }

    /// Returns the (sorted) IDs of the neurons.
    pub fn neuron_ids(&self) -> Vec<usize> {
        self.neurons.keys().copied().sorted().collect()
    }

    /// Returns the gas with the given ID, if any.
    pub fn gas(&self, id: &str) -> Option<&Arc<Gas>> {
        self.gases.get(id)
    }

    /// Returns the emitters, in order of creation.
    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn num_neurons(&self) -> usize {
        self.neurons.len()
    }

    pub fn num_emitters(&self) -> usize {
        self.emitters.len()
    }

    /// Returns a JSON snapshot of the network.
    pub fn to_json(&self) -> Result<String, GasNetError> {
        serde_json::to_string(self).map_err(|e| GasNetError::SerializationError(e.to_string()))
    }

    /// Restore a network from a JSON snapshot.
    /// Units of a restored network hold their own copy of their gas.
    pub fn from_json(json: &str) -> Result<Self, GasNetError> {
        serde_json::from_str(json).map_err(|e| GasNetError::SerializationError(e.to_string()))
    }
}

/// Run one tick of every network of a population, in parallel for large populations.
/// The networks must be independent, e.g., obtained with [`Network::replicate`].
pub fn step_population(
    networks: &mut [Network],
    active_ids: &HashSet<usize>,
) -> Result<(), GasNetError> {
    if networks.len() >= MIN_NETWORKS_PAR {
        debug!("Stepping {} networks in parallel", networks.len());
        networks
            .par_iter_mut()
            .try_for_each(|network| network.step(active_ids))
    } else {
        networks
            .iter_mut()
            .try_for_each(|network| network.step(active_ids))
    }
}
