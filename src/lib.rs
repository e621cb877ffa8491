//! This crate provides the gas dispersion engine of GasNet-style neural networks.
//!
//! In such networks, some neurons emit a gas whose concentration spreads around them and
//! modulates the neurons it reaches, with a delay proportional to their distance to the source.
//!
//! # Creating Networks
//!
//! ```rust
//! use std::collections::HashSet;
//! use rusty_gasnet::gas::{DispersionKind, Gas};
//! use rusty_gasnet::network::Network;
//! use rusty_gasnet::neuron::Neuron;
//!
//! let mut network = Network::new();
//! network.add_neuron(Neuron::new(0, 0.0, 0.0)).unwrap();
//! network.add_neuron(Neuron::new(1, 1.0, 0.0)).unwrap();
//! network.add_neuron(Neuron::new(2, 0.0, 12.0)).unwrap();
//!
//! // Neuron 0 emits nitric oxide up to a distance of 10, the wavefront moving by 2 per tick
//! network.add_gas(Gas::new("no", 2.0, DispersionKind::Flat).unwrap());
//! network.add_emitter(0, "no", 10.0, 0.5).unwrap();
//!
//! // Neuron 1 is in the innermost slot, it senses the gas as soon as it is emitted
//! let active: HashSet<usize> = [0].into_iter().collect();
//! network.step(&active).unwrap();
//! assert_eq!(network.neuron(1).unwrap().receptor().buildup("no"), 0.5);
//!
//! // Neuron 2 is out of reach
//! assert_eq!(network.neuron(2).unwrap().receptor().buildup("no"), 0.0);
//! ```
//!
//! # Evolving Networks
//!
//! Networks (and their dispersion units) are cloned into fully independent copies, which can then
//! be simulated in parallel, see [`network::Network::replicate`] and [`network::step_population`].

pub mod error;
pub mod gas;
pub mod network;
pub mod neuron;
pub mod slot;
pub mod unit;

/// The strength gained (or lost) by a dispersion unit per tick of consecutive activity (or inactivity) of its source.
pub const STRENGTH_INCREMENT: f64 = 0.3;
/// The maximum strength of a dispersion unit.
pub const MAX_STRENGTH: f64 = 1.0;
/// Minimum number of networks to step a population in parallel.
pub const MIN_NETWORKS_PAR: usize = 8;
