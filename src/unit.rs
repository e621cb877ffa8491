//! Module implementing the dispersion units, i.e., the propagation engine of a gas emitted by a neuron.
//!
//! A unit discretizes the disk of radius `emission_radius` around its source into concentric slots
//! whose width is the gas propagation speed. At each tick, the external driver calls, in this order:
//!
//! 1. [`DispersionUnit::adapt_strength`] with the activity of the source neuron,
//! 2. [`DispersionUnit::emit`] to inject the current strength in the innermost slot,
//! 3. [`DispersionUnit::update_targets`] to add the slot concentrations to the receivers buildup,
//! 4. [`DispersionUnit::advance`] to move the wavefront one slot outward.
//!
//! [`DispersionUnit::tick`] runs the whole sequence at once.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use rusty_gasnet::gas::{DispersionKind, Gas};
//! use rusty_gasnet::neuron::Neuron;
//! use rusty_gasnet::unit::DispersionUnit;
//!
//! let gas = Arc::new(Gas::new("no", 2.0, DispersionKind::Flat).unwrap());
//! let mut unit = DispersionUnit::from_gas(10.0, 0.5, gas).unwrap();
//! unit.build_channel().unwrap();
//! assert_eq!(unit.num_slots(), 5);
//!
//! let source = Neuron::new(0, 0.0, 0.0);
//! let mut neurons = vec![Neuron::new(1, 3.0, 0.0)];
//! unit.bind_receivers(&neurons, &source).unwrap();
//!
//! // The gas reaches the receiver (in slot 1) one tick after its emission.
//! unit.tick(true, &mut neurons).unwrap();
//! assert_eq!(neurons[0].receptor().buildup("no"), 0.0);
//! unit.tick(true, &mut neurons).unwrap();
//! assert_eq!(neurons[0].receptor().buildup("no"), 0.5);
//! ```

use itertools::Itertools;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::GasNetError;
use super::gas::{DispersionKind, Gas};
use super::neuron::{Neuron, ReceptorLookup};
use super::slot::DispersionSlot;
use super::{MAX_STRENGTH, STRENGTH_INCREMENT};

/// Propagation engine for one (source neuron, gas) pair.
/// Cloning a unit deep copies its slots: the clone and the original never share mutable state.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DispersionUnit {
    /// The gas emitted, if the unit was created from one.
    gas: Option<Arc<Gas>>,
    /// Maximum distance at which the gas can influence a receiver.
    emission_radius: f64,
    /// Strength at rest, i.e., the lower bound of the current strength.
    base_strength: f64,
    current_strength: f64,
    propagation_speed: f64,
    strength_increment: f64,
    max_strength: f64,
    /// Whether the source neuron was active at the previous tick.
    was_emitting: bool,
    dispersion_kind: DispersionKind,
    slot_size: f64,
    /// Slots ordered from the source outward.
    slots: Vec<DispersionSlot>,
}

/// Relative tolerance under which a ratio of distances is taken as a whole number.
const RATIO_TOLERANCE: f64 = 1e-9;

// Returns the floor of the ratio, snapped to the nearest integer when within RATIO_TOLERANCE of it,
// e.g., 0.3 / 0.1 = 2.9999999999999996 counts as 3.
fn snapped_floor(ratio: f64) -> f64 {
    let rounded = ratio.round();
    if (ratio - rounded).abs() <= RATIO_TOLERANCE * ratio.abs().max(1.0) {
        rounded
    } else {
        ratio.floor()
    }
}

// Returns the number of slots of a channel, or an error if the geometry is degenerate.
fn num_slots(emission_radius: f64, propagation_speed: f64) -> Result<usize, GasNetError> {
    if !(emission_radius.is_finite() && emission_radius > 0.0) {
        return Err(GasNetError::ConfigurationError(format!(
            "Emission radius must be positive, got {}",
            emission_radius
        )));
    }
    if !(propagation_speed.is_finite() && propagation_speed > 0.0) {
        return Err(GasNetError::ConfigurationError(format!(
            "Propagation speed must be positive, got {}",
            propagation_speed
        )));
    }

    let total = snapped_floor(emission_radius / propagation_speed) as usize;
    if total == 0 {
        return Err(GasNetError::ConfigurationError(format!(
            "Emission radius {} is smaller than the propagation speed {}: the channel would have no slot",
            emission_radius, propagation_speed
        )));
    }
    Ok(total)
}

impl DispersionUnit {
    /// Create a new unit without gas identity, with the specified parameters.
    /// Such a unit can propagate gas but cannot update receptors, see [`DispersionUnit::from_gas`].
    /// Returns an error if the emission radius or the propagation speed is not positive,
    /// or if the initial strength exceeds MAX_STRENGTH.
    pub fn build(
        emission_radius: f64,
        initial_strength: f64,
        propagation_speed: f64,
        dispersion_kind: DispersionKind,
    ) -> Result<Self, GasNetError> {
        num_slots(emission_radius, propagation_speed)?;
        if !(initial_strength.is_finite() && initial_strength <= MAX_STRENGTH) {
            return Err(GasNetError::ConfigurationError(format!(
                "Initial strength must be finite and at most {}, got {}",
                MAX_STRENGTH, initial_strength
            )));
        }

        Ok(DispersionUnit {
            gas: None,
            emission_radius,
            base_strength: initial_strength,
            current_strength: initial_strength,
            propagation_speed,
            strength_increment: STRENGTH_INCREMENT,
            max_strength: MAX_STRENGTH,
            was_emitting: false,
            dispersion_kind,
            slot_size: 0.0,
            slots: vec![],
        })
    }

    /// Create a new unit emitting the given gas.
    pub fn from_gas(
        emission_radius: f64,
        initial_strength: f64,
        gas: Arc<Gas>,
    ) -> Result<Self, GasNetError> {
        let mut unit = DispersionUnit::build(
            emission_radius,
            initial_strength,
            gas.propagation_speed(),
            gas.dispersion_kind(),
        )?;
        unit.gas = Some(gas);
        Ok(unit)
    }

    /// Create the (empty) slots of the unit, replacing any existing ones.
    /// The number of slots is floor(emission_radius / propagation_speed), and they evenly split the emission radius.
    pub fn build_channel(&mut self) -> Result<(), GasNetError> {
        let total = num_slots(self.emission_radius, self.propagation_speed)?;
        self.slot_size = self.emission_radius / total as f64;
        self.slots = (0..total)
            .map(|i| DispersionSlot::new(self.slot_size * i as f64))
            .collect();
        debug!(
            "Channel built for gas {:?}: {} slots of size {}",
            self.gas_id(),
            total,
            self.slot_size
        );
        Ok(())
    }

    /// Returns the index of the slot covering the given distance to the source, if any.
    /// A distance lying exactly on the boundary between two slots belongs to the farther one.
    /// Distances beyond the emission radius, and a null distance, are covered by no slot.
    pub fn slot_index(&self, distance: f64) -> Option<usize> {
        if self.slots.is_empty() || !(distance > 0.0) || distance > self.emission_radius {
            return None;
        }
        let index = snapped_floor(distance / self.slot_size) as usize;
        Some(index.min(self.slots.len() - 1))
    }

    /// Bin every candidate neuron but the source in the slot covering its distance to the source.
    /// Previous bindings are dropped, so the function can be called again after neurons moved.
    /// Returns the number of neurons bound, or an error if the channel was not built.
    pub fn bind_receivers<'a, I>(&mut self, candidates: I, source: &Neuron) -> Result<usize, GasNetError>
    where
        I: IntoIterator<Item = &'a Neuron>,
    {
        if self.slots.is_empty() {
            return Err(GasNetError::InvalidOperation(
                "Cannot bind receivers before the channel is built".to_string(),
            ));
        }

        self.slots
            .iter_mut()
            .for_each(|slot| slot.receivers_mut().clear());

        let mut num_bound = 0;
        for neuron in candidates
            .into_iter()
            .filter(|neuron| neuron.id() != source.id())
        {
            let distance = source.distance_to(neuron);
            if let Some(index) = self.slot_index(distance) {
                self.slots[index].add_receiver(neuron.id(), distance);
                num_bound += 1;
            }
        }

        debug!(
            "Neuron {} binds {} receivers for gas {:?}",
            source.id(),
            num_bound,
            self.gas_id()
        );
        Ok(num_bound)
    }

    /// Update the strength of the unit according to the activity of the source neuron.
    ///
    /// The first active tick only arms the unit; each further consecutive active tick raises the
    /// strength by the increment, up to the maximum strength. Each inactive tick following an active
    /// one lowers the strength by the increment, down to the base strength.
    pub fn adapt_strength(&mut self, is_source_active: bool) {
        match (is_source_active, self.was_emitting) {
            (true, true) => {
                self.current_strength =
                    (self.current_strength + self.strength_increment).min(self.max_strength);
            }
            (true, false) => {
                self.was_emitting = true;
            }
            (false, true) => {
                self.current_strength =
                    (self.current_strength - self.strength_increment).max(self.base_strength);
                self.was_emitting = false;
            }
            (false, false) => {}
        }
        trace!(
            "Strength adapted to {} (active: {})",
            self.current_strength,
            is_source_active
        );
    }

    /// Overwrite the concentration of the innermost slot with the current strength.
    /// Returns an error if the channel was not built.
    pub fn emit(&mut self) -> Result<(), GasNetError> {
        let strength = self.current_strength;
        match self.slots.first_mut() {
            Some(slot) => {
                slot.set_concentration(strength);
                Ok(())
            }
            None => Err(GasNetError::InvalidOperation(
                "Cannot emit before the channel is built".to_string(),
            )),
        }
    }

    /// Add the contribution of every non-empty slot to the buildup of its receivers.
    ///
    /// The buildup is never reset here: clearing or decaying it between ticks is up to the caller.
    /// Returns an error if the unit has no gas identity, or if a receiver is missing from the lookup.
    /// Receivers are all resolved before any contribution is added, so on error no receptor changed.
    pub fn update_targets<L>(&self, lookup: &mut L) -> Result<(), GasNetError>
    where
        L: ReceptorLookup + ?Sized,
    {
        let gas_id = self.gas_id().ok_or_else(|| {
            GasNetError::ConfigurationError(
                "Cannot update targets of a unit without gas identity".to_string(),
            )
        })?;

        let filled_slots = || self.slots.iter().filter(|slot| slot.concentration() > 0.0);

        if let Some(neuron_id) = filled_slots()
            .flat_map(|slot| slot.receivers().keys())
            .find(|&&neuron_id| lookup.receptor_mut(neuron_id).is_none())
        {
            return Err(GasNetError::ReferenceError(format!(
                "Receiver neuron {} of gas {} not found",
                neuron_id, gas_id
            )));
        }

        for slot in filled_slots() {
            for (&neuron_id, &distance) in slot.receivers() {
                if let Some(receptor) = lookup.receptor_mut(neuron_id) {
                    receptor.add_buildup(
                        gas_id,
                        self.dispersion_kind
                            .contribution(slot.concentration(), distance),
                    );
                }
            }
        }
        Ok(())
    }

    /// Move the wavefront one slot outward.
    /// The innermost slot is emptied and the concentration of the outermost slot leaves the unit.
    pub fn advance(&mut self) {
        for i in (1..self.slots.len()).rev() {
            let concentration = self.slots[i - 1].concentration();
            self.slots[i].set_concentration(concentration);
        }
        if let Some(slot) = self.slots.first_mut() {
            slot.set_concentration(0.0);
        }
        trace!("Wavefront advanced: {:?}", self.concentrations());
    }

    /// Run a full tick: adapt the strength, emit, update the targets and advance the wavefront.
    /// A unit without channel or without gas identity is rejected before its state changes.
    pub fn tick<L>(&mut self, is_source_active: bool, lookup: &mut L) -> Result<(), GasNetError>
    where
        L: ReceptorLookup + ?Sized,
    {
        if self.slots.is_empty() {
            return Err(GasNetError::InvalidOperation(
                "Cannot tick before the channel is built".to_string(),
            ));
        }
        if self.gas.is_none() {
            return Err(GasNetError::ConfigurationError(
                "Cannot tick a unit without gas identity".to_string(),
            ));
        }

        self.adapt_strength(is_source_active);
        self.emit()?;
        self.update_targets(lookup)?;
        self.advance();
        Ok(())
    }

    /// Returns the gas emitted by the unit, if any.
    pub fn gas(&self) -> Option<&Arc<Gas>> {
        self.gas.as_ref()
    }

    /// Returns the identity of the gas emitted by the unit, if any.
    pub fn gas_id(&self) -> Option<&str> {
        self.gas.as_deref().map(Gas::id)
    }

    pub fn emission_radius(&self) -> f64 {
        self.emission_radius
    }

    pub fn base_strength(&self) -> f64 {
        self.base_strength
    }

    pub fn current_strength(&self) -> f64 {
        self.current_strength
    }

    /// Set the current strength, clamped to [base_strength, max_strength].
    pub fn set_current_strength(&mut self, strength: f64) {
        self.current_strength = strength.clamp(self.base_strength, self.max_strength);
    }

    pub fn max_strength(&self) -> f64 {
        self.max_strength
    }

    pub fn strength_increment(&self) -> f64 {
        self.strength_increment
    }

    pub fn propagation_speed(&self) -> f64 {
        self.propagation_speed
    }

    pub fn dispersion_kind(&self) -> DispersionKind {
        self.dispersion_kind
    }

    /// Returns whether the source neuron was active at the last tick.
    pub fn is_emitting(&self) -> bool {
        self.was_emitting
    }

    /// Returns the width of the slots (zero before the channel is built).
    pub fn slot_size(&self) -> f64 {
        self.slot_size
    }

    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Returns the slots, ordered from the source outward.
    pub fn slots(&self) -> &[DispersionSlot] {
        &self.slots
    }

    /// Returns mutable references to the slots, ordered from the source outward.
    pub fn slots_mut(&mut self) -> &mut [DispersionSlot] {
        &mut self.slots
    }

    /// Returns the concentration of every slot, ordered from the source outward.
    pub fn concentrations(&self) -> Vec<f64> {
        self.slots
            .iter()
            .map(|slot| slot.concentration())
            .collect_vec()
    }

    /// Returns the index of the slot the given neuron is bound to, if any.
    pub fn slot_of(&self, neuron_id: usize) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.receivers().contains_key(&neuron_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const TOLERANCE: f64 = 1e-12;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < TOLERANCE, "{} != {}", a, b);
    }

    fn gas(kind: DispersionKind) -> Arc<Gas> {
        Arc::new(Gas::new("no", 2.0, kind).unwrap())
    }

    fn channel(kind: DispersionKind) -> DispersionUnit {
        let mut unit = DispersionUnit::from_gas(10.0, 0.5, gas(kind)).unwrap();
        unit.build_channel().unwrap();
        unit
    }

    #[test]
    fn test_build_invalid_parameters() {
        for (radius, speed) in [(0.0, 2.0), (-1.0, 2.0), (10.0, 0.0), (10.0, -2.0), (1.0, 2.0), (f64::NAN, 1.0)] {
            assert!(matches!(
                DispersionUnit::build(radius, 0.5, speed, DispersionKind::Flat),
                Err(GasNetError::ConfigurationError(_))
            ));
        }
        assert!(matches!(
            DispersionUnit::build(10.0, 1.5, 2.0, DispersionKind::Flat),
            Err(GasNetError::ConfigurationError(_))
        ));
        assert!(matches!(
            DispersionUnit::build(10.0, f64::NAN, 2.0, DispersionKind::Flat),
            Err(GasNetError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_build_negative_strength() {
        let mut unit = DispersionUnit::build(10.0, -0.5, 2.0, DispersionKind::Flat).unwrap();
        assert_eq!(unit.base_strength(), -0.5);
        unit.adapt_strength(true);
        unit.adapt_strength(true);
        assert_close(unit.current_strength(), -0.2);
        unit.adapt_strength(false);
        assert_close(unit.current_strength(), -0.5);
    }

    #[test]
    fn test_build_channel_decimal_ratio() {
        for (radius, speed, total) in [(0.3, 0.1, 3), (0.7, 0.1, 7), (0.35, 0.1, 3)] {
            let mut unit = DispersionUnit::build(radius, 0.5, speed, DispersionKind::Flat).unwrap();
            unit.build_channel().unwrap();
            assert_eq!(unit.num_slots(), total);
            assert_close(unit.slot_size(), radius / total as f64);
        }
    }

    #[test]
    fn test_slot_index_decimal_ratio() {
        let mut unit = DispersionUnit::build(0.3, 0.5, 0.1, DispersionKind::Flat).unwrap();
        unit.build_channel().unwrap();
        assert_eq!(unit.slot_index(0.05), Some(0));
        assert_eq!(unit.slot_index(0.1), Some(1));
        assert_eq!(unit.slot_index(0.2), Some(2));
        assert_eq!(unit.slot_index(0.3), Some(2));
        assert_eq!(unit.slot_index(0.31), None);
    }

    #[test]
    fn test_build_initial_state() {
        let unit = DispersionUnit::build(10.0, 0.5, 2.0, DispersionKind::Flat).unwrap();
        assert_eq!(unit.base_strength(), 0.5);
        assert_eq!(unit.current_strength(), 0.5);
        assert_eq!(unit.strength_increment(), 0.3);
        assert_eq!(unit.max_strength(), 1.0);
        assert!(!unit.is_emitting());
        assert_eq!(unit.num_slots(), 0);
        assert_eq!(unit.gas_id(), None);
    }

    #[test]
    fn test_build_channel() {
        let unit = channel(DispersionKind::Flat);
        assert_eq!(unit.num_slots(), 5);
        assert_eq!(unit.slot_size(), 2.0);
        let radii: Vec<f64> = unit.slots().iter().map(|slot| slot.inner_radius()).collect();
        assert_eq!(radii, [0.0, 2.0, 4.0, 6.0, 8.0]);
        assert_eq!(unit.concentrations(), [0.0; 5]);
    }

    #[test]
    fn test_build_channel_uneven() {
        let mut unit = DispersionUnit::build(10.0, 0.5, 3.0, DispersionKind::Flat).unwrap();
        unit.build_channel().unwrap();
        assert_eq!(unit.num_slots(), 3);
        assert_close(unit.slot_size(), 10.0 / 3.0);
        assert_close(unit.slots()[2].inner_radius(), 20.0 / 3.0);
    }

    #[test]
    fn test_slot_index() {
        let unit = channel(DispersionKind::Flat);
        assert_eq!(unit.slot_index(0.0), None);
        assert_eq!(unit.slot_index(0.5), Some(0));
        assert_eq!(unit.slot_index(2.0), Some(1));
        assert_eq!(unit.slot_index(3.9), Some(1));
        assert_eq!(unit.slot_index(9.5), Some(4));
        assert_eq!(unit.slot_index(10.0), Some(4));
        assert_eq!(unit.slot_index(11.0), None);
    }

    #[test]
    fn test_bind_receivers() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 1.0, 1.0);
        let neurons = vec![
            source.clone(),
            Neuron::new(1, 3.0, 1.0),
            Neuron::new(2, 1.0, 6.5),
            Neuron::new(3, 12.0, 1.0),
            Neuron::new(4, 7.0, 9.0),
        ];

        assert_eq!(unit.bind_receivers(&neurons, &source), Ok(3));
        assert_eq!(unit.slot_of(0), None);
        assert_eq!(unit.slot_of(1), Some(1));
        assert_eq!(unit.slot_of(2), Some(2));
        assert_eq!(unit.slot_of(3), None);
        assert_eq!(unit.slot_of(4), Some(4));
        assert_eq!(unit.slots()[1].receivers().get(&1), Some(&2.0));

        // Every neuron appears in at most one slot.
        let num_entries: usize = unit.slots().iter().map(|slot| slot.receivers().len()).sum();
        assert_eq!(num_entries, 3);
    }

    #[test]
    fn test_rebind_receivers() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        let mut neurons = vec![Neuron::new(1, 1.0, 0.0)];
        unit.bind_receivers(&neurons, &source).unwrap();
        assert_eq!(unit.slot_of(1), Some(0));

        neurons[0].set_position(5.0, 0.0);
        unit.bind_receivers(&neurons, &source).unwrap();
        assert_eq!(unit.slot_of(1), Some(2));
        assert!(unit.slots()[0].receivers().is_empty());
    }

    #[test]
    fn test_bind_receivers_without_channel() {
        let mut unit = DispersionUnit::build(10.0, 0.5, 2.0, DispersionKind::Flat).unwrap();
        let source = Neuron::new(0, 0.0, 0.0);
        assert!(matches!(
            unit.bind_receivers(&[Neuron::new(1, 1.0, 0.0)], &source),
            Err(GasNetError::InvalidOperation(_))
        ));
        assert!(matches!(unit.emit(), Err(GasNetError::InvalidOperation(_))));
    }

    #[test]
    fn test_adapt_strength_ramp() {
        let mut unit = channel(DispersionKind::Flat);

        unit.adapt_strength(true);
        assert_close(unit.current_strength(), 0.5);
        assert!(unit.is_emitting());

        unit.adapt_strength(true);
        assert_close(unit.current_strength(), 0.8);

        unit.adapt_strength(true);
        assert_close(unit.current_strength(), 1.0);

        unit.adapt_strength(true);
        assert_close(unit.current_strength(), 1.0);

        unit.adapt_strength(false);
        assert_close(unit.current_strength(), 0.7);
        assert!(!unit.is_emitting());

        // Inactive again: the unit is no longer emitting, nothing changes.
        unit.adapt_strength(false);
        assert_close(unit.current_strength(), 0.7);
    }

    #[test]
    fn test_adapt_strength_floor() {
        let mut unit = channel(DispersionKind::Flat);
        unit.adapt_strength(true);
        unit.adapt_strength(true);
        assert_close(unit.current_strength(), 0.8);

        unit.adapt_strength(false);
        assert_close(unit.current_strength(), 0.5);

        unit.adapt_strength(true);
        unit.adapt_strength(false);
        assert_close(unit.current_strength(), 0.5);
    }

    #[test]
    fn test_set_current_strength_clamped() {
        let mut unit = channel(DispersionKind::Flat);
        unit.set_current_strength(2.0);
        assert_eq!(unit.current_strength(), 1.0);
        unit.set_current_strength(0.1);
        assert_eq!(unit.current_strength(), 0.5);
    }

    #[test]
    fn test_emit_overwrites() {
        let mut unit = channel(DispersionKind::Flat);
        unit.slots_mut()[0].set_concentration(0.9);
        unit.emit().unwrap();
        assert_eq!(unit.concentrations(), [0.5, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_advance() {
        let mut unit = channel(DispersionKind::Flat);
        unit.slots_mut()[0].set_concentration(5.0);

        unit.advance();
        assert_eq!(unit.concentrations(), [0.0, 5.0, 0.0, 0.0, 0.0]);

        for _ in 0..3 {
            unit.advance();
        }
        assert_eq!(unit.concentrations(), [0.0, 0.0, 0.0, 0.0, 5.0]);

        unit.advance();
        assert_eq!(unit.concentrations(), [0.0; 5]);
    }

    #[test]
    fn test_update_targets_flat() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        let mut neurons = vec![
            Neuron::new(1, 1.0, 0.0),
            Neuron::new(2, 0.0, 1.5),
            Neuron::new(3, 3.0, 0.0),
            Neuron::new(4, 11.0, 0.0),
        ];
        unit.bind_receivers(&neurons, &source).unwrap();
        unit.emit().unwrap();
        unit.update_targets(&mut neurons).unwrap();

        assert_eq!(neurons[0].receptor().buildup("no"), 0.5);
        assert_eq!(neurons[1].receptor().buildup("no"), 0.5);
        assert_eq!(neurons[2].receptor().buildup("no"), 0.0);
        assert_eq!(neurons[3].receptor().buildup("no"), 0.0);

        // Contributions accumulate, they never reset the buildup.
        unit.update_targets(&mut neurons).unwrap();
        assert_eq!(neurons[0].receptor().buildup("no"), 1.0);
    }

    #[test]
    fn test_update_targets_decay() {
        let mut unit = channel(DispersionKind::Decay);
        let source = Neuron::new(0, 0.0, 0.0);
        let mut neurons = vec![Neuron::new(1, 3.0, 0.0), Neuron::new(2, 0.0, 4.0)];
        unit.bind_receivers(&neurons, &source).unwrap();
        unit.slots_mut()[1].set_concentration(0.9);
        unit.update_targets(&mut neurons).unwrap();

        assert_close(neurons[0].receptor().buildup("no"), 0.9 / 9.0);
        assert_eq!(neurons[1].receptor().buildup("no"), 0.0);
    }

    #[test]
    fn test_update_targets_missing_receiver() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        let neurons = vec![Neuron::new(1, 1.0, 0.0)];
        unit.bind_receivers(&neurons, &source).unwrap();
        unit.emit().unwrap();

        let mut lookup: HashMap<usize, Neuron> = HashMap::new();
        assert!(matches!(
            unit.update_targets(&mut lookup),
            Err(GasNetError::ReferenceError(_))
        ));
    }

    #[test]
    fn test_update_targets_missing_receiver_writes_nothing() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        let neurons: Vec<Neuron> = (1..20)
            .map(|id| Neuron::new(id, 0.0, 0.05 * id as f64))
            .collect();
        unit.bind_receivers(&neurons, &source).unwrap();
        assert_eq!(unit.slots()[0].receivers().len(), 19);
        unit.emit().unwrap();

        let mut lookup: HashMap<usize, Neuron> = neurons
            .into_iter()
            .filter(|neuron| neuron.id() != 19)
            .map(|neuron| (neuron.id(), neuron))
            .collect();
        assert!(matches!(
            unit.update_targets(&mut lookup),
            Err(GasNetError::ReferenceError(_))
        ));
        assert!(lookup
            .values()
            .all(|neuron| neuron.receptor().buildup("no") == 0.0));
    }

    #[test]
    fn test_tick_without_channel_leaves_unit_unchanged() {
        let mut unit = DispersionUnit::from_gas(10.0, 0.5, gas(DispersionKind::Flat)).unwrap();
        let mut neurons: Vec<Neuron> = vec![];
        assert!(matches!(
            unit.tick(true, &mut neurons),
            Err(GasNetError::InvalidOperation(_))
        ));
        assert!(!unit.is_emitting());

        let mut unit = DispersionUnit::build(10.0, 0.5, 2.0, DispersionKind::Flat).unwrap();
        unit.build_channel().unwrap();
        assert!(matches!(
            unit.tick(true, &mut neurons),
            Err(GasNetError::ConfigurationError(_))
        ));
        assert!(!unit.is_emitting());
        assert_eq!(unit.concentrations(), [0.0; 5]);
    }

    #[test]
    fn test_update_targets_without_gas() {
        let mut unit = DispersionUnit::build(10.0, 0.5, 2.0, DispersionKind::Flat).unwrap();
        unit.build_channel().unwrap();
        let mut neurons: Vec<Neuron> = vec![];
        assert!(matches!(
            unit.update_targets(&mut neurons),
            Err(GasNetError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_tick_delays_by_distance() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        let mut neurons = vec![Neuron::new(1, 5.0, 0.0)];
        unit.bind_receivers(&neurons, &source).unwrap();

        let mut buildups = vec![];
        for _ in 0..4 {
            unit.tick(true, &mut neurons).unwrap();
            buildups.push(neurons[0].receptor().buildup("no"));
            neurons[0].receptor_mut().clear();
        }
        // Slot 2 is reached two ticks after an emission, with the strength emitted then.
        assert_close(buildups[0], 0.0);
        assert_close(buildups[1], 0.0);
        assert_close(buildups[2], 0.5);
        assert_close(buildups[3], 0.8);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut unit = channel(DispersionKind::Flat);
        let source = Neuron::new(0, 0.0, 0.0);
        unit.bind_receivers(&[Neuron::new(1, 1.0, 0.0)], &source).unwrap();
        unit.emit().unwrap();

        let mut cloned = unit.clone();
        assert_eq!(cloned, unit);

        cloned.slots_mut()[0].set_concentration(0.0);
        cloned.slots_mut()[0].receivers_mut().clear();
        cloned.slots_mut()[3].add_receiver(9, 7.0);
        cloned.adapt_strength(true);

        assert_eq!(unit.slots()[0].concentration(), 0.5);
        assert_eq!(unit.slot_of(1), Some(0));
        assert_eq!(unit.slot_of(9), None);
        assert!(!unit.is_emitting());
        assert!(Arc::ptr_eq(unit.gas().unwrap(), cloned.gas().unwrap()));
    }
}
