//! Module implementing the gas descriptors shared by the dispersion units.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::GasNetError;

/// How the concentration of a slot translates into a receiver's buildup.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DispersionKind {
    /// The receiver gets the slot concentration, whatever its distance to the source.
    Flat,
    /// The receiver gets the slot concentration divided by its squared distance to the source.
    Decay,
}

impl DispersionKind {
    /// Returns the contribution of a slot with the given concentration to a receiver at the given distance.
    pub fn contribution(&self, concentration: f64, distance: f64) -> f64 {
        match self {
            DispersionKind::Flat => concentration,
            DispersionKind::Decay => concentration / (distance * distance),
        }
    }
}

impl FromStr for DispersionKind {
    type Err = GasNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FLAT" => Ok(DispersionKind::Flat),
            "DECAY" => Ok(DispersionKind::Decay),
            _ => Err(GasNetError::ConfigurationError(format!(
                "Unknown dispersion kind: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for DispersionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DispersionKind::Flat => write!(f, "FLAT"),
            DispersionKind::Decay => write!(f, "DECAY"),
        }
    }
}

/// Represents a type of gas, i.e., a chemical signal emitted by some neurons.
/// A gas is never mutated once created and is shared among all the units emitting it.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Gas {
    /// Identity of the signal, used as key in the receptors buildup.
    id: String,
    /// Distance covered by the wavefront per tick.
    propagation_speed: f64,
    dispersion_kind: DispersionKind,
}

impl Gas {
    /// Create a new gas with the specified parameters.
    /// Returns an error if the propagation speed is not positive.
    pub fn new(
        id: impl Into<String>,
        propagation_speed: f64,
        dispersion_kind: DispersionKind,
    ) -> Result<Self, GasNetError> {
        if !(propagation_speed.is_finite() && propagation_speed > 0.0) {
            return Err(GasNetError::ConfigurationError(format!(
                "Gas propagation speed must be positive, got {}",
                propagation_speed
            )));
        }

        Ok(Gas {
            id: id.into(),
            propagation_speed,
            dispersion_kind,
        })
    }

    /// Returns the identity of the gas.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the propagation speed of the gas.
    pub fn propagation_speed(&self) -> f64 {
        self.propagation_speed
    }

    /// Returns the dispersion kind of the gas.
    pub fn dispersion_kind(&self) -> DispersionKind {
        self.dispersion_kind
    }
}
