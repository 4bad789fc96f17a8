/*
    Hemera, closed-form astrodynamics
    Copyright (C) 2025-onwards Hemera contributors

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{Orbit, TimeTagged};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

/// A body orientation sampled at the epoch and frame of the orbit it was
/// computed for, stored as a scalar-first unit quaternion.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attitude {
    pub qw: f64,
    pub qx: f64,
    pub qy: f64,
    pub qz: f64,
}

impl Attitude {
    pub fn new(qw: f64, qx: f64, qy: f64, qz: f64) -> Self {
        let mut att = Self { qw, qx, qy, qz };
        att.normalize();
        att
    }

    /// The identity orientation (body axes aligned with the frame axes).
    pub fn identity() -> Self {
        Self {
            qw: 1.0,
            qx: 0.0,
            qy: 0.0,
            qz: 0.0,
        }
    }

    fn normalize(&mut self) {
        let norm =
            (self.qw.powi(2) + self.qx.powi(2) + self.qy.powi(2) + self.qz.powi(2)).sqrt();
        if norm > 0.0 {
            self.qw /= norm;
            self.qx /= norm;
            self.qy /= norm;
            self.qz /= norm;
        }
    }
}

impl Default for Attitude {
    fn default() -> Self {
        Self::identity()
    }
}

/// External attitude collaborator: invoked once per propagation step with the
/// freshly computed osculating orbit. Failures are wrapped by the propagator
/// and re-raised with their cause preserved.
pub trait AttitudeProvider: Send + Sync {
    fn attitude(&self, orbit: &Orbit) -> Result<Attitude, Box<dyn Error + Send + Sync>>;
}

/// An attitude provider which always returns the identity orientation.
#[derive(Clone, Copy, Debug, Default)]
pub struct InertialAttitude;

impl AttitudeProvider for InertialAttitude {
    fn attitude(&self, _orbit: &Orbit) -> Result<Attitude, Box<dyn Error + Send + Sync>> {
        Ok(Attitude::identity())
    }
}

/// A spacecraft state: an orbit, the attitude sampled at that orbit's epoch,
/// a total mass in kg, and any number of named additional-state arrays.
///
/// All components share the orbit's epoch. States are created by the
/// propagator (or the caller) and never mutated afterwards, only replaced.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Spacecraft {
    /// Orbit of the spacecraft
    pub orbit: Orbit,
    /// Orientation sampled at the orbit's epoch, in the orbit's frame
    pub attitude: Attitude,
    /// Total mass in kg
    pub mass_kg: f64,
    /// Named additional-state arrays; keys are unique, iteration order is
    /// deterministic.
    pub additional: BTreeMap<String, Vec<f64>>,
}

impl Spacecraft {
    /// Initializes a spacecraft state with the identity attitude and no
    /// additional state.
    pub fn new(orbit: Orbit, mass_kg: f64) -> Self {
        Self {
            orbit,
            attitude: Attitude::identity(),
            mass_kg,
            additional: BTreeMap::new(),
        }
    }

    pub fn with_attitude(mut self, attitude: Attitude) -> Self {
        self.attitude = attitude;
        self
    }

    /// Returns a copy of this state with the named additional state set.
    pub fn with_additional_state(mut self, name: &str, value: Vec<f64>) -> Self {
        self.additional.insert(name.to_string(), value);
        self
    }

    /// Retrieves the named additional-state array, if present for this step.
    pub fn additional_state(&self, name: &str) -> Option<&[f64]> {
        self.additional.get(name).map(|v| v.as_slice())
    }

    pub fn has_additional_state(&self, name: &str) -> bool {
        self.additional.contains_key(name)
    }
}

impl TimeTagged for Spacecraft {
    fn epoch(&self) -> Epoch {
        self.orbit.dt
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.orbit.dt = epoch
    }
}

impl fmt::Display for Spacecraft {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} mass = {:.3} kg, {} additional state(s)",
            self.orbit,
            self.mass_kg,
            self.additional.len()
        )
    }
}
