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

use super::{EmptyStmNameSnafu, MissingAdditionalStateSnafu, PropagationError};
use crate::cosmic::{Spacecraft, TimeTagged};
use crate::linalg::{DMatrix, Matrix6};
use crate::theories::ParameterDriver;
use snafu::ensure;
use std::fmt;

/// Eighth-order central-difference stencil: f'(x) is combined from
/// f(x ± k h), k = 1..4, with these weights over h.
pub(crate) const FD_STENCIL: [(f64, f64); 4] = [
    (1.0, 4.0 / 5.0),
    (2.0, -1.0 / 5.0),
    (3.0, 4.0 / 105.0),
    (4.0, -1.0 / 280.0),
];

/// Relative step of the differencing, applied to the orbit's natural scale
/// (radius and velocity magnitudes for state columns).
pub(crate) const FD_RELATIVE_STEP: f64 = 1e-4;

/// Orbit parameterization conventions reported by the harvester.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OrbitType {
    Cartesian,
    Keplerian,
    Circular,
    Equinoctial,
}

/// Anomaly-angle conventions reported by the harvester.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PositionAngle {
    Mean,
    True,
    Eccentric,
}

/// Harvests, per propagation, the 6x6 state transition matrix (derivative of
/// the propagated Cartesian state with respect to the initial one) and, when
/// parameters are selected, the 6xp parameter Jacobian.
///
/// The matrices are stored as named additional-state arrays of the produced
/// [`Spacecraft`], so they are valid for the exact epoch of that state only;
/// they are never interpolated.
#[derive(Clone, Debug)]
pub struct MatricesHarvester {
    stm_name: String,
    pub(crate) initial_stm: Option<Matrix6<f64>>,
    pub(crate) initial_jacobian: Option<DMatrix<f64>>,
    drivers: Vec<ParameterDriver>,
    frozen_columns: Option<Vec<String>>,
}

impl MatricesHarvester {
    /// Builds a harvester. The name is the additional-state key under which
    /// the STM is stored: an empty name cannot be addressed later, so it is
    /// rejected immediately.
    pub(crate) fn new(
        stm_name: &str,
        initial_stm: Option<Matrix6<f64>>,
        initial_jacobian: Option<DMatrix<f64>>,
        drivers: Vec<ParameterDriver>,
    ) -> Result<Self, PropagationError> {
        ensure!(!stm_name.trim().is_empty(), EmptyStmNameSnafu);
        Ok(Self {
            stm_name: stm_name.to_string(),
            initial_stm,
            initial_jacobian,
            drivers,
            frozen_columns: None,
        })
    }

    pub fn stm_name(&self) -> &str {
        &self.stm_name
    }

    /// Additional-state key under which the parameter Jacobian is stored.
    pub fn jacobian_name(&self) -> String {
        format!("{}_jacobian", self.stm_name)
    }

    /// The orbit parameterization of the harvested matrices.
    pub fn orbit_type(&self) -> OrbitType {
        OrbitType::Cartesian
    }

    /// The anomaly convention of the harvested matrices.
    pub fn position_angle(&self) -> PositionAngle {
        PositionAngle::Mean
    }

    pub fn drivers(&self) -> &[ParameterDriver] {
        &self.drivers
    }

    /// Mutable access to a parameter driver, to flip its selection flag or
    /// adjust its scale.
    pub fn driver_mut(&mut self, name: &str) -> Option<&mut ParameterDriver> {
        self.drivers.iter_mut().find(|d| d.name == name)
    }

    /// Locks the set of selected parameter names: selection changes made
    /// after this call no longer resize the harvested Jacobians.
    pub fn freeze_columns_names(&mut self) {
        self.frozen_columns = Some(
            self.drivers
                .iter()
                .filter(|d| d.selected)
                .map(|d| d.name.clone())
                .collect(),
        );
    }

    /// Names of the parameters contributing Jacobian columns, in order: the
    /// frozen set if `freeze_columns_names` was called, the currently
    /// selected drivers otherwise.
    pub fn column_names(&self) -> Vec<String> {
        match &self.frozen_columns {
            Some(frozen) => frozen.clone(),
            None => self
                .drivers
                .iter()
                .filter(|d| d.selected)
                .map(|d| d.name.clone())
                .collect(),
        }
    }

    /// Reads the state transition matrix harvested into the provided state.
    pub fn state_transition_matrix(
        &self,
        state: &Spacecraft,
    ) -> Result<Matrix6<f64>, PropagationError> {
        let raw = state
            .additional_state(&self.stm_name)
            .ok_or_else(|| MissingAdditionalStateSnafu {
                name: self.stm_name.clone(),
                epoch: state.epoch(),
            }
            .build())?;
        Ok(Matrix6::from_row_slice(raw))
    }

    /// Reads the parameter Jacobian harvested into the provided state.
    ///
    /// Returns `None` when no parameters are selected: an absent Jacobian,
    /// not a zero-width matrix and not an error.
    pub fn parameters_jacobian(
        &self,
        state: &Spacecraft,
    ) -> Result<Option<DMatrix<f64>>, PropagationError> {
        let columns = self.column_names();
        if columns.is_empty() {
            return Ok(None);
        }
        let name = self.jacobian_name();
        let raw = state
            .additional_state(&name)
            .ok_or_else(|| MissingAdditionalStateSnafu {
                name: name.clone(),
                epoch: state.epoch(),
            }
            .build())?;
        Ok(Some(DMatrix::from_row_slice(6, columns.len(), raw)))
    }
}

impl fmt::Display for MatricesHarvester {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "MatricesHarvester `{}` ({:?}/{:?}, {} parameter column(s))",
            self.stm_name,
            self.orbit_type(),
            self.position_angle(),
            self.column_names().len()
        )
    }
}
