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

use super::{AnalyticalTheory, HyperbolicSnafu, MeanSolverConfig, TheoryError};
use crate::cosmic::Orbit;
use crate::time::Epoch;

/// Pure two-body propagation: the degenerate closed-form theory whose mean
/// and osculating elements coincide. Serves as the baseline for the
/// zero-coefficient cross-checks of the zonal theories.
#[derive(Clone, Copy, Debug, Default)]
pub struct Keplerian;

impl AnalyticalTheory for Keplerian {
    fn name(&self) -> &'static str {
        "Keplerian"
    }

    fn validate(&self, orbit: &Orbit) -> Result<(), TheoryError> {
        let ecc = orbit.ecc();
        if ecc >= 1.0 {
            return HyperbolicSnafu { ecc }.fail();
        }
        Ok(())
    }

    fn osculating_from_mean(&self, mean: &Orbit, epoch: Epoch) -> Result<Orbit, TheoryError> {
        mean.at_epoch(epoch)
            .map_err(|source| TheoryError::TheoryAstro { source })
    }

    fn mean_from_osculating(
        &self,
        osculating: &Orbit,
        _cfg: &MeanSolverConfig,
    ) -> Result<Orbit, TheoryError> {
        // Two-body mean elements are the osculating elements.
        Ok(*osculating)
    }
}
