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

use crate::cosmic::{AttitudeProvider, Orbit, Spacecraft, TimeTagged};
use crate::theories::{AnalyticalTheory, TheoryError};
use crate::time::{Duration, Epoch};
use snafu::{ResultExt, Snafu};
use std::sync::Arc;

/// Bounded ephemeris errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum EphemerisError {
    #[snafu(display("no states were recorded: cannot build a bounded ephemeris"))]
    Empty,
    #[snafu(display("epoch {epoch} is outside the ephemeris span [{min}, {max}] by more than the extrapolation threshold {threshold}"))]
    OutsideBounds {
        epoch: Epoch,
        min: Epoch,
        max: Epoch,
        threshold: Duration,
    },
    #[snafu(display("theory failure during ephemeris evaluation: {source}"))]
    EphemerisTheory { source: TheoryError },
    #[snafu(display("attitude provider failed during ephemeris evaluation: {cause}"))]
    EphemerisAttitude {
        cause: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A bounded, closed-form ephemeris produced by a recording propagation.
///
/// Since the underlying theory is closed-form, queries inside the recorded
/// span are evaluated exactly: no interpolation is ever involved. Queries
/// outside the span fail immediately (within the small extrapolation
/// threshold they are still honored), rather than extrapolating. The
/// recorded states are exposed, in monotonic epoch order, for external
/// interpolators that want them.
#[derive(Clone)]
pub struct ClosedFormEphemeris<T: AnalyticalTheory + Clone> {
    theory: T,
    mean_orbit: Orbit,
    attitude_provider: Arc<dyn AttitudeProvider>,
    mass_kg: f64,
    min_epoch: Epoch,
    max_epoch: Epoch,
    extrapolation_threshold: Duration,
    states: Vec<Spacecraft>,
}

impl<T: AnalyticalTheory + Clone> ClosedFormEphemeris<T> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        theory: T,
        mean_orbit: Orbit,
        attitude_provider: Arc<dyn AttitudeProvider>,
        mass_kg: f64,
        extrapolation_threshold: Duration,
        mut states: Vec<Spacecraft>,
    ) -> Result<Self, EphemerisError> {
        if states.is_empty() {
            return EmptySnafu.fail();
        }
        // Recording may have been driven out of order: hand out a monotonic,
        // deduplicated sequence.
        states.sort_by(|a, b| a.epoch().cmp(&b.epoch()));
        states.dedup_by(|a, b| a.epoch() == b.epoch());
        let min_epoch = states.first().unwrap().epoch();
        let max_epoch = states.last().unwrap().epoch();
        Ok(Self {
            theory,
            mean_orbit,
            attitude_provider,
            mass_kg,
            min_epoch,
            max_epoch,
            extrapolation_threshold,
            states,
        })
    }

    pub fn min_epoch(&self) -> Epoch {
        self.min_epoch
    }

    pub fn max_epoch(&self) -> Epoch {
        self.max_epoch
    }

    pub fn extrapolation_threshold(&self) -> Duration {
        self.extrapolation_threshold
    }

    /// The recorded states, in monotonic epoch order.
    pub fn states(&self) -> &[Spacecraft] {
        &self.states
    }

    pub fn first(&self) -> &Spacecraft {
        self.states.first().unwrap()
    }

    pub fn last(&self) -> &Spacecraft {
        self.states.last().unwrap()
    }

    /// Evaluates the ephemeris at this specific epoch.
    ///
    /// Fails with a distinct out-of-bounds condition when `epoch` is more
    /// than the extrapolation threshold outside the recorded span.
    pub fn at(&self, epoch: Epoch) -> Result<Spacecraft, EphemerisError> {
        if epoch < self.min_epoch - self.extrapolation_threshold
            || epoch > self.max_epoch + self.extrapolation_threshold
        {
            return OutsideBoundsSnafu {
                epoch,
                min: self.min_epoch,
                max: self.max_epoch,
                threshold: self.extrapolation_threshold,
            }
            .fail();
        }
        let orbit = self
            .theory
            .osculating_from_mean(&self.mean_orbit, epoch)
            .context(EphemerisTheorySnafu)?;
        let attitude = self
            .attitude_provider
            .attitude(&orbit)
            .map_err(|cause| EphemerisAttitudeSnafu { cause }.build())?;
        Ok(Spacecraft::new(orbit, self.mass_kg).with_attitude(attitude))
    }
}
