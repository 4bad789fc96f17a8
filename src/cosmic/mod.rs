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

use crate::time::{Duration, Epoch};
use snafu::Snafu;

/// A trait allowing for something to have an epoch
pub trait TimeTagged {
    /// Retrieve the Epoch
    fn epoch(&self) -> Epoch;
    /// Set the Epoch
    fn set_epoch(&mut self, epoch: Epoch);

    /// Shift this epoch by a duration (can be negative)
    fn shift_by(&mut self, duration: Duration) {
        self.set_epoch(self.epoch() + duration);
    }
}

/// Errors of the astrodynamics data model.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AstroError {
    /// Parabolic orbits have ill-defined Keplerian orbital elements.
    #[snafu(display("parabolic orbits have ill-defined Keplerian orbital elements"))]
    Parabolic,
    #[snafu(display(
        "radius of orbit is infinite or negative for a true anomaly of {ta_deg} deg"
    ))]
    InfiniteRadius { ta_deg: f64 },
    #[snafu(display(
        "eccentric and mean anomalies are only defined for closed orbits, got ecc = {ecc}"
    ))]
    OpenOrbitAnomaly { ecc: f64 },
    #[snafu(display("Kepler equation did not converge after {iterations} iterations"))]
    KeplerConvergence { iterations: usize },
}

// Re-Export frames
mod frames;
pub use self::frames::*;

// Re-Export orbit
mod orbit;
pub use self::orbit::*;

// Re-Export spacecraft
mod spacecraft;
pub use self::spacecraft::*;

/// GM of the Earth in km^3/s^2, GMAT value
pub const EARTH_GM_KM3_S2: f64 = 398_600.441_5;

/// Equatorial radius of the Earth in km, GMAT value
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6_378.136_3;

/// Flattening of the Earth, WGS-84
pub const EARTH_FLATTENING: f64 = 1.0 / 298.257_223_563;

/// Speed of light in kilometers per second
pub const SPEED_OF_LIGHT_KMS: f64 = 299_792.458;

/// From NIST special publication 330, 2008 edition, in meters per second squared
pub const STD_GRAVITY: f64 = 9.80665;
