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

use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// A reference frame identity tag.
///
/// Frame *transformations* are the job of an external frame provider; the
/// kernel only needs the gravitational parameter and, for zonal theories,
/// the geodetic constants of the central body.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Frame {
    /// Any celestial frame which only has a GM (e.g. barycentric frames).
    Celestial {
        /// Gravitational parameter in km^3/s^2
        gm: f64,
    },
    /// Any Geoid, which has a GM, an equatorial radius and a flattening value.
    Geoid {
        /// Gravitational parameter in km^3/s^2
        gm: f64,
        /// Equatorial radius in km
        equatorial_radius: f64,
        /// Flattening (dimensionless)
        flattening: f64,
    },
}

impl Frame {
    /// Earth-centered inertial frame with the GMAT values used throughout the tests.
    pub fn earth_j2000() -> Self {
        Frame::Geoid {
            gm: crate::cosmic::EARTH_GM_KM3_S2,
            equatorial_radius: crate::cosmic::EARTH_EQUATORIAL_RADIUS_KM,
            flattening: crate::cosmic::EARTH_FLATTENING,
        }
    }

    pub fn is_geoid(&self) -> bool {
        matches!(self, Frame::Geoid { .. })
    }

    /// Gravitational parameter of this frame's central body, in km^3/s^2.
    pub fn gm(&self) -> f64 {
        match self {
            Frame::Celestial { gm } | Frame::Geoid { gm, .. } => *gm,
        }
    }

    /// Allows mutating the GM for this frame, e.g. to match a gravity model.
    pub fn gm_mut(&mut self, new_gm: f64) {
        match self {
            Frame::Celestial { ref mut gm } | Frame::Geoid { ref mut gm, .. } => *gm = new_gm,
        }
    }

    /// Equatorial radius in km. Zero for frames without geodetic data.
    pub fn equatorial_radius(&self) -> f64 {
        match self {
            Frame::Geoid {
                equatorial_radius, ..
            } => *equatorial_radius,
            Frame::Celestial { .. } => 0.0,
        }
    }

    pub fn flattening(&self) -> f64 {
        match self {
            Frame::Geoid { flattening, .. } => *flattening,
            Frame::Celestial { .. } => 0.0,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Frame::Celestial { gm } => write!(f, "Celestial (gm = {gm} km^3/s^2)"),
            Frame::Geoid {
                gm,
                equatorial_radius,
                ..
            } => write!(
                f,
                "Geoid (gm = {gm} km^3/s^2, req = {equatorial_radius} km)"
            ),
        }
    }
}
