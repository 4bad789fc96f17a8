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

use std::f64::consts::{PI, TAU};

/// Returns the provided angle bounded between 0.0 and 360.0 degrees.
pub fn between_0_360(angle_deg: f64) -> f64 {
    let mut angle = angle_deg % 360.0;
    if angle < 0.0 {
        angle += 360.0;
    }
    angle
}

/// Returns the provided angle bounded between -180.0 and +180.0 degrees.
pub fn between_pm_180(angle_deg: f64) -> f64 {
    let mut angle = angle_deg % 360.0;
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle < -180.0 {
        angle += 360.0;
    }
    angle
}

/// Returns the provided angle bounded between 0.0 and 2π radians.
pub fn between_0_tau(angle_rad: f64) -> f64 {
    let mut angle = angle_rad % TAU;
    if angle < 0.0 {
        angle += TAU;
    }
    angle
}

/// Returns the provided angle bounded in (-π, π] radians.
///
/// Angle differences must go through this before being combined, otherwise
/// the periodic series pick up 2π-sized cancellation artifacts across the
/// wrap-around.
pub fn between_pm_pi(angle_rad: f64) -> f64 {
    let mut angle = angle_rad % TAU;
    if angle > PI {
        angle -= TAU;
    } else if angle <= -PI {
        angle += TAU;
    }
    angle
}
