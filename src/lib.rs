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

/*! # hemera

Closed-form astrodynamics: fast, deterministic orbit prediction without
numerical integration. An initial spacecraft state is mapped to any other
epoch, later or earlier, through analytical perturbation theories: the
Brouwer-Lyddane zonal theory (with the M2 along-track drag term), the
Eckstein-Hechler circular-element theory, and the pure Keplerian baseline,
all behind one capability trait. On top of the theories sit the analytical
propagation state machine, the additional-state dependency scheduler, the
state-transition-matrix / parameter-Jacobian harvester, and bounded
closed-form ephemerides.
*/

/// Provides the analytical propagators and their collaborator seams.
pub mod propagators;

/// Provides the closed-form perturbation theories.
pub mod theories;

/// Provides states, orbits and frames.
pub mod cosmic;

/// Mission-design-facing surfaces: event evaluation, step handling, bounded
/// ephemerides.
pub mod md;

/// Utility functions shared by different modules.
pub mod utils;

mod errors;
/// Hemera will (almost) never panic and functions which may fail will return an error.
pub use self::errors::HemeraError;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
}

/// Re-export some useful things
pub use self::cosmic::{Orbit, Spacecraft, TimeTagged};
pub use self::propagators::AnalyticalPropagator;
pub use self::theories::{AnalyticalTheory, BrouwerLyddane, EcksteinHechler, Keplerian};
