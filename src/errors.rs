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

use crate::cosmic::AstroError;
use crate::md::EphemerisError;
use crate::propagators::PropagationError;
use crate::theories::TheoryError;
use snafu::Snafu;

/// Top-level error: everything the kernel can fail with. Functions which may
/// fail return a `Result`; this crate (almost) never panics.
#[derive(Debug, Snafu)]
pub enum HemeraError {
    #[snafu(context(false), display("{source}"))]
    Astro { source: AstroError },
    #[snafu(context(false), display("{source}"))]
    Theory { source: TheoryError },
    #[snafu(context(false), display("{source}"))]
    Propagation { source: PropagationError },
    #[snafu(context(false), display("{source}"))]
    Ephemeris { source: EphemerisError },
}
