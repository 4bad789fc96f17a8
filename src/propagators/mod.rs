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

use crate::theories::TheoryError;
use crate::time::Epoch;
use snafu::Snafu;
use std::error::Error;

/// The analytical propagation state machine.
mod analytical;
pub use self::analytical::*;

/// Additional-state providers and their dependency scheduler.
mod additional;
pub use self::additional::*;

/// State-transition-matrix and parameter-Jacobian harvesting.
mod harvester;
pub use self::harvester::*;

/// Propagation errors.
///
/// Collaborator failures (attitude provider, step handlers, additional-state
/// providers) are wrapped with their cause preserved, never swallowed.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("propagation failed in the analytical theory: {source}"))]
    Theory { source: TheoryError },
    #[snafu(display("attitude provider failed: {cause}"))]
    Attitude {
        cause: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("collaborator {name} failed: {cause}"))]
    Collaborator {
        name: String,
        cause: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("additional state provider {name} failed: {cause}"))]
    Provider {
        name: String,
        cause: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("the {theory} theory does not support resetting its state"))]
    NonResettable { theory: String },
    #[snafu(display("intermediate state reset at {requested} goes against the established propagation direction (boundary epoch {boundary})"))]
    ResetDirection { requested: Epoch, boundary: Epoch },
    #[snafu(display("the state transition matrix name must not be empty"))]
    EmptyStmName,
    #[snafu(display("no matrices computation was set up on this propagator"))]
    NoMatricesSetup,
    #[snafu(display("state at {epoch} does not carry the additional state {name}"))]
    MissingAdditionalState { name: String, epoch: Epoch },
}
