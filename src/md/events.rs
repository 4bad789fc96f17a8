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

use crate::cosmic::Spacecraft;
use crate::time::{Duration, Unit};
use std::error::Error;
use std::fmt;

/// An event function evaluated on produced states.
///
/// The kernel hands every produced state to the registered collaborators and
/// never performs root-finding itself: bracketing and refining the zero of
/// `eval` is the collaborator's job.
pub trait EventEvaluator<S>: fmt::Display + Send + Sync {
    /// Evaluates the event function at the provided state.
    fn eval(&self, state: &S) -> f64;

    /// Precision on the event value below which the event is considered hit.
    fn value_precision(&self) -> f64 {
        1e-9
    }

    /// Precision on the epoch of the event.
    fn epoch_precision(&self) -> Duration {
        100 * Unit::Millisecond
    }
}

/// A per-step collaborator: called with every state the propagator produces,
/// in production order. Failures are wrapped by the propagator and re-raised
/// with the cause preserved.
pub trait StepHandler: Send {
    fn handle(&mut self, state: &Spacecraft) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A step handler collecting every produced state, e.g. to feed an external
/// interpolator.
#[derive(Default)]
pub struct CollectingHandler {
    pub states: Vec<Spacecraft>,
}

impl StepHandler for CollectingHandler {
    fn handle(&mut self, state: &Spacecraft) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.states.push(state.clone());
        Ok(())
    }
}
