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

use super::{PropagationError, ProviderSnafu};
use crate::cosmic::Spacecraft;
use std::error::Error;
use std::sync::Arc;

/// A named, pure generator of additional state: given the spacecraft state of
/// the current propagation step, returns a fixed-length numeric array.
///
/// A provider may declare one dependency by name: it is then only evaluated
/// after that named state has been resolved in the same step, and reads the
/// dependency's value from the state it is handed.
pub trait AdditionalStateProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Name of the additional state this provider depends on, if any.
    fn dependency(&self) -> Option<&str> {
        None
    }

    fn generate(&self, state: &Spacecraft) -> Result<Vec<f64>, Box<dyn Error + Send + Sync>>;
}

/// Resolves every resolvable provider against the given state, in repeated
/// fixed-point passes.
///
/// Each pass walks the providers in registration order and evaluates those
/// whose dependency (if any) is already present, feeding each evaluation into
/// the state handed to the next. The loop ends when all providers resolved or
/// when a full pass resolves nothing new. The latter is the cycle /
/// unsatisfiable-dependency termination, and the leftover providers are
/// silently dropped for this step: their state is simply absent, not an
/// error. Deterministic for a fixed provider set and input state.
pub fn resolve_additional_states(
    providers: &[Arc<dyn AdditionalStateProvider>],
    base: Spacecraft,
) -> Result<Spacecraft, PropagationError> {
    let mut state = base;
    let mut pending: Vec<usize> = (0..providers.len()).collect();
    loop {
        let mut still_pending = Vec::with_capacity(pending.len());
        for idx in pending.iter().copied() {
            let provider = &providers[idx];
            let ready = match provider.dependency() {
                None => true,
                Some(dep) => state.has_additional_state(dep),
            };
            if ready {
                let value = provider.generate(&state).map_err(|cause| {
                    ProviderSnafu {
                        name: provider.name().to_string(),
                        cause,
                    }
                    .build()
                })?;
                state.additional.insert(provider.name().to_string(), value);
            } else {
                still_pending.push(idx);
            }
        }
        if still_pending.is_empty() {
            return Ok(state);
        }
        if still_pending.len() == pending.len() {
            // Fixed point reached without progress: circular or unmet
            // dependencies. Dropping them is the documented soft failure.
            for idx in &still_pending {
                debug!(
                    "additional state {} dropped for this step: dependency {:?} cannot be resolved",
                    providers[*idx].name(),
                    providers[*idx].dependency()
                );
            }
            return Ok(state);
        }
        pending = still_pending;
    }
}
