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

use super::{
    resolve_additional_states, AdditionalStateProvider, AttitudeSnafu, CollaboratorSnafu,
    MatricesHarvester, NonResettableSnafu, PropagationError, ResetDirectionSnafu, TheorySnafu,
    FD_RELATIVE_STEP, FD_STENCIL,
};
use crate::cosmic::{AttitudeProvider, InertialAttitude, Orbit, Spacecraft, TimeTagged};
use crate::linalg::{DMatrix, Matrix6, Vector6};
use crate::md::{ClosedFormEphemeris, EphemerisError, StepHandler};
use crate::theories::{AnalyticalTheory, MeanSolverConfig};
use crate::time::{Duration, Epoch, Unit};
use rayon::prelude::*;
use snafu::{ensure, ResultExt};
use std::sync::Arc;

/// Selects how the initial orbit of a propagator is interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PropagationType {
    /// The initial orbit is osculating: a mean-element solve runs at
    /// construction.
    Osculating,
    /// The initial orbit already carries the theory's mean elements.
    Mean,
}

/// The analytical propagation state machine.
///
/// Owns the invariant mean elements solved once at construction, and turns
/// each `propagate` call into a pure closed-form evaluation: theory, attitude
/// collaborator, additional-state scheduling, matrices harvesting, step
/// handlers, optional ephemeris recording. Single-owner, single-thread use:
/// there is no internal synchronization, callers needing concurrency run one
/// propagator per worker.
pub struct AnalyticalPropagator<T: AnalyticalTheory> {
    theory: T,
    cfg: MeanSolverConfig,
    attitude_provider: Arc<dyn AttitudeProvider>,
    providers: Vec<Arc<dyn AdditionalStateProvider>>,
    step_handlers: Vec<Box<dyn StepHandler>>,
    initial_state: Spacecraft,
    mean_orbit: Orbit,
    /// Established by the first propagate call leaving the initial epoch:
    /// true for forward, false for backward.
    direction: Option<bool>,
    /// Furthest epoch reached along the established direction.
    boundary_epoch: Epoch,
    recording: Option<Vec<Spacecraft>>,
    extrapolation_threshold: Duration,
    harvester: Option<MatricesHarvester>,
}

impl<T: AnalyticalTheory> AnalyticalPropagator<T> {
    /// Builds a propagator: validates the initial orbit against the theory
    /// and, for an osculating input, runs the one-time mean-element solve.
    pub fn new(
        theory: T,
        initial_state: Spacecraft,
        propagation_type: PropagationType,
        attitude_provider: Arc<dyn AttitudeProvider>,
        cfg: MeanSolverConfig,
    ) -> Result<Self, PropagationError> {
        theory.validate(&initial_state.orbit).context(TheorySnafu)?;
        let mean_orbit = match propagation_type {
            PropagationType::Mean => initial_state.orbit,
            PropagationType::Osculating => theory
                .mean_from_osculating(&initial_state.orbit, &cfg)
                .context(TheorySnafu)?,
        };
        info!(
            "{} propagator initialized at {} (sma = {:.3} km, ecc = {:.6})",
            theory.name(),
            mean_orbit.dt,
            mean_orbit.sma(),
            mean_orbit.ecc()
        );
        let boundary_epoch = mean_orbit.dt;
        Ok(Self {
            theory,
            cfg,
            attitude_provider,
            providers: Vec::new(),
            step_handlers: Vec::new(),
            initial_state,
            mean_orbit,
            direction: None,
            boundary_epoch,
            recording: None,
            extrapolation_threshold: 1 * Unit::Second,
            harvester: None,
        })
    }

    /// Builds a propagator from an osculating state with the identity
    /// attitude provider and the default solver configuration.
    pub fn from_osculating(theory: T, initial_state: Spacecraft) -> Result<Self, PropagationError> {
        Self::new(
            theory,
            initial_state,
            PropagationType::Osculating,
            Arc::new(InertialAttitude),
            MeanSolverConfig::default(),
        )
    }

    pub fn theory(&self) -> &T {
        &self.theory
    }

    pub fn config(&self) -> &MeanSolverConfig {
        &self.cfg
    }

    /// The invariant internal mean orbit (narrow test interface).
    pub fn mean_orbit(&self) -> &Orbit {
        &self.mean_orbit
    }

    /// The initial state, retained unless explicitly reset.
    pub fn initial_state(&self) -> &Spacecraft {
        &self.initial_state
    }

    /// Registers a named additional-state provider for subsequent steps.
    pub fn add_additional_state_provider(&mut self, provider: Arc<dyn AdditionalStateProvider>) {
        self.providers.push(provider);
    }

    /// Registers a per-step collaborator, called with every produced state.
    pub fn add_step_handler(&mut self, handler: Box<dyn StepHandler>) {
        self.step_handlers.push(handler);
    }

    /// Tolerance accepted just outside the recorded ephemeris bounds.
    pub fn set_extrapolation_threshold(&mut self, threshold: Duration) {
        self.extrapolation_threshold = threshold;
    }

    /// Starts (or restarts) recording every produced state for a bounded
    /// ephemeris.
    pub fn start_recording(&mut self) {
        self.recording = Some(Vec::new());
    }

    /// Registers the matrices computation: every subsequent propagation also
    /// harvests the 6x6 state transition matrix (and the parameter Jacobian
    /// once drivers are selected) under the provided additional-state name.
    /// An empty name is rejected immediately.
    pub fn setup_matrices_computation(
        &mut self,
        stm_name: &str,
        initial_stm: Option<Matrix6<f64>>,
        initial_jacobian: Option<DMatrix<f64>>,
    ) -> Result<&mut MatricesHarvester, PropagationError> {
        let harvester = MatricesHarvester::new(
            stm_name,
            initial_stm,
            initial_jacobian,
            self.theory.parameter_drivers(),
        )?;
        self.harvester = Some(harvester);
        Ok(self.harvester.as_mut().unwrap())
    }

    pub fn harvester(&self) -> Option<&MatricesHarvester> {
        self.harvester.as_ref()
    }

    pub fn harvester_mut(&mut self) -> Option<&mut MatricesHarvester> {
        self.harvester.as_mut()
    }

    /// Propagates to the target epoch.
    ///
    /// This is a pure function of the target epoch, the stored mean elements
    /// and the registered providers: repeated calls with the same target
    /// return bit-identical states, and targets may arrive in any order.
    pub fn propagate(&mut self, target: Epoch) -> Result<Spacecraft, PropagationError> {
        let orbit = self
            .theory
            .osculating_from_mean(&self.mean_orbit, target)
            .context(TheorySnafu)?;
        let attitude = self
            .attitude_provider
            .attitude(&orbit)
            .map_err(|cause| AttitudeSnafu { cause }.build())?;
        let mut base = Spacecraft::new(orbit, self.initial_state.mass_kg).with_attitude(attitude);

        // Harvested matrices are additional state, resolved before the
        // scheduler so that providers may depend on them by name.
        if self.harvester.is_some() {
            let (stm, jacobian) = self.harvest(target)?;
            let harvester = self.harvester.as_ref().unwrap();
            base.additional.insert(harvester.stm_name().to_string(), stm);
            if let Some(jacobian) = jacobian {
                base.additional.insert(harvester.jacobian_name(), jacobian);
            }
        }

        let state = resolve_additional_states(&self.providers, base)?;

        for handler in self.step_handlers.iter_mut() {
            handler.handle(&state).map_err(|cause| {
                CollaboratorSnafu {
                    name: "step handler".to_string(),
                    cause,
                }
                .build()
            })?;
        }

        if let Some(recording) = self.recording.as_mut() {
            recording.push(state.clone());
        }

        // Direction bookkeeping for the intermediate-reset policy.
        if self.direction.is_none() && target != self.mean_orbit.dt {
            self.direction = Some(target > self.mean_orbit.dt);
        }
        match self.direction {
            Some(true) if target > self.boundary_epoch => self.boundary_epoch = target,
            Some(false) if target < self.boundary_epoch => self.boundary_epoch = target,
            _ => {}
        }

        Ok(state)
    }

    /// Propagates for the provided duration from the initial epoch.
    pub fn for_duration(&mut self, duration: Duration) -> Result<Spacecraft, PropagationError> {
        self.propagate(self.mean_orbit.dt + duration)
    }

    /// Replaces the stored mean elements by re-solving mean-from-osculating
    /// for the provided state, and retains it as the new initial state.
    ///
    /// Fails with a distinct condition when the theory forbids re-entrant
    /// propagation.
    pub fn reset_initial_state(&mut self, new_state: Spacecraft) -> Result<(), PropagationError> {
        ensure!(
            self.theory.resettable(),
            NonResettableSnafu {
                theory: self.theory.name().to_string(),
            }
        );
        let mean_orbit = self
            .theory
            .mean_from_osculating(&new_state.orbit, &self.cfg)
            .context(TheorySnafu)?;
        self.mean_orbit = mean_orbit;
        self.initial_state = new_state;
        self.direction = None;
        self.boundary_epoch = mean_orbit.dt;
        Ok(())
    }

    /// Replaces the stored mean elements mid-arc. The reset must move along
    /// the already-established propagation direction: resetting backward
    /// after a forward propagation (or vice versa) is a design invariant
    /// violation, signalled distinctly from other reset failures.
    pub fn reset_intermediate_state(
        &mut self,
        new_state: Spacecraft,
    ) -> Result<(), PropagationError> {
        ensure!(
            self.theory.resettable(),
            NonResettableSnafu {
                theory: self.theory.name().to_string(),
            }
        );
        if let Some(forward) = self.direction {
            let epoch = new_state.epoch();
            let along = if forward {
                epoch >= self.boundary_epoch
            } else {
                epoch <= self.boundary_epoch
            };
            ensure!(
                along,
                ResetDirectionSnafu {
                    requested: epoch,
                    boundary: self.boundary_epoch,
                }
            );
        }
        let mean_orbit = self
            .theory
            .mean_from_osculating(&new_state.orbit, &self.cfg)
            .context(TheorySnafu)?;
        self.mean_orbit = mean_orbit;
        self.boundary_epoch = mean_orbit.dt;
        Ok(())
    }

    /// Harvests the state transition matrix and, when parameter columns are
    /// requested, the parameter Jacobian, as row-major arrays.
    ///
    /// Eighth-order central differencing with the step sized from the
    /// orbit's natural scale; every column is an independent shifted
    /// propagation, run in parallel.
    fn harvest(&self, target: Epoch) -> Result<(Vec<f64>, Option<Vec<f64>>), PropagationError> {
        let harvester = self.harvester.as_ref().unwrap();
        let theory = &self.theory;
        let cfg = &self.cfg;
        let y0_orbit = theory
            .osculating_from_mean(&self.mean_orbit, self.mean_orbit.dt)
            .context(TheorySnafu)?;
        let y0 = y0_orbit.to_cartesian_vec();
        let r_scale = y0_orbit.rmag();
        let v_scale = y0_orbit.vmag();

        let columns: Result<Vec<Vector6<f64>>, PropagationError> = (0..6usize)
            .into_par_iter()
            .map(|j| {
                let scale = if j < 3 { r_scale } else { v_scale };
                let h = FD_RELATIVE_STEP * scale;
                let mut column = Vector6::zeros();
                for (k, weight) in FD_STENCIL {
                    let mut plus = y0;
                    plus[j] += k * h;
                    let mut minus = y0;
                    minus[j] -= k * h;
                    let f_plus = fd_propagate(theory, cfg, &plus, &y0_orbit, target)?;
                    let f_minus = fd_propagate(theory, cfg, &minus, &y0_orbit, target)?;
                    column += (weight / h) * (f_plus - f_minus);
                }
                Ok(column)
            })
            .collect();
        let columns = columns?;
        let mut stm = Matrix6::zeros();
        for (j, column) in columns.iter().enumerate() {
            stm.set_column(j, column);
        }
        if let Some(phi0) = &harvester.initial_stm {
            stm = stm * phi0;
        }

        let column_names = harvester.column_names();
        let jacobian = if column_names.is_empty() {
            None
        } else {
            let param_columns: Result<Vec<Vector6<f64>>, PropagationError> = column_names
                .par_iter()
                .map(|name| {
                    let scale = harvester
                        .drivers()
                        .iter()
                        .find(|d| &d.name == name)
                        .map(|d| d.scale)
                        .unwrap_or(1.0);
                    let mut column = Vector6::zeros();
                    for (k, weight) in FD_STENCIL {
                        let f_plus =
                            fd_shifted_parameter(theory, cfg, name, k * scale, &y0_orbit, target)?;
                        let f_minus =
                            fd_shifted_parameter(theory, cfg, name, -k * scale, &y0_orbit, target)?;
                        column += (weight / scale) * (f_plus - f_minus);
                    }
                    Ok(column)
                })
                .collect();
            let param_columns = param_columns?;
            let mut direct = DMatrix::<f64>::zeros(6, column_names.len());
            for (j, column) in param_columns.iter().enumerate() {
                for i in 0..6 {
                    direct[(i, j)] = column[i];
                }
            }
            if let Some(j0) = &harvester.initial_jacobian {
                if j0.nrows() == 6 && j0.ncols() == direct.ncols() {
                    for i in 0..6 {
                        for j in 0..direct.ncols() {
                            let mut acc = 0.0;
                            for k in 0..6 {
                                acc += stm[(i, k)] * j0[(k, j)];
                            }
                            direct[(i, j)] += acc;
                        }
                    }
                } else {
                    warn!(
                        "initial parameter Jacobian is {}x{}, expected 6x{}: ignored",
                        j0.nrows(),
                        j0.ncols(),
                        direct.ncols()
                    );
                }
            }
            Some(direct)
        };

        let stm_array: Vec<f64> = (0..6)
            .flat_map(|i| (0..6).map(move |j| stm[(i, j)]))
            .collect();
        let jacobian_array: Option<Vec<f64>> = jacobian.map(|jac| {
            (0..6)
                .flat_map(|i| (0..jac.ncols()).map(|j| jac[(i, j)]).collect::<Vec<f64>>())
                .collect()
        });
        Ok((stm_array, jacobian_array))
    }
}

/// One full closed-form evaluation from a shifted initial Cartesian state:
/// re-solves the mean elements at the initial epoch, then evaluates at the
/// target.
fn fd_propagate<T: AnalyticalTheory>(
    theory: &T,
    cfg: &MeanSolverConfig,
    y0: &Vector6<f64>,
    reference: &Orbit,
    target: Epoch,
) -> Result<Vector6<f64>, PropagationError> {
    let orbit = Orbit::cartesian_vec(y0, reference.dt, reference.frame);
    let mean = theory.mean_from_osculating(&orbit, cfg).context(TheorySnafu)?;
    let osculating = theory
        .osculating_from_mean(&mean, target)
        .context(TheorySnafu)?;
    Ok(osculating.to_cartesian_vec())
}

/// One full closed-form evaluation with the named theory parameter shifted by
/// `delta`.
fn fd_shifted_parameter<T: AnalyticalTheory>(
    theory: &T,
    cfg: &MeanSolverConfig,
    name: &str,
    delta: f64,
    y0_orbit: &Orbit,
    target: Epoch,
) -> Result<Vector6<f64>, PropagationError> {
    let shifted = theory.with_parameter_shift(name, delta).context(TheorySnafu)?;
    let mean = shifted
        .mean_from_osculating(y0_orbit, cfg)
        .context(TheorySnafu)?;
    let osculating = shifted
        .osculating_from_mean(&mean, target)
        .context(TheorySnafu)?;
    Ok(osculating.to_cartesian_vec())
}

impl<T: AnalyticalTheory + Clone> AnalyticalPropagator<T> {
    /// Returns the bounded ephemeris of the states recorded so far.
    pub fn ephemeris(&self) -> Result<ClosedFormEphemeris<T>, EphemerisError> {
        ClosedFormEphemeris::new(
            self.theory.clone(),
            self.mean_orbit,
            self.attitude_provider.clone(),
            self.initial_state.mass_kg,
            self.extrapolation_threshold,
            self.recording.clone().unwrap_or_default(),
        )
    }
}
