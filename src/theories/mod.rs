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

use crate::cosmic::{AstroError, Orbit};
use crate::time::Epoch;
use crate::utils::between_pm_pi;
use serde_derive::{Deserialize, Serialize};
use snafu::Snafu;

/// The Brouwer-Lyddane zonal theory with the M2 drag term.
pub mod brouwer_lyddane;
pub use self::brouwer_lyddane::BrouwerLyddane;

/// The Eckstein-Hechler circular-element zonal theory.
pub mod eckstein_hechler;
pub use self::eckstein_hechler::EcksteinHechler;

/// The pure two-body baseline theory.
pub mod keplerian;
pub use self::keplerian::Keplerian;

/// Closed-form perturbation theory errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TheoryError {
    #[snafu(display("orbit is hyperbolic or parabolic (ecc = {ecc}): closed-form zonal theories require a closed orbit"))]
    Hyperbolic { ecc: f64 },
    #[snafu(display(
        "eccentricity {ecc} exceeds the validity ceiling {max_ecc} of this theory"
    ))]
    EccentricityOutOfRange { ecc: f64, max_ecc: f64 },
    #[snafu(display("trajectory dips inside the Brillouin sphere: periapsis radius {periapsis_km} km is below the equatorial radius {radius_km} km"))]
    InsideBrillouinSphere { periapsis_km: f64, radius_km: f64 },
    #[snafu(display("inclination {inc_deg} deg is too close to the critical inclination: the secular rate denominator 1 - 5 cos^2(i) vanishes"))]
    CriticalInclination { inc_deg: f64 },
    #[snafu(display("inclination {inc_deg} deg is out of the validity domain of this theory (near-equatorial orbit)"))]
    NearEquatorial { inc_deg: f64 },
    #[snafu(display("unable to compute mean parameters after {iterations} iterations"))]
    MeanConvergence { iterations: usize },
    #[snafu(display("theory has no parameter named {name}"))]
    UnknownParameter { name: String },
    #[snafu(display("zonal gravity data is only defined for degrees 2 to 6, requested {degree}"))]
    UnsupportedDegree { degree: usize },
    #[snafu(display("astro error during theory evaluation: {source}"))]
    TheoryAstro { source: AstroError },
}

/// Unnormalized zonal gravity coefficients and the associated body constants.
///
/// The Jn = -Cn0 accessors are what the perturbation series actually consume.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZonalHarmonics {
    /// Gravitational parameter in km^3/s^2
    pub mu_km3_s2: f64,
    /// Equatorial radius of the central body in km
    pub equatorial_radius_km: f64,
    /// Unnormalized C20
    pub c20: f64,
    /// Unnormalized C30
    pub c30: f64,
    /// Unnormalized C40
    pub c40: f64,
    /// Unnormalized C50
    pub c50: f64,
    /// Unnormalized C60
    pub c60: f64,
}

impl ZonalHarmonics {
    /// Earth zonal coefficients (EGM96, unnormalized) with the GMAT body constants.
    pub fn wgs84() -> Self {
        Self {
            mu_km3_s2: crate::cosmic::EARTH_GM_KM3_S2,
            equatorial_radius_km: crate::cosmic::EARTH_EQUATORIAL_RADIUS_KM,
            c20: -1.082_626_683_55e-3,
            c30: 2.532_656_485_33e-6,
            c40: 1.619_621_591_37e-6,
            c50: 2.272_960_828_69e-7,
            c60: -5.406_812_391_07e-7,
        }
    }

    pub fn j2(&self) -> f64 {
        -self.c20
    }

    pub fn j3(&self) -> f64 {
        -self.c30
    }

    pub fn j4(&self) -> f64 {
        -self.c40
    }

    pub fn j5(&self) -> f64 {
        -self.c50
    }

    pub fn j6(&self) -> f64 {
        -self.c60
    }

    /// Returns a copy truncated to the requested zonal degree (coefficients
    /// above `degree` zeroed out).
    pub fn truncated(&self, degree: usize) -> Result<Self, TheoryError> {
        if !(2..=6).contains(&degree) {
            return UnsupportedDegreeSnafu { degree }.fail();
        }
        let mut out = *self;
        if degree < 6 {
            out.c60 = 0.0;
        }
        if degree < 5 {
            out.c50 = 0.0;
        }
        if degree < 4 {
            out.c40 = 0.0;
        }
        if degree < 3 {
            out.c30 = 0.0;
        }
        Ok(out)
    }
}

/// External gravity-coefficient collaborator: returns the body constants and
/// unnormalized zonal coefficients for a requested degree at a given epoch.
/// Evaluated once per theory construction.
pub trait GravityProvider {
    fn zonals(&self, degree: usize, epoch: Epoch) -> Result<ZonalHarmonics, TheoryError>;
}

impl GravityProvider for ZonalHarmonics {
    /// A constant coefficient set is its own provider.
    fn zonals(&self, degree: usize, _epoch: Epoch) -> Result<ZonalHarmonics, TheoryError> {
        self.truncated(degree)
    }
}

/// Configuration of the iterative mean-from-osculating solver.
///
/// There is deliberately no process-wide default: callers either build one
/// explicitly or take `MeanSolverConfig::default()` at construction.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeanSolverConfig {
    /// Convergence threshold on the scaled element-wise residual
    pub tolerance: f64,
    /// Hard cap on the fixed-point iterations: exhausting it is a failure,
    /// never a best-effort return.
    pub max_iterations: usize,
}

impl Default for MeanSolverConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 100,
        }
    }
}

impl MeanSolverConfig {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Default::default()
        }
    }
}

/// An adjustable physical parameter of a theory, as seen by the matrices
/// harvester: the Jacobian is only computed for drivers whose `selected`
/// flag is set, and `scale` sizes the differencing step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParameterDriver {
    pub name: String,
    /// Reference physical value, as configured on the theory
    pub reference: f64,
    /// Current physical value
    pub value: f64,
    /// Natural perturbation scale of this parameter
    pub scale: f64,
    /// Whether this parameter contributes a column to the parameter Jacobian
    pub selected: bool,
}

impl ParameterDriver {
    pub fn new(name: &str, value: f64, scale: f64) -> Self {
        Self {
            name: name.to_string(),
            reference: value,
            value,
            scale,
            selected: false,
        }
    }
}

/// The capability interface shared by every closed-form theory.
///
/// The propagator state machine depends only on this trait: theories are
/// interchangeable variants, not a hierarchy.
pub trait AnalyticalTheory: Send + Sync {
    fn name(&self) -> &'static str;

    /// Single up-front validation pass over an initial osculating orbit.
    /// Every validity violation is reported as its own error kind; nothing
    /// is silently clamped.
    fn validate(&self, orbit: &Orbit) -> Result<(), TheoryError>;

    /// Closed-form evaluation of the osculating orbit at `epoch` from the
    /// mean elements carried by `mean` (secular drift plus long- and
    /// short-period corrections).
    fn osculating_from_mean(&self, mean: &Orbit, epoch: Epoch) -> Result<Orbit, TheoryError>;

    /// Iteratively inverts `osculating_from_mean`: finds the mean orbit whose
    /// closed-form evaluation at the osculating epoch reproduces
    /// `osculating`. Exceeding `cfg.max_iterations` is a hard failure.
    fn mean_from_osculating(
        &self,
        osculating: &Orbit,
        cfg: &MeanSolverConfig,
    ) -> Result<Orbit, TheoryError>;

    /// The adjustable physical parameters of this theory (may be empty).
    fn parameter_drivers(&self) -> Vec<ParameterDriver> {
        Vec::new()
    }

    /// Returns a copy of this theory with the named parameter shifted by
    /// `delta`, used by the harvester's perturbation columns.
    fn with_parameter_shift(&self, name: &str, delta: f64) -> Result<Self, TheoryError>
    where
        Self: Sized,
    {
        let _ = delta;
        UnknownParameterSnafu { name }.fail()
    }

    /// Whether this theory supports re-solving its mean elements from an
    /// arbitrary state (some models forbid re-entrant propagation).
    fn resettable(&self) -> bool {
        true
    }
}

/// Shared fixed-point solver: iterates a trial mean orbit until its
/// closed-form osculating evaluation matches the target within `cfg`.
///
/// The residuals are formed in the nonsingular circular-element space so the
/// solve stays regular through zero eccentricity, and every angular residual
/// is normalized into (-π, π] before being applied.
pub(crate) fn solve_mean_elements<F>(
    osculating: &Orbit,
    cfg: &MeanSolverConfig,
    osc_of_mean: F,
) -> Result<Orbit, TheoryError>
where
    F: Fn(&Orbit) -> Result<Orbit, TheoryError>,
{
    let epoch = osculating.dt;
    let frame = osculating.frame;
    // Trial state, in circular elements.
    let mut sma = osculating.sma();
    let mut ex = osculating.circular_ex();
    let mut ey = osculating.circular_ey();
    let mut inc = osculating.inc().to_radians();
    let mut raan = osculating.raan().to_radians();
    let mut alpha = osculating.alpha_mean().to_radians();

    for _ in 0..cfg.max_iterations {
        let mean = Orbit::circular(
            sma,
            ex,
            ey,
            inc.to_degrees(),
            raan.to_degrees(),
            // The trial is built from the mean latitude argument: convert it
            // to a true latitude argument through the Kepler solve.
            alpha_true_from_mean(alpha, ex, ey)?.to_degrees(),
            epoch,
            frame,
        )
        .map_err(|source| TheoryError::TheoryAstro { source })?;
        let evaluated = osc_of_mean(&mean)?;

        let d_sma = osculating.sma() - evaluated.sma();
        let d_ex = osculating.circular_ex() - evaluated.circular_ex();
        let d_ey = osculating.circular_ey() - evaluated.circular_ey();
        let d_inc = between_pm_pi((osculating.inc() - evaluated.inc()).to_radians());
        let d_raan = between_pm_pi((osculating.raan() - evaluated.raan()).to_radians());
        let d_alpha =
            between_pm_pi((osculating.alpha_mean() - evaluated.alpha_mean()).to_radians());

        sma += d_sma;
        ex += d_ex;
        ey += d_ey;
        inc += d_inc;
        raan += d_raan;
        alpha += d_alpha;

        let residual = d_sma.abs() / osculating.sma()
            + d_ex.abs()
            + d_ey.abs()
            + d_inc.abs()
            + d_raan.abs()
            + d_alpha.abs();
        if residual < cfg.tolerance {
            let mean = Orbit::circular(
                sma,
                ex,
                ey,
                inc.to_degrees(),
                raan.to_degrees(),
                alpha_true_from_mean(alpha, ex, ey)?.to_degrees(),
                epoch,
                frame,
            )
            .map_err(|source| TheoryError::TheoryAstro { source })?;
            return Ok(mean);
        }
    }
    MeanConvergenceSnafu {
        iterations: cfg.max_iterations,
    }
    .fail()
}

/// Converts a mean latitude argument αM = ω + M into the true latitude
/// argument α = ω + ν for the given eccentricity vector, in radians.
pub(crate) fn alpha_true_from_mean(alpha_m: f64, ex: f64, ey: f64) -> Result<f64, TheoryError> {
    let ecc = (ex.powi(2) + ey.powi(2)).sqrt();
    if ecc < crate::cosmic::ECC_EPSILON {
        return Ok(alpha_m);
    }
    let aop = ey.atan2(ex);
    let ma = between_pm_pi(alpha_m - aop);
    let ea = Orbit::ecc_anomaly_from_mean(ma, ecc)
        .map_err(|source| TheoryError::TheoryAstro { source })?;
    let ta = Orbit::true_anomaly_from_ecc(ea, ecc);
    Ok(aop + ta)
}
