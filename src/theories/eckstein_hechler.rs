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
    alpha_true_from_mean, solve_mean_elements, AnalyticalTheory, CriticalInclinationSnafu,
    EccentricityOutOfRangeSnafu, GravityProvider, HyperbolicSnafu, InsideBrillouinSphereSnafu,
    MeanSolverConfig, NearEquatorialSnafu, TheoryError, ZonalHarmonics,
};
use crate::cosmic::Orbit;
use crate::time::Epoch;
use crate::utils::between_0_tau;

/// Hard eccentricity ceiling: the circular-element expansion breaks down well
/// before this, so anything above is rejected outright.
pub const ECKSTEIN_HECHLER_MAX_ECC: f64 = 0.1;

/// Below this value of sin(i) the orbit is considered equatorial, which is
/// outside the validity domain of the theory.
const EQUATORIAL_GUARD: f64 = 5e-3;

/// Guard width on |1 - 5 cos^2(i)| around the critical inclination.
const CRITICAL_GUARD: f64 = 1e-3;

/// Eckstein-Hechler closed-form theory for near-circular orbits.
///
/// The mean state is carried in nonsingular circular elements
/// (a, ex = e cos ω, ey = e sin ω, i, Ω, αM): the semi-major axis and
/// inclination are constant, the node and mean latitude argument drift
/// secularly under the even zonals (g2, g2², g4, g6 rate polynomials), and
/// the eccentricity vector rotates at the apsidal rate about the frozen
/// point set by the odd zonals (g3, g5). First-order g2 short-period
/// corrections map the mean elements to osculating ones.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EcksteinHechler {
    zonals: ZonalHarmonics,
}

impl EcksteinHechler {
    pub fn new(zonals: ZonalHarmonics) -> Self {
        Self { zonals }
    }

    /// Builds the theory by querying a gravity provider for degree 6 zonals
    /// at the provided epoch.
    pub fn from_provider<G: GravityProvider>(
        provider: &G,
        epoch: Epoch,
    ) -> Result<Self, TheoryError> {
        Ok(Self {
            zonals: provider.zonals(6, epoch)?,
        })
    }

    pub fn zonals(&self) -> &ZonalHarmonics {
        &self.zonals
    }

    /// One-shot mean-orbit computation: queries the gravity provider at the
    /// orbit's epoch and runs the iterative solve, without building a
    /// propagator.
    pub fn compute_mean_orbit<G: GravityProvider>(
        provider: &G,
        osculating: &Orbit,
        cfg: &MeanSolverConfig,
    ) -> Result<Orbit, TheoryError> {
        Self::from_provider(provider, osculating.dt)?.mean_from_osculating(osculating, cfg)
    }

    /// g_n = Jn (Re/a)^n, the natural expansion parameters of the theory.
    fn g_coefficients(&self, sma: f64) -> [f64; 5] {
        let ra = self.zonals.equatorial_radius_km / sma;
        [
            self.zonals.j2() * ra.powi(2),
            self.zonals.j3() * ra.powi(3),
            self.zonals.j4() * ra.powi(4),
            self.zonals.j5() * ra.powi(5),
            self.zonals.j6() * ra.powi(6),
        ]
    }

    /// Secular rates (mean latitude argument, apsidal rotation, node) in
    /// rad/s. Even zonals only; the Legendre-polynomial structure in cos i
    /// carries the higher degrees.
    fn secular_rates(&self, sma: f64, inc_rad: f64) -> (f64, f64, f64) {
        let [g2, _g3, g4, _g5, g6] = self.g_coefficients(sma);
        let n = (self.zonals.mu_km3_s2 / sma.powi(3)).sqrt();
        let c = inc_rad.cos();
        let c2 = c.powi(2);
        let s2 = 1.0 - c2;
        let p4 = 0.125 * (35.0 * c2 * c2 - 30.0 * c2 + 3.0);
        let p6 = 0.0625 * (231.0 * c2 * c2 * c2 - 315.0 * c2 * c2 + 105.0 * c2 - 5.0);

        let alpha_m_dot = n
            * (1.0
                + 1.5 * g2 * (4.0 * c2 - 1.0) * (1.0 + g2 * (1.25 - (35.0 / 12.0) * s2))
                - (15.0 / 8.0) * g4 * p4
                + (35.0 / 16.0) * g6 * p6);
        let aop_dot = n
            * (0.75 * g2 * (5.0 * c2 - 1.0) * (1.0 + g2 * (2.0 - (43.0 / 12.0) * s2))
                - (15.0 / 32.0) * g4 * (16.0 - 62.0 * s2 + 49.0 * s2 * s2) / 8.0);
        let raan_dot = -n
            * c
            * (1.5 * g2 * (1.0 + g2 * (1.5 - (5.0 / 3.0) * s2))
                - (15.0 / 8.0) * g4 * (1.0 - 1.75 * s2)
                + (105.0 / 64.0) * g6 * (1.0 - 3.0 * s2 + (33.0 / 16.0) * s2 * s2));
        (alpha_m_dot, aop_dot, raan_dot)
    }

    /// Frozen eccentricity vector component along sin ω, set by the odd
    /// zonals. Zero when the even-zonal rotation is itself negligible.
    fn frozen_ey(&self, sma: f64, inc_rad: f64) -> f64 {
        let [g2, g3, _g4, g5, _g6] = self.g_coefficients(sma);
        if g2.abs() < 1e-15 {
            return 0.0;
        }
        let sin_i = inc_rad.sin();
        let s2 = sin_i.powi(2);
        -(sin_i / (2.0 * g2)) * (g3 - (5.0 / 8.0) * g5 * (1.0 - 1.75 * s2))
    }
}

impl AnalyticalTheory for EcksteinHechler {
    fn name(&self) -> &'static str {
        "Eckstein-Hechler"
    }

    fn validate(&self, orbit: &Orbit) -> Result<(), TheoryError> {
        let ecc = orbit.ecc();
        if ecc >= 1.0 || orbit.sma() <= 0.0 {
            return HyperbolicSnafu { ecc }.fail();
        }
        if ecc >= ECKSTEIN_HECHLER_MAX_ECC {
            return EccentricityOutOfRangeSnafu {
                ecc,
                max_ecc: ECKSTEIN_HECHLER_MAX_ECC,
            }
            .fail();
        }
        let periapsis = orbit.periapsis();
        let radius = self.zonals.equatorial_radius_km;
        if periapsis <= radius {
            return InsideBrillouinSphereSnafu {
                periapsis_km: periapsis,
                radius_km: radius,
            }
            .fail();
        }
        let inc_rad = orbit.inc().to_radians();
        if inc_rad.sin() < EQUATORIAL_GUARD {
            return NearEquatorialSnafu {
                inc_deg: orbit.inc(),
            }
            .fail();
        }
        let theta2 = inc_rad.cos().powi(2);
        if (1.0 - 5.0 * theta2).abs() < CRITICAL_GUARD {
            return CriticalInclinationSnafu {
                inc_deg: orbit.inc(),
            }
            .fail();
        }
        Ok(())
    }

    fn osculating_from_mean(&self, mean: &Orbit, epoch: Epoch) -> Result<Orbit, TheoryError> {
        self.validate(mean)?;

        let dt = (epoch - mean.dt).to_seconds();
        let sma = mean.sma();
        let inc = mean.inc().to_radians();
        let ex0 = mean.circular_ex();
        let ey0 = mean.circular_ey();
        let (alpha_m_dot, aop_dot, raan_dot) = self.secular_rates(sma, inc);

        // Secular evolution: node and mean latitude argument drift, and the
        // eccentricity vector rotates at the apsidal rate about the frozen
        // point (0, ey_f).
        let ey_f = self.frozen_ey(sma, inc);
        let psi = aop_dot * dt;
        let (sin_psi, cos_psi) = psi.sin_cos();
        let ex = ex0 * cos_psi - (ey0 - ey_f) * sin_psi;
        let ey = ey_f + ex0 * sin_psi + (ey0 - ey_f) * cos_psi;
        let raan = between_0_tau(mean.raan().to_radians() + raan_dot * dt);
        let alpha_m = between_0_tau(mean.alpha_mean().to_radians() + alpha_m_dot * dt);

        // First-order g2 short-period corrections, in circular elements.
        let [g2, _g3, _g4, _g5, _g6] = self.g_coefficients(sma);
        let c = inc.cos();
        let s2 = 1.0 - c.powi(2);
        let f = alpha_true_from_mean(alpha_m, ex, ey)?;
        let (sin_f, cos_f) = f.sin_cos();
        let (sin_2f, cos_2f) = (2.0 * f).sin_cos();
        let (sin_3f, cos_3f) = (3.0 * f).sin_cos();

        let d_sma = 1.5 * g2 * sma * (s2 * cos_2f + (2.0 - 3.0 * s2) * (ex * cos_f + ey * sin_f));
        let d_ex = g2 * ((1.0 - 1.5 * s2) * cos_f + 0.25 * s2 * cos_3f);
        let d_ey = g2 * ((1.0 - 1.25 * s2) * sin_f + 0.25 * s2 * sin_3f);
        let d_inc = (3.0 / 8.0) * g2 * (2.0 * inc).sin() * cos_2f;
        let d_raan = 0.75 * g2 * c * sin_2f;
        let d_alpha = (3.0 / 8.0) * g2 * (2.0 - 3.0 * s2) * sin_2f;

        Orbit::circular(
            sma + d_sma,
            ex + d_ex,
            ey + d_ey,
            (inc + d_inc).to_degrees(),
            (raan + d_raan).to_degrees(),
            (f + d_alpha).to_degrees(),
            epoch,
            mean.frame,
        )
        .map_err(|source| TheoryError::TheoryAstro { source })
    }

    fn mean_from_osculating(
        &self,
        osculating: &Orbit,
        cfg: &MeanSolverConfig,
    ) -> Result<Orbit, TheoryError> {
        self.validate(osculating)?;
        solve_mean_elements(osculating, cfg, |mean| {
            self.osculating_from_mean(mean, osculating.dt)
        })
    }
}
