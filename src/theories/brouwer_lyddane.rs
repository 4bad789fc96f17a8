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
    solve_mean_elements, AnalyticalTheory, CriticalInclinationSnafu, EccentricityOutOfRangeSnafu,
    GravityProvider, HyperbolicSnafu, InsideBrillouinSphereSnafu, MeanSolverConfig,
    ParameterDriver, TheoryError, UnknownParameterSnafu, ZonalHarmonics,
};
use crate::cosmic::Orbit;
use crate::time::Epoch;
use crate::utils::{between_0_tau, between_pm_pi};

/// Eccentricity ceiling of the theory. Above this the series truncation is no
/// longer trustworthy and construction fails.
pub const BROUWER_LYDDANE_MAX_ECC: f64 = 0.25;

/// Guard width on |1 - 5 cos^2(i)|: inside it the secular-rate denominator is
/// considered vanished and the theory refuses the orbit.
pub const CRITICAL_INCLINATION_GUARD: f64 = 1e-3;

/// Below this eccentricity the apsidal direction is meaningless: the
/// long-period corrections treat the orbit as exactly circular.
const APSIS_ECC_SWITCH: f64 = 1e-12;

/// Brouwer (1959) zonal theory in Lyddane's (1963) reformulation: secular
/// drift of the mean anomaly, node and perigee argument from the even zonal
/// terms, odd-zonal (J3/J5) long-period corrections, J2 short-period
/// corrections, plus a user-supplied M2 along-track secular term which models
/// the dominant effect of atmospheric drag without a drag force model.
///
/// The long-period corrections are evaluated in Lyddane's nonsingular
/// variables (e cos ω, e sin ω, ω + M) and the short-period ones through the
/// (a, p, i, Ω, u) set, so the near-circular branch stays regular; the
/// apsidal direction itself is only read back above `APSIS_ECC_SWITCH`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BrouwerLyddane {
    zonals: ZonalHarmonics,
    /// First-order secular drift of the mean anomaly in rad/s^2:
    /// M(t) = M0 + Mdot (t - t0) + M2 (t - t0)^2.
    m2: f64,
}

impl BrouwerLyddane {
    /// Builds the theory from a zonal coefficient set, without drag.
    pub fn new(zonals: ZonalHarmonics) -> Self {
        Self { zonals, m2: 0.0 }
    }

    /// Builds the theory with the M2 along-track drag stand-in (rad/s^2).
    pub fn with_m2(zonals: ZonalHarmonics, m2: f64) -> Self {
        Self { zonals, m2 }
    }

    /// Builds the theory by querying a gravity provider for degree 5 zonals
    /// at the provided epoch.
    pub fn from_provider<G: GravityProvider>(
        provider: &G,
        epoch: Epoch,
        m2: f64,
    ) -> Result<Self, TheoryError> {
        Ok(Self {
            zonals: provider.zonals(5, epoch)?,
            m2,
        })
    }

    pub fn zonals(&self) -> &ZonalHarmonics {
        &self.zonals
    }

    pub fn m2(&self) -> f64 {
        self.m2
    }

    /// One-shot mean-orbit computation: queries the gravity provider at the
    /// orbit's epoch and runs the iterative solve, without building a
    /// propagator.
    pub fn compute_mean_orbit<G: GravityProvider>(
        provider: &G,
        osculating: &Orbit,
        m2: f64,
        cfg: &MeanSolverConfig,
    ) -> Result<Orbit, TheoryError> {
        Self::from_provider(provider, osculating.dt, m2)?.mean_from_osculating(osculating, cfg)
    }

    /// Secular rates of the mean anomaly, perigee argument and node, in
    /// rad/s, evaluated on the mean elements: J2 to first order with the
    /// J2^2 and J4 corrections folded into the bracketed rate factors.
    fn secular_rates(&self, sma: f64, ecc: f64, inc_rad: f64) -> (f64, f64, f64) {
        let re = self.zonals.equatorial_radius_km;
        let j2 = self.zonals.j2();
        let j4 = self.zonals.j4();
        let n = (self.zonals.mu_km3_s2 / sma.powi(3)).sqrt();
        let eta = (1.0 - ecc.powi(2)).sqrt();
        let p = sma * eta.powi(2);
        let theta = inc_rad.cos();
        let theta2 = theta.powi(2);
        let s2 = 1.0 - theta2;
        let q = 0.5 * j2 * (re / p).powi(2);
        let k4 = j4 * (re / p).powi(4);

        let m_dot = n
            * (1.0
                + 1.5 * q * eta * (3.0 * theta2 - 1.0) * (1.0 + q * (1.25 - 2.5 * s2))
                - (15.0 / 32.0) * k4 * eta * ecc.powi(2) * (3.0 - 30.0 * theta2 + 35.0 * theta2 * theta2));
        let aop_dot = n
            * (1.5 * q * (5.0 * theta2 - 1.0) * (1.0 + q * (2.0 - (43.0 / 12.0) * s2))
                - (15.0 / 32.0) * k4 * (16.0 - 62.0 * s2 + 49.0 * s2 * s2) / 8.0);
        let raan_dot = n
            * (-3.0 * q * theta * (1.0 + q * (1.5 - (5.0 / 3.0) * s2))
                + (15.0 / 16.0) * k4 * theta * (4.0 - 7.0 * s2));
        (m_dot, aop_dot, raan_dot)
    }
}

impl AnalyticalTheory for BrouwerLyddane {
    fn name(&self) -> &'static str {
        "Brouwer-Lyddane"
    }

    fn validate(&self, orbit: &Orbit) -> Result<(), TheoryError> {
        let ecc = orbit.ecc();
        if ecc >= 1.0 || orbit.sma() <= 0.0 {
            return HyperbolicSnafu { ecc }.fail();
        }
        if ecc > BROUWER_LYDDANE_MAX_ECC {
            return EccentricityOutOfRangeSnafu {
                ecc,
                max_ecc: BROUWER_LYDDANE_MAX_ECC,
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
        let theta2 = orbit.inc().to_radians().cos().powi(2);
        if (1.0 - 5.0 * theta2).abs() < CRITICAL_INCLINATION_GUARD {
            return CriticalInclinationSnafu {
                inc_deg: orbit.inc(),
            }
            .fail();
        }
        Ok(())
    }

    fn osculating_from_mean(&self, mean: &Orbit, epoch: Epoch) -> Result<Orbit, TheoryError> {
        self.validate(mean)?;

        let re = self.zonals.equatorial_radius_km;
        let j2 = self.zonals.j2();
        let dt = (epoch - mean.dt).to_seconds();

        // Mean elements at the reference epoch. The semi-major axis,
        // eccentricity and inclination have no secular drift in this theory.
        let sma = mean.sma();
        let ecc = mean.ecc();
        let inc = mean.inc().to_radians();
        let (m_dot, aop_dot, raan_dot) = self.secular_rates(sma, ecc, inc);
        let ma = between_0_tau(mean.ma().to_radians() + m_dot * dt + self.m2 * dt.powi(2));
        let aop = between_0_tau(mean.aop().to_radians() + aop_dot * dt);
        let raan = between_0_tau(mean.raan().to_radians() + raan_dot * dt);

        let eta = (1.0 - ecc.powi(2)).sqrt();
        let p = sma * eta.powi(2);
        let theta = inc.cos();
        let theta2 = theta.powi(2);
        let sin_i = inc.sin();
        let s2 = 1.0 - theta2;
        let den = 1.0 - 5.0 * theta2;
        let kp = 0.5 * j2 * (re / p).powi(2);

        // Long-period corrections, evaluated in Lyddane's nonsingular
        // variables (e cos ω, e sin ω, ω + M) so they stay regular through
        // zero eccentricity. The even-zonal (J2) long-period terms in cos 2ω
        // carry the 1 - 5 cos^2(i) denominator; the odd zonals (J3, J5)
        // displace the eccentricity vector toward its frozen point.
        let (sin_aop, cos_aop) = if ecc > APSIS_ECC_SWITCH {
            aop.sin_cos()
        } else {
            (0.0, 1.0)
        };
        let ex = ecc * cos_aop;
        let ey = ecc * sin_aop;
        let lambda = aop + ma;
        let mut e_lp = 0.0;
        let mut i_lp = 0.0;
        let mut raan_lp = 0.0;
        let mut ey_odd = 0.0;
        let mut lambda_lp = 0.0;
        if j2.abs() > 1e-15 {
            let cos_2aop = cos_aop.powi(2) - sin_aop.powi(2);
            let sin_2aop = 2.0 * sin_aop * cos_aop;
            let de_even =
                (kp / 8.0) * ecc * eta.powi(2) * (1.0 - 11.0 * theta2 - 40.0 * theta2 * theta2 / den)
                    * cos_2aop;
            let j3 = self.zonals.j3();
            let j5 = self.zonals.j5();
            let j3_eff = j3 - (5.0 / 8.0) * j5 * (re / p).powi(2) * (1.0 - (7.0 / 4.0) * s2);
            let amp = j3_eff / (2.0 * j2) * (re / p) * sin_i;
            e_lp = de_even;
            if sin_i > 1e-6 {
                i_lp = -(ecc * de_even) / (eta.powi(2) * inc.tan());
            }
            raan_lp = -(kp / 8.0)
                * ecc.powi(2)
                * theta
                * (11.0 + 80.0 * theta2 / den + 200.0 * theta2 * theta2 / den.powi(2))
                * sin_2aop;
            // Odd-zonal displacement of the eccentricity vector (frozen
            // point), with its in-track counterpart; both are O(amp) and
            // regular at e = 0.
            ey_odd = -amp;
            lambda_lp = -amp * ey * eta.powi(2) / (1.0 + eta);
        }
        // Re-read the apsidal direction from the displaced eccentricity
        // vector, keeping the mean latitude argument continuous.
        let ex_l = ex + e_lp * cos_aop;
        let ey_l = ey + e_lp * sin_aop + ey_odd;
        let ecc_l = (ex_l.powi(2) + ey_l.powi(2)).sqrt();
        let aop_l = if ecc_l > APSIS_ECC_SWITCH {
            ey_l.atan2(ex_l)
        } else {
            0.0
        };
        let inc_l = inc + i_lp;
        let raan_l = raan + raan_lp;
        let ma_l = lambda + lambda_lp - aop_l;

        // Short-period J2 corrections, applied through the nonsingular
        // (a, p, i, Ω, u) set which stays regular through e = 0.
        let eta_l = (1.0 - ecc_l.powi(2)).sqrt();
        let p_l = sma * eta_l.powi(2);
        let theta_l = inc_l.cos();
        let theta2_l = theta_l.powi(2);
        let s2_l = 1.0 - theta2_l;
        let kp_l = 0.5 * j2 * (re / p_l).powi(2);
        let gamma2 = 0.5 * j2 * (re / sma).powi(2);

        let ea = Orbit::ecc_anomaly_from_mean(ma_l, ecc_l)
            .map_err(|source| TheoryError::TheoryAstro { source })?;
        let ta = Orbit::true_anomaly_from_ecc(ea, ecc_l);
        let u = aop_l + ta;
        let a_r = (1.0 + ecc_l * ta.cos()) / eta_l.powi(2);
        let (sin_2u, cos_2u) = (2.0 * u).sin_cos();
        let eq_ctr = between_pm_pi(ta - ma_l) + ecc_l * ta.sin();
        let cos_2aop_ta = (2.0 * aop_l + ta).cos();
        let sin_2aop_ta = (2.0 * aop_l + ta).sin();
        let cos_2aop_3ta = (2.0 * aop_l + 3.0 * ta).cos();
        let sin_2aop_3ta = (2.0 * aop_l + 3.0 * ta).sin();

        let d_sma = sma
            * gamma2
            * ((3.0 * theta2_l - 1.0) * (a_r.powi(3) - eta_l.powi(-3))
                + 3.0 * s2_l * a_r.powi(3) * cos_2u);
        let d_p = 1.5 * (j2 * re.powi(2) / p_l)
            * s2_l
            * (cos_2u + ecc_l * cos_2aop_ta + ecc_l / 3.0 * cos_2aop_3ta);
        let d_inc = (3.0 / 8.0) * j2 * (re / p_l).powi(2) * (2.0 * inc_l).sin()
            * (cos_2u + ecc_l * cos_2aop_ta + ecc_l / 3.0 * cos_2aop_3ta);
        let d_raan = -3.0
            * kp_l
            * theta_l
            * (eq_ctr - 0.5 * sin_2u - 0.5 * ecc_l * sin_2aop_ta - ecc_l / 6.0 * sin_2aop_3ta);
        let d_u = 1.5
            * kp_l
            * ((2.0 - 2.5 * s2_l) * eq_ctr + (1.0 - 1.5 * s2_l) * 0.5 * sin_2u);

        let sma_osc = sma + d_sma;
        let p_osc = p_l + d_p;
        let ecc_osc = (1.0 - p_osc / sma_osc).max(0.0).sqrt();
        let inc_osc = inc_l + d_inc;
        let raan_osc = between_0_tau(raan_l + d_raan);
        let u_osc = u + d_u;

        // The apsidal direction is carried by the eccentricity vector: this
        // assembly is exact above APSIS_ECC_SWITCH and falls back to the
        // circular representation below it.
        let (sin_w, cos_w) = aop_l.sin_cos();
        Orbit::circular(
            sma_osc,
            ecc_osc * cos_w,
            ecc_osc * sin_w,
            inc_osc.to_degrees(),
            raan_osc.to_degrees(),
            u_osc.to_degrees(),
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

    fn parameter_drivers(&self) -> Vec<ParameterDriver> {
        vec![ParameterDriver::new("M2", self.m2, 1e-12)]
    }

    fn with_parameter_shift(&self, name: &str, delta: f64) -> Result<Self, TheoryError> {
        if name == "M2" {
            Ok(Self {
                zonals: self.zonals,
                m2: self.m2 + delta,
            })
        } else {
            UnknownParameterSnafu { name }.fail()
        }
    }
}
