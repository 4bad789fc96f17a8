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

use super::{AstroError, Frame, TimeTagged};
use crate::linalg::{Vector3, Vector6};
use crate::time::{Duration, Epoch};
use crate::utils::{between_0_360, between_0_tau, between_pm_pi};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use snafu::ensure;
use std::f64::consts::TAU;
use std::fmt;

/// If an orbit has an eccentricity below this value, it is considered circular.
pub const ECC_EPSILON: f64 = 1e-11;

/// Below this value of `sin(inc)`, the orbit is considered equatorial and the
/// ascending node is undefined.
const INC_EPSILON: f64 = 1e-11;

/// Iteration cap of the elliptic Kepler equation solver.
const KEPLER_MAX_ITER: usize = 50;

/// Orbit defines an orbital state.
///
/// Regardless of the constructor used, this struct stores all the state
/// information in Cartesian coordinates as these are always non singular:
/// exactly one representation is authoritative, every element set is derived
/// on demand. Conversions are total except at the representation-specific
/// singularities (circular orbits have no argument of periapsis, equatorial
/// orbits have no ascending node), where the accessors return the
/// conventional zero instead.
#[derive(Copy, Clone, Debug)]
pub struct Orbit {
    /// in km
    pub x: f64,
    /// in km
    pub y: f64,
    /// in km
    pub z: f64,
    /// in km/s
    pub vx: f64,
    /// in km/s
    pub vy: f64,
    /// in km/s
    pub vz: f64,
    pub dt: Epoch,
    /// Frame identity: everything we need to compute state information
    pub frame: Frame,
}

impl Orbit {
    /// Creates a new Orbit in the provided frame at the provided Epoch.
    ///
    /// **Units:** km, km, km, km/s, km/s, km/s
    pub fn cartesian(
        x: f64,
        y: f64,
        z: f64,
        vx: f64,
        vy: f64,
        vz: f64,
        dt: Epoch,
        frame: Frame,
    ) -> Self {
        Orbit {
            x,
            y,
            z,
            vx,
            vy,
            vz,
            dt,
            frame,
        }
    }

    /// Creates a new Orbit in the provided frame from the borrowed state vector.
    ///
    /// The state vector **must** be x, y, z, vx, vy, vz in km and km/s.
    pub fn cartesian_vec(state: &Vector6<f64>, dt: Epoch, frame: Frame) -> Self {
        Self::cartesian(
            state[0], state[1], state[2], state[3], state[4], state[5], dt, frame,
        )
    }

    /// Creates a new Orbit from the Keplerian orbital elements.
    ///
    /// **Units:** km, none, degrees, degrees, degrees, degrees
    ///
    /// The state is stored in Cartesian coordinates, so one should expect
    /// rounding errors on the order of 1e-12 when reading the elements back.
    pub fn keplerian(
        sma: f64,
        ecc: f64,
        inc: f64,
        raan: f64,
        aop: f64,
        ta: f64,
        dt: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let gm = frame.gm();
        if gm.abs() < f64::EPSILON {
            warn!("GM is near zero ({gm}): expect math errors in Keplerian to Cartesian conversion");
        }
        let ecc = if ecc < 0.0 {
            warn!("eccentricity cannot be negative: sign of eccentricity changed");
            -ecc
        } else {
            ecc
        };
        let sma = if ecc > 1.0 && sma > 0.0 {
            warn!("eccentricity > 1 (hyperbolic) BUT SMA > 0 (elliptical): sign of SMA changed");
            -sma
        } else if ecc < 1.0 && sma < 0.0 {
            warn!("eccentricity < 1 (elliptical) BUT SMA < 0 (hyperbolic): sign of SMA changed");
            -sma
        } else {
            sma
        };
        ensure!((1.0 - ecc).abs() >= f64::EPSILON, ParabolicSnafu);
        let p = sma * (1.0 - ecc.powi(2));
        ensure!(p.abs() >= f64::EPSILON, ParabolicSnafu);
        let (inc, raan, aop, ta) = (
            inc.to_radians(),
            raan.to_radians(),
            aop.to_radians(),
            ta.to_radians(),
        );
        let radius = p / (1.0 + ecc * ta.cos());
        ensure!(
            radius.is_finite() && radius > 0.0,
            InfiniteRadiusSnafu { ta_deg: ta.to_degrees() }
        );
        let (sin_aop_ta, cos_aop_ta) = (aop + ta).sin_cos();
        let (sin_inc, cos_inc) = inc.sin_cos();
        let (sin_raan, cos_raan) = raan.sin_cos();
        let (sin_aop, cos_aop) = aop.sin_cos();
        let x = radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan);
        let y = radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan);
        let z = radius * sin_aop_ta * sin_inc;
        let sqrt_gm_p = (gm / p).sqrt();
        let cos_ta_ecc = ta.cos() + ecc;
        let sin_ta = ta.sin();
        let vx = sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop);
        let vy = sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop);
        let vz = sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop);
        Ok(Orbit {
            x,
            y,
            z,
            vx,
            vy,
            vz,
            dt,
            frame,
        })
    }

    /// Creates a new Orbit from the Keplerian elements with a mean anomaly
    /// instead of the true anomaly, in degrees. Solves the elliptic Kepler
    /// equation, so this is only defined for closed orbits.
    #[allow(clippy::too_many_arguments)]
    pub fn keplerian_mean_anomaly(
        sma: f64,
        ecc: f64,
        inc: f64,
        raan: f64,
        aop: f64,
        ma: f64,
        dt: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let ea = Self::ecc_anomaly_from_mean(ma.to_radians(), ecc)?;
        let ta = Self::true_anomaly_from_ecc(ea, ecc);
        Self::keplerian(sma, ecc, inc, raan, aop, ta.to_degrees(), dt, frame)
    }

    /// Creates a new Orbit from the nonsingular circular elements
    /// (sma; ex = e·cos ω; ey = e·sin ω; inclination; RAAN; true argument of
    /// latitude α = ω + ν), angles in degrees.
    ///
    /// This parameterization stays regular through e = 0, which is why the
    /// near-circular zonal theories work in it.
    #[allow(clippy::too_many_arguments)]
    pub fn circular(
        sma: f64,
        ex: f64,
        ey: f64,
        inc: f64,
        raan: f64,
        alpha_v: f64,
        dt: Epoch,
        frame: Frame,
    ) -> Result<Self, AstroError> {
        let ecc = (ex.powi(2) + ey.powi(2)).sqrt();
        let aop_rad = if ecc > ECC_EPSILON {
            ey.atan2(ex)
        } else {
            0.0
        };
        let ta_rad = alpha_v.to_radians() - aop_rad;
        Self::keplerian(
            sma,
            ecc,
            inc,
            raan,
            aop_rad.to_degrees(),
            ta_rad.to_degrees(),
            dt,
            frame,
        )
    }

    /// Creates a new Orbit from the provided Keplerian state vector:
    /// sma, ecc, inc, raan, aop, ta (km and degrees).
    pub fn keplerian_vec(state: &Vector6<f64>, dt: Epoch, frame: Frame) -> Result<Self, AstroError> {
        Self::keplerian(
            state[0], state[1], state[2], state[3], state[4], state[5], dt, frame,
        )
    }

    /// Solves the elliptic Kepler equation M = E - e sin E for E, in radians.
    pub fn ecc_anomaly_from_mean(ma_rad: f64, ecc: f64) -> Result<f64, AstroError> {
        ensure!(
            (0.0..1.0).contains(&ecc),
            OpenOrbitAnomalySnafu { ecc }
        );
        let ma = between_pm_pi(ma_rad);
        // Standard starter: M itself converges for small e, π elsewhere.
        let mut ea = if ecc < 0.8 { ma } else { std::f64::consts::PI.copysign(ma) };
        for _ in 0..KEPLER_MAX_ITER {
            let f = ea - ecc * ea.sin() - ma;
            let fp = 1.0 - ecc * ea.cos();
            let delta = f / fp;
            ea -= delta;
            if delta.abs() < 1e-14 {
                return Ok(ea);
            }
        }
        Err(AstroError::KeplerConvergence {
            iterations: KEPLER_MAX_ITER,
        })
    }

    /// True anomaly from the eccentric anomaly, in radians.
    pub fn true_anomaly_from_ecc(ea_rad: f64, ecc: f64) -> f64 {
        2.0 * ((1.0 + ecc).sqrt() * (ea_rad / 2.0).sin())
            .atan2((1.0 - ecc).sqrt() * (ea_rad / 2.0).cos())
    }

    /// Returns the magnitude of the radius vector in km
    pub fn rmag(&self) -> f64 {
        (self.x.powi(2) + self.y.powi(2) + self.z.powi(2)).sqrt()
    }

    /// Returns the magnitude of the velocity vector in km/s
    pub fn vmag(&self) -> f64 {
        (self.vx.powi(2) + self.vy.powi(2) + self.vz.powi(2)).sqrt()
    }

    /// Returns the radius vector of this Orbit in [km, km, km]
    pub fn radius(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    /// Returns the velocity vector of this Orbit in [km/s, km/s, km/s]
    pub fn velocity(&self) -> Vector3<f64> {
        Vector3::new(self.vx, self.vy, self.vz)
    }

    /// Returns this state as a Cartesian Vector6 in [km, km, km, km/s, km/s, km/s]
    ///
    /// Note that the time is **not** returned in the vector.
    pub fn to_cartesian_vec(&self) -> Vector6<f64> {
        Vector6::new(self.x, self.y, self.z, self.vx, self.vy, self.vz)
    }

    /// Orbital momentum vector in km^2/s
    pub fn hvec(&self) -> Vector3<f64> {
        self.radius().cross(&self.velocity())
    }

    /// Norm of the orbital momentum in km^2/s
    pub fn hmag(&self) -> f64 {
        self.hvec().norm()
    }

    /// Specific mechanical energy in km^2/s^2
    pub fn energy(&self) -> f64 {
        self.vmag().powi(2) / 2.0 - self.frame.gm() / self.rmag()
    }

    /// Returns the semi-major axis in km
    pub fn sma(&self) -> f64 {
        -self.frame.gm() / (2.0 * self.energy())
    }

    /// Eccentricity vector (dimensionless)
    pub fn evec(&self) -> Vector3<f64> {
        let r = self.radius();
        let v = self.velocity();
        let gm = self.frame.gm();
        ((v.norm_squared() - gm / r.norm()) * r - r.dot(&v) * v) / gm
    }

    /// Returns the eccentricity (no unit)
    pub fn ecc(&self) -> f64 {
        self.evec().norm()
    }

    /// Returns the inclination in degrees
    pub fn inc(&self) -> f64 {
        (self.hvec()[2] / self.hmag()).acos().to_degrees()
    }

    /// Node line vector (points at the ascending node)
    fn nvec(&self) -> Vector3<f64> {
        Vector3::new(-self.hvec()[1], self.hvec()[0], 0.0)
    }

    /// Returns the right ascension of the ascending node in degrees.
    /// Zero by convention for equatorial orbits.
    pub fn raan(&self) -> f64 {
        let n = self.nvec();
        if n.norm() / self.hmag() < INC_EPSILON {
            return 0.0;
        }
        between_0_360(n[1].atan2(n[0]).to_degrees())
    }

    /// Returns the argument of periapsis in degrees.
    ///
    /// Zero by convention for circular orbits; measured from the x axis
    /// (longitude of periapsis) for equatorial orbits.
    pub fn aop(&self) -> f64 {
        let e = self.evec();
        if e.norm() < ECC_EPSILON {
            return 0.0;
        }
        let n = self.nvec();
        if n.norm() / self.hmag() < INC_EPSILON {
            // Equatorial: the node is undefined, measure from x.
            let lon_per = e[1].atan2(e[0]);
            return between_0_360(lon_per.to_degrees());
        }
        let mut aop = (n.dot(&e) / (n.norm() * e.norm())).clamp(-1.0, 1.0).acos();
        if e[2] < 0.0 {
            aop = TAU - aop;
        }
        between_0_360(aop.to_degrees())
    }

    /// Returns the true anomaly in degrees between 0 and 360.0.
    ///
    /// For circular orbits this is the angle measured from the reference
    /// direction used by `aop`, so that aop + ta is always the argument of
    /// latitude.
    pub fn ta(&self) -> f64 {
        let e = self.evec();
        let r = self.radius();
        if e.norm() < ECC_EPSILON {
            // Circular: measure from the node (or from x if also equatorial).
            let n = self.nvec();
            let reference = if n.norm() / self.hmag() < INC_EPSILON {
                Vector3::new(1.0, 0.0, 0.0)
            } else {
                n / n.norm()
            };
            let mut u = (reference.dot(&r) / r.norm()).clamp(-1.0, 1.0).acos();
            if r.dot(&self.hvec().cross(&reference)) < 0.0 {
                u = TAU - u;
            }
            return between_0_360(u.to_degrees());
        }
        let mut ta = (e.dot(&r) / (e.norm() * r.norm())).clamp(-1.0, 1.0).acos();
        if r.dot(&self.velocity()) < 0.0 {
            ta = TAU - ta;
        }
        between_0_360(ta.to_degrees())
    }

    /// Returns the eccentric anomaly in degrees (elliptic orbits).
    pub fn ea(&self) -> f64 {
        let ecc = self.ecc();
        let ta = self.ta().to_radians();
        let ea = ((1.0 - ecc).sqrt() * (ta / 2.0).sin())
            .atan2((1.0 + ecc).sqrt() * (ta / 2.0).cos())
            * 2.0;
        between_0_360(ea.to_degrees())
    }

    /// Returns the mean anomaly in degrees (elliptic orbits).
    pub fn ma(&self) -> f64 {
        let ea = self.ea().to_radians();
        between_0_360((ea - self.ecc() * ea.sin()).to_degrees())
    }

    /// Returns the semi parameter p = a (1 - e^2), in km
    pub fn semi_parameter(&self) -> f64 {
        self.sma() * (1.0 - self.ecc().powi(2))
    }

    /// Returns the radius of periapsis in km
    pub fn periapsis(&self) -> f64 {
        self.sma() * (1.0 - self.ecc())
    }

    /// Returns the radius of apoapsis in km
    pub fn apoapsis(&self) -> f64 {
        self.sma() * (1.0 + self.ecc())
    }

    /// Returns the orbital period (elliptic orbits)
    pub fn period(&self) -> Duration {
        use crate::time::Unit;
        2.0 * std::f64::consts::PI * (self.sma().powi(3) / self.frame.gm()).sqrt() * Unit::Second
    }

    /// Mean motion in rad/s (elliptic orbits)
    pub fn mean_motion(&self) -> f64 {
        (self.frame.gm() / self.sma().powi(3)).sqrt()
    }

    /// Circular nonsingular element ex = e cos(ω)
    pub fn circular_ex(&self) -> f64 {
        self.ecc() * self.aop().to_radians().cos()
    }

    /// Circular nonsingular element ey = e sin(ω)
    pub fn circular_ey(&self) -> f64 {
        self.ecc() * self.aop().to_radians().sin()
    }

    /// True argument of latitude α = ω + ν, in degrees
    pub fn alpha_true(&self) -> f64 {
        between_0_360(self.aop() + self.ta())
    }

    /// Mean argument of latitude αM = ω + M, in degrees
    pub fn alpha_mean(&self) -> f64 {
        between_0_360(self.aop() + self.ma())
    }

    /// Equinoctial element k = e cos(ω + Ω)
    pub fn equinoctial_k(&self) -> f64 {
        self.ecc() * (self.aop() + self.raan()).to_radians().cos()
    }

    /// Equinoctial element h = e sin(ω + Ω)
    pub fn equinoctial_h(&self) -> f64 {
        self.ecc() * (self.aop() + self.raan()).to_radians().sin()
    }

    /// True longitude L = Ω + ω + ν, in degrees
    pub fn true_longitude(&self) -> f64 {
        between_0_360(self.raan() + self.aop() + self.ta())
    }

    /// Two-body propagation of this orbit to the provided epoch: advances the
    /// mean anomaly at the Keplerian rate and keeps every other element.
    pub fn at_epoch(&self, epoch: Epoch) -> Result<Self, AstroError> {
        let dt_s = (epoch - self.dt).to_seconds();
        let ma_rad = between_0_tau(self.ma().to_radians() + self.mean_motion() * dt_s);
        Self::keplerian_mean_anomaly(
            self.sma(),
            self.ecc(),
            self.inc(),
            self.raan(),
            self.aop(),
            ma_rad.to_degrees(),
            epoch,
            self.frame,
        )
    }

    /// Returns the distance in kilometers between this state and another state,
    /// computed in this state's frame (the frames must match).
    pub fn distance_to(&self, other: &Orbit) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2))
            .sqrt()
    }

    /// Returns whether this orbit and another are equal within the provided
    /// absolute tolerances on radius (km) and velocity (km/s).
    pub fn eq_within(&self, other: &Self, radial_tol: f64, velocity_tol: f64) -> bool {
        self.dt == other.dt
            && (self.x - other.x).abs() < radial_tol
            && (self.y - other.y).abs() < radial_tol
            && (self.z - other.z).abs() < radial_tol
            && (self.vx - other.vx).abs() < velocity_tol
            && (self.vy - other.vy).abs() < velocity_tol
            && (self.vz - other.vz).abs() < velocity_tol
            && self.frame == other.frame
    }
}

impl TimeTagged for Orbit {
    fn epoch(&self) -> Epoch {
        self.dt
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.dt = epoch
    }
}

impl PartialEq for Orbit {
    /// Two states are equal if their position are equal within one millimeter
    /// and their velocities within one millimeter per second.
    fn eq(&self, other: &Self) -> bool {
        self.eq_within(other, 1e-6, 1e-6)
    }
}

impl fmt::Display for Orbit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] position = [{:.6}, {:.6}, {:.6}] km, velocity = [{:.6}, {:.6}, {:.6}] km/s",
            self.dt, self.x, self.y, self.z, self.vx, self.vy, self.vz
        )
    }
}

impl Serialize for Orbit {
    /// Serializes the Cartesian state and epoch.
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Orbit", 7)?;
        state.serialize_field("dt", &format!("{}", self.dt))?;
        state.serialize_field("x", &self.x)?;
        state.serialize_field("y", &self.y)?;
        state.serialize_field("z", &self.z)?;
        state.serialize_field("vx", &self.vx)?;
        state.serialize_field("vy", &self.vy)?;
        state.serialize_field("vz", &self.vz)?;
        state.end()
    }
}

use super::{InfiniteRadiusSnafu, OpenOrbitAnomalySnafu, ParabolicSnafu};
