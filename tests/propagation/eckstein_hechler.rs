use approx::assert_abs_diff_eq;
use hemera::cosmic::{Frame, Orbit, Spacecraft};
use hemera::propagators::{AnalyticalPropagator, PropagationError};
use hemera::theories::{
    AnalyticalTheory, EcksteinHechler, Keplerian, MeanSolverConfig, TheoryError, ZonalHarmonics,
};
use hemera::time::{Epoch, Unit};
use rstest::rstest;

fn epoch() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(2024, 2, 29)
}

fn sso() -> Orbit {
    // A near-frozen sun-synchronous orbit, squarely in the validity domain.
    Orbit::circular(
        7_200.0,
        1e-3,
        5e-4,
        98.6,
        123.0,
        40.0,
        epoch(),
        Frame::earth_j2000(),
    )
    .unwrap()
}

#[test]
fn eh_mean_osculating_round_trip() {
    let theory = EcksteinHechler::new(ZonalHarmonics::wgs84());
    let cfg = MeanSolverConfig::default();
    let mean = sso();
    let osculating = theory.osculating_from_mean(&mean, epoch()).unwrap();
    assert!(mean.distance_to(&osculating) > 1e-3);
    let recovered = theory.mean_from_osculating(&osculating, &cfg).unwrap();
    assert_abs_diff_eq!(recovered.sma(), mean.sma(), epsilon = 1e-6);
    assert_abs_diff_eq!(recovered.circular_ex(), mean.circular_ex(), epsilon = 1e-9);
    assert_abs_diff_eq!(recovered.circular_ey(), mean.circular_ey(), epsilon = 1e-9);
    assert_abs_diff_eq!(recovered.inc(), mean.inc(), epsilon = 1e-7);
    assert_abs_diff_eq!(recovered.raan(), mean.raan(), epsilon = 1e-7);
    assert_abs_diff_eq!(recovered.alpha_mean(), mean.alpha_mean(), epsilon = 1e-6);
}

#[test]
fn eh_same_epoch_returns_initial_position() {
    let initial = sso();
    let theory = EcksteinHechler::new(ZonalHarmonics::wgs84());
    let mut prop =
        AnalyticalPropagator::from_osculating(theory, Spacecraft::new(initial, 900.0)).unwrap();
    let state = prop.propagate(epoch()).unwrap();
    // The position comes back at near machine precision; the velocity may
    // differ slightly since the theory enforces its own non-Keplerian
    // consistency.
    assert!(
        state.orbit.distance_to(&initial) < 1e-6,
        "initial position not recovered: {} km off",
        state.orbit.distance_to(&initial)
    );
}

#[test]
fn eh_zero_coefficients_match_keplerian() {
    let mut zonals = ZonalHarmonics::wgs84();
    zonals.c20 = 0.0;
    zonals.c30 = 0.0;
    zonals.c40 = 0.0;
    zonals.c50 = 0.0;
    zonals.c60 = 0.0;
    let sc = Spacecraft::new(sso(), 900.0);
    let mut eh =
        AnalyticalPropagator::from_osculating(EcksteinHechler::new(zonals), sc.clone()).unwrap();
    let mut kep = AnalyticalPropagator::from_osculating(Keplerian, sc).unwrap();
    let target = epoch() + 100 * Unit::Second;
    let from_eh = eh.propagate(target).unwrap();
    let from_kep = kep.propagate(target).unwrap();
    assert!(
        from_eh.orbit.distance_to(&from_kep.orbit) < 1e-7,
        "two-body limit violated: {} km apart",
        from_eh.orbit.distance_to(&from_kep.orbit)
    );
}

#[test]
fn eh_sun_synchronous_node_rate() {
    let theory = EcksteinHechler::new(ZonalHarmonics::wgs84());
    let mut prop =
        AnalyticalPropagator::from_osculating(theory, Spacecraft::new(sso(), 900.0)).unwrap();
    let day = prop.propagate(epoch() + 1 * Unit::Day).unwrap();
    let drift = hemera::utils::between_pm_180(day.orbit.raan() - sso().raan());
    // A retrograde 7200 km orbit precesses eastward by about a degree per
    // day; that is what makes it sun-synchronous.
    assert!(
        drift > 0.5 && drift < 1.5,
        "unexpected nodal drift: {drift} deg/day"
    );
}

#[rstest]
#[case::near_equatorial("near_equatorial")]
#[case::critical_inclination("critical_inclination")]
#[case::eccentricity_above_ceiling("ecc_ceiling")]
#[case::perigee_below_radius("perigee_below_radius")]
fn eh_construction_rejections(#[case] which: &str) {
    let frame = Frame::earth_j2000();
    let orbit = match which {
        "near_equatorial" => {
            Orbit::keplerian(7_200.0, 0.001, 0.05, 0.0, 0.0, 0.0, epoch(), frame).unwrap()
        }
        "critical_inclination" => {
            let i_crit = (1.0_f64 / 5.0_f64.sqrt()).acos().to_degrees();
            Orbit::keplerian(7_200.0, 0.001, i_crit, 0.0, 0.0, 0.0, epoch(), frame).unwrap()
        }
        "ecc_ceiling" => {
            Orbit::keplerian(26_600.0, 0.2, 56.0, 0.0, 0.0, 0.0, epoch(), frame).unwrap()
        }
        "perigee_below_radius" => {
            Orbit::keplerian(6_500.0, 0.05, 56.0, 0.0, 0.0, 0.0, epoch(), frame).unwrap()
        }
        _ => unreachable!(),
    };
    let theory = EcksteinHechler::new(ZonalHarmonics::wgs84());
    let err = AnalyticalPropagator::from_osculating(theory, Spacecraft::new(orbit, 100.0))
        .err()
        .expect("construction must fail");
    let PropagationError::Theory { source } = err else {
        panic!("expected a theory rejection, got {err}");
    };
    match which {
        "near_equatorial" => assert!(matches!(source, TheoryError::NearEquatorial { .. })),
        "critical_inclination" => {
            assert!(matches!(source, TheoryError::CriticalInclination { .. }))
        }
        "ecc_ceiling" => assert!(matches!(source, TheoryError::EccentricityOutOfRange { .. })),
        "perigee_below_radius" => {
            assert!(matches!(source, TheoryError::InsideBrillouinSphere { .. }))
        }
        _ => unreachable!(),
    }
}
