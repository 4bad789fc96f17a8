use hemera::cosmic::{Frame, Orbit, Spacecraft};
use hemera::linalg::{Matrix6, Vector6};
use hemera::propagators::{AnalyticalPropagator, OrbitType, PositionAngle, PropagationError};
use hemera::theories::{BrouwerLyddane, Keplerian, ZonalHarmonics};
use hemera::time::{Epoch, Unit};

fn epoch() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(2023, 8, 12)
}

fn leo() -> Orbit {
    Orbit::keplerian(
        7_400.0,
        0.015,
        48.0,
        95.0,
        70.0,
        25.0,
        epoch(),
        Frame::earth_j2000(),
    )
    .unwrap()
}

/// Independent second-order central-difference STM: one freshly constructed
/// propagator per perturbation column, exactly as a user would validate it.
fn reference_stm<T: hemera::theories::AnalyticalTheory + Clone>(
    theory: &T,
    initial: &Orbit,
    target: Epoch,
) -> Matrix6<f64> {
    let h_pos = 1e-2;
    let h_vel = 1e-4;
    let mut stm = Matrix6::zeros();
    for j in 0..6 {
        let h = if j < 3 { h_pos } else { h_vel };
        let mut plus = initial.to_cartesian_vec();
        plus[j] += h;
        let mut minus = initial.to_cartesian_vec();
        minus[j] -= h;
        let f = |y0: Vector6<f64>| -> Vector6<f64> {
            let orbit = Orbit::cartesian_vec(&y0, initial.dt, initial.frame);
            let mut prop =
                AnalyticalPropagator::from_osculating(theory.clone(), Spacecraft::new(orbit, 1.0))
                    .unwrap();
            prop.propagate(target).unwrap().orbit.to_cartesian_vec()
        };
        let column = (f(plus) - f(minus)) / (2.0 * h);
        for i in 0..6 {
            stm[(i, j)] = column[i];
        }
    }
    stm
}

#[test]
fn keplerian_stm_matches_finite_differences() {
    let mut prop =
        AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(leo(), 100.0)).unwrap();
    prop.setup_matrices_computation("stm", None, None).unwrap();
    let target = epoch() + 1_000 * Unit::Second;
    let state = prop.propagate(target).unwrap();
    let stm = prop
        .harvester()
        .unwrap()
        .state_transition_matrix(&state)
        .unwrap();
    let reference = reference_stm(&Keplerian, &leo(), target);
    let rel = (stm - reference).norm() / reference.norm();
    assert!(rel < 1e-6, "Keplerian STM off by {rel} (relative)");
}

#[test]
fn brouwer_lyddane_stm_matches_finite_differences() {
    let theory = BrouwerLyddane::new(ZonalHarmonics::wgs84());
    let mut prop =
        AnalyticalPropagator::from_osculating(theory, Spacecraft::new(leo(), 100.0)).unwrap();
    prop.setup_matrices_computation("stm", None, None).unwrap();
    let target = epoch() + 1_000 * Unit::Second;
    let state = prop.propagate(target).unwrap();
    let stm = prop
        .harvester()
        .unwrap()
        .state_transition_matrix(&state)
        .unwrap();
    let reference = reference_stm(&theory, &leo(), target);
    let rel = (stm - reference).norm() / reference.norm();
    // The closed-form theory is itself an approximation: the agreement
    // target is looser than for the exact two-body case.
    assert!(rel < 1e-5, "Brouwer-Lyddane STM off by {rel} (relative)");
}

#[test]
fn stm_maps_small_initial_perturbations() {
    let mut prop =
        AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(leo(), 100.0)).unwrap();
    prop.setup_matrices_computation("stm", None, None).unwrap();
    let target = epoch() + 1_000 * Unit::Second;
    let state = prop.propagate(target).unwrap();
    let stm = prop
        .harvester()
        .unwrap()
        .state_transition_matrix(&state)
        .unwrap();

    let dy0 = Vector6::new(1e-3, -2e-3, 5e-4, 1e-6, -2e-6, 1e-6);
    let shifted = Orbit::cartesian_vec(&(leo().to_cartesian_vec() + dy0), epoch(), leo().frame);
    let mut shifted_prop =
        AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(shifted, 100.0)).unwrap();
    let propagated = shifted_prop.propagate(target).unwrap();
    let linear = state.orbit.to_cartesian_vec() + stm * dy0;
    let err = (propagated.orbit.to_cartesian_vec() - linear).norm();
    // First-order prediction of a meter-level shift is good to ~mm.
    assert!(err < 1e-5, "STM linear prediction off by {err} km");
}

#[test]
fn m2_parameter_jacobian() {
    let zonals = ZonalHarmonics::wgs84();
    let theory = BrouwerLyddane::with_m2(zonals, 2e-14);
    let mut prop =
        AnalyticalPropagator::from_osculating(theory, Spacecraft::new(leo(), 100.0)).unwrap();
    prop.setup_matrices_computation("stm", None, None).unwrap();

    let target = epoch() + 1 * Unit::Hour;
    // Nothing selected yet: the Jacobian is explicitly absent, not empty.
    let state = prop.propagate(target).unwrap();
    assert!(prop
        .harvester()
        .unwrap()
        .parameters_jacobian(&state)
        .unwrap()
        .is_none());

    prop.harvester_mut()
        .unwrap()
        .driver_mut("M2")
        .unwrap()
        .selected = true;
    prop.harvester_mut().unwrap().freeze_columns_names();
    let state = prop.propagate(target).unwrap();
    let jacobian = prop
        .harvester()
        .unwrap()
        .parameters_jacobian(&state)
        .unwrap()
        .expect("M2 selected: the Jacobian must be present");
    assert_eq!(jacobian.nrows(), 6);
    assert_eq!(jacobian.ncols(), 1);

    // Independent two-sided difference with a different step.
    let h = 2e-12;
    let eval = |m2: f64| -> Vector6<f64> {
        let theory = BrouwerLyddane::with_m2(zonals, m2);
        let mut prop =
            AnalyticalPropagator::from_osculating(theory, Spacecraft::new(leo(), 100.0)).unwrap();
        prop.propagate(target).unwrap().orbit.to_cartesian_vec()
    };
    let reference = (eval(2e-14 + h) - eval(2e-14 - h)) / (2.0 * h);
    let harvested = Vector6::from_fn(|i, _| jacobian[(i, 0)]);
    let rel = (harvested - reference).norm() / reference.norm();
    assert!(rel < 1e-5, "M2 Jacobian off by {rel} (relative)");
}

#[test]
fn initial_stm_composes() {
    let mut prop =
        AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(leo(), 100.0)).unwrap();
    let target = epoch() + 500 * Unit::Second;

    prop.setup_matrices_computation("stm", None, None).unwrap();
    let plain = prop.propagate(target).unwrap();
    let stm_plain = prop
        .harvester()
        .unwrap()
        .state_transition_matrix(&plain)
        .unwrap();

    let doubled = Matrix6::identity() * 2.0;
    prop.setup_matrices_computation("stm", Some(doubled), None)
        .unwrap();
    let composed = prop.propagate(target).unwrap();
    let stm_composed = prop
        .harvester()
        .unwrap()
        .state_transition_matrix(&composed)
        .unwrap();
    assert!(
        (stm_composed - stm_plain * 2.0).norm() < 1e-12,
        "initial STM composition broken"
    );
}

#[test]
fn harvester_conventions_and_name_validation() {
    let mut prop =
        AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(leo(), 100.0)).unwrap();
    assert!(matches!(
        prop.setup_matrices_computation("", None, None),
        Err(PropagationError::EmptyStmName)
    ));
    let harvester = prop.setup_matrices_computation("phi", None, None).unwrap();
    assert_eq!(harvester.stm_name(), "phi");
    assert_eq!(harvester.orbit_type(), OrbitType::Cartesian);
    assert_eq!(harvester.position_angle(), PositionAngle::Mean);
}
