use hemera::cosmic::{Frame, Orbit, Spacecraft, TimeTagged};
use hemera::md::EphemerisError;
use hemera::propagators::AnalyticalPropagator;
use hemera::theories::{BrouwerLyddane, ZonalHarmonics};
use hemera::time::{Epoch, Unit};

fn epoch() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(2023, 3, 21)
}

fn propagator() -> AnalyticalPropagator<BrouwerLyddane> {
    let orbit = Orbit::keplerian(
        7_600.0,
        0.03,
        72.0,
        45.0,
        15.0,
        300.0,
        epoch(),
        Frame::earth_j2000(),
    )
    .unwrap();
    AnalyticalPropagator::from_osculating(
        BrouwerLyddane::new(ZonalHarmonics::wgs84()),
        Spacecraft::new(orbit, 420.0),
    )
    .unwrap()
}

#[test]
fn bounds_are_enforced_with_extrapolation_threshold() {
    let mut prop = propagator();
    prop.start_recording();
    // Out-of-order targets are fine: the ephemeris sorts what it records.
    prop.propagate(epoch()).unwrap();
    prop.propagate(epoch() + 1_000 * Unit::Second).unwrap();
    prop.propagate(epoch() + 500 * Unit::Second).unwrap();
    let ephemeris = prop.ephemeris().unwrap();
    assert_eq!(ephemeris.min_epoch(), epoch());
    assert_eq!(ephemeris.max_epoch(), epoch() + 1_000 * Unit::Second);
    assert_eq!(ephemeris.states().len(), 3);
    // Strictly inside: fine.
    assert!(ephemeris.at(epoch() + 250 * Unit::Second).is_ok());
    // Within the threshold just outside either bound: still fine.
    assert!(ephemeris
        .at(epoch() - 500 * Unit::Millisecond)
        .is_ok());
    assert!(ephemeris
        .at(epoch() + 1_000 * Unit::Second + 500 * Unit::Millisecond)
        .is_ok());
    // Beyond twice the threshold: a distinct out-of-bounds failure.
    let err = ephemeris.at(epoch() - 2_500 * Unit::Millisecond).unwrap_err();
    assert!(matches!(err, EphemerisError::OutsideBounds { .. }));
    let err = ephemeris
        .at(epoch() + 1_002 * Unit::Second + 500 * Unit::Millisecond)
        .unwrap_err();
    match err {
        EphemerisError::OutsideBounds { epoch: at, min, max, .. } => {
            assert!(at > max);
            assert!(min < max);
        }
        other => panic!("expected OutsideBounds, got {other}"),
    }
}

#[test]
fn recorded_states_are_monotonic() {
    let mut prop = propagator();
    prop.start_recording();
    for offset_s in [900, 100, 500, 300, 700] {
        prop.propagate(epoch() + offset_s * Unit::Second).unwrap();
    }
    let ephemeris = prop.ephemeris().unwrap();
    let states = ephemeris.states();
    for pair in states.windows(2) {
        assert!(pair[0].epoch() < pair[1].epoch());
    }
    assert_eq!(ephemeris.first().epoch(), epoch() + 100 * Unit::Second);
    assert_eq!(ephemeris.last().epoch(), epoch() + 900 * Unit::Second);
}

#[test]
fn ephemeris_matches_the_propagator_exactly() {
    let mut prop = propagator();
    prop.start_recording();
    prop.propagate(epoch()).unwrap();
    prop.propagate(epoch() + 2_000 * Unit::Second).unwrap();
    let ephemeris = prop.ephemeris().unwrap();
    let query = epoch() + 777 * Unit::Second;
    // Closed form all the way down: no interpolation is involved, so the
    // ephemeris and the propagator agree bit for bit.
    let from_ephemeris = ephemeris.at(query).unwrap();
    let from_propagator = prop.propagate(query).unwrap();
    assert_eq!(
        from_ephemeris.orbit.to_cartesian_vec(),
        from_propagator.orbit.to_cartesian_vec()
    );
}

#[test]
fn ephemeris_requires_recording() {
    let prop = propagator();
    assert!(matches!(prop.ephemeris(), Err(EphemerisError::Empty)));
}
