use hemera::cosmic::{Frame, Orbit, Spacecraft};
use hemera::propagators::{AdditionalStateProvider, AnalyticalPropagator};
use hemera::theories::Keplerian;
use hemera::time::{Epoch, Unit};
use std::error::Error;
use std::sync::Arc;

fn epoch() -> Epoch {
    Epoch::from_gregorian_tai_at_midnight(2023, 11, 2)
}

fn propagator() -> AnalyticalPropagator<Keplerian> {
    let orbit = Orbit::keplerian(
        8_000.0,
        0.01,
        35.0,
        10.0,
        20.0,
        30.0,
        epoch(),
        Frame::earth_j2000(),
    )
    .unwrap();
    AnalyticalPropagator::from_osculating(Keplerian, Spacecraft::new(orbit, 500.0)).unwrap()
}

/// Counts one more than the provider it depends on.
struct Counter {
    name: &'static str,
    dep: Option<&'static str>,
}

impl AdditionalStateProvider for Counter {
    fn name(&self) -> &str {
        self.name
    }

    fn dependency(&self) -> Option<&str> {
        self.dep
    }

    fn generate(&self, state: &Spacecraft) -> Result<Vec<f64>, Box<dyn Error + Send + Sync>> {
        let below = match self.dep {
            Some(dep) => state.additional_state(dep).unwrap()[0],
            None => 0.0,
        };
        Ok(vec![below + 1.0])
    }
}

fn counter(name: &'static str, dep: Option<&'static str>) -> Arc<dyn AdditionalStateProvider> {
    Arc::new(Counter { name, dep })
}

#[test]
fn chained_providers_resolve_in_dependency_order() {
    let mut prop = propagator();
    // A -> B -> ... -> F, registered in a shuffled order.
    prop.add_additional_state_provider(counter("E", Some("D")));
    prop.add_additional_state_provider(counter("B", Some("A")));
    prop.add_additional_state_provider(counter("F", Some("E")));
    prop.add_additional_state_provider(counter("A", None));
    prop.add_additional_state_provider(counter("D", Some("C")));
    prop.add_additional_state_provider(counter("C", Some("B")));
    let state = prop.propagate(epoch() + 10 * Unit::Minute).unwrap();
    for (name, expect) in [
        ("A", 1.0),
        ("B", 2.0),
        ("C", 3.0),
        ("D", 4.0),
        ("E", 5.0),
        ("F", 6.0),
    ] {
        assert_eq!(
            state.additional_state(name).unwrap(),
            &[expect],
            "provider {name} resolved out of order"
        );
    }
}

#[test]
fn cyclic_providers_are_silently_dropped() {
    let mut prop = propagator();
    prop.add_additional_state_provider(counter("A", None));
    prop.add_additional_state_provider(counter("B", Some("A")));
    prop.add_additional_state_provider(counter("C", Some("B")));
    // D -> F -> E -> D: a cycle. By design this is NOT an error: the three
    // entangled providers are simply absent from the produced state, while
    // everything outside the cycle still resolves.
    prop.add_additional_state_provider(counter("D", Some("F")));
    prop.add_additional_state_provider(counter("E", Some("D")));
    prop.add_additional_state_provider(counter("F", Some("E")));
    let state = prop.propagate(epoch() + 10 * Unit::Minute).unwrap();
    assert_eq!(state.additional_state("A").unwrap(), &[1.0]);
    assert_eq!(state.additional_state("B").unwrap(), &[2.0]);
    assert_eq!(state.additional_state("C").unwrap(), &[3.0]);
    assert!(!state.has_additional_state("D"));
    assert!(!state.has_additional_state("E"));
    assert!(!state.has_additional_state("F"));
}

#[test]
fn provider_failure_is_wrapped() {
    struct Failing;
    impl AdditionalStateProvider for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn generate(&self, _: &Spacecraft) -> Result<Vec<f64>, Box<dyn Error + Send + Sync>> {
            Err("sensor offline".into())
        }
    }
    let mut prop = propagator();
    prop.add_additional_state_provider(Arc::new(Failing));
    let err = prop.propagate(epoch() + 10 * Unit::Minute).unwrap_err();
    let rendered = format!("{err}");
    assert!(rendered.contains("failing"), "cause lost: {rendered}");
    assert!(
        format!("{:?}", err).contains("sensor offline") || rendered.contains("sensor offline"),
        "original cause not preserved: {rendered}"
    );
}
