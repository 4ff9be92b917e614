//! Property-based tests (§8.1.1 determinism, §8.1 location total order)
//! driven by `proptest`, fuzzing over the public `Location` API rather
//! than any crate-internal representation.

mod common;

use proptest::prelude::*;
use query_ir::{Direction, Location};

/// A small alphabet of edge names/directions is enough to explore the
/// total-order law; what matters is the shape of the chain, not the
/// specific names involved.
fn edge_step() -> impl Strategy<Value = (Direction, String, u32)> {
    (
        prop_oneof![Just(Direction::In), Just(Direction::Out)],
        prop_oneof![Just("Animal_ParentOf".to_string()), Just("Animal_OfSpecies".to_string())],
        0u32..4,
    )
}

fn location_chain() -> impl Strategy<Value = Location> {
    prop::collection::vec(edge_step(), 0..5).prop_map(|steps| {
        let mut loc = Location::root("Animal");
        for (direction, edge_name, ordinal) in steps {
            loc = loc.child_edge(direction, edge_name, ordinal);
        }
        loc
    })
}

proptest! {
    /// Two `Location`s built from the same step sequence compare equal
    /// regardless of when they were constructed (§3.2: value-typed, no
    /// pointer identity).
    #[test]
    fn rebuilding_the_same_chain_is_equal(steps in prop::collection::vec(edge_step(), 0..5)) {
        let mut a = Location::root("Animal");
        let mut b = Location::root("Animal");
        for (direction, edge_name, ordinal) in &steps {
            a = a.child_edge(*direction, edge_name.clone(), *ordinal);
            b = b.child_edge(*direction, edge_name.clone(), *ordinal);
        }
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    }

    /// Antisymmetry: if `a <= b` and `b <= a`, then `a == b`.
    #[test]
    fn ordering_is_antisymmetric(a in location_chain(), b in location_chain()) {
        if a <= b && b <= a {
            prop_assert_eq!(a, b);
        }
    }

    /// Transitivity of the total order over arbitrary location chains.
    #[test]
    fn ordering_is_transitive(a in location_chain(), b in location_chain(), c in location_chain()) {
        if a <= b && b <= c {
            prop_assert!(a <= c);
        }
    }

    /// A location is always a prefix of any child built by appending one
    /// more edge step to it, and never a prefix of its own parent.
    #[test]
    fn child_edge_extends_the_prefix_relation(a in location_chain(), step in edge_step()) {
        let (direction, edge_name, ordinal) = step;
        let child = a.child_edge(direction, edge_name, ordinal);
        prop_assert!(a.is_prefix_of(&child));
        prop_assert!(!child.is_prefix_of(&a));
        prop_assert_eq!(child.parent().as_ref(), Some(&a));
    }
}
