//! Property-based coverage of digest's idempotence invariant: once
//! digested, a `Model` is frozen. For any constant initial value,
//! running the twenty-stage pipeline a second time over its own output
//! must not change any attribute it assigned the first time.

use n2a_core::config::NumericBackend;
use n2a_core::digest;
use n2a_core::parser::parse_model;
use proptest::prelude::*;

proptest! {
    #[test]
    fn digesting_an_already_digested_model_is_a_no_op(initial in -1.0e6f64..1.0e6) {
        let source = format!("x = {initial} @ $init\nx' = -x\n");
        let model = parse_model("Leaky", &source).unwrap();

        let (once, _) = digest::run(model, NumericBackend::Float).unwrap();
        let attrs_before: Vec<_> = once.part(once.root).variables.iter().map(|v| v.attributes.clone()).collect();
        let order_before = once.part(once.root).ordered.clone();

        let (twice, _) = digest::run(once, NumericBackend::Float).unwrap();
        let attrs_after: Vec<_> = twice.part(twice.root).variables.iter().map(|v| v.attributes.clone()).collect();
        let order_after = twice.part(twice.root).ordered.clone();

        prop_assert_eq!(attrs_before, attrs_after);
        prop_assert_eq!(order_before, order_after);
    }
}
