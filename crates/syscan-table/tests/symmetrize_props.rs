use proptest::prelude::*;
use syscan_table::{symmetrize, ShiftAccumulator};

proptest! {
    #[test]
    fn symmetric_input_has_no_shift(x in -1.0e6f64..1.0e6) {
        let result = symmetrize(x, -x);
        prop_assert!((result.magnitude - x.abs()).abs() <= 1e-9 * x.abs().max(1.0));
        prop_assert_eq!(result.shift, 0.0);
    }

    #[test]
    fn magnitude_is_never_negative(up in -1.0e3f64..1.0e3, down in -1.0e3f64..1.0e3) {
        let result = symmetrize(up, down);
        prop_assert!(result.magnitude >= 0.0);
        prop_assert!(result.magnitude.is_finite());
    }

    #[test]
    fn accumulator_sums_every_shift(pairs in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 0..16)) {
        let mut acc = ShiftAccumulator::default();
        let mut expected = 0.0;
        for (up, down) in &pairs {
            acc.symmetrize(*up, *down);
            expected += 0.5 * (up + down);
        }
        prop_assert!((acc.total() - expected).abs() < 1e-9);
    }
}

#[test]
fn same_signed_deviations_shift_the_centre() {
    let result = symmetrize(0.03, 0.01);
    assert!((result.shift - 0.02).abs() < 1e-15);
    assert!((result.magnitude - (0.01f64.powi(2) + 2.0 * 0.02f64.powi(2)).sqrt()).abs() < 1e-15);
}
