//! Unit-conversion invariants of the Delay type.

use proptest::prelude::*;
use sqltx_core::{Delay, TimeUnit};

fn units() -> impl Strategy<Value = TimeUnit> {
    prop_oneof![
        Just(TimeUnit::Microseconds),
        Just(TimeUnit::Milliseconds),
        Just(TimeUnit::Seconds),
        Just(TimeUnit::Minutes),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn micros_conversion_is_exact_in_range(
        amount in -1_000_000i64..1_000_000,
        unit in units(),
    ) {
        let delay = Delay::new(amount, unit);
        prop_assert_eq!(delay.as_micros(), amount * unit.in_micros());
    }

    #[test]
    fn equality_is_unit_independent(amount in -1_000i64..1_000) {
        prop_assert_eq!(
            Delay::new(amount, TimeUnit::Seconds),
            Delay::new(amount * 1_000, TimeUnit::Milliseconds)
        );
    }

    #[test]
    fn non_positive_delays_convert_to_zero(amount in -1_000_000i64..=0, unit in units()) {
        prop_assert_eq!(Delay::new(amount, unit).to_std(), std::time::Duration::ZERO);
    }

    #[test]
    fn positive_delays_round_trip_through_std(amount in 1i64..1_000_000, unit in units()) {
        let delay = Delay::new(amount, unit);
        prop_assert_eq!(delay.to_std().as_micros() as i64, delay.as_micros());
    }
}
