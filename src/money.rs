//! Minor-currency-unit conversion.
//!
//! Every stored monetary field is an `i64` count of kobo. Clients send naira
//! (major units) at the API boundary; the conversion happens exactly once, here.
//! Past this boundary no further scaling is applied anywhere, including payment
//! verification, which compares stored kobo directly with the gateway amount.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::errors::ServiceError;

const MINOR_PER_MAJOR: i64 = 100;

/// Converts a major-unit amount (naira) to minor units (kobo).
///
/// Rounds half away from zero to the nearest kobo, matching the storefront's
/// checkout rounding. Rejects negative amounts and amounts that overflow i64.
pub fn to_minor(amount: Decimal) -> Result<i64, ServiceError> {
    if amount.is_sign_negative() {
        return Err(ServiceError::InvalidInput(format!(
            "Amount must not be negative, got {amount}"
        )));
    }
    let scaled = (amount * Decimal::from(MINOR_PER_MAJOR))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    scaled.to_i64().ok_or_else(|| {
        ServiceError::InvalidInput(format!("Amount {amount} is out of range"))
    })
}

/// Converts stored minor units (kobo) back to a major-unit decimal for display.
pub fn from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_exact_two_decimal_amounts() {
        assert_eq!(to_minor(dec!(0)).unwrap(), 0);
        assert_eq!(to_minor(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_minor(dec!(99.99)).unwrap(), 9_999);
        assert_eq!(to_minor(dec!(10000)).unwrap(), 1_000_000);
        assert_eq!(to_minor(dec!(5000.00)).unwrap(), 500_000);
    }

    #[test]
    fn rounds_sub_kobo_amounts_to_nearest() {
        assert_eq!(to_minor(dec!(0.005)).unwrap(), 1);
        assert_eq!(to_minor(dec!(0.004)).unwrap(), 0);
        assert_eq!(to_minor(dec!(1.239)).unwrap(), 124);
    }

    #[test]
    fn rejects_negative_amounts() {
        assert!(to_minor(dec!(-1)).is_err());
        assert!(to_minor(dec!(-0.01)).is_err());
    }

    #[test]
    fn from_minor_formats_kobo_as_naira() {
        assert_eq!(from_minor(9_999), dec!(99.99));
        assert_eq!(from_minor(0), dec!(0.00));
        assert_eq!(from_minor(1_000_000), dec!(10000.00));
    }

    proptest! {
        // Any two-decimal major amount survives the round trip unchanged.
        #[test]
        fn two_decimal_round_trip(kobo in 0i64..=10_000_000_000) {
            let major = from_minor(kobo);
            prop_assert_eq!(to_minor(major).unwrap(), kobo);
        }
    }
}
