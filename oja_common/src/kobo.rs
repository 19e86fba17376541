use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const NAIRA_CURRENCY_CODE: &str = "NGN";
pub const NAIRA_CURRENCY_CODE_LOWER: &str = "ngn";

//--------------------------------------        Kobo        ----------------------------------------------------------

/// An amount of money in kobo, the NGN minor unit (100 kobo = ₦1).
///
/// Every monetary column in the database stores kobo as an integer. Paystack amounts are already
/// denominated in kobo, so webhook and API values convert without rounding.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Kobo(i64);

op!(binary Kobo, Add, add);
op!(binary Kobo, Sub, sub);
op!(inplace Kobo, SubAssign, sub_assign);
op!(unary Kobo, Neg, neg);

impl Mul<i64> for Kobo {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Kobo {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in kobo: {0}")]
pub struct KoboConversionError(String);

impl From<i64> for Kobo {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Kobo {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Kobo {}

impl TryFrom<u64> for Kobo {
    type Error = KoboConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(KoboConversionError(format!("Value {} is too large to convert to Kobo", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Kobo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let naira = self.0 as f64 / 100.0;
        write!(f, "₦{naira:0.2}")
    }
}

impl Kobo {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_naira(naira: i64) -> Self {
        Self(naira * 100)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_in_naira() {
        assert_eq!(Kobo::from(150_050).to_string(), "₦1500.50");
        assert_eq!(Kobo::from_naira(25).to_string(), "₦25.00");
        assert_eq!(Kobo::default().to_string(), "₦0.00");
    }

    #[test]
    fn arithmetic() {
        let unit = Kobo::from_naira(12);
        let total = unit * 3 + Kobo::from(50);
        assert_eq!(total, Kobo::from(3_650));
        let sum: Kobo = vec![Kobo::from(100), Kobo::from(250)].into_iter().sum();
        assert_eq!(sum, Kobo::from(350));
    }

    #[test]
    fn u64_conversion_guards_overflow() {
        assert!(Kobo::try_from(u64::MAX).is_err());
        assert_eq!(Kobo::try_from(420u64).unwrap(), Kobo::from(420));
    }
}
