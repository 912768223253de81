//! Price type for squad valuation
//!
//! Prices are integers in tenths of a currency unit: a £8.5m player is
//! stored as 85 and a £100.0m budget as 1000.

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price {
    /// Amount in tenths of a unit
    pub tenths: i32,
}

impl Price {
    pub const ZERO: Price = Price { tenths: 0 };

    /// Create a price from tenths
    pub const fn from_tenths(tenths: i32) -> Self {
        Self { tenths }
    }

    /// Get the value in tenths
    pub fn to_tenths(self) -> i32 {
        self.tenths
    }

    /// Get the value in whole units (e.g. 8.5)
    pub fn to_units(self) -> f64 {
        self.tenths as f64 / 10.0
    }

    pub fn is_negative(self) -> bool {
        self.tenths < 0
    }

    /// Safe subtraction that returns zero if result would be negative
    pub fn safe_sub(self, other: Self) -> Self {
        Self { tenths: (self.tenths - other.tenths).max(0) }
    }

    /// Price a player fetches when sold.
    ///
    /// A rise since purchase is shared: the seller keeps half of it, rounded
    /// down to the nearest tenth. A fall is passed on in full.
    pub fn selling_price(purchase: Price, current: Price) -> Price {
        if current.tenths <= purchase.tenths {
            current
        } else {
            Price::from_tenths(purchase.tenths + (current.tenths - purchase.tenths) / 2)
        }
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self { tenths: self.tenths + other.tenths }
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self { tenths: self.tenths - other.tenths }
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, other: Self) {
        self.tenths += other.tenths;
    }
}

impl SubAssign for Price {
    fn sub_assign(&mut self, other: Self) {
        self.tenths -= other.tenths;
    }
}

impl Neg for Price {
    type Output = Self;

    fn neg(self) -> Self {
        Self { tenths: -self.tenths }
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Self {
        iter.fold(Price::ZERO, |acc, p| acc + p)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "£{:.1}m", self.to_units())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_arithmetic() {
        let a = Price::from_tenths(85);
        let b = Price::from_tenths(45);

        assert_eq!(a + b, Price::from_tenths(130));
        assert_eq!(a - b, Price::from_tenths(40));
        assert_eq!(b.safe_sub(a), Price::ZERO);
        assert_eq!(vec![a, b].into_iter().sum::<Price>(), Price::from_tenths(130));
    }

    #[test]
    fn test_selling_price_keeps_half_of_rise() {
        let bought = Price::from_tenths(50);
        assert_eq!(Price::selling_price(bought, Price::from_tenths(53)), Price::from_tenths(51));
        assert_eq!(Price::selling_price(bought, Price::from_tenths(54)), Price::from_tenths(52));
        assert_eq!(Price::selling_price(bought, Price::from_tenths(48)), Price::from_tenths(48));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_tenths(85).to_string(), "£8.5m");
        assert_eq!(Price::from_tenths(1000).to_string(), "£100.0m");
    }
}
