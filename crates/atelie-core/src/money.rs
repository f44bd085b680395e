//! # Money Module
//!
//! The `Money` type and the currency half of the Money/Format utility.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Form fields arrive as "R$ 1.234,56" or as JS numbers (12.5).          │
//! │  Summing them as floats drifts:  0.1 + 0.2 = 0.30000000000000004       │
//! │                                                                         │
//! │  OUR SOLUTION: Integer centavos                                         │
//! │    "R$ 1.234,56" ──► to_money() ──► Money(123456)                       │
//! │    Money(123456) ──► to_currency_display() ──► "R$ 1.234,56"            │
//! │                                                                         │
//! │  Every amount is normalized at the boundary, then all arithmetic is    │
//! │  exact integer math.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use atelie_core::money::{to_currency_display, to_money, Money, RawAmount};
//!
//! let price = to_money(Some(&RawAmount::from("R$ 1.234,56")));
//! assert_eq!(price.cents(), 123456);
//! assert_eq!(to_currency_display(Some(price)), "R$ 1.234,56");
//!
//! // Unparseable input is a silent zero, never an error
//! assert_eq!(to_money(Some(&RawAmount::from("abc"))), Money::zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Display string used when no amount is available.
pub const ZERO_DISPLAY: &str = "R$ 0,00";

/// Largest amount a form field may carry: R$ 100.000.000.000,00.
///
/// Anything above it normalizes to zero like any other unusable input.
pub const MAX_AMOUNT: Money = Money(10_000_000_000_000);

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in centavos (the smallest BRL unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate arithmetic may go negative (e.g. a
///   charged total minus cost); persisted amounts are kept non-negative
///   by the engines that produce them
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Serialized as a plain integer**: persisted and sent as numbers,
///   never as formatted strings
/// - **Saturating operators**: `+`, `-`, `*` and `sum` clamp at the i64
///   bounds instead of panicking
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from centavos.
    ///
    /// ```rust
    /// use atelie_core::money::Money;
    ///
    /// let price = Money::from_cents(1099); // R$ 10,99
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from reais and centavos.
    ///
    /// For negative amounts only the major unit should be negative:
    /// `from_major_minor(-5, 50)` is -R$ 5,50.
    #[inline]
    pub const fn from_major_minor(major: i64, minor: i64) -> Self {
        if major < 0 {
            Money(major * 100 - minor)
        } else {
            Money(major * 100 + minor)
        }
    }

    /// Returns the value in centavos.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-reais portion.
    #[inline]
    pub const fn reais(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the centavos portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the larger of `self` and zero.
    ///
    /// ```rust
    /// use atelie_core::money::Money;
    ///
    /// assert_eq!(Money::from_cents(-30).floor_zero(), Money::zero());
    /// assert_eq!(Money::from_cents(30).floor_zero().cents(), 30);
    /// ```
    #[inline]
    pub const fn floor_zero(self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            self
        }
    }

    /// Multiplies money by a quantity, saturating at the i64 bounds.
    ///
    /// ```rust
    /// use atelie_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2000);
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 6000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0.saturating_mul(qty))
    }

    /// Returns `bps` basis points of this amount, rounded half up.
    ///
    /// 1 basis point = 0.01%, so 2500 bps = 25%. Uses i128 so large
    /// amounts cannot overflow mid-calculation.
    ///
    /// ```rust
    /// use atelie_core::money::Money;
    ///
    /// let base = Money::from_cents(1000);
    /// assert_eq!(base.percentage_bps(825).cents(), 83); // 8.25% of R$ 10,00
    /// ```
    pub fn percentage_bps(&self, bps: u32) -> Money {
        let part = (self.0 as i128 * bps as i128 + 5000) / 10000;
        Money::from_cents(part.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
    }
}

/// Shows money the way the front-end does: `R$ 1.234,56`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}R$ {},{:02}",
            sign,
            group_thousands(self.reais().unsigned_abs()),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Raw Input
// =============================================================================

/// A raw amount exactly as a form field delivers it.
///
/// Front-end inputs are either JS numbers (`12.5`) or localized text
/// (`"R$ 1.234,56"`). Both deserialize into this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum RawAmount {
    Number(f64),
    Text(String),
}

impl From<&str> for RawAmount {
    fn from(s: &str) -> Self {
        RawAmount::Text(s.to_string())
    }
}

impl From<f64> for RawAmount {
    fn from(n: f64) -> Self {
        RawAmount::Number(n)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Normalizes a raw amount to `Money`.
///
/// ## Rules
/// ```text
/// None / ""                     → 0
/// 12.5 (number)                 → 1250
/// -3.0, NaN, ∞ (number)         → 0     (not a valid amount)
/// "R$ 1.234,56"                 → 123456
/// "1234,5"                      → 123450
/// "1.234"                       → 123400 (dot followed by 3 digits = grouping)
/// "12.50"                       → 1250   (dot followed by 1-2 digits = decimal)
/// "-R$ 5,00"                    → 500    (sign is formatting, stripped)
/// "abc"                         → 0
/// above MAX_AMOUNT              → 0
/// ```
///
/// Never fails: an unusable value is a silent zero, which callers must
/// read as "unset" rather than "confirmed zero".
pub fn to_money(raw: Option<&RawAmount>) -> Money {
    let money = match raw {
        None => Money::zero(),
        Some(RawAmount::Number(n)) => from_number(*n),
        Some(RawAmount::Text(s)) => parse_localized(s),
    };
    if money > MAX_AMOUNT {
        return Money::zero();
    }
    money
}

fn from_number(n: f64) -> Money {
    if !n.is_finite() || n < 0.0 {
        return Money::zero();
    }
    let cents = (n * 100.0).round();
    if cents > i64::MAX as f64 {
        return Money::zero();
    }
    Money::from_cents(cents as i64)
}

fn parse_localized(raw: &str) -> Money {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();

    let (int_part, frac_part) = split_decimal(&kept);
    let int_digits: String = int_part.chars().filter(|c| c.is_ascii_digit()).collect();
    let frac_digits: String = frac_part.chars().filter(|c| c.is_ascii_digit()).collect();

    if int_digits.is_empty() && frac_digits.is_empty() {
        return Money::zero();
    }

    let reais: i64 = if int_digits.is_empty() {
        0
    } else {
        match int_digits.parse::<i64>() {
            Ok(v) => v,
            Err(_) => return Money::zero(),
        }
    };

    let mut frac = frac_digits.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().map(|d| d >= 5).unwrap_or(false);

    let cents = reais
        .checked_mul(100)
        .and_then(|c| c.checked_add(tenths * 10 + hundredths + i64::from(round_up)));

    match cents {
        Some(c) => Money::from_cents(c),
        None => Money::zero(),
    }
}

/// Splits a digits-and-separators string into integer and fraction parts.
///
/// A comma is always the decimal separator. Without a comma, a single
/// dot followed by one or two digits is read as decimal; any other dot
/// is grouping.
fn split_decimal(s: &str) -> (&str, &str) {
    if let Some(idx) = s.rfind(',') {
        return (&s[..idx], &s[idx + 1..]);
    }
    if s.matches('.').count() == 1 {
        if let Some(idx) = s.rfind('.') {
            let tail = &s[idx + 1..];
            if (1..=2).contains(&tail.len()) {
                return (&s[..idx], tail);
            }
        }
    }
    (s, "")
}

// =============================================================================
// Formatting
// =============================================================================

/// Formats an amount as localized currency text.
///
/// ```rust
/// use atelie_core::money::{to_currency_display, Money, ZERO_DISPLAY};
///
/// assert_eq!(to_currency_display(Some(Money::from_cents(6000))), "R$ 60,00");
/// assert_eq!(to_currency_display(None), ZERO_DISPLAY);
/// ```
pub fn to_currency_display(amount: Option<Money>) -> String {
    match amount {
        Some(m) => m.to_string(),
        None => ZERO_DISPLAY.to_string(),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> i64 {
        to_money(Some(&RawAmount::from(s))).cents()
    }

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.reais(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "R$ 10,99");
        assert_eq!(Money::from_cents(123456).to_string(), "R$ 1.234,56");
        assert_eq!(Money::from_cents(100000000).to_string(), "R$ 1.000.000,00");
        assert_eq!(Money::from_cents(-550).to_string(), "-R$ 5,50");
        assert_eq!(Money::zero().to_string(), ZERO_DISPLAY);
    }

    #[test]
    fn test_parse_localized_strings() {
        assert_eq!(parse("R$ 1.234,56"), 123456);
        assert_eq!(parse("1234,5"), 123450);
        assert_eq!(parse("1.234"), 123400);
        assert_eq!(parse("1.234.567"), 123456700);
        assert_eq!(parse("12.50"), 1250);
        assert_eq!(parse("R$0,99"), 99);
        assert_eq!(parse(",5"), 50);
        assert_eq!(parse("10,005"), 1001);
    }

    #[test]
    fn test_parse_garbage_is_zero() {
        assert_eq!(parse(""), 0);
        assert_eq!(parse("abc"), 0);
        assert_eq!(parse("R$"), 0);
        assert_eq!(parse("99999999999999999999999"), 0);
        assert_eq!(to_money(None), Money::zero());
    }

    #[test]
    fn test_parse_strips_sign() {
        assert_eq!(parse("-R$ 5,00"), 500);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(to_money(Some(&RawAmount::from(12.5))).cents(), 1250);
        assert_eq!(to_money(Some(&RawAmount::from(0.1 + 0.2))).cents(), 30);
        assert_eq!(to_money(Some(&RawAmount::from(-3.0))), Money::zero());
        assert_eq!(to_money(Some(&RawAmount::from(f64::NAN))), Money::zero());
        assert_eq!(to_money(Some(&RawAmount::from(f64::INFINITY))), Money::zero());
    }

    #[test]
    fn test_display_round_trip() {
        for cents in [0, 1, 99, 100, 2000, 123456, 99999999, 100000000000] {
            let m = Money::from_cents(cents);
            let shown = to_currency_display(Some(m));
            assert_eq!(parse(&shown), cents, "round trip failed for {}", shown);
        }
    }

    #[test]
    fn test_raw_amount_deserializes_both_shapes() {
        let n: RawAmount = serde_json::from_str("12.5").unwrap();
        assert_eq!(n, RawAmount::Number(12.5));
        let t: RawAmount = serde_json::from_str("\"R$ 3,00\"").unwrap();
        assert_eq!(to_money(Some(&t)).cents(), 300);
    }

    #[test]
    fn test_floor_zero_and_percentage() {
        assert_eq!(Money::from_cents(-1).floor_zero(), Money::zero());
        assert_eq!(Money::from_cents(10000).percentage_bps(2500).cents(), 2500);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_cents).sum();
        assert_eq!(total.cents(), 1000);
    }

    #[test]
    fn test_amounts_above_max_are_zero() {
        assert_eq!(to_money(Some(&RawAmount::from("R$ 100.000.000.000,00"))), MAX_AMOUNT);
        assert_eq!(parse("R$ 100.000.000.000,01"), 0);
        assert_eq!(parse("R$ 90.000.000.000.000.000,00"), 0);
        assert_eq!(to_money(Some(&RawAmount::from(1e15))), Money::zero());
    }

    #[test]
    fn test_arithmetic_saturates() {
        let big = Money::from_cents(i64::MAX - 10);
        assert_eq!((big + Money::from_cents(100)).cents(), i64::MAX);
        assert_eq!((Money::from_cents(i64::MIN + 1) - Money::from_cents(5)).cents(), i64::MIN);
        assert_eq!(MAX_AMOUNT.multiply_quantity(10_000_000_000).cents(), i64::MAX);
        assert_eq!((MAX_AMOUNT * -10_000_000_000).cents(), i64::MIN);

        let mut acc = big;
        acc += big;
        assert_eq!(acc.cents(), i64::MAX);

        let total: Money = std::iter::repeat(big).take(3).sum();
        assert_eq!(total.cents(), i64::MAX);
    }
}
