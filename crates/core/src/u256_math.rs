//! U256 fixed-point arithmetic for price computation.
//!
//! Every price in the oracle is an 18-decimal fixed-point value (WAD).
//! Products that can exceed 256 bits (reserve ratios, squared sqrt prices)
//! are computed in 512 bits and narrowed at the end; a result that does not
//! fit back into U256 is reported as `None` rather than wrapped.

use alloy::primitives::{U256, U512};

/// WAD constant: 1e18 for 18-decimal fixed-point arithmetic
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Delta limit denominator (100000 = 100%)
pub const DELTA_DENOMINATOR: u32 = 100_000;

/// Decimals of every price the oracle returns
pub const PRICE_DECIMALS: u8 = 18;

/// Power of 10 in 512 bits.
#[inline(always)]
pub(crate) fn pow10_wide(exp: u8) -> U512 {
    U512::from(10u64).saturating_pow(U512::from(exp))
}

/// Zero-extend to 512 bits.
#[inline(always)]
pub(crate) fn widen(value: U256) -> U512 {
    let l = value.as_limbs();
    U512::from_limbs([l[0], l[1], l[2], l[3], 0, 0, 0, 0])
}

/// Narrow back to 256 bits, `None` on overflow.
#[inline(always)]
pub(crate) fn narrow(value: U512) -> Option<U256> {
    let l = value.as_limbs();
    if l[4..].iter().any(|&limb| limb != 0) {
        return None;
    }
    Some(U256::from_limbs([l[0], l[1], l[2], l[3]]))
}

/// `numerator / denominator` over 512-bit operands, narrowed to U256.
#[inline(always)]
pub(crate) fn div_wide(numerator: U512, denominator: U512) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    narrow(numerator / denominator)
}

/// `a * b / denominator` without intermediate overflow.
#[inline(always)]
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Option<U256> {
    div_wide(widen(a) * widen(b), widen(denominator))
}

/// Multiply two WAD values: (a * b) / WAD
#[inline(always)]
pub fn wad_mul(a: U256, b: U256) -> Option<U256> {
    mul_div(a, b, WAD)
}

/// Divide two WAD values: (a * WAD) / b
#[inline(always)]
pub fn wad_div(a: U256, b: U256) -> Option<U256> {
    mul_div(a, WAD, b)
}

/// Reciprocal of a WAD value: 1e36 / a
#[inline(always)]
pub fn wad_inverse(a: U256) -> Option<U256> {
    wad_div(WAD, a)
}

/// Price of one unit of the denominator asset in units of the numerator asset.
///
/// Both amounts are raw token amounts in their own decimals:
/// `(num / 10^num_decimals) / (den / 10^den_decimals)` as WAD.
pub fn ratio_wad(num: U256, num_decimals: u8, den: U256, den_decimals: u8) -> Option<U256> {
    let numerator = widen(num)
        .checked_mul(pow10_wide(den_decimals))?
        .checked_mul(widen(WAD))?;
    let denominator = widen(den).checked_mul(pow10_wide(num_decimals))?;
    div_wide(numerator, denominator)
}

#[inline(always)]
fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// Relative deviation of `price` from `reference`, scaled by [`DELTA_DENOMINATOR`]
/// and rounded down. For reporting; use [`exceeds_delta`] to compare.
///
/// Returns `None` when the reference is zero.
#[inline(always)]
pub fn deviation(price: U256, reference: U256) -> Option<U256> {
    if reference.is_zero() {
        return None;
    }
    mul_div(abs_diff(price, reference), U256::from(DELTA_DENOMINATOR), reference)
}

/// `|price - reference| / reference > limit / DELTA_DENOMINATOR`, exactly.
///
/// A zero reference always exceeds.
pub fn exceeds_delta(price: U256, reference: U256, limit: u32) -> bool {
    if reference.is_zero() {
        return true;
    }
    let lhs = widen(abs_diff(price, reference)) * U512::from(DELTA_DENOMINATOR);
    let rhs = widen(reference) * U512::from(limit);
    lhs > rhs
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[U256]) -> Option<U256> {
    if values.is_empty() {
        return None;
    }
    let mut sum = U512::ZERO;
    for value in values {
        sum += widen(*value);
    }
    div_wide(sum, U512::from(values.len()))
}

/// Parse a decimal string ("1", "0.95", "2500.125") into WAD.
///
/// At most 18 fractional digits are accepted.
pub fn parse_wad(s: &str) -> Option<U256> {
    let s = s.trim().replace('_', "");
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, f),
        None => (s.as_str(), ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > PRICE_DECIMALS as usize {
        return None;
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let int_value = if int_part.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(int_part, 10).ok()?
    };
    let frac_value = if frac_part.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<18}", frac_part);
        U256::from_str_radix(&padded, 10).ok()?
    };

    int_value.checked_mul(WAD)?.checked_add(frac_value)
}

/// Convert WAD (18 decimals) to f64.
/// Use only for display/logging, not for computation.
pub fn wad_to_f64(wad: U256) -> f64 {
    let whole = wad / WAD;
    let frac = wad % WAD;
    let whole_f64 = whole
        .as_limbs()
        .iter()
        .rev()
        .fold(0.0, |acc, &limb| acc * 18_446_744_073_709_551_616.0 + limb as f64);
    whole_f64 + frac.to::<u64>() as f64 / 1e18
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wad(n: u64) -> U256 {
        U256::from(n) * WAD
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // (2^200 * 2^100) / 2^150 overflows U256 in the product only
        let a = U256::from(1u8) << 200;
        let b = U256::from(1u8) << 100;
        let d = U256::from(1u8) << 150;
        assert_eq!(mul_div(a, b, d), Some(U256::from(1u8) << 150));

        assert_eq!(mul_div(a, b, U256::ZERO), None);
        // Result itself too large
        assert_eq!(mul_div(U256::MAX, U256::from(2u8), U256::from(1u8)), None);
    }

    #[test]
    fn test_wad_ops() {
        assert_eq!(wad_mul(wad(3), wad(2000)), Some(wad(6000)));
        assert_eq!(wad_div(wad(6000), wad(3)), Some(wad(2000)));
        assert_eq!(wad_inverse(wad(2)), Some(WAD / U256::from(2u8)));
        assert_eq!(wad_inverse(U256::ZERO), None);
    }

    #[test]
    fn test_ratio_wad_decimals() {
        // 2_000_000 USDC (6 dec) against 1_000 WETH (18 dec): 2000 USDC per WETH
        let usdc = U256::from(2_000_000_000_000u64);
        let weth = wad(1_000);
        assert_eq!(ratio_wad(usdc, 6, weth, 18), Some(wad(2000)));

        // Inverse direction: 0.0005 WETH per USDC
        assert_eq!(
            ratio_wad(weth, 18, usdc, 6),
            Some(U256::from(500_000_000_000_000u64))
        );

        assert_eq!(ratio_wad(usdc, 6, U256::ZERO, 18), None);
    }

    #[test]
    fn test_deviation() {
        let reference = wad(100);
        // 12% above
        assert_eq!(deviation(wad(112), reference), Some(U256::from(12_000u32)));
        // 8% below
        assert_eq!(deviation(wad(92), reference), Some(U256::from(8_000u32)));
        assert_eq!(deviation(reference, reference), Some(U256::ZERO));
        assert_eq!(deviation(wad(1), U256::ZERO), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[wad(1)]), Some(wad(1)));
        assert_eq!(
            mean(&[parse_wad("0.999").unwrap(), parse_wad("1.001").unwrap()]),
            Some(WAD)
        );
        // No overflow summing large values
        assert_eq!(mean(&[U256::MAX, U256::MAX]), Some(U256::MAX));
    }

    #[test]
    fn test_parse_wad() {
        assert_eq!(parse_wad("1"), Some(WAD));
        assert_eq!(parse_wad("0.95"), Some(U256::from(950_000_000_000_000_000u64)));
        assert_eq!(parse_wad("2_500.5"), Some(wad(2500) + WAD / U256::from(2u8)));
        assert_eq!(parse_wad(".5"), Some(WAD / U256::from(2u8)));
        assert_eq!(parse_wad("0.000000000000000001"), Some(U256::from(1u8)));

        assert_eq!(parse_wad(""), None);
        assert_eq!(parse_wad("."), None);
        assert_eq!(parse_wad("-1"), None);
        assert_eq!(parse_wad("1e18"), None);
        assert_eq!(parse_wad("0.0000000000000000001"), None);
    }

    #[test]
    fn test_exceeds_delta_is_exact() {
        let reference = wad(1);
        // 10.0009% against a 10% limit
        let just_past = parse_wad("1.100009").unwrap();
        assert_eq!(deviation(just_past, reference), Some(U256::from(10_000u32)));
        assert!(exceeds_delta(just_past, reference, 10_000));
        assert!(exceeds_delta(U256::from(1u8) + parse_wad("1.1").unwrap(), reference, 10_000));

        assert!(!exceeds_delta(parse_wad("1.1").unwrap(), reference, 10_000));
        assert!(!exceeds_delta(parse_wad("0.9").unwrap(), reference, 10_000));
        assert!(exceeds_delta(parse_wad("0.899999").unwrap(), reference, 10_000));
        assert!(exceeds_delta(wad(1), U256::ZERO, 100_000));
        assert!(!exceeds_delta(U256::MAX, U256::MAX, 0));
    }

    #[test]
    fn test_wad_to_f64() {
        assert!((wad_to_f64(wad(1000)) - 1000.0).abs() < 1e-9);
        assert!((wad_to_f64(parse_wad("0.5").unwrap()) - 0.5).abs() < 1e-12);

        // Above 2^128 every limb counts
        let big = U256::from(1u8) << 200;
        let expected = 2f64.powi(200) / 1e18;
        assert!((wad_to_f64(big) / expected - 1.0).abs() < 1e-9);
    }
}
