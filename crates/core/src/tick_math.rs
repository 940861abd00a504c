//! Uniswap V3 tick arithmetic.
//!
//! Converts a TWAP mean tick into a WAD price. The sqrt ratio computation
//! reproduces the pool contract's fixed-point table exactly, so a price
//! derived here matches what an on-chain consumer would compute.

use alloy::primitives::{uint, U256, U512};

use crate::u256_math::{div_wide, pow10_wide, widen, WAD};

/// Smallest tick a pool can reach.
pub const MIN_TICK: i32 = -887_272;
/// Largest tick a pool can reach.
pub const MAX_TICK: i32 = 887_272;

/// `1 / sqrt(1.0001)^(2^i)` in Q128.128 for bits 1..=19.
const RATIO_STEPS: [(u32, U256); 19] = [
    (0x2, uint!(0xfff97272373d413259a46990580e213a_U256)),
    (0x4, uint!(0xfff2e50f5f656932ef12357cf3c7fdcc_U256)),
    (0x8, uint!(0xffe5caca7e10e4e61c3624eaa0941cd0_U256)),
    (0x10, uint!(0xffcb9843d60f6159c9db58835c926644_U256)),
    (0x20, uint!(0xff973b41fa98c081472e6896dfb254c0_U256)),
    (0x40, uint!(0xff2ea16466c96a3843ec78b326b52861_U256)),
    (0x80, uint!(0xfe5dee046a99a2a811c461f1969c3053_U256)),
    (0x100, uint!(0xfcbe86c7900a88aedcffc83b479aa3a4_U256)),
    (0x200, uint!(0xf987a7253ac413176f2b074cf7815e54_U256)),
    (0x400, uint!(0xf3392b0822b70005940c7a398e4b70f3_U256)),
    (0x800, uint!(0xe7159475a2c29b7443b29c7fa6e889d9_U256)),
    (0x1000, uint!(0xd097f3bdfd2022b8845ad8f792aa5825_U256)),
    (0x2000, uint!(0xa9f746462d870fdf8a65dc1f90e061e5_U256)),
    (0x4000, uint!(0x70d869a156d2a1b890bb3df62baf32f7_U256)),
    (0x8000, uint!(0x31be135f97d08fd981231505542fcfa6_U256)),
    (0x10000, uint!(0x9aa508b5b7a84e1c677de54f3e99bc9_U256)),
    (0x20000, uint!(0x5d6af8dedb81196699c329225ee604_U256)),
    (0x40000, uint!(0x2216e584f5fa1ea926041bedfe98_U256)),
    (0x80000, uint!(0x48a170391f7dc42444e8fa2_U256)),
];

/// `sqrt(1.0001^tick) * 2^96` as Q64.96, `None` outside the tick range.
pub fn sqrt_ratio_at_tick(tick: i32) -> Option<U256> {
    let abs_tick = tick.unsigned_abs();
    if abs_tick > MAX_TICK.unsigned_abs() {
        return None;
    }

    let mut ratio = if abs_tick & 0x1 != 0 {
        uint!(0xfffcb933bd6fad37aa2d162d1a594001_U256)
    } else {
        U256::from(1u8) << 128usize
    };
    for (bit, factor) in RATIO_STEPS {
        if abs_tick & bit != 0 {
            ratio = (ratio * factor) >> 128usize;
        }
    }

    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up
    let round_up = !(ratio & U256::from(u32::MAX)).is_zero();
    Some((ratio >> 32usize) + U256::from(round_up as u8))
}

/// Arithmetic mean tick over the window, rounded towards negative infinity.
pub fn mean_tick(cumulative_start: i64, cumulative_end: i64, window: u32) -> Option<i32> {
    if window == 0 {
        return None;
    }
    let delta = cumulative_end.checked_sub(cumulative_start)?;
    let window = i64::from(window);

    let mut tick = delta / window;
    if delta < 0 && delta % window != 0 {
        tick -= 1;
    }
    i32::try_from(tick).ok()
}

/// WAD price at `tick` for a pool with the given token decimals.
///
/// Returns the price of token0 in token1 units, or the reciprocal when
/// `token1_in_token0` is set. Computed from the squared sqrt ratio in
/// 512 bits, so neither direction loses precision to an intermediate
/// inversion.
pub fn price_at_tick(
    tick: i32,
    decimals0: u8,
    decimals1: u8,
    token1_in_token0: bool,
) -> Option<U256> {
    let sqrt_price = widen(sqrt_ratio_at_tick(tick)?);
    let ratio_x192 = sqrt_price.checked_mul(sqrt_price)?;
    let q192 = U512::from(1u8) << 192usize;

    let (numerator, denominator) = if token1_in_token0 {
        (
            q192.checked_mul(pow10_wide(decimals1))?,
            ratio_x192.checked_mul(pow10_wide(decimals0))?,
        )
    } else {
        (
            ratio_x192.checked_mul(pow10_wide(decimals0))?,
            q192.checked_mul(pow10_wide(decimals1))?,
        )
    };

    div_wide(numerator.checked_mul(widen(WAD))?, denominator)
}
