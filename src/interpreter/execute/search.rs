//! Pattern matcher and population counter.
//!
//! Both units are combinational in hardware and complete in the dispatch
//! cycle.

/// Sentinel returned by `ca_find` when no window matches.
pub const NOT_FOUND: u32 = 0xFFFF_FFFF;

/// Last window start position (windows are `CAR[start+31:start]`).
pub const LAST_WINDOW_START: u32 = 32;

/// Lowest start index of a 32-bit window of `car` equal to `pattern`.
pub fn find_pattern(car: u64, pattern: u32) -> Option<u32> {
    (0..=LAST_WINDOW_START).find(|&start| (car >> start) as u32 == pattern)
}

/// `ca_find` result encoding: the match index, or [`NOT_FOUND`].
#[inline]
pub fn find_result(car: u64, pattern: u32) -> u32 {
    find_pattern(car, pattern).unwrap_or(NOT_FOUND)
}

/// Number of set bits in `car`.
#[inline]
pub fn population(car: u64) -> u32 {
    car.count_ones()
}
