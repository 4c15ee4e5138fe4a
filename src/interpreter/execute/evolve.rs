//! Evolution engines.
//!
//! Both engines are pure: they compute one generation from the current CAR
//! and never hold state between calls. The hardware evaluates every bit lane
//! in parallel; here each pass simply visits all 64 positions.
//!
//! # 1-D elementary automaton
//!
//! Bit `i` of the next state is bit `(left << 2) | (center << 1) | right` of
//! the 8-bit Wolfram rule, where `left = s[i-1]`, `right = s[i+1]` and the
//! indices wrap around the 64-bit ring.
//!
//! # 2-D Life
//!
//! CAR is an 8×8 torus with cell `(x, y)` at bit `y * 8 + x`:
//!
//! ```text
//!   bit  0  1  2  3  4  5  6  7    ← y = 0
//!        8  9 10 11 12 13 14 15    ← y = 1
//!        ...
//!       56 57 58 59 60 61 62 63    ← y = 7
//! ```
//!
//! A cell is alive in the next generation with exactly three live neighbours,
//! or with two live neighbours if it is already alive.

/// Width of the 1-D ring.
pub const CA_WIDTH: u32 = 64;

/// Side of the Life grid.
pub const GRID_SIDE: u32 = 8;

/// One generation of the elementary automaton under `rule`.
pub fn rule_step(state: u64, rule: u8) -> u64 {
    (0..CA_WIDTH).fold(0u64, |next, i| {
        let left = (state >> ((i + CA_WIDTH - 1) % CA_WIDTH)) & 1;
        let center = (state >> i) & 1;
        let right = (state >> ((i + 1) % CA_WIDTH)) & 1;
        let neighborhood = (left << 2) | (center << 1) | right;
        let bit = ((rule as u64) >> neighborhood) & 1;
        next | (bit << i)
    })
}

/// State of cell `(x, y)`, coordinates taken modulo the grid side.
#[inline]
fn cell(state: u64, x: u32, y: u32) -> u64 {
    let x = x % GRID_SIDE;
    let y = y % GRID_SIDE;
    (state >> (y * GRID_SIDE + x)) & 1
}

/// Number of live Moore neighbours of `(x, y)` on the torus.
pub fn neighbor_count(state: u64, x: u32, y: u32) -> u32 {
    let mut sum = 0;
    for dy in [GRID_SIDE - 1, 0, 1] {
        for dx in [GRID_SIDE - 1, 0, 1] {
            if dx == 0 && dy == 0 {
                continue;
            }
            sum += cell(state, x + dx, y + dy) as u32;
        }
    }
    sum
}

/// One generation of Conway's Life on the 8×8 torus.
pub fn life_step(state: u64) -> u64 {
    let mut next = 0u64;
    for y in 0..GRID_SIDE {
        for x in 0..GRID_SIDE {
            let alive = cell(state, x, y) == 1;
            let neighbors = neighbor_count(state, x, y);
            if neighbors == 3 || (alive && neighbors == 2) {
                next |= 1 << (y * GRID_SIDE + x);
            }
        }
    }
    next
}

/// Which engine an evolution drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolutionKind {
    /// Elementary automaton under the latched rule.
    Rule,
    /// Conway's Life.
    Life,
}

impl EvolutionKind {
    /// Apply one generation of this engine.
    #[inline]
    pub fn apply(self, state: u64, rule: u8) -> u64 {
        match self {
            EvolutionKind::Rule => rule_step(state, rule),
            EvolutionKind::Life => life_step(state),
        }
    }
}
