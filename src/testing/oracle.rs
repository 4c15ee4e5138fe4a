//! Software reference models.
//!
//! These are written independently of the hardware engines (plain bit
//! loops, no shared helpers) so that comparing the two is meaningful.

/// Evolve `state` under elementary `rule` for `steps` generations.
pub fn ca_step_sw(state: u64, rule: u8, steps: u32) -> u64 {
    let mut current = state;
    for _ in 0..steps {
        let mut next = 0u64;
        for i in 0..64u32 {
            let l = if i == 0 { 63 } else { i - 1 };
            let r = if i == 63 { 0 } else { i + 1 };
            let left = (current >> l) & 1;
            let center = (current >> i) & 1;
            let right = (current >> r) & 1;
            let idx = (left << 2) | (center << 1) | right;
            next |= ((rule as u64 >> idx) & 1) << i;
        }
        current = next;
    }
    current
}

/// Evolve an 8×8 toroidal Life grid for `steps` generations.
pub fn life_step_sw(state: u64, steps: u32) -> u64 {
    let mut current = state;
    for _ in 0..steps {
        let mut next = 0u64;
        for i in 0..64i32 {
            let x = i % 8;
            let y = i / 8;

            let mut neighbors = 0;
            for dy in -1..=1i32 {
                for dx in -1..=1i32 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (x + dx).rem_euclid(8);
                    let ny = (y + dy).rem_euclid(8);
                    neighbors += (current >> (ny * 8 + nx)) & 1;
                }
            }

            let alive = (current >> i) & 1 == 1;
            if neighbors == 3 || (alive && neighbors == 2) {
                next |= 1 << i;
            }
        }
        current = next;
    }
    current
}
