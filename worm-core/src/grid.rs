use worm_types::{SensedState, DIRECTION_COUNT};

const SENSED_MASK: u8 = (1 << DIRECTION_COUNT) - 1;

/// Rotates a six-bit sensed state so that bit `k` of the result is bit `(k + shift) % 6`
/// of the input.
pub(crate) fn rotate_right(state: SensedState, shift: usize) -> SensedState {
    let shift = (shift % DIRECTION_COUNT) as u32;
    let bits = state.bits() & SENSED_MASK;
    if shift == 0 {
        return SensedState(bits);
    }
    SensedState(((bits >> shift) | (bits << (DIRECTION_COUNT as u32 - shift))) & SENSED_MASK)
}

