use crate::error::LdfError;
use crate::ldf::packed::LdfState;

/// How a distribution's anchor may move between observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ShiftMode {
    Both = 0,
    Left = 1,
    Right = 2,
    Static = 3,
}

impl TryFrom<u8> for ShiftMode {
    type Error = LdfError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(ShiftMode::Both),
            1 => Ok(ShiftMode::Left),
            2 => Ok(ShiftMode::Right),
            3 => Ok(ShiftMode::Static),
            other => Err(LdfError::InvalidShiftMode(other)),
        }
    }
}

/// Left only lets the anchor decrease, Right only lets it increase.
#[inline]
pub fn enforce_shift_mode(tick: i32, last_tick: i32, mode: ShiftMode) -> i32 {
    match mode {
        ShiftMode::Left => tick.min(last_tick),
        ShiftMode::Right => tick.max(last_tick),
        ShiftMode::Both | ShiftMode::Static => tick,
    }
}

/// Applies the shift policy against persisted state.
///
/// Returns the resolved anchor and whether it moved since the last call.
/// Static windows never move and never surge.
pub fn resolve_anchor(candidate: i32, mode: ShiftMode, state: &LdfState) -> (i32, bool) {
    if !state.is_initialized() || mode == ShiftMode::Static {
        return (candidate, false);
    }
    let last = state.last_tick();
    let anchor = enforce_shift_mode(candidate, last, mode);
    log::trace!("shift mode {:?}: candidate {} last {} -> {}", mode, candidate, last, anchor);
    (anchor, anchor != last)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [ShiftMode; 4] = [ShiftMode::Both, ShiftMode::Left, ShiftMode::Right, ShiftMode::Static];

    #[test]
    fn test_shift_mode_tags() {
        for mode in MODES {
            assert_eq!(ShiftMode::try_from(mode as u8).unwrap(), mode);
        }
        assert_eq!(ShiftMode::try_from(4), Err(LdfError::InvalidShiftMode(4)));
    }

    #[test]
    fn test_enforce_is_idempotent_on_equal_ticks() {
        for mode in MODES {
            for tick in [-887_220, -60, 0, 120, 887_220] {
                assert_eq!(enforce_shift_mode(tick, tick, mode), tick);
            }
        }
    }

    #[test]
    fn test_enforce_directional_modes() {
        for (candidate, last) in [(-120, 60), (60, -120), (0, 0), (600, 540)] {
            assert!(enforce_shift_mode(candidate, last, ShiftMode::Left) <= last);
            assert!(enforce_shift_mode(candidate, last, ShiftMode::Right) >= last);
            assert_eq!(enforce_shift_mode(candidate, last, ShiftMode::Both), candidate);
        }
        assert_eq!(enforce_shift_mode(-120, 60, ShiftMode::Left), -120);
        assert_eq!(enforce_shift_mode(120, 60, ShiftMode::Left), 60);
        assert_eq!(enforce_shift_mode(120, 60, ShiftMode::Right), 120);
        assert_eq!(enforce_shift_mode(-120, 60, ShiftMode::Right), 60);
    }

    #[test]
    fn test_resolve_anchor_uninitialized_state() {
        let (anchor, surge) = resolve_anchor(300, ShiftMode::Left, &LdfState::default());
        assert_eq!(anchor, 300);
        assert!(!surge);
    }

    #[test]
    fn test_resolve_anchor_with_state() {
        let state = LdfState::with_anchor(120);
        assert_eq!(resolve_anchor(300, ShiftMode::Left, &state), (120, false));
        assert_eq!(resolve_anchor(60, ShiftMode::Left, &state), (60, true));
        assert_eq!(resolve_anchor(300, ShiftMode::Right, &state), (300, true));
        assert_eq!(resolve_anchor(300, ShiftMode::Both, &state), (300, true));
        assert_eq!(resolve_anchor(120, ShiftMode::Both, &state), (120, false));
        assert_eq!(resolve_anchor(300, ShiftMode::Static, &state), (300, false));
    }
}
