//! Slot generations
//!
//! Each arena slot carries a counter bumped when the slot is freed. A
//! `NodeId` minted under an older count no longer resolves, so a handle kept
//! across a destroy never aliases the slot's next occupant.

/// Reuse count of an arena slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Generation(u32);

impl Generation {
    /// Fresh slot
    pub const INITIAL: Self = Generation(0);

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Count after the slot is freed once more. Wraps after `u32::MAX`
    /// reuses, which a single session never reaches.
    pub(crate) const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_differs() {
        let g = Generation::INITIAL;
        assert_eq!(g.next().value(), 1);
        assert_ne!(g.next(), g);
        assert_eq!(Generation::default(), Generation::INITIAL);
    }

    #[test]
    fn test_wraps() {
        assert_eq!(Generation(u32::MAX).next(), Generation::INITIAL);
    }
}
