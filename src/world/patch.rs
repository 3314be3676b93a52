//! A single grain-bearing cell.

/// A grid cell holding a bounded amount of grain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Patch {
    /// Grain currently on the patch.
    grain: u32,
    /// Capacity, fixed when the board is generated.
    max_grain: u32,
}

impl Patch {
    /// Create a patch filled to its capacity.
    #[must_use]
    pub const fn new(max_grain: u32) -> Self {
        Self {
            grain: max_grain,
            max_grain,
        }
    }

    /// Create a patch with an explicit starting amount, clamped to capacity.
    #[must_use]
    pub fn with_grain(grain: u32, max_grain: u32) -> Self {
        Self {
            grain: grain.min(max_grain),
            max_grain,
        }
    }

    /// Grain currently on the patch.
    #[must_use]
    pub const fn grain(&self) -> u32 {
        self.grain
    }

    /// Capacity of the patch.
    #[must_use]
    pub const fn max_grain(&self) -> u32 {
        self.max_grain
    }

    /// Grow the patch by `amount`, never past its capacity.
    pub fn add_grain(&mut self, amount: u32) {
        self.grain = self.grain.saturating_add(amount).min(self.max_grain);
    }

    /// Take everything on the patch, leaving it empty.
    pub fn remove_all(&mut self) -> u32 {
        std::mem::take(&mut self.grain)
    }
}
