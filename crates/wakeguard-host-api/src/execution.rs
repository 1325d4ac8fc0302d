//! Declared execution state flags

use bitflags::bitflags;

bitflags! {
    /// What the process declares to the OS power manager.
    ///
    /// `CONTINUOUS` means the declaration persists until replaced; without
    /// it the other flags only reset the idle timer once.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecutionState: u32 {
        const SYSTEM_REQUIRED = 0x0000_0001;
        const DISPLAY_REQUIRED = 0x0000_0002;
        const CONTINUOUS = 0x8000_0000;
    }
}

impl ExecutionState {
    /// Nothing held: the OS follows its own idle policy
    pub const BASELINE: Self = Self::CONTINUOUS;

    /// Keep both the display and the system awake until reset
    pub const SUPPRESSING: Self = Self::CONTINUOUS
        .union(Self::DISPLAY_REQUIRED)
        .union(Self::SYSTEM_REQUIRED);

    pub fn holds_display(&self) -> bool {
        self.contains(Self::DISPLAY_REQUIRED)
    }

    pub fn holds_system(&self) -> bool {
        self.contains(Self::SYSTEM_REQUIRED)
    }

    pub fn is_baseline(&self) -> bool {
        !self.holds_display() && !self.holds_system()
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self::BASELINE
    }
}
