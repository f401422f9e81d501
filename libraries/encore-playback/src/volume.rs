//! Volume level and mute state
//!
//! The level is the linear gain handed to the voice (0.0-1.0). Mute is a
//! separate flag on the voice, so un-muting restores the exact level.

/// Volume controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// # Arguments
    /// * `level` - Initial volume (0.0-1.0, default: 0.8)
    pub fn new(level: f32) -> Self {
        let mut volume = Self {
            level: 0.8,
            muted: false,
        };
        volume.set_level(level);
        volume
    }

    /// Set volume level, clamped to 0.0-1.0
    ///
    /// Non-finite input is ignored.
    pub fn set_level(&mut self, level: f32) -> f32 {
        if level.is_finite() {
            self.level = level.clamp(0.0, 1.0);
        }
        self.level
    }

    /// Get current volume level (0.0-1.0)
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state, returning the new state
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.8) // Default to 80%
    }
}
