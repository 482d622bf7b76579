//! Bug Squash - a tap-the-bugs reaction game
//!
//! Core modules:
//! - `sim`: Deterministic game loop (spawner, bug lifecycle, scoring)
//! - `settings`: Data-driven timing and sizing, loaded from JSON
//! - `error`: Configuration errors
//!
//! Rendering, animation and input capture belong to the host. The host feeds
//! [`sim::InputEvent`]s in and drains [`sim::HostCommand`]s out.

pub mod error;
pub mod settings;
pub mod sim;

pub use error::ConfigError;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Delay between spawn ticks (ms)
    pub const SPAWN_INTERVAL_MS: u64 = 1200;

    /// Motion time per bug kind (ms)
    pub const NORMAL_DURATION_MS: u64 = 3500;
    pub const BONUS_DURATION_MS: u64 = 2500;
    pub const POISON_DURATION_MS: u64 = 3200;

    /// Score deltas
    pub const NORMAL_SCORE: i64 = 10;
    pub const BONUS_SCORE: i64 = 50;
    pub const POISON_PENALTY: i64 = -20;
    pub const MISS_PENALTY: i64 = -5;

    /// Kind roll is drawn from [0, KIND_ROLL_RANGE)
    pub const KIND_ROLL_RANGE: u32 = 100;
    /// roll < BONUS_ROLL_BELOW => Bonus (10%)
    pub const BONUS_ROLL_BELOW: u32 = 10;
    /// BONUS_ROLL_BELOW <= roll < POISON_ROLL_BELOW => Poison (15%)
    pub const POISON_ROLL_BELOW: u32 = 25;

    /// Side length of a bug's square hit box (px)
    pub const DEFAULT_BUG_SIZE: f32 = 64.0;
}

/// Number of integer slots a bug's top-left corner may occupy along one axis.
///
/// Never returns 0, so a random draw over `[0, slots)` is always valid even
/// when the field is smaller than a bug.
#[inline]
pub fn usable_extent(field: u32, bug_size: f32) -> u32 {
    let room = (field as f32 - bug_size).floor();
    if room >= 1.0 { room as u32 } else { 1 }
}
