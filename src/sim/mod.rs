//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Virtual millisecond clock only
//! - Seeded (or injected) RNG only
//! - Stable iteration order (by bug ID)
//! - No rendering or platform dependencies

pub mod event;
pub mod game_loop;
pub mod lifecycle;
pub mod spawner;
pub mod state;
pub mod timer;

pub use event::{HostCommand, InputEvent, StatusMessage};
pub use game_loop::GameLoop;
pub use lifecycle::Lifecycle;
pub use spawner::{SpawnTick, Spawner, roll_kind, roll_position, roll_skin};
pub use state::{
    Bug, BugId, BugKind, FieldSize, GameSession, NormalSkin, Scoreboard, SessionPhase,
    SessionStats,
};
pub use timer::{TimerHandle, TimerQueue, TimerTask};
