//! Messages crossing the host boundary
//!
//! Inbound: [`InputEvent`], queued and processed in arrival order.
//! Outbound: [`HostCommand`], drained by the host after each pump.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{BugId, BugKind, NormalSkin};

/// Events delivered into the game loop
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Screen became visible / resumed
    SessionStart,
    /// Screen paused
    SessionStop,
    /// Screen torn down
    SessionDestroyed,
    /// Restart button
    Reset,
    /// Playfield size became known
    FieldMeasured { width: u32, height: u32 },
    /// Host already resolved the tap to a bug
    TapBug(BugId),
    /// Host already resolved the tap to empty space
    TapBackground,
    /// Raw tap in field coordinates; hit-tested by the loop
    TapAt(Vec2),
    /// Bug motion finished (expiry timer or host animation end)
    Expire(BugId),
}

/// Commands for the host UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HostCommand {
    /// Show a bug and animate it from `spawn` to `target` over `duration_ms`
    SpawnVisual {
        id: BugId,
        kind: BugKind,
        skin: Option<NormalSkin>,
        spawn: Vec2,
        target: Vec2,
        duration_ms: u64,
    },
    RemoveVisual(BugId),
    ScoreChanged { score: i64, misses: u32 },
    StatusChanged(StatusMessage),
}

/// Status line shown under the scoreboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMessage {
    Running,
    Restarted,
    BugDown,
    Bonus,
    Poison,
    Miss,
}

impl StatusMessage {
    /// Status for tapping a bug of `kind`
    pub fn for_kind(kind: BugKind) -> Self {
        match kind {
            BugKind::Normal => StatusMessage::BugDown,
            BugKind::Bonus => StatusMessage::Bonus,
            BugKind::Poison => StatusMessage::Poison,
        }
    }
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            StatusMessage::Running => "Squash the bugs!",
            StatusMessage::Restarted => "Game restarted",
            StatusMessage::BugDown => "Bug down! +10",
            StatusMessage::Bonus => "Bonus bug! +50",
            StatusMessage::Poison => "Poison bug! -20",
            StatusMessage::Miss => "Missed! -5",
        };
        f.write_str(text)
    }
}
