//! Game state and core simulation types
//!
//! Everything the game loop mutates lives in [`GameSession`]. The host only
//! reads it (positions, kinds, scoreboard) to draw.

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::timer::TimerHandle;
use crate::consts::*;

/// Unique id of a spawned bug
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BugId(pub u32);

impl fmt::Display for BugId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bug#{}", self.0)
    }
}

/// Bug types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BugKind {
    #[default]
    Normal,
    Bonus,
    Poison,
}

impl BugKind {
    /// Map a roll in `[0, KIND_ROLL_RANGE)` to a kind
    pub fn from_roll(roll: u32) -> Self {
        if roll < BONUS_ROLL_BELOW {
            BugKind::Bonus
        } else if roll < POISON_ROLL_BELOW {
            BugKind::Poison
        } else {
            BugKind::Normal
        }
    }

    /// Score change when this bug is tapped
    pub fn score_delta(&self) -> i64 {
        match self {
            BugKind::Normal => NORMAL_SCORE,
            BugKind::Bonus => BONUS_SCORE,
            BugKind::Poison => POISON_PENALTY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BugKind::Normal => "Normal",
            BugKind::Bonus => "Bonus",
            BugKind::Poison => "Poison",
        }
    }

    fn index(&self) -> usize {
        match self {
            BugKind::Normal => 0,
            BugKind::Bonus => 1,
            BugKind::Poison => 2,
        }
    }
}

/// Cosmetic variant of a normal bug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalSkin {
    Green,
    Blue,
    Orange,
}

impl NormalSkin {
    pub const ALL: [NormalSkin; 3] = [NormalSkin::Green, NormalSkin::Blue, NormalSkin::Orange];
}

/// Measured playfield size in px
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSize {
    pub width: u32,
    pub height: u32,
}

/// A bug entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bug {
    pub id: BugId,
    pub kind: BugKind,
    /// Only normal bugs carry a skin
    pub skin: Option<NormalSkin>,
    /// Top-left corner at spawn
    pub spawn: Vec2,
    /// Top-left corner when the motion ends
    pub target: Vec2,
    pub spawned_at_ms: u64,
    pub duration_ms: u64,
    /// Set once, by whichever of tap/expiry arrives first
    pub resolved: bool,
    /// Pending expiry task
    pub expiry: TimerHandle,
}

impl Bug {
    /// Linear position along spawn -> target at `now_ms` (clamped)
    pub fn position_at(&self, now_ms: u64) -> Vec2 {
        let elapsed = now_ms.saturating_sub(self.spawned_at_ms);
        let t = (elapsed as f32 / self.duration_ms.max(1) as f32).min(1.0);
        self.spawn.lerp(self.target, t)
    }

    /// Whether `point` falls inside the bug's square at `now_ms`
    pub fn contains_point(&self, point: Vec2, size: f32, now_ms: u64) -> bool {
        let min = self.position_at(now_ms);
        let max = min + Vec2::splat(size);
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }

    /// Mark resolved. Returns false if it already was.
    pub fn resolve(&mut self) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        true
    }
}

/// Score and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    /// Signed: poison and misses can push it below zero
    pub score: i64,
    pub misses: u32,
}

impl Scoreboard {
    pub fn apply(&mut self, delta: i64) {
        self.score += delta;
    }

    /// Background tap: penalty plus one miss
    pub fn record_miss(&mut self) {
        self.score += MISS_PENALTY;
        self.misses += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn score_text(&self) -> String {
        format!("Score: {}", self.score)
    }

    pub fn misses_text(&self) -> String {
        format!("Misses: {}", self.misses)
    }
}

/// Per-session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Indexed by kind (Normal, Bonus, Poison)
    spawned: [u32; 3],
    pub squashed: u32,
    pub expired: u32,
}

impl SessionStats {
    pub fn record_spawn(&mut self, kind: BugKind) {
        self.spawned[kind.index()] += 1;
    }

    pub fn spawned(&self, kind: BugKind) -> u32 {
        self.spawned[kind.index()]
    }

    pub fn total_spawned(&self) -> u32 {
        self.spawned.iter().sum()
    }
}

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Spawner stopped (before start, or paused)
    #[default]
    Idle,
    /// Spawner active
    Running,
}

/// Complete mutable game state, owned by the game loop
#[derive(Debug, Clone, Default)]
pub struct GameSession {
    pub phase: SessionPhase,
    pub scoreboard: Scoreboard,
    pub stats: SessionStats,
    /// Active bugs keyed by id (iteration order = spawn order)
    pub bugs: BTreeMap<BugId, Bug>,
    /// Cached once the host reports a nonzero size
    pub field: Option<FieldSize>,
    /// Bumped on every start; stale spawn ticks carry an older epoch
    pub epoch: u32,
    /// Next bug ID
    next_id: u32,
}

impl GameSession {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.phase == SessionPhase::Running
    }

    /// Allocate a new bug ID
    pub fn next_bug_id(&mut self) -> BugId {
        let id = BugId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn bug(&self, id: BugId) -> Option<&Bug> {
        self.bugs.get(&id)
    }

    pub fn active_count(&self) -> usize {
        self.bugs.len()
    }
}
