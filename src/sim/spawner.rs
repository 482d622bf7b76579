//! Spawner
//!
//! Self-rescheduling spawn tick: the first tick fires as soon as the session
//! starts, each later one `interval_ms` after the previous tick fired.
//! Also holds the random draws that decide what a new bug looks like.

use glam::Vec2;
use rand::Rng;

use super::state::{BugKind, FieldSize, GameSession, NormalSkin, SessionPhase};
use super::timer::{TimerHandle, TimerQueue, TimerTask};
use crate::consts::KIND_ROLL_RANGE;
use crate::usable_extent;

/// What a spawn tick should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnTick {
    /// Stale tick from a stopped session; nothing rescheduled
    Dead,
    /// Field not measured yet; rescheduled without spawning
    Skipped,
    /// Spawn a bug into this field; already rescheduled
    Spawn(FieldSize),
}

#[derive(Debug, Clone)]
pub struct Spawner {
    interval_ms: u64,
    /// Next scheduled tick, if running
    pending: Option<TimerHandle>,
}

impl Spawner {
    /// A zero interval would reschedule at the same instant forever; it is
    /// raised to 1ms.
    pub fn new(interval_ms: u64) -> Self {
        if interval_ms == 0 {
            log::warn!("Spawn interval of 0ms raised to 1ms");
        }
        Self {
            interval_ms: interval_ms.max(1),
            pending: None,
        }
    }

    pub fn pending(&self) -> Option<TimerHandle> {
        self.pending
    }

    /// Start spawning. Returns false if already running.
    pub fn start(
        &mut self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        now_ms: u64,
    ) -> bool {
        if session.is_running() {
            return false;
        }
        session.phase = SessionPhase::Running;
        session.epoch = session.epoch.wrapping_add(1);
        let epoch = session.epoch;
        self.pending = Some(timers.schedule(now_ms, TimerTask::SpawnTick { epoch }));
        true
    }

    /// Stop spawning and drop the pending tick. Active bugs are left alone.
    pub fn stop(&mut self, session: &mut GameSession, timers: &mut TimerQueue) {
        session.phase = SessionPhase::Idle;
        if let Some(handle) = self.pending.take() {
            timers.cancel(handle);
        }
    }

    /// Handle a fired tick
    pub fn on_tick(
        &mut self,
        epoch: u32,
        session: &GameSession,
        timers: &mut TimerQueue,
        fired_at_ms: u64,
    ) -> SpawnTick {
        if !session.is_running() || epoch != session.epoch {
            log::trace!("Dropping stale spawn tick (epoch {epoch})");
            return SpawnTick::Dead;
        }

        self.pending = Some(timers.schedule(
            fired_at_ms + self.interval_ms,
            TimerTask::SpawnTick { epoch },
        ));

        match session.field {
            Some(field) if field.width > 0 && field.height > 0 => SpawnTick::Spawn(field),
            _ => {
                log::trace!("Field not measured yet, skipping spawn");
                SpawnTick::Skipped
            }
        }
    }
}

/// Draw a bug kind: 10% Bonus, 15% Poison, 75% Normal
pub fn roll_kind<R: Rng + ?Sized>(rng: &mut R) -> BugKind {
    BugKind::from_roll(rng.random_range(0..KIND_ROLL_RANGE))
}

/// Normal bugs get one of three skins; the others have fixed art
pub fn roll_skin<R: Rng + ?Sized>(rng: &mut R, kind: BugKind) -> Option<NormalSkin> {
    match kind {
        BugKind::Normal => Some(NormalSkin::ALL[rng.random_range(0..NormalSkin::ALL.len())]),
        BugKind::Bonus | BugKind::Poison => None,
    }
}

/// Random top-left corner that keeps a bug of `bug_size` inside the field
pub fn roll_position<R: Rng + ?Sized>(rng: &mut R, field: FieldSize, bug_size: f32) -> Vec2 {
    let max_x = usable_extent(field.width, bug_size);
    let max_y = usable_extent(field.height, bug_size);
    Vec2::new(
        rng.random_range(0..max_x) as f32,
        rng.random_range(0..max_y) as f32,
    )
}
