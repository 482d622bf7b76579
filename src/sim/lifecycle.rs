//! Bug lifecycle
//!
//! Admits new bugs with their expiry timers and resolves each one exactly
//! once, by tap or by expiry. Also owns misses and reset.

use glam::Vec2;
use rand::Rng;

use super::event::{HostCommand, StatusMessage};
use super::spawner::{roll_kind, roll_position, roll_skin};
use super::state::{Bug, BugId, BugKind, FieldSize, GameSession, NormalSkin};
use super::timer::{TimerQueue, TimerTask};
use crate::settings::Settings;

#[derive(Debug, Clone)]
pub struct Lifecycle {
    bug_size: f32,
    normal_duration_ms: u64,
    bonus_duration_ms: u64,
    poison_duration_ms: u64,
}

impl Lifecycle {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            bug_size: settings.bug_size,
            normal_duration_ms: settings.normal_duration_ms,
            bonus_duration_ms: settings.bonus_duration_ms,
            poison_duration_ms: settings.poison_duration_ms,
        }
    }

    pub fn bug_size(&self) -> f32 {
        self.bug_size
    }

    pub fn duration_ms(&self, kind: BugKind) -> u64 {
        match kind {
            BugKind::Normal => self.normal_duration_ms,
            BugKind::Bonus => self.bonus_duration_ms,
            BugKind::Poison => self.poison_duration_ms,
        }
    }

    /// Roll a new bug and put it in play
    pub fn spawn<R: Rng + ?Sized>(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        rng: &mut R,
        field: FieldSize,
        now_ms: u64,
        out: &mut Vec<HostCommand>,
    ) -> BugId {
        let kind = roll_kind(rng);
        let skin = roll_skin(rng, kind);
        let spawn = roll_position(rng, field, self.bug_size);
        let target = roll_position(rng, field, self.bug_size);
        self.admit(session, timers, kind, skin, spawn, target, now_ms, out)
    }

    /// Put a bug with the given looks and path in play
    #[allow(clippy::too_many_arguments)]
    pub fn admit(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        kind: BugKind,
        skin: Option<NormalSkin>,
        spawn: Vec2,
        target: Vec2,
        now_ms: u64,
        out: &mut Vec<HostCommand>,
    ) -> BugId {
        let id = session.next_bug_id();
        let duration_ms = self.duration_ms(kind);
        let expiry = timers.schedule(now_ms + duration_ms, TimerTask::Expire(id));

        session.bugs.insert(
            id,
            Bug {
                id,
                kind,
                skin,
                spawn,
                target,
                spawned_at_ms: now_ms,
                duration_ms,
                resolved: false,
                expiry,
            },
        );
        session.stats.record_spawn(kind);

        log::debug!(
            "Spawned {id} ({}) {:?} -> {:?} over {duration_ms}ms",
            kind.as_str(),
            spawn,
            target
        );
        out.push(HostCommand::SpawnVisual {
            id,
            kind,
            skin,
            spawn,
            target,
            duration_ms,
        });
        id
    }

    /// Player tapped a bug. Returns its kind, or None if it was already gone.
    pub fn tap(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        id: BugId,
        out: &mut Vec<HostCommand>,
    ) -> Option<BugKind> {
        let Some(mut bug) = Self::take_unresolved(session, id) else {
            log::trace!("Ignoring tap on {id}: already resolved");
            return None;
        };
        timers.cancel(bug.expiry);
        bug.resolve();

        session.scoreboard.apply(bug.kind.score_delta());
        session.stats.squashed += 1;
        log::debug!(
            "Squashed {id} ({}), score {}",
            bug.kind.as_str(),
            session.scoreboard.score
        );

        out.push(HostCommand::RemoveVisual(id));
        out.push(HostCommand::StatusChanged(StatusMessage::for_kind(bug.kind)));
        Self::push_score(session, out);
        Some(bug.kind)
    }

    /// Bug motion finished untapped. No score effect.
    pub fn expire(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        id: BugId,
        out: &mut Vec<HostCommand>,
    ) -> bool {
        let Some(mut bug) = Self::take_unresolved(session, id) else {
            log::trace!("Ignoring expiry of {id}: already resolved");
            return false;
        };
        // No-op when the expiry timer is what fired
        timers.cancel(bug.expiry);
        bug.resolve();
        session.stats.expired += 1;
        log::debug!("{id} ({}) escaped", bug.kind.as_str());

        out.push(HostCommand::RemoveVisual(id));
        true
    }

    /// Tap on empty field
    pub fn miss(&self, session: &mut GameSession, out: &mut Vec<HostCommand>) {
        session.scoreboard.record_miss();
        log::debug!(
            "Miss #{}, score {}",
            session.scoreboard.misses,
            session.scoreboard.score
        );
        out.push(HostCommand::StatusChanged(StatusMessage::Miss));
        Self::push_score(session, out);
    }

    /// Drop every active bug and its timer without scoring
    pub fn discard_all(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        out: &mut Vec<HostCommand>,
    ) -> usize {
        let bugs = std::mem::take(&mut session.bugs);
        let count = bugs.len();
        for (id, bug) in bugs {
            timers.cancel(bug.expiry);
            out.push(HostCommand::RemoveVisual(id));
        }
        count
    }

    /// Clear bugs and zero the scoreboard
    pub fn reset(
        &self,
        session: &mut GameSession,
        timers: &mut TimerQueue,
        out: &mut Vec<HostCommand>,
    ) {
        let discarded = self.discard_all(session, timers, out);
        session.scoreboard.reset();
        session.stats = Default::default();
        log::info!("Game reset ({discarded} bugs cleared)");
        Self::push_score(session, out);
        out.push(HostCommand::StatusChanged(StatusMessage::Restarted));
    }

    /// Topmost bug under `point` at `now_ms`
    pub fn hit_test(&self, session: &GameSession, point: Vec2, now_ms: u64) -> Option<BugId> {
        // Later spawns draw on top
        session
            .bugs
            .values()
            .rev()
            .find(|bug| bug.contains_point(point, self.bug_size, now_ms))
            .map(|bug| bug.id)
    }

    fn take_unresolved(session: &mut GameSession, id: BugId) -> Option<Bug> {
        match session.bugs.get(&id) {
            Some(bug) if !bug.resolved => session.bugs.remove(&id),
            _ => None,
        }
    }

    fn push_score(session: &GameSession, out: &mut Vec<HostCommand>) {
        out.push(HostCommand::ScoreChanged {
            score: session.scoreboard.score,
            misses: session.scoreboard.misses,
        });
    }
}
