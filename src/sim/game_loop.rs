//! Single-threaded game loop
//!
//! Owns the session, the timer queue and the RNG. Host input and fired timers
//! go through one FIFO, so whichever of a tap or an expiry for the same bug
//! arrives first wins and the other is a no-op.

use std::collections::VecDeque;

use glam::Vec2;
use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg32;

use super::event::{HostCommand, InputEvent, StatusMessage};
use super::lifecycle::Lifecycle;
use super::spawner::{SpawnTick, Spawner};
use super::state::{Bug, BugId, FieldSize, GameSession};
use super::timer::{TimerQueue, TimerTask};
use crate::settings::Settings;

pub struct GameLoop<R = Pcg32> {
    session: GameSession,
    timers: TimerQueue,
    spawner: Spawner,
    lifecycle: Lifecycle,
    rng: R,
    /// Virtual clock (ms)
    now_ms: u64,
    inbox: VecDeque<InputEvent>,
    outbox: Vec<HostCommand>,
}

impl GameLoop<Pcg32> {
    /// Create a loop with a seeded PCG generator
    pub fn new(settings: &Settings, seed: u64) -> Self {
        Self::with_rng(settings, Pcg32::seed_from_u64(seed))
    }
}

impl<R: RngCore> GameLoop<R> {
    /// Create a loop drawing from the given generator
    pub fn with_rng(settings: &Settings, rng: R) -> Self {
        Self {
            session: GameSession::new(),
            timers: TimerQueue::new(),
            spawner: Spawner::new(settings.spawn_interval_ms),
            lifecycle: Lifecycle::from_settings(settings),
            rng,
            now_ms: 0,
            inbox: VecDeque::new(),
            outbox: Vec::new(),
        }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn score(&self) -> i64 {
        self.session.scoreboard.score
    }

    pub fn misses(&self) -> u32 {
        self.session.scoreboard.misses
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn bug_size(&self) -> f32 {
        self.lifecycle.bug_size()
    }

    /// Active bugs in spawn order
    pub fn active_bugs(&self) -> impl Iterator<Item = &Bug> {
        self.session.bugs.values()
    }

    pub fn bug(&self, id: BugId) -> Option<&Bug> {
        self.session.bug(id)
    }

    /// Queue an event without processing it
    pub fn submit(&mut self, event: InputEvent) {
        self.inbox.push_back(event);
    }

    /// Process queued events, then any timers due at the current time
    pub fn pump(&mut self) {
        self.run_until(self.now_ms);
    }

    /// Move the clock forward, firing due timers in order
    pub fn advance(&mut self, dt_ms: u64) {
        let target = self.now_ms + dt_ms;
        self.run_until(target);
        self.now_ms = target;
    }

    /// Take all commands emitted since the last drain
    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        std::mem::take(&mut self.outbox)
    }

    pub fn on_session_start(&mut self) {
        self.dispatch(InputEvent::SessionStart);
    }

    pub fn on_session_stop(&mut self) {
        self.dispatch(InputEvent::SessionStop);
    }

    pub fn on_session_destroyed(&mut self) {
        self.dispatch(InputEvent::SessionDestroyed);
    }

    pub fn on_reset(&mut self) {
        self.dispatch(InputEvent::Reset);
    }

    pub fn on_field_measured(&mut self, width: u32, height: u32) {
        self.dispatch(InputEvent::FieldMeasured { width, height });
    }

    pub fn on_tap_bug(&mut self, id: BugId) {
        self.dispatch(InputEvent::TapBug(id));
    }

    pub fn on_tap_background(&mut self) {
        self.dispatch(InputEvent::TapBackground);
    }

    pub fn on_tap_at(&mut self, point: Vec2) {
        self.dispatch(InputEvent::TapAt(point));
    }

    /// Host finished animating a bug
    pub fn on_animation_finished(&mut self, id: BugId) {
        self.dispatch(InputEvent::Expire(id));
    }

    fn dispatch(&mut self, event: InputEvent) {
        self.submit(event);
        self.pump();
    }

    fn run_until(&mut self, until_ms: u64) {
        loop {
            self.drain_inbox();
            let Some((due, task)) = self.timers.pop_due(until_ms) else {
                break;
            };
            self.now_ms = self.now_ms.max(due);
            self.fire(task);
        }
    }

    fn drain_inbox(&mut self) {
        while let Some(event) = self.inbox.pop_front() {
            self.handle(event);
        }
    }

    fn fire(&mut self, task: TimerTask) {
        match task {
            TimerTask::SpawnTick { epoch } => {
                let tick = self
                    .spawner
                    .on_tick(epoch, &self.session, &mut self.timers, self.now_ms);
                if let SpawnTick::Spawn(field) = tick {
                    self.lifecycle.spawn(
                        &mut self.session,
                        &mut self.timers,
                        &mut self.rng,
                        field,
                        self.now_ms,
                        &mut self.outbox,
                    );
                }
            }
            TimerTask::Expire(id) => self.submit(InputEvent::Expire(id)),
        }
    }

    fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::SessionStart => self.start(),
            InputEvent::SessionStop => self.stop(),
            InputEvent::SessionDestroyed => {
                self.stop();
                log::info!("Session destroyed");
            }
            InputEvent::Reset => {
                self.lifecycle
                    .reset(&mut self.session, &mut self.timers, &mut self.outbox);
                self.start();
            }
            InputEvent::FieldMeasured { width, height } => self.measure(width, height),
            InputEvent::TapBug(id) => {
                self.lifecycle
                    .tap(&mut self.session, &mut self.timers, id, &mut self.outbox);
            }
            InputEvent::TapBackground => self.miss(),
            InputEvent::TapAt(point) => {
                match self.lifecycle.hit_test(&self.session, point, self.now_ms) {
                    Some(id) => {
                        self.lifecycle
                            .tap(&mut self.session, &mut self.timers, id, &mut self.outbox);
                    }
                    None => self.miss(),
                }
            }
            InputEvent::Expire(id) => {
                self.lifecycle
                    .expire(&mut self.session, &mut self.timers, id, &mut self.outbox);
            }
        }
    }

    fn start(&mut self) {
        if self
            .spawner
            .start(&mut self.session, &mut self.timers, self.now_ms)
        {
            log::info!("Session started at {}ms", self.now_ms);
            self.outbox
                .push(HostCommand::StatusChanged(StatusMessage::Running));
        }
    }

    /// Stop spawning and abandon every bug in play
    fn stop(&mut self) {
        let was_running = self.session.is_running();
        self.spawner.stop(&mut self.session, &mut self.timers);
        let discarded =
            self.lifecycle
                .discard_all(&mut self.session, &mut self.timers, &mut self.outbox);
        if was_running {
            log::info!(
                "Session stopped at {}ms ({discarded} bugs discarded)",
                self.now_ms
            );
        }
    }

    fn miss(&mut self) {
        if !self.session.is_running() {
            log::trace!("Ignoring background tap while idle");
            return;
        }
        self.lifecycle.miss(&mut self.session, &mut self.outbox);
    }

    fn measure(&mut self, width: u32, height: u32) {
        if self.session.field.is_some() {
            log::trace!("Field already measured, ignoring {width}x{height}");
            return;
        }
        if width == 0 || height == 0 {
            return;
        }
        self.session.field = Some(FieldSize { width, height });
        log::info!("Field measured: {width}x{height}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{BugKind, NormalSkin};

    fn settings() -> Settings {
        Settings {
            bug_size: 50.0,
            ..Default::default()
        }
    }

    /// Running loop with no measured field: only hand-placed bugs are in play
    fn running_loop() -> GameLoop {
        let mut game = GameLoop::new(&settings(), 7);
        game.on_session_start();
        game.drain_commands();
        game
    }

    fn place(game: &mut GameLoop, kind: BugKind) -> BugId {
        let skin = (kind == BugKind::Normal).then_some(NormalSkin::Green);
        let id = game.lifecycle.admit(
            &mut game.session,
            &mut game.timers,
            kind,
            skin,
            Vec2::new(10.0, 10.0),
            Vec2::new(200.0, 200.0),
            game.now_ms,
            &mut game.outbox,
        );
        game.drain_commands();
        id
    }

    #[test]
    fn test_first_spawn_is_immediate() {
        let mut game = GameLoop::new(&settings(), 1);
        game.on_field_measured(300, 300);
        game.on_session_start();

        let commands = game.drain_commands();
        assert_eq!(
            commands[0],
            HostCommand::StatusChanged(StatusMessage::Running)
        );
        assert!(matches!(commands[1], HostCommand::SpawnVisual { .. }));
        assert_eq!(game.session().active_count(), 1);
    }

    #[test]
    fn test_spawns_follow_interval() {
        let mut game = GameLoop::new(&settings(), 1);
        game.on_field_measured(300, 300);
        game.on_session_start();
        assert_eq!(game.session().stats.total_spawned(), 1);

        game.advance(1199);
        assert_eq!(game.session().stats.total_spawned(), 1);
        game.advance(1);
        assert_eq!(game.session().stats.total_spawned(), 2);
        game.advance(1200);
        assert_eq!(game.session().stats.total_spawned(), 3);
    }

    #[test]
    fn test_zero_interval_does_not_stall() {
        let zero = Settings {
            spawn_interval_ms: 0,
            ..settings()
        };
        let mut game = GameLoop::new(&zero, 1);
        game.on_field_measured(300, 300);
        game.on_session_start();
        assert_eq!(game.session().stats.total_spawned(), 1);

        game.advance(10);
        assert_eq!(game.now_ms(), 10);
        assert_eq!(game.session().stats.total_spawned(), 11);
    }

    #[test]
    fn test_unmeasured_field_skips_then_recovers() {
        let mut game = GameLoop::new(&settings(), 1);
        game.on_session_start();
        game.advance(2500);
        assert_eq!(game.session().stats.total_spawned(), 0);

        game.on_field_measured(300, 300);
        // Next tick lands at 3600
        game.advance(1100);
        assert_eq!(game.session().stats.total_spawned(), 1);
    }

    #[test]
    fn test_field_measured_once() {
        let mut game = GameLoop::new(&settings(), 1);
        game.on_field_measured(0, 0);
        assert_eq!(game.session().field, None);
        game.on_field_measured(300, 400);
        game.on_field_measured(800, 800);
        assert_eq!(
            game.session().field,
            Some(FieldSize {
                width: 300,
                height: 400
            })
        );
    }

    #[test]
    fn test_tap_normal_then_miss_then_poison_expires() {
        let mut game = running_loop();

        let normal = place(&mut game, BugKind::Normal);
        game.advance(1000);
        game.on_tap_bug(normal);
        assert_eq!(game.score(), 10);
        assert_eq!(game.session().active_count(), 0);

        game.on_tap_background();
        assert_eq!(game.score(), 5);
        assert_eq!(game.misses(), 1);

        let poison = place(&mut game, BugKind::Poison);
        game.advance(3199);
        assert!(game.bug(poison).is_some());
        game.advance(1);
        assert!(game.bug(poison).is_none());
        assert_eq!(game.score(), 5);
        assert_eq!(game.misses(), 1);
        assert_eq!(game.session().active_count(), 0);
    }

    #[test]
    fn test_first_event_wins_race() {
        let mut game = running_loop();
        let id = place(&mut game, BugKind::Bonus);

        // Both arrive in the same pump: tap first
        game.submit(InputEvent::TapBug(id));
        game.submit(InputEvent::Expire(id));
        game.pump();
        assert_eq!(game.score(), 50);
        assert_eq!(game.session().stats.squashed, 1);
        assert_eq!(game.session().stats.expired, 0);

        // Expiry first: the tap scores nothing
        let id = place(&mut game, BugKind::Bonus);
        game.submit(InputEvent::Expire(id));
        game.submit(InputEvent::TapBug(id));
        game.pump();
        assert_eq!(game.score(), 50);
        assert_eq!(game.session().stats.expired, 1);
    }

    #[test]
    fn test_host_animation_end_and_timer_both_delivered() {
        let mut game = running_loop();
        let id = place(&mut game, BugKind::Normal);

        game.on_animation_finished(id);
        let commands = game.drain_commands();
        assert_eq!(commands, vec![HostCommand::RemoveVisual(id)]);

        // The core timer was cancelled with the bug
        game.advance(5000);
        assert!(
            !game
                .drain_commands()
                .contains(&HostCommand::RemoveVisual(id))
        );
        assert_eq!(game.session().stats.expired, 1);
    }

    #[test]
    fn test_tap_at_routes_by_hit_test() {
        let mut game = running_loop();
        let id = place(&mut game, BugKind::Normal);

        game.on_tap_at(Vec2::new(250.0, 10.0));
        assert_eq!(game.misses(), 1);
        assert_eq!(game.score(), -5);

        game.on_tap_at(Vec2::new(20.0, 20.0));
        assert!(game.bug(id).is_none());
        assert_eq!(game.score(), 5);
        assert_eq!(game.misses(), 1);
    }

    #[test]
    fn test_tap_at_follows_motion() {
        let mut game = running_loop();
        let id = place(&mut game, BugKind::Normal);
        // Halfway along (10,10) -> (200,200)
        game.advance(1750);
        let pos = game.bug(id).unwrap().position_at(game.now_ms());
        assert_eq!(pos, Vec2::new(105.0, 105.0));

        game.on_tap_at(Vec2::new(20.0, 20.0));
        assert!(game.bug(id).is_some());
        game.on_tap_at(Vec2::new(120.0, 120.0));
        assert!(game.bug(id).is_none());
    }

    #[test]
    fn test_stop_discards_bugs_and_silences_timers() {
        let mut game = GameLoop::new(&settings(), 3);
        game.on_field_measured(300, 300);
        game.on_session_start();
        game.advance(1200);
        assert_eq!(game.session().active_count(), 2);
        game.drain_commands();

        game.on_session_stop();
        assert!(!game.is_running());
        assert_eq!(game.session().active_count(), 0);
        assert_eq!(game.score(), 0);
        let removed = game
            .drain_commands()
            .iter()
            .filter(|c| matches!(c, HostCommand::RemoveVisual(_)))
            .count();
        assert_eq!(removed, 2);

        game.advance(60_000);
        assert!(game.drain_commands().is_empty());
        assert_eq!(game.session().stats.total_spawned(), 2);
    }

    #[test]
    fn test_background_tap_ignored_while_idle() {
        let mut game = GameLoop::new(&settings(), 3);
        game.on_tap_background();
        assert_eq!(game.misses(), 0);
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn test_restart_does_not_double_spawner() {
        let mut game = GameLoop::new(&settings(), 3);
        game.on_field_measured(300, 300);
        game.on_session_start();
        game.on_session_stop();
        game.on_session_start();
        game.on_session_start();
        assert_eq!(game.session().stats.total_spawned(), 2);

        game.advance(1200);
        assert_eq!(game.session().stats.total_spawned(), 3);
    }

    #[test]
    fn test_reset_from_idle_starts() {
        let mut game = GameLoop::new(&settings(), 3);
        game.on_field_measured(300, 300);
        game.on_reset();

        assert!(game.is_running());
        let commands = game.drain_commands();
        assert_eq!(
            &commands[..3],
            &[
                HostCommand::ScoreChanged {
                    score: 0,
                    misses: 0
                },
                HostCommand::StatusChanged(StatusMessage::Restarted),
                HostCommand::StatusChanged(StatusMessage::Running),
            ]
        );
    }

    #[test]
    fn test_reset_while_running_keeps_cadence() {
        let mut game = running_loop();
        game.on_field_measured(300, 300);
        game.advance(1200);
        game.on_tap_background();
        let spawned_before = game.session().stats.total_spawned();
        assert_eq!(spawned_before, 1);

        game.on_reset();
        assert!(game.is_running());
        assert_eq!(game.score(), 0);
        assert_eq!(game.misses(), 0);
        assert_eq!(game.session().active_count(), 0);
        assert!(
            !game
                .drain_commands()
                .contains(&HostCommand::StatusChanged(StatusMessage::Running))
        );

        // Spawner kept its schedule: next tick at 2400
        game.advance(1200);
        assert_eq!(game.session().stats.total_spawned(), 1);
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut game = GameLoop::new(&settings(), seed);
            game.on_field_measured(480, 800);
            game.on_session_start();
            for _ in 0..200 {
                game.advance(16);
            }
            game.drain_commands()
        };
        assert_eq!(run(99999), run(99999));
    }
}
