use crate::{
    effects::Effects,
    game::GameState,
    phase::Phase,
    reveal::{
        Frame,
        RevealEvent,
        RevealEvents,
        RevealHandle,
        RevealSequencer,
    },
    storage::{
        KeyValueStore,
        SnapshotRepository,
    },
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{
    debug,
    error,
    info,
    warn,
};

pub const DEFAULT_AUTO_STOP: Duration = Duration::from_secs(3);

#[derive(Clone, Debug)]
pub struct SessionOptions {
    /// Stop a roll automatically this long after it started.
    pub auto_stop: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            auto_stop: Some(DEFAULT_AUTO_STOP),
            seed: None,
        }
    }
}

/// What the roller currently shows.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RollerDisplay {
    #[default]
    Ready,
    Rolling {
        tens: u8,
        ones: u8,
    },
    Revealing(Frame),
    Landed(u8),
}

/// Read-only state handed to the renderer.
#[derive(Clone, Debug)]
pub struct SessionView {
    pub history: Vec<u8>,
    /// Most recent committed number; hidden while a reveal runs.
    pub latest: Option<u8>,
    pub remaining: u8,
    pub phase: Phase,
    pub is_rolling: bool,
    pub is_revealing: bool,
    pub is_manual_climax: bool,
    pub is_over: bool,
    pub climax_trigger: u8,
    pub display: RollerDisplay,
    pub status: String,
}

#[derive(Debug)]
struct ActiveReveal {
    handle: RevealHandle,
    target: u8,
    phase: Phase,
}

/// Single owner of the game: state transitions, persistence after every
/// mutation, the active reveal and the effect cues.
pub struct Session<S, E> {
    game: GameState,
    repo: SnapshotRepository<S>,
    effects: E,
    sequencer: RevealSequencer,
    active: Option<ActiveReveal>,
    rng: StdRng,
    display: RollerDisplay,
    auto_stop: Option<Duration>,
    auto_stop_at: Option<Instant>,
    status: String,
}

impl<S: KeyValueStore, E: Effects> Session<S, E> {
    pub fn open(store: S, effects: E, options: SessionOptions) -> (Self, RevealEvents) {
        let repo = SnapshotRepository::new(store);
        let game = GameState::from_snapshot(repo.load());
        let (events_tx, events_rx) = RevealSequencer::channel();
        let (sequencer, rng) = match options.seed {
            Some(seed) => (
                RevealSequencer::with_seed(events_tx, seed),
                StdRng::seed_from_u64(seed.wrapping_add(1)),
            ),
            None => (RevealSequencer::new(events_tx), StdRng::from_os_rng()),
        };
        info!(
            drawn = game.history().len(),
            pending = ?game.pending(),
            climax_trigger = game.climax_trigger().get(),
            manual_climax = game.is_manual_climax(),
            "session opened"
        );
        let session = Self {
            game,
            repo,
            effects,
            sequencer,
            active: None,
            rng,
            display: RollerDisplay::Ready,
            auto_stop: options.auto_stop,
            auto_stop_at: None,
            status: String::from("Ready"),
        };
        (session, events_rx)
    }

    pub fn start_roll(&mut self) -> bool {
        if self.active.is_some() {
            debug!("roll ignored while a reveal is running");
            return false;
        }
        if !self.game.start_roll() {
            if self.game.is_exhausted() {
                self.status = String::from("All numbers drawn. Reset to play again");
            }
            debug!(rolling = self.game.is_rolling(), "roll request ignored");
            return false;
        }
        self.auto_stop_at = self.auto_stop.map(|after| Instant::now() + after);
        self.display = RollerDisplay::Rolling {
            tens: self.rng.random_range(0..=7),
            ones: self.rng.random_range(0..=9),
        };
        self.effects.roll_started();
        self.status = String::from("Rolling...");
        self.persist();
        true
    }

    pub fn stop_and_draw(&mut self) -> Option<u8> {
        let drawn = self.game.stop_and_draw(&mut self.rng)?;
        self.auto_stop_at = None;
        self.effects.roll_stopped();
        self.persist();
        info!(number = drawn, remaining = self.game.remaining_count(), "number drawn");
        self.begin_reveal(drawn);
        Some(drawn)
    }

    /// Space bar: start when idle, stop when rolling, ignored mid-reveal.
    pub fn start_or_stop(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        if self.game.is_rolling() {
            self.stop_and_draw().is_some()
        } else {
            self.start_roll()
        }
    }

    /// Restarts the reveal of a draw restored from a snapshot.
    pub fn resume_pending_reveal(&mut self) -> bool {
        if self.active.is_some() {
            return false;
        }
        let Some(pending) = self.game.pending() else {
            return false;
        };
        info!(number = pending, "resuming interrupted reveal");
        self.begin_reveal(pending);
        true
    }

    fn begin_reveal(&mut self, target: u8) {
        let phase = self.game.current_phase();
        if phase.is_climax() {
            self.effects.suspense_started();
        }
        let handle = self.sequencer.start(target, phase);
        debug!(id = ?handle.id(), mode = ?handle.mode(), %phase, "reveal started");
        self.status = match phase {
            Phase::Normal => String::from("Revealing..."),
            Phase::Climax => String::from("Climax!"),
        };
        self.active = Some(ActiveReveal {
            handle,
            target,
            phase,
        });
    }

    pub fn handle_reveal_event(&mut self, event: RevealEvent) {
        let is_current = self
            .active
            .as_ref()
            .is_some_and(|active| active.handle.id() == event.id());
        if !is_current {
            debug!(id = ?event.id(), "dropping stale reveal event");
            return;
        }
        match event {
            RevealEvent::Frame { frame, .. } => {
                self.display = RollerDisplay::Revealing(frame);
            }
            RevealEvent::Complete { target, .. } => {
                let Some(active) = self.active.take() else {
                    return;
                };
                if target != active.target {
                    warn!(target, expected = active.target, "reveal finished on another number");
                }
                self.effects.suspense_stopped();
                match self.game.commit_pending() {
                    Some(number) => {
                        self.persist();
                        self.effects.number_decided(number, active.phase);
                        self.display = RollerDisplay::Landed(number);
                        self.status = if self.game.is_exhausted() {
                            format!("Drew {number}. All numbers drawn!")
                        } else {
                            format!("Drew {number}")
                        };
                        info!(
                            number,
                            drawn = self.game.history().len(),
                            phase = %self.game.current_phase(),
                            "number committed"
                        );
                    }
                    None => warn!("reveal completed without a pending draw"),
                }
            }
        }
    }

    /// Cancels any running reveal, then clears the game. The climax trigger
    /// is kept.
    pub fn reset(&mut self) {
        if let Some(active) = self.active.take() {
            self.sequencer.cancel(active.handle);
            self.effects.suspense_stopped();
        }
        if self.game.is_rolling() {
            self.effects.roll_stopped();
        }
        self.game.reset();
        self.auto_stop_at = None;
        self.display = RollerDisplay::Ready;
        self.status = String::from("Game reset");
        info!(climax_trigger = self.game.climax_trigger().get(), "game reset");
        self.persist();
    }

    pub fn toggle_manual_climax(&mut self) -> bool {
        let enabled = self.game.toggle_manual_climax();
        self.status = if enabled {
            String::from("Climax mode on")
        } else {
            String::from("Climax mode off")
        };
        debug!(enabled, "manual climax toggled");
        self.persist();
        enabled
    }

    pub fn set_climax_trigger(&mut self, value: i64) -> u8 {
        let trigger = self.game.set_climax_trigger(value).get();
        self.status = format!("Climax starts at {trigger} remaining");
        debug!(requested = value, trigger, "climax trigger updated");
        self.persist();
        trigger
    }

    pub fn auto_stop_deadline(&self) -> Option<Instant> {
        self.auto_stop_at.filter(|_| self.game.is_rolling())
    }

    /// Rotates the cosmetic rolling digits by one position.
    pub fn advance_rolling_display(&mut self) {
        if let RollerDisplay::Rolling { tens, ones } = self.display {
            self.display = RollerDisplay::Rolling {
                tens: (tens + 1) % 8,
                ones: (ones + 1) % 10,
            };
        }
    }

    pub fn view(&self) -> SessionView {
        let is_revealing = self.active.is_some() || self.game.pending().is_some();
        SessionView {
            history: self.game.history().to_vec(),
            latest: if is_revealing {
                None
            } else {
                self.game.history().last().copied()
            },
            remaining: self.game.remaining_count(),
            phase: self.game.current_phase(),
            is_rolling: self.game.is_rolling(),
            is_revealing,
            is_manual_climax: self.game.is_manual_climax(),
            is_over: self.game.is_exhausted(),
            climax_trigger: self.game.climax_trigger().get(),
            display: self.display,
            status: self.status.clone(),
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.game.is_rolling()
    }

    pub fn is_revealing(&self) -> bool {
        self.active.is_some()
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Ends the session: cancels a running reveal. A pending draw stays in
    /// the snapshot and is revealed again on the next start.
    pub fn shutdown(&mut self) {
        if let Some(active) = self.active.take() {
            self.sequencer.cancel(active.handle);
            self.effects.suspense_stopped();
        }
        if self.game.is_rolling() {
            self.effects.roll_stopped();
        }
        info!(drawn = self.game.history().len(), "session closed");
    }

    fn persist(&mut self) {
        if let Err(err) = self.repo.save(&self.game.snapshot()) {
            error!(?err, "failed to persist game state");
        }
    }
}
