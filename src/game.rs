use crate::{
    phase::{
        ClimaxTrigger,
        Phase,
    },
    snapshot::Snapshot,
};
use rand::{
    Rng,
    seq::IndexedRandom,
};
use tracing::warn;

pub const MIN_NUMBER: u8 = 1;
pub const MAX_NUMBER: u8 = 75;
pub const POOL_SIZE: usize = MAX_NUMBER as usize;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RollState {
    #[default]
    Idle,
    Rolling,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RevealState {
    #[default]
    NotRevealing,
    Revealing,
}

pub fn is_valid_number(n: u8) -> bool {
    (MIN_NUMBER..=MAX_NUMBER).contains(&n)
}

/// Pool, history and pending draw of one bingo game.
///
/// Every mutation goes through the methods below; out-of-order calls are
/// no-ops and report that nothing happened.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GameState {
    history: Vec<u8>,
    pending: Option<u8>,
    roll: RollState,
    manual_climax: bool,
    trigger: ClimaxTrigger,
}

impl GameState {
    pub fn new(trigger: ClimaxTrigger) -> Self {
        Self {
            trigger,
            ..Self::default()
        }
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut history = Vec::with_capacity(snapshot.history.len());
        for n in snapshot.history {
            if !is_valid_number(n) || history.contains(&n) {
                warn!(number = n, "dropping invalid or duplicate history entry");
                continue;
            }
            history.push(n);
        }
        let pending = snapshot
            .current_number
            .filter(|n| is_valid_number(*n) && !history.contains(n));
        if pending.is_none() && snapshot.current_number.is_some_and(|n| n != 0) {
            warn!(
                current_number = ?snapshot.current_number,
                "discarding pending draw that is out of range or already committed"
            );
        }
        Self {
            history,
            pending,
            roll: RollState::Idle,
            manual_climax: snapshot.is_manual_climax,
            trigger: snapshot.climax_trigger_remaining,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            history: self.history.clone(),
            current_number: self.pending,
            is_manual_climax: self.manual_climax,
            climax_trigger_remaining: self.trigger,
        }
    }

    pub fn start_roll(&mut self) -> bool {
        if self.is_exhausted() || self.roll == RollState::Rolling || self.pending.is_some()
        {
            return false;
        }
        self.roll = RollState::Rolling;
        true
    }

    pub fn stop_and_draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<u8> {
        if self.roll != RollState::Rolling {
            return None;
        }
        let candidates: Vec<u8> = self
            .pool()
            .into_iter()
            .filter(|n| Some(*n) != self.pending)
            .collect();
        let drawn = *candidates.choose(rng)?;
        self.pending = Some(drawn);
        self.roll = RollState::Idle;
        Some(drawn)
    }

    pub fn commit_pending(&mut self) -> Option<u8> {
        let pending = self.pending?;
        if self.history.contains(&pending) {
            return None;
        }
        self.history.push(pending);
        self.pending = None;
        Some(pending)
    }

    /// Clears the game. The climax trigger is configuration and survives.
    pub fn reset(&mut self) {
        self.history.clear();
        self.pending = None;
        self.roll = RollState::Idle;
        self.manual_climax = false;
    }

    pub fn toggle_manual_climax(&mut self) -> bool {
        self.manual_climax = !self.manual_climax;
        self.manual_climax
    }

    pub fn set_climax_trigger(&mut self, value: i64) -> ClimaxTrigger {
        self.trigger = ClimaxTrigger::new(value);
        self.trigger
    }

    pub fn current_phase(&self) -> Phase {
        Phase::derive(self.remaining_count(), self.trigger, self.manual_climax)
    }

    pub fn remaining_count(&self) -> u8 {
        MAX_NUMBER - self.history.len() as u8
    }

    pub fn pool(&self) -> Vec<u8> {
        (MIN_NUMBER..=MAX_NUMBER)
            .filter(|n| !self.history.contains(n))
            .collect()
    }

    pub fn history(&self) -> &[u8] {
        &self.history
    }

    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    pub fn roll_state(&self) -> RollState {
        self.roll
    }

    pub fn reveal_state(&self) -> RevealState {
        match self.pending {
            Some(_) => RevealState::Revealing,
            None => RevealState::NotRevealing,
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.roll == RollState::Rolling
    }

    pub fn is_manual_climax(&self) -> bool {
        self.manual_climax
    }

    pub fn climax_trigger(&self) -> ClimaxTrigger {
        self.trigger
    }

    pub fn is_exhausted(&self) -> bool {
        self.history.len() >= POOL_SIZE
    }
}
