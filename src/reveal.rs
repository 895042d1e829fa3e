//! Timed, cancelable reveal of a drawn number.
//!
//! A [`RevealPlan`] is a finite list of `{delay, frame}` stages. One generic
//! driver task walks the list, reporting every frame and finally a single
//! [`RevealEvent::Complete`]. Each reveal owns a cancellation flag held by its
//! [`RevealHandle`]; the driver checks it while waiting and before every
//! report, so a cancelled reveal never completes.

use crate::phase::Phase;
use rand::{
    SeedableRng,
    rngs::StdRng,
};
use std::time::Duration;
use tokio::{
    sync::{
        mpsc,
        watch,
    },
    task::JoinHandle,
    time,
};
use tracing::{
    debug,
    warn,
};

pub mod plan;

pub use plan::{
    Frame,
    RevealMode,
    RevealPlan,
    Stage,
};

pub type RevealEvents = mpsc::UnboundedReceiver<RevealEvent>;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RevealId(u64);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevealEvent {
    Frame { id: RevealId, frame: Frame },
    Complete { id: RevealId, target: u8 },
}

impl RevealEvent {
    pub fn id(&self) -> RevealId {
        match self {
            RevealEvent::Frame { id, .. } | RevealEvent::Complete { id, .. } => *id,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
    /// The event receiver went away or the driver task died.
    Aborted,
}

/// Owner of one running reveal. Dropping the handle cancels the reveal.
#[derive(Debug)]
pub struct RevealHandle {
    id: RevealId,
    mode: RevealMode,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<RevealOutcome>>,
}

impl RevealHandle {
    pub fn id(&self) -> RevealId {
        self.id
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub async fn finished(mut self) -> RevealOutcome {
        let Some(task) = self.task.take() else {
            return RevealOutcome::Aborted;
        };
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(id = ?self.id, ?err, "reveal driver task failed");
                RevealOutcome::Aborted
            }
        }
    }
}

impl Drop for RevealHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Starts reveals on the current tokio runtime and reports their events on
/// one channel.
#[derive(Debug)]
pub struct RevealSequencer {
    events: mpsc::UnboundedSender<RevealEvent>,
    rng: StdRng,
    next_id: u64,
}

impl RevealSequencer {
    pub fn new(events: mpsc::UnboundedSender<RevealEvent>) -> Self {
        Self::with_rng(events, StdRng::from_os_rng())
    }

    pub fn with_seed(events: mpsc::UnboundedSender<RevealEvent>, seed: u64) -> Self {
        Self::with_rng(events, StdRng::seed_from_u64(seed))
    }

    fn with_rng(events: mpsc::UnboundedSender<RevealEvent>, rng: StdRng) -> Self {
        Self {
            events,
            rng,
            next_id: 0,
        }
    }

    pub fn channel() -> (mpsc::UnboundedSender<RevealEvent>, RevealEvents) {
        mpsc::unbounded_channel()
    }

    pub fn start(&mut self, target: u8, phase: Phase) -> RevealHandle {
        let mode = RevealMode::choose(phase, &mut self.rng);
        let plan = RevealPlan::build(mode, target, &mut self.rng);
        self.start_plan(plan)
    }

    pub fn start_plan(&mut self, plan: RevealPlan) -> RevealHandle {
        self.next_id += 1;
        let id = RevealId(self.next_id);
        let mode = plan.mode;
        debug!(
            ?id,
            ?mode,
            target = plan.target,
            stages = plan.stages.len(),
            duration_ms = plan.total_duration().as_millis() as u64,
            "starting reveal"
        );
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(drive(id, plan, cancel_rx, self.events.clone()));
        RevealHandle {
            id,
            mode,
            cancel: cancel_tx,
            task: Some(task),
        }
    }

    pub fn cancel(&mut self, handle: RevealHandle) {
        debug!(id = ?handle.id, "cancelling reveal");
        handle.cancel();
    }
}

async fn drive(
    id: RevealId,
    plan: RevealPlan,
    mut cancel: watch::Receiver<bool>,
    events: mpsc::UnboundedSender<RevealEvent>,
) -> RevealOutcome {
    for stage in plan.stages {
        if !hold(stage.delay, &mut cancel).await {
            debug!(?id, "reveal cancelled");
            return RevealOutcome::Cancelled;
        }
        let frame = stage.frame;
        if events.send(RevealEvent::Frame { id, frame }).is_err() {
            warn!(?id, "reveal receiver dropped");
            return RevealOutcome::Aborted;
        }
    }
    if !hold(plan.settle, &mut cancel).await {
        debug!(?id, "reveal cancelled during settle");
        return RevealOutcome::Cancelled;
    }
    let target = plan.target;
    if events.send(RevealEvent::Complete { id, target }).is_err() {
        warn!(?id, "reveal receiver dropped before completion");
        return RevealOutcome::Aborted;
    }
    RevealOutcome::Completed
}

/// Waits `delay` unless cancelled first. Returns whether the reveal may
/// continue.
async fn hold(delay: Duration, cancel: &mut watch::Receiver<bool>) -> bool {
    let sleep = time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        if *cancel.borrow_and_update() {
            return false;
        }
        tokio::select! {
            biased;
            changed = cancel.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            _ = &mut sleep => return !*cancel.borrow(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    fn drain(rx: &mut RevealEvents) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        events
    }

    fn countdown_plan(target: u8) -> RevealPlan {
        RevealPlan::build(
            RevealMode::Countdown,
            target,
            &mut StdRng::seed_from_u64(0),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn start_plan__reports_frames_then_completes_once() {
        // given
        let (tx, mut rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 1);

        // when
        let handle = sequencer.start_plan(countdown_plan(12));
        let outcome = handle.finished().await;

        // then
        assert_eq!(outcome, RevealOutcome::Completed);
        let events = drain(&mut rx);
        let frames: Vec<Frame> = events
            .iter()
            .filter_map(|ev| match ev {
                RevealEvent::Frame { frame, .. } => Some(*frame),
                RevealEvent::Complete { .. } => None,
            })
            .collect();
        assert_eq!(
            frames,
            vec![
                Frame::Countdown(3),
                Frame::Countdown(2),
                Frame::Countdown(1),
                Frame::Number(12),
            ]
        );
        let completions = events
            .iter()
            .filter(|ev| matches!(ev, RevealEvent::Complete { target: 12, .. }))
            .count();
        assert_eq!(completions, 1);
        assert!(matches!(events.last(), Some(RevealEvent::Complete { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel__before_final_stage_suppresses_completion() {
        // given
        let (tx, mut rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 2);
        let handle = sequencer.start_plan(countdown_plan(40));
        time::sleep(Duration::from_millis(1500)).await;

        // when
        handle.cancel();
        let outcome = handle.finished().await;
        time::sleep(Duration::from_secs(30)).await;

        // then
        assert_eq!(outcome, RevealOutcome::Cancelled);
        let events = drain(&mut rx);
        assert!(!events.is_empty());
        assert!(
            events
                .iter()
                .all(|ev| matches!(ev, RevealEvent::Frame { .. }))
        );
        assert!(
            events
                .iter()
                .all(|ev| !matches!(ev, RevealEvent::Frame { frame: Frame::Number(40), .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancel__during_settle_suppresses_completion() {
        // given
        let (tx, mut rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 3);
        let plan = countdown_plan(5);
        let before_settle = plan.total_duration() - plan.settle;
        let handle = sequencer.start_plan(plan);
        time::sleep(before_settle + Duration::from_millis(100)).await;

        // when
        sequencer.cancel(handle);
        time::sleep(Duration::from_secs(10)).await;

        // then
        let events = drain(&mut rx);
        assert!(events.contains(&RevealEvent::Frame {
            id: events[0].id(),
            frame: Frame::Number(5),
        }));
        assert!(
            !events
                .iter()
                .any(|ev| matches!(ev, RevealEvent::Complete { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn drop__handle_cancels_reveal() {
        let (tx, mut rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 4);

        drop(sequencer.start(30, Phase::Climax));
        time::sleep(Duration::from_secs(60)).await;

        assert!(
            !drain(&mut rx)
                .iter()
                .any(|ev| matches!(ev, RevealEvent::Complete { .. }))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn start__closed_receiver_aborts_without_completing() {
        let (tx, rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 5);
        drop(rx);

        let outcome = sequencer.start(9, Phase::Normal).finished().await;

        assert_eq!(outcome, RevealOutcome::Aborted);
    }

    #[tokio::test(start_paused = true)]
    async fn start__ids_are_unique_per_reveal() {
        let (tx, _rx) = RevealSequencer::channel();
        let mut sequencer = RevealSequencer::with_seed(tx, 6);

        let first = sequencer.start(1, Phase::Normal);
        let second = sequencer.start(2, Phase::Normal);

        assert_ne!(first.id(), second.id());
    }
}
