use crate::phase::Phase;
use tracing::info;

/// Cue sink for the presentation layer (sound, flashes). Owned by the
/// session and handed in at construction.
pub trait Effects {
    fn roll_started(&mut self) {}

    fn roll_stopped(&mut self) {}

    /// Climax reveals only.
    fn suspense_started(&mut self) {}

    fn suspense_stopped(&mut self) {}

    fn number_decided(&mut self, _number: u8, _phase: Phase) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoEffects;

impl Effects for NoEffects {}

/// Reports cues to the log.
#[derive(Clone, Debug, Default)]
pub struct TracingEffects {
    suspense: bool,
}

impl Effects for TracingEffects {
    fn roll_started(&mut self) {
        info!(cue = "roll", "drum roll started");
    }

    fn roll_stopped(&mut self) {
        info!(cue = "roll", "drum roll stopped");
    }

    fn suspense_started(&mut self) {
        if self.suspense {
            return;
        }
        self.suspense = true;
        info!(cue = "heartbeat", "suspense started");
    }

    fn suspense_stopped(&mut self) {
        if !self.suspense {
            return;
        }
        self.suspense = false;
        info!(cue = "heartbeat", "suspense stopped");
    }

    fn number_decided(&mut self, number: u8, phase: Phase) {
        info!(cue = "decision", number, %phase, "number decided");
    }
}
