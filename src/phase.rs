use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use std::fmt;

pub const MIN_CLIMAX_TRIGGER: u8 = 1;
pub const MAX_CLIMAX_TRIGGER: u8 = 74;
pub const DEFAULT_CLIMAX_TRIGGER: u8 = 40;

/// Dramatization intensity, derived from the remaining count and the manual
/// override. Never stored.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Phase {
    #[default]
    Normal,
    Climax,
}

impl Phase {
    pub fn derive(remaining: u8, trigger: ClimaxTrigger, manual_climax: bool) -> Self {
        if manual_climax || remaining <= trigger.get() {
            Phase::Climax
        } else {
            Phase::Normal
        }
    }

    pub fn is_climax(self) -> bool {
        matches!(self, Phase::Climax)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Normal => "normal",
            Phase::Climax => "climax",
        };
        write!(f, "{name}")
    }
}

/// Remaining-count at or below which the climax phase starts.
///
/// Always within `[MIN_CLIMAX_TRIGGER, MAX_CLIMAX_TRIGGER]`; every
/// constructor clamps, including deserialization.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ClimaxTrigger(u8);

impl ClimaxTrigger {
    pub fn new(value: i64) -> Self {
        let clamped =
            value.clamp(i64::from(MIN_CLIMAX_TRIGGER), i64::from(MAX_CLIMAX_TRIGGER));
        ClimaxTrigger(clamped as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for ClimaxTrigger {
    fn default() -> Self {
        ClimaxTrigger(DEFAULT_CLIMAX_TRIGGER)
    }
}

impl<'de> Deserialize<'de> for ClimaxTrigger {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Ok(ClimaxTrigger::new(raw))
    }
}
