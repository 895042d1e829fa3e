use crate::phase::ClimaxTrigger;
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    de::DeserializeOwned,
};
use tracing::warn;

/// Persisted game record. Field names match the stored JSON document.
///
/// Decoding is lenient per field: a missing or malformed field falls back to
/// its default while the remaining fields still load.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "lenient_history")]
    pub history: Vec<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_number: Option<u8>,
    #[serde(default, deserialize_with = "lenient")]
    pub is_manual_climax: bool,
    #[serde(default, deserialize_with = "lenient")]
    pub climax_trigger_remaining: ClimaxTrigger,
}

impl Snapshot {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|err| {
        warn!(%err, "ignoring malformed snapshot field");
        T::default()
    }))
}

/// Entries that are not small non-negative integers are dropped one by one.
fn lenient_history<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Vec<serde_json::Value> = lenient(deserializer)?;
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let number = entry.as_u64().and_then(|n| u8::try_from(n).ok());
            if number.is_none() {
                warn!(%entry, "dropping unreadable history entry");
            }
            number
        })
        .collect())
}
