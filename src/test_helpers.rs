use crate::{
    effects::NoEffects,
    reveal::{
        RevealEvent,
        RevealEvents,
    },
    session::{
        Session,
        SessionOptions,
    },
    snapshot::Snapshot,
    storage::{
        KeyValueStore,
        MemoryStore,
        STATE_KEY,
    },
};

pub const TEST_SEED: u64 = 42;

/// A seeded session over an in-memory store. Run inside a paused-time tokio
/// test so reveals finish instantly.
pub struct TestContext {
    session: Session<MemoryStore, NoEffects>,
    events: RevealEvents,
    store: MemoryStore,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_saved_json(json: &str) -> Self {
        Self::with_store(MemoryStore::with_entry(STATE_KEY, json))
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let (session, events) = Session::open(
            store.clone(),
            NoEffects,
            SessionOptions {
                auto_stop: None,
                seed: Some(TEST_SEED),
            },
        );
        Self {
            session,
            events,
            store,
        }
    }

    pub fn session(&mut self) -> &mut Session<MemoryStore, NoEffects> {
        &mut self.session
    }

    pub fn store(&self) -> MemoryStore {
        self.store.clone()
    }

    /// Start, stop and wait for the reveal to commit.
    pub async fn draw_one(&mut self) -> u8 {
        assert!(self.session.start_roll(), "roll refused");
        let drawn = self.session.stop_and_draw().unwrap();
        self.finish_reveal().await;
        drawn
    }

    /// Feeds reveal events to the session until one completes.
    pub async fn finish_reveal(&mut self) -> Vec<RevealEvent> {
        let mut seen = Vec::new();
        loop {
            let event = self.events.recv().await.unwrap();
            seen.push(event);
            self.session.handle_reveal_event(event);
            if matches!(event, RevealEvent::Complete { .. }) {
                return seen;
            }
        }
    }

    /// Everything already queued, without waiting.
    pub fn drain_events(&mut self) -> Vec<RevealEvent> {
        let mut drained = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            drained.push(event);
        }
        drained
    }

    pub fn saved_snapshot(&self) -> Snapshot {
        let raw = self.store.get(STATE_KEY).unwrap().unwrap();
        Snapshot::from_json(&raw).unwrap()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
