#![allow(dead_code)]

use async_trait::async_trait;
use event_depot::{ArchiveResult, BlobStore, DepotConfig, Event, MemoryBlobStore};
use parking_lot::Mutex;
use serde_json::{json, Value};
use splyt_transport::{Transport, TransportError, TransportResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const ACCEPTED: &str = r#"{"error":0,"data":{"datacollector_batch":{"error":0}}}"#;

/// A delivery attempt seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct Attempt {
    pub url: Url,
    pub timestamp: f64,
    pub events: Vec<Event>,
    pub delivered: bool,
}

/// Records every send; succeeds only while online.
pub struct MockTransport {
    online: AtomicBool,
    attempts: Mutex<Vec<Attempt>>,
}

impl MockTransport {
    pub fn online() -> Arc<Self> {
        Arc::new(Self {
            online: AtomicBool::new(true),
            attempts: Mutex::new(Vec::new()),
        })
    }

    pub fn offline() -> Arc<Self> {
        let transport = Self::online();
        transport.set_online(false);
        transport
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> Vec<Attempt> {
        self.attempts.lock().clone()
    }

    /// Events from successful sends, in delivery order.
    pub fn delivered_events(&self) -> Vec<Event> {
        self.attempts
            .lock()
            .iter()
            .filter(|attempt| attempt.delivered)
            .flat_map(|attempt| attempt.events.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, url: &Url, _timeout: Duration, payload: String) -> TransportResult<String> {
        let (timestamp, events): (f64, Vec<Event>) =
            serde_json::from_str(&payload).expect("payload is [timestamp, events]");
        let delivered = self.online.load(Ordering::SeqCst);

        self.attempts.lock().push(Attempt {
            url: url.clone(),
            timestamp,
            events,
            delivered,
        });

        if delivered {
            Ok(ACCEPTED.to_string())
        } else {
            Err(TransportError::Io("network unreachable".to_string()))
        }
    }
}

/// Memory store whose next `put`s under a key prefix can be made to fail.
/// Clones share contents and pending failures.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: MemoryBlobStore,
    failing: Arc<Mutex<Vec<(String, usize)>>>,
}

impl FlakyStore {
    pub fn fail_next_puts(&self, prefix: &str, count: usize) {
        self.failing.lock().push((prefix.to_string(), count));
    }

    pub fn memory(&self) -> MemoryBlobStore {
        self.inner.clone()
    }
}

impl BlobStore for FlakyStore {
    fn put(&self, key: &str, value: &[u8]) -> ArchiveResult<()> {
        let mut failing = self.failing.lock();
        if let Some((_, remaining)) = failing
            .iter_mut()
            .find(|(prefix, remaining)| *remaining > 0 && key.starts_with(prefix.as_str()))
        {
            *remaining -= 1;
            return Err(std::io::Error::other("disk full").into());
        }
        drop(failing);
        self.inner.put(key, value)
    }

    fn get(&self, key: &str) -> ArchiveResult<Option<Vec<u8>>> {
        self.inner.get(key)
    }

    fn delete(&self, key: &str) -> ArchiveResult<bool> {
        self.inner.delete(key)
    }

    fn list_keys_with_prefix(&self, prefix: &str) -> ArchiveResult<Vec<String>> {
        self.inner.list_keys_with_prefix(prefix)
    }
}

pub fn collector_url() -> Url {
    Url::parse("https://collector.test/isos-personalization/ws/interface/datacollector_batch?ssf_cust_id=acme")
        .unwrap()
}

/// Config whose scheduler stays out of the way of a test.
pub fn quiet_config() -> DepotConfig {
    let mut config = DepotConfig::new(collector_url(), Duration::from_millis(500));
    config.period_min = Duration::from_secs(60);
    config.period_max = Duration::from_secs(120);
    config
}

pub fn event(i: usize) -> Event {
    Event::new("datacollector_updateUserState", vec![json!(i), json!({ "level": i })])
}

pub fn events(range: std::ops::Range<usize>) -> Vec<Event> {
    range.map(event).collect()
}

pub fn arg0(event: &Event) -> Value {
    event.args()[0].clone()
}
