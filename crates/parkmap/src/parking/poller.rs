use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use super::types::{SpotStatus, StatusRecord};

/// Default time between polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Default per-request timeout for the HTTP source.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(4000);

/// `tokio::time::interval` rejects a zero period.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Records decoded from one poll, plus how many entries were unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSnapshot {
    pub records: Vec<StatusRecord>,
    pub malformed: usize,
}

/// One entry as it appears on the wire. Every field is required.
#[derive(Debug, Deserialize)]
struct WireRecord {
    section: String,
    spot_number: i64,
    status: String,
}

/// Decode a `/spots` response body.
///
/// The body must be a JSON array. Each element is decoded on its own, and
/// elements with a missing or mistyped field are counted and dropped.
pub fn parse_snapshot(body: &str) -> Result<ParsedSnapshot> {
    let value: serde_json::Value =
        serde_json::from_str(body).context("Snapshot is not valid JSON")?;
    parse_snapshot_value(value)
}

pub fn parse_snapshot_value(value: serde_json::Value) -> Result<ParsedSnapshot> {
    let serde_json::Value::Array(items) = value else {
        anyhow::bail!("Snapshot must be a JSON array of spot records");
    };

    let mut snapshot = ParsedSnapshot::default();
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<WireRecord>(item) {
            Ok(wire) => snapshot.records.push(StatusRecord::new(
                wire.section,
                wire.spot_number,
                SpotStatus::from_wire(&wire.status),
            )),
            Err(e) => {
                warn!(index, "skipping malformed spot record: {e}");
                snapshot.malformed += 1;
            }
        }
    }
    Ok(snapshot)
}

/// Somewhere a status snapshot can be fetched from.
///
/// `fetch` blocks; the poll loop runs it off the timer task.
pub trait SnapshotSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<ParsedSnapshot>;

    /// Human-readable origin, for logs.
    fn describe(&self) -> String;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for Box<S> {
    fn fetch(&self) -> Result<ParsedSnapshot> {
        (**self).fetch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Polls `GET {base}/spots` over HTTP.
pub struct HttpSource {
    agent: ureq::Agent,
    url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        Self {
            agent,
            url: format!("{}/spots", base_url.trim_end_matches('/')),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SnapshotSource for HttpSource {
    fn fetch(&self) -> Result<ParsedSnapshot> {
        let value: serde_json::Value = self
            .agent
            .get(&self.url)
            .call()
            .with_context(|| format!("Failed to fetch {}", self.url))?
            .body_mut()
            .read_json()
            .with_context(|| format!("Failed to parse response from {}", self.url))?;
        parse_snapshot_value(value)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

/// Reads a snapshot from a JSON file on every poll.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&self) -> Result<ParsedSnapshot> {
        let body = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        parse_snapshot(&body).with_context(|| format!("Invalid snapshot {}", self.path.display()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Result of one poll tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Snapshot(ParsedSnapshot),
    /// The fetch failed; the next tick tries again.
    Failed(String),
}

/// Periodic fetch loop over a [`SnapshotSource`].
pub struct Poller<S> {
    source: Arc<S>,
    interval: Duration,
}

impl<S: SnapshotSource> Poller<S> {
    pub fn new(source: S, interval: Duration) -> Self {
        Self {
            source: Arc::new(source),
            interval: interval.max(MIN_TICK),
        }
    }

    /// Poll until `shutdown` turns true or its sender is dropped.
    ///
    /// The first fetch happens immediately. Ticks missed while a slow fetch is
    /// in flight are not replayed. Failures are reported through `on_event`
    /// and never end the loop.
    pub async fn run<F>(&self, mut shutdown: watch::Receiver<bool>, mut on_event: F)
    where
        F: FnMut(PollEvent),
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let origin = self.source.describe();

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.changed() => break,
            }

            let source = Arc::clone(&self.source);
            let fetch = tokio::task::spawn_blocking(move || source.fetch());
            let event = tokio::select! {
                joined = fetch => match joined {
                    Ok(Ok(snapshot)) => {
                        debug!(
                            source = %origin,
                            records = snapshot.records.len(),
                            malformed = snapshot.malformed,
                            "poll succeeded"
                        );
                        PollEvent::Snapshot(snapshot)
                    }
                    Ok(Err(e)) => {
                        warn!(source = %origin, "poll failed: {e:#}");
                        PollEvent::Failed(format!("{e:#}"))
                    }
                    Err(e) => {
                        warn!(source = %origin, "poll task failed: {e}");
                        PollEvent::Failed(e.to_string())
                    }
                },
                _ = shutdown.changed() => break,
            };
            on_event(event);
        }
        debug!(source = %origin, "poller stopped");
    }
}

/// A poller running on its own thread. Events are collected with
/// [`PollerHandle::drain`] on the owner's thread, which is where snapshots
/// get applied. Dropping the handle stops the timer.
pub struct PollerHandle {
    shutdown: watch::Sender<bool>,
    events: mpsc::Receiver<PollEvent>,
    thread: Option<JoinHandle<()>>,
}

/// Start polling `source` in the background. `notify` runs after each event
/// is queued, e.g. to wake a UI.
pub fn spawn_background<S, N>(source: S, interval: Duration, notify: N) -> Result<PollerHandle>
where
    S: SnapshotSource,
    N: Fn() + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (event_tx, event_rx) = mpsc::channel();

    let thread = std::thread::Builder::new()
        .name("parkmap-poller".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("could not start poll runtime: {e}");
                    return;
                }
            };
            let poller = Poller::new(source, interval);
            runtime.block_on(poller.run(shutdown_rx, |event| {
                if event_tx.send(event).is_ok() {
                    notify();
                }
            }));
            // A fetch still on the blocking pool is left to finish on its own.
            runtime.shutdown_background();
        })
        .context("Failed to spawn poller thread")?;

    Ok(PollerHandle {
        shutdown: shutdown_tx,
        events: event_rx,
        thread: Some(thread),
    })
}

impl PollerHandle {
    /// All events received since the last call, oldest first.
    pub fn drain(&self) -> Vec<PollEvent> {
        self.events.try_iter().collect()
    }

    /// Stop the timer and wait for the poll thread to finish. A fetch in
    /// flight is abandoned, so this returns without waiting on the network.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let _ = self.shutdown.send(true);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("poller thread panicked");
            }
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn parses_well_formed_snapshot() {
        let body = r#"[
            {"section": "A", "spot_number": 1, "status": "occupied"},
            {"section": "B2", "spot_number": 7, "status": "available"},
            {"section": "E", "spot_number": 2, "status": "maintenance"}
        ]"#;
        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.malformed, 0);
        assert_eq!(
            snapshot.records,
            vec![
                StatusRecord::new("A", 1, SpotStatus::Occupied),
                StatusRecord::new("B2", 7, SpotStatus::Available),
                StatusRecord::new("E", 2, SpotStatus::Unknown),
            ]
        );
    }

    #[test]
    fn records_missing_fields_are_skipped() {
        let body = r#"[
            {"section": "A", "spot_number": 1},
            {"spot_number": 2, "status": "occupied"},
            {"section": "A", "status": "occupied"},
            {"section": "A", "spot_number": "three", "status": "occupied"},
            {"section": "A", "spot_number": 4, "status": "available"},
            17
        ]"#;
        let snapshot = parse_snapshot(body).unwrap();
        assert_eq!(snapshot.malformed, 5);
        assert_eq!(
            snapshot.records,
            vec![StatusRecord::new("A", 4, SpotStatus::Available)]
        );
    }

    #[test]
    fn non_array_body_is_an_error() {
        assert!(parse_snapshot(r#"{"message": "nope"}"#).is_err());
        assert!(parse_snapshot("not json").is_err());
        assert_eq!(parse_snapshot("[]").unwrap(), ParsedSnapshot::default());
    }

    #[test]
    fn http_source_builds_spots_url() {
        let source = HttpSource::new("http://127.0.0.1:5000/", DEFAULT_TIMEOUT);
        assert_eq!(source.url(), "http://127.0.0.1:5000/spots");
    }

    #[test]
    fn file_source_reads_snapshot() {
        let dir = std::env::temp_dir().join(format!("parkmap-poller-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("spots.json");
        std::fs::write(
            &path,
            r#"[{"section": "D", "spot_number": 3, "status": "occupied"}]"#,
        )
        .unwrap();

        let snapshot = FileSource::new(&path).fetch().unwrap();
        assert_eq!(
            snapshot.records,
            vec![StatusRecord::new("D", 3, SpotStatus::Occupied)]
        );
        assert!(FileSource::new(dir.join("missing.json")).fetch().is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }

    /// Fails every other fetch.
    struct FlakySource {
        calls: AtomicUsize,
    }

    impl SnapshotSource for FlakySource {
        fn fetch(&self) -> Result<ParsedSnapshot> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n % 2 == 1 {
                anyhow::bail!("connection refused");
            }
            Ok(ParsedSnapshot {
                records: vec![StatusRecord::new("A", 1, SpotStatus::Occupied)],
                malformed: 0,
            })
        }

        fn describe(&self) -> String {
            "flaky".to_string()
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_loop() {
        let poller = Poller::new(
            FlakySource {
                calls: AtomicUsize::new(0),
            },
            Duration::from_millis(5),
        );
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut events = Vec::new();
        poller
            .run(shutdown_rx, |event| {
                events.push(event);
                if events.len() == 4 {
                    let _ = shutdown_tx.send(true);
                }
            })
            .await;

        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], PollEvent::Snapshot(_)));
        assert_eq!(events[1], PollEvent::Failed("connection refused".to_string()));
        assert!(matches!(events[2], PollEvent::Snapshot(_)));
    }

    #[tokio::test]
    async fn zero_interval_is_raised_to_a_tick() {
        let poller = Poller::new(
            FlakySource {
                calls: AtomicUsize::new(0),
            },
            Duration::ZERO,
        );
        assert_eq!(poller.interval, MIN_TICK);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut events = 0;
        poller
            .run(shutdown_rx, |_| {
                events += 1;
                if events == 2 {
                    let _ = shutdown_tx.send(true);
                }
            })
            .await;
        assert_eq!(events, 2);
    }

    /// Blocks in `fetch` far longer than any test waits.
    struct SlowSource;

    impl SnapshotSource for SlowSource {
        fn fetch(&self) -> Result<ParsedSnapshot> {
            std::thread::sleep(Duration::from_secs(3));
            Ok(ParsedSnapshot::default())
        }

        fn describe(&self) -> String {
            "slow".to_string()
        }
    }

    #[test]
    fn shutdown_does_not_wait_for_fetch_in_flight() {
        let handle = spawn_background(SlowSource, Duration::from_millis(50), || {}).unwrap();
        std::thread::sleep(Duration::from_millis(200));

        let started = std::time::Instant::now();
        handle.shutdown();
        assert!(
            started.elapsed() < Duration::from_secs(1),
            "shutdown took {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn background_poller_stops_on_shutdown() {
        let handle = spawn_background(
            FlakySource {
                calls: AtomicUsize::new(0),
            },
            Duration::from_millis(5),
            || {},
        )
        .unwrap();

        let mut seen = Vec::new();
        for _ in 0..200 {
            seen.extend(handle.drain());
            if !seen.is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        handle.shutdown();
        assert!(matches!(seen.first(), Some(PollEvent::Snapshot(_))));
    }
}
