//! Stats polling for the rolling counters.
//!
//! Fetches `GET {endpoint}/api/v1/stats` on a fixed interval in a background
//! thread and hands each decoded snapshot to the UI thread over a channel.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

/// Timeout for HTTP requests.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest sleep between checks of the running flag.
const SLEEP_STEP: Duration = Duration::from_millis(100);

/// Suffix marking a percentage change entry, as in `programs_delta`.
const DELTA_SUFFIX: &str = "_delta";

/// Counter values and their percentage changes, keyed by stats identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub values: BTreeMap<String, u64>,
    /// Change over the stats window in percent, keyed by the counter id
    /// without the `_delta` suffix.
    pub deltas: BTreeMap<String, f64>,
}

/// Why a poll produced no snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("HTTP error: {0}")]
    Transport(#[from] ureq::Error),
    #[error("JSON parse error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Decode a stats response body.
///
/// `<id>_delta` entries holding a number become deltas for `<id>`. Other
/// entries that are not non-negative integers are skipped.
pub fn decode_stats(body: &str) -> Result<StatsSnapshot, PollError> {
    let map = match serde_json::from_str::<Value>(body)? {
        Value::Object(map) => map,
        other => return Err(PollError::NotAnObject(json_kind(&other))),
    };

    let mut snapshot = StatsSnapshot::default();
    for (key, value) in map {
        if let Some(id) = key.strip_suffix(DELTA_SUFFIX)
            && let Some(delta) = value.as_f64()
        {
            snapshot.deltas.insert(id.to_string(), delta);
            continue;
        }
        match value.as_u64() {
            Some(n) => {
                snapshot.values.insert(key, n);
            }
            None => tracing::debug!(%key, %value, "skipping non-integer stats entry"),
        }
    }
    Ok(snapshot)
}

/// Fetch and decode one snapshot.
pub fn fetch_stats(agent: &ureq::Agent, url: &str) -> Result<StatsSnapshot, PollError> {
    let body = agent.get(url).call()?.body_mut().read_to_string()?;
    decode_stats(&body)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Polls the stats endpoint in a background thread.
#[derive(Debug)]
pub struct StatsPoller {
    url: String,
    interval: Duration,
    /// Flag to signal thread termination.
    running: Arc<RwLock<bool>>,
}

impl StatsPoller {
    pub fn new(url: impl Into<String>, interval: Duration) -> Self {
        Self {
            url: url.into(),
            interval,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Start the polling thread. Snapshots arrive on the returned receiver.
    ///
    /// The first poll happens one interval after start. Failed polls are
    /// logged and dropped; the next interval is the retry.
    pub fn start(&self) -> std::io::Result<Receiver<StatsSnapshot>> {
        let (tx, rx) = mpsc::channel();
        if let Ok(mut running) = self.running.write() {
            if *running {
                // Already polling; the caller gets a channel that never fills.
                return Ok(rx);
            }
            *running = true;
        }

        let url = self.url.clone();
        let interval = self.interval;
        let running = self.running.clone();

        thread::Builder::new()
            .name("stats-poller".to_string())
            .spawn(move || poll_loop(&url, interval, &running, &tx))?;
        Ok(rx)
    }

    /// Stop the polling thread after its current request.
    pub fn stop(&self) {
        if let Ok(mut running) = self.running.write() {
            *running = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.read().map(|r| *r).unwrap_or(false)
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

fn poll_loop(url: &str, interval: Duration, running: &RwLock<bool>, tx: &Sender<StatsSnapshot>) {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(REQUEST_TIMEOUT))
        .build()
        .new_agent();

    let mut next_poll = Instant::now() + interval;
    tracing::info!(%url, interval_ms = interval.as_millis() as u64, "stats polling started");

    loop {
        if !running.read().map(|r| *r).unwrap_or(false) {
            break;
        }

        if Instant::now() >= next_poll {
            match fetch_stats(&agent, url) {
                Ok(snapshot) => {
                    tracing::debug!(entries = snapshot.values.len(), "stats updated");
                    if tx.send(snapshot).is_err() {
                        // Receiver gone: nobody left to update.
                        break;
                    }
                }
                Err(e) => tracing::warn!(error = %e, %url, "stats poll failed"),
            }
            next_poll = next_poll_after(next_poll, Instant::now(), interval);
        }

        thread::sleep(SLEEP_STEP.min(next_poll.saturating_duration_since(Instant::now())));
    }

    tracing::info!(%url, "stats polling stopped");
}

/// When to poll next after a poll scheduled for `scheduled` finished at `now`.
///
/// Keeps the fixed cadence, but a poll that overran its interval is followed
/// by a full interval of rest rather than an immediate retry.
fn next_poll_after(scheduled: Instant, now: Instant, interval: Duration) -> Instant {
    let next = scheduled + interval;
    if next <= now { now + interval } else { next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;

    /// Serve `count` requests with a canned response, returning the base URL.
    fn serve(status: &'static str, body: &'static str, count: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for stream in listener.incoming().take(count) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut line = String::new();
                while reader.read_line(&mut line).unwrap() > 0 {
                    if line == "\r\n" {
                        break;
                    }
                    line.clear();
                }
                write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .unwrap();
            }
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_decode_keeps_integer_entries() {
        let snapshot = decode_stats(
            r#"{"registered_users": 12, "programs": 3, "programs_delta": 0.5, "proofs_verified": -1, "label": "x"}"#,
        )
        .unwrap();

        let expected: BTreeMap<String, u64> = [
            ("programs".to_string(), 3),
            ("registered_users".to_string(), 12),
        ]
        .into_iter()
        .collect();
        assert_eq!(snapshot.values, expected);
    }

    #[test]
    fn test_decode_collects_deltas_by_counter_id() {
        let snapshot = decode_stats(
            r#"{"programs": 3, "programs_delta": 0.123, "proofs_verified_delta": -2, "registered_users_delta": "n/a"}"#,
        )
        .unwrap();

        assert_eq!(snapshot.values.len(), 1);
        assert_eq!(snapshot.deltas.len(), 2);
        assert_eq!(snapshot.deltas.get("programs"), Some(&0.123));
        assert_eq!(snapshot.deltas.get("proofs_verified"), Some(&-2.0));
        assert!(!snapshot.values.contains_key("programs_delta"));
    }

    #[test]
    fn test_next_poll_keeps_cadence() {
        let start = Instant::now();
        let interval = Duration::from_millis(100);
        let scheduled = start + interval;

        let next = next_poll_after(scheduled, scheduled + Duration::from_millis(20), interval);
        assert_eq!(next, scheduled + interval);
    }

    #[test]
    fn test_next_poll_rests_after_slow_fetch() {
        let start = Instant::now();
        let interval = Duration::from_millis(100);
        let scheduled = start + interval;
        let finished = scheduled + Duration::from_millis(300);

        let next = next_poll_after(scheduled, finished, interval);
        assert_eq!(next, finished + interval);
    }

    #[test]
    fn test_decode_rejects_non_objects() {
        assert!(matches!(
            decode_stats("[1, 2]"),
            Err(PollError::NotAnObject("an array"))
        ));
        assert!(matches!(decode_stats("{not json"), Err(PollError::Decode(_))));
    }

    #[test]
    fn test_fetch_stats_from_local_server() {
        let base = serve("200 OK", r#"{"proofs_generated": 4096}"#, 1);
        let agent = ureq::Agent::new_with_defaults();

        let snapshot = fetch_stats(&agent, &format!("{base}/api/v1/stats")).unwrap();
        assert_eq!(snapshot.values.get("proofs_generated"), Some(&4096));
    }

    #[test]
    fn test_fetch_stats_server_error_is_transport_failure() {
        let base = serve("500 Internal Server Error", "{}", 1);
        let agent = ureq::Agent::new_with_defaults();

        let result = fetch_stats(&agent, &format!("{base}/api/v1/stats"));
        assert!(matches!(result, Err(PollError::Transport(_))));
    }

    #[test]
    fn test_poller_delivers_snapshots_until_stopped() {
        let base = serve("200 OK", r#"{"programs": 7}"#, 1);
        let poller = StatsPoller::new(format!("{base}/api/v1/stats"), Duration::from_millis(50));

        let rx = poller.start().unwrap();
        assert!(poller.is_running());
        let snapshot = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(snapshot.values.get("programs"), Some(&7));

        poller.stop();
        assert!(!poller.is_running());
    }

    #[test]
    fn test_poller_survives_unreachable_endpoint() {
        // Nothing listens on this port once the listener is dropped.
        let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
        let poller = StatsPoller::new(
            format!("http://{addr}/api/v1/stats"),
            Duration::from_millis(20),
        );

        let rx = poller.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert!(poller.is_running());
    }
}
