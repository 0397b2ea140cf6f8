//! Append-only access log with size-triggered rotation.
//!
//! One line per request:
//!
//! ```text
//! [2026-10-19 08:15:02] 192.168.1.20 - GET /posts/hello - 200 - "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KH..."
//! ```
//!
//! The URI is logged as it arrived, still percent-encoded, and control
//! characters never reach the file, so a client cannot split an entry.
//!
//! Before each append the active file's size is checked. At or above the
//! threshold it is copied over `access.old` and removed, so the new line
//! starts a fresh file. Exactly one previous generation is kept.
//!
//! Rotation runs inline with the request that crosses the threshold. The
//! step is exposed as [`AccessLog::rotate_if_needed`] so callers can also run
//! it on their own schedule.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use percent_encoding::{utf8_percent_encode, CONTROLS};
use tracing::{debug, error, info, warn};

use crate::request::Request;
use crate::status::Status;
use crate::storage::{Storage, StorageError};

pub const LOG_PATH: &str = "/logs/access.log";
pub const ROTATED_PATH: &str = "/logs/access.old";

const USER_AGENT_MAX: usize = 60;
/// Anything earlier means the host clock was never set.
const MIN_VALID_EPOCH: i64 = 1_000_000_000;

// ── Clock ─────────────────────────────────────────────────────────────────────

/// Time source for log timestamps.
pub trait Clock: Send + Sync {
    /// Local wall-clock time, or `None` while the clock is unset.
    fn wall(&self) -> Option<NaiveDateTime>;

    /// Time since the process started.
    fn uptime(&self) -> Duration;
}

/// The host clock.
pub struct SystemClock {
    started: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self { started: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self { Self::new() }
}

impl Clock for SystemClock {
    fn wall(&self) -> Option<NaiveDateTime> {
        let now = Local::now();
        (now.timestamp() > MIN_VALID_EPOCH).then(|| now.naive_local())
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// `YYYY-MM-DD HH:MM:SS` when the wall clock is known, else uptime as `Dd Hh Mm Ss`.
pub fn timestamp(clock: &dyn Clock) -> String {
    match clock.wall() {
        Some(now) => now.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => format_uptime(clock.uptime()),
    }
}

pub fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{}d {}h {}m {}s",
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60,
    )
}

// ── AccessLog ─────────────────────────────────────────────────────────────────

/// The access log file and its rotation policy.
pub struct AccessLog {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    max_size: u64,
    enabled: bool,
    // rotate + append must not interleave between requests
    writer: Mutex<()>,
}

impl AccessLog {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, max_size: u64) -> Self {
        Self { storage, clock, max_size, enabled: true, writer: Mutex::new(()) }
    }

    /// A log that formats nothing and writes nothing.
    pub fn disabled(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>) -> Self {
        Self { enabled: false, ..Self::new(storage, clock, 0) }
    }

    /// The line [`record`](Self::record) would append, newline included.
    pub fn entry(&self, req: &Request, status: Status) -> String {
        let client = req.remote_addr()
            .map(|addr| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_owned());
        format!(
            "[{}] {} - {} {} - {} - \"{}\"\n",
            timestamp(self.clock.as_ref()),
            client,
            req.method(),
            utf8_percent_encode(req.raw_path(), CONTROLS),
            status.code(),
            user_agent(req.header_value("user-agent")),
        )
    }

    /// Appends one line for `req`, rotating first if the file is full.
    ///
    /// Failures are reported through `tracing` and never reach the client.
    pub fn record(&self, req: &Request, status: Status) {
        if !self.enabled {
            return;
        }
        let line = self.entry(req, status);
        debug!(entry = line.trim_end(), "access");

        let _guard = self.writer.lock();
        if let Err(e) = self.rotate_if_needed() {
            warn!(error = %e, "log rotation failed");
        }
        if let Err(e) = self.storage.append(LOG_PATH, line.as_bytes()) {
            error!(error = %e, "could not append to access log");
        }
    }

    /// Moves the active log to [`ROTATED_PATH`] once it reaches the size
    /// threshold. Returns whether a rotation happened.
    pub fn rotate_if_needed(&self) -> Result<bool, StorageError> {
        let size = match self.storage.size(LOG_PATH) {
            Ok(size) => size,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        if size < self.max_size {
            return Ok(false);
        }

        self.storage.copy(LOG_PATH, ROTATED_PATH)?;
        self.storage.remove(LOG_PATH)?;
        info!(size, "rotated access.log to access.old");
        Ok(true)
    }

    /// The last `n` lines of the active log, or `None` if there is no log yet.
    pub fn tail(&self, n: usize) -> Option<Tail> {
        let text = self.storage.read_string(LOG_PATH).ok()?;
        let lines: Vec<&str> = text.lines().collect();
        let skip = lines.len().saturating_sub(n);
        Some(Tail {
            size: text.len() as u64,
            total: lines.len(),
            lines: lines[skip..].iter().map(|l| (*l).to_owned()).collect(),
        })
    }
}

/// The end of the log, for the admin viewer.
#[derive(Debug)]
pub struct Tail {
    pub size: u64,
    /// Lines in the whole file.
    pub total: usize,
    pub lines: Vec<String>,
}

impl Tail {
    pub fn is_truncated(&self) -> bool {
        self.lines.len() < self.total
    }
}

fn user_agent(raw: Option<&str>) -> String {
    let ua = match raw {
        None | Some("") => return "-".to_owned(),
        Some(ua) => ua,
    };
    let mut out: String = ua.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    if out.chars().count() > USER_AGENT_MAX {
        out = out.chars().take(USER_AGENT_MAX - 3).collect();
        out.push_str("...");
    }
    out
}
