//! Run configuration: the execution mode and knobs read once at the process
//! boundary and handed to the orchestrator.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// How a run treats the stored snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Replay the recording and compare against the stored snapshot,
    /// retrying at decreasing speeds.
    #[default]
    Test,
    /// Record a new session and refresh the stored snapshot from the result.
    Record,
    /// Build the fixture and hand the subject to the user, then compare the
    /// result against the stored snapshot once. Nothing is written.
    Sandbox,
    /// Replay once at normal speed and overwrite the stored snapshot.
    UpdateSnapshot,
}

impl Mode {
    /// Parse the value of the `MODE` variable. Empty means [`Mode::Test`].
    pub fn from_env_value(value: &str) -> Result<Self, ConfigError> {
        match value {
            "" | "test" => Ok(Mode::Test),
            "record" => Ok(Mode::Record),
            "updateSnapshot" => Ok(Mode::UpdateSnapshot),
            "sandbox" => Ok(Mode::Sandbox),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }

    /// Whether the stored snapshot is overwritten after the subject exits.
    pub fn writes_snapshot(self) -> bool {
        matches!(self, Mode::Record | Mode::UpdateSnapshot)
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::from_env_value(s)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Test => "test",
            Mode::Record => "record",
            Mode::Sandbox => "sandbox",
            Mode::UpdateSnapshot => "updateSnapshot",
        };
        f.write_str(name)
    }
}

/// Parse a boolean setting using git-config rules.
///
/// Unset or empty is false; `true`/`yes`/`on` and non-zero integers are
/// true; `false`/`no`/`off` and zero are false. Anything else is an error.
pub fn parse_bool(var: &str, value: Option<&str>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    let s = value.trim();
    if s.is_empty() {
        return Ok(false);
    }
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => match s.parse::<i64>() {
            Ok(n) => Ok(n != 0),
            Err(_) => Err(ConfigError::InvalidBool {
                var: var.to_string(),
                value: s.to_string(),
            }),
        },
    }
}

/// Parse an explicit speed override. Empty means no override.
pub fn parse_speed(value: Option<&str>) -> Result<Option<f64>, ConfigError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse::<f64>()
            .ok()
            .filter(|speed| speed.is_finite() && *speed > 0.0)
            .map(Some)
            .ok_or_else(|| ConfigError::InvalidSpeed(s.to_string())),
    }
}

/// Everything about a run that used to be read from the environment ad hoc.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    /// Execution mode for every test in the run.
    pub mode: Mode,
    /// Explicit playback speed; only honoured in [`Mode::Test`].
    pub speed_override: Option<f64>,
    /// Run tests marked `skip` anyway.
    pub include_skipped: bool,
    /// Number of shards the catalog is split into.
    pub parallel_total: usize,
    /// Which shard this run executes (`index % total == parallel_index`).
    pub parallel_index: usize,
    /// When non-empty, only tests with these names are selected.
    pub only: Vec<String>,
}

impl Default for RunConfiguration {
    fn default() -> Self {
        Self {
            mode: Mode::Test,
            speed_override: None,
            include_skipped: false,
            parallel_total: 1,
            parallel_index: 0,
            only: Vec::new(),
        }
    }
}

impl RunConfiguration {
    /// Read `MODE`, `SPEED`, `INCLUDE_SKIPPED`, `PARALLEL_TOTAL` and
    /// `PARALLEL_INDEX` from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = Mode::from_env_value(lookup("MODE").as_deref().unwrap_or(""))?;
        // Only test mode honours the override, so only test mode validates it.
        let speed_override = match mode {
            Mode::Test => parse_speed(lookup("SPEED").as_deref())?,
            _ => None,
        };
        let include_skipped = parse_bool("INCLUDE_SKIPPED", lookup("INCLUDE_SKIPPED").as_deref())?;

        // Unparsable shard settings fall back to running everything.
        let parallel_total = lookup("PARALLEL_TOTAL")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);
        let parallel_index = lookup("PARALLEL_INDEX")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        Ok(Self {
            mode,
            speed_override,
            include_skipped,
            parallel_total,
            parallel_index,
            only: Vec::new(),
        })
    }

    /// Whether the test at catalog position `index` belongs to this shard.
    pub fn in_shard(&self, index: usize) -> bool {
        let total = self.parallel_total.max(1);
        index % total == self.parallel_index
    }
}
