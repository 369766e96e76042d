use std::collections::BTreeMap;
use std::fmt;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

// ---------------------------------------------------------------------------
// Reading: one scalar as the producer sent it
// ---------------------------------------------------------------------------

/// A scalar value pushed by the agent. Producers send plain numbers, numeric
/// strings (`"1.23"`) or text sentinels (`"Temperature sensor not found"`),
/// so the value is kept verbatim and only parsed when arithmetic needs it.
/// Anything else (booleans, arrays, objects) lands in `Other` and never
/// feeds a gauge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Number(n) => Some(*n),
            Reading::Text(s) => s.trim().parse().ok(),
            Reading::Other(_) => None,
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Reading::Other(serde_json::Value::Null))
    }
}

impl From<f64> for Reading {
    fn from(n: f64) -> Self {
        Reading::Number(n)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already prints the shortest form: 1.0 -> "1", 9.6 -> "9.6"
            Reading::Number(n) => write!(f, "{}", n),
            Reading::Text(s) => f.write_str(s),
            Reading::Other(serde_json::Value::Null) => Ok(()),
            Reading::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Render an optional reading; absent values render as empty text.
pub fn show(reading: &Option<Reading>) -> String {
    reading.as_ref().map(|r| r.to_string()).unwrap_or_default()
}

fn num(reading: &Option<Reading>) -> f64 {
    reading.as_ref().and_then(Reading::value).unwrap_or(f64::NAN)
}

// ---------------------------------------------------------------------------
// Canonical snapshot
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cpu {
    pub current: Option<Reading>,
    pub min: Option<Reading>,
    pub max: Option<Reading>,
    pub temperature: Option<Reading>,
    pub processor: Option<String>,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            current: Some(0.0.into()),
            min: Some(0.0.into()),
            max: Some(0.0.into()),
            temperature: Some(0.0.into()),
            processor: None,
        }
    }
}

impl Cpu {
    /// Gauge fraction (0–100 for sane input). Divides by the pushed `max`
    /// when it is present and nonzero, otherwise by `fallback_max`.
    pub fn fraction(&self, fallback_max: f64) -> f64 {
        let divisor = self
            .max
            .as_ref()
            .and_then(Reading::value)
            .filter(|m| *m != 0.0 && !m.is_nan())
            .unwrap_or(fallback_max);
        num(&self.current) / divisor * 100.0
    }
}

/// Memory or storage usage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub percent: Option<Reading>,
    pub total: Option<Reading>,
    pub used: Option<Reading>,
}

impl Default for Usage {
    fn default() -> Self {
        Self {
            percent: Some(0.0.into()),
            total: Some(0.0.into()),
            used: Some(0.0.into()),
        }
    }
}

impl Usage {
    pub fn fraction(&self) -> f64 {
        num(&self.percent)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Uptime {
    #[serde(default)]
    pub days: Option<Reading>,
    #[serde(default)]
    pub hours: Option<Reading>,
    #[serde(default)]
    pub minutes: Option<Reading>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub os: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub os_version: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub uptime: Option<Uptime>,
}

pub type LogStatus = BTreeMap<String, Reading>;

/// Full system status as last pushed by the agent. Always replaced whole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusSnapshot {
    pub cpu: Cpu,
    pub memory: Usage,
    pub storage: Usage,
    pub system_info: Option<SystemInfo>,
    pub log_status: Option<LogStatus>,
    pub sequence: Option<u64>,
}

impl StatusSnapshot {
    /// View counter for a monitored site, empty when the agent sent none.
    pub fn log_entry(&self, key: &str) -> String {
        self.log_status
            .as_ref()
            .and_then(|m| m.get(key))
            .map(|r| r.to_string())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

// Agents disagree on the memory/storage layout: some nest
// `memory.{percent,total,used}`, older ones flatten to `memory_percent` etc.
// Everything below is all-optional so any mix deserializes. A field of the
// wrong JSON type reads as absent instead of failing the whole snapshot.

/// Deserialize `T`, or `None` when the value has an unexpected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(err) => {
            debug!(error = %err, "ignoring status field of unexpected type");
            Ok(None)
        }
    }
}

#[derive(Deserialize, Default)]
struct WireSnapshot {
    #[serde(default, alias = "seq", deserialize_with = "lenient")]
    sequence: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    cpu: Option<WireCpu>,
    #[serde(default, deserialize_with = "lenient")]
    memory: Option<WireUsage>,
    #[serde(default, deserialize_with = "lenient")]
    storage: Option<WireUsage>,
    memory_percent: Option<Reading>,
    memory_total: Option<Reading>,
    memory_used: Option<Reading>,
    storage_percent: Option<Reading>,
    storage_total: Option<Reading>,
    storage_used: Option<Reading>,
    #[serde(default, deserialize_with = "lenient")]
    system_info: Option<SystemInfo>,
    #[serde(default, deserialize_with = "lenient")]
    log_status: Option<LogStatus>,
}

#[derive(Deserialize, Default)]
struct WireCpu {
    current: Option<Reading>,
    min: Option<Reading>,
    max: Option<Reading>,
    temperature: Option<Reading>,
    #[serde(default, deserialize_with = "lenient")]
    processor: Option<String>,
}

#[derive(Deserialize, Default)]
struct WireUsage {
    percent: Option<Reading>,
    total: Option<Reading>,
    used: Option<Reading>,
}

/// Normalize a `status_update` payload into the canonical nested snapshot.
///
/// No range checks happen here: values go through verbatim, and fields of
/// an unexpected type read as absent. Only a payload that is not a JSON
/// object fails.
pub fn normalize(payload: serde_json::Value) -> Result<StatusSnapshot, serde_json::Error> {
    if !payload.is_object() {
        return Err(serde_json::Error::custom("status payload is not a JSON object"));
    }
    let wire: WireSnapshot = serde_json::from_value(payload)?;
    // A null counter means the agent has nothing for that site
    let log_status = wire
        .log_status
        .map(|m| m.into_iter().filter(|(_, r)| !r.is_null()).collect());

    let cpu = wire
        .cpu
        .map(|c| Cpu {
            current: c.current,
            min: c.min,
            max: c.max,
            temperature: c.temperature,
            processor: c.processor,
        })
        .unwrap_or(Cpu {
            current: None,
            min: None,
            max: None,
            temperature: None,
            processor: None,
        });

    let memory = usage(wire.memory, wire.memory_percent, wire.memory_total, wire.memory_used);
    let storage = usage(
        wire.storage,
        wire.storage_percent,
        wire.storage_total,
        wire.storage_used,
    );

    Ok(StatusSnapshot {
        cpu,
        memory,
        storage,
        system_info: wire.system_info,
        log_status,
        sequence: wire.sequence,
    })
}

fn usage(
    nested: Option<WireUsage>,
    percent: Option<Reading>,
    total: Option<Reading>,
    used: Option<Reading>,
) -> Usage {
    match nested {
        Some(n) => Usage {
            percent: n.percent,
            total: n.total,
            used: n.used,
        },
        None => Usage {
            percent,
            total,
            used,
        },
    }
}
