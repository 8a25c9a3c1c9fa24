//! Wire types exchanged with dashboard clients.
//!
//! Requests look like `{"command": "get_telemetry"}`; replies carry the joint
//! map plus the two electrical readings.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// The only command the server answers.
pub const GET_TELEMETRY: &str = "get_telemetry";

/// Decoded client request. Fields other than `command` are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub command: Option<String>,
}

/// What a request asks the server to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    GetTelemetry,
    /// Any other command string; gets no reply.
    Unknown(String),
    /// The object had no `command` field.
    Missing,
}

impl Request {
    /// Parse a text frame. `None` means the frame is not a JSON object of the
    /// expected shape and should be dropped.
    pub fn parse(text: &str) -> Option<Self> {
        let value: serde_json::Value = serde_json::from_str(text).ok()?;
        // Structs also deserialize from arrays; only objects are requests.
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    pub fn command(&self) -> Command {
        match self.command.as_deref() {
            Some(GET_TELEMETRY) => Command::GetTelemetry,
            Some(other) => Command::Unknown(other.to_string()),
            None => Command::Missing,
        }
    }
}

/// Joint name to angle (degrees), kept in wire order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointAngles(Vec<(String, i32)>);

#[cfg(test)]
impl JointAngles {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(name, angle)| (name.as_str(), *angle))
    }
}

impl FromIterator<(String, i32)> for JointAngles {
    fn from_iter<T: IntoIterator<Item = (String, i32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for JointAngles {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, angle) in &self.0 {
            map.serialize_entry(name, angle)?;
        }
        map.end()
    }
}

/// One telemetry reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    /// Angle (degrees) of every joint
    pub joints: JointAngles,
    /// Battery voltage (V)
    pub voltage: f64,
    /// Current draw (A)
    pub current: f64,
}

impl TelemetrySnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
