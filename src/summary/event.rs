use serde::{Serialize, Deserialize};

/// One line of an events file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Seconds since the Unix epoch when the event was written.
    pub wall_time: f64,
    pub step: u64,
    pub tag: String,
    #[serde(flatten)]
    pub value: EventValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventValue {
    Scalar { value: f64 },
    /// PNG stored next to the events file; `path` is relative to the run directory.
    Image { path: String, width: u32, height: u32 },
}

impl Event {
    pub fn scalar_value(&self) -> Option<f64> {
        match self.value {
            EventValue::Scalar { value } => Some(value),
            EventValue::Image { .. } => None,
        }
    }
}
