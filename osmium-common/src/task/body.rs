use std::any::Any;
use std::sync::Arc;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

use crate::error::Error;

/// Type-dependent task payload.
/// ---
/// The raw JSON document is what gets persisted; the decoded payload is
/// produced by the per-type decoder when a task is loaded from the store.
/// A body deserialized straight from storage is undecoded until the codec
/// registry has run over it.
#[derive(Clone)]
pub struct TaskBody {
    raw: serde_json::Value,
    decoded: Option<Arc<dyn Any + Send + Sync>>,
}

impl TaskBody {
    /// Build a body from a typed payload, capturing both the raw document
    /// and the decoded value.
    pub fn new<T>(payload: T) -> Result<Self, Error>
    where
        T: Serialize + Any + Send + Sync,
    {
        let raw = serde_json::to_value(&payload)?;
        Ok(Self {
            raw,
            decoded: Some(Arc::new(payload)),
        })
    }

    /// Wrap a raw document as loaded from the store, not yet decoded.
    pub fn from_raw(raw: serde_json::Value) -> Self {
        Self { raw, decoded: None }
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }

    pub fn is_decoded(&self) -> bool {
        self.decoded.is_some()
    }

    /// Typed view of the decoded payload.
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.decoded.as_ref()?.downcast_ref::<T>()
    }

    pub(crate) fn set_decoded(&mut self, decoded: Arc<dyn Any + Send + Sync>) {
        self.decoded = Some(decoded);
    }
}

impl std::fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBody")
            .field("raw", &self.raw)
            .field("decoded", &self.decoded.is_some())
            .finish()
    }
}

impl PartialEq for TaskBody {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Serialize for TaskBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TaskBody {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Ok(Self::from_raw(raw))
    }
}
