use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::task::{FatalTaskHandler, Task, TaskHandler, TaskRegistrator};

/// Decodes a raw body document into the typed payload for one task type.
pub type BodyDecoderFn =
    Arc<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Any + Send + Sync>, Error> + Send + Sync>;

/// Immutable per-type maps wired up once at boot.
/// ---
/// Holds the body decoders, the handlers, the fatal handlers and the
/// registrators, keyed by task type. Built through [`TaskRegistryBuilder`]
/// during startup and shared as an `Arc` afterwards; nothing registers
/// at runtime.
pub struct TaskRegistry {
    decoders: HashMap<String, BodyDecoderFn>,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    fatal_handlers: HashMap<String, Arc<dyn FatalTaskHandler>>,
    registrators: HashMap<String, Arc<dyn TaskRegistrator>>,
}

impl TaskRegistry {
    pub fn builder() -> TaskRegistryBuilder {
        TaskRegistryBuilder::default()
    }

    /// Decode the task's body through the decoder registered for its type.
    /// ---
    /// Fails with [`Error::UnknownTaskType`] when no decoder is registered,
    /// so stored records of retired or foreign types never load silently.
    pub fn decode_body(&self, task: &mut Task) -> Result<(), Error> {
        let decoder = self
            .decoders
            .get(&task.task_type)
            .ok_or_else(|| Error::UnknownTaskType(task.task_type.clone()))?;

        let decoded = decoder(task.body.raw())?;
        task.body.set_decoded(decoded);

        Ok(())
    }

    pub fn handler(&self, task_type: &str) -> Option<&Arc<dyn TaskHandler>> {
        self.handlers.get(task_type)
    }

    pub fn fatal_handler(&self, task_type: &str) -> Option<&Arc<dyn FatalTaskHandler>> {
        self.fatal_handlers.get(task_type)
    }

    pub fn registrators(&self) -> impl Iterator<Item = (&str, &Arc<dyn TaskRegistrator>)> {
        self.registrators.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskRegistry")
            .field("decoders", &self.decoders.keys().collect::<Vec<_>>())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field(
                "fatal_handlers",
                &self.fatal_handlers.keys().collect::<Vec<_>>(),
            )
            .field("registrators", &self.registrators.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct TaskRegistryBuilder {
    decoders: HashMap<String, BodyDecoderFn>,
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
    fatal_handlers: HashMap<String, Arc<dyn FatalTaskHandler>>,
    registrators: HashMap<String, Arc<dyn TaskRegistrator>>,
}

impl TaskRegistryBuilder {
    pub fn decoder(mut self, task_type: impl Into<String>, decoder: BodyDecoderFn) -> Self {
        self.decoders.insert(task_type.into(), decoder);
        self
    }

    /// Register a serde-based decoder for a payload type.
    pub fn payload_type<T>(self, task_type: impl Into<String>) -> Self
    where
        T: DeserializeOwned + Any + Send + Sync,
    {
        let decoder: BodyDecoderFn = Arc::new(|raw: &serde_json::Value| {
            let payload: T = serde_json::from_value(raw.clone())?;
            Ok(Arc::new(payload) as Arc<dyn Any + Send + Sync>)
        });
        self.decoder(task_type, decoder)
    }

    pub fn handler(mut self, task_type: impl Into<String>, handler: Arc<dyn TaskHandler>) -> Self {
        self.handlers.insert(task_type.into(), handler);
        self
    }

    pub fn fatal_handler(
        mut self,
        task_type: impl Into<String>,
        handler: Arc<dyn FatalTaskHandler>,
    ) -> Self {
        self.fatal_handlers.insert(task_type.into(), handler);
        self
    }

    pub fn registrator(
        mut self,
        task_type: impl Into<String>,
        registrator: Arc<dyn TaskRegistrator>,
    ) -> Self {
        self.registrators.insert(task_type.into(), registrator);
        self
    }

    pub fn build(self) -> TaskRegistry {
        TaskRegistry {
            decoders: self.decoders,
            handlers: self.handlers,
            fatal_handlers: self.fatal_handlers,
            registrators: self.registrators,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskBody;
    use serde::Deserialize;
    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Deserialize, serde::Serialize)]
    struct SyncPayload {
        target: String,
    }

    fn registry() -> TaskRegistry {
        TaskRegistry::builder()
            .payload_type::<SyncPayload>("sync")
            .build()
    }

    #[test]
    fn decode_body_produces_typed_payload() {
        let registry = registry();
        let mut task = Task::new(
            Uuid::new_v4(),
            "sync",
            TaskBody::from_raw(json!({"target": "alpha"})),
        );

        registry.decode_body(&mut task).unwrap();

        assert_eq!(task.body.payload::<SyncPayload>().unwrap().target, "alpha");
    }

    #[test]
    fn decode_body_rejects_unknown_type() {
        let registry = registry();
        let mut task = Task::new(Uuid::new_v4(), "unheard_of", TaskBody::from_raw(json!({})));

        let err = registry.decode_body(&mut task).unwrap_err();

        assert!(matches!(err, Error::UnknownTaskType(t) if t == "unheard_of"));
    }

    #[test]
    fn decode_body_rejects_malformed_payload() {
        let registry = registry();
        let mut task = Task::new(
            Uuid::new_v4(),
            "sync",
            TaskBody::from_raw(json!({"target": 17})),
        );

        let err = registry.decode_body(&mut task).unwrap_err();

        assert!(matches!(err, Error::Serialization(_)));
    }
}
