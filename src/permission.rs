use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use crate::error::PermissionError;

pub const CLIPBOARD_READ: &str = "clipboard-read";
pub const CLIPBOARD_WRITE: &str = "clipboard-write";

/// Permission names the broker knows how to track
const SUPPORTED_PERMISSIONS: &[&str] = &[CLIPBOARD_READ, CLIPBOARD_WRITE];

/// Names a requestable permission, optionally narrowed to a gesture-dependent variant
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_without_gesture: Option<bool>,
}

impl PermissionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            allow_without_gesture: None,
        }
    }

    pub fn with_gesture_flag(name: impl Into<String>, allow_without_gesture: bool) -> Self {
        Self {
            name: name.into(),
            allow_without_gesture: Some(allow_without_gesture),
        }
    }

    /// Short label for the permission button: the segment after the last hyphen,
    /// plus the gesture variant when the descriptor carries one.
    pub fn display_name(&self) -> String {
        let mut label = self
            .name
            .rsplit('-')
            .next()
            .unwrap_or(self.name.as_str())
            .to_string();
        match self.allow_without_gesture {
            Some(true) => label.push_str(" (without gesture)"),
            Some(false) => label.push_str(" (with gesture)"),
            None => {}
        }
        label
    }
}

impl fmt::Display for PermissionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.allow_without_gesture {
            Some(flag) => write!(f, "{} (allowWithoutGesture={})", self.name, flag),
            None => write!(f, "{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionState {
    Granted,
    Denied,
    Prompt,
}

impl fmt::Display for PermissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = match self {
            PermissionState::Granted => "granted",
            PermissionState::Denied => "denied",
            PermissionState::Prompt => "prompt",
        };
        f.write_str(word)
    }
}

/// Live handle on the grant state of one descriptor
#[derive(Debug, Clone)]
pub struct PermissionStatus {
    descriptor: PermissionDescriptor,
    receiver: watch::Receiver<PermissionState>,
}

impl PermissionStatus {
    fn new(descriptor: PermissionDescriptor, receiver: watch::Receiver<PermissionState>) -> Self {
        Self {
            descriptor,
            receiver,
        }
    }

    pub fn descriptor(&self) -> &PermissionDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> PermissionState {
        *self.receiver.borrow()
    }

    /// Every state the permission moves to after this call.
    /// The stream ends when the broker is dropped.
    pub fn changes(&self) -> BoxStream<'static, PermissionState> {
        let mut receiver = self.receiver.clone();
        receiver.mark_unchanged();
        stream::unfold(receiver, |mut receiver| async move {
            receiver.changed().await.ok()?;
            let state = *receiver.borrow_and_update();
            Some((state, receiver))
        })
        .boxed()
    }
}

#[async_trait]
pub trait PermissionBroker: Send + Sync {
    async fn query(
        &self,
        descriptor: &PermissionDescriptor,
    ) -> Result<PermissionStatus, PermissionError>;

    async fn request(
        &self,
        descriptor: &PermissionDescriptor,
    ) -> Result<PermissionStatus, PermissionError>;
}

/// In-process permission registry.
///
/// A `prompt` permission is granted by the first request (the click is the
/// consent); a `denied` one rejects every request.
pub struct LocalPermissions {
    initial_states: HashMap<String, PermissionState>,
    states: Mutex<HashMap<PermissionDescriptor, watch::Sender<PermissionState>>>,
}

impl LocalPermissions {
    pub fn new(initial_states: HashMap<String, PermissionState>) -> Self {
        Self {
            initial_states,
            states: Mutex::new(HashMap::new()),
        }
    }

    fn default_state(&self, name: &str) -> PermissionState {
        self.initial_states
            .get(name)
            .copied()
            .unwrap_or(match name {
                CLIPBOARD_WRITE => PermissionState::Granted,
                _ => PermissionState::Prompt,
            })
    }

    /// Run `f` on the channel for `descriptor`, creating it on first use
    fn with_channel<T>(
        &self,
        descriptor: &PermissionDescriptor,
        f: impl FnOnce(&watch::Sender<PermissionState>) -> T,
    ) -> Result<T, PermissionError> {
        if !SUPPORTED_PERMISSIONS.contains(&descriptor.name.as_str()) {
            return Err(PermissionError::Unsupported(descriptor.name.clone()));
        }
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = states
            .entry(descriptor.clone())
            .or_insert_with(|| watch::channel(self.default_state(&descriptor.name)).0);
        Ok(f(sender))
    }

    /// Force a state, notifying every live status handle
    #[cfg(test)]
    pub fn set_state(&self, descriptor: &PermissionDescriptor, state: PermissionState) {
        let _ = self.with_channel(descriptor, |sender| sender.send_replace(state));
    }
}

impl Default for LocalPermissions {
    fn default() -> Self {
        Self::new(HashMap::new())
    }
}

#[async_trait]
impl PermissionBroker for LocalPermissions {
    async fn query(
        &self,
        descriptor: &PermissionDescriptor,
    ) -> Result<PermissionStatus, PermissionError> {
        let receiver = self.with_channel(descriptor, |sender| sender.subscribe())?;
        tracing::debug!("Queried {}: {}", descriptor, *receiver.borrow());
        Ok(PermissionStatus::new(descriptor.clone(), receiver))
    }

    async fn request(
        &self,
        descriptor: &PermissionDescriptor,
    ) -> Result<PermissionStatus, PermissionError> {
        let outcome = self.with_channel(descriptor, |sender| {
            let current = *sender.borrow();
            match current {
                PermissionState::Denied => Err(PermissionError::NotAllowed),
                PermissionState::Prompt => {
                    sender.send_replace(PermissionState::Granted);
                    Ok(sender.subscribe())
                }
                PermissionState::Granted => Ok(sender.subscribe()),
            }
        })?;

        match outcome {
            Ok(receiver) => {
                tracing::info!("Request for {} resolved: {}", descriptor, *receiver.borrow());
                Ok(PermissionStatus::new(descriptor.clone(), receiver))
            }
            Err(err) => {
                tracing::info!("Request for {} rejected: {}", descriptor, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_uses_last_segment() {
        assert_eq!(PermissionDescriptor::new(CLIPBOARD_READ).display_name(), "read");
        assert_eq!(PermissionDescriptor::new(CLIPBOARD_WRITE).display_name(), "write");
        assert_eq!(PermissionDescriptor::new("notifications").display_name(), "notifications");
    }

    #[test]
    fn test_display_name_gesture_variants() {
        let with = PermissionDescriptor::with_gesture_flag(CLIPBOARD_READ, false);
        let without = PermissionDescriptor::with_gesture_flag(CLIPBOARD_WRITE, true);
        assert_eq!(with.display_name(), "read (with gesture)");
        assert_eq!(without.display_name(), "write (without gesture)");
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_string(&PermissionState::Prompt).unwrap();
        assert_eq!(json, "\"prompt\"");
        let state: PermissionState = serde_json::from_str("\"denied\"").unwrap();
        assert_eq!(state, PermissionState::Denied);
        assert_eq!(PermissionState::Granted.to_string(), "granted");
    }

    #[test]
    fn test_descriptor_deserializes_without_gesture_flag() {
        let descriptor: PermissionDescriptor =
            serde_json::from_str(r#"{"name":"clipboard-read"}"#).unwrap();
        assert_eq!(descriptor, PermissionDescriptor::new(CLIPBOARD_READ));
    }

    #[tokio::test]
    async fn test_query_reports_defaults() {
        let broker = LocalPermissions::default();
        let read = broker.query(&PermissionDescriptor::new(CLIPBOARD_READ)).await.unwrap();
        let write = broker.query(&PermissionDescriptor::new(CLIPBOARD_WRITE)).await.unwrap();
        assert_eq!(read.state(), PermissionState::Prompt);
        assert_eq!(write.state(), PermissionState::Granted);
    }

    #[tokio::test]
    async fn test_query_unsupported_name() {
        let broker = LocalPermissions::default();
        let err = broker
            .query(&PermissionDescriptor::new("camera"))
            .await
            .unwrap_err();
        assert_eq!(err, PermissionError::Unsupported("camera".into()));
    }

    #[tokio::test]
    async fn test_request_grants_prompt_and_notifies() {
        let broker = LocalPermissions::default();
        let descriptor = PermissionDescriptor::new(CLIPBOARD_READ);
        let status = broker.query(&descriptor).await.unwrap();
        let mut changes = status.changes();

        let granted = broker.request(&descriptor).await.unwrap();
        assert_eq!(granted.state(), PermissionState::Granted);
        assert_eq!(status.state(), PermissionState::Granted);
        assert_eq!(changes.next().await, Some(PermissionState::Granted));
    }

    #[tokio::test]
    async fn test_request_denied_rejects() {
        let broker = LocalPermissions::new(HashMap::from([(
            CLIPBOARD_READ.to_string(),
            PermissionState::Denied,
        )]));
        let err = broker
            .request(&PermissionDescriptor::new(CLIPBOARD_READ))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "NotAllowedError");
    }

    #[tokio::test]
    async fn test_gesture_variants_are_tracked_separately() {
        let broker = LocalPermissions::default();
        let plain = PermissionDescriptor::new(CLIPBOARD_READ);
        let gesture = PermissionDescriptor::with_gesture_flag(CLIPBOARD_READ, false);

        broker.request(&gesture).await.unwrap();
        assert_eq!(broker.query(&gesture).await.unwrap().state(), PermissionState::Granted);
        assert_eq!(broker.query(&plain).await.unwrap().state(), PermissionState::Prompt);
    }

    #[tokio::test]
    async fn test_changes_skip_current_state() {
        let broker = LocalPermissions::default();
        let descriptor = PermissionDescriptor::new(CLIPBOARD_WRITE);
        let status = broker.query(&descriptor).await.unwrap();
        let mut changes = status.changes();

        broker.set_state(&descriptor, PermissionState::Denied);
        assert_eq!(changes.next().await, Some(PermissionState::Denied));
    }

    #[tokio::test]
    async fn test_changes_ignore_updates_before_subscribing() {
        let broker = LocalPermissions::default();
        let descriptor = PermissionDescriptor::new(CLIPBOARD_READ);
        let status = broker.query(&descriptor).await.unwrap();

        broker.set_state(&descriptor, PermissionState::Denied);
        let mut changes = status.changes();
        broker.set_state(&descriptor, PermissionState::Granted);
        assert_eq!(changes.next().await, Some(PermissionState::Granted));
    }
}
