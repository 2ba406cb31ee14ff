use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use std::fmt;
use std::sync::Arc;

use crate::error::ClipboardError;
use crate::permission::{PermissionBroker, PermissionDescriptor, PermissionState, CLIPBOARD_READ, CLIPBOARD_WRITE};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(pub String);

impl MimeType {
    pub fn text_plain() -> Self {
        Self("text/plain".into())
    }

    pub fn image_png() -> Self {
        Self("image/png".into())
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Materialized payload of one representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub mime: MimeType,
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn text(&self) -> Result<String, ClipboardError> {
        String::from_utf8(self.bytes.clone())
            .map_err(|e| ClipboardError::Read(format!("{} is not UTF-8: {}", self.mime, e)))
    }
}

/// Produces the bytes of a representation on demand
pub type Materializer =
    Box<dyn Fn() -> BoxFuture<'static, Result<Option<Vec<u8>>, ClipboardError>> + Send + Sync>;

struct Representation {
    mime: MimeType,
    materialize: Materializer,
}

/// One clipboard payload with its available representations, in platform order
#[derive(Default)]
pub struct ClipboardItem {
    representations: Vec<Representation>,
}

impl ClipboardItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_representation(mut self, mime: MimeType, materialize: Materializer) -> Self {
        self.representations.push(Representation { mime, materialize });
        self
    }

    /// Representation that is already in memory
    pub fn with_bytes(self, mime: MimeType, bytes: Vec<u8>) -> Self {
        let bytes = Arc::new(bytes);
        self.with_representation(
            mime,
            Box::new(move || {
                let bytes = Arc::clone(&bytes);
                Box::pin(async move { Ok(Some(bytes.as_ref().clone())) })
            }),
        )
    }

    pub fn types(&self) -> Vec<MimeType> {
        self.representations.iter().map(|r| r.mime.clone()).collect()
    }

    /// Materialize the representation of type `mime`.
    /// `Ok(None)` when the item has no such representation or it produced no data.
    pub async fn get_type(&self, mime: &MimeType) -> Result<Option<Blob>, ClipboardError> {
        let Some(representation) = self.representations.iter().find(|r| &r.mime == mime) else {
            return Ok(None);
        };
        let bytes = (representation.materialize)().await?;
        Ok(bytes.map(|bytes| Blob {
            mime: mime.clone(),
            bytes,
        }))
    }
}

impl fmt::Debug for ClipboardItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClipboardItem")
            .field("types", &self.types())
            .finish()
    }
}

/// What triggered a clipboard access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// A button press; may turn a `prompt` permission into a request
    UserGesture,
    /// Focus, copy/cut inspection or change notifications; never prompts
    Background,
}

#[async_trait]
pub trait ClipboardAccess: Send + Sync {
    async fn write_text(&self, text: &str, activation: Activation) -> Result<(), ClipboardError>;

    async fn read_text(&self, activation: Activation) -> Result<String, ClipboardError>;

    async fn read(&self, activation: Activation) -> Result<Vec<ClipboardItem>, ClipboardError>;

    /// Change notifications, or `None` when the platform cannot report them
    fn watch(&self) -> Option<BoxStream<'static, ()>>;
}

/// Clipboard that consults the permission broker before every access.
///
/// Only a user gesture turns a `prompt` permission into a request; a
/// background access to a `prompt` permission is rejected and leaves it as is.
pub struct GuardedClipboard {
    inner: Arc<dyn ClipboardAccess>,
    permissions: Arc<dyn PermissionBroker>,
}

impl GuardedClipboard {
    pub fn new(inner: Arc<dyn ClipboardAccess>, permissions: Arc<dyn PermissionBroker>) -> Self {
        Self { inner, permissions }
    }

    async fn ensure(&self, name: &str, activation: Activation) -> Result<(), ClipboardError> {
        let descriptor = PermissionDescriptor::new(name);
        let not_allowed = |state: PermissionState| ClipboardError::NotAllowed {
            permission: name.to_string(),
            state,
        };

        let status = self
            .permissions
            .query(&descriptor)
            .await
            .map_err(|_| not_allowed(PermissionState::Denied))?;
        match status.state() {
            PermissionState::Granted => Ok(()),
            PermissionState::Denied => Err(not_allowed(PermissionState::Denied)),
            PermissionState::Prompt if activation == Activation::Background => {
                Err(not_allowed(PermissionState::Prompt))
            }
            PermissionState::Prompt => {
                let status = self
                    .permissions
                    .request(&descriptor)
                    .await
                    .map_err(|_| not_allowed(PermissionState::Denied))?;
                match status.state() {
                    PermissionState::Granted => Ok(()),
                    state => Err(not_allowed(state)),
                }
            }
        }
    }
}

#[async_trait]
impl ClipboardAccess for GuardedClipboard {
    async fn write_text(&self, text: &str, activation: Activation) -> Result<(), ClipboardError> {
        self.ensure(CLIPBOARD_WRITE, activation).await?;
        self.inner.write_text(text, activation).await
    }

    async fn read_text(&self, activation: Activation) -> Result<String, ClipboardError> {
        self.ensure(CLIPBOARD_READ, activation).await?;
        self.inner.read_text(activation).await
    }

    async fn read(&self, activation: Activation) -> Result<Vec<ClipboardItem>, ClipboardError> {
        self.ensure(CLIPBOARD_READ, activation).await?;
        self.inner.read(activation).await
    }

    fn watch(&self) -> Option<BoxStream<'static, ()>> {
        self.inner.watch()
    }
}
