use futures::future::try_join_all;
use futures::stream::BoxStream;
use std::future::Future;
use std::sync::Arc;

use crate::clipboard::{Activation, ClipboardAccess, MimeType};
use crate::error::PermissionError;
use crate::permission::{PermissionBroker, PermissionDescriptor, PermissionStatus};

pub const TEXT_COPIED: &str = "Text copied.";
pub const TEXT_PASTED: &str = "Text pasted.";
pub const PASTE_FAILED: &str = "Failed to read clipboard";
pub const FOCUS_READ_FAILED: &str = "Failed to read clipboard when focusing this page";
pub const CHANGE_PREFIX: &str = "Updated clipboard contents: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteOutcome {
    /// New contents for the output field, if the read succeeded
    pub text: Option<String>,
    pub message: String,
}

/// Result of inspecting the clipboard after focus, copy or cut
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inspection {
    /// Plain text to put in the output field
    Text(String),
    /// Plain text was offered but produced no data; the field stays as is
    NoText,
    /// A PNG was materialized (byte length); nothing consumes it yet
    Image(usize),
    /// No usable representation; inspection state goes back to blank
    Nothing,
    /// Failure after the read succeeded, already logged
    Failed,
    /// The clipboard could not be read at all
    ReadFailed,
}

/// Pick the representation to inspect: plain text first, then PNG
pub fn select_representation(types: &[MimeType]) -> Option<MimeType> {
    [MimeType::text_plain(), MimeType::image_png()]
        .into_iter()
        .find(|wanted| types.contains(wanted))
}

/// Clipboard and permission operations behind the demo window.
///
/// Every operation returns a `'static` future so the UI can hand it to its
/// executor and receive the outcome as a message.
#[derive(Clone)]
pub struct Controller {
    clipboard: Arc<dyn ClipboardAccess>,
    permissions: Arc<dyn PermissionBroker>,
}

impl Controller {
    pub fn new(clipboard: Arc<dyn ClipboardAccess>, permissions: Arc<dyn PermissionBroker>) -> Self {
        Self {
            clipboard,
            permissions,
        }
    }

    /// Write `text` to the clipboard; resolves to the toast message
    pub fn copy(&self, text: String) -> impl Future<Output = String> + Send + 'static {
        let clipboard = Arc::clone(&self.clipboard);
        async move {
            match clipboard.write_text(&text, Activation::UserGesture).await {
                Ok(()) => TEXT_COPIED.to_string(),
                Err(e) => {
                    tracing::warn!("Copy failed: {}", e);
                    e.to_string()
                }
            }
        }
    }

    pub fn paste(&self) -> impl Future<Output = PasteOutcome> + Send + 'static {
        let clipboard = Arc::clone(&self.clipboard);
        async move {
            match clipboard.read_text(Activation::UserGesture).await {
                Ok(text) => PasteOutcome {
                    text: Some(text),
                    message: TEXT_PASTED.to_string(),
                },
                Err(e) => {
                    tracing::debug!("Paste failed: {}", e);
                    PasteOutcome {
                        text: None,
                        message: PASTE_FAILED.to_string(),
                    }
                }
            }
        }
    }

    /// Change notifications from the clipboard, if the platform has them
    pub fn clipboard_changes(&self) -> Option<BoxStream<'static, ()>> {
        self.clipboard.watch()
    }

    /// Toast text for a change notification; `None` if the new contents
    /// could not be read
    pub fn clipboard_changed(&self) -> impl Future<Output = Option<String>> + Send + 'static {
        let clipboard = Arc::clone(&self.clipboard);
        async move {
            match clipboard.read_text(Activation::Background).await {
                Ok(text) => Some(format!("{}{}", CHANGE_PREFIX, text)),
                Err(e) => {
                    tracing::warn!("Could not read changed clipboard: {}", e);
                    None
                }
            }
        }
    }

    pub fn inspect(&self) -> impl Future<Output = Inspection> + Send + 'static {
        let clipboard = Arc::clone(&self.clipboard);
        async move {
            let items = match clipboard.read(Activation::Background).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::debug!("Clipboard read on focus failed: {}", e);
                    return Inspection::ReadFailed;
                }
            };
            let Some(item) = items.first() else {
                return Inspection::Nothing;
            };
            let Some(mime) = select_representation(&item.types()) else {
                return Inspection::Nothing;
            };

            let blob = match item.get_type(&mime).await {
                Ok(blob) => blob,
                Err(e) => {
                    tracing::error!("Failed to materialize {}: {}", mime, e);
                    return Inspection::Failed;
                }
            };

            if mime == MimeType::text_plain() {
                match blob.map(|blob| blob.text()).transpose() {
                    Ok(Some(text)) => Inspection::Text(text),
                    Ok(None) => Inspection::NoText,
                    Err(e) => {
                        tracing::error!("Failed to decode clipboard text: {}", e);
                        Inspection::Failed
                    }
                }
            } else {
                let len = blob.map(|blob| blob.bytes.len()).unwrap_or(0);
                tracing::debug!("Clipboard holds a {} byte PNG, ignoring", len);
                Inspection::Image(len)
            }
        }
    }

    /// Query every descriptor concurrently
    pub fn query_permissions(
        &self,
        descriptors: Vec<PermissionDescriptor>,
    ) -> impl Future<Output = Result<Vec<PermissionStatus>, PermissionError>> + Send + 'static {
        let permissions = Arc::clone(&self.permissions);
        async move {
            let queries = descriptors.iter().map(|descriptor| permissions.query(descriptor));
            try_join_all(queries).await
        }
    }

    /// Re-request `descriptor`; resolves to the toast message
    pub fn request_permission(
        &self,
        descriptor: PermissionDescriptor,
    ) -> impl Future<Output = String> + Send + 'static {
        let permissions = Arc::clone(&self.permissions);
        async move {
            match permissions.request(&descriptor).await {
                Ok(status) => format!("Permission {}.", status.state()),
                Err(e) => format!("Permission denied: {}", e),
            }
        }
    }
}
