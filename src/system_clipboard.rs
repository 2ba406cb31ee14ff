use arboard::{Clipboard, ImageData};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::clipboard::{Activation, ClipboardAccess, ClipboardItem, MimeType};
use crate::error::ClipboardError;

/// Image bytes that take part in the change fingerprint
const FINGERPRINT_PREFIX: usize = 4096;

/// The OS clipboard through arboard.
///
/// One `Clipboard` handle lives as long as this value. On X11 and Wayland the
/// handle owns the selection, so dropping it after a write would take the
/// copied text with it. arboard calls block, so each one runs on the blocking
/// pool while holding the shared handle.
pub struct SystemClipboard {
    clipboard: Arc<Mutex<Option<Clipboard>>>,
    watch_interval: Option<Duration>,
}

impl SystemClipboard {
    /// `watch_interval` of `None` disables change notifications
    pub fn new(watch_interval: Option<Duration>) -> Self {
        Self {
            clipboard: Arc::new(Mutex::new(None)),
            watch_interval,
        }
    }

    async fn with_clipboard<T, F>(&self, f: F) -> Result<T, ClipboardError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Clipboard) -> Result<T, ClipboardError> + Send + 'static,
    {
        with_shared(Arc::clone(&self.clipboard), f).await
    }
}

/// Run `f` on the blocking pool against the shared handle, opening it on first use
async fn with_shared<T, F>(shared: Arc<Mutex<Option<Clipboard>>>, f: F) -> Result<T, ClipboardError>
where
    T: Send + 'static,
    F: FnOnce(&mut Clipboard) -> Result<T, ClipboardError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
        let clipboard = match guard.take() {
            Some(clipboard) => clipboard,
            None => {
                let clipboard =
                    Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
                tracing::debug!("Opened system clipboard");
                clipboard
            }
        };
        f(guard.insert(clipboard))
    })
    .await
    .map_err(|e| ClipboardError::Task(e.to_string()))?
}

/// `Ok(None)` when the clipboard simply holds nothing of that kind
fn available<T>(result: Result<T, arboard::Error>) -> Result<Option<T>, ClipboardError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(arboard::Error::ContentNotAvailable) => Ok(None),
        Err(e) => Err(ClipboardError::Read(e.to_string())),
    }
}

/// A clipboard image that cannot be read counts as no image
fn image_or_absent(result: Result<ImageData<'_>, arboard::Error>) -> Option<RawImage> {
    match available(result) {
        Ok(image) => image.map(|image| RawImage {
            width: image.width,
            height: image.height,
            rgba: image.bytes.into_owned(),
        }),
        Err(e) => {
            tracing::error!("Failed to read clipboard image: {}", e);
            None
        }
    }
}

struct RawImage {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

fn encode_png(image: &RawImage) -> Result<Vec<u8>, ClipboardError> {
    let width = u32::try_from(image.width).map_err(|e| ClipboardError::Encode(e.to_string()))?;
    let height = u32::try_from(image.height).map_err(|e| ClipboardError::Encode(e.to_string()))?;

    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder
        .write_header()
        .map_err(|e| ClipboardError::Encode(e.to_string()))?;
    writer
        .write_image_data(&image.rgba)
        .map_err(|e| ClipboardError::Encode(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| ClipboardError::Encode(e.to_string()))?;
    Ok(out)
}

/// Item for what the clipboard holds. An image is only kept when there is no
/// text, since text/plain always wins the representation choice.
fn item_from(text: Option<String>, image: Option<RawImage>) -> Option<ClipboardItem> {
    if let Some(text) = text {
        return Some(ClipboardItem::new().with_bytes(MimeType::text_plain(), text.into_bytes()));
    }

    let image = Arc::new(image?);
    Some(ClipboardItem::new().with_representation(
        MimeType::image_png(),
        Box::new(move || {
            let image = Arc::clone(&image);
            Box::pin(async move {
                tokio::task::spawn_blocking(move || encode_png(&image).map(Some))
                    .await
                    .map_err(|e| ClipboardError::Task(e.to_string()))?
            })
        }),
    ))
}

fn hash_image(width: usize, height: usize, bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    width.hash(&mut hasher);
    height.hash(&mut hasher);
    bytes.len().hash(&mut hasher);
    bytes[..bytes.len().min(FINGERPRINT_PREFIX)].hash(&mut hasher);
    hasher.finish()
}

/// Cheap summary of the clipboard contents; the image is only looked at when
/// there is no text
fn fingerprint(clipboard: &mut Clipboard) -> u64 {
    let mut hasher = DefaultHasher::new();
    match clipboard.get_text() {
        Ok(text) => text.hash(&mut hasher),
        Err(_) => {
            if let Ok(image) = clipboard.get_image() {
                hash_image(image.width, image.height, &image.bytes).hash(&mut hasher);
            }
        }
    }
    hasher.finish()
}

#[async_trait]
impl ClipboardAccess for SystemClipboard {
    async fn write_text(&self, text: &str, _activation: Activation) -> Result<(), ClipboardError> {
        let text = text.to_string();
        self.with_clipboard(move |clipboard| {
            clipboard
                .set_text(text)
                .map_err(|e| ClipboardError::Write(e.to_string()))
        })
        .await
    }

    async fn read_text(&self, _activation: Activation) -> Result<String, ClipboardError> {
        self.with_clipboard(|clipboard| {
            clipboard
                .get_text()
                .map_err(|e| ClipboardError::Read(e.to_string()))
        })
        .await
    }

    async fn read(&self, _activation: Activation) -> Result<Vec<ClipboardItem>, ClipboardError> {
        let (text, image) = self
            .with_clipboard(|clipboard| {
                let text = available(clipboard.get_text())?;
                let image = match &text {
                    Some(_) => None,
                    None => image_or_absent(clipboard.get_image()),
                };
                Ok((text, image))
            })
            .await?;

        Ok(item_from(text, image).into_iter().collect())
    }

    fn watch(&self) -> Option<BoxStream<'static, ()>> {
        let period = self.watch_interval?;
        let shared = Arc::clone(&self.clipboard);
        let changes = stream::unfold(None::<u64>, move |mut last| {
            let shared = Arc::clone(&shared);
            async move {
                loop {
                    tokio::time::sleep(period).await;
                    let poll = with_shared(Arc::clone(&shared), |clipboard| Ok(fingerprint(clipboard)));
                    let current = match poll.await {
                        Ok(current) => current,
                        Err(e) => {
                            tracing::debug!("Clipboard poll failed: {}", e);
                            continue;
                        }
                    };
                    match last.replace(current) {
                        Some(previous) if previous != current => return Some(((), last)),
                        _ => continue,
                    }
                }
            }
        });
        Some(changes.boxed())
    }
}
