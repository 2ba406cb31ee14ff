//! In-memory clipboard used by the unit tests

use async_trait::async_trait;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::clipboard::{Activation, ClipboardAccess, ClipboardItem, MimeType};
use crate::error::ClipboardError;

#[derive(Debug, Clone)]
pub enum FakeRepresentation {
    Bytes(Vec<u8>),
    Empty,
    Broken,
}

pub struct FakeClipboard {
    text: Mutex<String>,
    items: Mutex<Option<Vec<(MimeType, FakeRepresentation)>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    reads: AtomicUsize,
    change_tx: mpsc::UnboundedSender<()>,
    change_rx: Mutex<Option<mpsc::UnboundedReceiver<()>>>,
}

impl FakeClipboard {
    pub fn with_text(text: &str) -> Self {
        let (tx, rx) = mpsc::unbounded();
        Self {
            text: Mutex::new(text.to_string()),
            items: Mutex::new(None),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            change_tx: tx,
            change_rx: Mutex::new(Some(rx)),
        }
    }

    /// Replace what `read()` reports; text reads are unaffected
    pub fn set_items(&self, representations: Vec<(MimeType, FakeRepresentation)>) {
        *self.items.lock().unwrap() = Some(representations);
    }

    pub fn set_text(&self, text: &str) {
        *self.text.lock().unwrap() = text.to_string();
    }

    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn notify_change(&self) {
        let _ = self.change_tx.unbounded_send(());
    }
}

#[async_trait]
impl ClipboardAccess for FakeClipboard {
    async fn write_text(&self, text: &str, _activation: Activation) -> Result<(), ClipboardError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ClipboardError::Write("document is not focused".into()));
        }
        self.set_text(text);
        Ok(())
    }

    async fn read_text(&self, _activation: Activation) -> Result<String, ClipboardError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClipboardError::Read("clipboard is busy".into()));
        }
        Ok(self.text())
    }

    async fn read(&self, _activation: Activation) -> Result<Vec<ClipboardItem>, ClipboardError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ClipboardError::Read("clipboard is busy".into()));
        }

        let representations = match self.items.lock().unwrap().clone() {
            Some(representations) => representations,
            None => vec![(
                MimeType::text_plain(),
                FakeRepresentation::Bytes(self.text().into_bytes()),
            )],
        };
        if representations.is_empty() {
            return Ok(Vec::new());
        }

        let item = representations
            .into_iter()
            .fold(ClipboardItem::new(), |item, (mime, representation)| {
                item.with_representation(
                    mime,
                    Box::new(move || {
                        let representation = representation.clone();
                        Box::pin(async move {
                            match representation {
                                FakeRepresentation::Bytes(bytes) => Ok(Some(bytes)),
                                FakeRepresentation::Empty => Ok(None),
                                FakeRepresentation::Broken => {
                                    Err(ClipboardError::Read("representation vanished".into()))
                                }
                            }
                        })
                    }),
                )
            });
        Ok(vec![item])
    }

    fn watch(&self) -> Option<BoxStream<'static, ()>> {
        let rx = self.change_rx.lock().unwrap().take()?;
        Some(rx.boxed())
    }
}
