use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastKind {
    #[default]
    Normal,
    Error,
}

/// The shared status message area.
///
/// Each `show` returns a generation; only `expire` with the latest
/// generation hides the toast, so earlier timers are effectively cancelled.
#[derive(Debug, Default)]
pub struct Toast {
    text: String,
    visible: bool,
    kind: ToastKind,
    generation: u64,
}

impl Toast {
    pub fn show(&mut self, message: impl AsRef<str>) -> u64 {
        let message = message.as_ref();
        if self.visible {
            self.text.push('\n');
            self.text.push_str(message);
        } else {
            self.text = message.to_string();
        }
        self.kind = classify(message);
        self.visible = true;
        self.generation += 1;
        tracing::debug!("Toast: {}", message);
        self.generation
    }

    /// Hide the toast if `generation` is still the latest one; the text stays
    pub fn expire(&mut self, generation: u64) {
        if generation == self.generation {
            self.visible = false;
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn kind(&self) -> ToastKind {
        self.kind
    }
}

pub fn classify(message: &str) -> ToastKind {
    if message.to_ascii_lowercase().contains("error") {
        ToastKind::Error
    } else {
        ToastKind::Normal
    }
}
