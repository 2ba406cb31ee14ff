use iced::widget::{button, column, container, row, text, text_editor, tooltip, Row};
use iced::{event, Element, Event, Length, Size, Subscription, Task};
use std::time::Duration;

use crate::clipboard::MimeType;
use crate::config::DemoConfig;
use crate::controller::{Controller, Inspection, PasteOutcome, FOCUS_READ_FAILED};
use crate::error::PermissionError;
use crate::page_event;
use crate::panel::{PermissionEntry, PermissionPanel, REQUEST_TOOLTIP};
use crate::permission::{PermissionDescriptor, PermissionState, PermissionStatus};
use crate::toast::{Toast, ToastKind};

/// The main application state
pub struct ClipboardDemo {
    controller: Controller,
    toast_timeout: Duration,
    output: text_editor::Content,
    toast: Toast,
    panel: PermissionPanel,
    /// Representation picked by the last focus/copy/cut inspection
    inspected: Option<MimeType>,
}

#[derive(Debug, Clone)]
pub enum Message {
    EditorAction(text_editor::Action),
    Copy,
    Paste,
    Copied(String),
    Pasted(PasteOutcome),
    ClipboardChanged,
    ChangeRead(Option<String>),
    Inspected(Inspection),
    PermissionsQueried(Result<Vec<PermissionStatus>, PermissionError>),
    PermissionChanged(PermissionDescriptor, PermissionState),
    RequestPermission(PermissionDescriptor),
    PermissionRequested(String),
    ToastExpired(u64),
    Event(Event),
}

impl ClipboardDemo {
    pub fn new(config: &DemoConfig, controller: Controller) -> (Self, Task<Message>) {
        let query = Task::perform(
            controller.query_permissions(config.permissions.clone()),
            Message::PermissionsQueried,
        );
        let watch = match controller.clipboard_changes() {
            Some(changes) => Task::run(changes, |()| Message::ClipboardChanged),
            None => {
                tracing::info!("Clipboard change notifications unavailable");
                Task::none()
            }
        };

        let state = Self {
            controller,
            toast_timeout: config.toast_timeout(),
            output: text_editor::Content::new(),
            toast: Toast::default(),
            panel: PermissionPanel::default(),
            inspected: None,
        };
        (state, Task::batch([query, watch]))
    }

    /// Show `message` and arm the hide timer for it
    fn notify(&mut self, message: impl AsRef<str>) -> Task<Message> {
        let generation = self.toast.show(message);
        let timeout = self.toast_timeout;
        Task::perform(
            async move { tokio::time::sleep(timeout).await },
            move |_| Message::ToastExpired(generation),
        )
    }
}

fn update(state: &mut ClipboardDemo, message: Message) -> Task<Message> {
    match message {
        Message::EditorAction(action) => {
            state.output.perform(action);
            Task::none()
        }
        Message::Copy => Task::perform(
            state.controller.copy(state.output.text()),
            Message::Copied,
        ),
        Message::Paste => Task::perform(state.controller.paste(), Message::Pasted),
        Message::Copied(message) => state.notify(message),
        Message::Pasted(outcome) => {
            if let Some(text) = outcome.text {
                state.output = text_editor::Content::with_text(&text);
            }
            state.notify(outcome.message)
        }
        Message::ClipboardChanged => Task::perform(
            state.controller.clipboard_changed(),
            Message::ChangeRead,
        ),
        Message::ChangeRead(Some(message)) => state.notify(message),
        Message::ChangeRead(None) => Task::none(),
        Message::Inspected(inspection) => {
            match inspection {
                Inspection::Text(text) => {
                    state.output = text_editor::Content::with_text(&text);
                    state.inspected = Some(MimeType::text_plain());
                }
                Inspection::NoText => state.inspected = Some(MimeType::text_plain()),
                Inspection::Image(len) => {
                    tracing::debug!("Inspected a {} byte image", len);
                    state.inspected = Some(MimeType::image_png());
                }
                Inspection::Nothing => state.inspected = None,
                Inspection::Failed => {}
                Inspection::ReadFailed => return state.notify(FOCUS_READ_FAILED),
            }
            Task::none()
        }
        Message::PermissionsQueried(Ok(statuses)) => {
            state.panel = PermissionPanel::from_statuses(&statuses);
            Task::batch(statuses.into_iter().map(|status| {
                let descriptor = status.descriptor().clone();
                Task::run(status.changes(), move |new_state| {
                    Message::PermissionChanged(descriptor.clone(), new_state)
                })
            }))
        }
        Message::PermissionsQueried(Err(e)) => {
            tracing::error!("Permission query failed: {}", e);
            state.notify(format!("Failed to query permissions: {}", e))
        }
        Message::PermissionChanged(descriptor, new_state) => {
            if state.panel.set_state(&descriptor, new_state) {
                tracing::debug!("{} is now {}", descriptor, new_state);
            }
            Task::none()
        }
        Message::RequestPermission(descriptor) => Task::perform(
            state.controller.request_permission(descriptor),
            Message::PermissionRequested,
        ),
        Message::PermissionRequested(message) => state.notify(message),
        Message::ToastExpired(generation) => {
            state.toast.expire(generation);
            Task::none()
        }
        Message::Event(event) => match page_event::classify(&event) {
            Some(page_event) => {
                tracing::debug!("{:?}, inspecting clipboard", page_event);
                Task::perform(state.controller.inspect(), Message::Inspected)
            }
            None => Task::none(),
        },
    }
}

fn permission_button(entry: &PermissionEntry) -> Element<'_, Message> {
    let style = match entry.state {
        PermissionState::Granted => button::success,
        PermissionState::Denied => button::danger,
        PermissionState::Prompt => button::secondary,
    };
    let label = column![
        text(&entry.label).size(14),
        text(entry.state.to_string()).size(10),
    ]
    .spacing(2);

    let btn = button(label)
        .padding([6, 14])
        .style(style)
        .on_press(Message::RequestPermission(entry.descriptor.clone()));

    tooltip(
        btn,
        container(text(REQUEST_TOOLTIP).size(12))
            .padding(6)
            .style(container::rounded_box),
        tooltip::Position::Bottom,
    )
    .into()
}

fn view(state: &ClipboardDemo) -> Element<'_, Message> {
    let copy_button = button(text("Copy").size(14))
        .padding([8, 16])
        .on_press(Message::Copy);
    let paste_button = button(text("Paste").size(14))
        .padding([8, 16])
        .on_press(Message::Paste);
    let actions = row![copy_button, paste_button].spacing(10);

    let editor = text_editor(&state.output)
        .placeholder("Type here, then Copy; or Paste to fill from the clipboard")
        .on_action(Message::EditorAction)
        .height(Length::Fill)
        .padding(10);

    let permissions = Row::with_children(state.panel.entries().iter().map(permission_button))
        .spacing(10)
        .align_y(iced::Alignment::Center);

    let inspected = text(match &state.inspected {
        Some(mime) => format!("Last inspected: {}", mime),
        None => "Last inspected: nothing".to_string(),
    })
    .size(12);

    let toast: Element<'_, Message> = if state.toast.is_visible() {
        let message = text(state.toast.text()).size(13);
        let message = match state.toast.kind() {
            ToastKind::Error => message.style(text::danger),
            ToastKind::Normal => message,
        };
        container(message)
            .padding(8)
            .width(Length::Fill)
            .style(container::rounded_box)
            .into()
    } else {
        text("").size(13).into()
    };

    let content = column![
        actions,
        editor,
        text("Permissions").size(14),
        permissions,
        inspected,
        toast,
    ]
    .spacing(10)
    .padding(10);

    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn subscription(_state: &ClipboardDemo) -> Subscription<Message> {
    event::listen().map(Message::Event)
}

/// Run the demo window
pub fn run(config: DemoConfig, controller: Controller) -> iced::Result {
    iced::application(
        move || ClipboardDemo::new(&config, controller.clone()),
        update,
        view,
    )
    .title("Clipboard Demo")
    .subscription(subscription)
    .window_size(Size::new(560.0, 460.0))
    .run()
}
