/// Full-screen tethered picture viewer
///
/// The iced side of the viewer loop. A poll tick re-scans the directory,
/// decodes run on tokio's blocking pool, and the presenter swaps the image
/// handle only when what should be on screen actually changed.
use iced::keyboard::{self, key::Named, Key, Modifiers};
use iced::widget::{container, image, text};
use iced::{window, Color, ContentFit, Element, Length, Subscription, Task, Theme};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

use super::frame::{BorderStyle, Presenter};
use crate::config::ViewerConfig;
use crate::decode::{self, DecodeError, Frame};
use crate::state::selection::SelectionSet;
use crate::state::session::{DecodeRequest, KeyOutcome, Phase, ViewerError, ViewerKey, ViewerSession};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("window system error: {0}")]
    Window(#[from] iced::Error),
    #[error(transparent)]
    Viewer(#[from] ViewerError),
    #[error("viewer closed without reporting a selection")]
    NoOutcome,
}

/// Everything the viewer needs to start
pub struct ViewerOptions {
    pub dir: PathBuf,
    pub selection: SelectionSet,
    pub config: ViewerConfig,
}

type OutcomeSlot = Arc<Mutex<Option<Result<SelectionSet, ViewerError>>>>;

#[derive(Debug)]
enum Message {
    Tick,
    Key(ViewerKey),
    DecodeFinished(DecodeRequest, Result<Frame, DecodeError>),
    CloseRequested,
}

struct Viewer {
    session: ViewerSession,
    presenter: Presenter,
    border: BorderStyle,
    poll_interval: Duration,
    max_frame_edge: u32,
    outcome: OutcomeSlot,
}

/// Run the viewer until the operator exits. Returns the final selection.
pub fn run(options: ViewerOptions) -> Result<SelectionSet, RunError> {
    let slot: OutcomeSlot = Arc::new(Mutex::new(None));
    let app_slot = slot.clone();

    iced::application(Viewer::title, Viewer::update, Viewer::view)
        .subscription(Viewer::subscription)
        .theme(Viewer::theme)
        .window(window::Settings {
            exit_on_close_request: false,
            ..window::Settings::default()
        })
        .run_with(move || Viewer::new(options, app_slot))?;

    let outcome = slot.lock().map_err(|_| RunError::NoOutcome)?.take();
    match outcome {
        Some(Ok(selection)) => Ok(selection),
        Some(Err(err)) => Err(err.into()),
        None => Err(RunError::NoOutcome),
    }
}

impl Viewer {
    fn new(options: ViewerOptions, outcome: OutcomeSlot) -> (Self, Task<Message>) {
        let config = options.config;
        let viewer = Viewer {
            session: ViewerSession::new(options.dir, options.selection, config.decode_backoff()),
            presenter: Presenter::default(),
            border: BorderStyle::from_config(&config),
            poll_interval: config.poll_interval(),
            max_frame_edge: config.max_frame_edge,
            outcome,
        };
        log::info!(
            "Watching {} every {}ms ({} preselected)",
            viewer.session.directory().display(),
            config.poll_interval_ms,
            viewer.session.selection().len()
        );

        let fullscreen = if config.fullscreen {
            window::get_oldest().and_then(|id| window::change_mode(id, window::Mode::Fullscreen))
        } else {
            Task::none()
        };

        (viewer, Task::batch([fullscreen, Task::done(Message::Tick)]))
    }

    fn title(&self) -> String {
        let Some(image) = self.session.current() else {
            return format!("tether-view - waiting for pictures in {}", self.session.directory().display());
        };

        let position = self.session.cursor().map_or(0, |i| i + 1);
        let captured = chrono::DateTime::<chrono::Local>::from(image.modified).format("%H:%M:%S");
        let mark = if self.session.is_current_selected() { "  [selected]" } else { "" };
        format!(
            "{} ({}/{}) {}{}",
            image.name,
            position,
            self.session.images().len(),
            captured,
            mark
        )
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            iced::time::every(self.poll_interval).map(|_| Message::Tick),
            keyboard::on_key_press(map_key),
            window::close_requests().map(|_| Message::CloseRequested),
        ])
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Tick => {
                if let Err(err) = self.session.scan() {
                    log::error!("{}", err);
                    return self.finish(Err(err));
                }
            }
            Message::Key(key) => {
                if let KeyOutcome::Exit(selection) = self.session.handle_key(key) {
                    return self.finish(Ok(selection));
                }
            }
            Message::CloseRequested => {
                if let KeyOutcome::Exit(selection) = self.session.handle_key(ViewerKey::Exit) {
                    return self.finish(Ok(selection));
                }
            }
            Message::DecodeFinished(request, result) => {
                self.session.finish_decode(request, result, Instant::now());
            }
        }
        self.advance()
    }

    fn view(&self) -> Element<'_, Message> {
        let content: Element<'_, Message> = match self.presenter.handle() {
            Some(handle) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => text(self.placeholder())
                .size(24)
                .color(Color::from_rgb(0.6, 0.6, 0.6))
                .into(),
        };

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .style(|_theme| container::Style {
                background: Some(Color::BLACK.into()),
                ..container::Style::default()
            })
            .into()
    }

    fn placeholder(&self) -> String {
        match (self.session.phase(), self.session.current()) {
            (Phase::Decoding, Some(image)) => format!("Loading {}", image.name),
            (_, Some(image)) => image.name.clone(),
            (_, None) => "Waiting for pictures".to_string(),
        }
    }

    /// Refresh the screen and start the next decode if one is due
    fn advance(&mut self) -> Task<Message> {
        self.presenter.present(self.session.presentation(), &self.border);
        self.session.rendered();

        match self.session.next_decode(Instant::now()) {
            Some(request) => self.spawn_decode(request),
            None => Task::none(),
        }
    }

    fn spawn_decode(&self, request: DecodeRequest) -> Task<Message> {
        let max_edge = self.max_frame_edge;
        let kind = request.kind;
        let path = request.path.clone();
        Task::perform(
            async move {
                let worker_path = path.clone();
                tokio::task::spawn_blocking(move || decode::decode_frame(&worker_path, kind, max_edge))
                    .await
                    .unwrap_or_else(|err| {
                        Err(DecodeError::Worker {
                            path,
                            message: err.to_string(),
                        })
                    })
            },
            move |result| Message::DecodeFinished(request.clone(), result),
        )
    }

    fn finish(&mut self, outcome: Result<SelectionSet, ViewerError>) -> Task<Message> {
        match self.outcome.lock() {
            Ok(mut slot) => *slot = Some(outcome),
            Err(_) => log::error!("Viewer outcome slot poisoned, selection not reported"),
        }
        iced::exit()
    }
}

fn map_key(key: Key, _modifiers: Modifiers) -> Option<Message> {
    viewer_key(&key).map(Message::Key)
}

/// Escape exits, left/`a` and right/`d` navigate, space toggles selection.
pub fn viewer_key(key: &Key) -> Option<ViewerKey> {
    match key.as_ref() {
        Key::Named(Named::Escape) => Some(ViewerKey::Exit),
        Key::Named(Named::ArrowLeft) => Some(ViewerKey::Previous),
        Key::Named(Named::ArrowRight) => Some(ViewerKey::Next),
        Key::Named(Named::Space) => Some(ViewerKey::ToggleSelection),
        Key::Character(" ") => Some(ViewerKey::ToggleSelection),
        Key::Character(c) if c.eq_ignore_ascii_case("a") => Some(ViewerKey::Previous),
        Key::Character(c) if c.eq_ignore_ascii_case("d") => Some(ViewerKey::Next),
        _ => None,
    }
}
