use std::sync::Arc;

use chrono::{Duration, Utc};
use creatorverse_lib::{
    Repository,
    repository::{NewCreator, config::CoreConfig, store::MemoryStore},
};
use iced::{
    Color, Element,
    Length::{self, Fill},
    Task, Theme, application,
    widget::{button, center, column, container, mouse_area, opaque, row, space, stack, text},
};
use parking_lot::RwLock;
use tracing::{Level, debug, error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::{
    components::{
        Action, Route,
        add_creator::{self, AddCreator},
        creator_detail::{self, CreatorDetail},
        creator_list::{self, CreatorList},
        edit_creator::{self, EditCreator},
    },
    config::{Cfg, GuiConfig},
};

pub mod components;
pub mod config;

fn main() -> iced::Result {
    application(App::new, App::update, App::view)
        .theme(App::theme)
        .title(App::title)
        .run()
}

/// Incremented on every navigation. Messages from an older screen are discarded.
type Generation = u64;

#[derive(Debug, Clone)]
enum Message {
    List(Generation, creator_list::Message),
    Detail(Generation, creator_detail::Message),
    Add(Generation, add_creator::Message),
    Edit(Generation, edit_creator::Message),
    HomePressed,
    ThemeToggled,
}

enum Screen {
    List(CreatorList),
    Detail(CreatorDetail),
    Add(AddCreator),
    Edit(EditCreator),
}

struct App {
    repo: Repository,
    cfg: Cfg,
    title: String,
    theme: Theme,
    generation: Generation,
    screen: Screen,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        // Human friendly panicking in release mode
        human_panic::setup_panic!();

        // Logging
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::TRACE)
            .with_env_filter(EnvFilter::from_default_env())
            .finish();
        if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set up logging: {e}");
        }

        let (repo, title) = match connect() {
            Some(repo) => (repo, "Creatorverse".to_string()),
            None => (demo_repository(), "Creatorverse (offline demo)".to_string()),
        };
        let cfg = Arc::new(RwLock::new(GuiConfig::load()));
        let theme = cfg.read().theme();

        let (screen, task) = CreatorList::new(repo.clone(), None);

        (
            Self {
                repo,
                cfg,
                title,
                theme,
                generation: 0,
                screen: Screen::List(screen),
            },
            task.map(|msg| Message::List(0, msg)),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::List(generation, msg) => match &mut self.screen {
                Screen::List(screen) if generation == self.generation => {
                    let action = screen.update(msg);
                    self.perform(action, move |msg| Message::List(generation, msg))
                }
                _ => discard(generation),
            },
            Message::Detail(generation, msg) => match &mut self.screen {
                Screen::Detail(screen) if generation == self.generation => {
                    let action = screen.update(msg);
                    self.perform(action, move |msg| Message::Detail(generation, msg))
                }
                _ => discard(generation),
            },
            Message::Add(generation, msg) => match &mut self.screen {
                Screen::Add(screen) if generation == self.generation => {
                    let action = screen.update(msg);
                    self.perform(action, move |msg| Message::Add(generation, msg))
                }
                _ => discard(generation),
            },
            Message::Edit(generation, msg) => match &mut self.screen {
                Screen::Edit(screen) if generation == self.generation => {
                    let action = screen.update(msg);
                    self.perform(action, move |msg| Message::Edit(generation, msg))
                }
                _ => discard(generation),
            },
            Message::HomePressed => self.navigate(Route::List { notice: None }),
            Message::ThemeToggled => {
                let mut cfg = self.cfg.write();
                cfg.theme = cfg.theme.toggled();
                self.theme = cfg.theme();
                if let Err(e) = cfg.save() {
                    error!("Unable to save the GUI configuration: {e}");
                }
                Task::none()
            }
        }
    }

    // Render the application and pass along messages from components to update()
    pub fn view(&self) -> Element<'_, Message> {
        let generation = self.generation;
        let screen = match &self.screen {
            Screen::List(screen) => screen
                .view()
                .map(move |msg| Message::List(generation, msg)),
            Screen::Detail(screen) => screen
                .view()
                .map(move |msg| Message::Detail(generation, msg)),
            Screen::Add(screen) => screen
                .view()
                .map(move |msg| Message::Add(generation, msg)),
            Screen::Edit(screen) => screen
                .view()
                .map(move |msg| Message::Edit(generation, msg)),
        };

        column![
            // Top bar
            container(
                row![
                    button(text("Creatorverse").size(20))
                        .style(button::text)
                        .on_press(Message::HomePressed),
                    space::horizontal(),
                    button("Toggle theme")
                        .style(button::secondary)
                        .on_press(Message::ThemeToggled),
                ]
                .align_y(iced::Alignment::Center)
            )
            .padding(10),
            screen,
        ]
        .height(Fill)
        .into()
    }

    pub fn title(&self) -> String {
        self.title.clone()
    }

    pub fn theme(&self) -> Theme {
        self.theme.clone()
    }

    fn perform<M>(
        &mut self,
        action: Action<M>,
        wrap: impl Fn(M) -> Message + Send + 'static,
    ) -> Task<Message>
    where
        M: Send + 'static,
    {
        match action {
            Action::None => Task::none(),
            Action::Run(task) => task.map(wrap),
            Action::Navigate(route) => self.navigate(route),
        }
    }

    /// Replace the current screen. The old one is dropped, releasing anything it held open.
    fn navigate(&mut self, route: Route) -> Task<Message> {
        self.generation = self.generation.wrapping_add(1);
        let generation = self.generation;
        debug!("Navigating to {route:?}");

        let repo = self.repo.clone();
        match route {
            Route::List { notice } => {
                let (screen, task) = CreatorList::new(repo, notice);
                self.screen = Screen::List(screen);
                task.map(move |msg| Message::List(generation, msg))
            }
            Route::Detail { id, notice } => {
                let (screen, task) = CreatorDetail::new(repo, id, notice);
                self.screen = Screen::Detail(screen);
                task.map(move |msg| Message::Detail(generation, msg))
            }
            Route::Add => {
                let (screen, task) = AddCreator::new(repo);
                self.screen = Screen::Add(screen);
                task.map(move |msg| Message::Add(generation, msg))
            }
            Route::Edit(id) => {
                let (screen, task) = EditCreator::new(repo, id);
                self.screen = Screen::Edit(screen);
                task.map(move |msg| Message::Edit(generation, msg))
            }
        }
    }
}

fn discard(generation: Generation) -> Task<Message> {
    debug!("Discarding result for a screen that is no longer shown (generation {generation})");
    Task::none()
}

/// Connect to the configured backend, if there is one.
fn connect() -> Option<Repository> {
    let cfg = match CoreConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Unable to load configuration: {e}");
            return None;
        }
    };

    if !cfg.is_configured() {
        info!("No backend configured, starting the offline demo");
        return None;
    }

    Repository::new(cfg)
        .inspect_err(|e| error!("Unable to connect: {e}"))
        .ok()
}

/// An in-memory repository with a few creators to look at.
fn demo_repository() -> Repository {
    let store = MemoryStore::new();
    let now = Utc::now();

    let creators = [
        (
            "Kurzgesagt",
            "https://www.youtube.com/@kurzgesagt",
            "Animated explanations of science and philosophy.",
        ),
        (
            "3Blue1Brown",
            "https://www.youtube.com/@3blue1brown",
            "Mathematics with a distinct visual perspective.",
        ),
        (
            "Veritasium",
            "https://www.youtube.com/@veritasium",
            "An element of truth: videos about science, education and other things.",
        ),
    ];
    for (age, (name, url, description)) in (0i64..).zip(creators) {
        store.seed(
            NewCreator {
                name: name.into(),
                url: url.into(),
                description: description.into(),
                imageurl: None,
            },
            now - Duration::days(age),
        );
    }

    Repository::in_memory(store)
}

pub fn modal<'a, Message>(
    base: impl Into<Element<'a, Message>>,
    content: impl Into<Element<'a, Message>>,
    on_click_outside: Option<Message>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let mouse_area = mouse_area(center(opaque(content)).style(|_theme| {
        container::Style {
            background: Some(
                Color {
                    a: 0.8,
                    ..Color::BLACK
                }
                .into(),
            ),
            ..container::Style::default()
        }
    }));

    stack![
        base.into(),
        opaque(if let Some(msg) = on_click_outside {
            mouse_area.on_press(msg)
        } else {
            mouse_area
        })
    ]
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}
