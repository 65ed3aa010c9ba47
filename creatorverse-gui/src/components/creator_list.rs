use std::collections::HashMap;

use creatorverse_lib::{
    Repository,
    feed::{ChangeEvent, FeedError},
    list::{ListStore, Removal, State},
    repository::{Creator, CreatorId},
};
use iced::{
    Element, Length, Task,
    futures::{Stream, StreamExt, stream},
    task,
    widget::{button, center, column, container, row, scrollable, space, text},
};
use tracing::{debug, error, info};

use crate::{
    components::{Action, Route, confirm_delete, failure, notice, visit},
    modal,
};

#[derive(Debug, Clone)]
pub enum Message {
    Loaded(Result<Vec<Creator>, String>),
    Changed(ChangeEvent),
    FeedUnavailable(String),
    RetryPressed,
    AddPressed,
    VisitPressed(CreatorId),
    ViewPressed(CreatorId),
    EditPressed(CreatorId),
    DeletePressed(CreatorId),
    DeleteCancelled,
    DeleteConfirmed,
    Deleted(CreatorId, Result<(), String>),
    NoticeDismissed,
}

pub struct CreatorList {
    repo: Repository,
    store: ListStore,
    /// Aborts the change feed task, and with it the subscription, when the screen goes away.
    /// `None` once the feed is unavailable.
    feed: Option<task::Handle>,
    confirming: Option<CreatorId>,
    /// Removed optimistically, waiting for the record store to confirm
    deleting: HashMap<CreatorId, Removal>,
    notice: Option<String>,
    error: Option<String>,
}

impl CreatorList {
    pub fn new(repo: Repository, notice: Option<String>) -> (Self, Task<Message>) {
        let (feed, handle) = Task::stream(changes(repo.clone())).abortable();

        (
            Self {
                repo: repo.clone(),
                store: ListStore::new(),
                feed: Some(handle.abort_on_drop()),
                confirming: None,
                deleting: HashMap::new(),
                notice,
                error: None,
            },
            Task::batch([load(&repo), feed]),
        )
    }

    pub fn update(&mut self, message: Message) -> Action<Message> {
        match message {
            Message::Loaded(result) => {
                self.store.loaded(result);
                info!("Creator list loaded with {} entries", self.store.len());
            }
            Message::Changed(event) => {
                let changed = self.store.apply(event.clone());
                debug!(
                    "Applied {} for creator {} (changed: {changed})",
                    event.kind(),
                    event.id()
                );
            }
            Message::FeedUnavailable(e) => {
                error!("Creator list will not receive live updates: {e}");
                self.feed = None;
            }
            Message::RetryPressed => {
                self.store = ListStore::new();
                self.error = None;
                return Action::Run(load(&self.repo));
            }
            Message::AddPressed => return Action::Navigate(Route::Add),
            Message::VisitPressed(id) => {
                if let Some(creator) = self.store.get(id) {
                    visit(creator.url());
                }
            }
            Message::ViewPressed(id) => {
                return Action::Navigate(Route::Detail { id, notice: None });
            }
            Message::EditPressed(id) => return Action::Navigate(Route::Edit(id)),
            Message::DeletePressed(id) => self.confirming = Some(id),
            Message::DeleteCancelled => self.confirming = None,
            Message::DeleteConfirmed => {
                if let Some(id) = self.confirming.take()
                    && let Some(removal) = self.store.remove_local(id)
                {
                    self.deleting.insert(id, removal);
                    self.error = None;

                    let repo = self.repo.clone();
                    return Action::Run(Task::perform(
                        async move { repo.delete_creator(id).await.map_err(|e| e.to_string()) },
                        move |result| Message::Deleted(id, result),
                    ));
                }
            }
            Message::Deleted(id, result) => {
                let removal = self.deleting.remove(&id);
                if let Err(e) = result {
                    if let Some(removal) = removal {
                        self.store.restore(removal);
                    }
                    self.error = Some(e);
                }
            }
            Message::NoticeDismissed => self.notice = None,
        }

        Action::None
    }

    pub fn view(&self) -> Element<'_, Message> {
        let content: Element<'_, Message> = match self.store.state() {
            State::Loading => center(text("Loading creators...")).into(),
            State::Error(e) => center(
                column![
                    text("Connection Error").size(24),
                    text(e),
                    button("Try Again").on_press(Message::RetryPressed),
                ]
                .spacing(12)
                .align_x(iced::Alignment::Center),
            )
            .into(),
            State::Ready if self.store.is_empty() => center(
                column![
                    text("Ready to Start Your Creator Universe?").size(24),
                    text("Add the first creator to get going."),
                    button("Add Creator").on_press(Message::AddPressed),
                ]
                .spacing(12)
                .align_x(iced::Alignment::Center),
            )
            .into(),
            State::Ready => {
                let cards = column(self.store.creators().iter().map(card)).spacing(12);

                column![
                    row![
                        text(format!("{} creators", self.store.len())),
                        space::horizontal(),
                        button("Add Creator").on_press(Message::AddPressed),
                    ],
                    scrollable(cards).height(Length::Fill),
                ]
                .spacing(12)
                .into()
            }
        };

        let mut page = column![].spacing(12).padding(20);
        if let Some(message) = &self.notice {
            page = page.push(row![
                notice(message),
                button("Dismiss")
                    .style(button::text)
                    .on_press(Message::NoticeDismissed),
            ]);
        }
        if let Some(e) = &self.error {
            page = page.push(failure(e));
        }
        if self.feed.is_none() {
            page = page.push(text("Live updates unavailable").style(text::secondary));
        }
        let page = page.push(content);

        match self
            .confirming
            .and_then(|id| self.store.get(id))
            .map(|creator| {
                confirm_delete(
                    creator.name(),
                    Message::DeleteConfirmed,
                    Message::DeleteCancelled,
                )
            }) {
            Some(dialog) => modal(page, dialog, Some(Message::DeleteCancelled)),
            None => page.into(),
        }
    }
}

fn card(creator: &Creator) -> Element<'_, Message> {
    let id = creator.id();

    let mut body = column![
        text(creator.name()).size(20),
        text(creator.description()),
        text(creator.url()).style(text::secondary),
    ]
    .spacing(6);
    if let Some(imageurl) = creator.imageurl() {
        body = body.push(text(imageurl).style(text::secondary));
    }

    container(
        column![
            body,
            row![
                button("Visit")
                    .style(button::secondary)
                    .on_press(Message::VisitPressed(id)),
                button("View").on_press(Message::ViewPressed(id)),
                button("Edit").on_press(Message::EditPressed(id)),
                button("Delete")
                    .style(button::danger)
                    .on_press(Message::DeletePressed(id)),
            ]
            .spacing(8),
        ]
        .spacing(12),
    )
    .padding(16)
    .width(Length::Fill)
    .style(container::rounded_box)
    .into()
}

fn load(repo: &Repository) -> Task<Message> {
    let repo = repo.clone();
    Task::perform(
        async move { repo.creators().await.map_err(|e| e.to_string()) },
        Message::Loaded,
    )
}

/// Every change to the creators table, for as long as the stream is polled.
fn changes(repo: Repository) -> impl Stream<Item = Message> {
    stream::once(async move { repo.subscribe().await }).flat_map(|result| match result {
        Ok(subscription) => subscription
            .map(Message::Changed)
            .chain(stream::once(async {
                Message::FeedUnavailable(FeedError::Closed.to_string())
            }))
            .left_stream(),
        Err(e) => stream::once(async move { Message::FeedUnavailable(e.to_string()) })
            .right_stream(),
    })
}
