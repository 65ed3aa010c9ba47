use creatorverse_lib::{
    Repository,
    repository::{Creator, CreatorId},
};
use iced::{
    Element, Length, Task,
    widget::{button, center, column, container, row, space, text},
};

use crate::{
    components::{Action, LoadError, Route, confirm_delete, failure, notice, visit},
    modal,
};

#[derive(Debug, Clone)]
pub enum Message {
    Loaded(Result<Creator, LoadError>),
    BackPressed,
    VisitPressed,
    EditPressed,
    DeletePressed,
    DeleteCancelled,
    DeleteConfirmed,
    Deleted(Result<(), String>),
}

pub enum State {
    Loading,
    NotFound,
    Error(String),
    Ready(Creator),
}

pub struct CreatorDetail {
    repo: Repository,
    id: CreatorId,
    state: State,
    notice: Option<String>,
    confirming: bool,
    deleting: bool,
    error: Option<String>,
}

impl CreatorDetail {
    pub fn new(repo: Repository, id: CreatorId, notice: Option<String>) -> (Self, Task<Message>) {
        let task = {
            let repo = repo.clone();
            Task::perform(
                async move { repo.creator(id).await.map_err(LoadError::from) },
                Message::Loaded,
            )
        };

        (
            Self {
                repo,
                id,
                state: State::Loading,
                notice,
                confirming: false,
                deleting: false,
                error: None,
            },
            task,
        )
    }

    pub fn update(&mut self, message: Message) -> Action<Message> {
        match message {
            Message::Loaded(result) => {
                self.state = match result {
                    Ok(creator) => State::Ready(creator),
                    Err(LoadError::NotFound) => State::NotFound,
                    Err(LoadError::Failed(e)) => State::Error(e),
                }
            }
            Message::BackPressed => return Action::Navigate(Route::List { notice: None }),
            Message::VisitPressed => {
                if let State::Ready(creator) = &self.state {
                    visit(creator.url());
                }
            }
            Message::EditPressed => return Action::Navigate(Route::Edit(self.id)),
            Message::DeletePressed => self.confirming = true,
            Message::DeleteCancelled => self.confirming = false,
            Message::DeleteConfirmed => {
                self.confirming = false;
                self.deleting = true;
                self.error = None;

                let repo = self.repo.clone();
                let id = self.id;
                return Action::Run(Task::perform(
                    async move { repo.delete_creator(id).await.map_err(|e| e.to_string()) },
                    Message::Deleted,
                ));
            }
            Message::Deleted(Ok(())) => {
                let notice = match &self.state {
                    State::Ready(creator) => Some(format!("Deleted {}", creator.name())),
                    _ => None,
                };
                return Action::Navigate(Route::List { notice });
            }
            Message::Deleted(Err(e)) => {
                self.deleting = false;
                self.error = Some(e);
            }
        }

        Action::None
    }

    pub fn view(&self) -> Element<'_, Message> {
        let back = button("Back to creators")
            .style(button::text)
            .on_press(Message::BackPressed);

        let creator = match &self.state {
            State::Loading => return center(text("Loading creator...")).into(),
            State::NotFound => {
                return center(
                    column![text("Creator not found").size(24), back]
                        .spacing(12)
                        .align_x(iced::Alignment::Center),
                )
                .into();
            }
            State::Error(e) => {
                return center(
                    column![text("Something went wrong").size(24), text(e), back]
                        .spacing(12)
                        .align_x(iced::Alignment::Center),
                )
                .into();
            }
            State::Ready(creator) => creator,
        };

        let mut page = column![back].spacing(16).padding(20);
        if let Some(message) = &self.notice {
            page = page.push(notice(message));
        }

        let mut body = column![
            text(creator.name()).size(28),
            text(creator.url()).style(text::secondary),
            text(creator.description()),
        ]
        .spacing(10);
        if let Some(imageurl) = creator.imageurl() {
            body = body.push(text(format!("Image: {imageurl}")).style(text::secondary));
        }
        body = body.push(
            text(format!(
                "Added {}",
                creator.created_at().format("%B %-d, %Y")
            ))
            .style(text::secondary),
        );

        let actions = row![
            button("Visit")
                .style(button::secondary)
                .on_press(Message::VisitPressed),
            space::horizontal(),
            button("Edit").on_press_maybe((!self.deleting).then_some(Message::EditPressed)),
            button(if self.deleting { "Deleting..." } else { "Delete" })
                .style(button::danger)
                .on_press_maybe((!self.deleting).then_some(Message::DeletePressed)),
        ]
        .spacing(8);

        page = page.push(
            container(body)
                .padding(20)
                .width(Length::Fill)
                .style(container::rounded_box),
        );
        if let Some(e) = &self.error {
            page = page.push(failure(e));
        }
        let page = page.push(actions);

        if self.confirming {
            modal(
                page,
                confirm_delete(
                    creator.name(),
                    Message::DeleteConfirmed,
                    Message::DeleteCancelled,
                ),
                Some(Message::DeleteCancelled),
            )
        } else {
            page.into()
        }
    }
}
