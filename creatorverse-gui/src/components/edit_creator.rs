use creatorverse_lib::{
    Repository,
    form::{EditForm, Field},
    repository::{CreatorId, NewCreator},
};
use iced::{
    Element, Task,
    widget::{button, center, column, row, scrollable, space, text},
};

use crate::components::{Action, LoadError, Route, creator_form, failure};

#[derive(Debug, Clone)]
pub enum Message {
    Loaded(Result<EditForm, LoadError>),
    Input(Field, String),
    CancelPressed,
    SavePressed,
    Saved(Result<NewCreator, String>),
}

pub enum State {
    Loading,
    NotFound,
    Error(String),
    Ready(EditForm),
}

pub struct EditCreator {
    repo: Repository,
    id: CreatorId,
    state: State,
    error: Option<String>,
}

impl EditCreator {
    pub fn new(repo: Repository, id: CreatorId) -> (Self, Task<Message>) {
        let task = {
            let repo = repo.clone();
            Task::perform(
                async move {
                    repo.creator(id)
                        .await
                        .map(|creator| EditForm::new(&creator))
                        .map_err(LoadError::from)
                },
                Message::Loaded,
            )
        };

        (
            Self {
                repo,
                id,
                state: State::Loading,
                error: None,
            },
            task,
        )
    }

    pub fn update(&mut self, message: Message) -> Action<Message> {
        let back = Route::Detail {
            id: self.id,
            notice: None,
        };

        match message {
            Message::Loaded(result) => {
                self.state = match result {
                    Ok(form) => State::Ready(form),
                    Err(LoadError::NotFound) => State::NotFound,
                    Err(LoadError::Failed(e)) => State::Error(e),
                };
            }
            Message::Input(field, value) => {
                if let State::Ready(form) = &mut self.state {
                    form.draft.set(field, value);
                }
            }
            Message::CancelPressed => return Action::Navigate(back),
            Message::SavePressed => {
                let State::Ready(form) = &mut self.state else {
                    return Action::None;
                };
                if form.is_submitting() {
                    return Action::None;
                }
                if let Err(e) = form.submit() {
                    self.error = Some(e.to_string());
                    return Action::None;
                }

                form.set_submitting(true);
                self.error = None;

                let repo = self.repo.clone();
                let id = self.id;
                let form = form.clone();
                return Action::Run(Task::perform(
                    async move {
                        repo.update_creator(id, &form)
                            .await
                            .map_err(|e| e.to_string())
                    },
                    Message::Saved,
                ));
            }
            Message::Saved(Ok(fields)) => {
                if let State::Ready(form) = &mut self.state {
                    form.commit();
                }
                return Action::Navigate(Route::Detail {
                    id: self.id,
                    notice: Some(format!("Successfully updated {}!", fields.name)),
                });
            }
            Message::Saved(Err(e)) => {
                if let State::Ready(form) = &mut self.state {
                    form.set_submitting(false);
                }
                self.error = Some(e);
            }
        }

        Action::None
    }

    pub fn view(&self) -> Element<'_, Message> {
        let form = match &self.state {
            State::Loading => return center(text("Loading creator...")).into(),
            State::NotFound => {
                return center(
                    column![
                        text("Creator not found").size(24),
                        button("Back").on_press(Message::CancelPressed),
                    ]
                    .spacing(12)
                    .align_x(iced::Alignment::Center),
                )
                .into();
            }
            State::Error(e) => {
                return center(
                    column![
                        text("Something went wrong").size(24),
                        text(e),
                        button("Back").on_press(Message::CancelPressed),
                    ]
                    .spacing(12)
                    .align_x(iced::Alignment::Center),
                )
                .into();
            }
            State::Ready(form) => form,
        };

        let mut page = column![
            text(format!("Edit {}", form.original().name)).size(28),
            creator_form::view(&form.draft, !form.is_submitting(), Message::Input),
        ]
        .spacing(20)
        .padding(20)
        .max_width(640);

        if let Some(e) = &self.error {
            page = page.push(failure(e));
        }

        page = page.push(
            row![
                button("Cancel")
                    .style(button::secondary)
                    .on_press_maybe((!form.is_submitting()).then_some(Message::CancelPressed)),
                space::horizontal(),
                button(if form.is_submitting() {
                    "Saving..."
                } else {
                    "Save Changes"
                })
                .on_press_maybe(form.can_save().then_some(Message::SavePressed)),
            ]
            .spacing(8),
        );

        scrollable(page).into()
    }
}
