use creatorverse_lib::{
    Repository,
    form::{CreatorForm, Field},
    repository::Creator,
};
use iced::{
    Element, Task,
    widget::{button, column, row, scrollable, space, text},
};

use crate::components::{Action, Route, creator_form, failure};

#[derive(Debug, Clone)]
pub enum Message {
    Input(Field, String),
    CancelPressed,
    SubmitPressed,
    Added(Result<Creator, String>),
}

pub struct AddCreator {
    repo: Repository,
    form: CreatorForm,
    submitting: bool,
    error: Option<String>,
}

impl AddCreator {
    pub fn new(repo: Repository) -> (Self, Task<Message>) {
        (
            Self {
                repo,
                form: CreatorForm::new(),
                submitting: false,
                error: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Action<Message> {
        match message {
            Message::Input(field, value) => {
                self.form.set(field, value);
                Action::None
            }
            Message::CancelPressed => Action::Navigate(Route::List { notice: None }),
            Message::SubmitPressed => {
                if self.submitting {
                    return Action::None;
                }
                if let Err(e) = self.form.validate() {
                    self.error = Some(e.to_string());
                    return Action::None;
                }

                self.submitting = true;
                self.error = None;

                let repo = self.repo.clone();
                let form = self.form.clone();
                Action::Run(Task::perform(
                    async move { repo.add_creator(&form).await.map_err(|e| e.to_string()) },
                    Message::Added,
                ))
            }
            Message::Added(Ok(creator)) => Action::Navigate(Route::List {
                notice: Some(format!(
                    "Successfully added {} to your creator list!",
                    creator.name()
                )),
            }),
            Message::Added(Err(e)) => {
                self.submitting = false;
                self.error = Some(e);
                Action::None
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let mut page = column![
            text("Add a New Creator").size(28),
            creator_form::view(&self.form, !self.submitting, Message::Input),
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
                    .on_press_maybe((!self.submitting).then_some(Message::CancelPressed)),
                space::horizontal(),
                button(if self.submitting {
                    "Adding..."
                } else {
                    "Add Creator"
                })
                .on_press_maybe((!self.submitting).then_some(Message::SubmitPressed)),
            ]
            .spacing(8),
        );

        scrollable(page).into()
    }
}
