use creatorverse_lib::{Error, repository::CreatorId};
use iced::{
    Element, Task,
    widget::{button, column, container, row, space, text},
};
use tracing::{error, info};

pub mod add_creator;
pub mod creator_detail;
pub mod creator_form;
pub mod creator_list;
pub mod edit_creator;

/// A screen of the application, with an optional message to greet the user with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List { notice: Option<String> },
    Detail { id: CreatorId, notice: Option<String> },
    Add,
    Edit(CreatorId),
}

/// What a screen asks the application to do after handling a message.
#[derive(Debug)]
pub enum Action<Message> {
    None,
    Run(Task<Message>),
    Navigate(Route),
}

/// Why a single creator couldn't be shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    NotFound,
    Failed(String),
}

impl From<Error> for LoadError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => LoadError::NotFound,
            err => LoadError::Failed(err.to_string()),
        }
    }
}

/// Open a creator's link in the default browser.
pub fn visit(url: &str) {
    match webbrowser::open(url) {
        Ok(()) => info!("Opened {url} in the browser"),
        Err(e) => error!("Unable to open {url} in the browser: {e}"),
    }
}

/// Body of the delete confirmation modal.
pub fn confirm_delete<'a, Message: Clone + 'a>(
    name: &str,
    on_confirm: Message,
    on_cancel: Message,
) -> Element<'a, Message> {
    container(
        column![
            text("Delete creator").size(20),
            text(format!(
                "Are you sure you want to delete {name}? This action cannot be undone."
            )),
            row![
                space::horizontal(),
                button("Cancel")
                    .style(button::secondary)
                    .on_press(on_cancel),
                button("Delete").style(button::danger).on_press(on_confirm),
            ]
            .spacing(10),
        ]
        .spacing(20),
    )
    .padding(20)
    .width(420)
    .style(container::rounded_box)
    .into()
}

pub fn notice<'a, Message: 'a>(message: &'a str) -> Element<'a, Message> {
    container(text(message).style(text::success))
        .padding(10)
        .style(container::bordered_box)
        .into()
}

pub fn failure<'a, Message: 'a>(message: &'a str) -> Element<'a, Message> {
    text(message).style(text::danger).into()
}
