use creatorverse_lib::form::{CreatorForm, Field};
use iced::{
    Element,
    widget::{column, text, text_input},
};

const FIELDS: [(Field, &str, &str); 4] = [
    (Field::Name, "Name *", "Enter creator's name"),
    (Field::Url, "URL *", "https://www.youtube.com/@creator"),
    (
        Field::Description,
        "Description *",
        "Tell us about this creator",
    ),
    (Field::ImageUrl, "Image URL", "https://example.com/image.jpg"),
];

/// The four inputs shared by the add and edit screens. Inputs are read only while `enabled` is
/// false.
pub fn view<'a, Message: Clone + 'a>(
    form: &'a CreatorForm,
    enabled: bool,
    on_input: fn(Field, String) -> Message,
) -> Element<'a, Message> {
    column(FIELDS.into_iter().map(|(field, label, placeholder)| {
        let input = text_input(placeholder, form.get(field))
            .on_input_maybe(enabled.then_some(move |value| on_input(field, value)))
            .padding(8);

        column![text(label), input].spacing(4).into()
    }))
    .spacing(12)
    .into()
}
