//! Form state for adding and editing creators.
//!
//! Forms hold raw user input. Nothing reaches the record store until [`CreatorForm::validate`]
//! has turned that input into a [`NewCreator`].

use reqwest::Url;
use strum::Display;
use thiserror::Error;

use crate::repository::entities::{Creator, NewCreator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Field {
    Name,
    Url,
    Description,
    #[strum(serialize = "image url")]
    ImageUrl,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The {0} field is required")]
    Required(Field),
    #[error("Please enter a valid URL for the creator's channel")]
    InvalidUrl,
    #[error("Please enter a valid URL for the image")]
    InvalidImageUrl,
    #[error("No changes to save")]
    NoChanges,
}

/// Raw contents of the add or edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreatorForm {
    pub name: String,
    pub url: String,
    pub description: String,
    /// Optional. Left empty when there is no image.
    pub imageurl: String,
}

impl CreatorForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Name => self.name = value,
            Field::Url => self.url = value,
            Field::Description => self.description = value,
            Field::ImageUrl => self.imageurl = value,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Url => &self.url,
            Field::Description => &self.description,
            Field::ImageUrl => &self.imageurl,
        }
    }

    /// Every field as it would be submitted.
    fn trimmed(&self) -> [&str; 4] {
        [Field::Name, Field::Url, Field::Description, Field::ImageUrl]
            .map(|field| self.get(field).trim())
    }

    /// Check the form and produce the record store payload.
    ///
    /// Required fields are checked first, then the channel URL, then the image URL. Only the
    /// first problem is reported.
    pub fn validate(&self) -> Result<NewCreator, ValidationError> {
        for field in [Field::Name, Field::Url, Field::Description] {
            if self.get(field).trim().is_empty() {
                return Err(ValidationError::Required(field));
            }
        }

        if !is_absolute_url(self.url.trim()) {
            return Err(ValidationError::InvalidUrl);
        }

        let imageurl = match self.imageurl.trim() {
            "" => None,
            image if is_absolute_url(image) => Some(image.to_string()),
            _ => return Err(ValidationError::InvalidImageUrl),
        };

        Ok(NewCreator {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            description: self.description.trim().to_string(),
            imageurl,
        })
    }
}

impl From<NewCreator> for CreatorForm {
    fn from(fields: NewCreator) -> Self {
        Self {
            name: fields.name,
            url: fields.url,
            description: fields.description,
            imageurl: fields.imageurl.unwrap_or_default(),
        }
    }
}

impl From<&Creator> for CreatorForm {
    fn from(creator: &Creator) -> Self {
        creator.fields().into()
    }
}

/// The edit form: the record as loaded plus the user's draft of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    original: CreatorForm,
    pub draft: CreatorForm,
    submitting: bool,
}

impl EditForm {
    pub fn new(creator: &Creator) -> Self {
        let original = CreatorForm::from(creator);
        Self {
            draft: original.clone(),
            original,
            submitting: false,
        }
    }

    pub fn original(&self) -> &CreatorForm {
        &self.original
    }

    /// True when any field differs from the loaded record, ignoring surrounding whitespace.
    pub fn has_changes(&self) -> bool {
        self.draft.trimmed() != self.original.trimmed()
    }

    /// Whether the save action should be enabled.
    pub fn can_save(&self) -> bool {
        self.has_changes() && !self.submitting
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_submitting(&mut self, submitting: bool) {
        self.submitting = submitting;
    }

    /// Validate the draft and produce the update payload.
    pub fn submit(&self) -> Result<NewCreator, ValidationError> {
        if !self.has_changes() {
            return Err(ValidationError::NoChanges);
        }

        self.draft.validate()
    }

    /// Treat the current draft as the saved state.
    pub fn commit(&mut self) {
        self.original = self.draft.clone();
        self.submitting = false;
    }
}

fn is_absolute_url(input: &str) -> bool {
    // `Url::parse` only accepts absolute URLs, relative input fails with `RelativeUrlWithoutBase`
    Url::parse(input).is_ok()
}

#[cfg(test)]
mod test {
    use chrono::Utc;

    use super::*;
    use crate::repository::entities::CreatorId;

    fn filled() -> CreatorForm {
        CreatorForm {
            name: "MrBeast".into(),
            url: "https://youtube.com/@MrBeast".into(),
            description: "Big videos".into(),
            imageurl: "".into(),
        }
    }

    #[test]
    fn test_valid_form() {
        let fields = filled().validate().unwrap();

        assert_eq!(fields.name, "MrBeast");
        assert_eq!(fields.imageurl, None);
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut form = filled();
        form.name = "  MrBeast ".into();
        form.imageurl = " https://example.com/a.png ".into();

        let fields = form.validate().unwrap();

        assert_eq!(fields.name, "MrBeast");
        assert_eq!(fields.imageurl.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn test_required_fields() {
        let mut form = filled();
        form.description = "   ".into();

        assert_eq!(
            form.validate(),
            Err(ValidationError::Required(Field::Description))
        );
        assert_eq!(
            CreatorForm::new().validate(),
            Err(ValidationError::Required(Field::Name))
        );
    }

    #[test]
    fn test_invalid_url() {
        let mut form = filled();
        form.url = "not-a-url".into();

        assert_eq!(form.validate(), Err(ValidationError::InvalidUrl));
        assert_eq!(
            ValidationError::InvalidUrl.to_string(),
            "Please enter a valid URL for the creator's channel"
        );
    }

    #[test]
    fn test_invalid_image_url() {
        let mut form = filled();
        form.imageurl = "/images/me.png".into();

        assert_eq!(form.validate(), Err(ValidationError::InvalidImageUrl));
    }

    #[test]
    fn test_field_display() {
        assert_eq!(Field::ImageUrl.to_string(), "image url");
        assert_eq!(
            ValidationError::Required(Field::Name).to_string(),
            "The name field is required"
        );
    }

    #[test]
    fn test_edit_form_unchanged_cannot_save() {
        let creator = Creator::new(CreatorId(1), Utc::now(), filled().validate().unwrap());
        let form = EditForm::new(&creator);

        assert!(!form.has_changes());
        assert!(!form.can_save());
        assert_eq!(form.submit(), Err(ValidationError::NoChanges));
    }

    #[test]
    fn test_edit_form_change_enables_save() {
        let creator = Creator::new(CreatorId(1), Utc::now(), filled().validate().unwrap());
        let mut form = EditForm::new(&creator);

        form.draft.set(Field::ImageUrl, "https://example.com/a.png".into());

        assert!(form.can_save());
        assert_eq!(
            form.submit().unwrap().imageurl.as_deref(),
            Some("https://example.com/a.png")
        );

        form.set_submitting(true);
        assert!(!form.can_save());
    }

    #[test]
    fn test_edit_form_reverting_change_disables_save() {
        let creator = Creator::new(CreatorId(1), Utc::now(), filled().validate().unwrap());
        let mut form = EditForm::new(&creator);

        form.draft.set(Field::Name, "Someone else".into());
        form.draft.set(Field::Name, "MrBeast".into());

        assert!(!form.can_save());
    }

    #[test]
    fn test_edit_form_whitespace_edit_is_not_a_change() {
        let creator = Creator::new(CreatorId(1), Utc::now(), filled().validate().unwrap());
        let mut form = EditForm::new(&creator);

        form.draft.set(Field::Name, "  MrBeast ".into());
        form.draft.set(Field::ImageUrl, "   ".into());

        assert!(!form.has_changes());
        assert!(!form.can_save());
        assert_eq!(form.submit(), Err(ValidationError::NoChanges));

        form.draft.set(Field::Description, " Bigger videos ".into());
        assert!(form.can_save());
        assert_eq!(form.submit().unwrap().description, "Bigger videos");
    }

    #[test]
    fn test_edit_form_commit() {
        let creator = Creator::new(CreatorId(1), Utc::now(), filled().validate().unwrap());
        let mut form = EditForm::new(&creator);

        form.draft.set(Field::Description, "Even bigger videos".into());
        form.set_submitting(true);
        form.commit();

        assert!(!form.has_changes());
        assert!(!form.is_submitting());
        assert_eq!(form.original().description, "Even bigger videos");
    }
}
