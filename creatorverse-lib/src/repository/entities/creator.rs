use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a [`Creator`] by the record store.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CreatorId(pub i64);

/// A content creator record, as stored in the `creators` table.
///
/// `id` and `created_at` are assigned by the record store and never change
/// afterwards, so they are only exposed through getters.
#[derive(Debug, Clone, PartialEq, Eq, Getters, CopyGetters, Serialize, Deserialize)]
pub struct Creator {
    #[getset(get_copy = "pub")]
    id: CreatorId,
    #[getset(get = "pub")]
    name: String,
    #[getset(get = "pub")]
    url: String,
    #[getset(get = "pub")]
    description: String,
    #[serde(default)]
    #[getset(get = "pub")]
    imageurl: Option<String>,
    #[getset(get_copy = "pub")]
    created_at: DateTime<Utc>,
}

impl Creator {
    /// Build a [`Creator`] from the fields the record store assigns plus the editable ones.
    pub fn new(id: CreatorId, created_at: DateTime<Utc>, fields: NewCreator) -> Self {
        Self {
            id,
            name: fields.name,
            url: fields.url,
            description: fields.description,
            imageurl: fields.imageurl,
            created_at,
        }
    }

    /// The user editable part of this record.
    pub fn fields(&self) -> NewCreator {
        NewCreator {
            name: self.name.clone(),
            url: self.url.clone(),
            description: self.description.clone(),
            imageurl: self.imageurl.clone(),
        }
    }

    /// Replace every user editable field at once, keeping `id` and `created_at`.
    pub(crate) fn apply(&mut self, fields: NewCreator) {
        self.name = fields.name;
        self.url = fields.url;
        self.description = fields.description;
        self.imageurl = fields.imageurl;
    }
}

impl Display for Creator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The user editable fields of a [`Creator`]. This is the payload of both inserts and updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCreator {
    pub name: String,
    pub url: String,
    pub description: String,
    pub imageurl: Option<String>,
}
