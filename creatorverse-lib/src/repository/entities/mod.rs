//! Core domain entities for Creatorverse.
//!
//! There is a single entity, the [`Creator`]. [`NewCreator`] carries the part of it a user can
//! edit, which is what gets sent to the record store on insert and update.

mod creator;

pub use creator::{Creator, CreatorId, NewCreator};
