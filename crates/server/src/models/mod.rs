//! Domain models.
//!
//! These types represent validated domain objects separate from database row
//! types. Response shapes that clients see live next to the model they expose.

pub mod contact;
pub mod user;

pub use contact::{Contact, ContactDraft, ContactFilter};
pub use user::{CurrentUser, NewUser, User, UserView};
