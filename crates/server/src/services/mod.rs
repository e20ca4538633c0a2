//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, email verification, sessions and profile updates
//! - `contacts` - Owner-scoped contact CRUD with pagination
//! - `token` - Session token signing and verification
//! - `email` - Verification mail delivery
//! - `avatar` - Avatar upload storage

pub mod auth;
pub mod avatar;
pub mod contacts;
pub mod email;
pub mod token;
