//! Phonebook Core - Shared domain types.
//!
//! This crate provides the validated types used across all Phonebook components:
//! - `server` - HTTP API for authentication and contacts
//! - `cli` - Command-line tools for migrations and user support
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, phones, names and plans

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
