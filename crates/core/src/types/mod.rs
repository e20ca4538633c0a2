//! Core types for Phonebook.
//!
//! This module provides type-safe wrappers for common domain concepts.

/// `TEXT` column support for a validated string newtype.
///
/// Decoding runs the type's parser again, so a row that no longer satisfies
/// the type's rules surfaces as a column decode error instead of an
/// invalid value.
#[cfg(feature = "postgres")]
macro_rules! impl_pg_text {
    ($name:ty, $parse:expr) => {
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let raw = <&str as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(($parse)(raw)?)
            }
        }

        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::core::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <&str as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

pub mod contact;
pub mod email;
pub mod id;
pub mod subscription;

pub use contact::{ContactEmail, ContactName, ContactNameError, Phone, PhoneError};
pub use email::{Email, EmailError};
pub use id::*;
pub use subscription::{Subscription, SubscriptionError};
