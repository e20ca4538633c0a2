//! Subscription plan for a user account.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a string is not one of the known plans.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("subscription must be one of: starter, pro, business (got {0:?})")]
pub struct SubscriptionError(pub String);

/// Subscription plan.
///
/// Stored and serialized in lower case. New accounts start on `Starter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Subscription {
    #[default]
    Starter,
    Pro,
    Business,
}

impl Subscription {
    /// All plans, in ascending order.
    pub const ALL: [Self; 3] = [Self::Starter, Self::Pro, Self::Business];

    /// Returns the lower-case wire/database name of the plan.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Pro => "pro",
            Self::Business => "business",
        }
    }
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Subscription {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|plan| plan.as_str() == s)
            .ok_or_else(|| SubscriptionError(s.to_owned()))
    }
}

#[cfg(feature = "postgres")]
impl_pg_text!(Subscription, <Subscription as FromStr>::from_str);
