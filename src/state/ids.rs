//! Record identities.
//!
//! Games, slot queues and tickets are addressed by stable integer ids handed
//! out by the [`Ledger`](super::ledger::Ledger). Players, owners and wallets
//! are external identities carried as opaque strings.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An external identity: a player, a game owner, a payout wallet or the
/// registry authority.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Identity {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "-{}"), self.0)
            }
        }
    };
}

record_id!(
    /// Identity of a game record.
    GameId,
    "game"
);
record_id!(
    /// Identity of one slot's queue record.
    QueueId,
    "queue"
);
record_id!(
    /// Identity of a waiting participant's ticket.
    TicketId,
    "ticket"
);

/// Render an optional id the way error messages and logs expect, with the
/// empty sentinel spelled out.
pub fn describe<T: fmt::Display>(id: Option<T>) -> String {
    match id {
        Some(id) => id.to_string(),
        None => "empty".to_string(),
    }
}
