//! Generation-based staleness guard for lineage fetches.
//!
//! Every request that will replace the displayed graph (focal selection,
//! explicit refresh, manual-lineage mutation) takes a ticket stamped with
//! the next value of a monotonic counter. A completed fetch is applied only
//! if its ticket still carries the latest generation; anything older lost
//! the race to a newer request and is dropped.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen {}", self.0)
    }
}

/// Why a fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchReason {
    Selection,
    Refresh,
    LineageMutation,
}

/// Handle for one in-flight fetch. Must be handed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: Generation,
    pub focal: Option<String>,
    pub reason: FetchReason,
}

#[derive(Debug, Default)]
pub struct GenerationCounter {
    current: Generation,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance and return the new generation.
    pub fn bump(&mut self) -> Generation {
        self.current = self.current.next();
        self.current
    }

    pub fn current(&self) -> Generation {
        self.current
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.current
    }
}
