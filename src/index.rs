//! # Den Index
//!
//! Merges a save's imported spawn records into one contiguous, globally
//! indexed sequence of [`Den`]s, each paired with its catalogue location.
//!
//! The pairing is positional: den `i` of the merged sequence belongs to
//! catalogue entry `i`. That correspondence is established exactly once, at
//! build time, and the paired [`Location`] is stored inside the den so no
//! call site ever re-derives it.

use crate::catalogue::{Location, LocationCatalogue};
use crate::save::{DenKind, SpawnRecord};
use crate::{DenError, DenResult};
use serde::{Deserialize, Serialize};

/// One addressable den: a spawn record bound to its physical location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Den {
    /// Position in the merged region sequence; unique and contiguous from 0
    pub global_index: u32,
    /// The save-derived spawn state
    pub spawn: SpawnRecord,
    /// The catalogue entry paired with this den at build time
    pub location: Location,
}

impl Den {
    /// Resolution category of this den.
    pub fn kind(&self) -> DenKind {
        self.spawn.kind()
    }
}

/// The ordered den sequence for one loaded save session.
///
/// Immutable after [`build`](DenIndex::build): a new save load produces a new
/// index rather than mutating this one, so shared references stay valid for
/// the whole session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenIndex {
    dens: Vec<Den>,
}

impl DenIndex {
    /// Builds the index by pairing each spawn record with the catalogue entry
    /// at the same global position.
    ///
    /// Fails with [`DenError::CatalogueExhausted`] when the save holds more
    /// live dens than the catalogue knows sites, which signals a static-data
    /// and game-version mismatch rather than anything recoverable.
    pub fn build(records: Vec<SpawnRecord>, catalogue: &LocationCatalogue) -> DenResult<Self> {
        if records.len() > catalogue.len() {
            return Err(DenError::CatalogueExhausted {
                needed: records.len(),
                available: catalogue.len(),
            });
        }

        let dens = records
            .into_iter()
            .enumerate()
            .map(|(i, spawn)| Den {
                global_index: i as u32,
                spawn,
                location: catalogue[i],
            })
            .collect();
        Ok(Self { dens })
    }

    /// Number of dens in the session.
    pub fn len(&self) -> usize {
        self.dens.len()
    }

    /// Returns true if the session has no live dens.
    pub fn is_empty(&self) -> bool {
        self.dens.is_empty()
    }

    /// Returns the den at the given global index, if any.
    pub fn get(&self, index: usize) -> Option<&Den> {
        self.dens.get(index)
    }

    /// Iterates over dens in global-index order.
    pub fn iter(&self) -> impl Iterator<Item = &Den> {
        self.dens.iter()
    }
}

impl std::ops::Index<usize> for DenIndex {
    type Output = Den;

    fn index(&self, index: usize) -> &Den {
        &self.dens[index]
    }
}
