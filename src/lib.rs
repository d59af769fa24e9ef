//! # Denwarden
//!
//! A den encounter resolution engine for creature-collector save sessions.
//!
//! ## Architecture Overview
//!
//! Denwarden answers one question: which creature encounters can a given map
//! den offer right now? It is built from a handful of small, layered pieces:
//!
//! - **Location Catalogue**: static, ordered reference data for every physical
//!   den site, including the table identity hashes each site draws from
//! - **Spawn Record Importer**: normalizes the three region-specific raw
//!   spawn lists found in a loaded save into uniform spawn records
//! - **Den Index**: merges the imported records into one contiguous,
//!   globally-indexed sequence, pairing each with its catalogue location
//! - **Table Registry**: the static encounter tables for both game variants,
//!   looked up by table identity hash
//! - **Resolution Engine**: the per-session [`DenManager`] that resolves a
//!   den into candidate templates or a single generated encounter
//!
//! The catalogue and registry are loaded once and shared read-only across the
//! process; the den index is rebuilt for every loaded save. Materializing a
//! concrete creature from a resolved table is delegated to an embedder-supplied
//! [`EncounterConverter`], so this crate stays a pure, deterministic
//! computation over in-memory data.

pub mod catalogue;
pub mod engine;
pub mod index;
pub mod save;
pub mod tables;

// Core module re-exports
pub use catalogue::*;
pub use engine::*;
pub use index::*;
pub use save::*;
pub use tables::*;

/// Core error type for the denwarden engine.
#[derive(thiserror::Error, Debug)]
pub enum DenError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A raw spawn record could not be normalized
    #[error("Malformed spawn data in {region}: {reason}")]
    MalformedSpawnData {
        region: save::Region,
        reason: String,
    },

    /// More live dens than known physical locations
    #[error("Den index needs {needed} locations but the catalogue holds {available}")]
    CatalogueExhausted { needed: usize, available: usize },

    /// A registry collection has no table with the requested identity
    #[error("No {kind} table with identity {hash:#010x}")]
    TableNotFound { kind: tables::TableKind, hash: u32 },

    /// Single-instance generation could not resolve its source table
    #[error("Den {den}: {kind} table {hash:#010x} is missing from the registry")]
    TemplateSourceMissing {
        den: u32,
        kind: tables::TableKind,
        hash: u32,
    },
}

/// Result type used throughout the denwarden codebase.
pub type DenResult<T> = Result<T, DenError>;

/// Version information for the crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine-wide constants fixed by the shipped game data.
pub mod config {
    /// Identity of the single crystal encounter table, shared by both variants
    pub const CRYSTAL_TABLE_HASH: u32 = 0;

    /// Identity shared by all event dens within a variant's event collection
    pub const EVENT_TABLE_HASH: u32 = 0x811C_9DC5;

    /// Highest star rating an encounter table can carry
    pub const MAX_STAR_TIER: u8 = 5;

    /// Size in bytes of one raw spawn record inside a region block
    pub const RAW_RECORD_LEN: usize = 16;
}
