//! # Table Registry
//!
//! Static encounter tables for both game variants, looked up by table
//! identity hash.
//!
//! The registry is populated once from the embedder's bundled game data and
//! never mutated afterwards; lookups are exact-match scans over small ordered
//! collections and need no locking. A hash that matches nothing is a
//! data-integrity failure ([`crate::DenError::TableNotFound`]) and always
//! propagates: a missing table and an empty-but-valid table are different
//! facts.

use crate::{DenError, DenResult};
use serde::{Deserialize, Serialize};

/// The two mutually exclusive editions of the release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameVariant {
    Dawn,
    Dusk,
}

/// Which registry collection a lookup addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableKind {
    /// Common-variant tables for ordinary dens
    Common,
    /// Rare-variant tables for ordinary dens
    Rare,
    /// Event-exclusive tables
    Event,
    /// Crystal-locked tables, shared by both variants
    Crystal,
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TableKind::Common => "common",
            TableKind::Rare => "rare",
            TableKind::Event => "event",
            TableKind::Crystal => "crystal",
        };
        f.write_str(name)
    }
}

/// One encounter a table can offer.
///
/// Star availability is a bitmask with bit `n` standing for tier `n + 1`, so
/// a template enabled for 3★ through 5★ carries `0b11100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterTemplate {
    /// National species number
    pub species: u16,
    /// Alternate form index
    pub form: u8,
    /// Star tiers this template is enabled for, bits 0..=4 for 1★..=5★
    pub star_mask: u8,
    /// Guaranteed perfect stats on the generated creature
    pub flawless_ivs: u8,
}

impl EncounterTemplate {
    /// Whether this template remains obtainable at or above `min_stars`.
    ///
    /// The filter is monotone: raising the threshold never adds a template.
    ///
    /// # Examples
    ///
    /// ```
    /// use denwarden::EncounterTemplate;
    ///
    /// let template = EncounterTemplate {
    ///     species: 131,
    ///     form: 0,
    ///     star_mask: 0b00110, // 2★ and 3★
    ///     flawless_ivs: 3,
    /// };
    /// assert!(template.is_obtainable_at_stars(0));
    /// assert!(template.is_obtainable_at_stars(3));
    /// assert!(!template.is_obtainable_at_stars(4));
    /// ```
    pub fn is_obtainable_at_stars(&self, min_stars: u8) -> bool {
        if min_stars <= 1 {
            return self.star_mask != 0;
        }
        if min_stars > crate::config::MAX_STAR_TIER {
            return false;
        }
        self.star_mask >> (min_stars - 1) != 0
    }

    /// Whether this template appears at any tier a trainer with the given
    /// star access can already face.
    pub fn is_unlocked_at(&self, star_access: u8) -> bool {
        if star_access == 0 {
            return false;
        }
        let access = star_access.min(crate::config::MAX_STAR_TIER);
        let reachable = (1u16 << access) - 1;
        self.star_mask as u16 & reachable != 0
    }
}

/// An encounter table keyed by its identity hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterTable {
    /// Identity this table is selected by
    pub table_hash: u32,
    /// Ordered encounter templates
    pub templates: Vec<EncounterTemplate>,
}

/// An ordered list of tables belonging to one registry slot.
///
/// At most one table per identity hash is expected; [`find`](Self::find)
/// returns the first exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCollection {
    kind: TableKind,
    tables: Vec<EncounterTable>,
}

impl TableCollection {
    /// Creates a collection of the given kind.
    pub fn new(kind: TableKind, tables: Vec<EncounterTable>) -> Self {
        Self { kind, tables }
    }

    /// Which registry slot this collection fills.
    pub fn kind(&self) -> TableKind {
        self.kind
    }

    /// Exact-match lookup by table identity hash.
    pub fn find(&self, hash: u32) -> DenResult<&EncounterTable> {
        self.tables
            .iter()
            .find(|table| table.table_hash == hash)
            .ok_or(DenError::TableNotFound {
                kind: self.kind,
                hash,
            })
    }

    /// Iterates over tables in data order.
    pub fn iter(&self) -> impl Iterator<Item = &EncounterTable> {
        self.tables.iter()
    }
}

/// The three variant-specific collections of one edition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantTables {
    pub common: TableCollection,
    pub rare: TableCollection,
    pub event: TableCollection,
}

impl VariantTables {
    /// Builds one edition's collections from its raw table lists.
    pub fn new(
        common: Vec<EncounterTable>,
        rare: Vec<EncounterTable>,
        event: Vec<EncounterTable>,
    ) -> Self {
        Self {
            common: TableCollection::new(TableKind::Common, common),
            rare: TableCollection::new(TableKind::Rare, rare),
            event: TableCollection::new(TableKind::Event, event),
        }
    }
}

/// All static encounter tables for one game release.
///
/// Holds the per-variant common/rare/event collections plus the crystal
/// collection both variants share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRegistry {
    dawn: VariantTables,
    dusk: VariantTables,
    crystal: TableCollection,
}

// Serde shadow of the registry's on-disk JSON shape; the public types carry
// collection kinds the data file doesn't repeat.
#[derive(Serialize, Deserialize)]
struct RegistryData {
    dawn: VariantData,
    dusk: VariantData,
    crystal: Vec<EncounterTable>,
}

#[derive(Serialize, Deserialize)]
struct VariantData {
    common: Vec<EncounterTable>,
    rare: Vec<EncounterTable>,
    event: Vec<EncounterTable>,
}

impl TableRegistry {
    /// Assembles a registry from already-built collections.
    pub fn new(dawn: VariantTables, dusk: VariantTables, crystal: Vec<EncounterTable>) -> Self {
        Self {
            dawn,
            dusk,
            crystal: TableCollection::new(TableKind::Crystal, crystal),
        }
    }

    /// Parses a registry from the embedder's static game data JSON.
    pub fn from_json_str(data: &str) -> DenResult<Self> {
        let raw: RegistryData = serde_json::from_str(data)?;
        Ok(Self::new(
            VariantTables::new(raw.dawn.common, raw.dawn.rare, raw.dawn.event),
            VariantTables::new(raw.dusk.common, raw.dusk.rare, raw.dusk.event),
            raw.crystal,
        ))
    }

    /// The variant-specific collections of one edition.
    pub fn variant(&self, variant: GameVariant) -> &VariantTables {
        match variant {
            GameVariant::Dawn => &self.dawn,
            GameVariant::Dusk => &self.dusk,
        }
    }

    /// The crystal collection, identical for both editions.
    pub fn crystal(&self) -> &TableCollection {
        &self.crystal
    }

    /// Selects the collection a den category resolves against.
    pub fn collection(&self, variant: GameVariant, kind: TableKind) -> &TableCollection {
        match kind {
            TableKind::Common => &self.variant(variant).common,
            TableKind::Rare => &self.variant(variant).rare,
            TableKind::Event => &self.variant(variant).event,
            TableKind::Crystal => &self.crystal,
        }
    }
}
