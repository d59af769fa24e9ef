//! # Resolution Engine
//!
//! The per-session [`DenManager`] and the collaborator seams it drives.
//!
//! A manager owns one loaded save's den index plus the session's variant,
//! trainer identity, and progression, and borrows the process-wide table
//! registry through an [`Arc`]. Every query is a pure lookup: resolving a den
//! picks the right collection by the den's category, finds the table by
//! identity hash, and either filters templates ([`DenManager::candidates_at`])
//! or hands exactly one table to the embedder's converter
//! ([`DenManager::generate`]). Query failures never touch session state, so a
//! missing table poisons nothing but the one call that hit it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalogue::LocationCatalogue;
use crate::config::{CRYSTAL_TABLE_HASH, EVENT_TABLE_HASH, MAX_STAR_TIER};
use crate::index::{Den, DenIndex};
use crate::save::{import_regions, DenKind, RegionSpawnBlock};
use crate::tables::{EncounterTable, EncounterTemplate, GameVariant, TableKind, TableRegistry};
use crate::{DenError, DenResult};

/// The trainer identity pair a generated encounter is stamped with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerIdentity {
    /// Visible trainer id
    pub trainer_id: u32,
    /// Secret trainer id
    pub secret_id: u32,
}

/// Session progression state relevant to den resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainerProgress {
    /// Gym badge bitfield as stored in the save
    pub badge_flags: u32,
}

impl TrainerProgress {
    /// Highest den star tier this trainer can face: one per badge earned,
    /// capped at the top tier. An empty bitfield means no save progression
    /// was supplied and unlocks everything.
    ///
    /// # Examples
    ///
    /// ```
    /// use denwarden::TrainerProgress;
    ///
    /// assert_eq!(TrainerProgress { badge_flags: 0b0111 }.star_access(), 3);
    /// assert_eq!(TrainerProgress { badge_flags: 0xFF }.star_access(), 5);
    /// assert_eq!(TrainerProgress { badge_flags: 0 }.star_access(), 5);
    /// ```
    pub fn star_access(&self) -> u8 {
        let badges = self.badge_flags.count_ones() as u8;
        if badges == 0 {
            MAX_STAR_TIER
        } else {
            badges.min(MAX_STAR_TIER)
        }
    }
}

/// Materializes a concrete encounter instance from a resolved table.
///
/// Implemented by the embedding application; stat rolls, held items, and the
/// binary creature record all live behind this seam.
pub trait EncounterConverter {
    /// Concrete encounter record produced by the embedder.
    type Instance;

    /// Turns the selected source table into one encounter instance.
    fn convert(
        &self,
        source: &EncounterTable,
        context_hash: u32,
        trainer: TrainerIdentity,
    ) -> DenResult<Self::Instance>;
}

/// Supplies the location-derived context hash event dens are generated with.
pub trait EventContextHasher {
    /// Context hash keyed on the den's identity.
    fn event_hash(&self, den: &Den) -> u32;
}

/// One loaded save session's view of the den system.
///
/// Holds the immutable den index built for this save and answers per-den
/// queries against the shared table registry. Dropped and rebuilt wholesale
/// when a different save is loaded.
pub struct DenManager {
    registry: Arc<TableRegistry>,
    dens: DenIndex,
    variant: GameVariant,
    trainer: TrainerIdentity,
    progress: TrainerProgress,
}

impl DenManager {
    /// Creates a session around an already-built den index.
    pub fn new(
        registry: Arc<TableRegistry>,
        dens: DenIndex,
        variant: GameVariant,
        trainer: TrainerIdentity,
        progress: TrainerProgress,
    ) -> Self {
        Self {
            registry,
            dens,
            variant,
            trainer,
            progress,
        }
    }

    /// Builds a session straight from a save's region spawn blocks.
    ///
    /// Import or index failures abort session construction; there is no
    /// partially-built manager to observe.
    #[allow(clippy::too_many_arguments)]
    pub fn from_save(
        registry: Arc<TableRegistry>,
        catalogue: &LocationCatalogue,
        mainland: &RegionSpawnBlock,
        isle: &RegionSpawnBlock,
        highlands: &RegionSpawnBlock,
        variant: GameVariant,
        trainer: TrainerIdentity,
        progress: TrainerProgress,
    ) -> DenResult<Self> {
        let records = import_regions(mainland, isle, highlands)?;
        let dens = DenIndex::build(records, catalogue)?;
        Ok(Self::new(registry, dens, variant, trainer, progress))
    }

    /// The session's den index.
    pub fn dens(&self) -> &DenIndex {
        &self.dens
    }

    /// Returns the den at the given global index, if any.
    pub fn den(&self, index: usize) -> Option<&Den> {
        self.dens.get(index)
    }

    /// Edition this session resolves against.
    pub fn variant(&self) -> GameVariant {
        self.variant
    }

    /// Trainer identity generated encounters are stamped with.
    pub fn trainer(&self) -> TrainerIdentity {
        self.trainer
    }

    /// Session progression state.
    pub fn progress(&self) -> TrainerProgress {
        self.progress
    }

    /// Resolves the candidate templates a den can offer at or above the given
    /// star threshold.
    ///
    /// Crystal dens return their fixed table unfiltered; event dens return
    /// the variant's event table filtered by stars; ordinary dens return the
    /// union of their location's common and rare tables, common entries
    /// first. The union is deliberately not deduplicated: a den can carry
    /// both reward tiers at once, and collapsing them is a presentation
    /// decision this engine does not make.
    pub fn candidates_at(
        &self,
        den: &Den,
        min_stars: u8,
    ) -> DenResult<Vec<&EncounterTemplate>> {
        self.filtered_candidates(den, |template| template.is_obtainable_at_stars(min_stars))
    }

    /// Resolves the candidates this session's trainer has already unlocked,
    /// using the badge-derived star access as the filter.
    pub fn candidates(&self, den: &Den) -> DenResult<Vec<&EncounterTemplate>> {
        let access = self.progress.star_access();
        self.filtered_candidates(den, |template| template.is_unlocked_at(access))
    }

    fn filtered_candidates<F>(&self, den: &Den, filter: F) -> DenResult<Vec<&EncounterTemplate>>
    where
        F: Fn(&EncounterTemplate) -> bool,
    {
        match den.kind() {
            DenKind::Crystal => {
                // Crystal encounters are unconditionally obtainable.
                let table = self.registry.crystal().find(CRYSTAL_TABLE_HASH)?;
                Ok(table.templates.iter().collect())
            }
            DenKind::Event => {
                let table = self
                    .registry
                    .collection(self.variant, TableKind::Event)
                    .find(EVENT_TABLE_HASH)?;
                Ok(table.templates.iter().filter(|t| filter(t)).collect())
            }
            DenKind::Ordinary { .. } => {
                let common = self
                    .registry
                    .collection(self.variant, TableKind::Common)
                    .find(den.location.common_hash)?;
                let rare = self
                    .registry
                    .collection(self.variant, TableKind::Rare)
                    .find(den.location.rare_hash)?;
                Ok(common
                    .templates
                    .iter()
                    .chain(rare.templates.iter())
                    .filter(|t| filter(t))
                    .collect())
            }
        }
    }

    /// Materializes one concrete encounter for a den by delegating to the
    /// embedder's converter.
    ///
    /// Resolves to exactly one source table: the fixed crystal table, the
    /// variant's event table with the hasher's location-derived context, or
    /// the ordinary den's rare/common table with that table's own identity as
    /// context. A missing table fails this call with
    /// [`DenError::TemplateSourceMissing`] and leaves the session untouched.
    pub fn generate<C, H>(&self, den: &Den, converter: &C, hasher: &H) -> DenResult<C::Instance>
    where
        C: EncounterConverter,
        H: EventContextHasher,
    {
        let (kind, hash, context) = match den.kind() {
            DenKind::Crystal => (TableKind::Crystal, CRYSTAL_TABLE_HASH, CRYSTAL_TABLE_HASH),
            DenKind::Event => (TableKind::Event, EVENT_TABLE_HASH, hasher.event_hash(den)),
            DenKind::Ordinary { rare } => {
                let (kind, hash) = if rare {
                    (TableKind::Rare, den.location.rare_hash)
                } else {
                    (TableKind::Common, den.location.common_hash)
                };
                (kind, hash, hash)
            }
        };

        let table = self
            .registry
            .collection(self.variant, kind)
            .find(hash)
            .map_err(|_| DenError::TemplateSourceMissing {
                den: den.global_index,
                kind,
                hash,
            })?;
        converter.convert(table, context, self.trainer)
    }
}

impl std::ops::Index<usize> for DenManager {
    type Output = Den;

    fn index(&self, index: usize) -> &Den {
        &self.dens[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Location;
    use crate::save::{Region, SpawnRecord};
    use crate::tables::VariantTables;

    const COMMON_HASH: u32 = 0x1111_1111;
    const RARE_HASH: u32 = 0x2222_2222;

    fn template(species: u16, star_mask: u8) -> EncounterTemplate {
        EncounterTemplate {
            species,
            form: 0,
            star_mask,
            flawless_ivs: 4,
        }
    }

    fn registry() -> Arc<TableRegistry> {
        let common = vec![EncounterTable {
            table_hash: COMMON_HASH,
            templates: vec![template(1, 0b00001), template(2, 0b11111)],
        }];
        let rare = vec![EncounterTable {
            table_hash: RARE_HASH,
            templates: vec![template(2, 0b11111), template(3, 0b10000)],
        }];
        let event = vec![EncounterTable {
            table_hash: EVENT_TABLE_HASH,
            templates: vec![template(50, 0b00011), template(51, 0b11000)],
        }];
        let crystal = vec![EncounterTable {
            table_hash: CRYSTAL_TABLE_HASH,
            templates: vec![template(150, 0b10000)],
        }];
        Arc::new(TableRegistry::new(
            VariantTables::new(common, rare, event),
            VariantTables::new(Vec::new(), Vec::new(), Vec::new()),
            crystal,
        ))
    }

    fn spawn(is_event: bool, is_crystal: bool, is_rare: bool) -> SpawnRecord {
        SpawnRecord {
            region: Region::Mainland,
            seed: 0x1234,
            stars: 3,
            random_roll: 7,
            is_event,
            is_crystal,
            is_rare,
            raw: [0; crate::config::RAW_RECORD_LEN],
        }
    }

    fn den(is_event: bool, is_crystal: bool, is_rare: bool) -> Den {
        Den {
            global_index: 0,
            spawn: spawn(is_event, is_crystal, is_rare),
            location: Location {
                id: 9,
                map_x: 1.0,
                map_y: 2.0,
                common_hash: COMMON_HASH,
                rare_hash: RARE_HASH,
            },
        }
    }

    fn manager() -> DenManager {
        DenManager::new(
            registry(),
            DenIndex::build(Vec::new(), &LocationCatalogue::new(Vec::new())).unwrap(),
            GameVariant::Dawn,
            TrainerIdentity {
                trainer_id: 54321,
                secret_id: 12345,
            },
            TrainerProgress { badge_flags: 0b11 },
        )
    }

    struct RecordingConverter;

    impl EncounterConverter for RecordingConverter {
        type Instance = (u32, u32, u32);

        fn convert(
            &self,
            source: &EncounterTable,
            context_hash: u32,
            trainer: TrainerIdentity,
        ) -> DenResult<Self::Instance> {
            Ok((source.table_hash, context_hash, trainer.trainer_id))
        }
    }

    struct FixedHasher(u32);

    impl EventContextHasher for FixedHasher {
        fn event_hash(&self, _den: &Den) -> u32 {
            self.0
        }
    }

    #[test]
    fn test_ordinary_candidates_union_common_then_rare() {
        let manager = manager();
        let candidates = manager.candidates_at(&den(false, false, false), 0).unwrap();
        let species: Vec<u16> = candidates.iter().map(|t| t.species).collect();
        // Species 2 appears in both tables and stays duplicated.
        assert_eq!(species, vec![1, 2, 2, 3]);
    }

    #[test]
    fn test_ordinary_candidates_star_filtered() {
        let manager = manager();
        let candidates = manager.candidates_at(&den(false, false, true), 5).unwrap();
        let species: Vec<u16> = candidates.iter().map(|t| t.species).collect();
        assert_eq!(species, vec![2, 2, 3]);
    }

    #[test]
    fn test_event_candidates_use_fixed_hash() {
        let manager = manager();
        let candidates = manager.candidates_at(&den(true, false, false), 4).unwrap();
        let species: Vec<u16> = candidates.iter().map(|t| t.species).collect();
        assert_eq!(species, vec![51]);
    }

    #[test]
    fn test_crystal_candidates_skip_star_filter() {
        let manager = manager();
        // Threshold above every enabled tier; crystal still returns everything.
        let candidates = manager.candidates_at(&den(false, true, false), 5).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].species, 150);
    }

    #[test]
    fn test_crystal_wins_over_other_flags() {
        let manager = manager();
        let candidates = manager.candidates_at(&den(true, true, true), 0).unwrap();
        let species: Vec<u16> = candidates.iter().map(|t| t.species).collect();
        assert_eq!(species, vec![150]);
    }

    #[test]
    fn test_badge_limited_candidates() {
        // Two badges: only templates reachable at 1★ or 2★ qualify.
        let manager = manager();
        let candidates = manager.candidates(&den(false, false, false)).unwrap();
        let species: Vec<u16> = candidates.iter().map(|t| t.species).collect();
        assert_eq!(species, vec![1, 2, 2]);
    }

    #[test]
    fn test_missing_common_table_propagates() {
        let manager = manager();
        let mut bad = den(false, false, false);
        bad.location.common_hash = 0xDEAD_0000;
        let err = manager.candidates_at(&bad, 0).unwrap_err();
        assert!(matches!(
            err,
            DenError::TableNotFound {
                kind: TableKind::Common,
                hash: 0xDEAD_0000,
            }
        ));
    }

    #[test]
    fn test_generate_ordinary_common() {
        let manager = manager();
        let instance = manager
            .generate(&den(false, false, false), &RecordingConverter, &FixedHasher(0))
            .unwrap();
        assert_eq!(instance, (COMMON_HASH, COMMON_HASH, 54321));
    }

    #[test]
    fn test_generate_ordinary_rare_selects_single_table() {
        let manager = manager();
        let instance = manager
            .generate(&den(false, false, true), &RecordingConverter, &FixedHasher(0))
            .unwrap();
        assert_eq!(instance, (RARE_HASH, RARE_HASH, 54321));
    }

    #[test]
    fn test_generate_event_uses_location_derived_context() {
        let manager = manager();
        let instance = manager
            .generate(&den(true, false, false), &RecordingConverter, &FixedHasher(0xFEED))
            .unwrap();
        assert_eq!(instance, (EVENT_TABLE_HASH, 0xFEED, 54321));
    }

    #[test]
    fn test_generate_crystal_ignores_hasher() {
        let manager = manager();
        let instance = manager
            .generate(&den(false, true, true), &RecordingConverter, &FixedHasher(0xFEED))
            .unwrap();
        assert_eq!(instance, (CRYSTAL_TABLE_HASH, CRYSTAL_TABLE_HASH, 54321));
    }

    #[test]
    fn test_generate_missing_table_reports_source() {
        let manager = manager();
        let mut bad = den(false, false, true);
        bad.location.rare_hash = 0xDEAD_0001;
        bad.global_index = 17;
        let err = manager
            .generate(&bad, &RecordingConverter, &FixedHasher(0))
            .unwrap_err();
        assert!(matches!(
            err,
            DenError::TemplateSourceMissing {
                den: 17,
                kind: TableKind::Rare,
                hash: 0xDEAD_0001,
            }
        ));

        // The failed call leaves the session fully usable.
        assert!(manager
            .generate(&den(false, false, false), &RecordingConverter, &FixedHasher(0))
            .is_ok());
    }
}
