//! # Spawn Record Importer
//!
//! Normalizes the raw per-region den spawn lists found in a loaded save into
//! uniform [`SpawnRecord`]s.
//!
//! The save keeps one spawn block per region (the base game map plus the two
//! expansion maps), each a run of fixed-size raw records preceded by a count
//! of how many slots are actually populated. The shipped game is known to
//! misreport that count, so the importer clamps it to the number of whole
//! records present rather than trusting it.

use crate::config::RAW_RECORD_LEN;
use crate::{DenError, DenResult};
use log::warn;
use serde::{Deserialize, Serialize};

/// The three world regions that carry den spawn blocks, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// Base game overworld
    Mainland,
    /// First expansion map
    Isle,
    /// Second expansion map
    Highlands,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Region::Mainland => "Mainland",
            Region::Isle => "Isle",
            Region::Highlands => "Highlands",
        };
        f.write_str(name)
    }
}

/// One region's den spawn block exactly as it sits in the save file.
///
/// `declared_used` is the save's own count of populated slots. It is treated
/// as a hint, not a fact: [`import_regions`] clamps it to the records actually
/// present in `data`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionSpawnBlock {
    /// Region this block belongs to
    pub region: Region,
    /// Populated-slot count as reported by the save
    pub declared_used: u32,
    /// Concatenated fixed-size raw spawn records
    pub data: Vec<u8>,
}

impl RegionSpawnBlock {
    /// Creates a block from the save-state reader's raw view of a region.
    pub fn new(region: Region, declared_used: u32, data: Vec<u8>) -> Self {
        Self {
            region,
            declared_used,
            data,
        }
    }

    /// Number of whole raw records present in the block.
    pub fn record_capacity(&self) -> usize {
        self.data.len() / RAW_RECORD_LEN
    }
}

/// Resolution category of a den, with the fixed precedence
/// crystal > event > ordinary already applied.
///
/// Deriving the category once here keeps every resolution path an exhaustive
/// match instead of a scatter of flag checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DenKind {
    /// Crystal-locked den; resolved from the fixed crystal table
    Crystal,
    /// Event-exclusive den; resolved from the variant's event table
    Event,
    /// Ordinary den; resolved through its location's table hashes
    Ordinary {
        /// Whether the rare-variant table applies
        rare: bool,
    },
}

/// A normalized, region-agnostic den spawn record.
///
/// The `seed` and `raw` payload are opaque to resolution; they ride along so
/// the embedder's converter can materialize a concrete encounter later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnRecord {
    /// Region the record was imported from
    pub region: Region,
    /// Encounter seed for the external converter
    pub seed: u64,
    /// Displayed star rating roll
    pub stars: u8,
    /// Spawn slot roll within the selected table
    pub random_roll: u8,
    /// Record follows the event-exclusive path
    pub is_event: bool,
    /// Record follows the crystal-locked path
    pub is_crystal: bool,
    /// Ordinary record draws from the rare-variant table
    pub is_rare: bool,
    /// Untouched raw payload for the external converter
    pub raw: [u8; RAW_RECORD_LEN],
}

// Raw record layout: seed u64 LE, star roll, random roll, den kind
// (0/1 common, 2 rare), flag bits (bit 0 event, bit 1 crystal), 4 reserved.
const KIND_OFFSET: usize = 10;
const FLAGS_OFFSET: usize = 11;
const FLAG_EVENT: u8 = 1 << 0;
const FLAG_CRYSTAL: u8 = 1 << 1;

impl SpawnRecord {
    /// Normalizes one raw record.
    ///
    /// Fails with [`DenError::MalformedSpawnData`] when the payload is
    /// truncated or carries an unrecognized den kind.
    pub fn parse(region: Region, bytes: &[u8]) -> DenResult<Self> {
        if bytes.len() < RAW_RECORD_LEN {
            return Err(DenError::MalformedSpawnData {
                region,
                reason: format!(
                    "truncated record: {} of {} bytes",
                    bytes.len(),
                    RAW_RECORD_LEN
                ),
            });
        }

        let mut raw = [0u8; RAW_RECORD_LEN];
        raw.copy_from_slice(&bytes[..RAW_RECORD_LEN]);

        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&raw[..8]);

        let is_rare = match raw[KIND_OFFSET] {
            0 | 1 => false,
            2 => true,
            other => {
                return Err(DenError::MalformedSpawnData {
                    region,
                    reason: format!("unrecognized den kind {other}"),
                })
            }
        };

        let flags = raw[FLAGS_OFFSET];
        Ok(Self {
            region,
            seed: u64::from_le_bytes(seed_bytes),
            stars: raw[8],
            random_roll: raw[9],
            is_event: flags & FLAG_EVENT != 0,
            is_crystal: flags & FLAG_CRYSTAL != 0,
            is_rare,
            raw,
        })
    }

    /// Resolution category of this record.
    ///
    /// # Examples
    ///
    /// ```
    /// use denwarden::{DenKind, Region, SpawnRecord};
    ///
    /// let mut bytes = [0u8; 16];
    /// bytes[11] = 0b11; // event and crystal both set
    /// let record = SpawnRecord::parse(Region::Mainland, &bytes).unwrap();
    /// // Crystal always wins over the other flags.
    /// assert_eq!(record.kind(), DenKind::Crystal);
    /// ```
    pub fn kind(&self) -> DenKind {
        if self.is_crystal {
            DenKind::Crystal
        } else if self.is_event {
            DenKind::Event
        } else {
            DenKind::Ordinary { rare: self.is_rare }
        }
    }
}

/// Imports the three region spawn blocks into one normalized record sequence.
///
/// Records are concatenated in the fixed region order mainland, isle,
/// highlands; that order is what pairs each record with its catalogue
/// location downstream, so it must never change. Each region's declared
/// used-count is clamped to the records actually present.
pub fn import_regions(
    mainland: &RegionSpawnBlock,
    isle: &RegionSpawnBlock,
    highlands: &RegionSpawnBlock,
) -> DenResult<Vec<SpawnRecord>> {
    let mut records = Vec::new();
    for block in [mainland, isle, highlands] {
        import_block(block, &mut records)?;
    }
    Ok(records)
}

fn import_block(block: &RegionSpawnBlock, out: &mut Vec<SpawnRecord>) -> DenResult<()> {
    let remainder = block.data.len() % RAW_RECORD_LEN;
    if remainder != 0 {
        return Err(DenError::MalformedSpawnData {
            region: block.region,
            reason: format!("{remainder} trailing bytes do not form a whole record"),
        });
    }

    let available = block.record_capacity();
    let declared = block.declared_used as usize;
    let used = declared.min(available);
    if declared > available {
        warn!(
            "{} block declares {} used dens but holds {}; clamping",
            block.region, declared, available
        );
    }

    out.reserve(used);
    for chunk in block.data.chunks_exact(RAW_RECORD_LEN).take(used) {
        out.push(SpawnRecord::parse(block.region, chunk)?);
    }
    Ok(())
}
