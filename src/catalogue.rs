//! # Location Catalogue
//!
//! Static reference data for every physical den site in the game world.
//!
//! The catalogue ships with the game and never changes while the process is
//! running: one [`Location`] per den site, ordered so that the catalogue
//! position of a site matches the global den index produced by
//! [`crate::DenIndex::build`]. Embedders construct it once (typically from
//! bundled JSON) and share it read-only with every save session.

use crate::{DenError, DenResult};
use serde::{Deserialize, Serialize};

/// A physical den site on the overworld map.
///
/// Each site carries the two table identity hashes it draws encounters from:
/// one for the common spawn variant and one for the rare variant. Event and
/// crystal dens ignore these and use the fixed identities in [`crate::config`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// In-game location identifier
    pub id: u16,
    /// Horizontal map coordinate of the den site
    pub map_x: f32,
    /// Vertical map coordinate of the den site
    pub map_y: f32,
    /// Identity of this site's common-variant encounter table
    pub common_hash: u32,
    /// Identity of this site's rare-variant encounter table
    pub rare_hash: u32,
}

/// The ordered, fixed-size list of all den sites for one game release.
///
/// Catalogue order is load-bearing: den `i` of a merged save session is
/// paired with `catalogue[i]`.
///
/// # Examples
///
/// ```
/// use denwarden::{Location, LocationCatalogue};
///
/// let catalogue = LocationCatalogue::new(vec![Location {
///     id: 144,
///     map_x: 185.0,
///     map_y: 977.0,
///     common_hash: 0x1A2B_3C4D,
///     rare_hash: 0x5E6F_7081,
/// }]);
/// assert_eq!(catalogue.len(), 1);
/// assert_eq!(catalogue[0].id, 144);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationCatalogue {
    locations: Vec<Location>,
}

impl LocationCatalogue {
    /// Creates a catalogue from an already-ordered list of den sites.
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// Parses a catalogue from the embedder's static game data, a JSON array
    /// of location entries.
    pub fn from_json_str(data: &str) -> DenResult<Self> {
        let locations: Vec<Location> = serde_json::from_str(data)?;
        Ok(Self::new(locations))
    }

    /// Number of den sites in the catalogue.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Returns true if the catalogue holds no sites.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Returns the site at the given catalogue position, if any.
    pub fn get(&self, index: usize) -> Option<&Location> {
        self.locations.get(index)
    }

    /// Iterates over sites in catalogue order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }
}

impl std::ops::Index<usize> for LocationCatalogue {
    type Output = Location;

    fn index(&self, index: usize) -> &Location {
        &self.locations[index]
    }
}

impl From<Vec<Location>> for LocationCatalogue {
    fn from(locations: Vec<Location>) -> Self {
        Self::new(locations)
    }
}
