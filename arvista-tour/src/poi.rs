//! Points of interest and the catalog that owns them

use std::collections::HashSet;

use arvista_core::{Error, ExperienceConfig, PoiEntry, Result, Vector3f};

/// Stable POI identifier
pub type PoiId = u32;

/// Normalize a node or anchor name for matching: lowercase, with
/// underscores and hyphens read as spaces
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '_' | '-' => ' ',
            c => c,
        })
        .collect::<String>()
        .to_lowercase()
}

/// An authored location of interest tied to a named asset node
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub id: PoiId,
    pub display_name: String,
    pub anchor_node_name: String,
    pub description: String,
    pub icon: String,
    offset: Option<Vector3f>,
}

impl PointOfInterest {
    pub fn new(id: PoiId, display_name: impl Into<String>, anchor_node_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            anchor_node_name: anchor_node_name.into(),
            description: String::new(),
            icon: String::new(),
            offset: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Offset from the asset origin in units of the asset's longest edge.
    /// `None` until the locator has run.
    pub fn offset(&self) -> Option<Vector3f> {
        self.offset
    }
}

impl From<&PoiEntry> for PointOfInterest {
    fn from(entry: &PoiEntry) -> Self {
        Self::new(entry.id, entry.name.clone(), entry.anchor.clone())
            .with_description(entry.description.clone())
            .with_icon(entry.icon.clone())
    }
}

/// Ordered, non-empty set of POIs with unique ids
#[derive(Debug, Clone, PartialEq)]
pub struct PoiCatalog {
    pois: Vec<PointOfInterest>,
    resolved: bool,
}

impl PoiCatalog {
    pub fn new(pois: Vec<PointOfInterest>) -> Result<Self> {
        if pois.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        for poi in &pois {
            if !seen.insert(poi.id) {
                return Err(Error::DuplicatePoiId(poi.id));
            }
        }
        Ok(Self { pois, resolved: false })
    }

    /// Build from the `[[poi]]` entries of a config
    pub fn from_config(config: &ExperienceConfig) -> Result<Self> {
        Self::new(config.pois.iter().map(PointOfInterest::from).collect())
    }

    pub fn len(&self) -> usize {
        self.pois.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pois.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PointOfInterest> {
        self.pois.get(index)
    }

    pub fn by_id(&self, id: PoiId) -> Option<&PointOfInterest> {
        self.pois.iter().find(|p| p.id == id)
    }

    pub fn index_of(&self, id: PoiId) -> Option<usize> {
        self.pois.iter().position(|p| p.id == id)
    }

    pub fn as_slice(&self) -> &[PointOfInterest] {
        &self.pois
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PointOfInterest> {
        self.pois.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = PoiId> + '_ {
        self.pois.iter().map(|p| p.id)
    }

    /// Whether every offset has been assigned
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Assign all offsets at once; a catalog is resolved at most once
    pub(crate) fn assign_offsets(&mut self, offsets: Vec<Vector3f>) -> Result<()> {
        if self.resolved {
            return Err(Error::AlreadyResolved);
        }
        if offsets.len() != self.pois.len() {
            return Err(Error::InvalidData(format!(
                "expected {} offsets, got {}",
                self.pois.len(),
                offsets.len()
            )));
        }
        for (poi, offset) in self.pois.iter_mut().zip(offsets) {
            poi.offset = Some(offset);
        }
        self.resolved = true;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PoiCatalog {
    type Item = &'a PointOfInterest;
    type IntoIter = std::slice::Iter<'a, PointOfInterest>;

    fn into_iter(self) -> Self::IntoIter {
        self.pois.iter()
    }
}
