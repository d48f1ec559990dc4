use std::collections::BTreeMap;

use crate::models::{IconId, Triple};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceRecord {
    /// Reported by the batch currently being reconciled.
    pub seen: bool,
    pub icon: Option<IconId>,
}

/// strength -> record
pub(crate) type SizeMap = BTreeMap<u32, PresenceRecord>;
/// unit name -> sizes
pub(crate) type UnitMap = BTreeMap<String, SizeMap>;

/// Which (location, unit, strength) triples are active and the icon bound to each.
///
/// Maps are ordered so that sweeps, and therefore icon stacking, are deterministic.
#[derive(Debug, Default)]
pub struct PresenceStore {
    locations: BTreeMap<String, UnitMap>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_all_unseen(&mut self) {
        for record in self
            .locations
            .values_mut()
            .flat_map(|units| units.values_mut())
            .flat_map(|sizes| sizes.values_mut())
        {
            record.seen = false;
        }
    }

    /// Record that a triple was reported, creating its record on first sight.
    pub fn observe(&mut self, location: &str, unit: &str, strength: u32) -> &mut PresenceRecord {
        let record = self
            .locations
            .entry(location.to_string())
            .or_default()
            .entry(unit.to_string())
            .or_default()
            .entry(strength)
            .or_default();
        record.seen = true;
        record
    }

    pub fn get(&self, triple: &Triple) -> Option<&PresenceRecord> {
        self.locations
            .get(&triple.location)?
            .get(&triple.unit)?
            .get(&triple.strength)
    }

    pub fn icon_for(&self, triple: &Triple) -> Option<IconId> {
        self.get(triple).and_then(|r| r.icon)
    }

    pub fn contains(&self, triple: &Triple) -> bool {
        self.get(triple).is_some()
    }

    /// Every record in sweep order.
    pub fn records(&self) -> impl Iterator<Item = (Triple, &PresenceRecord)> {
        self.locations.iter().flat_map(|(loc, units)| {
            units.iter().flat_map(move |(unit, sizes)| {
                sizes
                    .iter()
                    .map(move |(strength, record)| (Triple::new(loc.as_str(), unit.as_str(), *strength), record))
            })
        })
    }

    pub fn len(&self) -> usize {
        self.locations
            .values()
            .flat_map(|units| units.values())
            .map(|sizes| sizes.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Detach `icon` from the record holding it. Returns false if no record does.
    pub fn release_icon(&mut self, icon: IconId) -> bool {
        for record in self
            .locations
            .values_mut()
            .flat_map(|units| units.values_mut())
            .flat_map(|sizes| sizes.values_mut())
        {
            if record.icon == Some(icon) {
                record.icon = None;
                return true;
            }
        }
        false
    }

    pub(crate) fn units_at_mut(&mut self, location: &str) -> Option<&mut UnitMap> {
        self.locations.get_mut(location)
    }

    /// Drop location entries whose units have all been swept away.
    pub(crate) fn prune_empty(&mut self) {
        for units in self.locations.values_mut() {
            units.retain(|_, sizes| !sizes.is_empty());
        }
        self.locations.retain(|_, units| !units.is_empty());
    }
}
