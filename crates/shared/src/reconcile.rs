//! Diffs a batch of unit rows against the presence store and produces the
//! render actions that bring the map in sync.
//!
//! A cycle has three phases: every record is marked unseen, the batch marks
//! the triples it reports, then a sweep removes what was not reported and
//! spawns or repositions what was.

use crate::error::TrackerError;
use crate::models::{IconAllocator, IconId, Position, RowKind, Triple, UnitRow};
use crate::presence::PresenceStore;
use crate::registry::LocationRegistry;

/// Horizontal pixel offset between icons stacked at the same location.
pub const STACK_OFFSET_PX: f64 = 15.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Spawn {
        icon: IconId,
        triple: Triple,
        at: Position,
    },
    Move {
        icon: IconId,
        at: Position,
    },
    Remove {
        icon: IconId,
    },
}

impl Action {
    pub fn icon(&self) -> IconId {
        match self {
            Action::Spawn { icon, .. } | Action::Move { icon, .. } | Action::Remove { icon } => {
                *icon
            }
        }
    }
}

/// Position of the `index`-th rendered sibling at a location.
pub fn stack_position(anchor: Position, index: usize) -> Position {
    Position::new(anchor.x + STACK_OFFSET_PX * index as f64, anchor.y)
}

/// Session state shared by the reconciliation engine and the renderer.
#[derive(Debug)]
pub struct TrackerState {
    pub registry: LocationRegistry,
    pub presence: PresenceStore,
    pub icons: IconAllocator,
    deferred: Option<Vec<UnitRow>>,
}

impl TrackerState {
    pub fn new(registry: LocationRegistry) -> Self {
        TrackerState {
            registry,
            presence: PresenceStore::new(),
            icons: IconAllocator::new(),
            deferred: None,
        }
    }

    /// Latch the map size and reconcile the batch held back while the map
    /// was loading, if any.
    pub fn calibrate(
        &mut self,
        map_width: f64,
        map_height: f64,
    ) -> Result<Vec<Action>, TrackerError> {
        self.registry.calibrate(map_width, map_height)?;
        match self.deferred.take() {
            Some(rows) => {
                tracing::debug!(rows = rows.len(), "Reconciling batch deferred until calibration");
                self.reconcile(&rows)
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.registry.is_calibrated()
    }

    /// Forget the icon bound to a record so the next cycle spawns a new one.
    pub fn release_icon(&mut self, icon: IconId) -> bool {
        self.presence.release_icon(icon)
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    /// Reconcile a polled batch, or hold it until `calibrate` if the map size
    /// is not known yet. A newer held batch replaces an older one.
    pub fn submit(&mut self, rows: Vec<UnitRow>) -> Result<Vec<Action>, TrackerError> {
        match self.reconcile(&rows) {
            Err(TrackerError::NotCalibrated) => {
                tracing::debug!(rows = rows.len(), "Map not calibrated yet, deferring batch");
                self.deferred = Some(rows);
                Ok(Vec::new())
            }
            result => result,
        }
    }

    pub fn reconcile(&mut self, rows: &[UnitRow]) -> Result<Vec<Action>, TrackerError> {
        if !self.registry.is_calibrated() {
            return Err(TrackerError::NotCalibrated);
        }

        // Mark. Medic flags stay set once reported.
        self.presence.mark_all_unseen();

        // Apply
        let mut unknown = 0usize;
        for row in rows {
            let Some(loc) = self.registry.get_mut(&row.location) else {
                tracing::debug!(location = %row.location, "Dropping row for unknown location");
                unknown += 1;
                continue;
            };
            match &row.kind {
                RowKind::Medic => loc.medic = true,
                RowKind::Unit { name, strength } => {
                    self.presence.observe(&row.location, name, *strength);
                }
            }
        }

        // Sweep
        let mut actions = Vec::new();
        for loc in self.registry.iter() {
            let Some(units) = self.presence.units_at_mut(&loc.name) else {
                continue;
            };
            let mut stacked = 0usize;
            for (unit, sizes) in units.iter_mut() {
                sizes.retain(|strength, record| {
                    if !record.seen {
                        if let Some(icon) = record.icon {
                            actions.push(Action::Remove { icon });
                        }
                        return false;
                    }
                    let at = stack_position(loc.position, stacked);
                    stacked += 1;
                    match record.icon {
                        Some(icon) => actions.push(Action::Move { icon, at }),
                        None => {
                            let icon = self.icons.allocate();
                            record.icon = Some(icon);
                            actions.push(Action::Spawn {
                                icon,
                                triple: Triple::new(loc.name.as_str(), unit.as_str(), *strength),
                                at,
                            });
                        }
                    }
                    true
                });
            }
        }
        self.presence.prune_empty();

        tracing::debug!(
            rows = rows.len(),
            unknown,
            spawned = actions.iter().filter(|a| matches!(a, Action::Spawn { .. })).count(),
            moved = actions.iter().filter(|a| matches!(a, Action::Move { .. })).count(),
            removed = actions.iter().filter(|a| matches!(a, Action::Remove { .. })).count(),
            "Reconciled unit batch"
        );
        Ok(actions)
    }
}
