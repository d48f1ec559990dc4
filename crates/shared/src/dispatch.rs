//! Applies reconciliation actions to a drawing surface.
//!
//! Spawning is two-step: the dispatcher asks the host to load the icon asset
//! and only places the icon once [`RenderDispatcher::asset_loaded`] is called.
//! Moves and removals that arrive while a load is in flight are applied to the
//! pending spawn, so a removed icon is never placed.

use std::collections::BTreeMap;

use crate::models::{IconId, Position, SizeClass};
use crate::reconcile::Action;

/// Asset file for a unit icon, e.g. `bn_platoon.svg`.
pub fn icon_file_name(unit: &str, size: SizeClass) -> String {
    format!("{}_{}.svg", unit.to_lowercase(), size)
}

/// The graphics layer icons are drawn on.
pub trait DrawingSurface {
    fn add_icon(&mut self, icon: IconId, asset: &str, at: Position);
    /// Returns false when the icon is not on the surface.
    fn set_position(&mut self, icon: IconId, at: Position) -> bool;
    fn bring_to_front(&mut self, icon: IconId) -> bool;
    fn remove_icon(&mut self, icon: IconId) -> bool;
}

/// An icon asset the host must load before the icon can be placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetRequest {
    pub icon: IconId,
    pub asset: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Placed,
    /// The icon was removed while its asset was loading.
    Discarded,
    Unknown,
}

#[derive(Debug, Clone)]
struct PendingSpawn {
    asset: String,
    at: Position,
    removed: bool,
}

#[derive(Debug, Default)]
pub struct RenderDispatcher {
    pending: BTreeMap<IconId, PendingSpawn>,
}

impl RenderDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch<S: DrawingSurface + ?Sized>(
        &mut self,
        actions: &[Action],
        surface: &mut S,
    ) -> Vec<AssetRequest> {
        let mut requests = Vec::new();
        for action in actions {
            match action {
                Action::Spawn { icon, triple, at } => {
                    let asset = icon_file_name(&triple.unit, triple.size_class());
                    self.pending.insert(
                        *icon,
                        PendingSpawn {
                            asset: asset.clone(),
                            at: *at,
                            removed: false,
                        },
                    );
                    requests.push(AssetRequest { icon: *icon, asset });
                }
                Action::Move { icon, at } => {
                    if let Some(pending) = self.pending.get_mut(icon) {
                        pending.at = *at;
                    } else if surface.set_position(*icon, *at) {
                        surface.bring_to_front(*icon);
                    } else {
                        tracing::trace!(%icon, "Move for an icon that is not on the surface");
                    }
                }
                Action::Remove { icon } => {
                    if let Some(pending) = self.pending.get_mut(icon) {
                        pending.removed = true;
                    } else {
                        surface.remove_icon(*icon);
                    }
                }
            }
        }
        requests
    }

    /// Place an icon whose asset finished loading, unless it was removed meanwhile.
    pub fn asset_loaded<S: DrawingSurface + ?Sized>(
        &mut self,
        icon: IconId,
        surface: &mut S,
    ) -> LoadOutcome {
        let Some(pending) = self.pending.remove(&icon) else {
            return LoadOutcome::Unknown;
        };
        if pending.removed {
            tracing::debug!(%icon, "Discarding icon removed before its asset loaded");
            return LoadOutcome::Discarded;
        }
        surface.add_icon(icon, &pending.asset, pending.at);
        surface.bring_to_front(icon);
        LoadOutcome::Placed
    }

    /// Abandon a spawn whose asset could not be loaded. Returns false for unknown ids.
    pub fn asset_failed(&mut self, icon: IconId) -> bool {
        self.pending.remove(&icon).is_some()
    }

    pub fn is_pending(&self, icon: IconId) -> bool {
        self.pending.contains_key(&icon)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
