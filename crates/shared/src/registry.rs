//! Fixed catalog of named map locations.
//!
//! Coordinates start as fractions of the map image and are converted to
//! absolute surface pixels by a single call to [`LocationRegistry::calibrate`]
//! once the map image has loaded and its size is known.

use crate::error::TrackerError;
use crate::models::{LocationSpec, Position};

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub position: Position,
    pub medic: bool,
}

#[derive(Debug, Clone)]
pub struct LocationRegistry {
    locations: Vec<Location>,
    calibrated: bool,
}

impl LocationRegistry {
    pub fn from_catalog(catalog: &[LocationSpec]) -> Result<Self, TrackerError> {
        let mut locations: Vec<Location> = Vec::with_capacity(catalog.len());
        for spec in catalog {
            if spec.name.trim().is_empty() {
                return Err(TrackerError::InvalidCatalog(
                    "location name must not be empty".to_string(),
                ));
            }
            if locations.iter().any(|l| l.name == spec.name) {
                return Err(TrackerError::InvalidCatalog(format!(
                    "duplicate location {:?}",
                    spec.name
                )));
            }
            let in_unit_range = |v: f64| (0.0..=1.0).contains(&v);
            if !in_unit_range(spec.x) || !in_unit_range(spec.y) {
                return Err(TrackerError::InvalidCatalog(format!(
                    "location {:?} has coordinates ({}, {}) outside the map",
                    spec.name, spec.x, spec.y
                )));
            }
            locations.push(Location {
                name: spec.name.clone(),
                position: Position::new(spec.x, spec.y),
                medic: false,
            });
        }
        Ok(LocationRegistry {
            locations,
            calibrated: false,
        })
    }

    /// The West Point training-area catalog used by the reference deployment.
    pub fn default_catalog() -> Vec<LocationSpec> {
        vec![
            LocationSpec::new("USMAPS", 0.7492, 0.1848),
            LocationSpec::new("J2/J3", 0.7654, 0.2371),
            LocationSpec::new("Bull Pond", 0.2295, 0.6453),
            LocationSpec::new("Range 3/5", 0.5657, 0.4065),
            LocationSpec::new("Range 7/8", 0.5115, 0.4541),
            LocationSpec::new("Range 11", 0.4670, 0.5220),
            LocationSpec::new("KACH", 0.7649, 0.1570),
            LocationSpec::new("USMA", 0.8935, 0.2224),
            LocationSpec::new("Buckner", 0.3481, 0.5549),
            LocationSpec::new("LRC/Marne", 0.3319, 0.6191),
        ]
    }

    /// Scale every location to absolute coordinates. Only the first call has any effect.
    pub fn calibrate(&mut self, map_width: f64, map_height: f64) -> Result<(), TrackerError> {
        if self.calibrated {
            return Err(TrackerError::AlreadyCalibrated);
        }
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(map_width) || !valid(map_height) {
            return Err(TrackerError::InvalidMapSize {
                width: map_width,
                height: map_height,
            });
        }
        for loc in &mut self.locations {
            loc.position.x *= map_width;
            loc.position.y *= map_height;
        }
        self.calibrated = true;
        tracing::debug!(
            width = map_width,
            height = map_height,
            locations = self.locations.len(),
            "Calibrated location registry"
        );
        Ok(())
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    pub fn get(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Location> {
        self.locations.iter_mut().find(|l| l.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.locations.iter().map(|l| l.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}

impl Default for LocationRegistry {
    fn default() -> Self {
        LocationRegistry::from_catalog(&Self::default_catalog())
            .unwrap_or_else(|e| unreachable!("built-in catalog is valid: {e}"))
    }
}
