use battle_tracker_shared::models::LocationSpec;
use battle_tracker_shared::registry::LocationRegistry;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_MAP_IMAGE: &str = "map.jpg";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackerFile {
    map_image: Option<String>,
    locations: Option<Vec<LocationSpec>>,
}

/// Deployment data: which map image to show and where the named locations sit on it.
#[derive(Debug, Clone)]
pub struct Assets {
    pub map_image: String,
    pub locations: Vec<LocationSpec>,
}

impl Assets {
    /// Load `tracker.json` from the assets directory.
    ///
    /// A missing file or a file without `locations` falls back to the built-in catalog.
    pub fn load(assets_dir: &Path) -> Result<Self, String> {
        let path = assets_dir.join("tracker.json");
        let file = if path.exists() {
            let data = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
            serde_json::from_str::<TrackerFile>(&data)
                .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))?
        } else {
            tracing::warn!(path = %path.display(), "No tracker.json found, using built-in catalog");
            TrackerFile {
                map_image: None,
                locations: None,
            }
        };

        let assets = Assets {
            map_image: file
                .map_image
                .unwrap_or_else(|| DEFAULT_MAP_IMAGE.to_string()),
            locations: file
                .locations
                .unwrap_or_else(LocationRegistry::default_catalog),
        };

        // Reject catalogs the frontend would refuse to build a registry from.
        LocationRegistry::from_catalog(&assets.locations).map_err(|e| e.to_string())?;

        tracing::info!(
            locations = assets.locations.len(),
            map = %assets.map_image,
            "Loaded tracker assets"
        );
        Ok(assets)
    }

    pub fn find_location(&self, name: &str) -> Option<&LocationSpec> {
        self.locations.iter().find(|l| l.name == name)
    }
}
