//! Icon layer drawn over the map image.
//!
//! [`Scene`] is the browser's [`DrawingSurface`]: the dispatcher mutates it and
//! the map view renders it as SVG in the map image's native pixel space.

use battle_tracker_shared::dispatch::DrawingSurface;
use battle_tracker_shared::models::{IconId, Position};

use crate::api;

/// Icon width as a fraction of the map width.
const ICON_WIDTH_FRACTION: f64 = 0.025;

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedIcon {
    pub id: IconId,
    pub asset: String,
    pub at: Position,
}

/// Placed icons in draw order, back to front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    icons: Vec<PlacedIcon>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icons(&self) -> &[PlacedIcon] {
        &self.icons
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    fn index_of(&self, icon: IconId) -> Option<usize> {
        self.icons.iter().position(|i| i.id == icon)
    }
}

impl DrawingSurface for Scene {
    fn add_icon(&mut self, icon: IconId, asset: &str, at: Position) {
        if let Some(idx) = self.index_of(icon) {
            self.icons.remove(idx);
        }
        self.icons.push(PlacedIcon {
            id: icon,
            asset: asset.to_string(),
            at,
        });
    }

    fn set_position(&mut self, icon: IconId, at: Position) -> bool {
        match self.index_of(icon) {
            Some(idx) => {
                self.icons[idx].at = at;
                true
            }
            None => false,
        }
    }

    fn bring_to_front(&mut self, icon: IconId) -> bool {
        match self.index_of(icon) {
            Some(idx) => {
                let placed = self.icons.remove(idx);
                self.icons.push(placed);
                true
            }
            None => false,
        }
    }

    fn remove_icon(&mut self, icon: IconId) -> bool {
        match self.index_of(icon) {
            Some(idx) => {
                self.icons.remove(idx);
                true
            }
            None => false,
        }
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn build_medic_marker(svg: &mut String, at: Position, size: f64) {
    // Red cross badge just above the location's first icon.
    let cx = at.x;
    let cy = at.y - size * 0.6;
    let r = size * 0.4;
    let arm = r * 0.55;
    let bar = r * 0.3;
    svg.push_str(&format!(
        r##"<g class="medic"><circle cx="{cx}" cy="{cy}" r="{r}" fill="#ffffff" stroke="#c43030" stroke-width="{}"/><rect x="{}" y="{}" width="{}" height="{}" fill="#c43030"/><rect x="{}" y="{}" width="{}" height="{}" fill="#c43030"/></g>"##,
        r * 0.15,
        cx - arm,
        cy - bar / 2.0,
        arm * 2.0,
        bar,
        cx - bar / 2.0,
        cy - arm,
        bar,
        arm * 2.0,
    ));
}

/// SVG elements for the icon layer. Icons are anchored at their top-left corner.
pub fn build_svg_content(
    scene: &Scene,
    medics: &[Position],
    icon_base_url: &str,
    map_width: f64,
) -> String {
    let mut svg = String::with_capacity(256 * (scene.len() + medics.len()));
    let size = map_width * ICON_WIDTH_FRACTION;

    for icon in scene.icons() {
        let href = escape_attr(&api::icon_url(icon_base_url, &icon.asset));
        svg.push_str(&format!(
            r#"<image id="{}" href="{href}" x="{}" y="{}" width="{size}" height="{size}" filter="url(#icon-shadow)"/>"#,
            icon.id, icon.at.x, icon.at.y
        ));
    }
    for &at in medics {
        build_medic_marker(&mut svg, at, size);
    }
    svg
}

/// Wrap the icon layer in an `<svg>` sized to the map's native pixels.
pub fn build_svg(content: &str, map_width: f64, map_height: f64) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {map_width} {map_height}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;z-index:5;"><defs><filter id="icon-shadow" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="0" dy="0" stdDeviation="4" flood-color="black"/></filter></defs>{content}</svg>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use battle_tracker_shared::dispatch::RenderDispatcher;
    use battle_tracker_shared::models::UnitRow;
    use battle_tracker_shared::reconcile::TrackerState;
    use battle_tracker_shared::registry::LocationRegistry;
    use battle_tracker_shared::models::LocationSpec;

    fn ids(scene: &Scene) -> Vec<u64> {
        scene.icons().iter().map(|i| i.id.0).collect()
    }

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::new();
        scene.add_icon(IconId(1), "bn_team.svg", Position::new(1.0, 2.0));
        scene.add_icon(IconId(2), "bn_squad.svg", Position::new(3.0, 4.0));
        assert_eq!(ids(&scene), vec![1, 2]);
        assert!(scene.remove_icon(IconId(1)));
        assert!(!scene.remove_icon(IconId(1)));
        assert_eq!(ids(&scene), vec![2]);
    }

    #[test]
    fn test_bring_to_front_reorders() {
        let mut scene = Scene::new();
        for id in 1..=3 {
            scene.add_icon(IconId(id), "x.svg", Position::new(0.0, 0.0));
        }
        assert!(scene.bring_to_front(IconId(1)));
        assert_eq!(ids(&scene), vec![2, 3, 1]);
        assert!(!scene.bring_to_front(IconId(9)));
    }

    #[test]
    fn test_set_position_unknown_icon() {
        let mut scene = Scene::new();
        assert!(!scene.set_position(IconId(4), Position::new(1.0, 1.0)));
        scene.add_icon(IconId(4), "x.svg", Position::new(0.0, 0.0));
        assert!(scene.set_position(IconId(4), Position::new(1.0, 1.0)));
        assert_eq!(scene.icons()[0].at, Position::new(1.0, 1.0));
    }

    #[test]
    fn test_svg_content_lists_icons_and_medics() {
        let mut scene = Scene::new();
        scene.add_icon(IconId(7), "bn_platoon.svg", Position::new(100.0, 50.0));
        let svg = build_svg_content(&scene, &[Position::new(10.0, 40.0)], "/static/icons/", 1000.0);
        assert!(svg.contains(r#"id="icon-7""#));
        assert!(svg.contains(r#"href="/static/icons/bn_platoon.svg""#));
        assert!(svg.contains(r#"x="100" y="50" width="25" height="25""#));
        assert!(svg.contains(r#"class="medic""#));
    }

    #[test]
    fn test_svg_content_escapes_asset_names() {
        let mut scene = Scene::new();
        scene.add_icon(IconId(1), r#"a"b<c_team.svg"#, Position::new(0.0, 0.0));
        let svg = build_svg_content(&scene, &[], "/static/icons/", 1000.0);
        assert!(svg.contains("a&quot;b&lt;c_team.svg"));
    }

    #[test]
    fn test_tracker_drives_scene() {
        let registry =
            LocationRegistry::from_catalog(&[LocationSpec::new("USMA", 0.5, 0.5)]).unwrap();
        let mut state = TrackerState::new(registry);
        state.calibrate(1000.0, 800.0).unwrap();
        let mut dispatcher = RenderDispatcher::new();
        let mut scene = Scene::new();

        let batch = vec![
            UnitRow::unit("BN", 30, "USMA", "12:00"),
            UnitRow::unit("Anzio", 8, "USMA", "12:00"),
        ];
        let actions = state.reconcile(&batch).unwrap();
        let requests = dispatcher.dispatch(&actions, &mut scene);
        assert_eq!(requests.len(), 2);
        assert_eq!(scene.len(), 0);
        for req in &requests {
            dispatcher.asset_loaded(req.icon, &mut scene);
        }
        assert_eq!(scene.len(), 2);

        let actions = state.reconcile(&batch[1..]).unwrap();
        dispatcher.dispatch(&actions, &mut scene);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.icons()[0].asset, "anzio_squad.svg");
        assert_eq!(scene.icons()[0].at, Position::new(500.0, 400.0));
    }
}
