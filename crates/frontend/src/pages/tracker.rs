use std::time::Duration;

use dioxus::logger::tracing;
use dioxus::prelude::*;

use battle_tracker_shared::dispatch::{AssetRequest, LoadOutcome, RenderDispatcher};
use battle_tracker_shared::models::{parse_rows, Position, UnitRow};
use battle_tracker_shared::reconcile::{Action, TrackerState};
use battle_tracker_shared::registry::LocationRegistry;
use battle_tracker_shared::table::Notes;

use crate::api::{self, TrackerConfigData};
use crate::components::map_view::MapView;
use crate::components::notes_panel::NotesPanel;
use crate::components::status_table::StatusTable;
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
enum PollStatus {
    Waiting,
    Updated(String),
    Failed(String),
}

/// `HH:MM:SS` from an RFC 3339 timestamp, or the input unchanged.
fn format_fetched_at(fetched_at: &str) -> String {
    match (fetched_at.get(10..11), fetched_at.get(11..19)) {
        (Some("T"), Some(time)) => format!("{time} UTC"),
        _ => fetched_at.to_string(),
    }
}

fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        window.alert_with_message(message).ok();
    }
}

/// Signals that make up one tracking session.
#[derive(Clone, Copy)]
struct Session {
    tracker: Signal<TrackerState>,
    dispatcher: Signal<RenderDispatcher>,
    scene: Signal<Scene>,
    medics: Signal<Vec<Position>>,
}

impl Session {
    fn refresh_medics(mut self) {
        let positions: Vec<Position> = self
            .tracker
            .read()
            .registry
            .iter()
            .filter(|l| l.medic)
            .map(|l| l.position)
            .collect();
        self.medics.set(positions);
    }

    /// Push reconcile actions to the scene and start their asset loads.
    fn apply(mut self, actions: &[Action], icon_base_url: &str) {
        let requests = self
            .dispatcher
            .write()
            .dispatch(actions, &mut *self.scene.write());
        self.refresh_medics();
        for request in requests {
            self.load_asset(request, icon_base_url);
        }
    }

    fn submit(mut self, rows: Vec<UnitRow>, icon_base_url: &str) {
        let result = self.tracker.write().submit(rows);
        match result {
            Ok(actions) => self.apply(&actions, icon_base_url),
            Err(e) => tracing::warn!(error = %e, "Reconcile failed"),
        }
    }

    fn calibrate(mut self, width: f64, height: f64, icon_base_url: &str) -> bool {
        let result = self.tracker.write().calibrate(width, height);
        match result {
            Ok(actions) => {
                tracing::info!(width, height, "Map calibrated");
                self.apply(&actions, icon_base_url);
                true
            }
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring repeated map calibration");
                false
            }
        }
    }

    fn load_asset(mut self, request: AssetRequest, icon_base_url: &str) {
        let url = api::icon_url(icon_base_url, &request.asset);
        spawn(async move {
            match api::preload_icon(&url).await {
                Ok(()) => {
                    let outcome = self
                        .dispatcher
                        .write()
                        .asset_loaded(request.icon, &mut *self.scene.write());
                    if outcome == LoadOutcome::Unknown {
                        tracing::debug!(icon = %request.icon, "Asset loaded for an icon nobody is waiting on");
                    }
                }
                Err(e) => {
                    tracing::warn!(icon = %request.icon, asset = %request.asset, error = %e, "Icon asset failed to load");
                    self.dispatcher.write().asset_failed(request.icon);
                    self.tracker.write().release_icon(request.icon);
                }
            }
        });
    }
}

#[component]
pub fn Tracker() -> Element {
    let config_resource = use_resource(api::fetch_tracker_config);

    let view = match &*config_resource.read() {
        Some(Ok(config)) => rsx! {
            TrackerView { config: config.clone() }
        },
        Some(Err(e)) => rsx! {
            div { class: "status error", "Failed to load tracker configuration: {e}" }
        },
        None => rsx! {
            div { class: "status", "Loading..." }
        },
    };
    view
}

#[component]
fn TrackerView(config: TrackerConfigData) -> Element {
    let catalog = config.locations.clone();
    let tracker = use_signal(move || {
        let registry = LocationRegistry::from_catalog(&catalog).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid location catalog, using the built-in one");
            LocationRegistry::default()
        });
        TrackerState::new(registry)
    });
    let session = Session {
        tracker,
        dispatcher: use_signal(RenderDispatcher::new),
        scene: use_signal(Scene::new),
        medics: use_signal(Vec::new),
    };

    let mut units = use_signal(Vec::<Vec<String>>::new);
    let mut notes = use_signal(Notes::default);
    let mut status = use_signal(|| PollStatus::Waiting);
    let mut map_size = use_signal(|| None::<(f64, f64)>);

    let poll_interval = Duration::from_secs(config.poll_interval_secs.max(1));
    let poll_icon_base = config.icon_base_url.clone();

    // One poll at a time: fetch, render table and notes, reconcile, sleep.
    use_future(move || {
        let icon_base_url = poll_icon_base.clone();
        async move {
            loop {
                match api::fetch_sheet().await {
                    Ok(sheet) => {
                        let parsed = parse_rows(&sheet.units);
                        units.set(sheet.units);
                        notes.set(sheet.notes);
                        status.set(PollStatus::Updated(sheet.fetched_at));
                        session.submit(parsed.rows, &icon_base_url);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Sheet poll failed");
                        status.set(PollStatus::Failed(e.clone()));
                        alert(&format!("Error: {e}"));
                    }
                }
                gloo_timers::future::sleep(poll_interval).await;
            }
        }
    });

    let calibrate_icon_base = config.icon_base_url.clone();
    let on_map_loaded = move |(width, height): (f64, f64)| {
        if session.calibrate(width, height, &calibrate_icon_base) {
            map_size.set(Some((width, height)));
        }
    };

    let status_line = match &*status.read() {
        PollStatus::Waiting => "Waiting for first update...".to_string(),
        PollStatus::Updated(at) => format!("Last updated {}", format_fetched_at(at)),
        PollStatus::Failed(e) => format!("Update failed: {e}"),
    };
    let status_class = if matches!(*status.read(), PollStatus::Failed(_)) {
        "status error"
    } else {
        "status"
    };

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "Battle Tracker" }
                span { class: "{status_class}", "{status_line}" }
            }

            MapView {
                map_image_url: config.map_image.clone(),
                icon_base_url: config.icon_base_url.clone(),
                scene: session.scene,
                medics: session.medics,
                map_size: map_size,
                on_map_loaded: on_map_loaded,
            }

            div { class: "sidebar",
                NotesPanel { notes: notes.read().clone() }
                StatusTable { rows: units.read().clone() }
            }
        }
    }
}
