use std::sync::Arc;
use std::time::Duration;

use async_graphql::{Context, Enum, Object, SimpleObject};
use battle_tracker_shared::{
    dispatch,
    models::SizeClass,
    table::Notes,
};

use crate::assets::Assets;
use crate::sheets::SheetService;

/// Icons live under the static assets directory.
pub const ICON_BASE_URL: &str = "/static/icons/";

#[derive(Enum, Copy, Clone, Eq, PartialEq)]
pub enum GqlSizeClass {
    Team,
    Squad,
    Section,
    Platoon,
    Company,
}

impl From<SizeClass> for GqlSizeClass {
    fn from(s: SizeClass) -> Self {
        match s {
            SizeClass::Team => GqlSizeClass::Team,
            SizeClass::Squad => GqlSizeClass::Squad,
            SizeClass::Section => GqlSizeClass::Section,
            SizeClass::Platoon => GqlSizeClass::Platoon,
            SizeClass::Company => GqlSizeClass::Company,
        }
    }
}

// GraphQL output types

#[derive(SimpleObject)]
pub struct GqlLocation {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

#[derive(SimpleObject)]
pub struct GqlTrackerConfig {
    pub map_image: String,
    pub icon_base_url: String,
    pub poll_interval_secs: u64,
    pub locations: Vec<GqlLocation>,
}

#[derive(SimpleObject)]
pub struct GqlNotes {
    pub title: String,
    pub items: Vec<String>,
}

impl From<Notes> for GqlNotes {
    fn from(n: Notes) -> Self {
        GqlNotes {
            title: n.title,
            items: n.items,
        }
    }
}

#[derive(SimpleObject)]
pub struct GqlSheet {
    /// Unit rows exactly as read, `[unit, strength, location, time]`.
    pub units: Vec<Vec<String>>,
    pub notes: GqlNotes,
    pub fetched_at: String,
}

/// Poll cadence handed to the frontend.
pub struct PollInterval(pub Duration);

// Query root

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn tracker_config(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlTrackerConfig> {
        let assets = ctx.data::<Arc<Assets>>()?;
        let interval = ctx.data::<PollInterval>()?;
        Ok(GqlTrackerConfig {
            map_image: format!("/static/{}", assets.map_image),
            icon_base_url: ICON_BASE_URL.to_string(),
            poll_interval_secs: interval.0.as_secs(),
            locations: assets
                .locations
                .iter()
                .map(|l| GqlLocation {
                    name: l.name.clone(),
                    x: l.x,
                    y: l.y,
                })
                .collect(),
        })
    }

    async fn location(&self, ctx: &Context<'_>, name: String) -> async_graphql::Result<Option<GqlLocation>> {
        let assets = ctx.data::<Arc<Assets>>()?;
        Ok(assets.find_location(&name).map(|l| GqlLocation {
            name: l.name.clone(),
            x: l.x,
            y: l.y,
        }))
    }

    async fn sheet(&self, ctx: &Context<'_>) -> async_graphql::Result<GqlSheet> {
        let sheets = ctx.data::<Arc<SheetService>>()?;
        let snapshot = sheets.poll().await.map_err(|e| {
            tracing::warn!(error = %e, "Sheet poll failed");
            async_graphql::Error::new(e.to_string())
        })?;
        Ok(GqlSheet {
            notes: Notes::from_rows(&snapshot.notes).into(),
            units: snapshot.units,
            fetched_at: snapshot.fetched_at,
        })
    }

    async fn size_class(&self, strength: u32) -> GqlSizeClass {
        SizeClass::from_strength(strength).into()
    }

    async fn icon_file_name(&self, unit: String, strength: u32) -> String {
        dispatch::icon_file_name(&unit, SizeClass::from_strength(strength))
    }
}

pub type Schema =
    async_graphql::Schema<QueryRoot, async_graphql::EmptyMutation, async_graphql::EmptySubscription>;

pub fn build_schema(assets: Arc<Assets>, sheets: Arc<SheetService>, poll_interval: Duration) -> Schema {
    async_graphql::Schema::build(
        QueryRoot,
        async_graphql::EmptyMutation,
        async_graphql::EmptySubscription,
    )
    .data(assets)
    .data(sheets)
    .data(PollInterval(poll_interval))
    .finish()
}
