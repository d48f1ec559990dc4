mod assets;
mod config;
mod graphql;
mod sheets;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use graphql::Schema;

async fn graphql_handler(State(schema): State<Schema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Map image, unit icons and `tracker.json` come from `assets_dir`; the wasm bundle from `dist/`.
fn build_app(schema: Schema, assets_dir: &Path) -> Router {
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/", get(serve_index))
        .with_state(schema)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = config::Config::from_env()?;
    let loaded_assets = Arc::new(
        assets::Assets::load(&config.assets_dir)
            .map_err(anyhow::Error::msg)
            .context("Failed to load tracker assets")?,
    );
    let sheets = Arc::new(
        sheets::SheetService::from_config(&config)
            .map_err(|e| anyhow::anyhow!("Failed to set up sheet source: {e}"))?,
    );
    match &config.source {
        config::SourceConfig::Google { sheet_id, .. } => {
            tracing::info!(%sheet_id, units = %config.unit_range, notes = %config.notes_range, "Reading Google Sheet")
        }
        config::SourceConfig::File(path) => {
            tracing::info!(path = %path.display(), "Reading sheet snapshot file")
        }
    }

    let schema = graphql::build_schema(loaded_assets, sheets, config.poll_interval);
    let app = build_app(schema, &config.assets_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index() -> Html<String> {
    match tokio::fs::read_to_string("dist/index.html").await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Battle Tracker</title></head>
<body>
<h1>Battle Tracker</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::{DataSource, SheetService};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use battle_tracker_shared::registry::LocationRegistry;
    use std::time::Duration;
    use tower::ServiceExt;

    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(parent) = Path::new(file_name).parent() {
            std::fs::create_dir_all(dir.path().join(parent)).unwrap();
        }
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    fn test_app(assets_dir: &Path) -> Router {
        let assets = Arc::new(assets::Assets {
            map_image: "map.jpg".to_string(),
            locations: LocationRegistry::default_catalog(),
        });
        let sheets = Arc::new(SheetService::new(
            DataSource::File(assets_dir.join("exercise.json")),
            "Data!A:D",
            "Notes!A:A",
        ));
        build_app(
            graphql::build_schema(assets, sheets, Duration::from_secs(30)),
            assets_dir,
        )
    }

    async fn fetch(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_icons_have_1day_cache() {
        let assets_dir = temp_dir_with_file("icons/bn_platoon.svg", "<svg/>");
        let resp = fetch(test_app(assets_dir.path()), "/static/icons/bn_platoon.svg").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_missing_icon_returns_404() {
        let assets_dir = temp_dir_with_file("tracker.json", "{}");
        let resp = fetch(test_app(assets_dir.path()), "/static/icons/nonexistent.svg").await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_static_and_dist_have_different_cache_policies() {
        let assets_dir = temp_dir_with_file("map.jpg", "jpg");
        let static_router = cached_static_router(assets_dir.path(), CACHE_1DAY);
        let dist_dir = temp_dir_with_file("bundle.js", "x");
        let dist_router = cached_static_router(dist_dir.path(), CACHE_IMMUTABLE);

        let static_cc = fetch(static_router, "/map.jpg")
            .await
            .headers()
            .get("cache-control")
            .map(|v| v.to_str().unwrap().to_string());
        let dist_resp = fetch(dist_router, "/bundle.js").await;
        let dist_cc = dist_resp.headers().get("cache-control").unwrap().to_str().unwrap();

        assert_eq!(static_cc.as_deref(), Some(CACHE_1DAY));
        assert!(dist_cc.contains("max-age=31536000"));
    }

    #[tokio::test]
    async fn test_graphql_endpoint_serves_tracker_config() {
        let assets_dir = temp_dir_with_file("tracker.json", "{}");
        let app = test_app(assets_dir.path());
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query":"{ trackerConfig { mapImage } }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"]["trackerConfig"]["mapImage"], "/static/map.jpg");
    }
}
