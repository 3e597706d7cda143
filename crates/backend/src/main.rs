mod config;
mod graphql;
mod storage;

use std::path::Path;

use anyhow::{bail, Context};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use relief_shared::models::Role;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;
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

/// Build a cache-controlled static file router.
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

const PLACEHOLDER_INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Relief Resources</title></head>
<body>
<h1>Relief Resources</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#;

async fn placeholder_index() -> Html<&'static str> {
    Html(PLACEHOLDER_INDEX)
}

/// Build the full application router.
fn build_app(schema: Schema, config: &Config) -> Router {
    let static_files = Router::new()
        .nest(
            "/static",
            cached_static_router(&config.assets_dir, CACHE_1DAY),
        )
        .nest(
            "/dist",
            cached_static_router(&config.dist_dir, CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(&config.dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    let index = config.dist_dir.join("index.html");
    let app = Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .with_state(schema)
        .merge(static_files);

    // Client-side routes all land on the SPA shell.
    let app = if index.exists() {
        app.fallback_service(ServeFile::new(index))
    } else {
        tracing::warn!(dist = %config.dist_dir.display(), "Frontend bundle not found, serving placeholder");
        app.fallback(placeholder_index)
    };

    app.layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relief_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn open_storage(db_path: &Path) -> anyhow::Result<std::sync::Arc<storage::Storage>> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    storage::Storage::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))
}

const USAGE: &str = "Usage: relief-backend [grant-role USER_ID public|volunteer|admin]";

/// Roles are not assignable over the API. `grant-role` writes one straight
/// into the database while the server is stopped.
fn parse_grant(args: &[String]) -> anyhow::Result<Option<(String, Role)>> {
    match args {
        [] => Ok(None),
        [command, user_id, role] if command == "grant-role" => {
            let role = role.parse::<Role>().context(USAGE)?;
            if user_id.trim().is_empty() {
                bail!("user id must not be blank\n{USAGE}");
            }
            Ok(Some((user_id.trim().to_string(), role)))
        }
        _ => bail!(USAGE),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let grant = parse_grant(&args)?;
    let config = Config::from_env()?;
    init_tracing();

    let storage = open_storage(&config.db_path)?;
    if let Some((user_id, role)) = grant {
        storage
            .set_role(&user_id, role)
            .with_context(|| format!("Failed to grant {} to {user_id}", role.as_str()))?;
        tracing::info!(%user_id, role = role.as_str(), "Granted role");
        return Ok(());
    }

    if let Some(admin) = &config.bootstrap_admin {
        storage
            .set_role(admin, Role::Admin)
            .context("Failed to assign bootstrap admin")?;
        tracing::info!(user_id = %admin, "Granted admin role from BOOTSTRAP_ADMIN");
    }

    let listing = storage.list_resources().context("Failed to scan resources")?;
    tracing::info!(
        resources = listing.resources.len(),
        quarantined = listing.quarantined,
        db = %config.db_path.display(),
        "Opened resource database"
    );

    let schema = graphql::build_schema(storage);
    let app = build_app(schema, &config);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
