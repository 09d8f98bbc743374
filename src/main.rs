#[cfg(feature = "ssr")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;
    use std::time::Duration;

    use anyhow::Context;
    use axum::routing::get;
    use axum::Router;
    use leptos::prelude::*;
    use leptos_axum::{generate_route_list, LeptosRoutes};
    use neighborly::app::{shell, App};
    use neighborly::config::ServerConfig;
    use neighborly::db::store::{ContentStore, MongoContentStore};
    use neighborly::state::AppState;
    use tower_http::services::ServeDir;
    use tower_http::trace::TraceLayer;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "neighborly=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting Neighborly server...");

    let config = ServerConfig::load()?;
    let taxonomy = config.load_taxonomy()?;
    tracing::info!("Loaded type taxonomy version {}", taxonomy.version());

    // Load Leptos options from Cargo.toml metadata
    let conf = get_configuration(None).context("Failed to read Leptos configuration")?;
    let leptos_options = conf.leptos_options;
    let addr = leptos_options.site_addr;
    let site_root = leptos_options.site_root.to_string();

    let content_store: Arc<dyn ContentStore> = if config.demo_mode {
        tracing::info!("Demo mode enabled, serving seeded posts from memory");
        Arc::new(neighborly::demo_seeder::demo_store()?)
    } else {
        let mut options = mongodb::options::ClientOptions::parse(&config.mongodb.uri)
            .await
            .context("Invalid MongoDB URI")?;
        options.app_name = Some("neighborly".to_string());
        options.server_selection_timeout = Some(Duration::from_millis(
            config.mongodb.server_selection_timeout_ms,
        ));

        let client =
            mongodb::Client::with_options(options).context("Failed to create MongoDB client")?;
        let store = MongoContentStore::new(
            &client.database(&config.mongodb.database),
            &config.mongodb.collection,
        );

        // The driver connects lazily; an unreachable store only fails requests.
        if let Err(e) = store.ensure_indexes().await {
            tracing::warn!("Could not ensure search indexes: {e}");
        }

        tracing::info!(
            "Using MongoDB collection {}.{}",
            config.mongodb.database,
            config.mongodb.collection
        );
        Arc::new(store)
    };

    let app_state = AppState {
        content_store,
        taxonomy: Arc::new(taxonomy),
        exclude_statuses: Arc::new(config.search.exclude_statuses.clone()),
        leptos_options: leptos_options.clone(),
    };

    // Generate the Leptos route list for SSR
    let routes = generate_route_list(App);

    let app = Router::new()
        .route("/search", get(neighborly::api::search::search_handler))
        .leptos_routes(&app_state, routes, {
            let leptos_options = leptos_options.clone();
            move || shell(leptos_options.clone())
        })
        .fallback_service(ServeDir::new(&site_root))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

// The hydrate() function in lib.rs handles client-side initialization.
#[cfg(not(feature = "ssr"))]
fn main() {}
