use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod aggregator;
mod api;
mod cache;
mod cli;
mod config;
mod consents;
mod errors;
mod models;
mod oauth;
mod store;

use aggregator::AccountService;
use cache::TtlCache;
use config::Providers;
use consents::ConsentService;
use oauth::TokenService;
use store::postgres::PgStore;
use store::{AccountStore, ConsentStore};

/// Shared application state passed to handlers.
pub struct AppState {
    pub consents: ConsentService,
    pub accounts: AccountService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "bankagg=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::CheckConfig) => {
            let providers = Providers::from_yaml_file(&cfg.providers_file)?;
            println!("Provider registry OK: {} provider(s) registered.", providers.len());
            Ok(())
        }
        None => run_server(cfg, None).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(cfg.port);

    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    tracing::info!("Loading provider registry from {}...", cfg.providers_file);
    let providers = Arc::new(Providers::from_yaml_file(&cfg.providers_file)?);
    tracing::info!("{} provider(s) registered", providers.len());

    let cache = TtlCache::new(cfg.cache_max_entries, cfg.cache_initial_capacity);

    let http = reqwest::Client::builder()
        .use_rustls_tls()
        .pool_max_idle_per_host(32)
        .timeout(Duration::from_secs(60))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let tokens = TokenService::new(
        providers.clone(),
        cache,
        http.clone(),
        Duration::from_secs(cfg.token_ttl_secs),
    );

    let store = Arc::new(db);
    let consent_store: Arc<dyn ConsentStore> = store.clone();
    let account_store: Arc<dyn AccountStore> = store.clone();

    let consents = ConsentService::new(
        tokens.clone(),
        providers.clone(),
        consent_store.clone(),
        http.clone(),
    );
    let accounts = AccountService::new(tokens, providers, consent_store, account_store, http);

    let state = Arc::new(AppState { consents, accounts });

    let app = axum::Router::new()
        .route("/healthz", axum::routing::get(|| async { "ok" }))
        .route("/readyz", axum::routing::get(readiness_check))
        .nest("/api/v1", api::api_router())
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("bankagg listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn readiness_check() -> &'static str {
    "ok"
}
