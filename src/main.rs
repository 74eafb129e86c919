use liquidlab_revenue::pipeline::{
    PayoutExecutor, PayoutPreparer, RevenueAggregator, WebhookPayoutExecutor,
};
use liquidlab_revenue::{
    api, config::Config, db::init_db, DbPlatformRegistry, HyperliquidVenue, IngestionLoop,
    PlatformRegistry, Repository, Scheduler, VenueAdapter,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;

    // Initialize database and dependencies
    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    // All services are constructed and wired once, here, and passed by
    // reference; nothing resolves collaborators at request time.
    let repo = Arc::new(Repository::new(pool));
    let registry: Arc<dyn PlatformRegistry> = Arc::new(DbPlatformRegistry::new(repo.clone()));
    let venue: Arc<dyn VenueAdapter> =
        Arc::new(HyperliquidVenue::new(config.hyperliquid_api_url.clone()));
    let aggregator = RevenueAggregator::new(repo.clone());

    let ingestion = Arc::new(IngestionLoop::new(
        venue,
        registry.clone(),
        repo.clone(),
        aggregator,
        config.fee_schedule(),
        config.split_policy(),
        config.max_concurrent_platforms,
    ));

    let executor: Option<Arc<dyn PayoutExecutor>> = config
        .payout_executor_url
        .clone()
        .map(|url| Arc::new(WebhookPayoutExecutor::new(url)) as Arc<dyn PayoutExecutor>);
    let preparer = Arc::new(PayoutPreparer::new(
        repo.clone(),
        registry,
        executor,
        config.min_payout,
        config.payout_currency.clone(),
        config.payout_period,
    ));

    // Background jobs: one run shortly after startup, then fixed intervals.
    let scheduler = Scheduler::new();
    {
        let ingestion = ingestion.clone();
        scheduler.register(
            "ingest",
            Duration::from_secs(config.ingest_interval_secs),
            move || {
                let ingestion = ingestion.clone();
                Box::pin(async move {
                    ingestion.run_cycle().await?;
                    Ok(())
                })
            },
        );
    }
    {
        let preparer = preparer.clone();
        scheduler.register(
            "payout",
            Duration::from_secs(config.payout_interval_secs),
            move || {
                let preparer = preparer.clone();
                Box::pin(async move {
                    preparer.run_cycle().await?;
                    Ok(())
                })
            },
        );
    }

    // Create router
    let app = api::create_router(api::AppState::new(repo, preparer));

    // Bind to address
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
