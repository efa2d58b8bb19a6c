use std::{
    fs::OpenOptions,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware,
};
use axum_server::Handle;
use clap::Parser;
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

#[cfg(debug_assertions)]
use tower_livereload::LiveReloadLayer;

use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use fraudcheck_rs::{
    AppState, DEFAULT_SCORE_ENDPOINT_URL, FeatureValidator, HttpScoreClient, SQLiteTransactionStore,
    ScoreClientConfig, build_router, get_local_offset, graceful_shutdown, initialize_db,
    logging_middleware,
};

/// The web server for scoring transactions with a fraud model.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env)]
    db_path: String,

    /// The port to serve the app from.
    #[arg(short, long, env, default_value_t = 3000)]
    port: u16,

    /// The URL of the fraud model's prediction endpoint.
    #[arg(long, env, default_value = DEFAULT_SCORE_ENDPOINT_URL)]
    score_endpoint_url: String,

    /// How long to wait for the fraud model to respond, in seconds.
    #[arg(long, env, default_value_t = 10)]
    score_timeout_secs: u64,

    /// Reject transactions that do not have exactly this many features.
    #[arg(long, env)]
    expected_feature_count: Option<usize>,

    /// File path for the debug log.
    #[arg(long, env, default_value = "debug.log")]
    log_path: String,

    /// The canonical timezone used to display timestamps, e.g. "Pacific/Auckland".
    #[arg(long, env, default_value = "Etc/UTC")]
    local_timezone: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    setup_logging(&args.log_path)?;

    if get_local_offset(&args.local_timezone).is_none() {
        return Err(format!("invalid timezone \"{}\"", args.local_timezone).into());
    }

    let connection = Connection::open(&args.db_path)
        .inspect_err(|error| tracing::error!("could not open database {}: {error}", args.db_path))?;
    initialize_db(&connection)
        .inspect_err(|error| tracing::error!("could not initialize database: {error}"))?;
    let connection = Arc::new(Mutex::new(connection));

    let scorer = HttpScoreClient::new(ScoreClientConfig {
        endpoint_url: args.score_endpoint_url,
        timeout: Duration::from_secs(args.score_timeout_secs),
    })?;
    tracing::info!("Scoring transactions with {}", scorer.endpoint_url());

    let validator = match args.expected_feature_count {
        Some(count) => FeatureValidator::with_expected_count(count),
        None => FeatureValidator::new(),
    };

    let state = AppState::new(
        validator,
        Arc::new(scorer),
        Arc::new(SQLiteTransactionStore::new(connection)),
        &args.local_timezone,
    );

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = build_router(state).layer(middleware::from_fn(logging_middleware));
    let router = add_tracing_layer(router);

    #[cfg(debug_assertions)]
    let router = router.layer(LiveReloadLayer::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;

    Ok(())
}

fn setup_logging(log_path: &str) -> Result<(), std::io::Error> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new().create(true).append(true).open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
