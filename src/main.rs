use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use orderflow::config::Config;
use orderflow::db::{AppState, create_pool, init_db, queries};
use orderflow::handlers;
use orderflow::models::CreateOrder;
use orderflow::payments::{CHARGE_SUCCESS, ReferenceCodec, SignatureVerifier};

#[derive(Parser, Debug)]
#[command(name = "orderflow")]
#[command(about = "Order payment confirmation and fulfillment tracking service")]
struct Cli {
    /// Seed the database with a sample unpaid order and print a signed
    /// webhook that would confirm it (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Print the webhook signature for the payload in this file and exit.
    /// Useful for replaying a captured delivery with curl.
    #[arg(long, value_name = "FILE")]
    sign: Option<String>,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    eprintln!("ERROR: {}", message);
    std::process::exit(1);
}

fn sign_file(verifier: Option<&SignatureVerifier>, path: &str) {
    let Some(verifier) = verifier else {
        exit_with("PAYSTACK_WEBHOOK_SECRET must be set to sign payloads");
    };
    let payload = std::fs::read(path)
        .unwrap_or_else(|e| exit_with(format!("Failed to read {}: {}", path, e)));
    println!("{}", verifier.sign(&payload));
}

fn seed_dev_data(state: &AppState) {
    let conn = state
        .db
        .get()
        .unwrap_or_else(|e| exit_with(format!("Failed to get db connection for seeding: {}", e)));

    let draft = CreateOrder {
        product_link: Some("https://shop.example.com/item/123".to_string()),
        quantity: Some(1),
        notes: Some("Seeded dev order".to_string()),
        ..CreateOrder::new("dev-customer", 50_000)
    };
    let order = queries::create_order(&conn, &draft, &state.currency)
        .unwrap_or_else(|e| exit_with(format!("Failed to seed order: {}", e)));
    let reference = state.references.encode(order.id);

    tracing::info!(order_id = %order.id, reference = %reference, "Seeded unpaid order");

    let payload = serde_json::json!({
        "event": CHARGE_SUCCESS,
        "data": {
            "reference": reference,
            "amount": order.total_minor,
            "currency": order.currency,
            "status": "success",
        }
    })
    .to_string();

    println!();
    println!("Seeded order {} ({} {} minor units)", order.id, order.total_minor, order.currency);
    println!("Reference: {}", reference);
    println!("Webhook body: {}", payload);
    match state.webhook_verifier.as_ref() {
        Some(verifier) => println!("x-paystack-signature: {}", verifier.sign(payload.as_bytes())),
        None => println!("(set PAYSTACK_WEBHOOK_SECRET to get a signature)"),
    }
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orderflow=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let webhook_verifier = match SignatureVerifier::new(config.paystack_webhook_secret.as_deref()) {
        Ok(v) => Some(v),
        Err(e) => {
            // Keep serving orders; the webhook endpoint refuses every delivery.
            tracing::error!("{}; webhook endpoint will reject all deliveries", e);
            None
        }
    };

    if let Some(path) = cli.sign.as_deref() {
        sign_file(webhook_verifier.as_ref(), path);
        return;
    }

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let references = ReferenceCodec::new(&config.reference_prefix)
        .unwrap_or_else(|e| exit_with(e));

    if config.staff_api_key.is_none() {
        tracing::warn!("STAFF_API_KEY is not set; staff endpoints are disabled");
    }

    let db_pool = create_pool(&config.database_path)
        .unwrap_or_else(|e| exit_with(format!("Failed to create database pool: {}", e)));

    {
        let conn = db_pool
            .get()
            .unwrap_or_else(|e| exit_with(format!("Failed to get connection: {}", e)));
        init_db(&conn).unwrap_or_else(|e| exit_with(format!("Failed to initialize database: {}", e)));
    }

    let state = AppState {
        db: db_pool,
        webhook_verifier,
        references,
        currency: config.currency.clone(),
        staff_api_key: config.staff_api_key.clone(),
        base_url: config.base_url.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set ORDERFLOW_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    let app = handlers::router(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| exit_with(format!("Failed to bind to {}: {}", addr, e)));

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Orderflow server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        exit_with(format!("Server error: {}", e));
    }

    if cleanup_on_exit {
        let db_path = &config.database_path;
        if let Err(e) = std::fs::remove_file(db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
