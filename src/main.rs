use std::sync::Arc;

use lockd::config::Config;
use lockd::engine::LockStore;
use lockd::routes::router;
use lockd::AppState;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let config = Config::new();
	init_tracing(&config);

	let store = LockStore::new(config.ttl());
	let shutdown = store.shutdown_token();

	let sweeper = tokio::spawn(store.clone().run_sweeper(config.sweep_period()));

	let state = AppState::new(store.clone(), Arc::new(config.clone()));
	let app = router(state).layer(tower_http::trace::TraceLayer::new_for_http());

	let listener = tokio::net::TcpListener::bind(&config.listen).await?;
	tracing::info!(addr = %config.listen, "lockd listening");

	axum::serve(listener, app).with_graceful_shutdown(shutdown_signal(shutdown.clone())).await?;

	shutdown.cancel();
	sweeper.await.ok();
	store.drain();
	tracing::info!("lockd stopped");

	Ok(())
}

async fn shutdown_signal(shutdown: tokio_util::sync::CancellationToken) {
	let ctrl_c = async {
		tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
			.expect("failed to install SIGTERM handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		() = ctrl_c => {}
		() = terminate => {}
	}
	shutdown.cancel();
}

fn init_tracing(config: &Config) {
	let filter = config
		.rust_log
		.clone()
		.map(EnvFilter::new)
		.unwrap_or_else(|| EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

	let registry = tracing_subscriber::registry().with(filter);

	if config.log_json {
		registry.with(tracing_subscriber::fmt::layer().json()).init();
	} else {
		registry.with(tracing_subscriber::fmt::layer()).init();
	}
}
