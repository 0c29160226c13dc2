#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use scopeid_tonic_core::proto::{FILE_DESCRIPTOR_SET, id_allocator_server::IdAllocatorServer};
use server::config::{CliArgs, ServerConfig};
use server::discovery::ConsulDiscovery;
use server::service::handler::IdService;
use server::startup::sanity_check;
use server::telemetry::init_telemetry;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{codec::CompressionEncoding, transport::Server};
use tonic_health::server::HealthReporter;
use tonic_reflection::server::Builder;
use tonic_web::GrpcWebLayer;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ServerConfig::try_from(args)?;

    let providers = init_telemetry()?;

    // Nothing is served until the cluster agrees with our identity and clock.
    let registration = match sanity_check(&config).await {
        Ok(registration) => registration,
        Err(e) => {
            tracing::error!("Sanity check failed: {e:#}");
            providers.shutdown();
            return Err(e);
        }
    };

    let listener = TcpListener::bind(config.listen_addr).await?;
    log_startup_info(&config);

    let result = run_server(listener, &config, registration).await;
    providers.shutdown();
    result
}

async fn run_server(
    listener: TcpListener,
    config: &ServerConfig,
    registration: Option<ConsulDiscovery>,
) -> anyhow::Result<()> {
    let (health_reporter, health_service) = tonic_health::server::health_reporter();
    health_reporter
        .set_serving::<IdAllocatorServer<IdService>>()
        .await;

    let service = IdService::new(config.identity);

    let reflection = Builder::configure()
        .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
        .build_v1()?;

    Server::builder()
        .accept_http1(true)
        .http2_adaptive_window(Some(true))
        .layer(
            ServiceBuilder::new()
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(GrpcWebLayer::new()),
        )
        .add_service(health_service)
        .add_service(reflection)
        .add_service(build_id_service(service.clone()))
        .serve_with_incoming_shutdown(
            TcpListenerStream::new(listener),
            shutdown_signal(service, health_reporter, registration),
        )
        .await?;

    tracing::info!("Service shut down successfully");
    Ok(())
}

fn log_startup_info(config: &ServerConfig) {
    if cfg!(debug_assertions) {
        tracing::info!(
            "Starting ID service on {} with full config: {:#?}",
            config.listen_addr,
            config
        );
    } else {
        tracing::info!(
            worker_id = config.identity.worker_id(),
            datacenter_id = config.identity.datacenter_id(),
            "Starting ID service on {}",
            config.listen_addr
        );
    }
}

fn build_id_service(service: IdService) -> IdAllocatorServer<IdService> {
    IdAllocatorServer::new(service)
        .send_compressed(CompressionEncoding::Zstd)
        .send_compressed(CompressionEncoding::Gzip)
        .send_compressed(CompressionEncoding::Deflate)
        .accept_compressed(CompressionEncoding::Zstd)
        .accept_compressed(CompressionEncoding::Gzip)
        .accept_compressed(CompressionEncoding::Deflate)
}

async fn shutdown_signal(
    service: IdService,
    health_reporter: HealthReporter,
    registration: Option<ConsulDiscovery>,
) {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C signal"),
        () = terminate => tracing::info!("Received SIGTERM signal"),
    }

    tracing::info!("Shutdown signal received, terminating gracefully...");

    // 1. Publish the status
    health_reporter
        .set_not_serving::<IdAllocatorServer<IdService>>()
        .await;

    // 2. Stop handing out IDs
    service.shutdown();

    // 3. Leave the catalog so new instances stop checking against us
    if let Some(consul) = registration {
        if let Err(e) = consul.deregister().await {
            tracing::warn!("Failed to deregister from Consul: {e}");
        }
    }
}
