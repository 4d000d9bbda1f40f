use crate::{
    config::{Config, ServerConfig},
    error::StartupError,
    inference_service::InferenceService,
    model_service::ModelService,
    ort_service::OrtModelService,
    routes::api_routes,
};
use axum::{extract::DefaultBodyLimit, http::HeaderValue, Router};
use std::{future::Future, net::SocketAddr};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

pub struct SharedState<M: ModelService> {
    pub inference_service: InferenceService<M>,
}

impl<M: ModelService> Clone for SharedState<M> {
    fn clone(&self) -> Self {
        Self {
            inference_service: self.inference_service.clone(),
        }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(
        model_service: impl ModelService,
        config: &ServerConfig,
    ) -> Result<Self, StartupError> {
        let router = build_router(model_service, config)?;

        let addr = config.get_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| StartupError::Bind { addr, source })?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        self.run_until(async {
            shutdown_signal().await;
            tracing::info!("Shutdown signal received, starting graceful shutdown");
        })
        .await
    }

    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        if let Ok(addr) = self.local_addr() {
            tracing::info!("Prediction service listening on {}", addr);
        }

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Prediction service stopped");
        Ok(())
    }
}

pub fn build_router<M: ModelService>(
    model_service: M,
    config: &ServerConfig,
) -> Result<Router, StartupError> {
    let state = SharedState {
        inference_service: InferenceService::new(model_service),
    };

    let router = api_routes::<M>()
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origins)?);

    Ok(router)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, StartupError> {
    let origins = origins
        .iter()
        .map(|origin| match origin.as_str() {
            // A wildcard cannot be combined with credentials.
            "*" => Err(StartupError::InvalidOrigin(origin.clone())),
            _ => origin
                .parse::<HeaderValue>()
                .map_err(|_| StartupError::InvalidOrigin(origin.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Credentials forbid `*`, so methods and headers are mirrored instead.
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request()))
}

/// Loads the model, then serves until Ctrl+C or SIGTERM. Nothing is bound
/// unless the model loaded.
pub async fn start_server(config: Config) -> anyhow::Result<()> {
    let model_config = config.model.clone();
    let ort_model_service =
        tokio::task::spawn_blocking(move || OrtModelService::new(&model_config)).await??;

    let server = HttpServer::new(ort_model_service, &config.server).await?;
    server.run().await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
