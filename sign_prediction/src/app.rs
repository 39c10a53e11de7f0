use crate::{
    config::Config,
    labels::LabelTable,
    model_service::ModelService,
    ort_service::OrtModelService,
    server::HttpServer,
    state::ServiceState,
};
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let service = Arc::new(build_service_state(&config));

    let server = HttpServer::new(service, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    server_handle.await??;

    Ok(())
}

/// Loads the model and label table. Neither failure is fatal: without a
/// model every prediction answers "Model not loaded", without labels the
/// class index is returned.
pub fn build_service_state(config: &Config) -> ServiceState {
    let model: Option<Arc<dyn ModelService>> = match OrtModelService::new(&config.model) {
        Ok(model) => {
            tracing::info!("Model loaded successfully.");
            Some(Arc::new(model))
        }
        Err(e) => {
            tracing::error!("Error loading model: {}", e);
            None
        }
    };

    let labels = match LabelTable::load(&config.labels) {
        Ok(labels) => labels,
        Err(e) => {
            tracing::error!("Failed to load class labels: {}", e);
            LabelTable::default()
        }
    };
    tracing::info!("Class labels: {:?}", labels.as_slice());

    ServiceState::new(
        model,
        labels,
        config.model.image_width,
        config.model.image_height,
    )
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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
