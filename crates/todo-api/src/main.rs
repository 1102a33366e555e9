//! todo-api バイナリのエントリポイント

use anyhow::{anyhow, Context, Result};
use infrastructure::{DynamoTodoStore, InMemoryTodoStore, TodoStore};
use shared::{init_tracing, Config, StorageBackend};
use std::net::SocketAddr;
use std::sync::Arc;
use todo_api::{app, AppState};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().map_err(|e| anyhow!(e))?;

    let config = Config::from_env().context("failed to load configuration")?;
    let store = open_store(&config).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, backend = %config.storage_backend, "Listening");

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let router = app(AppState::new(store));
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        _ = shutdown_signal() => {}
        // シグナル前にサーバが終了した場合
        joined = &mut server => {
            return match joined {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow!(e).context("server error")),
                Err(e) => Err(anyhow!(e).context("server task failed")),
            };
        }
    }

    info!("Shutting down server");
    let _ = stop_tx.send(());

    match tokio::time::timeout(config.shutdown_grace_period, &mut server).await {
        Ok(Ok(Ok(()))) => info!("Server stopped gracefully"),
        Ok(Ok(Err(e))) => error!(error = %e, "Server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "Server task failed during shutdown"),
        Err(_) => {
            warn!(
                grace_ms = config.shutdown_grace_period.as_millis() as u64,
                "Server forced to shutdown"
            );
            server.abort();
        }
    }

    Ok(())
}

/// 接続できなければ起動を中止する
async fn open_store(config: &Config) -> Result<Arc<dyn TodoStore>> {
    match config.storage_backend {
        StorageBackend::DynamoDb => {
            let store = DynamoTodoStore::connect(config)
                .await
                .context("DynamoDB connection failed")?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; data is lost on exit");
            Ok(Arc::new(InMemoryTodoStore::new()))
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
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
