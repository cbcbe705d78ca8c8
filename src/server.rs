use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::connection::Connection;
use crate::handlers::{error_reply, Command};

pub type SharedCache = Arc<Mutex<ExpiringCache<String>>>;

pub struct CacheServer {
    config: Arc<Config>,
    cache: SharedCache,
}

impl CacheServer {
    pub fn new(config: Config, cache: SharedCache) -> Self {
        CacheServer {
            config: Arc::new(config),
            cache,
        }
    }

    /// Builds a server with a fresh cache using the configured default TTL.
    pub fn from_config(config: Config) -> Result<Self> {
        let cache = ExpiringCache::with_default_ttl(config.default_ttl)?;

        Ok(Self::new(config, Arc::new(Mutex::new(cache))))
    }

    pub fn cache(&self) -> SharedCache {
        Arc::clone(&self.cache)
    }

    pub async fn listen(&self) -> Result<TcpListener> {
        let addr = self.config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {addr}"))?;

        info!(addr = %listener.local_addr()?, "ready to accept connections");
        Ok(listener)
    }

    /// Accepts connections until the listener fails, one task per client.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        if let Some(interval) = self.config.sweep_interval {
            tokio::spawn(sweep_expired(Arc::clone(&self.cache), interval));
        }

        loop {
            let (stream, peer) = listener.accept().await.context("accept failed")?;
            info!(%peer, "accepted connection");

            let cache = Arc::clone(&self.cache);
            let config = Arc::clone(&self.config);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(Connection::new(stream), cache, config).await {
                    warn!(%peer, error = %e, "connection closed with error");
                } else {
                    debug!(%peer, "connection closed");
                }
            });
        }
    }
}

async fn handle_connection(
    mut conn: Connection,
    cache: SharedCache,
    config: Arc<Config>,
) -> Result<()> {
    while let Some(frame) = conn.read_frame().await? {
        let response = match Command::from_frame(frame) {
            Ok(command) => {
                let mut cache = cache.lock().await;
                command.execute(&mut cache, &config)
            }
            Err(e) => {
                warn!(error = %e, "rejected command");
                error_reply(&e)
            }
        };

        conn.write_frame(&response).await?;
    }

    Ok(())
}

async fn sweep_expired(cache: SharedCache, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let purged = cache.lock().await.purge_expired();
        if purged > 0 {
            debug!(purged, "swept expired entries");
        }
    }
}
