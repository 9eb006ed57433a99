use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::services::AppServices;
use crate::storage::{SeaOrmStorage, StorageFactory};

pub struct StartupContext {
    pub storage: Arc<SeaOrmStorage>,
    pub services: Arc<AppServices>,
}

/// 连接并迁移数据库，创建上传目录并组装各服务
pub async fn prepare_server_startup() -> Result<StartupContext> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let config = crate::config::get_config();

    let storage = StorageFactory::create()
        .await
        .context("Failed to create storage backend")?;
    info!("Using storage backend: {}", storage.backend_name());

    tokio::fs::create_dir_all(&config.media.upload_dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", config.media.upload_dir))?;

    let services = Arc::new(AppServices::from_config(storage.clone()));

    info!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );
    Ok(StartupContext { storage, services })
}
