use serde_json::json;

use crate::cli::{
    utils::{output_error, output_success},
    OutputFormat,
};
use crate::config::AppConfig;
use crate::database::DatabaseManager;

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = DatabaseManager::connect(config).await?;
    match store.health_check().await {
        Ok(()) => output_success(
            &output_format,
            "Database is healthy",
            Some(json!({ "database": store.backend() })),
        ),
        Err(e) => {
            output_error(&output_format, &format!("Database unavailable: {}", e))?;
            anyhow::bail!("health check failed")
        }
    }
}
