use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::{Collection, DatabaseManager};

pub async fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = DatabaseManager::connect_and_migrate(config).await?;
    let tables: Vec<&str> = Collection::all().iter().map(|c| c.table_name()).collect();
    output_success(
        &output_format,
        &format!("Migrated {} collections on {}", tables.len(), store.backend()),
        Some(json!({ "tables": tables })),
    )
}
