mod tools;

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::{model::*, tool_handler, transport::stdio, ServerHandler, ServiceExt};

use crate::tools::TeatimeMcpServer;

/// Data directory override; the config file (if any) is read from `TEATIME_CONFIG`.
const DATA_DIR_ENV: &str = "TEATIME_DATA_DIR";
const CONFIG_ENV: &str = "TEATIME_CONFIG";

#[tool_handler]
impl ServerHandler for TeatimeMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "teatime MCP Server: compact markdown tools for finding trending topics by query and date window. Prefer small k values to keep responses token efficient.".into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_file = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
    let data_dir = std::env::var_os(DATA_DIR_ENV).map(PathBuf::from);
    let cfg = teatime::resolve_config(config_file.as_deref(), data_dir.as_deref())?;

    // Loaded once; every tool call reads the same engine.
    let engine = Arc::new(teatime::load_engine(&cfg)?);
    tracing::info!(data_dir = %cfg.data_dir.display(), "serving trend corpus over stdio");

    let service = TeatimeMcpServer::new(engine, Arc::new(cfg))
        .serve(stdio())
        .await?;
    service.waiting().await?;
    Ok(())
}
