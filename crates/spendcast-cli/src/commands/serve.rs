//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16) -> Result<()> {
    println!("🚀 Starting Spendcast web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Comma-separated list of browser origins allowed to call the API
    let allowed_origins =
        spendcast_server::parse_origins(&std::env::var("SPENDCAST_ALLOWED_ORIGINS").unwrap_or_default());
    if !allowed_origins.is_empty() {
        println!(
            "   🌐 Allowed origins: {} (SPENDCAST_ALLOWED_ORIGINS)",
            allowed_origins.join(", ")
        );
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let db = open_db(db_path)?;

    let config = spendcast_server::ServerConfig {
        allowed_origins,
        ..Default::default()
    };

    spendcast_server::serve_with_config(db, host, port, config).await?;

    Ok(())
}
