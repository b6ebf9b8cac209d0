use plexport_core::{ClientConfig, Exporter, PlexClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url =
        std::env::var("PLEX_URL").unwrap_or_else(|_| "http://localhost:32400".to_string());
    let token = std::env::var("PLEX_TOKEN")?;

    let client = PlexClient::new(ClientConfig::new(url, token))?;
    let exporter = Exporter::new(client);

    let libraries = exporter.libraries().await?;
    println!("Available libraries:");
    for lib in &libraries {
        println!("  {} (ID: {}, Type: {})", lib.title, lib.key, lib.kind);
    }

    Ok(())
}
