use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::sync::Arc;

use medvision_relay::services::GroqClient;
use medvision_relay::{Config, ImageQueryRelay};

#[derive(Parser)]
#[command(
    name = "relay-query",
    about = "Ask the vision models to explain an image and suggest medications",
    version
)]
struct Cli {
    /// Image file to send.
    #[arg(default_value = "pic1.jpg")]
    image: PathBuf,

    /// Question about the image.
    #[arg(default_value = "What condition is shown in this image?")]
    query: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    let relay = ImageQueryRelay::new(Arc::new(GroqClient::new(&config)?), &config);
    let output = relay.process_image_file(&cli.image, &cli.query).await;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
