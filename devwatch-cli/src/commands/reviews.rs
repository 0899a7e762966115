//! Reviews command - dump every review of the user to a JSON file

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use devwatch_core::{Config, Secrets};
use devwatch_http::DevmanClient;
use url::Url;

/// Arguments for the reviews command
#[derive(Args, Debug)]
pub struct ReviewsArgs {
    /// File to write the reviews to
    #[arg(short, long, default_value = "user_reviews.json")]
    pub output: PathBuf,
}

impl ReviewsArgs {
    /// Execute the reviews command
    pub async fn execute(&self, config: &Config, secrets: &Secrets) -> anyhow::Result<()> {
        let token = secrets
            .devman_token()
            .context("Devman token not found. Set DEVMAN_TOKEN or add it to the secrets file")?;

        let client = DevmanClient::new(
            token,
            Url::parse(&config.api.endpoint_url).context("Invalid api.endpoint_url")?,
            Url::parse(&config.api.reviews_url).context("Invalid api.reviews_url")?,
        )?;

        let reviews = client.fetch_user_reviews().await?;
        let json = serde_json::to_string_pretty(&reviews)?;
        std::fs::write(&self.output, json)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;

        println!("Saved reviews to {}", self.output.display());
        Ok(())
    }
}
