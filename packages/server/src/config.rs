use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_api_url: String,
    pub mail_api_token: String,
    pub mail_from_address: String,
    pub postcode_api_url: String,
    pub verification_scan_cron: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            mail_api_url: env::var("MAIL_API_URL").context("MAIL_API_URL must be set")?,
            mail_api_token: env::var("MAIL_API_TOKEN").context("MAIL_API_TOKEN must be set")?,
            mail_from_address: env::var("MAIL_FROM_ADDRESS")
                .context("MAIL_FROM_ADDRESS must be set")?,
            postcode_api_url: env::var("POSTCODE_API_URL")
                .unwrap_or_else(|_| "https://api.postcodes.io".to_string()),
            verification_scan_cron: env::var("VERIFICATION_SCAN_CRON")
                .unwrap_or_else(|_| "0 0 9 * * *".to_string()),
        })
    }
}
