use std::env;

use crate::ldf::check_tick_spacing;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_address: String,

    // Used when a request leaves tick_spacing out
    pub default_tick_spacing: i32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // Local overrides first, then the plain .env
        dotenv::from_filename("ldf.env").ok();
        dotenv::dotenv().ok();

        let default_tick_spacing = env::var("DEFAULT_TICK_SPACING")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .unwrap_or(60);
        check_tick_spacing(default_tick_spacing)
            .map_err(|e| anyhow::anyhow!("DEFAULT_TICK_SPACING: {}", e))?;

        Ok(Config {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .unwrap_or(8000),
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()),
            default_tick_spacing,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8000,
            bind_address: "0.0.0.0".to_string(),
            default_tick_spacing: 60,
        }
    }
}
