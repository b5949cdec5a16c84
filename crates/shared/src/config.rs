use std::env;

use crate::error::DigestError;

/// Settings for the digest generator, read from the environment.
#[derive(Debug, Clone)]
pub struct DigestConfig {
    pub openai_api_key: String,
    /// Optional DATE override, lowest-precedence date source
    pub date_override: Option<String>,
}

impl DigestConfig {
    pub fn from_env() -> Result<Self, DigestError> {
        try_load_dotenv();

        let openai_api_key = env::var("OPENAI_API_KEY")
            .map_err(|_| DigestError::MissingCredential("OPENAI_API_KEY".to_string()))?;

        let date_override = env::var("DATE").ok();

        Ok(Self {
            openai_api_key,
            date_override,
        })
    }
}

/// Settings for the newsletter sender.
#[derive(Debug, Clone)]
pub struct SendConfig {
    pub buttondown_token: String,
}

impl SendConfig {
    pub fn from_env() -> Result<Self, DigestError> {
        try_load_dotenv();

        let buttondown_token = env::var("BUTTONDOWN_TOKEN")
            .map_err(|_| DigestError::MissingCredential("BUTTONDOWN_TOKEN".to_string()))?;

        Ok(Self { buttondown_token })
    }
}

fn try_load_dotenv() {
    // Try locations in order of preference:

    // 1. Current directory (for development)
    if dotenvy::dotenv().is_ok() {
        return;
    }

    // 2. ~/.config/mt-digest/.env (standard config location)
    if let Some(config_dir) = dirs::config_dir() {
        let config_path = config_dir.join("mt-digest").join(".env");
        if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
            return;
        }
    }

    // 3. ~/.env (home directory)
    if let Some(home_dir) = dirs::home_dir() {
        let home_path = home_dir.join(".env");
        if home_path.exists() && dotenvy::from_path(&home_path).is_ok() {
            return;
        }
    }

    // If none found, that's okay - environment variables might be set system-wide
}
