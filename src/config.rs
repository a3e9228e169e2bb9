use anyhow::{anyhow, Result};

pub const BASE_URL_VAR: &str = "ATHLETIQ_BASE_URL";
pub const APP_ID_VAR: &str = "ATHLETIQ_APP_ID";
pub const TOKEN_VAR: &str = "ATHLETIQ_TOKEN";

/// Where the backend lives and how to reach it.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    pub app_id: String,
    /// Session JWT; `None` for backends that don't require auth
    pub token: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, app_id: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Read `ATHLETIQ_BASE_URL`, `ATHLETIQ_APP_ID` and, if set, `ATHLETIQ_TOKEN`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var(BASE_URL_VAR).map_err(|_| anyhow!("{} is not set", BASE_URL_VAR))?;
        let app_id = std::env::var(APP_ID_VAR).map_err(|_| anyhow!("{} is not set", APP_ID_VAR))?;

        let mut config = Self::new(base_url, app_id);
        if let Ok(token) = std::env::var(TOKEN_VAR) {
            if !token.is_empty() {
                config = config.with_token(token);
            }
        }
        Ok(config)
    }

    pub fn entities_url(&self) -> String {
        format!("{}/apps/{}/entities", self.base_url, self.app_id)
    }
}
