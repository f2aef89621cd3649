use crate::infra::http::ClientSettings;
use crate::infra::metrics::{MetricsServerConfig, TlsConfig};
use anyhow::{Context, Result, anyhow};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_DIR_ENV: &str = "APP_CONFIG_DIR";
const CONFIG_PROFILE_ENV: &str = "APP_CONFIG_PROFILE";
const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_PROFILE: &str = "default";
const DEFAULT_API_BASE: &str = "http://127.0.0.1:8080";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_ms: Option<u64>,
    pub metrics_addr: Option<String>,
    pub allow_insecure_metrics_dev: Option<bool>,
    pub metrics_auth_token: Option<String>,
    pub metrics_tls_cert_path: Option<String>,
    pub metrics_tls_key_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        let base_dir = env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));
        Self::load_from_dir(&base_dir)
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut config = AppConfig::default();
        let mut overlays = Vec::new();

        if dir.exists() {
            let mut profiles = Vec::new();
            profiles.push(DEFAULT_PROFILE.to_string());
            if let Ok(active_profile) = env::var(CONFIG_PROFILE_ENV) {
                if !active_profile.trim().is_empty() && active_profile != DEFAULT_PROFILE {
                    profiles.push(active_profile);
                }
            }
            profiles.push("local".to_string());

            for profile in profiles {
                let candidate = dir.join(format!("{profile}.toml"));
                if let Some(overlay) = ConfigOverlay::from_file(&candidate)? {
                    overlays.push(overlay);
                }
            }
        }

        overlays.push(ConfigOverlay::from_env());

        for overlay in overlays {
            config.apply_overlay(overlay);
        }

        Ok(config)
    }

    /// Command-line values win over files and environment.
    pub fn apply_cli_overrides(
        &mut self,
        api_base_url: Option<String>,
        api_token: Option<String>,
        request_timeout_ms: Option<u64>,
    ) {
        self.apply_overlay(ConfigOverlay {
            api_base_url,
            api_token,
            request_timeout_ms,
            ..ConfigOverlay::default()
        });
    }

    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        if let Some(value) = overlay.api_base_url {
            self.api_base_url = Some(value);
        }
        if let Some(value) = overlay.api_token {
            self.api_token = Some(value);
        }
        if let Some(value) = overlay.request_timeout_ms {
            self.request_timeout_ms = Some(value);
        }
        if let Some(value) = overlay.metrics_addr {
            self.metrics_addr = Some(value);
        }
        if let Some(value) = overlay.allow_insecure_metrics_dev {
            self.allow_insecure_metrics_dev = Some(value);
        }
        if let Some(value) = overlay.metrics_auth_token {
            self.metrics_auth_token = Some(value);
        }
        if let Some(value) = overlay.metrics_tls_cert_path {
            self.metrics_tls_cert_path = Some(value);
        }
        if let Some(value) = overlay.metrics_tls_key_path {
            self.metrics_tls_key_path = Some(value);
        }
    }

    pub fn client_settings(&self) -> Result<ClientSettings> {
        let raw = self.api_base_url.as_deref().unwrap_or(DEFAULT_API_BASE);
        let base_url = validate_base_url(raw)?;
        let timeout_ms = self.request_timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        Ok(ClientSettings {
            base_url,
            token: self
                .api_token
                .as_ref()
                .filter(|token| !token.trim().is_empty())
                .cloned(),
            timeout: Duration::from_millis(timeout_ms),
            user_agent: format!("mcp-tool-console/{}", env!("CARGO_PKG_VERSION")),
        })
    }

    pub fn metrics_server_config(&self) -> Result<Option<MetricsServerConfig>> {
        let addr = match self.metrics_addr.as_ref() {
            Some(addr) => addr
                .parse::<SocketAddr>()
                .with_context(|| format!("parse METRICS_ADDR '{}'", addr))?,
            None => return Ok(None),
        };

        let allow_insecure = self.allow_insecure_metrics_dev.unwrap_or(false);
        let tls = match (
            self.metrics_tls_cert_path.as_ref(),
            self.metrics_tls_key_path.as_ref(),
        ) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: PathBuf::from(cert),
                key_path: PathBuf::from(key),
            }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "metrics TLS requires both METRICS_TLS_CERT_PATH and METRICS_TLS_KEY_PATH"
                ));
            }
        };

        Ok(Some(MetricsServerConfig {
            addr,
            auth_token: self.metrics_auth_token.clone(),
            allow_insecure,
            tls,
        }))
    }
}

/// Base URLs must be absolute http(s) URLs with a host. A trailing slash is
/// dropped so endpoint paths can be appended directly.
fn validate_base_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "api base url must use http or https; got '{}://'",
            parsed.scheme()
        ));
    }
    if parsed.host_str().is_none() {
        return Err(anyhow!("api base url must include a host"));
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[derive(Debug, Default, Deserialize)]
struct ConfigOverlay {
    api_base_url: Option<String>,
    api_token: Option<String>,
    request_timeout_ms: Option<u64>,
    metrics_addr: Option<String>,
    allow_insecure_metrics_dev: Option<bool>,
    metrics_auth_token: Option<String>,
    metrics_tls_cert_path: Option<String>,
    metrics_tls_key_path: Option<String>,
}

impl ConfigOverlay {
    fn from_file(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let overlay: Self = toml::from_str(&contents)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(Some(overlay))
    }

    fn from_env() -> Self {
        let api_base_url = env::var("CONSOLE_API_BASE").ok();
        let api_token = env::var("CONSOLE_API_TOKEN").ok();
        let request_timeout_ms = env::var("CONSOLE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok());
        let metrics_addr = env::var("METRICS_ADDR").ok();
        let allow_insecure_metrics_dev = env::var("ALLOW_INSECURE_METRICS_DEV")
            .ok()
            .and_then(|v| v.parse::<bool>().ok());
        let metrics_auth_token = env::var("METRICS_AUTH_TOKEN").ok();
        let metrics_tls_cert_path = env::var("METRICS_TLS_CERT_PATH").ok();
        let metrics_tls_key_path = env::var("METRICS_TLS_KEY_PATH").ok();
        Self {
            api_base_url,
            api_token,
            request_timeout_ms,
            metrics_addr,
            allow_insecure_metrics_dev,
            metrics_auth_token,
            metrics_tls_cert_path,
            metrics_tls_key_path,
        }
    }
}
