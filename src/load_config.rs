use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;
use tracing::{error, info};

use crate::auth::Credentials;
use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::transport::Headers;

#[derive(Deserialize)]
struct StaticConfig {
    destination: DestinationSection,
    #[serde(default)]
    transfer: TransferSection,
}

#[derive(Deserialize)]
struct DestinationSection {
    url: String,
}

#[derive(Deserialize, Default)]
struct TransferSection {
    #[serde(default)]
    chunk_size_mib: Option<u64>,
    #[serde(default)]
    verbose: bool,
}

/// Fully merged CLI configuration: static YAML plus env-supplied secrets.
#[derive(Debug)]
pub struct CliConfig {
    pub url: String,
    pub max_chunk_size: usize,
    pub verbose: bool,
    pub credentials: Credentials,
}

/// Loads a static YAML config file (no secrets) and injects required env
/// vars for auth material. `SP_AUTH_HEADER` carries the `Authorization`
/// value, `SP_AUTH_COOKIE` an auth cookie; at least one must be set.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let static_conf: StaticConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut headers = Headers::new();
    if let Ok(auth_header) = std::env::var("SP_AUTH_HEADER") {
        headers.insert("Authorization".to_string(), auth_header);
    }
    if let Ok(cookie) = std::env::var("SP_AUTH_COOKIE") {
        headers.insert("Cookie".to_string(), cookie);
    }
    if headers.is_empty() {
        error!("Neither SP_AUTH_HEADER nor SP_AUTH_COOKIE environment variable is set");
        anyhow::bail!("Neither SP_AUTH_HEADER nor SP_AUTH_COOKIE environment variable is set");
    }

    let max_chunk_size = match static_conf.transfer.chunk_size_mib {
        Some(0) => {
            error!("transfer.chunk_size_mib must be positive");
            anyhow::bail!("transfer.chunk_size_mib must be positive");
        }
        Some(mib) => (mib as usize) * 1024 * 1024,
        None => DEFAULT_CHUNK_SIZE,
    };

    info!(
        url = %static_conf.destination.url,
        max_chunk_size,
        verbose = static_conf.transfer.verbose,
        "Config loaded and merged successfully"
    );

    Ok(CliConfig {
        url: static_conf.destination.url,
        max_chunk_size,
        verbose: static_conf.transfer.verbose,
        credentials: Credentials {
            username: None,
            password: None,
            headers,
        },
    })
}
