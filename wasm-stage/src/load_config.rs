/// `load_config` module: reads the YAML config for the CLI and applies environment overrides.
///
/// # Responsibilities
/// - Parse the user-supplied YAML file into [`CliConfig`]
/// - Fill defaults (`compiler.timeout_secs`)
/// - Apply `WASM_STAGE_COMPILER_URL` over `compiler.endpoint` when set
///
/// # Errors
/// Every failure is an `anyhow::Error` that names the file and the step that failed.
///
/// Accepted shape:
///
/// ```yaml
/// compiler:
///   endpoint: http://localhost:8000/compile
///   timeout_secs: 120
/// output:
///   dir: ./out
/// ```
use anyhow::Result;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

/// Overrides `compiler.endpoint`.
pub const COMPILER_URL_ENV: &str = "WASM_STAGE_COMPILER_URL";

#[derive(Debug, Deserialize)]
pub struct CliConfig {
    pub compiler: CompilerSection,
    pub output: OutputSection,
}

#[derive(Debug, Deserialize)]
pub struct CompilerSection {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CompilerSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct OutputSection {
    pub dir: PathBuf,
}

fn default_timeout_secs() -> u64 {
    wasm_stage_core::compile::DEFAULT_TIMEOUT.as_secs()
}

/// Loads the YAML config file, then applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(endpoint) = std::env::var(COMPILER_URL_ENV) {
        if !endpoint.trim().is_empty() {
            info!(endpoint = %endpoint, "Compiler endpoint overridden from environment");
            config.compiler.endpoint = endpoint;
        }
    }

    if config.compiler.timeout_secs == 0 {
        error!(config_path = ?path_ref, "compiler.timeout_secs must be positive");
        return Err(anyhow::anyhow!(
            "Invalid config {:?}: compiler.timeout_secs must be positive",
            path_ref
        ));
    }

    Ok(config)
}
