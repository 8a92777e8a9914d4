use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[api]` block: where the analysis backend lives and how to authenticate.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub token_command: Option<String>,
}

/// `[export]` block.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct ExportConfig {
    pub download_dir: Option<PathBuf>,
}

/// Top-level mta config file structure.
#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct MtaConfig {
    pub api: Option<ApiConfig>,
    pub export: Option<ExportConfig>,
}

impl MtaConfig {
    /// Load config from ~/.mta/config.toml. Returns default if file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(MtaConfig::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: MtaConfig =
            toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;
        Ok(config)
    }

    /// Base URL: CLI flag (or MTA_API_URL via clap) > config > built-in default.
    pub fn base_url(&self, cli_flag: Option<&str>) -> Option<String> {
        if let Some(url) = cli_flag.filter(|u| !u.is_empty()) {
            return Some(url.to_string());
        }
        self.api
            .as_ref()
            .and_then(|a| a.base_url.clone())
            .filter(|u| !u.is_empty())
    }

    /// Where exports are written: CLI flag > config > current directory.
    pub fn download_dir(&self, cli_flag: Option<&Path>) -> PathBuf {
        cli_flag
            .map(Path::to_path_buf)
            .or_else(|| self.export.as_ref().and_then(|e| e.download_dir.clone()))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Display config with secrets redacted.
    pub fn display_redacted(&self) -> String {
        let mut lines = Vec::new();
        if let Some(ref api) = self.api {
            lines.push("[api]".to_string());
            if let Some(ref url) = api.base_url {
                lines.push(format!("  base_url = \"{}\"", url));
            }
            if let Some(ref token) = api.token {
                lines.push(format!("  token = \"{}\"", redact(token)));
            }
            if let Some(ref cmd) = api.token_command {
                lines.push(format!("  token_command = \"{}\"", cmd));
            }
        }
        if let Some(ref export) = self.export {
            lines.push("[export]".to_string());
            if let Some(ref dir) = export.download_dir {
                lines.push(format!("  download_dir = \"{}\"", dir.display()));
            }
        }
        if lines.is_empty() {
            lines.push("(no configuration, using defaults)".to_string());
        }
        lines.join("\n")
    }
}

fn redact(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

/// Resolve the bearer token through the chain:
/// CLI flag > env var > config `token` > config `token_command`.
///
/// The token is optional; `None` means requests go out unauthenticated.
pub fn resolve_token(
    cli_flag: Option<&str>,
    env_var_name: &str,
    config: Option<&ApiConfig>,
) -> Result<Option<String>> {
    // 1. CLI flag
    if let Some(token) = cli_flag {
        if !token.is_empty() {
            return Ok(Some(token.to_string()));
        }
    }

    // 2. Environment variable
    if let Ok(val) = std::env::var(env_var_name) {
        if !val.is_empty() {
            return Ok(Some(val));
        }
    }

    let Some(api) = config else {
        return Ok(None);
    };

    // 3. Config file token
    if let Some(ref token) = api.token {
        if !token.is_empty() {
            return Ok(Some(token.clone()));
        }
    }

    // 4. External command
    if let Some(ref cmd) = api.token_command {
        if !cmd.is_empty() {
            let output = std::process::Command::new("sh")
                .arg("-c")
                .arg(cmd)
                .output()
                .with_context(|| format!("Failed to run token_command: {cmd}"))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "token_command failed (exit {}): {}",
                    output.status.code().unwrap_or(-1),
                    stderr.trim()
                );
            }

            let secret = String::from_utf8(output.stdout)
                .context("token_command output is not valid UTF-8")?
                .trim()
                .to_string();

            if !secret.is_empty() {
                return Ok(Some(secret));
            }
        }
    }

    Ok(None)
}

/// Path to the config file: ~/.mta/config.toml
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".mta").join("config.toml"))
}

/// Default config template content.
pub fn default_config_template() -> &'static str {
    r#"# ~/.mta/config.toml
# Token resolution order: --token flag > MTA_TOKEN env var > token > token_command

[api]
# base_url = "http://localhost:8000/api"
# token = "your-api-token"
# token_command = "your-secrets-manager-command-here"

[export]
# download_dir = "/home/you/Downloads"
"#
}

/// Create the default config file if it doesn't already exist.
pub fn init_config() -> Result<bool> {
    init_config_at(&config_path()?)
}

pub fn init_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    std::fs::write(path, default_config_template())?;
    Ok(true)
}
