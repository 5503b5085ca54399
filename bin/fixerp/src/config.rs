//! Client-side context management.
//!
//! Reads/writes `~/.fixerp/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A single context, pointing at one fixerpd instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    /// Context name (e.g. "shop").
    pub name: String,

    /// Path to the server-side config file (for local deployments).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub config_path: String,

    /// Server URL (e.g. "http://localhost:8080").
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    /// JWT token (set by `fixerp login`).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,
}

/// Client configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Name of the currently active context.
    #[serde(rename = "current-context", default)]
    pub current_context: String,

    /// List of configured contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
}

impl ClientConfig {
    /// Default config file path: ~/.fixerp/config.toml.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".fixerp").join("config.toml")
    }

    /// Load from disk, or return the default when the file does not exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The currently active context, if any.
    pub fn current(&self) -> Option<&Context> {
        self.contexts.iter().find(|c| c.name == self.current_context)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Context> {
        self.contexts.iter_mut().find(|c| c.name == name)
    }

    /// Add or replace a context.
    pub fn upsert_context(&mut self, ctx: Context) {
        if let Some(existing) = self.get_mut(&ctx.name) {
            *existing = ctx;
        } else {
            self.contexts.push(ctx);
        }
    }

    /// Remove a context by name. Returns true when it was found.
    pub fn remove_context(&mut self, name: &str) -> bool {
        let len = self.contexts.len();
        self.contexts.retain(|c| c.name != name);
        if self.current_context == name {
            self.current_context = String::new();
        }
        self.contexts.len() < len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_empty() {
        let config = ClientConfig::default();
        assert!(config.current_context.is_empty());
        assert!(config.contexts.is_empty());
        assert!(config.current().is_none());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = ClientConfig::default();
        config.current_context = "shop".to_string();
        config.contexts.push(Context {
            name: "shop".to_string(),
            config_path: "/etc/fixerp/shop.toml".to_string(),
            server: "http://localhost:8080".to_string(),
            token: String::new(),
        });

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let back: ClientConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(back.current_context, "shop");
        assert_eq!(back.contexts.len(), 1);
        assert_eq!(back.contexts[0].server, "http://localhost:8080");
    }

    #[test]
    fn removing_current_clears_pointer() {
        let mut config = ClientConfig::default();
        config.current_context = "shop".to_string();
        config.contexts.push(Context {
            name: "shop".to_string(),
            config_path: String::new(),
            server: String::new(),
            token: String::new(),
        });

        assert!(config.remove_context("shop"));
        assert!(config.current_context.is_empty());
        assert!(!config.remove_context("shop"));
    }
}
