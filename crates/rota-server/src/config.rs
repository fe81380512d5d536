//! Runtime configuration, layered from an optional TOML file and `ROTA_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use rota_core::{SectorId, UserId, directory::DutyUser};
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Sectors upserted into the directory at startup.
  #[serde(default)]
  pub sectors:    Vec<SectorSeed>,
  /// Users upserted into the directory at startup.
  #[serde(default)]
  pub users:      Vec<UserSeed>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SectorSeed {
  pub sector_id: SectorId,
  pub name:      String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UserSeed {
  pub user_id:          UserId,
  pub display_name:     Option<String>,
  #[serde(default = "default_eligible")]
  pub is_duty_eligible: bool,
}

impl From<UserSeed> for DutyUser {
  fn from(seed: UserSeed) -> Self {
    DutyUser {
      user_id:          seed.user_id,
      display_name:     seed.display_name,
      is_duty_eligible: seed.is_duty_eligible,
    }
  }
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("rota.db") }

fn default_eligible() -> bool { true }

impl ServerConfig {
  /// Read `path` (if it exists) and overlay `ROTA_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("ROTA"))
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// `store_path` with a leading `~/` expanded to the home directory.
  pub fn resolved_store_path(&self) -> PathBuf { expand_tilde(&self.store_path) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.store_path, PathBuf::from("rota.db"));
    assert!(cfg.sectors.is_empty());
  }

  #[test]
  fn seeds_are_read() {
    let cfg = parse(
      r#"
      port = 9000

      [[sectors]]
      sector_id = 1
      name = "Front desk"

      [[users]]
      user_id = 7
      display_name = "Ada"

      [[users]]
      user_id = 8
      is_duty_eligible = false
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.sectors[0].name, "Front desk");
    let users: Vec<DutyUser> = cfg.users.into_iter().map(DutyUser::from).collect();
    assert!(users[0].is_duty_eligible);
    assert_eq!(users[0].display_name.as_deref(), Some("Ada"));
    assert!(!users[1].is_duty_eligible);
    assert_eq!(users[1].display_name, None);
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let cfg = ServerConfig::load(Path::new("/nonexistent/rota.toml")).unwrap();
    assert!(cfg.users.is_empty());
  }

  #[test]
  fn tilde_expands_to_home() {
    let Ok(home) = std::env::var("HOME") else { return };
    let cfg = ServerConfig { store_path: PathBuf::from("~/rota.db"), ..parse("") };
    assert_eq!(cfg.resolved_store_path(), PathBuf::from(home).join("rota.db"));
  }
}
