use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    User,
    Project,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingKey {
    ApiKey,
    BaseUrl,
    Model,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Key/value persistence backing the CLI. Each operation addresses exactly
/// one scope; scopes are never merged on read.
pub trait SettingsStore {
    fn get(&self, scope: Scope, key: SettingKey) -> Result<Option<String>>;
    fn set_value(&mut self, scope: Scope, key: SettingKey, value: &str) -> Result<()>;
    fn unset(&mut self, scope: Scope, key: SettingKey) -> Result<()>;
    fn file_path(&self, scope: Scope) -> &Path;
}

pub struct FileSettings {
    user_path: PathBuf,
    project_path: PathBuf,
}

impl FileSettings {
    pub fn open() -> Result<Self> {
        Ok(FileSettings {
            user_path: user_config_file_path()?,
            project_path: Path::new(".gpterm").join("config.json"),
        })
    }

    fn load(&self, scope: Scope) -> Result<Config> {
        let config = config::Config::builder()
            .add_source(config::File::from(self.file_path(scope).to_path_buf()).required(false))
            .build()?;

        config.try_deserialize::<Config>().with_context(|| {
            format!(
                "Failed to parse config at {}",
                self.file_path(scope).display()
            )
        })
    }

    fn save(&self, scope: Scope, config: &Config) -> Result<()> {
        let path = self.file_path(scope);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string_pretty(config)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;

        // The file may hold an API key, so owner-only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, scope: Scope, key: SettingKey) -> Result<Option<String>> {
        let config = self.load(scope)?;

        Ok(match key {
            SettingKey::ApiKey => config.api_key,
            SettingKey::BaseUrl => config.base_url,
            SettingKey::Model => config.model,
        })
    }

    fn set_value(&mut self, scope: Scope, key: SettingKey, value: &str) -> Result<()> {
        let mut config = self.load(scope)?;

        match key {
            SettingKey::ApiKey => config.api_key = Some(value.to_string()),
            SettingKey::BaseUrl => config.base_url = Some(value.to_string()),
            SettingKey::Model => config.model = Some(value.to_string()),
        }

        self.save(scope, &config)
    }

    fn unset(&mut self, scope: Scope, key: SettingKey) -> Result<()> {
        let mut config = self.load(scope)?;

        match key {
            SettingKey::ApiKey => config.api_key = None,
            SettingKey::BaseUrl => config.base_url = None,
            SettingKey::Model => config.model = None,
        }

        self.save(scope, &config)
    }

    fn file_path(&self, scope: Scope) -> &Path {
        match scope {
            Scope::User => &self.user_path,
            Scope::Project => &self.project_path,
        }
    }
}

fn user_config_file_path() -> Result<PathBuf> {
    let mut config_path = ProjectDirs::from("dev", "gpterm", "cli")
        .map(|project_dirs| project_dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine home directory"))?;

    config_path.push("config.json");
    Ok(config_path)
}
