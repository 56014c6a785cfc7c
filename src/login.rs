use anyhow::{Result, bail};

use crate::util::config::{Scope, SettingKey, SettingsStore};

pub fn login<S: SettingsStore>(store: &mut S, api_key: String, project: bool) -> Result<()> {
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key is required");
    }

    let scope = if project { Scope::Project } else { Scope::User };
    store.set_value(scope, SettingKey::ApiKey, api_key)?;

    println!("API key saved to {}", store.file_path(scope).display());
    Ok(())
}
