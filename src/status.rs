use std::env;

use anyhow::Result;

use crate::init::{API_KEY_ENV_VAR, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::util::config::{Scope, SettingKey, SettingsStore};

pub fn status<S: SettingsStore>(store: &S) -> Result<()> {
    let stored_key = store.get(Scope::User, SettingKey::ApiKey)?;
    let env_key = env::var(API_KEY_ENV_VAR)
        .ok()
        .filter(|key| !key.trim().is_empty());

    match (stored_key, env_key) {
        (Some(key), _) => println!("API key:  {}", mask(&key)),
        (None, Some(_)) => println!("API key:  set via {API_KEY_ENV_VAR}"),
        (None, None) => println!("API key:  not set (run `gpterm init`)"),
    }

    let base_url = store.get(Scope::User, SettingKey::BaseUrl)?;
    let model = store.get(Scope::User, SettingKey::Model)?;
    println!(
        "Base URL: {}",
        base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    );
    println!("Model:    {}", model.as_deref().unwrap_or(DEFAULT_MODEL));
    println!("Settings: {}", store.file_path(Scope::User).display());

    print_project_settings(store)?;

    Ok(())
}

// Display only: project-scope values are shown, not merged into the
// effective configuration above.
fn print_project_settings<S: SettingsStore>(store: &S) -> Result<()> {
    if !store.file_path(Scope::Project).exists() {
        return Ok(());
    }

    let entries = [
        (
            "api_key",
            store
                .get(Scope::Project, SettingKey::ApiKey)?
                .map(|key| mask(&key)),
        ),
        ("base_url", store.get(Scope::Project, SettingKey::BaseUrl)?),
        ("model", store.get(Scope::Project, SettingKey::Model)?),
    ];

    if entries.iter().all(|(_, value)| value.is_none()) {
        return Ok(());
    }

    println!(
        "\nProject settings ({}):",
        store.file_path(Scope::Project).display()
    );

    for (name, value) in entries {
        if let Some(value) = value {
            println!("  {name} = {value}");
        }
    }

    Ok(())
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();

    if chars.len() <= 8 {
        return "****".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}
