use anyhow::Result;
use inquire::Confirm;

use crate::util::config::{Scope, SettingKey, SettingsStore};

pub async fn logout<S: SettingsStore>(store: &mut S) -> Result<()> {
    if store.get(Scope::User, SettingKey::ApiKey)?.is_none() {
        println!("You are not logged in");
        return Ok(());
    }

    let confirmed = Confirm::new("Remove the stored API key?")
        .with_default(false)
        .prompt()?;

    if !confirmed {
        println!("Log out cancelled");
        return Ok(());
    }

    store.unset(Scope::User, SettingKey::ApiKey)?;

    println!("Successfully logged out");
    Ok(())
}
