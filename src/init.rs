use std::env;

use anyhow::{Result, bail};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::util::config::{Scope, SettingKey, SettingsStore};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetupConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

/// First run means no API key anywhere: neither stored in user settings nor
/// exported in the environment. Blank strings count as absent.
pub fn needs_setup(stored_key: Option<&str>, env_key: Option<&str>) -> bool {
    let absent = |key: Option<&str>| key.is_none_or(|key| key.trim().is_empty());

    absent(stored_key) && absent(env_key)
}

pub async fn init<S: SettingsStore>(store: &mut S) -> Result<()> {
    let env_key = env::var(API_KEY_ENV_VAR).ok();
    let stdin = BufReader::new(io::stdin());
    let stdout = io::stdout();

    setup(store, env_key.as_deref(), stdin, stdout).await
}

async fn setup<S, R, W>(store: &mut S, env_key: Option<&str>, mut reader: R, mut writer: W) -> Result<()>
where
    S: SettingsStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let stored_key = store.get(Scope::User, SettingKey::ApiKey)?;

    if !needs_setup(stored_key.as_deref(), env_key) {
        return Ok(());
    }

    let setup_config = prompt_for_config(&mut reader, &mut writer).await?;

    store.set_value(Scope::User, SettingKey::ApiKey, &setup_config.api_key)?;
    store.set_value(Scope::User, SettingKey::BaseUrl, &setup_config.base_url)?;
    store.set_value(Scope::User, SettingKey::Model, &setup_config.model)?;

    let message = format!(
        "\nConfiguration saved to {}\n",
        store.file_path(Scope::User).display()
    );
    writer.write_all(message.as_bytes()).await?;
    writer.flush().await?;

    Ok(())
}

async fn prompt_for_config<R, W>(reader: &mut R, writer: &mut W) -> Result<SetupConfig>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(b"Welcome to gpterm!\n\nLet's set up your OpenAI credentials.\n\n")
        .await?;

    let api_key = ask(reader, writer, "API key: ").await?;
    if api_key.is_empty() {
        bail!("API key is required");
    }

    let base_url = ask(reader, writer, &format!("Base URL [{DEFAULT_BASE_URL}]: ")).await?;
    let base_url = if base_url.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        base_url
    };

    let model = ask(reader, writer, &format!("Model [{DEFAULT_MODEL}]: ")).await?;
    let model = if model.is_empty() {
        DEFAULT_MODEL.to_string()
    } else {
        model
    };

    Ok(SetupConfig {
        api_key,
        base_url,
        model,
    })
}

async fn ask<R, W>(reader: &mut R, writer: &mut W, question: &str) -> Result<String>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(question.as_bytes()).await?;
    writer.flush().await?;

    let mut answer = String::new();
    reader.read_line(&mut answer).await?;

    Ok(answer.trim().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        stored_key: Option<String>,
        writes: Vec<(Scope, SettingKey, String)>,
        path: PathBuf,
    }

    impl SettingsStore for MemoryStore {
        fn get(&self, scope: Scope, key: SettingKey) -> Result<Option<String>> {
            match (scope, key) {
                (Scope::User, SettingKey::ApiKey) => Ok(self.stored_key.clone()),
                _ => Ok(None),
            }
        }

        fn set_value(&mut self, scope: Scope, key: SettingKey, value: &str) -> Result<()> {
            self.writes.push((scope, key, value.to_string()));
            Ok(())
        }

        fn unset(&mut self, _scope: Scope, _key: SettingKey) -> Result<()> {
            Ok(())
        }

        fn file_path(&self, _scope: Scope) -> &Path {
            &self.path
        }
    }

    async fn prompt(input: &str) -> (Result<SetupConfig>, String) {
        let mut reader = BufReader::new(input.as_bytes());
        let mut output = Vec::new();

        let result = prompt_for_config(&mut reader, &mut output).await;
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn needs_setup_only_when_both_keys_are_absent() {
        assert!(needs_setup(None, None));
        assert!(needs_setup(Some(""), None));
        assert!(needs_setup(Some("  "), Some("")));
        assert!(!needs_setup(Some("sk-stored"), None));
        assert!(!needs_setup(None, Some("sk-env")));
        assert!(!needs_setup(Some("sk-stored"), Some("sk-env")));
    }

    #[tokio::test]
    async fn blank_answers_fall_back_to_defaults() {
        let (result, _) = prompt("sk-test\n\n\n").await;

        let setup_config = result.unwrap();
        assert_eq!(setup_config.api_key, "sk-test");
        assert_eq!(setup_config.base_url, DEFAULT_BASE_URL);
        assert_eq!(setup_config.model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn custom_answers_are_kept_verbatim() {
        let (result, output) = prompt("sk-test\nhttps://custom/v1\ncustom-model\n").await;

        let setup_config = result.unwrap();
        assert_eq!(setup_config.api_key, "sk-test");
        assert_eq!(setup_config.base_url, "https://custom/v1");
        assert_eq!(setup_config.model, "custom-model");
        assert!(output.contains("Welcome to gpterm!"));
        assert!(output.contains("API key: "));
    }

    #[tokio::test]
    async fn answers_are_trimmed() {
        let (result, _) = prompt("  sk-test  \n\n\n").await;

        assert_eq!(result.unwrap().api_key, "sk-test");
    }

    #[tokio::test]
    async fn empty_api_key_stops_the_flow() {
        let (result, output) = prompt("\n").await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "API key is required");
        assert!(!output.contains("Base URL"));
        assert!(!output.contains("Model"));
    }

    #[tokio::test]
    async fn closed_stdin_counts_as_an_empty_api_key() {
        let (result, _) = prompt("").await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn setup_skips_when_a_key_is_already_stored() {
        let mut store = MemoryStore {
            stored_key: Some("sk-stored".to_string()),
            ..Default::default()
        };
        let mut output = Vec::new();

        setup(&mut store, None, BufReader::new(&b""[..]), &mut output)
            .await
            .unwrap();

        assert!(store.writes.is_empty());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn setup_skips_when_the_env_key_is_present() {
        let mut store = MemoryStore::default();
        let mut output = Vec::new();

        setup(
            &mut store,
            Some("sk-env"),
            BufReader::new(&b""[..]),
            &mut output,
        )
        .await
        .unwrap();

        assert!(store.writes.is_empty());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn setup_writes_each_field_exactly_once() {
        let mut store = MemoryStore {
            path: PathBuf::from("/home/test/.config/gpterm/config.json"),
            ..Default::default()
        };
        let mut output = Vec::new();

        setup(
            &mut store,
            None,
            BufReader::new(&b"sk-test\n\n\n"[..]),
            &mut output,
        )
        .await
        .unwrap();

        let keys: Vec<SettingKey> = store.writes.iter().map(|(_, key, _)| *key).collect();
        assert_eq!(
            keys,
            vec![SettingKey::ApiKey, SettingKey::BaseUrl, SettingKey::Model]
        );
        assert!(store.writes.iter().all(|(scope, _, _)| *scope == Scope::User));

        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Configuration saved to /home/test/.config/gpterm/config.json"));
    }

    #[tokio::test]
    async fn setup_writes_nothing_on_validation_failure() {
        let mut store = MemoryStore::default();
        let mut output = Vec::new();

        let result = setup(&mut store, None, BufReader::new(&b"\n"[..]), &mut output).await;

        assert!(result.is_err());
        assert!(store.writes.is_empty());
    }
}
