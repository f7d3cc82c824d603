//! The config module resolves API credentials and analyzer settings.
//!
//! Each credential is taken from its environment variable first and falls back
//! to the `[api]` section of an INI config file. The resulting [`AnalyzerConfig`]
//! is built once at startup and only read afterwards.

use ini::{Ini, Properties};
use log::debug;
use std::env::VarError;
use std::fmt;
use std::path::Path;
use url::Url;

use crate::constants::{
    API_KEY_CONFIG_KEY, API_KEY_ENV_NAME, CONFIG_SECTION, DEFAULT_BASE_URL, DEFAULT_MODEL,
    ORG_ID_CONFIG_KEY, ORG_ID_ENV_NAME, PROJECT_ID_CONFIG_KEY, PROJECT_ID_ENV_NAME,
};
use crate::error::{AnalyzeError, Result};

/// API key, organization id and project id used to authenticate requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub organization: String,
    pub project: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("organization", &"<redacted>")
            .field("project", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(
        api_key: impl Into<String>,
        organization: impl Into<String>,
        project: impl Into<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            organization: organization.into(),
            project: project.into(),
        }
    }

    /// Loads credentials from the process environment, falling back to the
    /// config file at `config_path`. A missing file is not an error by itself.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::Configuration`] if:
    /// * The config file exists but cannot be read or parsed
    /// * An environment variable is set but is not valid Unicode
    /// * A credential is absent from both the environment and the file
    pub fn load(config_path: &Path) -> Result<Self> {
        Self::load_with(config_path, process_env)
    }

    fn load_with<F>(config_path: &Path, env: F) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let file = if config_path.is_file() {
            let ini = Ini::load_from_file(config_path).map_err(|err| {
                AnalyzeError::Configuration(format!(
                    "Failed to read config file {}: {err}",
                    config_path.display()
                ))
            })?;
            Some(ini)
        } else {
            debug!("Config file {} not found", config_path.display());
            None
        };

        Self::resolve(env, file.as_ref())
    }

    /// Resolves credentials from an environment lookup shaped like
    /// [`std::env::var`] and an optional parsed config file. Empty values count
    /// as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::Configuration`] naming the first credential
    /// that neither source provides, or whose variable is not valid Unicode.
    pub fn resolve<F>(env: F, file: Option<&Ini>) -> Result<Self>
    where
        F: Fn(&str) -> std::result::Result<String, VarError>,
    {
        let section = file.and_then(|ini| ini.section(Some(CONFIG_SECTION)));

        Ok(Self {
            api_key: resolve_one(&env, section, API_KEY_ENV_NAME, API_KEY_CONFIG_KEY)?,
            organization: resolve_one(&env, section, ORG_ID_ENV_NAME, ORG_ID_CONFIG_KEY)?,
            project: resolve_one(&env, section, PROJECT_ID_ENV_NAME, PROJECT_ID_CONFIG_KEY)?,
        })
    }

    /// # Errors
    ///
    /// Returns [`AnalyzeError::Configuration`] if any credential is blank.
    pub(crate) fn validate(&self) -> Result<()> {
        for (value, env_name) in [
            (&self.api_key, API_KEY_ENV_NAME),
            (&self.organization, ORG_ID_ENV_NAME),
            (&self.project, PROJECT_ID_ENV_NAME),
        ] {
            if value.trim().is_empty() {
                return Err(AnalyzeError::Configuration(format!(
                    "{env_name} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

fn process_env(name: &str) -> std::result::Result<String, VarError> {
    std::env::var(name)
}

fn resolve_one<F>(
    env: &F,
    section: Option<&Properties>,
    env_name: &str,
    config_key: &str,
) -> Result<String>
where
    F: Fn(&str) -> std::result::Result<String, VarError>,
{
    match env(env_name) {
        Ok(value) if !value.trim().is_empty() => {
            debug!("{env_name} taken from environment");
            return Ok(value);
        }
        Ok(_) | Err(VarError::NotPresent) => {}
        Err(VarError::NotUnicode(_)) => {
            return Err(AnalyzeError::Configuration(format!(
                "{env_name} is set but is not valid Unicode"
            )));
        }
    }

    section
        .and_then(|properties| properties.get(config_key))
        .filter(|value| !value.trim().is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            AnalyzeError::Configuration(format!(
                "{env_name} is not set and [{CONFIG_SECTION}] {config_key} is missing from the config file"
            ))
        })
}

/// Settings for an [`crate::ArticleAnalyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub credentials: Credentials,
    /// Chat model identifier
    pub model: String,
    /// Base URL of an OpenAI-compatible API, e.g. `https://api.openai.com/v1/`
    pub base_url: String,
    /// Prompt template overriding the built-in one, `{text}` marks the article
    pub prompt_template: Option<String>,
}

impl AnalyzerConfig {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            prompt_template: None,
        }
    }

    /// Loads credentials via [`Credentials::load`] and uses default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be resolved.
    pub fn load(config_path: &Path) -> Result<Self> {
        Ok(Self::new(Credentials::load(config_path)?))
    }

    #[must_use]
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.to_string();
        self
    }

    #[must_use]
    pub fn with_prompt_template(mut self, prompt_template: Option<String>) -> Self {
        self.prompt_template = prompt_template;
        self
    }

    /// Returns the chat completions endpoint under the base URL.
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzeError::Configuration`] if the base URL is invalid.
    pub fn endpoint(&self) -> Result<Url> {
        let invalid = |err: url::ParseError| {
            AnalyzeError::Configuration(format!("Invalid base URL {}: {err}", self.base_url))
        };

        let mut base = Url::parse(&self.base_url).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join("chat/completions").map_err(invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    type EnvResult = std::result::Result<String, VarError>;

    fn no_env(_: &str) -> EnvResult {
        Err(VarError::NotPresent)
    }

    fn full_env(name: &str) -> EnvResult {
        match name {
            API_KEY_ENV_NAME => Ok("env-key".to_owned()),
            ORG_ID_ENV_NAME => Ok("env-org".to_owned()),
            PROJECT_ID_ENV_NAME => Ok("env-project".to_owned()),
            _ => Err(VarError::NotPresent),
        }
    }

    fn only(expected: &'static str, value: &'static str) -> impl Fn(&str) -> EnvResult {
        move |name| {
            if name == expected {
                Ok(value.to_owned())
            } else {
                Err(VarError::NotPresent)
            }
        }
    }

    fn config_file() -> Ini {
        Ini::load_from_str(
            "[api]\nAPI_KEY = file-key\nORG_KEY = file-org\nPROJECT_KEY = file-project\n",
        )
        .expect("valid ini")
    }

    #[test]
    fn environment_wins_over_file() {
        let credentials = Credentials::resolve(full_env, Some(&config_file())).expect("resolved");
        assert_eq!(credentials, Credentials::new("env-key", "env-org", "env-project"));
    }

    #[test]
    fn file_fills_each_missing_variable() {
        let env = only(ORG_ID_ENV_NAME, "env-org");
        let credentials = Credentials::resolve(env, Some(&config_file())).expect("resolved");
        assert_eq!(credentials, Credentials::new("file-key", "env-org", "file-project"));
    }

    #[test]
    fn empty_variable_counts_as_absent() {
        let env = only(API_KEY_ENV_NAME, "");
        let credentials = Credentials::resolve(env, Some(&config_file())).expect("resolved");
        assert_eq!(credentials.api_key, "file-key");
    }

    #[test]
    fn missing_everywhere_is_configuration_error() {
        let result = Credentials::resolve(no_env, None);
        assert!(matches!(
            result,
            Err(AnalyzeError::Configuration(message)) if message.contains(API_KEY_ENV_NAME)
        ));
    }

    #[test]
    fn non_unicode_variable_does_not_fall_back_to_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[api]\nAPI_KEY=file-key\nORG_KEY=b\nPROJECT_KEY=c\n")
            .expect("written");

        let env = |name: &str| -> EnvResult {
            if name == API_KEY_ENV_NAME {
                Err(VarError::NotUnicode(OsString::from("sk\u{fffd}")))
            } else {
                Err(VarError::NotPresent)
            }
        };
        let result = Credentials::load_with(&path, env);
        assert!(matches!(
            result,
            Err(AnalyzeError::Configuration(message))
                if message == format!("{API_KEY_ENV_NAME} is set but is not valid Unicode")
        ));
    }

    #[test]
    fn missing_config_file_without_environment_is_configuration_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.ini");

        let result = Credentials::load_with(&path, no_env);
        assert!(matches!(
            result,
            Err(AnalyzeError::Configuration(message)) if message.contains(API_KEY_ENV_NAME)
        ));
    }

    #[test]
    fn missing_config_file_with_environment_resolves() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.ini");

        let credentials = Credentials::load_with(&path, full_env).expect("resolved");
        assert_eq!(credentials, Credentials::new("env-key", "env-org", "env-project"));
    }

    #[test]
    fn file_without_api_section_is_configuration_error() {
        let ini = Ini::load_from_str("[other]\nAPI_KEY = file-key\n").expect("valid ini");
        let result = Credentials::resolve(no_env, Some(&ini));
        assert!(matches!(result, Err(AnalyzeError::Configuration(_))));
    }

    #[test]
    fn config_file_on_disk_resolves() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[api]\nAPI_KEY=a\nORG_KEY=b\nPROJECT_KEY=c\n").expect("written");

        let ini = Ini::load_from_file(&path).expect("loaded");
        let credentials = Credentials::resolve(no_env, Some(&ini)).expect("resolved");
        assert_eq!(credentials, Credentials::new("a", "b", "c"));
    }

    #[test]
    fn unparsable_config_file_is_configuration_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("config.ini");
        std::fs::write(&path, "[api\nAPI_KEY=a\n").expect("written");

        let result = Credentials::load_with(&path, no_env);
        assert!(matches!(
            result,
            Err(AnalyzeError::Configuration(message)) if message.contains("config.ini")
        ));
    }

    #[test]
    fn debug_redacts_secrets() {
        let rendered = format!("{:?}", Credentials::new("sk-secret", "org-1", "proj-1"));
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("org-1"));
        assert!(!rendered.contains("proj-1"));
    }

    #[test]
    fn blank_credential_fails_validation() {
        let result = Credentials::new("key", " ", "project").validate();
        assert!(matches!(
            result,
            Err(AnalyzeError::Configuration(message)) if message.contains(ORG_ID_ENV_NAME)
        ));
    }

    #[test]
    fn endpoint_appends_chat_completions() {
        let config = AnalyzerConfig::new(Credentials::new("k", "o", "p"));
        assert_eq!(
            config.endpoint().expect("valid").as_str(),
            "https://api.openai.com/v1/chat/completions"
        );

        let config = config.with_base_url("http://127.0.0.1:8080/v1");
        assert_eq!(
            config.endpoint().expect("valid").as_str(),
            "http://127.0.0.1:8080/v1/chat/completions"
        );
    }

    #[test]
    fn invalid_base_url_is_configuration_error() {
        let config =
            AnalyzerConfig::new(Credentials::new("k", "o", "p")).with_base_url("not a url");
        assert!(matches!(config.endpoint(), Err(AnalyzeError::Configuration(_))));
    }
}
