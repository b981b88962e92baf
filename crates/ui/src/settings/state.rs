use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use gpui::*;
use gpui_component::{Theme, ThemeMode};
use paperbot_client::{BackendConfig, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::{ResultExt, Snafu};

use crate::chat::CHAT_TYPING_INTERVAL;

pub const SETTINGS_DIRECTORY_NAME: &str = "paperbot";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const SETTINGS_ENV_PREFIX: &str = "PAPERBOT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_typing_interval_ms")]
    pub typing_interval_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(
        default = "default_theme_mode",
        serialize_with = "serialize_theme_mode",
        deserialize_with = "deserialize_theme_mode"
    )]
    pub theme_mode: ThemeMode,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            typing_interval_ms: default_typing_interval_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            theme_mode: default_theme_mode(),
        }
    }
}

impl ClientSettings {
    pub fn normalized(mut self) -> Self {
        self.api_base_url = if self.api_base_url.trim().is_empty() {
            default_api_base_url()
        } else {
            self.api_base_url.trim().to_string()
        };
        self.typing_interval_ms = self.typing_interval_ms.max(1);
        self.request_timeout_secs = self.request_timeout_secs.max(1);
        self
    }

    pub fn backend_config(&self) -> BackendConfig {
        BackendConfig::new(&self.api_base_url)
            .with_request_timeout(Duration::from_secs(self.request_timeout_secs))
    }

    pub fn typing_interval(&self) -> Duration {
        Duration::from_millis(self.typing_interval_ms)
    }

    pub fn with_theme_mode(mut self, theme_mode: ThemeMode) -> Self {
        self.theme_mode = theme_mode;
        self
    }

    pub fn apply_theme(&self, window: Option<&mut Window>, cx: &mut App) {
        Theme::change(self.theme_mode, window, cx);
    }
}

pub struct SettingsStore {
    settings: Arc<ArcSwap<ClientSettings>>,
    config_path: PathBuf,
}

impl SettingsStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(SETTINGS_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".paperbot"))
    }

    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join(SETTINGS_FILE_NAME)
    }

    pub fn new(config_path: PathBuf) -> Self {
        let settings = Self::load_from_disk(&config_path);
        Self {
            settings: Arc::new(ArcSwap::from_pointee(settings)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn settings(&self) -> Arc<ClientSettings> {
        self.settings.load_full()
    }

    pub fn update(&self, settings: ClientSettings) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.persist(&normalized_settings)?;
        self.settings.store(Arc::new(normalized_settings));
        Ok(())
    }

    fn load_from_disk(path: &Path) -> ClientSettings {
        if !path.exists() {
            tracing::info!(path = ?path, "settings file not found, using defaults");
        }

        let figment = Figment::from(Serialized::defaults(ClientSettings::default()))
            .merge(Json::file(path))
            .merge(Env::prefixed(SETTINGS_ENV_PREFIX));

        match figment.extract::<ClientSettings>() {
            Ok(settings) => {
                let settings = settings.normalized();
                tracing::info!(
                    api_base_url = %settings.api_base_url,
                    typing_interval_ms = settings.typing_interval_ms,
                    "loaded settings"
                );
                settings
            }
            Err(error) => {
                tracing::warn!(path = ?path, error = %error, "failed to parse settings, using defaults");
                ClientSettings::default()
            }
        }
    }

    fn persist(&self, settings: &ClientSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-settings-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content = serde_json::to_string_pretty(settings).context(SerializeConfigSnafu {
            stage: "serialize-settings-json",
        })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-settings-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-settings-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!(path = ?self.config_path, "saved settings");
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SettingsError {
    #[snafu(display("failed to create settings directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize settings on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write settings file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace settings file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

pub struct SettingsState {
    store: SettingsStore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsChanged {
    pub settings: ClientSettings,
}

impl EventEmitter<SettingsChanged> for SettingsState {}

impl SettingsState {
    pub fn new(cx: &mut App) -> Entity<Self> {
        cx.new(|_| Self {
            store: SettingsStore::load(),
        })
    }

    pub fn settings(&self) -> Arc<ClientSettings> {
        self.store.settings()
    }

    pub fn update_settings(
        &mut self,
        settings: ClientSettings,
        cx: &mut Context<Self>,
    ) -> Result<(), SettingsError> {
        let normalized_settings = settings.normalized();
        self.store.update(normalized_settings.clone())?;
        cx.emit(SettingsChanged {
            settings: normalized_settings,
        });
        cx.notify();
        Ok(())
    }
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_typing_interval_ms() -> u64 {
    CHAT_TYPING_INTERVAL.as_millis() as u64
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

fn default_theme_mode() -> ThemeMode {
    ThemeMode::Dark
}

fn serialize_theme_mode<S>(value: &ThemeMode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(value.name())
}

fn deserialize_theme_mode<'de, D>(deserializer: D) -> Result<ThemeMode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(parse_theme_mode(&value))
}

fn parse_theme_mode(value: &str) -> ThemeMode {
    if value.trim().eq_ignore_ascii_case("light") {
        ThemeMode::Light
    } else {
        ThemeMode::Dark
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[::core::prelude::v1::test]
    fn defaults_match_the_stock_backend() {
        let settings = ClientSettings::default();

        assert_eq!(settings.api_base_url, "http://localhost:8080");
        assert_eq!(settings.typing_interval(), Duration::from_millis(10));
        assert_eq!(settings.backend_config().request_timeout, Duration::from_secs(120));
        assert_eq!(settings.theme_mode, ThemeMode::Dark);
    }

    #[::core::prelude::v1::test]
    fn normalization_restores_blank_url_and_clamps_intervals() {
        let settings = ClientSettings {
            api_base_url: "   ".to_string(),
            typing_interval_ms: 0,
            request_timeout_secs: 0,
            theme_mode: ThemeMode::Light,
        }
        .normalized();

        assert_eq!(settings.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.typing_interval_ms, 1);
        assert_eq!(settings.request_timeout_secs, 1);
        assert_eq!(settings.theme_mode, ThemeMode::Light);
    }

    // Tests that read settings from disk run inside a `Jail` so they never
    // observe `PAPERBOT_*` variables set by another test.
    #[::core::prelude::v1::test]
    fn update_persists_and_reloads() {
        Jail::expect_with(|jail| {
            let path = jail.directory().join("nested").join(SETTINGS_FILE_NAME);
            let store = SettingsStore::new(path.clone());

            store
                .update(ClientSettings {
                    api_base_url: " http://paperbot.internal:9000 ".to_string(),
                    typing_interval_ms: 25,
                    ..ClientSettings::default().with_theme_mode(ThemeMode::Light)
                })
                .unwrap();

            assert!(path.exists());
            assert!(!path.with_extension("json.tmp").exists());
            assert_eq!(store.settings().api_base_url, "http://paperbot.internal:9000");

            let reloaded = SettingsStore::new(path).settings();
            assert_eq!(reloaded.api_base_url, "http://paperbot.internal:9000");
            assert_eq!(reloaded.typing_interval_ms, 25);
            assert_eq!(reloaded.theme_mode, ThemeMode::Light);
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        Jail::expect_with(|jail| {
            jail.create_file(SETTINGS_FILE_NAME, r#"{"api_base_url":"http://10.0.0.5:8080"}"#)?;

            let settings = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME)).settings();

            assert_eq!(settings.api_base_url, "http://10.0.0.5:8080");
            assert_eq!(settings.typing_interval_ms, 10);
            assert_eq!(settings.theme_mode, ThemeMode::Dark);
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn environment_overrides_the_settings_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                SETTINGS_FILE_NAME,
                r#"{"api_base_url":"http://10.0.0.5:8080","typing_interval_ms":30}"#,
            )?;
            jail.set_env("PAPERBOT_API_BASE_URL", "http://paperbot.env:7000");
            jail.set_env("PAPERBOT_TYPING_INTERVAL_MS", 45);

            let settings = SettingsStore::new(jail.directory().join(SETTINGS_FILE_NAME)).settings();

            assert_eq!(settings.api_base_url, "http://paperbot.env:7000");
            assert_eq!(settings.typing_interval_ms, 45);
            assert_eq!(settings.request_timeout_secs, 120);
            Ok(())
        });
    }

    #[::core::prelude::v1::test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        std::fs::write(&path, r#"{"typing_interval_ms":"fast"}"#).unwrap();

        assert_eq!(*SettingsStore::new(path).settings(), ClientSettings::default());
    }
}
