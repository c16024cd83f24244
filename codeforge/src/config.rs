use std::path::PathBuf;

use derive_more::From;
use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use stylus::{Configuration, Mode, PersistMode};
use thiserror::Error;
use web_time::Duration;

pub use lesson::{Catalog, LessonConfig};

pub mod lesson;
pub mod theme;

const DEFAULT_USER: &str = "default_user";

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub theme: theme::Theme,
    pub engine: EngineSettings,
    pub progress: ProgressSettings,
    pub lessons_dir: Option<PathBuf>,
    /// Show instructor comments next to the learner's code
    pub show_annotations: bool,
    /// How strongly the not-yet-typed part of the target is faded, from 0.0 to 1.0
    pub ghost_opacity: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: theme::Theme::default(),
            engine: EngineSettings::default(),
            progress: ProgressSettings::default(),
            lessons_dir: None,
            show_annotations: true,
            ghost_opacity: 0.6,
        }
    }
}

/// How keystrokes reach the editor
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Deserialize,
    Serialize,
    strum::Display,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EditMode {
    /// Type freely, progress is measured
    #[default]
    Lenient,
    /// Only keystrokes that continue the target are accepted
    Strict,
}

impl From<EditMode> for Mode {
    fn from(mode: EditMode) -> Self {
        match mode {
            EditMode::Lenient => Self::Lenient,
            EditMode::Strict => Self::Strict,
        }
    }
}

impl From<Mode> for EditMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Lenient => Self::Lenient,
            Mode::Strict => Self::Strict,
        }
    }
}

/// What gets written to the progress store while typing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveMode {
    /// The learner's code
    #[default]
    Snapshot,
    /// Only the completion flag
    Completion,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    pub mode: EditMode,
    pub error_flash_ms: u64,
    pub save_debounce_ms: u64,
    pub allow_backspace: bool,
    pub persist: SaveMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        let defaults = Configuration::default();
        Self {
            mode: EditMode::default(),
            error_flash_ms: defaults.error_flash.as_millis() as u64,
            save_debounce_ms: defaults.save_debounce.as_millis() as u64,
            allow_backspace: defaults.allow_backspace,
            persist: SaveMode::default(),
        }
    }
}

impl EngineSettings {
    pub fn to_configuration(&self) -> Configuration {
        Configuration {
            error_flash: Duration::from_millis(self.error_flash_ms),
            save_debounce: Duration::from_millis(self.save_debounce_ms),
            allow_backspace: self.allow_backspace,
            persist: match self.persist {
                SaveMode::Snapshot => PersistMode::Snapshot,
                SaveMode::Completion => PersistMode::CompletionFlag,
            },
            ..Configuration::default()
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ProgressSettings {
    /// Where progress records are stored. Defaults to the data directory.
    pub directory: Option<PathBuf>,
    pub user_id: String,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            directory: None,
            user_id: DEFAULT_USER.to_string(),
        }
    }
}

#[derive(Debug, From, Error)]
pub enum ConfigError {
    #[error(
        "Failed to get configuration directory. Please specify the location using the `--config <path>` flag"
    )]
    NoDirectory,

    #[error("Failed to create config directory: {0}")]
    CreateDirectory(std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(Box<figment::Error>),

    #[error("Failed to load lessons: {0}")]
    Lessons(lesson::LessonError),
}

/// Values given on the command line, applied on top of every other layer
#[derive(Debug, Default)]
pub struct Overrides {
    pub config_dir: Option<PathBuf>,
    pub lessons_dir: Option<PathBuf>,
    pub user_id: Option<String>,
    pub mode: Option<EditMode>,
}

#[derive(Debug, Default)]
pub struct Config {
    pub settings: Settings,
    pub catalog: Catalog,
}

impl Config {
    pub fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "CodeForge", "CodeForge")
    }

    pub fn get(overrides: Overrides) -> Result<Self, ConfigError> {
        // Grab default configuration
        let mut settings = Figment::from(Serialized::defaults(Settings::default()));

        // Check for toml file location
        let config_dir = overrides
            .config_dir
            .or_else(|| Self::project_dirs().map(|dirs| dirs.config_dir().to_path_buf()))
            .ok_or(ConfigError::NoDirectory)?;

        // Ensure path exists
        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)?;
        }

        let settings_toml = config_dir.join("settings.toml");

        if settings_toml.exists() {
            settings = settings.merge(Toml::file(settings_toml));
        }

        settings = settings.merge(Env::prefixed("CODEFORGE_").split("__"));

        let mut settings: Settings = settings.extract().map_err(Box::new)?;

        if let Some(mode) = overrides.mode {
            settings.engine.mode = mode;
        }

        if let Some(user_id) = overrides.user_id {
            settings.progress.user_id = user_id;
        }

        if settings.progress.user_id.trim().is_empty() {
            settings.progress.user_id = DEFAULT_USER.to_string();
        }

        let progress_dir = settings.progress.directory.clone().unwrap_or_else(|| {
            Self::project_dirs()
                .map(|dirs| dirs.data_dir().to_path_buf())
                .unwrap_or_else(|| config_dir.clone())
                .join("progress")
        });
        settings.progress.directory = Some(progress_dir);

        let lessons_dir = overrides
            .lessons_dir
            .or_else(|| settings.lessons_dir.clone())
            .unwrap_or_else(|| config_dir.join("lessons"));
        let catalog = lesson::get_lessons(&lessons_dir)?;
        settings.lessons_dir = Some(lessons_dir);

        tracing::info!(lessons = catalog.len(), user = %settings.progress.user_id, "configuration loaded");

        Ok(Self { settings, catalog })
    }

    pub fn progress_dir(&self) -> PathBuf {
        self.settings
            .progress
            .directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("progress"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overrides_for(dir: &std::path::Path) -> Overrides {
        Overrides {
            config_dir: Some(dir.to_path_buf()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_defaults_match_engine_configuration() {
        let settings = Settings::default();
        assert_eq!(settings.engine.to_configuration(), Configuration::default());
        assert_eq!(settings.progress.user_id, "default_user");
        assert!(settings.show_annotations);
    }

    #[test]
    fn test_settings_file_is_merged() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.toml"),
            r#"
show_annotations = false

[engine]
mode = "strict"
error_flash_ms = 250
persist = "completion"

[progress]
user_id = "ada"
"#,
        )
        .unwrap();

        let config = Config::get(overrides_for(dir.path())).unwrap();
        let engine = config.settings.engine.to_configuration();

        assert_eq!(config.settings.engine.mode, EditMode::Strict);
        assert_eq!(engine.error_flash, Duration::from_millis(250));
        assert_eq!(engine.save_debounce, Duration::from_millis(1000));
        assert_eq!(engine.persist, PersistMode::CompletionFlag);
        assert_eq!(config.settings.progress.user_id, "ada");
        assert!(!config.settings.show_annotations);
    }

    #[test]
    fn test_command_line_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("settings.toml"),
            "[engine]\nmode = \"strict\"\n[progress]\nuser_id = \"ada\"\n",
        )
        .unwrap();
        let lessons = dir.path().join("elsewhere");

        let config = Config::get(Overrides {
            lessons_dir: Some(lessons.clone()),
            user_id: Some("grace".to_string()),
            mode: Some(EditMode::Lenient),
            ..overrides_for(dir.path())
        })
        .unwrap();

        assert_eq!(config.settings.engine.mode, EditMode::Lenient);
        assert_eq!(config.settings.progress.user_id, "grace");
        assert_eq!(config.settings.lessons_dir, Some(lessons.clone()));
        assert!(lessons.exists());
    }

    #[test]
    fn test_blank_user_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::get(Overrides {
            user_id: Some("  ".to_string()),
            ..overrides_for(dir.path())
        })
        .unwrap();

        assert_eq!(config.settings.progress.user_id, "default_user");
    }

    #[test]
    fn test_invalid_settings_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("settings.toml"), "[engine]\nmode = \"turbo\"\n").unwrap();

        assert!(matches!(
            Config::get(overrides_for(dir.path())),
            Err(ConfigError::Parse(_))
        ));
    }
}
