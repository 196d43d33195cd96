//! Render configuration.

use serde::{Deserialize, Serialize};

/// Environment variable selecting the render mode.
pub const ENV_MODE: &str = "LESSONMARK_ENV";
/// Environment variable carrying the build commit shown in the footer.
pub const ENV_BUILD_COMMIT: &str = "LESSONMARK_BUILD_COMMIT";
/// Environment variable overriding the highlight theme.
pub const ENV_THEME: &str = "LESSONMARK_THEME";

/// Production renders only compiled content; development compiles on the fly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Compiled tree and highlight map required; nothing is parsed or highlighted.
    #[default]
    Production,
    /// Raw content is preprocessed, parsed, and highlighted at render time.
    Development,
}

impl RenderMode {
    /// Returns true in development mode.
    pub fn is_development(self) -> bool {
        matches!(self, RenderMode::Development)
    }

    /// Parses an environment value; anything unrecognized is production.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => RenderMode::Development,
            _ => RenderMode::Production,
        }
    }
}

/// Configuration passed explicitly into the render pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderConfig {
    /// Render mode.
    #[serde(default)]
    pub mode: RenderMode,
    /// Theme used for live highlighting.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Code languages left as plain text.
    #[serde(default = "default_skip_languages")]
    pub skip_languages: Vec<String>,
    /// Build commit identifier, displayed in the page footer.
    #[serde(default)]
    pub build_commit: Option<String>,
}

fn default_theme() -> String {
    "InspiredGitHub".to_string()
}

fn default_skip_languages() -> Vec<String> {
    ["bash", "sh", "shell", "zsh", "console", "shellsession"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            theme: default_theme(),
            skip_languages: default_skip_languages(),
            build_commit: None,
        }
    }
}

impl RenderConfig {
    /// Default configuration in production mode.
    pub fn production() -> Self {
        Self::default()
    }

    /// Default configuration in development mode.
    pub fn development() -> Self {
        Self {
            mode: RenderMode::Development,
            ..Self::default()
        }
    }

    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from a variable lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(mode) = lookup(ENV_MODE) {
            config.mode = RenderMode::from_env_value(&mode);
        }
        if let Some(theme) = lookup(ENV_THEME).filter(|t| !t.trim().is_empty()) {
            config.theme = theme;
        }
        config.build_commit = lookup(ENV_BUILD_COMMIT).filter(|c| !c.trim().is_empty());
        config
    }

    /// Returns true when code in `lang` is left unhighlighted.
    pub fn is_skipped_language(&self, lang: &str) -> bool {
        self.skip_languages
            .iter()
            .any(|skipped| skipped.eq_ignore_ascii_case(lang))
    }
}
