use crate::clock::{DEFAULT_DAILY_START_MINUTES, MINUTES_PER_DAY, parse_clock_time};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "FOCUS_CONFIG_PATH";
pub(crate) const APP_DIR_NAME: &str = "live_focus";

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

const RESET: &str = "\x1b[0m";

/// Themes with colour, keyed by canonical name: (name, accent, muted).
const THEMES: &[(&str, &str, &str)] = &[
    ("noir", "\x1b[38;5;208m", "\x1b[38;5;250m"),
    ("solarized", "\x1b[38;5;108m", "\x1b[38;5;250m"),
];

/// Unknown or missing themes get the plain palette.
pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    let name = theme.and_then(canonical_theme_name);
    THEMES
        .iter()
        .find(|(theme_name, _, _)| name.as_deref() == Some(*theme_name))
        .map_or(
            Palette {
                accent: "",
                muted: "",
                reset: "",
            },
            |&(_, accent, muted)| Palette {
                accent,
                muted,
                reset: RESET,
            },
        )
}

/// Lowercases `raw` and folds every run of non-alphanumerics into one `_`,
/// so `Daily-Start`, `daily start` and `daily_start` compare equal.
/// Returns `None` when nothing alphanumeric is left.
pub fn snake_key(raw: &str) -> Option<String> {
    let words: Vec<String> = raw
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    (!words.is_empty()).then(|| words.join("_"))
}

pub fn canonical_theme_name(raw: &str) -> Option<String> {
    let key = snake_key(raw).unwrap_or_default();
    let name = match key.as_str() {
        "" | "vanilla" | "light" => "default",
        "dark" | "dark_mode" | "darkmode" => "noir",
        other => other,
    };
    Some(name.to_string())
}

/// `daily_start` accepts either a minute of the day or an `HH:MM` string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DailyStart {
    Minutes(i64),
    Clock(String),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daily_start: Option<DailyStart>,
    #[serde(default)]
    pub theme: Option<String>,
}

impl Config {
    /// Always within [0, 1439].
    pub fn daily_start_minutes(&self) -> i32 {
        match &self.daily_start {
            Some(DailyStart::Minutes(minutes)) => clamp_daily_start(*minutes),
            Some(DailyStart::Clock(value)) => {
                parse_clock_time(value).unwrap_or(DEFAULT_DAILY_START_MINUTES)
            }
            None => DEFAULT_DAILY_START_MINUTES,
        }
    }
}

pub fn clamp_daily_start(raw: i64) -> i32 {
    // Clamped first, so the cast is lossless.
    raw.clamp(0, i64::from(MINUTES_PER_DAY - 1)) as i32
}

/// Accepts `HH:MM` or a plain minute count.
pub fn parse_daily_start(raw: &str) -> Result<i32, AppError> {
    let trimmed = raw.trim();
    if trimmed.contains(':') {
        return parse_clock_time(trimmed);
    }

    trimmed
        .parse::<i64>()
        .map(clamp_daily_start)
        .map_err(|_| {
            AppError::invalid_input(format!("daily start must be HH:MM or minutes: {trimmed}"))
        })
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<String>,
    pub daily_start: Option<i32>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    Ok(app_dir()?.join(CONFIG_FILE_NAME))
}

pub(crate) fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

/// Never fails: any problem yields the defaults, with the error attached.
pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let config = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;
    normalize_config(config)
}

fn normalize_config(mut config: Config) -> Result<Config, AppError> {
    config.theme = config.theme.and_then(|name| canonical_theme_name(&name));
    config.daily_start = match config.daily_start {
        Some(DailyStart::Minutes(minutes)) => {
            Some(DailyStart::Minutes(i64::from(clamp_daily_start(minutes))))
        }
        Some(DailyStart::Clock(value)) => {
            let minutes = parse_clock_time(&value)
                .map_err(|err| AppError::invalid_data(format!("daily_start: {}", err.message())))?;
            Some(DailyStart::Minutes(i64::from(minutes)))
        }
        None => None,
    };
    Ok(config)
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    let mut merged = base.clone();
    if let Some(theme) = overrides.theme.as_ref()
        && let Some(normalized) = canonical_theme_name(theme)
    {
        merged.theme = Some(normalized);
    }

    if let Some(daily_start) = overrides.daily_start {
        merged.daily_start = Some(DailyStart::Minutes(i64::from(clamp_daily_start(
            i64::from(daily_start),
        ))));
    }

    merged
}
