use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canvas::{Color, MAX_CANVAS_DIM};
use crate::components::history::MAX_HISTORY;
use crate::components::tools::DEFAULT_BRUSH_SIZE;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Editor defaults, persisted as a plain `key=value` file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Canvas size used at startup and by "reset dimensions".
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub brush_size: f32,
    pub brush_color: Color,
    /// Color of a fresh, cleared or resized canvas; also the eraser color.
    pub background: Color,
    /// Maximum number of undo snapshots.
    pub max_history: usize,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            canvas_width: 800,
            canvas_height: 600,
            brush_size: DEFAULT_BRUSH_SIZE,
            brush_color: Color::BLACK,
            background: Color::WHITE,
            max_history: MAX_HISTORY,
        }
    }
}

impl EditorSettings {
    /// Platform config file location.
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(PathBuf::from(appdata).join("paint-surface").join("settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("paint-surface")
                    .join("settings.cfg"),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(config_dir.join("paint-surface").join("settings.cfg"))
        }
    }

    /// Load from the platform path, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        match Self::load_from(&path) {
            Ok(s) => s,
            Err(SettingsError::Io(_)) => Self::default(),
            Err(e) => {
                log::warn!("ignoring settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_cfg_string())?;
        Ok(())
    }

    pub fn to_cfg_string(&self) -> String {
        format!(
            "canvas_width={}\n\
             canvas_height={}\n\
             brush_size={}\n\
             brush_color={}\n\
             background={}\n\
             max_history={}\n",
            self.canvas_width,
            self.canvas_height,
            self.brush_size,
            self.brush_color,
            self.background,
            self.max_history,
        )
    }

    /// Parse `key=value` lines. Blank lines and `#` comments are skipped,
    /// unknown keys are ignored, bad values are errors.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut s = Self::default();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let err = |message: String| SettingsError::Parse { line: idx + 1, message };
            let Some((key, val)) = line.split_once('=') else {
                return Err(err(format!("expected key=value, got '{}'", line)));
            };
            let key = key.trim();
            let val = val.trim();
            match key {
                "canvas_width" => s.canvas_width = parse_dim(val).map_err(err)?,
                "canvas_height" => s.canvas_height = parse_dim(val).map_err(err)?,
                "brush_size" => {
                    s.brush_size = val
                        .parse::<f32>()
                        .ok()
                        .filter(|v| v.is_finite() && *v > 0.0)
                        .ok_or_else(|| err(format!("invalid brush_size '{}'", val)))?;
                }
                "brush_color" => s.brush_color = val.parse().map_err(|e| err(format!("{}", e)))?,
                "background" => s.background = val.parse().map_err(|e| err(format!("{}", e)))?,
                "max_history" => {
                    s.max_history = val
                        .parse::<usize>()
                        .ok()
                        .filter(|v| *v >= 1)
                        .ok_or_else(|| err(format!("invalid max_history '{}'", val)))?;
                }
                _ => log::debug!("settings: unknown key '{}'", key),
            }
        }
        Ok(s)
    }
}

fn parse_dim(val: &str) -> Result<u32, String> {
    match val.parse::<u32>() {
        Ok(v) if v >= 1 && v <= MAX_CANVAS_DIM => Ok(v),
        _ => Err(format!("invalid dimension '{}'", val)),
    }
}
