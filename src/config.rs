use crate::autosave::{DEFAULT_DEBOUNCE_MS, DEFAULT_SAVING_VISIBLE_MS};
use crate::clock::Millis;
use crate::session::{PaperStyle, Presentation, DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use crate::timer::DEFAULT_COUNTDOWN_SECS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub countdown_secs: u32,
    pub autosave_debounce_ms: Millis,
    pub saving_visible_ms: Millis,
    pub font_size: String,
    pub font_family: String,
    pub no_delete_mode: bool,
    pub paper_style: PaperStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            countdown_secs: DEFAULT_COUNTDOWN_SECS,
            autosave_debounce_ms: DEFAULT_DEBOUNCE_MS,
            saving_visible_ms: DEFAULT_SAVING_VISIBLE_MS,
            font_size: DEFAULT_FONT_SIZE.to_string(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            no_delete_mode: true,
            paper_style: PaperStyle::default(),
        }
    }
}

impl From<&Config> for Presentation {
    fn from(cfg: &Config) -> Self {
        Self {
            font_size: cfg.font_size.clone(),
            font_family: cfg.font_family.clone(),
            is_no_delete_mode: cfg.no_delete_mode,
            paper_style: cfg.paper_style,
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "flowrite") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("flowrite_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
