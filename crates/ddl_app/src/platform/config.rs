//! Application settings, read from an optional RON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use ddl_core::{Command, KeyBindings, KeyChord, NoticeSettings, DEFAULT_NOTICE_TIMEOUT_MS};
use ddl_engine::HttpSettings;
use engine_logging::LogDestination;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "ddl_harvester.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// RON file holding the persisted queue.
    pub store_path: PathBuf,
    /// `None` keeps notices until they are pushed out by newer ones.
    pub notice_timeout_ms: Option<u64>,
    pub max_visible_notices: usize,
    pub log: LogConfig,
    pub http: HttpConfig,
    pub post_process: bool,
    /// Last-resort clipboard: the text is written here when no clipboard tool works.
    pub clipboard_file: Option<PathBuf>,
    /// Empty means the built-in Ctrl+Alt bindings.
    pub bindings: Vec<BindingConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("ddl_harvester_store.ron"),
            notice_timeout_ms: Some(DEFAULT_NOTICE_TIMEOUT_MS),
            max_visible_notices: NoticeSettings::default().max_visible,
            log: LogConfig::default(),
            http: HttpConfig::default(),
            post_process: true,
            clipboard_file: Some(PathBuf::from("ddl_harvester_clipboard.txt")),
            bindings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogTarget {
    File,
    Terminal,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub target: LogTarget,
    pub file: PathBuf,
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            target: LogTarget::File,
            file: PathBuf::from("ddl_harvester.log"),
            level: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn destination(&self) -> LogDestination {
        match self.target {
            LogTarget::File => LogDestination::File(self.file.clone()),
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::Both => LogDestination::Both(self.file.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let settings = HttpSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.map(|timeout| timeout.as_secs()),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
        }
    }
}

impl HttpConfig {
    pub fn settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: self.request_timeout_secs.map(Duration::from_secs),
            redirect_limit: self.redirect_limit,
            max_bytes: self.max_bytes,
            ..HttpSettings::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    Harvest,
    Copy,
    Clear,
    Preview,
}

impl From<CommandName> for Command {
    fn from(name: CommandName) -> Self {
        match name {
            CommandName::Harvest => Command::Harvest,
            CommandName::Copy => Command::CopyQueue,
            CommandName::Clear => Command::ClearQueue,
            CommandName::Preview => Command::PreviewQueue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Chord text such as `ctrl+alt+h`.
    pub chord: String,
    pub command: CommandName,
}

impl AppConfig {
    /// Reads `explicit`, or `ddl_harvester.ron` in the working directory when it exists.
    ///
    /// A missing explicit file is an error; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::read(path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        ron::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn key_bindings(&self) -> anyhow::Result<KeyBindings> {
        if self.bindings.is_empty() {
            return Ok(KeyBindings::default());
        }
        let entries = self
            .bindings
            .iter()
            .map(|binding| {
                let chord: KeyChord = binding
                    .chord
                    .parse()
                    .with_context(|| format!("invalid key binding `{}`", binding.chord))?;
                Ok((chord, Command::from(binding.command)))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(KeyBindings::new(entries))
    }

    pub fn notice_settings(&self) -> NoticeSettings {
        NoticeSettings {
            timeout_ms: self.notice_timeout_ms,
            max_visible: self.max_visible_notices.max(1),
        }
    }
}
