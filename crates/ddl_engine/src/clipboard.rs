//! Clipboard writers: platform clipboard tools with a file fallback.

use std::path::PathBuf;
use std::process::Stdio;

use engine_logging::{engine_debug, engine_warn};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("failed to start {program}: {message}")]
    Spawn { program: String, message: String },
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
    #[error("failed to write clipboard file: {0}")]
    File(#[from] PersistError),
    #[error("no clipboard method succeeded ({})", .attempts.join("; "))]
    AllFailed { attempts: Vec<String> },
}

#[async_trait::async_trait]
pub trait ClipboardWriter: Send + Sync {
    fn name(&self) -> String;
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Pipes the text into an external clipboard program's stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandClipboard {
    program: String,
    args: Vec<String>,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    /// Known clipboard tools for the current platform, in preference order.
    pub fn platform_defaults() -> Vec<Self> {
        if cfg!(target_os = "macos") {
            vec![Self::new("pbcopy", &[])]
        } else if cfg!(target_os = "windows") {
            vec![Self::new("clip", &[])]
        } else {
            vec![
                Self::new("wl-copy", &[]),
                Self::new("xclip", &["-selection", "clipboard"]),
                Self::new("xsel", &["--clipboard", "--input"]),
            ]
        }
    }
}

#[async_trait::async_trait]
impl ClipboardWriter for CommandClipboard {
    fn name(&self) -> String {
        self.program.clone()
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let spawn_error = |err: std::io::Error| ClipboardError::Spawn {
            program: self.program.clone(),
            message: err.to_string(),
        };
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(spawn_error)?;
            // Dropping stdin closes the pipe so the tool sees EOF.
        }
        let status = child.wait().await.map_err(spawn_error)?;
        if status.success() {
            Ok(())
        } else {
            Err(ClipboardError::Exit {
                program: self.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Writes the text to a file for manual copying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileClipboard {
    path: PathBuf,
}

impl FileClipboard {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl ClipboardWriter for FileClipboard {
    fn name(&self) -> String {
        format!("file {}", self.path.display())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        AtomicFileWriter::new(&self.path)?.write(text)?;
        Ok(())
    }
}

/// Tries each writer in order until one succeeds.
pub struct FallbackClipboard {
    writers: Vec<Box<dyn ClipboardWriter>>,
}

impl FallbackClipboard {
    pub fn new(writers: Vec<Box<dyn ClipboardWriter>>) -> Self {
        Self { writers }
    }

    /// Platform tools first, then `fallback_file` when given.
    pub fn platform(fallback_file: Option<PathBuf>) -> Self {
        let mut writers: Vec<Box<dyn ClipboardWriter>> = CommandClipboard::platform_defaults()
            .into_iter()
            .map(|writer| Box::new(writer) as Box<dyn ClipboardWriter>)
            .collect();
        if let Some(path) = fallback_file {
            writers.push(Box::new(FileClipboard::new(path)));
        }
        Self::new(writers)
    }
}

#[async_trait::async_trait]
impl ClipboardWriter for FallbackClipboard {
    fn name(&self) -> String {
        let names: Vec<String> = self.writers.iter().map(|writer| writer.name()).collect();
        format!("fallback [{}]", names.join(", "))
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        let mut attempts = Vec::with_capacity(self.writers.len());
        for writer in &self.writers {
            match writer.write_text(text).await {
                Ok(()) => {
                    engine_debug!("Clipboard written via {}", writer.name());
                    return Ok(());
                }
                Err(err) => {
                    engine_warn!("Clipboard method {} failed: {}", writer.name(), err);
                    attempts.push(err.to_string());
                }
            }
        }
        Err(ClipboardError::AllFailed { attempts })
    }
}
