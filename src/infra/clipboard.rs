use std::env;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::services::ClipboardService;

/// How long a clipboard tool may take before the copy is abandoned.
const COPY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct ClipboardCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ClipboardCommand {
    fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }
}

/// Pipes text into the first platform clipboard tool found on `PATH`.
pub struct SystemClipboard {
    commands: Vec<ClipboardCommand>,
}

impl SystemClipboard {
    pub fn detect() -> Self {
        let mut commands = Vec::new();
        if cfg!(target_os = "macos") {
            commands.push(ClipboardCommand::new("pbcopy", &[]));
        } else if cfg!(windows) {
            commands.push(ClipboardCommand::new("clip.exe", &[]));
        } else {
            if env::var_os("WAYLAND_DISPLAY").is_some() {
                commands.push(ClipboardCommand::new("wl-copy", &[]));
            }
            commands.push(ClipboardCommand::new("xclip", &["-selection", "clipboard"]));
            commands.push(ClipboardCommand::new("xsel", &["--clipboard", "--input"]));
        }
        Self::with_commands(commands)
    }

    pub fn with_commands(commands: Vec<ClipboardCommand>) -> Self {
        Self { commands }
    }
}

#[async_trait]
impl ClipboardService for SystemClipboard {
    async fn copy(&self, text: &str) -> AppResult<()> {
        let command = self
            .commands
            .iter()
            .find(|command| which::which(&command.program).is_ok())
            .ok_or_else(|| {
                let tried = self
                    .commands
                    .iter()
                    .map(|command| command.program.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                AppError::Clipboard(format!("no clipboard tool found (tried: {tried})"))
            })?;
        debug!(program = %command.program, "copying to clipboard");

        // xclip and friends fork to keep serving the selection, so their
        // output pipes must not be captured or the wait never finishes.
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| AppError::Clipboard(format!("failed to start {}: {err}", command.program)))?;

        let exchange = async {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(text.as_bytes()).await.map_err(|err| {
                    AppError::Clipboard(format!("failed to write to {}: {err}", command.program))
                })?;
            }
            child
                .wait()
                .await
                .map_err(|err| AppError::Clipboard(format!("{} did not finish: {err}", command.program)))
        };

        let status = tokio::time::timeout(COPY_TIMEOUT, exchange)
            .await
            .map_err(|_| {
                AppError::Clipboard(format!(
                    "{} did not finish within {}s",
                    command.program,
                    COPY_TIMEOUT.as_secs()
                ))
            })??;
        if !status.success() {
            return Err(AppError::Clipboard(format!(
                "{} exited with {status}",
                command.program
            )));
        }
        Ok(())
    }
}
