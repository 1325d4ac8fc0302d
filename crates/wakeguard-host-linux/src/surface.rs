//! Desktop status surface
//!
//! Tray rendering lives outside this process, so the tray is a console one:
//! presence is announced on stderr and lines typed on a terminal stdin act as
//! tray interactions. Prompts and messages use zenity when a desktop session
//! has it, and the console otherwise.

use async_trait::async_trait;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use wakeguard_api::{StatusMessage, TrayPresence};
use wakeguard_host_api::{
    HostError, HostResult, MessageLevel, PromptOutcome, StatusSurface, TrayEvent,
};

type PendingAnswer = Arc<Mutex<Option<oneshot::Sender<PromptOutcome>>>>;

/// What a console line means outside of a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Tray(TrayEvent),
    Help,
}

impl ConsoleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "" | "s" | "status" => ConsoleCommand::Tray(TrayEvent::PrimaryClick),
            "q" | "quit" | "exit" => ConsoleCommand::Tray(TrayEvent::MenuExit),
            _ => ConsoleCommand::Help,
        }
    }
}

/// Answer typed at a console prompt
pub fn parse_console_answer(line: &str) -> PromptOutcome {
    match line.trim().to_lowercase().as_str() {
        "ok" | "y" | "yes" => PromptOutcome::Confirmed,
        _ => PromptOutcome::Dismissed,
    }
}

/// How dialogs are shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogBackend {
    Zenity(PathBuf),
    Console,
}

impl DialogBackend {
    /// zenity if a graphical session is present and it is on PATH
    pub fn detect() -> Self {
        let graphical = ["DISPLAY", "WAYLAND_DISPLAY"]
            .iter()
            .any(|var| std::env::var_os(var).is_some_and(|v| !v.is_empty()));
        if !graphical {
            return DialogBackend::Console;
        }

        find_on_path("zenity")
            .map(DialogBackend::Zenity)
            .unwrap_or(DialogBackend::Console)
    }
}

fn find_on_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file())
}

/// Console tray plus desktop dialogs
pub struct DesktopSurface {
    dialogs: DialogBackend,
    tray: Mutex<Option<TrayPresence>>,
    event_tx: mpsc::UnboundedSender<TrayEvent>,
    event_rx: Mutex<Option<mpsc::UnboundedReceiver<TrayEvent>>>,
    pending_answer: PendingAnswer,
    console_attached: AtomicBool,
}

impl DesktopSurface {
    pub fn new(dialogs: DialogBackend) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            dialogs,
            tray: Mutex::new(None),
            event_tx: tx,
            event_rx: Mutex::new(Some(rx)),
            pending_answer: Arc::new(Mutex::new(None)),
            console_attached: AtomicBool::new(false),
        }
    }

    pub fn detect() -> Self {
        Self::new(DialogBackend::detect())
    }

    pub fn has_dialogs(&self) -> bool {
        matches!(self.dialogs, DialogBackend::Zenity(_))
    }

    /// Start reading tray commands from stdin if it is a terminal
    fn attach_console(&self) {
        if !std::io::stdin().is_terminal() {
            debug!("stdin is not a terminal, console tray is display-only");
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime for the console tray reader");
            return;
        };

        let event_tx = self.event_tx.clone();
        let pending_answer = self.pending_answer.clone();
        self.console_attached.store(true, Ordering::SeqCst);

        handle.spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("Console closed");
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Console read failed");
                        break;
                    }
                };

                let waiting = pending_answer
                    .lock()
                    .ok()
                    .and_then(|mut pending| pending.take());
                if let Some(answer) = waiting {
                    let _ = answer.send(parse_console_answer(&line));
                    continue;
                }

                match ConsoleCommand::parse(&line) {
                    ConsoleCommand::Tray(event) => {
                        if event_tx.send(event).is_err() {
                            break;
                        }
                    }
                    ConsoleCommand::Help => {
                        eprintln!("[wakeguard] Enter: show status, 'exit': stop and quit");
                    }
                }
            }
        });
    }

    async fn console_prompt(&self, message: &StatusMessage) -> HostResult<PromptOutcome> {
        if !self.console_attached.load(Ordering::SeqCst) {
            return Err(HostError::Unavailable("no console to answer a prompt".into()));
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self
                .pending_answer
                .lock()
                .map_err(|_| HostError::Internal("prompt lock poisoned".into()))?;
            *pending = Some(tx);
        }

        eprintln!();
        eprintln!("== {} ==", message.title);
        eprintln!("{}", message.body);
        eprintln!(
            "Type 'ok' for {}, anything else for {}:",
            message.confirm_label, message.dismiss_label
        );

        Ok(rx.await.unwrap_or(PromptOutcome::Dismissed))
    }

    async fn zenity(&self, program: &Path, args: &[&str]) -> HostResult<bool> {
        let status = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .status()
            .await?;
        Ok(status.success())
    }
}

#[async_trait]
impl StatusSurface for DesktopSurface {
    fn show_tray(&self, presence: &TrayPresence) {
        if let Ok(mut tray) = self.tray.lock() {
            *tray = Some(presence.clone());
        }
        let items: Vec<&str> = presence.menu.iter().map(|i| i.label.as_str()).collect();
        eprintln!("[wakeguard] {} (menu: {})", presence.tooltip, items.join(", "));
        if self.console_attached.load(Ordering::SeqCst) {
            eprintln!("[wakeguard] Enter: show status, 'exit': stop and quit");
        }
    }

    fn hide_tray(&self) {
        let shown = self
            .tray
            .lock()
            .ok()
            .and_then(|mut tray| tray.take())
            .is_some();
        if shown {
            eprintln!("[wakeguard] Stopped");
        }
    }

    fn subscribe(&self) -> HostResult<mpsc::UnboundedReceiver<TrayEvent>> {
        let rx = self
            .event_rx
            .lock()
            .map_err(|_| HostError::Internal("tray lock poisoned".into()))?
            .take()
            .ok_or_else(|| HostError::Internal("tray already has a subscriber".into()))?;
        self.attach_console();
        Ok(rx)
    }

    async fn prompt(&self, message: &StatusMessage) -> HostResult<PromptOutcome> {
        if let DialogBackend::Zenity(program) = &self.dialogs {
            let ok_label = format!("--ok-label={}", message.confirm_label);
            let cancel_label = format!("--cancel-label={}", message.dismiss_label);
            let args = [
                "--question",
                "--title",
                message.title.as_str(),
                "--text",
                message.body.as_str(),
                ok_label.as_str(),
                cancel_label.as_str(),
            ];
            match self.zenity(program, &args).await {
                Ok(true) => return Ok(PromptOutcome::Confirmed),
                Ok(false) => return Ok(PromptOutcome::Dismissed),
                Err(e) => warn!(error = %e, "zenity failed, falling back to console"),
            }
        }

        self.console_prompt(message).await
    }

    async fn message(&self, level: MessageLevel, title: &str, body: &str) {
        if let DialogBackend::Zenity(program) = &self.dialogs {
            let kind = match level {
                MessageLevel::Info => "--info",
                MessageLevel::Error => "--error",
            };
            match self
                .zenity(program, &[kind, "--title", title, "--text", body])
                .await
            {
                Ok(_) => return,
                Err(e) => warn!(error = %e, "zenity failed, falling back to console"),
            }
        }

        match level {
            MessageLevel::Info => info!(title, "{}", body),
            MessageLevel::Error => warn!(title, "{}", body),
        }
        eprintln!("{}: {}", title, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> StatusMessage {
        StatusMessage {
            title: "wakeguard".into(),
            body: "body".into(),
            confirm_label: "OK".into(),
            dismiss_label: "Cancel".into(),
        }
    }

    #[test]
    fn console_commands() {
        assert_eq!(
            ConsoleCommand::parse(""),
            ConsoleCommand::Tray(TrayEvent::PrimaryClick)
        );
        assert_eq!(
            ConsoleCommand::parse(" Status "),
            ConsoleCommand::Tray(TrayEvent::PrimaryClick)
        );
        assert_eq!(
            ConsoleCommand::parse("EXIT"),
            ConsoleCommand::Tray(TrayEvent::MenuExit)
        );
        assert_eq!(ConsoleCommand::parse("what"), ConsoleCommand::Help);
    }

    #[test]
    fn console_answers() {
        assert_eq!(parse_console_answer("ok"), PromptOutcome::Confirmed);
        assert_eq!(parse_console_answer("Y"), PromptOutcome::Confirmed);
        assert_eq!(parse_console_answer(""), PromptOutcome::Dismissed);
        assert_eq!(parse_console_answer("no"), PromptOutcome::Dismissed);
    }

    #[test]
    fn subscribe_once() {
        let surface = DesktopSurface::new(DialogBackend::Console);
        assert!(surface.subscribe().is_ok());
        assert!(surface.subscribe().is_err());
    }

    #[tokio::test]
    async fn console_prompt_without_terminal_is_unavailable() {
        let surface = DesktopSurface::new(DialogBackend::Console);
        assert!(matches!(
            surface.prompt(&message()).await,
            Err(HostError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn missing_zenity_falls_back_to_console() {
        let surface =
            DesktopSurface::new(DialogBackend::Zenity(PathBuf::from("/nonexistent/zenity")));
        assert!(surface.has_dialogs());
        assert!(surface.prompt(&message()).await.is_err());
    }

    #[test]
    fn tray_show_and_hide() {
        let surface = DesktopSurface::new(DialogBackend::Console);
        let presence = TrayPresence {
            visible: true,
            tooltip: "Suppressing".into(),
            menu: Vec::new(),
        };
        surface.show_tray(&presence);
        assert!(surface.tray.lock().unwrap().is_some());
        surface.hide_tray();
        assert!(surface.tray.lock().unwrap().is_none());
    }
}
