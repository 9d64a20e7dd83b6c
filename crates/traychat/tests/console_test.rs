//! Console front-end driving a session against the loopback service.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use traychat::console::{self, ConsoleShell, ConsoleSurfaces, Printer};
use traychat_auth::Prompter;
use traychat_loopback::{Account, Directory, LoopbackAuthenticator, LoopbackBackend, LoopbackHub};
use traychat_session::{
    Collaborators, SessionConfig, SessionController, SessionStatus, SettingsStore,
};

struct App {
    controller: SessionController,
    input: DuplexStream,
    printer: Printer,
    _dir: TempDir,
}

impl App {
    fn start() -> Self {
        let dir = TempDir::new().unwrap();
        let hub = LoopbackHub::new(Directory::demo());
        let printer = Printer::capture();
        let (prompter, requests) = Prompter::channel();

        let controller = SessionController::new(
            SessionConfig::new()
                .with_cookie_path(dir.path().join("cookies.json"))
                .with_languages_dir(dir.path().join("languages"))
                .with_shutdown_grace(Duration::from_millis(200)),
            Collaborators {
                backend: Arc::new(LoopbackBackend::new(hub.clone())),
                authenticator: Arc::new(LoopbackAuthenticator::new(
                    hub.clone(),
                    Account::new("me@example.com", "secret"),
                )),
                shell: Box::new(ConsoleShell::new(printer.clone())),
                surfaces: Box::new(ConsoleSurfaces::new(printer.clone())),
                prompter: Arc::new(prompter),
            },
            SettingsStore::new(dir.path().join("settings.json")),
        );

        let (input, console_side) = tokio::io::duplex(4096);
        tokio::spawn(console::run(
            BufReader::new(console_side),
            controller.handle(),
            requests,
            hub,
            printer.clone(),
        ));

        Self {
            controller,
            input,
            printer,
            _dir: dir,
        }
    }

    async fn type_line(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
        self.settle().await;
    }

    async fn settle(&mut self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
            self.controller.process_pending().unwrap();
        }
    }

    fn printed(&self, needle: &str) -> bool {
        self.printer.lines().iter().any(|line| line.contains(needle))
    }
}

#[tokio::test]
async fn test_console_session() {
    let mut app = App::start();

    app.type_line("connect").await;
    assert!(app.printed("[TrayChat - Email] Email:"));
    app.type_line("me@example.com").await;
    app.type_line("secret").await;
    assert_eq!(app.controller.status(), SessionStatus::Connected);
    assert!(app.printed("[tray *] Connect: off | Disconnect: on"));
    assert!(app.printed("[conversations]"));

    app.type_line("say team alice hello").await;
    assert!(app.printed("[tab +] Team"));
    assert!(app.printed("[tab >] Team"));

    app.type_line("quit").await;
    assert!(app.printed("[TrayChat - Quit]"));
    app.type_line("y").await;
    assert!(app.controller.is_shutting_down());
    assert_eq!(app.controller.status(), SessionStatus::Disconnected);
}

#[tokio::test]
async fn test_empty_answer_cancels_login() {
    let mut app = App::start();

    app.type_line("connect").await;
    app.type_line("").await;

    assert_eq!(app.controller.status(), SessionStatus::Disconnected);
    assert!(!app.controller.is_login_pending());
    assert!(!app.printed("Login failed!"));
}

#[tokio::test]
async fn test_unknown_command_is_reported() {
    let mut app = App::start();

    app.type_line("frobnicate").await;

    assert!(app.printed("unknown command: frobnicate"));
    assert_eq!(app.controller.status(), SessionStatus::Disconnected);
}

#[tokio::test]
async fn test_end_of_input_terminates() {
    let mut app = App::start();
    app.type_line("connect").await;
    app.type_line("me@example.com").await;
    app.type_line("secret").await;
    assert_eq!(app.controller.status(), SessionStatus::Connected);

    app.input.shutdown().await.unwrap();
    app.settle().await;

    assert!(app.controller.is_shutting_down());
}
