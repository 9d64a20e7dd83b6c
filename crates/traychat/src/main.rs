//! TrayChat entry point.

use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::info;

use traychat::cli::Cli;
use traychat::console::{self, ConsoleShell, ConsoleSurfaces, Printer};
use traychat::paths::{self, Paths};
use traychat::{logging, signals};
use traychat_auth::Prompter;
use traychat_loopback::{Account, Directory, LoopbackAuthenticator, LoopbackBackend, LoopbackHub};
use traychat_session::{Collaborators, SessionConfig, SessionController, SettingsStore};

fn main() {
    // Before parsing: the .env may provide values for env-backed flags.
    let env_file = paths::load_env_file();

    let cli = Cli::parse();
    let paths = cli.paths();

    if let Err(e) = paths.ensure_dirs() {
        eprintln!("Failed to create directory: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&cli, &paths, env_file) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli, paths: &Paths, env_file: Option<std::path::PathBuf>) -> Result<(), Box<dyn Error>> {
    logging::init(&paths.log_file, cli.log_directives())?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        log = %paths.log_file.display(),
        cookies = %paths.cookie_file.display(),
        settings = %paths.settings_file.display(),
        env_file = ?env_file,
        "starting TrayChat"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(cli, paths));
    // Blocking stdin reads cannot be cancelled; don't wait for them.
    runtime.shutdown_background();
    result
}

async fn serve(cli: &Cli, paths: &Paths) -> Result<(), Box<dyn Error>> {
    let hub = LoopbackHub::new(Directory::demo());
    let mut account = Account::new(&cli.email, &cli.password);
    if let Some(pin) = &cli.pin {
        account = account.with_pin(pin);
    }

    let printer = Printer::stdout();
    let (prompter, requests) = Prompter::channel();
    let config = SessionConfig::new()
        .with_cookie_path(&paths.cookie_file)
        .with_languages_dir(&paths.languages_dir);
    let controller = SessionController::new(
        config,
        Collaborators {
            backend: Arc::new(LoopbackBackend::new(Arc::clone(&hub))),
            authenticator: Arc::new(LoopbackAuthenticator::new(Arc::clone(&hub), account)),
            shell: Box::new(ConsoleShell::new(printer.clone())),
            surfaces: Box::new(ConsoleSurfaces::new(printer.clone())),
            prompter: Arc::new(prompter),
        },
        SettingsStore::new(&paths.settings_file),
    );

    let handle = controller.handle();
    signals::forward_termination(handle.clone());
    tokio::spawn(console::run(
        BufReader::new(tokio::io::stdin()),
        handle,
        requests,
        hub,
        printer,
    ));

    controller.run().await?;
    info!("TrayChat stopped");
    Ok(())
}
