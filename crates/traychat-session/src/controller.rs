//! The session controller.
//!
//! Owns the connect/disconnect state machine and everything hanging off the
//! live session. All work runs on one cooperative scheduler: collaborator
//! calls are spawned as tasks and report back through the controller's inbox,
//! so the controller itself never blocks.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, error, info, warn};
use traychat_auth::{
    AuthenticationBridge, Authenticator, LoginOutcome, Prompt, PromptReply, Prompter,
};
use traychat_models::{ConversationEvent, ConversationId, Cookies, Snapshot, Translator};

use crate::client::{ChatBackend, ChatClient};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::gesture::{GestureAction, GestureDisambiguator};
use crate::message::{MenuAction, SessionHandle, SessionMessage, TaskResult, UserInput};
use crate::router::EventRouter;
use crate::session::{Session, SessionStatus};
use crate::settings::{Settings, SettingsStore};
use crate::ui::{Affordances, SurfaceFactory, TrayShell};

/// External collaborators wired into the controller.
pub struct Collaborators {
    /// Chat-client library.
    pub backend: Arc<dyn ChatBackend>,
    /// Authentication service.
    pub authenticator: Arc<dyn Authenticator>,
    /// Tray icon and menu.
    pub shell: Box<dyn TrayShell>,
    /// Conversation windows.
    pub surfaces: Box<dyn SurfaceFactory>,
    /// Modal prompt channel answered by the front-end.
    pub prompter: Arc<Prompter>,
}

/// Drives the session lifecycle.
pub struct SessionController {
    config: SessionConfig,
    backend: Arc<dyn ChatBackend>,
    authenticator: Arc<dyn Authenticator>,
    auth: AuthenticationBridge,
    shell: Box<dyn TrayShell>,
    surfaces: Box<dyn SurfaceFactory>,
    translator: Translator,
    settings_store: SettingsStore,
    settings: Settings,
    session: Session,
    router: Option<EventRouter>,
    gesture: GestureDisambiguator,
    /// Bumped on every start and stop; completions carrying an older epoch
    /// belong to a session that no longer exists.
    epoch: u64,
    login_pending: bool,
    quit_pending: bool,
    pending_disconnects: usize,
    shutting_down: bool,
    inbox_tx: UnboundedSender<SessionMessage>,
    inbox_rx: UnboundedReceiver<SessionMessage>,
}

impl SessionController {
    /// Creates a disconnected controller.
    ///
    /// Loads the settings, binds the translator to the configured language
    /// and puts the tray into its disconnected state.
    pub fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        settings_store: SettingsStore,
    ) -> Self {
        let Collaborators {
            backend,
            authenticator,
            mut shell,
            surfaces,
            prompter,
        } = collaborators;

        let settings = settings_store.load().unwrap_or_else(|e| {
            warn!(error = %e, path = %settings_store.path().display(), "Failed to load settings, using defaults");
            Settings::default()
        });

        let translator = Translator::load(&config.languages_dir, &settings.language());
        shell.retranslate(&translator);
        shell.apply(Affordances::for_status(SessionStatus::Disconnected));

        let interval = shell
            .double_click_interval()
            .unwrap_or(config.double_click_interval);
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();

        info!(
            language = %translator.language(),
            double_click_ms = interval.as_millis() as u64,
            "session controller created"
        );

        Self {
            auth: AuthenticationBridge::new(prompter, translator.clone()),
            config,
            backend,
            authenticator,
            shell,
            surfaces,
            translator,
            settings_store,
            settings,
            session: Session::new(),
            router: None,
            gesture: GestureDisambiguator::new(interval),
            epoch: 0,
            login_pending: false,
            quit_pending: false,
            pending_disconnects: 0,
            shutting_down: false,
            inbox_tx,
            inbox_rx,
        }
    }

    /// Returns a handle for sending input to this controller.
    pub fn handle(&self) -> SessionHandle {
        SessionHandle::new(self.inbox_tx.clone())
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The event router of the connected session.
    pub fn router(&self) -> Option<&EventRouter> {
        self.router.as_ref()
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn gesture(&self) -> &GestureDisambiguator {
        &self.gesture
    }

    /// Returns true while a login prompt sequence is running.
    pub fn is_login_pending(&self) -> bool {
        self.login_pending
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down
    }

    /// Runs until quit, then waits (bounded) for in-flight disconnects.
    ///
    /// Errors from connect/disconnect completions end the loop.
    pub async fn run(mut self) -> Result<()> {
        info!("session controller running");
        while self.step().await? {}
        self.drain_disconnects().await?;
        info!("session controller stopped");
        Ok(())
    }

    /// Handles the next message or gesture timeout.
    ///
    /// Returns false once the controller is shutting down.
    pub async fn step(&mut self) -> Result<bool> {
        if self.shutting_down {
            return Ok(false);
        }

        let deadline = self.gesture.deadline();
        tokio::select! {
            biased;
            message = self.inbox_rx.recv() => {
                if let Some(message) = message {
                    self.handle_message(message)?;
                }
            }
            _ = sleep_until_deadline(deadline) => {
                self.on_gesture_timeout(Instant::now());
            }
        }

        Ok(!self.shutting_down)
    }

    /// Handles every message already in the inbox without waiting.
    ///
    /// Returns the number of messages handled.
    pub fn process_pending(&mut self) -> Result<usize> {
        let mut handled = 0;
        while !self.shutting_down {
            let Ok(message) = self.inbox_rx.try_recv() else {
                break;
            };
            self.handle_message(message)?;
            handled += 1;
        }
        Ok(handled)
    }

    // --- Lifecycle ---

    /// Starts a session: authenticate, then connect.
    ///
    /// Only valid while disconnected and no login is in progress; otherwise a
    /// no-op. Returns immediately; the login runs as a task.
    pub fn start(&mut self) {
        if self.session.is_active() {
            debug!(status = %self.session.status(), "start ignored: session active");
            return;
        }
        if self.login_pending {
            debug!("start ignored: login already in progress");
            return;
        }
        if self.shutting_down {
            return;
        }

        info!("starting session");
        self.login_pending = true;

        let auth = self.auth.clone();
        let authenticator = Arc::clone(&self.authenticator);
        let cookie_path = self.config.cookie_path.clone();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let outcome = auth.login(authenticator.as_ref(), &cookie_path).await;
            let _ = inbox.send(SessionMessage::LoginFinished(outcome));
        });
    }

    /// Stops the session.
    ///
    /// Only valid while connecting or connected; otherwise a no-op. The
    /// disconnect is fire-and-forget: every session handle and all view
    /// state are released before this returns.
    pub fn stop(&mut self) {
        if !self.session.is_active() {
            debug!("stop ignored: not connected");
            return;
        }

        info!(status = %self.session.status(), epoch = self.epoch, "stopping session");
        self.epoch += 1;
        if let Some(client) = self.teardown() {
            self.spawn_disconnect(client);
        }
    }

    /// Quits the application.
    ///
    /// With an active session, asks for confirmation unless `force` is set.
    /// A confirmed or forced quit stops the session first.
    pub fn quit(&mut self, force: bool) {
        if self.session.is_active() && !force {
            if self.quit_pending {
                return;
            }
            self.quit_pending = true;

            let prompt = Prompt::confirm(
                self.translator.tr("TrayChat - Quit"),
                self.translator.tr(
                    "You are still connected. Do you really want to quit TrayChat?",
                ),
            );
            let prompter = Arc::clone(self.auth.prompter());
            let inbox = self.inbox_tx.clone();
            tokio::spawn(async move {
                let confirmed = matches!(prompter.ask(prompt).await, Ok(PromptReply::Accepted));
                let _ = inbox.send(SessionMessage::QuitAnswered(confirmed));
            });
            return;
        }

        self.stop();
        self.shutdown();
    }

    /// Persists new settings, rebinds the translator and, if a session is
    /// active, reconnects so that no session runs with stale settings.
    pub fn apply_settings(&mut self, settings: Settings) {
        if let Err(e) = self.settings_store.save(&settings) {
            error!(error = %e, "Failed to save settings");
            let title = self.translator.tr("TrayChat - Warning");
            let message = self.translator.tr("Settings could not be saved!");
            self.shell.warn(&title, &message);
        }
        self.settings = settings;
        self.set_language();

        if self.session.is_active() {
            info!("settings changed while connected, reconnecting");
            self.stop();
            self.start();
        }
    }

    /// Opens a conversation tab on user request.
    pub fn open_conversation(&mut self, conversation_id: &ConversationId, switch: bool) {
        match self.router.as_mut() {
            Some(router) => router.open_conversation(conversation_id, switch, self.surfaces.as_mut()),
            None => debug!(conversation_id = %conversation_id, "open ignored: not connected"),
        }
    }

    /// Shows the About box.
    pub fn about(&mut self) {
        let title = self.translator.tr("About");
        let message = format!("TrayChat {}", env!("CARGO_PKG_VERSION"));
        self.shell.inform(&title, &message);
    }

    // --- Tray gestures ---

    /// Feeds one tray icon activation received at `now`.
    pub fn on_tray_activated(&mut self, now: Instant) {
        if let Some(action) = self.gesture.click(now) {
            self.perform(action);
        }
    }

    /// Feeds a gesture timer tick at `now`.
    pub fn on_gesture_timeout(&mut self, now: Instant) {
        if let Some(action) = self.gesture.expire(now) {
            self.perform(action);
        }
    }

    fn perform(&mut self, action: GestureAction) {
        debug!(?action, "tray gesture");
        match action {
            GestureAction::ToggleConnection => {
                if self.session.is_active() {
                    self.stop();
                } else {
                    self.start();
                }
            }
            GestureAction::ToggleVisibility => {
                if let Some(router) = self.router.as_mut() {
                    router.toggle_conversation_list();
                }
            }
        }
    }

    // --- Inbox ---

    fn handle_message(&mut self, message: SessionMessage) -> Result<()> {
        match message {
            SessionMessage::Input(input) => self.on_input(input),
            SessionMessage::LoginFinished(outcome) => self.on_login_finished(outcome),
            SessionMessage::Connected { epoch, snapshot } => self.on_connected(epoch, *snapshot),
            SessionMessage::ConversationEvent { epoch, event } => {
                self.on_conversation_event(epoch, event)
            }
            SessionMessage::ConnectFinished { epoch, result } => {
                return self.on_connect_finished(epoch, result)
            }
            SessionMessage::DisconnectFinished { result } => {
                return self.on_disconnect_finished(result)
            }
            SessionMessage::QuitAnswered(confirmed) => self.on_quit_answered(confirmed),
        }
        Ok(())
    }

    fn on_input(&mut self, input: UserInput) {
        match input {
            UserInput::TrayActivated => self.on_tray_activated(Instant::now()),
            UserInput::Menu(MenuAction::Connect) => self.start(),
            UserInput::Menu(MenuAction::Disconnect) => self.stop(),
            UserInput::Menu(MenuAction::About) => self.about(),
            UserInput::Menu(MenuAction::Quit) => self.quit(false),
            UserInput::SettingsChanged(settings) => self.apply_settings(settings),
            UserInput::OpenConversation {
                conversation_id,
                switch,
            } => self.open_conversation(&conversation_id, switch),
            UserInput::TabClosed(conversation_id) => {
                if let Some(router) = self.router.as_mut() {
                    router.close_tab(&conversation_id);
                }
            }
            UserInput::Terminate => {
                info!("termination requested");
                self.quit(true);
            }
        }
    }

    fn on_login_finished(&mut self, outcome: LoginOutcome) {
        self.login_pending = false;
        match outcome {
            LoginOutcome::Authenticated(cookies) => {
                if self.shutting_down || self.session.is_active() {
                    debug!("discarding login result");
                    return;
                }
                self.connect(cookies);
            }
            LoginOutcome::Cancelled => {
                debug!("login cancelled, staying disconnected");
            }
            LoginOutcome::Failed(e) => {
                warn!(error = %e, "login failed");
                let title = self.translator.tr("TrayChat - Warning");
                let message = self.translator.tr("Login failed!");
                self.shell.warn(&title, &message);
            }
        }
    }

    /// Disconnected -> Connecting: create the client, observe its first
    /// connect, and run `connect()` as a task.
    fn connect(&mut self, cookies: Cookies) {
        let client = self.backend.client(cookies);
        self.epoch += 1;
        let epoch = self.epoch;

        let mut on_connect = client.on_connect();
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            // One snapshot per session; the subscription ends with this task.
            if let Some(snapshot) = on_connect.recv().await {
                let _ = inbox.send(SessionMessage::Connected {
                    epoch,
                    snapshot: Box::new(snapshot),
                });
            }
        });

        let task = tokio::spawn({
            let client = Arc::clone(&client);
            async move { client.connect().await }
        });
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            let _ = inbox.send(SessionMessage::ConnectFinished { epoch, result });
        });

        self.session.begin(client);
        self.shell.apply(Affordances::for_status(self.session.status()));
        info!(epoch, "connecting");
    }

    /// Connecting -> Connected: build the collections from the snapshot and
    /// hand the conversation events to a fresh router.
    fn on_connected(&mut self, epoch: u64, snapshot: Snapshot) {
        if epoch != self.epoch || self.session.status() != SessionStatus::Connecting {
            debug!(epoch, current = self.epoch, "ignoring stale connect notification");
            return;
        }
        let Some(client) = self.session.client().cloned() else {
            return;
        };

        let Snapshot {
            self_entity,
            entities,
            conversation_participants,
            conversation_states,
            sync_timestamp,
        } = snapshot;

        let users = self.backend.user_list(
            Arc::clone(&client),
            self_entity,
            entities,
            conversation_participants,
        );
        let conversations = self.backend.conversation_list(
            Arc::clone(&client),
            conversation_states,
            Arc::clone(&users),
            sync_timestamp,
        );
        let mut router = EventRouter::new(
            epoch,
            Arc::clone(&client),
            Arc::clone(&conversations),
            Arc::clone(&users),
            self.inbox_tx.clone(),
        );
        let notifier = self.backend.notifier(Arc::clone(&conversations));

        self.session.establish(conversations, users, notifier);
        router.show_conversation_list(self.surfaces.as_mut());
        self.router = Some(router);
        self.shell.apply(Affordances::for_status(self.session.status()));
        info!(epoch, "connected");
    }

    fn on_conversation_event(&mut self, epoch: u64, event: ConversationEvent) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "dropping event of a closed session");
            return;
        }
        if let Some(router) = self.router.as_mut() {
            router.route(&event, self.surfaces.as_mut());
        }
    }

    fn on_connect_finished(&mut self, epoch: u64, result: TaskResult) -> Result<()> {
        let completed = task_completed(result)?;
        if completed && epoch == self.epoch && self.session.is_active() {
            warn!(epoch, "connection closed by remote");
            self.epoch += 1;
            self.teardown();
        } else {
            debug!(epoch, "connect task finished");
        }
        Ok(())
    }

    fn on_disconnect_finished(&mut self, result: TaskResult) -> Result<()> {
        self.pending_disconnects = self.pending_disconnects.saturating_sub(1);
        task_completed(result)?;
        debug!(pending = self.pending_disconnects, "disconnect finished");
        Ok(())
    }

    fn on_quit_answered(&mut self, confirmed: bool) {
        self.quit_pending = false;
        if confirmed {
            self.stop();
            self.shutdown();
        } else {
            debug!("quit declined");
        }
    }

    // --- Helpers ---

    /// Releases every session handle and all view state.
    fn teardown(&mut self) -> Option<Arc<dyn ChatClient>> {
        if let Some(router) = self.router.take() {
            router.teardown();
        }
        let client = self.session.release();
        self.shell.apply(Affordances::for_status(self.session.status()));
        client
    }

    fn spawn_disconnect(&mut self, client: Arc<dyn ChatClient>) {
        self.pending_disconnects += 1;
        let task = tokio::spawn(async move { client.disconnect().await });
        let inbox = self.inbox_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            let _ = inbox.send(SessionMessage::DisconnectFinished { result });
        });
    }

    fn set_language(&mut self) {
        let language = self.settings.language();
        self.translator.rebind(&self.config.languages_dir, &language);
        self.shell.retranslate(&self.translator);
        info!(language = %language, "language set");
    }

    fn shutdown(&mut self) {
        info!("shutting down");
        self.shutting_down = true;
    }

    async fn drain_disconnects(&mut self) -> Result<()> {
        if self.pending_disconnects == 0 {
            return Ok(());
        }

        let grace = self.config.shutdown_grace;
        let drained = timeout(grace, async {
            while self.pending_disconnects > 0 {
                match self.inbox_rx.recv().await {
                    Some(SessionMessage::DisconnectFinished { result }) => {
                        self.on_disconnect_finished(result)?;
                    }
                    Some(_) => {}
                    None => break,
                }
            }
            Ok::<_, SessionError>(())
        })
        .await;

        match drained {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    pending = self.pending_disconnects,
                    "shutdown grace elapsed with disconnects in flight"
                );
                Ok(())
            }
        }
    }
}

/// Resumes a panic from a connect/disconnect task and turns a client error
/// into a session error. Returns false for a cancelled task.
fn task_completed(result: TaskResult) -> Result<bool> {
    match result {
        Ok(Ok(())) => Ok(true),
        Ok(Err(e)) => {
            error!(error = %e, "chat client task failed");
            Err(e.into())
        }
        Err(join_error) if join_error.is_panic() => {
            std::panic::resume_unwind(join_error.into_panic())
        }
        Err(_) => Ok(false),
    }
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
