//! Recording fakes for the session controller's collaborators.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tempfile::TempDir;
use tokio::sync::Notify;
use traychat_auth::{
    AuthError, Authenticator, CredentialSource, Prompt, PromptKind, PromptReply, Prompter,
};
use traychat_models::{
    ConversationEvent, ConversationId, ConversationState, Cookies, Entity, Participant, Snapshot,
    Translator, UserId,
};
use traychat_session::{
    Affordances, ChatBackend, ChatClient, ClientError, Collaborators, ConversationList,
    MessageView, Notifier, Observable, SessionConfig, SessionController, SettingsStore, Surface,
    SurfaceFactory, Subscription, TrayShell, UserList,
};

pub const PASSWORD: &str = "secret";

/// How a fake client's `connect()` behaves.
#[derive(Debug, Clone)]
pub enum ConnectScript {
    /// Emit the snapshot, then run until disconnected or closed remotely.
    Succeed,
    /// Wait for [`FakeClient::release`] before emitting the snapshot.
    Hold,
    /// Return an error without connecting.
    Fail(ClientError),
    /// Panic inside the connect task.
    Panic,
}

pub struct FakeClient {
    snapshot: Snapshot,
    script: ConnectScript,
    on_connect: Observable<Snapshot>,
    released: Notify,
    closed: Notify,
    pub connects: AtomicUsize,
    pub disconnects: AtomicUsize,
}

impl FakeClient {
    /// Lets a held `connect()` proceed.
    pub fn release(&self) {
        self.released.notify_one();
    }

    /// Ends `connect()` as if the service dropped the connection.
    pub fn close_remotely(&self) {
        self.closed.notify_one();
    }
}

#[async_trait]
impl ChatClient for FakeClient {
    async fn connect(&self) -> Result<(), ClientError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            ConnectScript::Fail(e) => return Err(e.clone()),
            ConnectScript::Panic => panic!("client exploded"),
            ConnectScript::Hold => self.released.notified().await,
            ConnectScript::Succeed => {}
        }
        self.on_connect.emit(self.snapshot.clone());
        self.closed.notified().await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.closed.notify_one();
        Ok(())
    }

    fn on_connect(&self) -> Subscription<Snapshot> {
        self.on_connect.subscribe()
    }
}

pub struct FakeUsers {
    self_user: Entity,
    entities: Vec<Entity>,
}

impl UserList for FakeUsers {
    fn self_user(&self) -> Entity {
        self.self_user.clone()
    }

    fn get(&self, id: &UserId) -> Option<Entity> {
        std::iter::once(&self.self_user)
            .chain(self.entities.iter())
            .find(|e| &e.id == id)
            .cloned()
    }
}

pub struct FakeConversations {
    states: Vec<ConversationState>,
    events: Observable<ConversationEvent>,
}

impl FakeConversations {
    /// Delivers an event; returns the number of observers reached.
    pub fn deliver(&self, event: ConversationEvent) -> usize {
        self.events.emit(event)
    }

    pub fn observers(&self) -> usize {
        self.events.subscriber_count()
    }
}

impl ConversationList for FakeConversations {
    fn on_event(&self) -> Subscription<ConversationEvent> {
        self.events.subscribe()
    }

    fn get(&self, id: &ConversationId) -> Option<ConversationState> {
        self.states.iter().find(|s| &s.id == id).cloned()
    }

    fn conversations(&self) -> Vec<ConversationState> {
        self.states.clone()
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    pub closed: AtomicUsize,
}

impl Notifier for FakeNotifier {
    fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out fake clients and remembers everything it built.
pub struct FakeBackend {
    snapshot: Snapshot,
    script: Mutex<ConnectScript>,
    pub clients: Mutex<Vec<Arc<FakeClient>>>,
    pub conversation_lists: Mutex<Vec<Arc<FakeConversations>>>,
    pub notifiers: Mutex<Vec<Arc<FakeNotifier>>>,
    pub user_lists: AtomicUsize,
}

impl FakeBackend {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            script: Mutex::new(ConnectScript::Succeed),
            clients: Mutex::new(Vec::new()),
            conversation_lists: Mutex::new(Vec::new()),
            notifiers: Mutex::new(Vec::new()),
            user_lists: AtomicUsize::new(0),
        }
    }

    /// Script for clients created from now on.
    pub fn set_script(&self, script: ConnectScript) {
        *self.script.lock().unwrap() = script;
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }

    pub fn last_client(&self) -> Arc<FakeClient> {
        self.clients.lock().unwrap().last().cloned().unwrap()
    }

    pub fn last_conversations(&self) -> Arc<FakeConversations> {
        self.conversation_lists
            .lock()
            .unwrap()
            .last()
            .cloned()
            .unwrap()
    }

    pub fn total_connects(&self) -> usize {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.connects.load(Ordering::SeqCst))
            .sum()
    }

    pub fn total_disconnects(&self) -> usize {
        self.clients
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.disconnects.load(Ordering::SeqCst))
            .sum()
    }
}

impl ChatBackend for FakeBackend {
    fn client(&self, _cookies: Cookies) -> Arc<dyn ChatClient> {
        let client = Arc::new(FakeClient {
            snapshot: self.snapshot.clone(),
            script: self.script.lock().unwrap().clone(),
            on_connect: Observable::new(),
            released: Notify::new(),
            closed: Notify::new(),
            connects: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        });
        self.clients.lock().unwrap().push(Arc::clone(&client));
        client
    }

    fn user_list(
        &self,
        _client: Arc<dyn ChatClient>,
        self_entity: Entity,
        entities: Vec<Entity>,
        _participants: Vec<Participant>,
    ) -> Arc<dyn UserList> {
        self.user_lists.fetch_add(1, Ordering::SeqCst);
        Arc::new(FakeUsers {
            self_user: self_entity,
            entities,
        })
    }

    fn conversation_list(
        &self,
        _client: Arc<dyn ChatClient>,
        states: Vec<ConversationState>,
        _users: Arc<dyn UserList>,
        _sync_timestamp: chrono::DateTime<Utc>,
    ) -> Arc<dyn ConversationList> {
        let list = Arc::new(FakeConversations {
            states,
            events: Observable::new(),
        });
        self.conversation_lists
            .lock()
            .unwrap()
            .push(Arc::clone(&list));
        list
    }

    fn notifier(&self, _conversations: Arc<dyn ConversationList>) -> Arc<dyn Notifier> {
        let notifier = Arc::new(FakeNotifier::default());
        self.notifiers.lock().unwrap().push(Arc::clone(&notifier));
        notifier
    }
}

/// Accepts `user@example.com` / [`PASSWORD`]; asks for a PIN when configured.
pub struct FakeAuthenticator {
    pub require_pin: Option<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Authenticator for FakeAuthenticator {
    async fn get_auth(
        &self,
        source: &dyn CredentialSource,
        _cookie_path: &Path,
    ) -> traychat_auth::Result<Cookies> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let credentials = source.credentials().await?;
        if credentials.password != PASSWORD {
            return Err(AuthError::InvalidCredentials("bad password".into()));
        }
        if let Some(expected) = &self.require_pin {
            if &source.pin().await? != expected {
                return Err(AuthError::InvalidCredentials("bad PIN".into()));
            }
        }
        let mut cookies = Cookies::new();
        cookies.insert("SID", "fake-session");
        Ok(cookies)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShellCall {
    Apply(Affordances),
    Retranslate(String),
    Warn(String, String),
    Inform(String, String),
}

#[derive(Clone, Default)]
pub struct ShellLog(Arc<Mutex<Vec<ShellCall>>>);

impl ShellLog {
    pub fn calls(&self) -> Vec<ShellCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn last_affordances(&self) -> Option<Affordances> {
        self.calls().into_iter().rev().find_map(|call| match call {
            ShellCall::Apply(a) => Some(a),
            _ => None,
        })
    }

    pub fn warnings(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ShellCall::Warn(t, m) => Some((t, m)),
                _ => None,
            })
            .collect()
    }

    pub fn informs(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ShellCall::Inform(t, m) => Some((t, m)),
                _ => None,
            })
            .collect()
    }

    pub fn retranslations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, ShellCall::Retranslate(_)))
            .count()
    }
}

pub struct FakeShell {
    log: ShellLog,
    interval: Option<Duration>,
}

impl TrayShell for FakeShell {
    fn apply(&mut self, affordances: Affordances) {
        self.log.0.lock().unwrap().push(ShellCall::Apply(affordances));
    }

    fn retranslate(&mut self, translator: &Translator) {
        self.log
            .0
            .lock()
            .unwrap()
            .push(ShellCall::Retranslate(translator.language()));
    }

    fn warn(&mut self, title: &str, message: &str) {
        self.log
            .0
            .lock()
            .unwrap()
            .push(ShellCall::Warn(title.into(), message.into()));
    }

    fn inform(&mut self, title: &str, message: &str) {
        self.log
            .0
            .lock()
            .unwrap()
            .push(ShellCall::Inform(title.into(), message.into()));
    }

    fn double_click_interval(&self) -> Option<Duration> {
        self.interval
    }
}

/// Shared state of every surface the factory created.
#[derive(Debug, Default)]
pub struct SurfaceState {
    pub conversation_lists: usize,
    pub message_views: usize,
    pub list_visible: bool,
    pub view_visible: bool,
    pub list_toggles: usize,
    pub tabs_added: Vec<ConversationId>,
    pub tabs_removed: Vec<ConversationId>,
    pub focused: Option<ConversationId>,
}

#[derive(Clone, Default)]
pub struct SurfaceLog(Arc<Mutex<SurfaceState>>);

impl SurfaceLog {
    pub fn with<R>(&self, f: impl FnOnce(&SurfaceState) -> R) -> R {
        f(&self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.0.lock().unwrap()
    }
}

struct FakeList(SurfaceLog);

impl Surface for FakeList {
    fn show(&mut self) {
        let mut s = self.0.lock();
        if !s.list_visible {
            s.list_toggles += 1;
        }
        s.list_visible = true;
    }

    fn hide(&mut self) {
        let mut s = self.0.lock();
        if s.list_visible {
            s.list_toggles += 1;
        }
        s.list_visible = false;
    }

    fn is_visible(&self) -> bool {
        self.0.lock().list_visible
    }
}

struct FakeView(SurfaceLog);

impl Surface for FakeView {
    fn show(&mut self) {
        self.0.lock().view_visible = true;
    }

    fn hide(&mut self) {
        self.0.lock().view_visible = false;
    }

    fn is_visible(&self) -> bool {
        self.0.lock().view_visible
    }
}

impl MessageView for FakeView {
    fn add_tab(&mut self, conversation: &ConversationId, _title: &str) {
        self.0.lock().tabs_added.push(conversation.clone());
    }

    fn remove_tab(&mut self, conversation: &ConversationId) {
        self.0.lock().tabs_removed.push(conversation.clone());
    }

    fn focus_tab(&mut self, conversation: &ConversationId) {
        self.0.lock().focused = Some(conversation.clone());
    }
}

pub struct FakeSurfaces(SurfaceLog);

impl SurfaceFactory for FakeSurfaces {
    fn conversation_list(
        &mut self,
        _client: Arc<dyn ChatClient>,
        _conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn Surface> {
        self.0.lock().conversation_lists += 1;
        Box::new(FakeList(self.0.clone()))
    }

    fn message_view(
        &mut self,
        _client: Arc<dyn ChatClient>,
        _conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn MessageView> {
        self.0.lock().message_views += 1;
        Box::new(FakeView(self.0.clone()))
    }
}

/// Answers prompts from a script; cancels once the script runs dry.
#[derive(Clone, Default)]
pub struct Responder {
    script: Arc<Mutex<VecDeque<PromptReply>>>,
    pub seen: Arc<Mutex<Vec<Prompt>>>,
}

impl Responder {
    pub fn push(&self, reply: PromptReply) {
        self.script.lock().unwrap().push_back(reply);
    }

    /// Queues a successful email/password exchange.
    pub fn push_login(&self) {
        self.push(PromptReply::Value("user@example.com".into()));
        self.push(PromptReply::Value(PASSWORD.into()));
    }

    pub fn seen(&self) -> Vec<Prompt> {
        self.seen.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> usize {
        self.seen()
            .iter()
            .filter(|p| p.kind == PromptKind::Confirm)
            .count()
    }
}

pub fn snapshot() -> Snapshot {
    let me = Entity::new("me", "Me");
    let alice = Entity::new("alice", "Alice");
    let bob = Entity::new("bob", "Bob");
    Snapshot {
        self_entity: me,
        entities: vec![alice, bob],
        conversation_participants: vec![
            Participant {
                conversation_id: "C1".into(),
                user_id: "alice".into(),
            },
            Participant {
                conversation_id: "C2".into(),
                user_id: "bob".into(),
            },
        ],
        conversation_states: vec![
            ConversationState::new("C1").with_participant("me").with_participant("alice"),
            ConversationState::new("C2").with_name("Team").with_participant("bob"),
            ConversationState::new("C42").with_participant("alice"),
        ],
        sync_timestamp: Utc::now(),
    }
}

pub fn message(conversation: &str, text: &str) -> ConversationEvent {
    ConversationEvent::chat_message(conversation, "alice", text)
}

/// A controller wired to recording fakes.
pub struct Harness {
    pub controller: SessionController,
    pub backend: Arc<FakeBackend>,
    pub authenticator: Arc<FakeAuthenticator>,
    pub shell: ShellLog,
    pub surfaces: SurfaceLog,
    pub responder: Responder,
    pub dir: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    pub fn with_pin(pin: &str) -> Self {
        Self::build(Some(pin.to_string()), None)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self::build(None, Some(interval))
    }

    fn build(require_pin: Option<String>, interval: Option<Duration>) -> Self {
        let dir = TempDir::new().unwrap();
        let languages = dir.path().join("languages");
        std::fs::create_dir_all(&languages).unwrap();
        std::fs::write(
            languages.join("traychat_cs.json"),
            r#"{"Login failed!": "Přihlášení selhalo!", "About": "O aplikaci"}"#,
        )
        .unwrap();

        let config = SessionConfig::new()
            .with_cookie_path(dir.path().join("cookies.json"))
            .with_languages_dir(&languages)
            .with_shutdown_grace(Duration::from_millis(500));
        let store = SettingsStore::new(dir.path().join("settings.json"));
        std::fs::write(store.path(), r#"{"language": "en"}"#).unwrap();

        let backend = Arc::new(FakeBackend::new(snapshot()));
        let authenticator = Arc::new(FakeAuthenticator {
            require_pin,
            calls: AtomicUsize::new(0),
        });
        let shell = ShellLog::default();
        let surfaces = SurfaceLog::default();
        let responder = Responder::default();

        let (prompter, mut requests) = Prompter::channel();
        let answers = responder.clone();
        tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                answers.seen.lock().unwrap().push(request.prompt.clone());
                let reply = answers.script.lock().unwrap().pop_front();
                match reply {
                    Some(reply) => request.respond(reply),
                    None => request.cancel(),
                }
            }
        });

        let controller = SessionController::new(
            config,
            Collaborators {
                backend: backend.clone(),
                authenticator: authenticator.clone(),
                shell: Box::new(FakeShell {
                    log: shell.clone(),
                    interval,
                }),
                surfaces: Box::new(FakeSurfaces(surfaces.clone())),
                prompter: Arc::new(prompter),
            },
            store,
        );

        Self {
            controller,
            backend,
            authenticator,
            shell,
            surfaces,
            responder,
            dir,
        }
    }

    /// Lets background tasks run and handles everything they report.
    pub async fn settle(&mut self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
            self.controller.process_pending().unwrap();
        }
    }

    /// Logs in and waits until connected.
    pub async fn connect(&mut self) {
        self.responder.push_login();
        self.controller.start();
        self.settle().await;
    }
}
