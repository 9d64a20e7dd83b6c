//! Console front-end.
//!
//! Stands in for the desktop tray: the tray icon, its menu and the
//! conversation windows are rendered as lines on stdout, and user input
//! (menu actions, tray clicks, prompt answers) is read from stdin.

use std::fmt;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use traychat_auth::{PromptKind, PromptReply, PromptRequest};
use traychat_loopback::LoopbackHub;
use traychat_models::{ConversationId, ConversationState, Translator};
use traychat_session::{
    Affordances, ChatClient, ConversationList, MenuAction, MessageView, SessionHandle, Settings,
    Surface, SurfaceFactory, TrayIcon, TrayShell,
};

/// Where console output goes.
#[derive(Clone)]
pub struct Printer {
    captured: Option<Arc<Mutex<Vec<String>>>>,
}

impl Printer {
    pub fn stdout() -> Self {
        Self { captured: None }
    }

    /// A printer recording lines instead of printing them.
    pub fn capture() -> Self {
        Self {
            captured: Some(Arc::default()),
        }
    }

    pub fn line(&self, text: impl fmt::Display) {
        match &self.captured {
            Some(lines) => {
                if let Ok(mut lines) = lines.lock() {
                    lines.push(text.to_string());
                }
            }
            None => println!("{text}"),
        }
    }

    /// Recorded lines of a capturing printer.
    pub fn lines(&self) -> Vec<String> {
        self.captured
            .as_ref()
            .and_then(|lines| lines.lock().ok().map(|l| l.clone()))
            .unwrap_or_default()
    }
}

/// Menu entries with their mnemonic markers, as passed to the translator.
const MENU_LABELS: [&str; 5] = ["&Connect", "&Disconnect", "S&ettings ...", "A&bout ...", "&Quit"];

/// The tray icon and its menu.
pub struct ConsoleShell {
    printer: Printer,
    labels: Vec<String>,
}

impl ConsoleShell {
    pub fn new(printer: Printer) -> Self {
        Self {
            printer,
            labels: MENU_LABELS.iter().map(|l| l.replace('&', "")).collect(),
        }
    }

    /// Current menu labels, translated and without mnemonics.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }
}

impl TrayShell for ConsoleShell {
    fn apply(&mut self, affordances: Affordances) {
        let icon = match affordances.icon {
            TrayIcon::Active => "*",
            TrayIcon::Disabled => "-",
        };
        let flag = |enabled: bool| if enabled { "on" } else { "off" };
        self.printer.line(format!(
            "[tray {icon}] {}: {} | {}: {}",
            self.labels[0],
            flag(affordances.connect_enabled),
            self.labels[1],
            flag(affordances.disconnect_enabled),
        ));
    }

    fn retranslate(&mut self, translator: &Translator) {
        self.labels = MENU_LABELS
            .iter()
            .map(|label| translator.tr(label).replace('&', ""))
            .collect();
        self.printer
            .line(format!("[menu] {}", self.labels.join(" | ")));
    }

    fn warn(&mut self, title: &str, message: &str) {
        self.printer.line(format!("[{title}] {message}"));
    }

    fn inform(&mut self, title: &str, message: &str) {
        self.printer.line(format!("[{title}] {message}"));
    }
}

fn state_title(state: &ConversationState) -> String {
    match state.name.as_deref().filter(|n| !n.trim().is_empty()) {
        Some(name) => name.to_string(),
        None if !state.participants.is_empty() => state
            .participants
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(", "),
        None => state.id.to_string(),
    }
}

struct ConversationListView {
    printer: Printer,
    conversations: Arc<dyn ConversationList>,
    visible: bool,
}

impl Surface for ConversationListView {
    fn show(&mut self) {
        self.visible = true;
        self.printer.line("[conversations]");
        for state in self.conversations.conversations() {
            self.printer
                .line(format!("  {:<16} {}", state.id, state_title(&state)));
        }
    }

    fn hide(&mut self) {
        if self.visible {
            self.printer.line("[conversations hidden]");
        }
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

struct MessageTabs {
    printer: Printer,
    tabs: Vec<(ConversationId, String)>,
    visible: bool,
}

impl MessageTabs {
    fn title(&self, conversation: &ConversationId) -> String {
        self.tabs
            .iter()
            .find(|(id, _)| id == conversation)
            .map(|(_, title)| title.clone())
            .unwrap_or_else(|| conversation.to_string())
    }
}

impl Surface for MessageTabs {
    fn show(&mut self) {
        if !self.visible {
            self.printer.line("[messages shown]");
        }
        self.visible = true;
    }

    fn hide(&mut self) {
        if self.visible {
            self.printer.line("[messages hidden]");
        }
        self.visible = false;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }
}

impl MessageView for MessageTabs {
    fn add_tab(&mut self, conversation: &ConversationId, title: &str) {
        self.tabs.push((conversation.clone(), title.to_string()));
        self.printer.line(format!("[tab +] {title}"));
    }

    fn remove_tab(&mut self, conversation: &ConversationId) {
        let title = self.title(conversation);
        self.tabs.retain(|(id, _)| id != conversation);
        self.printer.line(format!("[tab -] {title}"));
    }

    fn focus_tab(&mut self, conversation: &ConversationId) {
        self.printer.line(format!("[tab >] {}", self.title(conversation)));
    }
}

/// Creates console renditions of the conversation windows.
pub struct ConsoleSurfaces {
    printer: Printer,
}

impl ConsoleSurfaces {
    pub fn new(printer: Printer) -> Self {
        Self { printer }
    }
}

impl SurfaceFactory for ConsoleSurfaces {
    fn conversation_list(
        &mut self,
        _client: Arc<dyn ChatClient>,
        conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn Surface> {
        Box::new(ConversationListView {
            printer: self.printer.clone(),
            conversations,
            visible: false,
        })
    }

    fn message_view(
        &mut self,
        _client: Arc<dyn ChatClient>,
        _conversations: Arc<dyn ConversationList>,
    ) -> Box<dyn MessageView> {
        Box::new(MessageTabs {
            printer: self.printer.clone(),
            tabs: Vec::new(),
            visible: false,
        })
    }
}

/// A line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// One click on the tray icon.
    Click,
    /// Two clicks in quick succession.
    DoubleClick,
    Menu(MenuAction),
    Open { conversation_id: ConversationId, switch: bool },
    Close(ConversationId),
    /// `None` follows the system locale.
    Language(Option<String>),
    /// Injects a message on the service side.
    Say {
        conversation_id: ConversationId,
        sender: String,
        text: String,
    },
    /// Drops the connection on the service side.
    Drop,
    Help,
    Nothing,
}

pub const HELP: &str = "\
commands:
  click | double            single/double click on the tray icon
  connect | disconnect      tray menu actions
  about | quit              tray menu actions
  open <id> [--stay]        open a conversation tab (--stay keeps the current tab)
  close <id>                close a conversation tab
  lang [<code>]             change the language (no code: system locale)
  say <id> <sender> <text>  deliver a message from the chat service
  drop                      drop the connection from the service side
  help                      show this help";

/// Parses one line of console input.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Command::Nothing);
    };
    let id = |word: Option<&str>| {
        word.map(ConversationId::from)
            .ok_or_else(|| format!("{verb}: missing conversation id"))
    };

    let command = match verb {
        "click" => Command::Click,
        "double" => Command::DoubleClick,
        "connect" => Command::Menu(MenuAction::Connect),
        "disconnect" => Command::Menu(MenuAction::Disconnect),
        "about" => Command::Menu(MenuAction::About),
        "quit" => Command::Menu(MenuAction::Quit),
        "open" => {
            let conversation_id = id(words.next())?;
            let switch = words.next() != Some("--stay");
            Command::Open {
                conversation_id,
                switch,
            }
        }
        "close" => Command::Close(id(words.next())?),
        "lang" => Command::Language(words.next().map(str::to_string)),
        "say" => {
            let conversation_id = id(words.next())?;
            let sender = words
                .next()
                .ok_or_else(|| "say: missing sender".to_string())?
                .to_string();
            let text = words.collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return Err("say: missing text".to_string());
            }
            Command::Say {
                conversation_id,
                sender,
                text,
            }
        }
        "drop" => Command::Drop,
        "help" | "?" => Command::Help,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(command)
}

/// Maps a line typed at a prompt to the prompt's answer.
///
/// An empty line dismisses text prompts; confirmations need an explicit yes.
pub fn prompt_reply(kind: PromptKind, line: &str) -> PromptReply {
    let line = line.trim();
    match kind {
        PromptKind::Confirm => match line.to_ascii_lowercase().as_str() {
            "y" | "yes" => PromptReply::Accepted,
            _ => PromptReply::Cancelled,
        },
        PromptKind::Text | PromptKind::Secret if line.is_empty() => PromptReply::Cancelled,
        PromptKind::Text | PromptKind::Secret => PromptReply::Value(line.to_string()),
    }
}

fn render_prompt(request: &PromptRequest) -> String {
    let prompt = &request.prompt;
    match prompt.kind {
        PromptKind::Confirm => format!("[{}] {} [y/N]", prompt.title, prompt.label),
        PromptKind::Secret => format!("[{}] {} (input is shown)", prompt.title, prompt.label),
        PromptKind::Text => format!("[{}] {}", prompt.title, prompt.label),
    }
}

/// Reads `input` until it ends, answering prompts and dispatching commands.
///
/// End of input is a forced quit.
pub async fn run<R>(
    input: R,
    handle: SessionHandle,
    mut requests: UnboundedReceiver<PromptRequest>,
    hub: Arc<LoopbackHub>,
    printer: Printer,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut pending: Option<PromptRequest> = None;
    let mut prompts_open = true;

    printer.line(HELP);
    loop {
        tokio::select! {
            request = requests.recv(), if pending.is_none() && prompts_open => {
                match request {
                    Some(request) => {
                        printer.line(render_prompt(&request));
                        pending = Some(request);
                    }
                    None => prompts_open = false,
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "console input failed");
                        break;
                    }
                };
                if let Some(request) = pending.take() {
                    let reply = prompt_reply(request.prompt.kind, &line);
                    request.respond(reply);
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        if !dispatch(command, &handle, &hub, &printer) {
                            debug!("session controller gone, console stops");
                            return;
                        }
                    }
                    Err(message) => printer.line(message),
                }
            }
        }
    }

    if let Some(request) = pending.take() {
        request.cancel();
    }
    handle.terminate();
}

/// Executes a command; returns false once the controller is gone.
fn dispatch(command: Command, handle: &SessionHandle, hub: &LoopbackHub, printer: &Printer) -> bool {
    match command {
        Command::Click => handle.tray_activated(),
        Command::DoubleClick => handle.tray_activated() && handle.tray_activated(),
        Command::Menu(action) => handle.menu(action),
        Command::Open {
            conversation_id,
            switch,
        } => handle.open_conversation(conversation_id, switch),
        Command::Close(conversation_id) => handle.close_tab(conversation_id),
        Command::Language(language) => handle.change_settings(Settings { language }),
        Command::Say {
            conversation_id,
            sender,
            text,
        } => {
            if !hub.send_message(conversation_id, sender.as_str(), text) {
                printer.line("not connected");
            }
            true
        }
        Command::Drop => {
            if !hub.drop_connection() {
                printer.line("not connected");
            }
            true
        }
        Command::Help => {
            printer.line(HELP);
            true
        }
        Command::Nothing => true,
    }
}
