//! Chat session orchestration with tokio mpsc command/event pattern.
//!
//! The session event loop runs in a dedicated tokio task and owns all chat
//! view state plus the push transport handle. External code (the UI layer)
//! communicates with it through typed command and event channels; nothing
//! else ever touches the state, so every mutation happens on one task.
//!
//! The push link is an explicit little state machine
//! (`Disconnected -> Connecting -> Connected -> Disconnected`): when the
//! stream closes, a reconnect fires after a fixed two-second delay and is
//! honored only if its conversation is still the active one.

use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tracing::{debug, error, info, warn};

use pawlink_net::api::ChatApi;
use pawlink_net::error::{ApiError, TransportError};
use pawlink_net::transport::{PushConnector, PushStream};
use pawlink_shared::constants::{
    CONNECT_TIMEOUT, CONVERSATION_PAGE_SIZE, MESSAGE_HISTORY_LIMIT, RECONNECT_DELAY,
};
use pawlink_shared::models::{Conversation, Message, MessageBatch};
use pawlink_shared::protocol::{decode_frame, OutboundChat, PushEvent};
use pawlink_shared::types::{AnnouncementId, ConversationId, MessageId};

use crate::config::ClientConfig;
use crate::state::{ChatState, Inbound, LogPhase};

// ---------------------------------------------------------------------------
// Command / event types
// ---------------------------------------------------------------------------

/// Commands sent *into* the session task.
#[derive(Debug)]
pub enum SessionCommand {
    /// Reload page 1 of the conversation list.
    Refresh,
    /// Make a conversation active: load its history, connect its push
    /// stream, clear its unread badge.
    Open(ConversationId),
    /// Page further back through the active conversation's history.
    LoadOlder,
    /// Send a message on the best available channel.
    Send(String),
    /// Start (or resume) the conversation about an announcement and open it.
    StartConversation(AnnouncementId),
    /// Tear everything down and exit the task.
    Shutdown,
}

/// Events sent *from* the session task to the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The conversation list changed (refresh, re-sort, unread or summary
    /// update). Carries the full ordered list.
    ConversationsUpdated(Vec<Conversation>),
    /// The active conversation's history finished loading.
    MessagesLoaded {
        conversation: ConversationId,
        messages: Vec<Message>,
    },
    /// An older history page was spliced in; carries the full log.
    OlderMessagesLoaded {
        conversation: ConversationId,
        messages: Vec<Message>,
    },
    /// One message was appended to the active log (inbound or fallback send).
    MessageAppended(Message),
    /// A conversation's unread badge was zeroed.
    UnreadCleared(ConversationId),
    /// The push link changed state.
    LinkChanged(LinkState),
    /// A conversation was started (or resumed) for an announcement.
    ConversationStarted(Conversation),
    /// Every `Send` command finishes with exactly one of these, so the UI
    /// can always re-enable its send control.
    SendFinished(SendOutcome),
    /// Non-blocking user-facing notification (the toast surface).
    Notice { level: NoticeLevel, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Push transport connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

/// How a send was (or was not) delivered, regardless of transport.
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    /// Empty text or no active conversation; nothing happened.
    Ignored,
    /// Sent over the push link; the appended message will arrive as the
    /// server echo, which is the source of truth for id and timestamp.
    EchoPending,
    /// Sent over HTTP while the link was down; the canonical message was
    /// appended immediately.
    Delivered(Message),
    /// Neither path succeeded; the caller should keep the draft for retry.
    Failed,
}

// ---------------------------------------------------------------------------
// Session task
// ---------------------------------------------------------------------------

/// Spawn the chat session in a background tokio task.
///
/// Returns channels for sending commands and receiving events. Dropping the
/// command sender shuts the session down.
pub fn spawn_session(
    config: ClientConfig,
    api: Arc<dyn ChatApi>,
    connector: Arc<dyn PushConnector>,
) -> (mpsc::Sender<SessionCommand>, mpsc::Receiver<SessionEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<SessionCommand>(64);
    let (event_tx, event_rx) = mpsc::channel::<SessionEvent>(256);
    let (fetch_tx, fetch_rx) = mpsc::channel::<FetchResult>(32);

    let session = Session {
        config,
        api,
        connector,
        state: ChatState::new(),
        stream: None,
        stream_conversation: None,
        link: LinkState::Disconnected,
        reconnect: None,
        generation: 0,
        fetch_tx,
        events: event_tx,
    };

    tokio::spawn(session.run(cmd_rx, fetch_rx));

    (cmd_tx, event_rx)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    History,
    Older,
}

/// Completion of a history fetch task, tagged with the activation
/// generation it was issued for so superseded responses can be discarded.
struct FetchResult {
    generation: u64,
    conversation: ConversationId,
    kind: FetchKind,
    result: Result<MessageBatch, ApiError>,
}

struct ReconnectTimer {
    conversation: ConversationId,
    sleep: Pin<Box<Sleep>>,
}

struct Session {
    config: ClientConfig,
    api: Arc<dyn ChatApi>,
    connector: Arc<dyn PushConnector>,
    state: ChatState,
    stream: Option<Box<dyn PushStream>>,
    /// Which conversation the live stream was opened for; the reconnect
    /// timer is tagged with this, not with whatever is active later.
    stream_conversation: Option<ConversationId>,
    link: LinkState,
    reconnect: Option<ReconnectTimer>,
    /// Bumped on every activation; stale fetch results carry an older value.
    generation: u64,
    fetch_tx: mpsc::Sender<FetchResult>,
    events: mpsc::Sender<SessionEvent>,
}

impl Session {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut fetches: mpsc::Receiver<FetchResult>,
    ) {
        info!("Chat session started");

        loop {
            tokio::select! {
                cmd = commands.recv() => {
                    match cmd {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }

                Some(fetched) = fetches.recv() => {
                    self.handle_fetch(fetched).await;
                }

                frame = Self::next_frame(&mut self.stream), if self.stream.is_some() => {
                    match frame {
                        Some(raw) => self.handle_frame(raw).await,
                        None => self.on_stream_closed().await,
                    }
                }

                conversation = Self::reconnect_due(&mut self.reconnect), if self.reconnect.is_some() => {
                    self.on_reconnect_due(conversation).await;
                }
            }
        }

        self.teardown().await;
        info!("Chat session ended");
    }

    async fn next_frame(stream: &mut Option<Box<dyn PushStream>>) -> Option<String> {
        match stream.as_mut() {
            Some(stream) => stream.next_frame().await,
            // Branch is disabled by its select! guard when no stream exists.
            None => std::future::pending().await,
        }
    }

    async fn reconnect_due(timer: &mut Option<ReconnectTimer>) -> ConversationId {
        match timer.as_mut() {
            Some(timer) => {
                timer.sleep.as_mut().await;
                timer.conversation
            }
            None => std::future::pending().await,
        }
    }

    async fn handle_command(&mut self, cmd: SessionCommand) {
        match cmd {
            SessionCommand::Refresh => self.refresh().await,
            SessionCommand::Open(id) => self.open(id).await,
            SessionCommand::LoadOlder => self.load_older(),
            SessionCommand::Send(text) => {
                let outcome = self.send_message(&text).await;
                self.emit(SessionEvent::SendFinished(outcome)).await;
            }
            SessionCommand::StartConversation(announcement) => {
                self.start_conversation(announcement).await;
            }
            // Handled by the run loop before dispatch.
            SessionCommand::Shutdown => {}
        }
    }

    // -- Conversation list ---------------------------------------------------

    async fn refresh(&mut self) {
        match self
            .api
            .list_conversations(1, CONVERSATION_PAGE_SIZE)
            .await
        {
            Ok(page) => {
                self.state.replace_conversations(page.results);
                self.emit_conversations().await;
                if self.state.active().is_none() {
                    if let Some(first) = self.state.first_conversation() {
                        self.open(first).await;
                    }
                }
            }
            Err(e) => {
                // Prior state stays intact; the failure is only surfaced as
                // a notification.
                warn!(error = %e, "Failed to load conversations");
                self.notice(NoticeLevel::Error, "Failed to load conversations")
                    .await;
            }
        }
    }

    async fn start_conversation(&mut self, announcement: AnnouncementId) {
        match self.api.start_conversation(announcement).await {
            Ok(conversation) => {
                let id = conversation.id;
                self.state.upsert_conversation(conversation.clone());
                self.emit(SessionEvent::ConversationStarted(conversation)).await;
                self.emit_conversations().await;
                self.open(id).await;
            }
            Err(e) => {
                warn!(announcement = %announcement, error = %e, "Failed to start conversation");
                self.notice(NoticeLevel::Error, "Failed to start conversation")
                    .await;
            }
        }
    }

    // -- Active conversation -------------------------------------------------

    async fn open(&mut self, id: ConversationId) {
        if self.state.active() == Some(id) && self.state.log_phase() == LogPhase::Ready {
            return;
        }
        info!(conversation = %id, "Opening conversation");
        self.state.activate(id);
        self.generation += 1;
        self.spawn_fetch(id, FetchKind::History, None);
        self.connect(id).await;
    }

    fn load_older(&mut self) {
        let Some(conversation) = self.state.active() else {
            return;
        };
        if self.state.log_phase() != LogPhase::Ready {
            return;
        }
        let Some(cursor) = self.state.older_cursor() else {
            return;
        };
        self.spawn_fetch(conversation, FetchKind::Older, Some(cursor));
    }

    fn spawn_fetch(
        &self,
        conversation: ConversationId,
        kind: FetchKind,
        before: Option<MessageId>,
    ) {
        let api = Arc::clone(&self.api);
        let tx = self.fetch_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = api
                .list_messages(conversation, MESSAGE_HISTORY_LIMIT, before)
                .await;
            let _ = tx
                .send(FetchResult {
                    generation,
                    conversation,
                    kind,
                    result,
                })
                .await;
        });
    }

    async fn handle_fetch(&mut self, fetched: FetchResult) {
        if fetched.generation != self.generation {
            debug!(
                conversation = %fetched.conversation,
                "Ignoring superseded history fetch"
            );
            return;
        }

        match (fetched.kind, fetched.result) {
            (FetchKind::History, Ok(batch)) => {
                if !self
                    .state
                    .load_history(fetched.conversation, batch.results, batch.next_before_id)
                {
                    return;
                }
                self.emit(SessionEvent::MessagesLoaded {
                    conversation: fetched.conversation,
                    messages: self.state.messages().to_vec(),
                })
                .await;
                // Opening a conversation counts as reading it, whatever the
                // mark-read request ends up doing.
                self.state.mark_local_unread_cleared(fetched.conversation);
                self.emit(SessionEvent::UnreadCleared(fetched.conversation)).await;
                self.emit_conversations().await;
                self.mark_read_best_effort(fetched.conversation).await;
            }
            (FetchKind::History, Err(e)) => {
                warn!(conversation = %fetched.conversation, error = %e, "Failed to load messages");
                self.state.history_failed(fetched.conversation);
                self.notice(NoticeLevel::Error, "Failed to load messages").await;
            }
            (FetchKind::Older, Ok(batch)) => {
                let added = self.state.prepend_older(
                    fetched.conversation,
                    batch.results,
                    batch.next_before_id,
                );
                if added > 0 {
                    self.emit(SessionEvent::OlderMessagesLoaded {
                        conversation: fetched.conversation,
                        messages: self.state.messages().to_vec(),
                    })
                    .await;
                }
            }
            (FetchKind::Older, Err(e)) => {
                warn!(conversation = %fetched.conversation, error = %e, "Failed to load older messages");
                self.notice(NoticeLevel::Error, "Failed to load older messages")
                    .await;
            }
        }
    }

    // -- Push transport ------------------------------------------------------

    async fn connect(&mut self, conversation: ConversationId) {
        self.drop_stream().await;

        let Some(credential) = self.config.access_token.clone() else {
            debug!("No credential; push transport stays down");
            return;
        };

        self.set_link(LinkState::Connecting).await;
        let attempt = tokio::time::timeout(
            CONNECT_TIMEOUT,
            self.connector.connect(conversation, &credential),
        )
        .await;
        match attempt {
            Ok(Ok(stream)) => {
                self.stream = Some(stream);
                self.stream_conversation = Some(conversation);
                self.set_link(LinkState::Connected).await;
            }
            Ok(Err(e)) => {
                warn!(conversation = %conversation, error = %e, "Push connect failed");
                self.set_link(LinkState::Disconnected).await;
                self.schedule_reconnect(conversation);
            }
            Err(_) => {
                warn!(conversation = %conversation, "Push connect timed out");
                self.set_link(LinkState::Disconnected).await;
                self.schedule_reconnect(conversation);
            }
        }
    }

    /// Idempotent teardown: close the live stream (if any) and cancel the
    /// pending reconnect (if any). Always called before a new connect.
    async fn drop_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close().await;
        }
        self.stream_conversation = None;
        self.reconnect = None;
    }

    async fn teardown(&mut self) {
        self.drop_stream().await;
        self.state.deactivate();
        self.set_link(LinkState::Disconnected).await;
    }

    async fn on_stream_closed(&mut self) {
        let conversation = self.stream_conversation.take();
        self.stream = None;
        self.set_link(LinkState::Disconnected).await;
        if let Some(conversation) = conversation {
            info!(conversation = %conversation, "Push transport closed; reconnect scheduled");
            self.schedule_reconnect(conversation);
        }
    }

    fn schedule_reconnect(&mut self, conversation: ConversationId) {
        self.reconnect = Some(ReconnectTimer {
            conversation,
            sleep: Box::pin(sleep(RECONNECT_DELAY)),
        });
    }

    async fn on_reconnect_due(&mut self, conversation: ConversationId) {
        self.reconnect = None;
        if self.state.active() == Some(conversation) {
            self.connect(conversation).await;
        } else {
            debug!(
                conversation = %conversation,
                "Suppressing reconnect for abandoned conversation"
            );
        }
    }

    async fn handle_frame(&mut self, raw: String) {
        match decode_frame(&raw) {
            Ok(PushEvent::Message(push)) => self.apply_inbound(Message::from(push)).await,
            Ok(PushEvent::Other) => debug!("Ignoring non-message push event"),
            Err(e) => debug!(error = %e, "Dropping malformed push frame"),
        }
    }

    async fn apply_inbound(&mut self, message: Message) {
        let conversation = message.conversation_id;
        match self.state.apply_inbound(&message, self.config.user_id) {
            Inbound::Duplicate => {
                debug!(message = %message.id, "Duplicate push message ignored");
            }
            Inbound::Active { from_counterpart } => {
                self.emit(SessionEvent::MessageAppended(message)).await;
                self.emit(SessionEvent::UnreadCleared(conversation)).await;
                self.emit_conversations().await;
                if from_counterpart {
                    self.mark_read_best_effort(conversation).await;
                }
            }
            Inbound::Inactive => {
                self.emit_conversations().await;
                self.notice(NoticeLevel::Info, "New message").await;
            }
        }
    }

    async fn mark_read_best_effort(&self, conversation: ConversationId) {
        if let Err(e) = self.api.mark_conversation_read(conversation).await {
            debug!(conversation = %conversation, error = %e, "Mark-read failed (ignored)");
        }
    }

    // -- Send path -----------------------------------------------------------

    async fn send_message(&mut self, text: &str) -> SendOutcome {
        let text = text.trim();
        if text.is_empty() {
            return SendOutcome::Ignored;
        }
        let Some(conversation) = self.state.active() else {
            return SendOutcome::Ignored;
        };

        if self.link == LinkState::Connected {
            // Primary path: no local append; the server echo is the single
            // source of truth for the message id and timestamp.
            let frame = match serde_json::to_string(&OutboundChat::message(text)) {
                Ok(frame) => frame,
                Err(e) => {
                    error!(error = %e, "Failed to encode outbound frame");
                    self.notice(NoticeLevel::Error, "Failed to send message").await;
                    return SendOutcome::Failed;
                }
            };
            let result = match self.stream.as_mut() {
                Some(stream) => stream.send_text(frame).await,
                None => Err(TransportError::NotConnected),
            };
            match result {
                Ok(()) => SendOutcome::EchoPending,
                Err(e) => {
                    error!(conversation = %conversation, error = %e, "Push send failed");
                    self.notice(NoticeLevel::Error, "Failed to send message").await;
                    SendOutcome::Failed
                }
            }
        } else {
            // Fallback path: no echo will arrive through a transport that is
            // down, so the canonical response message is appended directly.
            match self.api.send_message(conversation, text).await {
                Ok(message) => {
                    if self.state.append_local(message.clone()) {
                        self.emit(SessionEvent::MessageAppended(message.clone())).await;
                        self.emit_conversations().await;
                    }
                    SendOutcome::Delivered(message)
                }
                Err(e) => {
                    error!(conversation = %conversation, error = %e, "Fallback send failed");
                    self.notice(NoticeLevel::Error, "Failed to send message").await;
                    SendOutcome::Failed
                }
            }
        }
    }

    // -- Event helpers -------------------------------------------------------

    async fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event).await;
    }

    async fn emit_conversations(&self) {
        self.emit(SessionEvent::ConversationsUpdated(
            self.state.conversations().to_vec(),
        ))
        .await;
    }

    async fn notice(&self, level: NoticeLevel, text: &str) {
        self.emit(SessionEvent::Notice {
            level,
            text: text.to_string(),
        })
        .await;
    }

    async fn set_link(&mut self, link: LinkState) {
        if self.link != link {
            self.link = link;
            self.emit(SessionEvent::LinkChanged(link)).await;
        }
    }
}
