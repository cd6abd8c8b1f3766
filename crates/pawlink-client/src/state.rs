//! In-memory view state for the chat session.
//!
//! Single-writer: only the session task mutates this, from interleaved
//! async callbacks, so every operation is an idempotent, order-tolerant
//! merge — duplicate or re-ordered deliveries must be harmless.

use tracing::debug;

use pawlink_shared::models::{Conversation, LastMessage, Message};
use pawlink_shared::types::{ConversationId, MessageId, UserId};

/// Lifecycle of the active conversation's message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogPhase {
    /// No log loaded (also the state after a failed load, so the user can
    /// retry by reselecting the conversation).
    Idle,
    /// History fetch in flight.
    Loading,
    /// History loaded; inbound messages append here.
    Ready,
}

impl Default for LogPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// What [`ChatState::apply_inbound`] did with a push message; the session
/// decides on mark-read calls and notifications from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// Already seen this message id; nothing changed.
    Duplicate,
    /// Appended to the active conversation's log.
    Active { from_counterpart: bool },
    /// Belongs to a conversation that is not currently open.
    Inactive,
}

#[derive(Debug, Default)]
pub struct ChatState {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    messages: Vec<Message>,
    log: LogPhase,
    older_cursor: Option<MessageId>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn active(&self) -> Option<ConversationId> {
        self.active
    }

    pub fn log_phase(&self) -> LogPhase {
        self.log
    }

    /// Cursor for paging further back through the active conversation's
    /// history; `None` once the oldest page has been reached.
    pub fn older_cursor(&self) -> Option<MessageId> {
        self.older_cursor
    }

    pub fn conversation(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn first_conversation(&self) -> Option<ConversationId> {
        self.conversations.first().map(|c| c.id)
    }

    /// Replace the list wholesale (refresh) and restore the ordering
    /// invariant.
    pub fn replace_conversations(&mut self, items: Vec<Conversation>) {
        self.conversations = items;
        self.sort_conversations();
    }

    /// Insert or replace a single conversation (start-conversation flow;
    /// the backend guarantees one conversation per announcement/pair, so a
    /// restart returns the existing row).
    pub fn upsert_conversation(&mut self, conversation: Conversation) {
        match self.conversations.iter_mut().find(|c| c.id == conversation.id) {
            Some(slot) => *slot = conversation,
            None => self.conversations.push(conversation),
        }
        self.sort_conversations();
    }

    /// Make `id` the active conversation and reset the log for a fresh
    /// history fetch.
    pub fn activate(&mut self, id: ConversationId) {
        self.active = Some(id);
        self.messages.clear();
        self.older_cursor = None;
        self.log = LogPhase::Loading;
    }

    /// Install a freshly fetched history. Ignored if `conversation` is no
    /// longer the active one (a stale response must never overwrite a newer
    /// activation's log).
    pub fn load_history(
        &mut self,
        conversation: ConversationId,
        messages: Vec<Message>,
        older_cursor: Option<MessageId>,
    ) -> bool {
        if self.active != Some(conversation) {
            debug!(conversation = %conversation, "Discarding stale history");
            return false;
        }
        self.messages = messages;
        self.older_cursor = older_cursor;
        self.log = LogPhase::Ready;
        true
    }

    /// A history fetch failed: back to `Idle` with an empty log so the user
    /// can retry by reselecting.
    pub fn history_failed(&mut self, conversation: ConversationId) {
        if self.active == Some(conversation) {
            self.messages.clear();
            self.log = LogPhase::Idle;
        }
    }

    /// Splice an older history page onto the front of the log. Returns how
    /// many messages were actually new.
    pub fn prepend_older(
        &mut self,
        conversation: ConversationId,
        older: Vec<Message>,
        next_cursor: Option<MessageId>,
    ) -> usize {
        if self.active != Some(conversation) || self.log != LogPhase::Ready {
            return 0;
        }
        let fresh: Vec<Message> = older
            .into_iter()
            .filter(|m| !self.messages.iter().any(|have| have.id == m.id))
            .collect();
        let added = fresh.len();
        self.messages.splice(0..0, fresh);
        self.older_cursor = next_cursor;
        added
    }

    /// Merge one push-delivered message into the view.
    ///
    /// Active conversation: append (dedup by id) and force unread to 0.
    /// Any other conversation: bump its unread once per distinct id. In
    /// both cases the owning conversation's summary is patched and the
    /// list re-sorted.
    pub fn apply_inbound(&mut self, message: &Message, local_user: UserId) -> Inbound {
        if self.active == Some(message.conversation_id) {
            if self.messages.iter().any(|m| m.id == message.id) {
                return Inbound::Duplicate;
            }
            self.messages.push(message.clone());
            self.patch_summary(message);
            self.set_unread(message.conversation_id, 0);
            self.sort_conversations();
            Inbound::Active {
                from_counterpart: message.sender_id != local_user,
            }
        } else {
            // No log to dedup against for a background conversation; the
            // last-message summary carries the newest seen id instead.
            let seen = self
                .conversation(message.conversation_id)
                .and_then(|c| c.last_message.as_ref())
                .is_some_and(|last| last.id == message.id);
            if seen {
                return Inbound::Duplicate;
            }
            if let Some(conv) = self.conversation_mut(message.conversation_id) {
                conv.unread_count += 1;
            }
            self.patch_summary(message);
            self.sort_conversations();
            Inbound::Inactive
        }
    }

    /// Optimistically zero a conversation's unread badge. Idempotent; no
    /// network round-trip here.
    pub fn mark_local_unread_cleared(&mut self, id: ConversationId) {
        self.set_unread(id, 0);
    }

    /// Append a message obtained from the HTTP fallback send. Dedup-guarded
    /// so a stray echo for the same id later cannot double it.
    pub fn append_local(&mut self, message: Message) -> bool {
        if self.active != Some(message.conversation_id) {
            return false;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        self.patch_summary(&message);
        self.messages.push(message);
        self.sort_conversations();
        true
    }

    /// Tear down the active view (unmount / logout).
    pub fn deactivate(&mut self) {
        self.active = None;
        self.messages.clear();
        self.older_cursor = None;
        self.log = LogPhase::Idle;
    }

    fn conversation_mut(&mut self, id: ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| c.id == id)
    }

    fn set_unread(&mut self, id: ConversationId, value: u32) {
        if let Some(conv) = self.conversation_mut(id) {
            conv.unread_count = value;
        }
    }

    fn patch_summary(&mut self, message: &Message) {
        if let Some(conv) = self.conversation_mut(message.conversation_id) {
            conv.last_message = Some(LastMessage {
                id: message.id,
                text: message.text.clone(),
                created_at: message.created_at,
                sender_id: message.sender_id,
            });
            conv.updated_at = Some(message.created_at);
        }
    }

    /// Descending by activity timestamp; `sort_by` is stable, so ties keep
    /// their existing order.
    fn sort_conversations(&mut self) {
        self.conversations
            .sort_by(|a, b| b.activity_at().cmp(&a.activity_at()));
    }
}
