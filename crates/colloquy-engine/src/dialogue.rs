// SPDX-FileCopyrightText: 2026 Colloquy Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dialogue engine: send, read, commit and roll back messages.
//!
//! Every write that touches more than one table runs in a single SQLite
//! transaction, so a message never exists without its outbox event and a
//! command is never applied without its ledger entry.

use colloquy_core::{
    ChatId, ColloquyError, CommandKind, CommandOutcome, CorrelationId, GetMessages, Message,
    MessageCommand, MessageId, MessageState, NewMessage, NewUnreadMessage, OutboxEvent,
    RequestContext, SendMessage, UserId,
};
use colloquy_storage::queries::{commands, messages, outbox};
use colloquy_storage::{Database, TxOutcome};
use tracing::{debug, info, warn};

/// Stateless orchestrator over the message store, outbox and command ledger.
#[derive(Clone)]
pub struct DialogueEngine {
    db: Database,
}

fn require_user(field: &str, user: &UserId) -> Result<(), ColloquyError> {
    if user.as_str().trim().is_empty() {
        return Err(ColloquyError::InvalidInput(format!("{field} must not be empty")));
    }
    // User ids end up in the chat id, which is the broker record key.
    if user.as_str().chars().any(char::is_control) {
        return Err(ColloquyError::InvalidInput(format!(
            "{field} must not contain control characters"
        )));
    }
    Ok(())
}

impl DialogueEngine {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store a pending message together with its unread-message event.
    ///
    /// Both rows are written in one transaction; on any failure neither exists.
    pub async fn send_message(
        &self,
        ctx: &RequestContext,
        cmd: SendMessage,
    ) -> Result<MessageId, ColloquyError> {
        require_user("fromUserId", &cmd.from)?;
        require_user("toUserId", &cmd.to)?;

        let message = NewMessage::pending(cmd.from, cmd.to, cmd.text);
        let chat_id = message.chat_id.clone();
        let recipient = message.to_user_id.clone();
        let correlation_id = CorrelationId::generate();
        let event_chat = chat_id.clone();
        let event_correlation = correlation_id.clone();

        let id = self
            .db
            .transaction(move |tx| {
                let id = messages::insert(tx, &message)?;
                let event = OutboxEvent::NewUnreadMessage(NewUnreadMessage {
                    correlation_id: event_correlation,
                    user_id: recipient,
                    chat_id: event_chat,
                    message_id: id,
                });
                outbox::insert(tx, &event)?;
                Ok(TxOutcome::Commit(id))
            })
            .await?;

        info!(
            request_id = %ctx.request_id,
            origin = ctx.origin,
            message_id = %id,
            chat_id = %chat_id,
            correlation_id = %correlation_id,
            "message stored as pending"
        );
        #[cfg(feature = "prometheus")]
        colloquy_prometheus::record_message_sent();

        Ok(id)
    }

    /// Sent messages of the chat between two users, newest first.
    pub async fn get_messages(
        &self,
        ctx: &RequestContext,
        query: GetMessages,
    ) -> Result<Vec<Message>, ColloquyError> {
        require_user("fromUserId", &query.from)?;
        require_user("toUserId", &query.to)?;

        let chat_id = ChatId::for_participants(&query.from, &query.to);
        let found = messages::chat_messages(&self.db, &chat_id, MessageState::Sent).await?;
        debug!(
            request_id = %ctx.request_id,
            chat_id = %chat_id,
            count = found.len(),
            "messages loaded"
        );
        Ok(found)
    }

    /// Mark a pending message sent. Idempotent per correlation id.
    pub async fn commit_message(
        &self,
        ctx: &RequestContext,
        cmd: MessageCommand,
    ) -> Result<CommandOutcome, ColloquyError> {
        self.apply(ctx, CommandKind::Commit, cmd).await
    }

    /// Mark a pending message removed. Idempotent per correlation id.
    pub async fn rollback_message(
        &self,
        ctx: &RequestContext,
        cmd: MessageCommand,
    ) -> Result<CommandOutcome, ColloquyError> {
        self.apply(ctx, CommandKind::Rollback, cmd).await
    }

    /// Apply a commit or rollback at most once per correlation id.
    ///
    /// The ledger lookup up front skips the transaction for the common
    /// redelivery case. Inside the transaction the ledger insert is the real
    /// guard: if a concurrent delivery recorded the id first, the primary key
    /// refuses the insert and everything rolls back.
    pub async fn apply(
        &self,
        ctx: &RequestContext,
        kind: CommandKind,
        cmd: MessageCommand,
    ) -> Result<CommandOutcome, ColloquyError> {
        if cmd.correlation_id.as_str().trim().is_empty() {
            return Err(ColloquyError::InvalidInput(
                "correlationId must not be empty".into(),
            ));
        }

        if commands::is_handled(&self.db, &cmd.correlation_id).await? {
            debug!(
                request_id = %ctx.request_id,
                correlation_id = %cmd.correlation_id,
                command = %kind,
                "command already handled"
            );
            return Ok(CommandOutcome::AlreadyHandled);
        }

        let target = kind.target_state();
        let correlation_id = cmd.correlation_id.clone();
        let message_id = cmd.message_id;

        let outcome = self
            .db
            .transaction(move |tx| {
                let Some(message) = messages::find(tx, message_id)? else {
                    return Ok(TxOutcome::Rollback(Err(ColloquyError::MessageNotFound {
                        id: message_id.0,
                    })));
                };
                if !commands::record(tx, &correlation_id)? {
                    return Ok(TxOutcome::Rollback(Ok(CommandOutcome::AlreadyHandled)));
                }
                if messages::transition_from_pending(tx, message_id, target)? {
                    Ok(TxOutcome::Commit(Ok(CommandOutcome::Applied { to: target })))
                } else {
                    Ok(TxOutcome::Commit(Ok(CommandOutcome::AlreadyTerminal(
                        message.state,
                    ))))
                }
            })
            .await??;

        match outcome {
            CommandOutcome::Applied { to } => info!(
                request_id = %ctx.request_id,
                correlation_id = %cmd.correlation_id,
                message_id = %cmd.message_id,
                command = %kind,
                state = %to,
                "command applied"
            ),
            CommandOutcome::AlreadyHandled => debug!(
                request_id = %ctx.request_id,
                correlation_id = %cmd.correlation_id,
                command = %kind,
                "command lost the race to a concurrent delivery"
            ),
            CommandOutcome::AlreadyTerminal(state) => warn!(
                request_id = %ctx.request_id,
                correlation_id = %cmd.correlation_id,
                message_id = %cmd.message_id,
                command = %kind,
                state = %state,
                "message already terminal, command recorded without effect"
            ),
        }

        Ok(outcome)
    }
}
