use super::{ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::filters::AllOf;
use crate::core::formatters::{format_chat_time, initials};
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{ChatMessage, NewChatMessage};
use crate::query_key;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatRow {
    pub message: ChatMessage,
    pub initials: String,
    pub time: String,
    /// Sender and text of the message this one replies to, when still present.
    pub reply_preview: Option<(String, String)>,
}

#[derive(Deserialize)]
struct SendVariables {
    team_id: i64,
    message: NewChatMessage,
}

fn send_message(variables: Value) -> AppResult<Command> {
    let SendVariables { team_id, message } = serde_json::from_value(variables)?;
    Ok(Command::SendMessage { team_id, message })
}

fn sender_initials(name: &str) -> String {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default();
    let last = parts.last().unwrap_or_default();
    initials(first, last)
}

/// Team chat. Polls the message list while mounted; dropping the view stops
/// the polling.
pub struct ChatView {
    ctx: ViewContext,
    team_id: i64,
    messages: ResourceView<Vec<ChatMessage>>,
    send: Mutation,
    draft: String,
    urgent: bool,
    reply_to: Option<i64>,
}

impl ChatView {
    pub fn key(team_id: i64) -> QueryKey {
        query_key!["teams", team_id, "messages"]
    }

    pub fn mount(ctx: &ViewContext, team_id: i64) -> Self {
        let options =
            QueryOptions::default().with_poll_interval(ctx.config.chat.poll_interval());
        Self {
            ctx: ctx.clone(),
            team_id,
            messages: ResourceView::mount(ctx, Self::key(team_id), options),
            send: ctx.command_mutation("send message", vec![Self::key(team_id)], send_message),
            draft: String::new(),
            urgent: false,
            reply_to: None,
        }
    }

    pub fn team_id(&self) -> i64 {
        self.team_id
    }

    pub fn is_polling(&self) -> bool {
        self.messages.is_polling()
    }

    pub fn render(&self) -> AppResult<ListView<ChatRow>> {
        let view = self.messages.render(&AllOf::<ChatMessage>::new())?;
        let previews: Vec<Option<(String, String)>> = {
            let by_id: HashMap<i64, &ChatMessage> =
                view.items().iter().map(|message| (message.id, message)).collect();
            view.items()
                .iter()
                .map(|message| {
                    message
                        .reply_to_id
                        .and_then(|id| by_id.get(&id))
                        .map(|parent| (parent.sender_name.clone(), parent.message.clone()))
                })
                .collect()
        };

        let mut previews = previews.into_iter();
        Ok(view.map(|message| ChatRow {
            initials: sender_initials(&message.sender_name),
            time: format_chat_time(message.created_at),
            reply_preview: previews.next().flatten(),
            message,
        }))
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_urgent(&mut self, urgent: bool) {
        self.urgent = urgent;
    }

    pub fn reply_to(&mut self, message_id: Option<i64>) {
        self.reply_to = message_id;
    }

    pub fn is_sending(&self) -> bool {
        self.send.is_pending()
    }

    /// Send the current draft. A blank draft is rejected before any request
    /// is made; success clears the draft, the urgent flag and the reply.
    pub async fn send(&mut self) -> AppResult<ChatMessage> {
        let message = NewChatMessage::new(&self.draft)
            .urgent(self.urgent)
            .reply_to(self.reply_to);
        message.validate()?;

        let variables = json!({ "team_id": self.team_id, "message": message });
        let result = self
            .send
            .mutate(variables)
            .await
            .and_then(|value| Ok(serde_json::from_value::<ChatMessage>(value)?));

        match result {
            Ok(sent) => {
                let description = if self.urgent {
                    "Urgent message delivered to all team members"
                } else {
                    "Message sent successfully"
                };
                self.ctx.toaster.push(Notice::info("Message sent", description));
                self.draft.clear();
                self.urgent = false;
                self.reply_to = None;
                Ok(sent)
            }
            Err(err) => {
                self.ctx.toaster.push(Notice::error("Error", "Failed to send message"));
                Err(err)
            }
        }
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<ChatMessage>> {
        &mut self.messages
    }
}
