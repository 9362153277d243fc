use super::{FormState, ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::descriptors::{Describe, Descriptor};
use crate::core::filters::{count, AllOf, FieldMatch, ReadTab, SearchText, Selection};
use crate::core::formatters::relative_time;
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{NewNotification, Notification, NotificationCategory};
use crate::query_key;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationRow {
    pub notification: Notification,
    pub kind: Descriptor,
    pub category: Descriptor,
    pub priority: Descriptor,
    pub age: String,
}

impl NotificationRow {
    fn new(notification: Notification, now: NaiveDateTime) -> Self {
        Self {
            kind: notification.kind.descriptor(),
            category: notification.category.descriptor(),
            priority: notification.priority.descriptor(),
            age: relative_time(notification.timestamp, now),
            notification,
        }
    }
}

#[derive(Deserialize)]
struct MarkRead {
    id: i64,
}

fn mark_read_command(variables: Value) -> AppResult<Command> {
    let MarkRead { id } = serde_json::from_value(variables)?;
    Ok(Command::MarkNotificationRead { id })
}

fn create_notification(variables: Value) -> AppResult<Command> {
    Ok(Command::CreateNotification(serde_json::from_value(variables)?))
}

/// Flip `read` on the cached copy of one notification.
fn mark_read_locally(cached: Option<&Value>, variables: &Value) -> Value {
    let mut records = cached.cloned().unwrap_or_else(|| json!([]));
    if let Some(items) = records.as_array_mut() {
        for item in items.iter_mut().filter(|item| item["id"] == variables["id"]) {
            item["read"] = Value::Bool(true);
        }
    }
    records
}

fn category_of(notification: &Notification) -> Option<NotificationCategory> {
    Some(notification.category.clone())
}

/// Notification center: read-state tabs, category filter, search and
/// mark-as-read.
pub struct NotificationsView {
    ctx: ViewContext,
    notifications: ResourceView<Vec<Notification>>,
    mark_read: Mutation,
    create: Mutation,
    tab: ReadTab,
    category: Selection<NotificationCategory>,
    search: SearchText,
    form: FormState,
}

impl NotificationsView {
    pub fn key() -> QueryKey {
        query_key!["notifications"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        let mark_read = ctx
            .command_mutation(
                "mark notification read",
                vec![Self::key(), query_key!["dashboard"]],
                mark_read_command,
            )
            .optimistic(Self::key(), mark_read_locally);
        let create = ctx.command_mutation(
            "create notification",
            vec![Self::key(), query_key!["dashboard"]],
            create_notification,
        );
        Self {
            ctx: ctx.clone(),
            notifications: ResourceView::mount(ctx, Self::key(), QueryOptions::default()),
            mark_read,
            create,
            tab: ReadTab::All,
            category: Selection::All,
            search: SearchText::default(),
            form: FormState::default(),
        }
    }

    pub fn set_tab(&mut self, tab: ReadTab) {
        self.tab = tab;
    }

    pub fn tab(&self) -> ReadTab {
        self.tab
    }

    pub fn set_category_filter(&mut self, raw: &str) {
        self.category = Selection::parse(raw);
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = SearchText::new(text);
    }

    pub fn render(&self) -> AppResult<ListView<NotificationRow>> {
        let filter: AllOf<'_, Notification> = AllOf::new()
            .and(self.tab)
            .and(FieldMatch::new(self.category.clone(), category_of))
            .and(&self.search);
        let now = self.ctx.clock.now_naive();
        Ok(self
            .notifications
            .render(&filter)?
            .map(|notification| NotificationRow::new(notification, now)))
    }

    /// Badge count; ignores the active tab and filters.
    pub fn unread_count(&self) -> AppResult<usize> {
        Ok(count(&self.notifications.records()?, &ReadTab::Unread))
    }

    /// Optimistically marks the notification read, then confirms with the
    /// backend. A failure restores the previous list.
    pub async fn mark_read(&self, id: i64) -> AppResult<Notification> {
        let result = self
            .mark_read
            .mutate(json!({ "id": id }))
            .await
            .and_then(|value| Ok(serde_json::from_value(value)?));
        if result.is_err() {
            self.ctx
                .toaster
                .push(Notice::error("Error", "Failed to mark notification as read"));
        }
        result
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<Notification>> {
        &mut self.notifications
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn open_form(&mut self) {
        self.form.open();
    }

    pub fn close_form(&mut self) {
        self.form.close();
    }

    pub fn is_submitting(&self) -> bool {
        self.create.is_pending()
    }

    pub async fn submit(&mut self, draft: NewNotification) -> AppResult<Notification> {
        let validation = draft.validate();
        self.form
            .submit(
                &self.create,
                &self.ctx.toaster,
                &draft,
                validation,
                Notice::info("Notification Sent", "Notification has been successfully sent."),
                "Failed to send notification. Please try again.",
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_read_locally() {
        let cached = json!([
            {"id": 1, "read": false},
            {"id": 2, "read": false}
        ]);
        let next = mark_read_locally(Some(&cached), &json!({"id": 2}));
        assert_eq!(next[0]["read"], false);
        assert_eq!(next[1]["read"], true);

        assert_eq!(mark_read_locally(None, &json!({"id": 2})), json!([]));
    }
}
