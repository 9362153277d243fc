use super::{FormState, ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::descriptors::{Describe, Descriptor};
use crate::core::filters::{count, AllOf, FieldMatch, SearchText, Selection};
use crate::core::formatters::{format_clock_time, format_event_date};
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{Event, EventType, NewEvent};
use crate::query_key;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EventRow {
    pub event: Event,
    pub kind: Descriptor,
    pub status: Descriptor,
    pub date: String,
    pub time: String,
    pub teams: String,
}

impl From<Event> for EventRow {
    fn from(event: Event) -> Self {
        Self {
            kind: event.kind.descriptor(),
            status: event.status.descriptor(),
            date: format_event_date(&event.date),
            time: format_clock_time(&event.time),
            teams: event.teams.join(" vs "),
            event,
        }
    }
}

fn create_event(variables: Value) -> AppResult<Command> {
    Ok(Command::CreateEvent(serde_json::from_value(variables)?))
}

fn kind_of(event: &Event) -> Option<EventType> {
    Some(event.kind.clone())
}

/// Event list with a type filter and per-type counts.
pub struct ScheduleView {
    ctx: ViewContext,
    events: ResourceView<Vec<Event>>,
    create: Mutation,
    search: SearchText,
    kind: Selection<EventType>,
    form: FormState,
}

impl ScheduleView {
    pub fn key() -> QueryKey {
        query_key!["events"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        let create = ctx.command_mutation(
            "create event",
            vec![Self::key(), query_key!["dashboard"]],
            create_event,
        );
        Self {
            ctx: ctx.clone(),
            events: ResourceView::mount(ctx, Self::key(), QueryOptions::default()),
            create,
            search: SearchText::default(),
            kind: Selection::All,
            form: FormState::default(),
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = SearchText::new(text);
    }

    /// Accepts an event type or `"all"`.
    pub fn set_type_filter(&mut self, raw: &str) {
        self.kind = Selection::parse(raw);
    }

    pub fn render(&self) -> AppResult<ListView<EventRow>> {
        let filter: AllOf<'_, Event> = AllOf::new()
            .and(&self.search)
            .and(FieldMatch::new(self.kind.clone(), kind_of));
        Ok(self.events.render(&filter)?.map(EventRow::from))
    }

    /// Count per known event type, ignoring the active filters.
    pub fn type_counts(&self) -> AppResult<Vec<(EventType, usize)>> {
        let events = self.events.records()?;
        Ok(EventType::KNOWN
            .iter()
            .map(|name| {
                let kind = EventType::from(*name);
                let total = count(&events, &FieldMatch::new(Selection::Only(kind.clone()), kind_of));
                (kind, total)
            })
            .collect())
    }

    pub fn total(&self) -> AppResult<usize> {
        Ok(self.events.records()?.len())
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<Event>> {
        &mut self.events
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

    pub async fn submit(&mut self, draft: NewEvent) -> AppResult<Event> {
        let validation = draft.validate();
        self.form
            .submit(
                &self.create,
                &self.ctx.toaster,
                &draft,
                validation,
                Notice::info("Event Created", "New event has been successfully scheduled."),
                "Failed to create event. Please try again.",
            )
            .await
    }
}
