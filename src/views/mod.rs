// Resource views: each binds one or more cached queries, plus the mutations
// that change them, to renderable list state.

use crate::api::Command;
use crate::config::Config;
use crate::core::filters::{apply, Predicate};
use crate::error::{AppError, AppResult, ErrorKind};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::mutation::{Mutation, MutationAction};
use crate::infrastructure::query_cache::{QueryObserver, QueryOptions, QueryState};
use crate::infrastructure::query_client::QueryClient;
use crate::infrastructure::query_key::QueryKey;
use crate::infrastructure::traits::{Backend, QueryFetcher};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

pub mod chat;
pub mod dashboard;
pub mod facilities;
pub mod notifications;
pub mod players;
pub mod schedule;
pub mod teams;

pub use chat::{ChatRow, ChatView};
pub use dashboard::{DashboardSnapshot, DashboardView, StatCard};
pub use facilities::{FacilitiesView, FacilityRow};
pub use notifications::{NotificationRow, NotificationsView};
pub use players::{PlayerRow, PlayersView};
pub use schedule::{EventRow, ScheduleView};
pub use teams::{TeamRow, TeamsView};

#[derive(Debug, Clone, PartialEq)]
pub enum ListState<T> {
    Loading,
    Empty,
    Populated(Vec<T>),
}

/// What a list screen shows: the records (if any) and an error banner that
/// sits above stale data rather than replacing it.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView<T> {
    pub state: ListState<T>,
    pub error: Option<AppError>,
    pub is_refreshing: bool,
}

impl<T> ListView<T> {
    pub fn items(&self) -> &[T] {
        match &self.state {
            ListState::Populated(items) => items,
            _ => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.items().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items().is_empty()
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, ListState::Loading)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> ListView<U> {
        let state = match self.state {
            ListState::Loading => ListState::Loading,
            ListState::Empty => ListState::Empty,
            ListState::Populated(items) => ListState::Populated(items.into_iter().map(f).collect()),
        };
        ListView {
            state,
            error: self.error,
            is_refreshing: self.is_refreshing,
        }
    }
}

/// Render a list query through `predicate`. A missing resource shows as an
/// empty list, not as an error.
pub fn list_view<T, P>(state: &QueryState, predicate: &P) -> AppResult<ListView<T>>
where
    T: DeserializeOwned + Clone,
    P: Predicate<T> + ?Sized,
{
    let error = state
        .error
        .clone()
        .filter(|err| err.kind() != ErrorKind::NotFound);

    let list_state = match state.decode::<Vec<T>>()? {
        Some(records) => {
            let kept = apply(&records, predicate);
            if kept.is_empty() {
                ListState::Empty
            } else {
                ListState::Populated(kept)
            }
        }
        None if state.is_loading() => ListState::Loading,
        None => ListState::Empty,
    };

    Ok(ListView {
        is_refreshing: state.is_fetching && !matches!(list_state, ListState::Loading),
        state: list_state,
        error,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeVariant {
    Default,
    Destructive,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub variant: NoticeVariant,
}

impl Notice {
    pub fn info(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Default,
        }
    }

    pub fn error(title: &str, description: &str) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            variant: NoticeVariant::Destructive,
        }
    }
}

/// Collects notices raised by views. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct Toaster {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl Toaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        debug!("Notice: {} - {}", notice.title, notice.description);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Everything a view needs to mount: the shared query client, the backend
/// for reads and writes, a toaster and a clock for relative times.
#[derive(Clone)]
pub struct ViewContext {
    pub client: QueryClient,
    pub fetcher: Arc<dyn QueryFetcher>,
    pub backend: Arc<dyn Backend>,
    pub toaster: Toaster,
    pub clock: Clock,
    pub config: Config,
}

impl ViewContext {
    pub fn new<B: Backend + 'static>(
        client: QueryClient,
        backend: Arc<B>,
        toaster: Toaster,
        clock: Clock,
        config: Config,
    ) -> Self {
        Self {
            client,
            fetcher: backend.clone(),
            backend,
            toaster,
            clock,
            config,
        }
    }

    /// A mutation that turns its variables into a backend command.
    pub fn command_mutation(
        &self,
        label: &str,
        invalidates: Vec<QueryKey>,
        build: fn(Value) -> AppResult<Command>,
    ) -> Mutation {
        let action = Arc::new(CommandAction {
            backend: self.backend.clone(),
            build,
        });
        invalidates
            .into_iter()
            .fold(self.client.mutation(label, action), Mutation::invalidates)
    }
}

struct CommandAction {
    backend: Arc<dyn Backend>,
    build: fn(Value) -> AppResult<Command>,
}

#[async_trait]
impl MutationAction for CommandAction {
    async fn execute(&self, variables: Value) -> AppResult<Value> {
        let command = (self.build)(variables)?;
        command.validate()?;
        self.backend.send(command).await
    }
}

/// A mounted query whose payload decodes to `T`.
pub struct ResourceView<T> {
    observer: QueryObserver,
    _payload: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> ResourceView<T> {
    pub fn mount(ctx: &ViewContext, key: QueryKey, options: QueryOptions) -> Self {
        let observer = ctx
            .client
            .cache()
            .subscribe(key, ctx.fetcher.clone(), options);
        Self {
            observer,
            _payload: PhantomData,
        }
    }

    pub fn key(&self) -> &QueryKey {
        self.observer.key()
    }

    pub fn state(&self) -> QueryState {
        self.observer.state()
    }

    pub fn data(&self) -> AppResult<Option<T>> {
        self.observer.state().decode()
    }

    pub fn refetch(&self) -> bool {
        self.observer.refetch()
    }

    pub fn is_polling(&self) -> bool {
        self.observer.is_polling()
    }

    /// Wait until no fetch is running.
    pub async fn settled(&mut self) -> AppResult<QueryState> {
        self.observer.settled().await
    }

    /// Wait until the decoded payload satisfies `condition`.
    pub async fn wait_until<F>(&mut self, mut condition: F) -> AppResult<T>
    where
        F: FnMut(&T) -> bool,
    {
        let state = self
            .observer
            .wait_for(|state| {
                matches!(state.decode::<T>(), Ok(Some(ref payload)) if condition(payload))
            })
            .await?;
        state
            .decode()?
            .ok_or_else(|| AppError::Internal(format!("query {} lost its data", self.key())))
    }
}

impl<T: DeserializeOwned + Clone> ResourceView<Vec<T>> {
    pub fn records(&self) -> AppResult<Vec<T>> {
        Ok(self.data()?.unwrap_or_default())
    }

    pub fn render<P: Predicate<T> + ?Sized>(&self, predicate: &P) -> AppResult<ListView<T>> {
        list_view(&self.state(), predicate)
    }
}

/// Open/closed state of a create form and the error that kept it open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    pub is_open: bool,
    pub error: Option<AppError>,
}

impl FormState {
    pub fn open(&mut self) {
        self.is_open = true;
        self.error = None;
    }

    pub fn close(&mut self) {
        self.is_open = false;
        self.error = None;
    }

    /// Validate, run `mutation`, and update the form: success closes it and
    /// raises `success`; failure keeps it open with the error.
    pub async fn submit<D, T>(
        &mut self,
        mutation: &Mutation,
        toaster: &Toaster,
        draft: &D,
        validation: AppResult<()>,
        success: Notice,
        failure: &str,
    ) -> AppResult<T>
    where
        D: Serialize,
        T: DeserializeOwned,
    {
        if let Err(err) = validation {
            self.error = Some(err.clone());
            return Err(err);
        }

        let result = mutation
            .mutate_with(draft)
            .await
            .and_then(|value| serde_json::from_value(value).map_err(AppError::from));
        match result {
            Ok(record) => {
                self.close();
                toaster.push(success);
                Ok(record)
            }
            Err(err) => {
                self.error = Some(err.clone());
                toaster.push(Notice::error("Error", failure));
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::SearchText;
    use crate::infrastructure::query_cache::QueryStatus;
    use crate::models::Team;
    use serde_json::json;

    fn team_json(id: i64, name: &str) -> Value {
        json!({"id": id, "name": name, "sport": "soccer", "category": "U10"})
    }

    #[test]
    fn test_list_view_states() {
        let loading = list_view::<Team, _>(&QueryState::pending(), &SearchText::new("")).unwrap();
        assert!(loading.is_loading());

        let mut state = QueryState::pending();
        state.status = QueryStatus::Success;
        state.data = Some(Arc::new(json!([team_json(1, "Thunder Hawks"), team_json(2, "Red Sox Jr")])));
        let view = list_view::<Team, _>(&state, &SearchText::new("hawk")).unwrap();
        assert_eq!(view.len(), 1);
        assert_eq!(view.items()[0].name, "Thunder Hawks");

        let none = list_view::<Team, _>(&state, &SearchText::new("zzz")).unwrap();
        assert_eq!(none.state, ListState::Empty);
    }

    #[test]
    fn test_error_banner_keeps_stale_rows() {
        let mut state = QueryState::pending();
        state.status = QueryStatus::Error;
        state.data = Some(Arc::new(json!([team_json(1, "Thunder Hawks")])));
        state.error = Some(AppError::Network("connection reset".into()));
        let view = list_view::<Team, _>(&state, &SearchText::new("")).unwrap();
        assert_eq!(view.len(), 1);
        assert!(view.error.is_some());

        state.data = None;
        state.error = Some(AppError::NotFound("Team 9 not found".into()));
        let view = list_view::<Team, _>(&state, &SearchText::new("")).unwrap();
        assert_eq!(view.state, ListState::Empty);
        assert_eq!(view.error, None);
    }

    #[test]
    fn test_toaster_shared_between_clones() {
        let toaster = Toaster::new();
        let clone = toaster.clone();
        clone.push(Notice::info("Team Created", "New team has been successfully created."));
        assert_eq!(toaster.notices().len(), 1);
        assert_eq!(toaster.drain()[0].variant, NoticeVariant::Default);
        assert!(clone.last().is_none());
    }
}
