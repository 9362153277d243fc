// REST surface over the mock store, mounted under `/api`.

use crate::api::mock_store::MockStore;
use crate::error::{AppError, AppResult};
use crate::models::{
    ChatMessage, DashboardStats, Event, Facility, NewChatMessage, NewEvent, NewFacility,
    NewNotification, NewPlayer, NewTeam, Notification, Player, SessionUser, Team,
};
use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use std::sync::Arc;

type Store = State<Arc<MockStore>>;
type Created<T> = (StatusCode, Json<T>);

/// Malformed or incomplete bodies are reported as 400 with the usual error body.
fn payload<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

fn created<T>(value: T) -> Created<T> {
    (StatusCode::CREATED, Json(value))
}

pub async fn list_teams_handler(State(store): Store) -> Json<Vec<Team>> {
    Json(store.teams().await)
}

pub async fn get_team_handler(
    State(store): Store,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Team>, AppError> {
    Ok(Json(store.team(id).await?))
}

pub async fn create_team_handler(
    State(store): Store,
    body: Result<Json<NewTeam>, JsonRejection>,
) -> Result<Created<Team>, AppError> {
    Ok(created(store.create_team(payload(body)?).await?))
}

pub async fn team_members_handler(
    State(store): Store,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Vec<Player>>, AppError> {
    Ok(Json(store.team_members(id).await?))
}

pub async fn team_messages_handler(
    State(store): Store,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    Ok(Json(store.team_messages(id).await?))
}

pub async fn send_message_handler(
    State(store): Store,
    AxumPath(id): AxumPath<i64>,
    body: Result<Json<NewChatMessage>, JsonRejection>,
) -> Result<Created<ChatMessage>, AppError> {
    Ok(created(store.send_message(id, payload(body)?).await?))
}

pub async fn list_players_handler(State(store): Store) -> Json<Vec<Player>> {
    Json(store.players().await)
}

pub async fn create_player_handler(
    State(store): Store,
    body: Result<Json<NewPlayer>, JsonRejection>,
) -> Result<Created<Player>, AppError> {
    Ok(created(store.create_player(payload(body)?).await?))
}

pub async fn list_events_handler(State(store): Store) -> Json<Vec<Event>> {
    Json(store.events().await)
}

pub async fn create_event_handler(
    State(store): Store,
    body: Result<Json<NewEvent>, JsonRejection>,
) -> Result<Created<Event>, AppError> {
    Ok(created(store.create_event(payload(body)?).await?))
}

pub async fn list_facilities_handler(State(store): Store) -> Json<Vec<Facility>> {
    Json(store.facilities().await)
}

pub async fn create_facility_handler(
    State(store): Store,
    body: Result<Json<NewFacility>, JsonRejection>,
) -> Result<Created<Facility>, AppError> {
    Ok(created(store.create_facility(payload(body)?).await?))
}

pub async fn list_notifications_handler(State(store): Store) -> Json<Vec<Notification>> {
    Json(store.notifications().await)
}

pub async fn unread_notifications_handler(State(store): Store) -> Json<Vec<Notification>> {
    Json(store.unread_notifications().await)
}

pub async fn create_notification_handler(
    State(store): Store,
    body: Result<Json<NewNotification>, JsonRejection>,
) -> Result<Created<Notification>, AppError> {
    Ok(created(store.create_notification(payload(body)?).await?))
}

pub async fn mark_read_handler(
    State(store): Store,
    AxumPath(id): AxumPath<i64>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(store.mark_notification_read(id).await?))
}

pub async fn dashboard_stats_handler(State(store): Store) -> Json<DashboardStats> {
    Json(store.dashboard_stats().await)
}

pub async fn upcoming_events_handler(State(store): Store) -> Json<Vec<Event>> {
    Json(store.upcoming_events().await)
}

pub async fn auth_user_handler(State(store): Store) -> Result<Json<SessionUser>, AppError> {
    Ok(Json(store.current_user()?))
}

/// Routes relative to `/api`; nest the result under that prefix.
pub fn create_api_router(store: Arc<MockStore>) -> Router {
    Router::new()
        .route("/teams", get(list_teams_handler).post(create_team_handler))
        .route("/teams/{id}", get(get_team_handler))
        .route("/teams/{id}/members", get(team_members_handler))
        .route(
            "/teams/{id}/messages",
            get(team_messages_handler).post(send_message_handler),
        )
        .route("/players", get(list_players_handler).post(create_player_handler))
        .route("/events", get(list_events_handler).post(create_event_handler))
        .route(
            "/facilities",
            get(list_facilities_handler).post(create_facility_handler),
        )
        .route(
            "/notifications",
            get(list_notifications_handler).post(create_notification_handler),
        )
        .route("/notifications/unread", get(unread_notifications_handler))
        .route("/notifications/{id}/read", patch(mark_read_handler))
        .route("/dashboard/stats", get(dashboard_stats_handler))
        .route("/dashboard/upcoming-events", get(upcoming_events_handler))
        .route("/auth/user", get(auth_user_handler))
        .with_state(store)
}
