// In-memory resource store seeded with demo data. Backs both the mock REST
// server and in-process views.

use crate::api::command::Command;
use crate::api::routes::Route;
use crate::config::MockConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::query_key::QueryKey;
use crate::infrastructure::traits::{Backend, QueryFetcher};
use crate::models::{
    ChatMessage, DashboardStats, Event, EventStatus, Facility, Guardian, GuardianRelationship,
    NewChatMessage, NewEvent, NewFacility, NewNotification, NewPlayer, NewTeam, Notification,
    Player, SessionUser, Team, UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Events starting within this many days count as upcoming on the dashboard.
const UPCOMING_WINDOW_DAYS: i64 = 7;
const UPCOMING_LIST_LIMIT: usize = 5;

#[derive(Debug, Clone, Default)]
struct StoreData {
    teams: Vec<Team>,
    players: Vec<Player>,
    events: Vec<Event>,
    facilities: Vec<Facility>,
    notifications: Vec<Notification>,
    messages: Vec<ChatMessage>,
}

fn seed_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn seed_team(id: i64, name: &str, sport: &str, category: &str, description: &str, members: u32, rating: f32, venue: &str, next: &str) -> Team {
    Team {
        id,
        name: name.to_string(),
        sport: sport.into(),
        category: category.to_string(),
        description: Some(description.to_string()),
        member_count: members,
        rating,
        home_venue: Some(venue.to_string()),
        next_event: Some(next.to_string()),
    }
}

fn seed_player(
    id: i64,
    (first, last): (&str, &str),
    jersey: u32,
    position: &str,
    born: (i32, u32, u32),
    (team_id, team_name): (i64, &str),
    (guardian_first, email, phone, relationship): (&str, &str, &str, GuardianRelationship),
) -> Player {
    Player {
        id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(born.0, born.1, born.2),
        position: Some(position.to_string()),
        jersey_number: Some(jersey),
        team_id: Some(team_id),
        team_name: Some(team_name.to_string()),
        guardians: vec![Guardian {
            first_name: guardian_first.to_string(),
            last_name: last.to_string(),
            email: Some(email.to_string()),
            phone: Some(phone.to_string()),
            relationship,
            is_emergency_contact: true,
        }],
        medical_notes: None,
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_event(id: i64, title: &str, kind: &str, date: &str, time: &str, location: &str, teams: &[&str], status: EventStatus) -> Event {
    Event {
        id,
        title: title.to_string(),
        kind: kind.into(),
        date: date.to_string(),
        time: time.to_string(),
        location: location.to_string(),
        teams: teams.iter().map(|team| team.to_string()).collect(),
        status,
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_facility(id: i64, name: &str, kind: &str, location: &str, capacity: u32, rate: f64, availability: &str, rating: f32, amenities: &[&str], next: &str, bookings: u32) -> Facility {
    Facility {
        id,
        name: name.to_string(),
        kind: kind.into(),
        location: location.to_string(),
        capacity,
        hourly_rate: rate,
        availability: availability.to_string(),
        rating,
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
        next_available: Some(next.to_string()),
        current_bookings: bookings,
    }
}

#[allow(clippy::too_many_arguments)]
fn seed_notification(id: i64, title: &str, message: &str, kind: &str, category: &str, timestamp: NaiveDateTime, read: bool, priority: &str) -> Notification {
    Notification {
        id,
        title: title.to_string(),
        message: message.to_string(),
        kind: kind.into(),
        category: category.into(),
        timestamp,
        read,
        priority: priority.into(),
    }
}

static SEED: Lazy<StoreData> = Lazy::new(|| StoreData {
    teams: vec![
        seed_team(1, "Lightning Bolts", "basketball", "U12", "U12 competitive basketball team", 12, 4.8, "Main Court", "Today at 6:00 PM"),
        seed_team(2, "Thunder Hawks", "soccer", "U14", "U14 soccer team", 18, 4.6, "Field A", "Tomorrow at 4:30 PM"),
        seed_team(3, "Red Sox Jr", "baseball", "U10", "Youth baseball team", 15, 4.9, "Diamond 1", "Saturday at 9:00 AM"),
        seed_team(4, "Volleyball Stars", "volleyball", "U16", "Girls volleyball team", 14, 4.7, "Gym B", "Friday at 5:00 PM"),
    ],
    players: vec![
        seed_player(1, ("John", "Smith"), 10, "Forward", (2010, 5, 15), (1, "Lightning Bolts"),
            ("Jane", "jane.smith@email.com", "(555) 123-4567", GuardianRelationship::Mother)),
        seed_player(2, ("Emma", "Johnson"), 7, "Captain", (2009, 8, 22), (1, "Lightning Bolts"),
            ("Mike", "mike.j@email.com", "(555) 234-5678", GuardianRelationship::Father)),
        seed_player(3, ("Michael", "Brown"), 23, "Defender", (2011, 3, 10), (2, "Thunder Hawks"),
            ("Sarah", "sarah.brown@email.com", "(555) 345-6789", GuardianRelationship::Mother)),
    ],
    events: vec![
        seed_event(1, "Lightning Bolts vs Thunder Hawks", "game", "2025-01-20", "18:00", "Main Field",
            &["Lightning Bolts", "Thunder Hawks"], EventStatus::Scheduled),
        seed_event(2, "Lightning Bolts Practice", "practice", "2025-01-18", "16:00", "Training Ground",
            &["Lightning Bolts"], EventStatus::Scheduled),
        seed_event(3, "Youth Championship Tournament", "tournament", "2025-02-01", "09:00", "City Sports Complex",
            &["All Teams"], EventStatus::Upcoming),
    ],
    facilities: vec![
        seed_facility(1, "Main Soccer Field", "field", "123 Sports Complex Dr", 50, 75.0, "Available", 4.8,
            &["Lighting", "Parking", "Restrooms"], "Today, 3:00 PM", 12),
        seed_facility(2, "Indoor Basketball Court", "court", "456 Athletic Center", 30, 60.0, "Booked until 5PM", 4.6,
            &["Climate Control", "Scoreboard", "Locker Rooms"], "Today, 5:00 PM", 8),
        seed_facility(3, "Community Pool", "pool", "789 Aquatic Center", 40, 100.0, "Available", 4.9,
            &["Heated", "Lifeguard", "Changing Rooms"], "Now", 15),
        seed_facility(4, "Training Gym", "gym", "321 Fitness Plaza", 25, 50.0, "Available", 4.7,
            &["Equipment", "Mirrors", "Sound System"], "Now", 6),
    ],
    notifications: vec![
        seed_notification(1, "Game Reminder", "Lightning Bolts vs Thunder Hawks tomorrow at 6:00 PM",
            "reminder", "game", seed_time(2025, 1, 25, 10, 0), false, "high"),
        seed_notification(2, "Practice Schedule Update", "Lightning Bolts practice moved to 4:30 PM on Friday",
            "update", "practice", seed_time(2025, 1, 24, 15, 30), false, "medium"),
        seed_notification(3, "New Player Added", "Emma Johnson has been added to Lightning Bolts roster",
            "info", "roster", seed_time(2025, 1, 23, 9, 15), true, "low"),
        seed_notification(4, "Tournament Registration Open", "Youth Championship Tournament registration is now open",
            "announcement", "tournament", seed_time(2025, 1, 22, 14, 0), true, "high"),
    ],
    messages: vec![
        ChatMessage {
            id: 1,
            team_id: 1,
            sender_id: "coach_1".to_string(),
            sender_name: "Coach Taylor".to_string(),
            message: "Great practice today everyone! Remember to hydrate before Monday's game.".to_string(),
            is_urgent: false,
            reply_to_id: None,
            created_at: Utc.from_utc_datetime(&seed_time(2025, 1, 18, 17, 30)),
        },
        ChatMessage {
            id: 2,
            team_id: 1,
            sender_id: "parent_2".to_string(),
            sender_name: "Mike Johnson".to_string(),
            message: "Thanks coach! Emma will be there early.".to_string(),
            is_urgent: false,
            reply_to_id: Some(1),
            created_at: Utc.from_utc_datetime(&seed_time(2025, 1, 18, 17, 45)),
        },
    ],
});

/// The signed-in user the mock server reports.
pub fn demo_user() -> SessionUser {
    SessionUser {
        id: "coach_1".to_string(),
        email: "coach@teampro.ai".to_string(),
        role: UserRole::TeamAdmin,
        first_name: "Coach".to_string(),
        last_name: "Taylor".to_string(),
    }
}

fn next_id<T>(records: &[T], id: impl Fn(&T) -> i64) -> i64 {
    records.iter().map(id).max().unwrap_or(0) + 1
}

fn to_json<T: Serialize>(value: &T) -> AppResult<Value> {
    Ok(serde_json::to_value(value)?)
}

pub struct MockStore {
    data: RwLock<StoreData>,
    latency: Duration,
    clock: Clock,
    user: Option<SessionUser>,
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStore {
    /// Seeded store, no latency, signed in as the demo coach.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(SEED.clone()),
            latency: Duration::ZERO,
            clock: Clock::system(),
            user: Some(demo_user()),
        }
    }

    pub fn empty() -> Self {
        Self {
            data: RwLock::new(StoreData::default()),
            ..Self::new()
        }
    }

    pub fn from_config(config: &MockConfig) -> Self {
        Self::new().with_latency(config.latency())
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_user(mut self, user: Option<SessionUser>) -> Self {
        self.user = user;
        self
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    pub async fn teams(&self) -> Vec<Team> {
        self.data.read().await.teams.clone()
    }

    pub async fn team(&self, id: i64) -> AppResult<Team> {
        self.data
            .read()
            .await
            .teams
            .iter()
            .find(|team| team.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Team {} not found", id)))
    }

    pub async fn team_members(&self, team_id: i64) -> AppResult<Vec<Player>> {
        let data = self.data.read().await;
        if !data.teams.iter().any(|team| team.id == team_id) {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)));
        }
        Ok(data
            .players
            .iter()
            .filter(|player| player.team_id == Some(team_id))
            .cloned()
            .collect())
    }

    pub async fn team_messages(&self, team_id: i64) -> AppResult<Vec<ChatMessage>> {
        let data = self.data.read().await;
        if !data.teams.iter().any(|team| team.id == team_id) {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)));
        }
        let mut messages: Vec<ChatMessage> = data
            .messages
            .iter()
            .filter(|message| message.team_id == team_id)
            .cloned()
            .collect();
        messages.sort_by_key(|message| message.created_at);
        Ok(messages)
    }

    pub async fn players(&self) -> Vec<Player> {
        self.data.read().await.players.clone()
    }

    pub async fn events(&self) -> Vec<Event> {
        self.data.read().await.events.clone()
    }

    pub async fn facilities(&self) -> Vec<Facility> {
        self.data.read().await.facilities.clone()
    }

    /// Newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        let mut notifications = self.data.read().await.notifications.clone();
        notifications.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        notifications
    }

    pub async fn unread_notifications(&self) -> Vec<Notification> {
        let mut unread = self.notifications().await;
        unread.retain(|notification| !notification.read);
        unread
    }

    pub async fn dashboard_stats(&self) -> DashboardStats {
        let now = self.clock.now_naive();
        let window_end = now + chrono::Duration::days(UPCOMING_WINDOW_DAYS);
        let data = self.data.read().await;
        DashboardStats {
            active_teams: data.teams.len(),
            total_players: data.players.len(),
            facilities: data.facilities.len(),
            upcoming_events: data
                .events
                .iter()
                .filter_map(Event::starts_at)
                .filter(|start| *start >= now && *start <= window_end)
                .count(),
            unread_notifications: data.notifications.iter().filter(|n| !n.read).count(),
        }
    }

    /// Soonest first, starting from now.
    pub async fn upcoming_events(&self) -> Vec<Event> {
        let now = self.clock.now_naive();
        let data = self.data.read().await;
        let mut upcoming: Vec<(NaiveDateTime, Event)> = data
            .events
            .iter()
            .filter_map(|event| event.starts_at().map(|start| (start, event.clone())))
            .filter(|(start, _)| *start >= now)
            .collect();
        upcoming.sort_by_key(|(start, _)| *start);
        upcoming
            .into_iter()
            .take(UPCOMING_LIST_LIMIT)
            .map(|(_, event)| event)
            .collect()
    }

    pub fn current_user(&self) -> AppResult<SessionUser> {
        self.user
            .clone()
            .ok_or_else(|| AppError::Unauthorized("Unauthorized".to_string()))
    }

    pub async fn create_team(&self, draft: NewTeam) -> AppResult<Team> {
        draft.validate()?;
        let mut data = self.data.write().await;
        let team = Team {
            id: next_id(&data.teams, |team| team.id),
            name: draft.name.trim().to_string(),
            sport: draft.sport,
            category: draft.category.trim().to_string(),
            description: draft.description,
            member_count: 0,
            rating: 0.0,
            home_venue: draft.home_venue,
            next_event: None,
        };
        data.teams.push(team.clone());
        info!("Created team {} ({})", team.id, team.name);
        Ok(team)
    }

    /// Attaching a player to a team bumps that team's member count.
    pub async fn create_player(&self, draft: NewPlayer) -> AppResult<Player> {
        draft.validate()?;
        let mut data = self.data.write().await;
        let team_name = match draft.team_id {
            Some(team_id) => {
                let team = data
                    .teams
                    .iter_mut()
                    .find(|team| team.id == team_id)
                    .ok_or_else(|| AppError::NotFound(format!("Team {} not found", team_id)))?;
                team.member_count += 1;
                Some(team.name.clone())
            }
            None => None,
        };
        let player = Player {
            id: next_id(&data.players, |player| player.id),
            first_name: draft.first_name.trim().to_string(),
            last_name: draft.last_name.trim().to_string(),
            date_of_birth: draft.date_of_birth,
            position: draft.position,
            jersey_number: draft.jersey_number,
            team_id: draft.team_id,
            team_name,
            guardians: draft.guardians,
            medical_notes: draft.medical_notes,
        };
        data.players.push(player.clone());
        info!("Created player {} ({})", player.id, player.full_name());
        Ok(player)
    }

    pub async fn create_event(&self, draft: NewEvent) -> AppResult<Event> {
        draft.validate()?;
        let mut data = self.data.write().await;
        let event = Event {
            id: next_id(&data.events, |event| event.id),
            title: draft.title.trim().to_string(),
            kind: draft.kind,
            date: draft.date,
            time: draft.time,
            location: draft.location,
            teams: draft.teams,
            status: EventStatus::Scheduled,
        };
        data.events.push(event.clone());
        info!("Created event {} ({})", event.id, event.title);
        Ok(event)
    }

    pub async fn create_facility(&self, draft: NewFacility) -> AppResult<Facility> {
        draft.validate()?;
        let mut data = self.data.write().await;
        let facility = Facility {
            id: next_id(&data.facilities, |facility| facility.id),
            name: draft.name.trim().to_string(),
            kind: draft.kind,
            location: draft.location,
            capacity: draft.capacity,
            hourly_rate: draft.hourly_rate,
            availability: Facility::AVAILABLE.to_string(),
            rating: 0.0,
            amenities: draft.amenities,
            next_available: Some("Now".to_string()),
            current_bookings: 0,
        };
        data.facilities.push(facility.clone());
        info!("Created facility {} ({})", facility.id, facility.name);
        Ok(facility)
    }

    pub async fn create_notification(&self, draft: NewNotification) -> AppResult<Notification> {
        draft.validate()?;
        let timestamp = self.clock.now_naive();
        let mut data = self.data.write().await;
        let notification = Notification {
            id: next_id(&data.notifications, |n| n.id),
            title: draft.title.trim().to_string(),
            message: draft.message.trim().to_string(),
            kind: draft.kind,
            category: draft.category,
            timestamp,
            read: false,
            priority: draft.priority,
        };
        data.notifications.push(notification.clone());
        info!("Created notification {}", notification.id);
        Ok(notification)
    }

    /// Idempotent.
    pub async fn mark_notification_read(&self, id: i64) -> AppResult<Notification> {
        let mut data = self.data.write().await;
        let notification = data
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))?;
        notification.read = true;
        debug!("Marked notification {} read", id);
        Ok(notification.clone())
    }

    pub async fn send_message(&self, team_id: i64, draft: NewChatMessage) -> AppResult<ChatMessage> {
        let draft = NewChatMessage::new(&draft.message)
            .urgent(draft.is_urgent)
            .reply_to(draft.reply_to_id);
        draft.validate()?;
        let sender = self.current_user()?;
        let created_at: DateTime<Utc> = self.clock.now();

        let mut data = self.data.write().await;
        if !data.teams.iter().any(|team| team.id == team_id) {
            return Err(AppError::NotFound(format!("Team {} not found", team_id)));
        }
        let message = ChatMessage {
            id: next_id(&data.messages, |m| m.id),
            team_id,
            sender_id: sender.id.clone(),
            sender_name: sender.display_name(),
            message: draft.message,
            is_urgent: draft.is_urgent,
            reply_to_id: draft.reply_to_id,
            created_at,
        };
        data.messages.push(message.clone());
        debug!("Team {} message {} from {}", team_id, message.id, sender.id);
        Ok(message)
    }

    pub async fn query(&self, route: &Route) -> AppResult<Value> {
        match route {
            Route::Teams => to_json(&self.teams().await),
            Route::Team(id) => to_json(&self.team(*id).await?),
            Route::TeamMembers(id) => to_json(&self.team_members(*id).await?),
            Route::TeamMessages(id) => to_json(&self.team_messages(*id).await?),
            Route::Players => to_json(&self.players().await),
            Route::Events => to_json(&self.events().await),
            Route::Facilities => to_json(&self.facilities().await),
            Route::Notifications => to_json(&self.notifications().await),
            Route::UnreadNotifications => to_json(&self.unread_notifications().await),
            Route::DashboardStats => to_json(&self.dashboard_stats().await),
            Route::UpcomingEvents => to_json(&self.upcoming_events().await),
            Route::AuthUser => to_json(&self.current_user()?),
        }
    }

    pub async fn execute(&self, command: Command) -> AppResult<Value> {
        match command {
            Command::CreateTeam(draft) => to_json(&self.create_team(draft).await?),
            Command::CreatePlayer(draft) => to_json(&self.create_player(draft).await?),
            Command::CreateEvent(draft) => to_json(&self.create_event(draft).await?),
            Command::CreateFacility(draft) => to_json(&self.create_facility(draft).await?),
            Command::CreateNotification(draft) => to_json(&self.create_notification(draft).await?),
            Command::MarkNotificationRead { id } => to_json(&self.mark_notification_read(id).await?),
            Command::SendMessage { team_id, message } => {
                to_json(&self.send_message(team_id, message).await?)
            }
        }
    }
}

#[async_trait]
impl QueryFetcher for MockStore {
    async fn fetch(&self, key: &QueryKey) -> AppResult<Value> {
        self.simulate_latency().await;
        let route = Route::parse(key)?;
        self.query(&route).await
    }
}

#[async_trait]
impl Backend for MockStore {
    async fn send(&self, command: Command) -> AppResult<Value> {
        self.simulate_latency().await;
        self.execute(command).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_key;

    fn store_on(date: NaiveDateTime) -> MockStore {
        MockStore::new().with_clock(Clock::fixed(Utc.from_utc_datetime(&date)))
    }

    #[tokio::test]
    async fn test_seed_counts() {
        let store = MockStore::new();
        assert_eq!(store.teams().await.len(), 4);
        assert_eq!(store.players().await.len(), 3);
        assert_eq!(store.events().await.len(), 3);
        assert_eq!(store.facilities().await.len(), 4);
        assert_eq!(store.notifications().await.len(), 4);
        assert_eq!(store.unread_notifications().await.len(), 2);
        assert_eq!(store.team_messages(1).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_ids_are_sequential() {
        let store = MockStore::new();
        let team = store
            .create_team(NewTeam::new("Lightning Bolts", "basketball", "U12"))
            .await
            .unwrap();
        assert_eq!(team.id, 5);
        let next = store.create_team(NewTeam::new("Fire Dragons", "soccer", "U10")).await.unwrap();
        assert_eq!(next.id, 6);
    }

    #[tokio::test]
    async fn test_player_creation_updates_team() {
        let store = MockStore::new();
        let mut draft = NewPlayer::new("Ava", "Lopez");
        draft.team_id = Some(2);
        let player = store.create_player(draft).await.unwrap();
        assert_eq!(player.team_name.as_deref(), Some("Thunder Hawks"));
        assert_eq!(store.team(2).await.unwrap().member_count, 19);

        let mut orphan = NewPlayer::new("Ava", "Lopez");
        orphan.team_id = Some(99);
        assert!(matches!(store.create_player(orphan).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dashboard_counts_upcoming_week() {
        let store = store_on(seed_time(2025, 1, 17, 12, 0));
        let stats = store.dashboard_stats().await;
        assert_eq!(stats.active_teams, 4);
        assert_eq!(stats.unread_notifications, 2);
        // Practice on the 18th and the game on the 20th; the tournament is 15 days out.
        assert_eq!(stats.upcoming_events, 2);

        let upcoming = store.upcoming_events().await;
        let ids: Vec<i64> = upcoming.iter().map(|event| event.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_mark_read_and_unknown_ids() {
        let store = MockStore::new();
        let notification = store.mark_notification_read(1).await.unwrap();
        assert!(notification.read);
        assert_eq!(store.unread_notifications().await.len(), 1);
        assert!(matches!(store.mark_notification_read(42).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_send_message_trims_and_links_reply() {
        let store = MockStore::new();
        let message = store
            .send_message(1, NewChatMessage::new("  see you there  ").reply_to(Some(2)))
            .await
            .unwrap();
        assert_eq!(message.message, "see you there");
        assert_eq!(message.reply_to_id, Some(2));
        assert_eq!(message.sender_name, "Coach Taylor");

        let blank = store.send_message(1, NewChatMessage::new("   ")).await;
        assert!(matches!(blank, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_fetch_by_query_key() {
        let store = MockStore::new();
        let value = store.fetch(&query_key!["teams", 1, "members"]).await.unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));

        let signed_out = MockStore::new().with_user(None);
        assert!(matches!(
            signed_out.fetch(&query_key!["auth", "user"]).await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
