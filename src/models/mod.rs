// Domain records exchanged with the REST backend and held in the query cache.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

pub mod drafts;

pub use drafts::{
    NewChatMessage, NewEvent, NewFacility, NewNotification, NewPlayer, NewTeam,
};

/// String-backed enum that never fails to parse: known values map to a
/// variant, anything else is preserved in `Other`.
macro_rules! lenient_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Other(String),
        }

        impl $name {
            pub const KNOWN: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $(Self::$variant => $text,)+
                    Self::Other(value) => value.as_str(),
                }
            }

            pub fn is_known(&self) -> bool {
                !matches!(self, Self::Other(_))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                let normalized = value.trim().to_ascii_lowercase();
                match normalized.as_str() {
                    $($text => Self::$variant,)+
                    _ => Self::Other(value),
                }
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::from(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

lenient_enum!(Sport {
    Basketball => "basketball",
    Soccer => "soccer",
    Baseball => "baseball",
    Volleyball => "volleyball",
});

lenient_enum!(EventType {
    Game => "game",
    Practice => "practice",
    Tournament => "tournament",
    Camp => "camp",
    Meeting => "meeting",
    Training => "training",
});

lenient_enum!(EventStatus {
    Scheduled => "scheduled",
    Upcoming => "upcoming",
    Confirmed => "confirmed",
    Cancelled => "cancelled",
    Completed => "completed",
});

lenient_enum!(FacilityType {
    Field => "field",
    Court => "court",
    Gym => "gym",
    Pool => "pool",
});

lenient_enum!(NotificationType {
    Reminder => "reminder",
    Update => "update",
    Info => "info",
    Announcement => "announcement",
    Warning => "warning",
    Urgent => "urgent",
    Success => "success",
    Error => "error",
});

lenient_enum!(NotificationCategory {
    Game => "game",
    Practice => "practice",
    Roster => "roster",
    Tournament => "tournament",
    Payment => "payment",
    General => "general",
});

lenient_enum!(Priority {
    High => "high",
    Medium => "medium",
    Low => "low",
});

lenient_enum!(GuardianRelationship {
    Mother => "mother",
    Father => "father",
    Guardian => "guardian",
    Grandparent => "grandparent",
    Sibling => "sibling",
});

lenient_enum!(UserRole {
    SuperAdmin => "super_admin",
    AdminOperations => "admin_operations",
    TeamAdmin => "team_admin",
    TeamUser => "team_user",
    Parent => "parent",
    ViewOnly => "view_only",
});

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl Default for NotificationType {
    fn default() -> Self {
        NotificationType::Info
    }
}

impl Default for NotificationCategory {
    fn default() -> Self {
        NotificationCategory::General
    }
}

impl Default for EventStatus {
    fn default() -> Self {
        EventStatus::Scheduled
    }
}

impl Default for GuardianRelationship {
    fn default() -> Self {
        GuardianRelationship::Guardian
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub sport: Sport,
    /// Age band, e.g. "U12".
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub member_count: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub home_venue: Option<String>,
    #[serde(default)]
    pub next_event: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub relationship: GuardianRelationship,
    #[serde(default)]
    pub is_emergency_contact: bool,
}

impl Guardian {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    /// Weak reference; the team may not exist.
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub guardians: Vec<Guardian>,
    #[serde(default)]
    pub medical_notes: Option<String>,
}

impl Player {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn emergency_contact(&self) -> Option<&Guardian> {
        self.guardians.iter().find(|g| g.is_emergency_contact)
    }

    pub fn is_captain(&self) -> bool {
        self.position
            .as_deref()
            .is_some_and(|position| position.eq_ignore_ascii_case("captain"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour clock.
    pub time: String,
    pub location: String,
    /// Team names; weak references.
    #[serde(default)]
    pub teams: Vec<String>,
    #[serde(default)]
    pub status: EventStatus,
}

impl Event {
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M").ok()?;
        Some(date.and_time(time))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityType,
    pub location: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub next_available: Option<String>,
    #[serde(default)]
    pub current_bookings: u32,
}

impl Facility {
    pub const AVAILABLE: &'static str = "Available";

    pub fn is_available(&self) -> bool {
        self.availability == Self::AVAILABLE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub category: NotificationCategory,
    pub timestamp: NaiveDateTime,
    /// The only field mutated after creation.
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: i64,
    pub team_id: i64,
    pub sender_id: String,
    pub sender_name: String,
    pub message: String,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_teams: usize,
    pub total_players: usize,
    pub facilities: usize,
    pub upcoming_events: usize,
    pub unread_notifications: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub role: UserRole,
    pub first_name: String,
    pub last_name: String,
}

impl SessionUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lenient_enum_keeps_unknown_values() {
        let sport: Sport = serde_json::from_value(json!("Hockey")).unwrap();
        assert_eq!(sport, Sport::Other("Hockey".to_string()));
        assert!(!sport.is_known());
        assert_eq!(serde_json::to_value(&sport).unwrap(), json!("Hockey"));

        let sport: Sport = serde_json::from_value(json!("Basketball")).unwrap();
        assert_eq!(sport, Sport::Basketball);
        assert_eq!(sport.to_string(), "basketball");
    }

    #[test]
    fn test_notification_wire_format() {
        let raw = json!({
            "id": 1,
            "title": "Game Reminder",
            "message": "Lightning Bolts vs Thunder Hawks tomorrow at 6:00 PM",
            "type": "reminder",
            "category": "game",
            "timestamp": "2025-01-25T10:00:00",
            "read": false,
            "priority": "high"
        });
        let notification: Notification = serde_json::from_value(raw).unwrap();
        assert_eq!(notification.kind, NotificationType::Reminder);
        assert_eq!(notification.priority, Priority::High);
        assert!(!notification.read);
    }

    #[test]
    fn test_event_start() {
        let event = Event {
            id: 1,
            title: "Practice".into(),
            kind: EventType::Practice,
            date: "2025-01-18".into(),
            time: "16:00".into(),
            location: "Training Ground".into(),
            teams: vec![],
            status: EventStatus::Scheduled,
        };
        let start = event.starts_at().unwrap();
        assert_eq!(start.to_string(), "2025-01-18 16:00:00");

        let undated = Event { date: "TBD".into(), ..event };
        assert!(undated.starts_at().is_none());
    }
}
