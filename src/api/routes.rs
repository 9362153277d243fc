use crate::error::{AppError, AppResult};
use crate::infrastructure::query_key::{PathPart, QueryKey};

/// Readable resources, addressed by query key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Teams,
    Team(i64),
    TeamMembers(i64),
    TeamMessages(i64),
    Players,
    Events,
    Facilities,
    Notifications,
    UnreadNotifications,
    DashboardStats,
    UpcomingEvents,
    AuthUser,
}

impl Route {
    pub fn parse(key: &QueryKey) -> AppResult<Self> {
        use PathPart::{Id, Name};

        let route = match key.path_parts().as_slice() {
            [Name("teams")] => Route::Teams,
            [Name("teams"), Id(id)] => Route::Team(*id),
            [Name("teams"), Id(id), Name("members")] => Route::TeamMembers(*id),
            [Name("teams"), Id(id), Name("messages")] => Route::TeamMessages(*id),
            [Name("players")] => Route::Players,
            [Name("events")] => Route::Events,
            [Name("facilities")] => Route::Facilities,
            [Name("notifications")] => Route::Notifications,
            [Name("notifications"), Name("unread")] => Route::UnreadNotifications,
            [Name("dashboard"), Name("stats")] => Route::DashboardStats,
            [Name("dashboard"), Name("upcoming-events")] => Route::UpcomingEvents,
            [Name("auth"), Name("user")] => Route::AuthUser,
            _ => return Err(AppError::NotFound(format!("No resource for query {}", key))),
        };
        Ok(route)
    }

    /// Absolute API path, e.g. `/api/teams/7/messages`.
    pub fn api_path(&self) -> String {
        match self {
            Route::Teams => "/api/teams".to_string(),
            Route::Team(id) => format!("/api/teams/{}", id),
            Route::TeamMembers(id) => format!("/api/teams/{}/members", id),
            Route::TeamMessages(id) => format!("/api/teams/{}/messages", id),
            Route::Players => "/api/players".to_string(),
            Route::Events => "/api/events".to_string(),
            Route::Facilities => "/api/facilities".to_string(),
            Route::Notifications => "/api/notifications".to_string(),
            Route::UnreadNotifications => "/api/notifications/unread".to_string(),
            Route::DashboardStats => "/api/dashboard/stats".to_string(),
            Route::UpcomingEvents => "/api/dashboard/upcoming-events".to_string(),
            Route::AuthUser => "/api/auth/user".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_key;

    #[test]
    fn test_parse_known_keys() {
        assert_eq!(Route::parse(&query_key!["teams"]).unwrap(), Route::Teams);
        assert_eq!(
            Route::parse(&query_key!["teams", 7, "messages"]).unwrap(),
            Route::TeamMessages(7)
        );
        assert_eq!(
            Route::parse(&query_key!["/api/teams", 2, "members"]).unwrap(),
            Route::TeamMembers(2)
        );
        assert_eq!(
            Route::parse(&query_key!["dashboard", "upcoming-events"]).unwrap().api_path(),
            "/api/dashboard/upcoming-events"
        );
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        assert!(matches!(
            Route::parse(&query_key!["payments"]),
            Err(AppError::NotFound(_))
        ));
    }
}
