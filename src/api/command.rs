use crate::error::AppResult;
use crate::models::{NewChatMessage, NewEvent, NewFacility, NewNotification, NewPlayer, NewTeam};
use reqwest::Method;
use serde_json::Value;

/// A write against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTeam(NewTeam),
    CreatePlayer(NewPlayer),
    CreateEvent(NewEvent),
    CreateFacility(NewFacility),
    CreateNotification(NewNotification),
    MarkNotificationRead { id: i64 },
    SendMessage { team_id: i64, message: NewChatMessage },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateTeam(_) => "create team",
            Command::CreatePlayer(_) => "create player",
            Command::CreateEvent(_) => "create event",
            Command::CreateFacility(_) => "create facility",
            Command::CreateNotification(_) => "create notification",
            Command::MarkNotificationRead { .. } => "mark notification read",
            Command::SendMessage { .. } => "send message",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            Command::MarkNotificationRead { .. } => Method::PATCH,
            _ => Method::POST,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Command::CreateTeam(_) => "/api/teams".to_string(),
            Command::CreatePlayer(_) => "/api/players".to_string(),
            Command::CreateEvent(_) => "/api/events".to_string(),
            Command::CreateFacility(_) => "/api/facilities".to_string(),
            Command::CreateNotification(_) => "/api/notifications".to_string(),
            Command::MarkNotificationRead { id } => format!("/api/notifications/{}/read", id),
            Command::SendMessage { team_id, .. } => format!("/api/teams/{}/messages", team_id),
        }
    }

    pub fn body(&self) -> AppResult<Option<Value>> {
        let body = match self {
            Command::CreateTeam(draft) => serde_json::to_value(draft)?,
            Command::CreatePlayer(draft) => serde_json::to_value(draft)?,
            Command::CreateEvent(draft) => serde_json::to_value(draft)?,
            Command::CreateFacility(draft) => serde_json::to_value(draft)?,
            Command::CreateNotification(draft) => serde_json::to_value(draft)?,
            Command::MarkNotificationRead { .. } => return Ok(None),
            Command::SendMessage { message, .. } => serde_json::to_value(message)?,
        };
        Ok(Some(body))
    }

    pub fn validate(&self) -> AppResult<()> {
        match self {
            Command::CreateTeam(draft) => draft.validate(),
            Command::CreatePlayer(draft) => draft.validate(),
            Command::CreateEvent(draft) => draft.validate(),
            Command::CreateFacility(draft) => draft.validate(),
            Command::CreateNotification(draft) => draft.validate(),
            Command::MarkNotificationRead { .. } => Ok(()),
            Command::SendMessage { message, .. } => message.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_routes() {
        let mark = Command::MarkNotificationRead { id: 3 };
        assert_eq!(mark.method(), Method::PATCH);
        assert_eq!(mark.path(), "/api/notifications/3/read");
        assert_eq!(mark.body().unwrap(), None);

        let send = Command::SendMessage {
            team_id: 1,
            message: NewChatMessage::new("  hi  "),
        };
        assert_eq!(send.path(), "/api/teams/1/messages");
        assert_eq!(send.body().unwrap().unwrap()["message"], "hi");
    }

    #[test]
    fn test_validation_happens_before_sending() {
        let command = Command::CreateTeam(NewTeam::new("", "basketball", "U12"));
        assert!(command.validate().is_err());
    }
}
