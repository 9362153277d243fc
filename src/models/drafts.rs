// Creatable subsets of the domain records, validated before submission.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    EventType, FacilityType, Guardian, NotificationCategory, NotificationType, Priority, Sport,
};
use crate::error::{AppError, AppResult};

fn require(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTeam {
    pub name: String,
    pub sport: Sport,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub home_venue: Option<String>,
}

impl NewTeam {
    pub fn new(name: impl Into<String>, sport: impl Into<Sport>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sport: sport.into(),
            category: category.into(),
            description: None,
            home_venue: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("sport", self.sport.as_str())?;
        require("category", &self.category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub jersey_number: Option<u32>,
    #[serde(default)]
    pub team_id: Option<i64>,
    #[serde(default)]
    pub guardians: Vec<Guardian>,
    #[serde(default)]
    pub medical_notes: Option<String>,
}

impl NewPlayer {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            date_of_birth: None,
            position: None,
            jersey_number: None,
            team_id: None,
            guardians: Vec::new(),
            medical_notes: None,
        }
    }

    pub fn validate(&self) -> AppResult<()> {
        require("firstName", &self.first_name)?;
        require("lastName", &self.last_name)?;
        for (index, guardian) in self.guardians.iter().enumerate() {
            require(&format!("guardians[{}].firstName", index), &guardian.first_name)?;
            require(&format!("guardians[{}].lastName", index), &guardian.last_name)?;
        }
        let emergency_contacts = self
            .guardians
            .iter()
            .filter(|g| g.is_emergency_contact)
            .count();
        if emergency_contacts > 1 {
            return Err(AppError::Validation(
                "only one guardian can be the emergency contact".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: EventType,
    pub date: String,
    pub time: String,
    pub location: String,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl NewEvent {
    pub fn validate(&self) -> AppResult<()> {
        require("title", &self.title)?;
        require("date", &self.date)?;
        require("time", &self.time)?;
        require("location", &self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFacility {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FacilityType,
    pub location: String,
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub amenities: Vec<String>,
}

impl NewFacility {
    pub fn validate(&self) -> AppResult<()> {
        require("name", &self.name)?;
        require("location", &self.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub category: NotificationCategory,
    #[serde(default)]
    pub priority: Priority,
}

impl NewNotification {
    pub fn validate(&self) -> AppResult<()> {
        require("title", &self.title)?;
        require("message", &self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    pub message: String,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
}

impl NewChatMessage {
    /// Message text is trimmed on construction.
    pub fn new(message: &str) -> Self {
        Self {
            message: message.trim().to_string(),
            is_urgent: false,
            reply_to_id: None,
        }
    }

    pub fn urgent(mut self, is_urgent: bool) -> Self {
        self.is_urgent = is_urgent;
        self
    }

    pub fn reply_to(mut self, message_id: Option<i64>) -> Self {
        self.reply_to_id = message_id;
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        require("message", &self.message)
    }
}
