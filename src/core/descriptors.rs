// Central enum -> (icon, color class, label) tables shared by every view.
// Lookups are case-insensitive and fall back to the table default.

use crate::models::{
    EventStatus, EventType, FacilityType, NotificationCategory, NotificationType, Priority, Sport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor {
    pub icon: &'static str,
    pub color_class: &'static str,
    pub label: &'static str,
}

impl Descriptor {
    pub const fn new(icon: &'static str, color_class: &'static str, label: &'static str) -> Self {
        Self {
            icon,
            color_class,
            label,
        }
    }
}

#[derive(Debug)]
pub struct DescriptorTable {
    entries: &'static [(&'static str, Descriptor)],
    default: Descriptor,
}

impl DescriptorTable {
    pub const fn new(entries: &'static [(&'static str, Descriptor)], default: Descriptor) -> Self {
        Self { entries, default }
    }

    pub fn lookup(&self, key: &str) -> Descriptor {
        let key = key.trim();
        self.entries
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, descriptor)| *descriptor)
            .unwrap_or(self.default)
    }

    pub fn default_descriptor(&self) -> Descriptor {
        self.default
    }
}

const GRAY: &str = "bg-gray-100 text-gray-800";

pub static NOTIFICATION_TYPES: DescriptorTable = DescriptorTable::new(
    &[
        ("reminder", Descriptor::new("clock", "text-blue-600 bg-blue-100", "Reminder")),
        ("update", Descriptor::new("alert-circle", "text-orange-600 bg-orange-100", "Update")),
        ("info", Descriptor::new("message-square", "text-green-600 bg-green-100", "Info")),
        ("announcement", Descriptor::new("bell-ring", "text-purple-600 bg-purple-100", "Announcement")),
        ("warning", Descriptor::new("alert-triangle", "text-yellow-600 bg-yellow-100", "Warning")),
        ("urgent", Descriptor::new("alert-triangle", "text-red-600 bg-red-100", "Urgent")),
        ("success", Descriptor::new("check", "text-green-600 bg-green-100", "Success")),
        ("error", Descriptor::new("alert-triangle", "text-red-600 bg-red-100", "Error")),
    ],
    Descriptor::new("bell", "text-gray-600 bg-gray-100", "Notification"),
);

pub static NOTIFICATION_CATEGORIES: DescriptorTable = DescriptorTable::new(
    &[
        ("game", Descriptor::new("trophy", "bg-green-100 text-green-800", "Games")),
        ("practice", Descriptor::new("calendar", "bg-blue-100 text-blue-800", "Practice")),
        ("roster", Descriptor::new("users", "bg-yellow-100 text-yellow-800", "Roster")),
        ("tournament", Descriptor::new("trophy", "bg-purple-100 text-purple-800", "Tournaments")),
        ("payment", Descriptor::new("credit-card", "bg-cyan-100 text-cyan-800", "Payments")),
    ],
    Descriptor::new("bell", GRAY, "General"),
);

pub static PRIORITIES: DescriptorTable = DescriptorTable::new(
    &[
        ("high", Descriptor::new("alert-circle", "destructive", "High Priority")),
        ("medium", Descriptor::new("clock", "secondary", "Medium Priority")),
        ("low", Descriptor::new("info", "outline", "Low Priority")),
    ],
    Descriptor::new("", "", ""),
);

pub static EVENT_TYPES: DescriptorTable = DescriptorTable::new(
    &[
        ("game", Descriptor::new("trophy", "bg-green-100 text-green-800", "Game")),
        ("practice", Descriptor::new("users", "bg-blue-100 text-blue-800", "Practice")),
        ("tournament", Descriptor::new("award", "bg-purple-100 text-purple-800", "Tournament")),
        ("camp", Descriptor::new("tent", "bg-orange-100 text-orange-800", "Camp")),
        ("meeting", Descriptor::new("message-circle", "bg-yellow-100 text-yellow-800", "Meeting")),
    ],
    Descriptor::new("calendar", GRAY, "Event"),
);

pub static EVENT_STATUSES: DescriptorTable = DescriptorTable::new(
    &[
        ("scheduled", Descriptor::new("calendar", "bg-blue-100 text-blue-800", "Scheduled")),
        ("upcoming", Descriptor::new("clock", "bg-purple-100 text-purple-800", "Upcoming")),
        ("confirmed", Descriptor::new("check-circle", "bg-green-100 text-green-800", "Confirmed")),
        ("cancelled", Descriptor::new("x-circle", "bg-red-100 text-red-800", "Cancelled")),
        ("completed", Descriptor::new("check", GRAY, "Completed")),
    ],
    Descriptor::new("calendar", GRAY, "Unknown"),
);

pub static SPORTS: DescriptorTable = DescriptorTable::new(
    &[
        ("basketball", Descriptor::new("circle-dot", "bg-orange-100 text-orange-800", "Basketball")),
        ("soccer", Descriptor::new("goal", "bg-green-100 text-green-800", "Soccer")),
        ("baseball", Descriptor::new("diamond", "bg-red-100 text-red-800", "Baseball")),
        ("volleyball", Descriptor::new("volleyball", "bg-yellow-100 text-yellow-800", "Volleyball")),
    ],
    Descriptor::new("trophy", GRAY, "Sport"),
);

pub static FACILITY_TYPES: DescriptorTable = DescriptorTable::new(
    &[
        ("field", Descriptor::new("trees", "bg-green-100 text-green-800", "Field")),
        ("court", Descriptor::new("square", "bg-blue-100 text-blue-800", "Court")),
        ("gym", Descriptor::new("dumbbell", "bg-purple-100 text-purple-800", "Gym")),
        ("pool", Descriptor::new("waves", "bg-cyan-100 text-cyan-800", "Pool")),
    ],
    Descriptor::new("building", GRAY, "Facility"),
);

/// Visual descriptor for an enumerated record field.
pub trait Describe {
    fn descriptor(&self) -> Descriptor;
}

macro_rules! describe_with {
    ($($ty:ty => $table:ident),+ $(,)?) => {
        $(
            impl Describe for $ty {
                fn descriptor(&self) -> Descriptor {
                    $table.lookup(self.as_str())
                }
            }
        )+
    };
}

describe_with!(
    NotificationType => NOTIFICATION_TYPES,
    NotificationCategory => NOTIFICATION_CATEGORIES,
    Priority => PRIORITIES,
    EventType => EVENT_TYPES,
    EventStatus => EVENT_STATUSES,
    Sport => SPORTS,
    FacilityType => FACILITY_TYPES,
);
