use super::{list_view, EventRow, ListView, ResourceView, ViewContext};
use crate::core::filters::SearchText;
use crate::error::{AppError, AppResult, ErrorKind};
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{DashboardStats, Event};
use crate::query_key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    /// `None` until the first stats load completes.
    pub stats: Option<DashboardStats>,
    pub cards: Vec<StatCard>,
    pub upcoming: ListView<EventRow>,
    pub error: Option<AppError>,
}

fn stat_cards(stats: &DashboardStats) -> Vec<StatCard> {
    [
        ("Active Teams", stats.active_teams),
        ("Total Players", stats.total_players),
        ("Upcoming Events", stats.upcoming_events),
        ("Facilities", stats.facilities),
        ("Unread Notifications", stats.unread_notifications),
    ]
    .into_iter()
    .map(|(label, value)| StatCard {
        label,
        value: value.to_string(),
    })
    .collect()
}

pub struct DashboardView {
    stats: ResourceView<DashboardStats>,
    upcoming: ResourceView<Vec<Event>>,
}

impl DashboardView {
    pub fn stats_key() -> QueryKey {
        query_key!["dashboard", "stats"]
    }

    pub fn upcoming_key() -> QueryKey {
        query_key!["dashboard", "upcoming-events"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        Self {
            stats: ResourceView::mount(ctx, Self::stats_key(), QueryOptions::default()),
            upcoming: ResourceView::mount(ctx, Self::upcoming_key(), QueryOptions::default()),
        }
    }

    pub fn render(&self) -> AppResult<DashboardSnapshot> {
        let stats_state = self.stats.state();
        let stats: Option<DashboardStats> = stats_state.decode()?;
        let upcoming = list_view::<Event, _>(&self.upcoming.state(), &SearchText::default())?;
        let error = stats_state
            .error
            .filter(|err| err.kind() != ErrorKind::NotFound)
            .or_else(|| upcoming.error.clone());

        Ok(DashboardSnapshot {
            cards: stats.as_ref().map(stat_cards).unwrap_or_default(),
            stats,
            upcoming: upcoming.map(EventRow::from),
            error,
        })
    }

    pub fn stats_query(&mut self) -> &mut ResourceView<DashboardStats> {
        &mut self.stats
    }

    pub fn upcoming_query(&mut self) -> &mut ResourceView<Vec<Event>> {
        &mut self.upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_cards_order() {
        let stats = DashboardStats {
            active_teams: 4,
            total_players: 3,
            facilities: 4,
            upcoming_events: 2,
            unread_notifications: 2,
        };
        let cards = stat_cards(&stats);
        assert_eq!(cards[0], StatCard { label: "Active Teams", value: "4".to_string() });
        assert_eq!(cards.len(), 5);
    }
}
