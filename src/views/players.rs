use super::{FormState, ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::filters::{count, AllOf, FieldMatch, SearchText, Selection};
use crate::core::formatters::initials;
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{NewPlayer, Player, Team};
use crate::query_key;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRow {
    pub player: Player,
    pub initials: String,
    pub team: String,
    pub jersey: Option<String>,
    pub emergency_contact: Option<String>,
}

impl From<Player> for PlayerRow {
    fn from(player: Player) -> Self {
        Self {
            initials: initials(&player.first_name, &player.last_name),
            team: player
                .team_name
                .clone()
                .unwrap_or_else(|| "Unassigned".to_string()),
            jersey: player.jersey_number.map(|number| format!("#{}", number)),
            emergency_contact: player.emergency_contact().map(|guardian| guardian.full_name()),
            player,
        }
    }
}

fn create_player(variables: Value) -> AppResult<Command> {
    Ok(Command::CreatePlayer(serde_json::from_value(variables)?))
}

fn team_of(player: &Player) -> Option<i64> {
    player.team_id
}

/// Roster with search, a team filter and a create form with guardians.
pub struct PlayersView {
    ctx: ViewContext,
    players: ResourceView<Vec<Player>>,
    teams: ResourceView<Vec<Team>>,
    create: Mutation,
    search: SearchText,
    team: Selection<i64>,
    form: FormState,
}

impl PlayersView {
    pub fn key() -> QueryKey {
        query_key!["players"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        // Member counts live on the team records.
        let create = ctx.command_mutation(
            "create player",
            vec![Self::key(), query_key!["teams"], query_key!["dashboard"]],
            create_player,
        );
        Self {
            ctx: ctx.clone(),
            players: ResourceView::mount(ctx, Self::key(), QueryOptions::default()),
            teams: ResourceView::mount(ctx, query_key!["teams"], QueryOptions::default()),
            create,
            search: SearchText::default(),
            team: Selection::All,
            form: FormState::default(),
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = SearchText::new(text);
    }

    /// Accepts a team id or `"all"`.
    pub fn set_team_filter(&mut self, raw: &str) {
        self.team = Selection::parse_id(raw);
    }

    fn filter(&self) -> AllOf<'_, Player> {
        AllOf::new()
            .and(&self.search)
            .and(FieldMatch::new(self.team.clone(), team_of))
    }

    pub fn render(&self) -> AppResult<ListView<PlayerRow>> {
        Ok(self.players.render(&self.filter())?.map(PlayerRow::from))
    }

    /// Captains among the currently filtered players.
    pub fn captain_count(&self) -> AppResult<usize> {
        let shown = self.players.render(&self.filter())?;
        Ok(shown.items().iter().filter(|player| player.is_captain()).count())
    }

    pub fn count_for_team(&self, team_id: i64) -> AppResult<usize> {
        let players = self.players.records()?;
        Ok(count(&players, &FieldMatch::new(Selection::Only(team_id), team_of)))
    }

    /// Options for the team select: `("all", "All Teams")` then one per team.
    pub fn team_options(&self) -> AppResult<Vec<(String, String)>> {
        let mut options = vec![("all".to_string(), "All Teams".to_string())];
        options.extend(
            self.teams
                .records()?
                .into_iter()
                .map(|team| (team.id.to_string(), team.name)),
        );
        Ok(options)
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<Player>> {
        &mut self.players
    }

    pub fn teams_query(&mut self) -> &mut ResourceView<Vec<Team>> {
        &mut self.teams
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

    pub async fn submit(&mut self, draft: NewPlayer) -> AppResult<Player> {
        let validation = draft.validate();
        self.form
            .submit(
                &self.create,
                &self.ctx.toaster,
                &draft,
                validation,
                Notice::info("Player Added", "New player has been successfully added to the roster."),
                "Failed to add player. Please try again.",
            )
            .await
    }
}
