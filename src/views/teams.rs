use super::{FormState, ListView, Notice, ResourceView, ViewContext};
use crate::api::Command;
use crate::core::descriptors::{Describe, Descriptor};
use crate::core::filters::SearchText;
use crate::core::formatters::{format_rating, pluralize};
use crate::error::AppResult;
use crate::infrastructure::mutation::Mutation;
use crate::infrastructure::query_cache::QueryOptions;
use crate::infrastructure::query_key::QueryKey;
use crate::models::{NewTeam, Team};
use crate::query_key;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub team: Team,
    pub sport: Descriptor,
    pub members: String,
    pub rating: String,
}

impl From<Team> for TeamRow {
    fn from(team: Team) -> Self {
        Self {
            sport: team.sport.descriptor(),
            members: pluralize(i64::from(team.member_count), "member"),
            rating: format_rating(team.rating),
            team,
        }
    }
}

fn create_team(variables: Value) -> AppResult<Command> {
    Ok(Command::CreateTeam(serde_json::from_value(variables)?))
}

/// Team list with search and a create form.
pub struct TeamsView {
    ctx: ViewContext,
    teams: ResourceView<Vec<Team>>,
    create: Mutation,
    search: SearchText,
    form: FormState,
}

impl TeamsView {
    pub fn key() -> QueryKey {
        query_key!["teams"]
    }

    pub fn mount(ctx: &ViewContext) -> Self {
        let create = ctx.command_mutation(
            "create team",
            vec![Self::key(), query_key!["dashboard"]],
            create_team,
        );
        Self {
            ctx: ctx.clone(),
            teams: ResourceView::mount(ctx, Self::key(), QueryOptions::default()),
            create,
            search: SearchText::default(),
            form: FormState::default(),
        }
    }

    pub fn set_search(&mut self, text: &str) {
        self.search = SearchText::new(text);
    }

    pub fn render(&self) -> AppResult<ListView<TeamRow>> {
        Ok(self.teams.render(&self.search)?.map(TeamRow::from))
    }

    pub fn query(&mut self) -> &mut ResourceView<Vec<Team>> {
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

    /// Submit button is disabled while this is true.
    pub fn is_submitting(&self) -> bool {
        self.create.is_pending()
    }

    pub async fn submit(&mut self, draft: NewTeam) -> AppResult<Team> {
        let validation = draft.validate();
        self.form
            .submit(
                &self.create,
                &self.ctx.toaster,
                &draft,
                validation,
                Notice::info("Team Created", "New team has been successfully created."),
                "Failed to create team. Please try again.",
            )
            .await
    }
}
