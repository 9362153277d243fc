mod common;

use common::{context, within};
use std::sync::Arc;
use teamhub::{
    api::MockStore,
    error::AppError,
    models::{NewPlayer, NewTeam, Sport},
    views::{ListState, NoticeVariant, PlayersView, TeamsView},
};

#[tokio::test]
async fn test_create_team_refreshes_list_and_closes_form() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = TeamsView::mount(&ctx);

    within(view.query().settled()).await.unwrap();
    assert_eq!(view.render().unwrap().len(), 4);

    view.open_form();
    assert!(view.form().is_open);
    let team = view
        .submit(NewTeam::new("Lightning Bolts", "basketball", "U12"))
        .await
        .unwrap();
    assert_eq!(team.id, 5);
    assert_eq!(team.sport, Sport::Basketball);
    assert!(!view.form().is_open);
    assert!(!view.is_submitting());
    assert_eq!(ctx.toaster.last().unwrap().title, "Team Created");

    // The invalidation travels over the bus; wait for the refetch to land.
    let teams = within(view.query().wait_until(|teams| teams.len() == 5))
        .await
        .unwrap();
    assert_eq!(teams.len(), 5);

    view.set_search("lightning");
    let rows = view.render().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.items()[0].sport.label, "Basketball");
}

#[tokio::test]
async fn test_invalid_team_keeps_form_open() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = TeamsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();

    view.open_form();
    let result = view.submit(NewTeam::new("   ", "basketball", "U12")).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(view.form().is_open);
    assert!(view.form().error.is_some());
    assert!(ctx.toaster.notices().is_empty());
    assert_eq!(store.teams().await.len(), 4);
}

#[tokio::test]
async fn test_search_matches_sport_and_empty_state() {
    let ctx = context(Arc::new(MockStore::new()));
    let mut view = TeamsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();

    view.set_search("SOCCER");
    let rows = view.render().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.items()[0].team.name, "Thunder Hawks");

    view.set_search("cricket");
    assert_eq!(view.render().unwrap().state, ListState::Empty);
}

#[tokio::test]
async fn test_player_failure_surfaces_notice() {
    let ctx = context(Arc::new(MockStore::new()));
    let mut view = PlayersView::mount(&ctx);
    within(view.query().settled()).await.unwrap();

    let mut draft = NewPlayer::new("Ava", "Lopez");
    draft.team_id = Some(99);
    view.open_form();
    let result = view.submit(draft).await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert!(view.form().is_open);
    let notice = ctx.toaster.last().unwrap();
    assert_eq!(notice.variant, NoticeVariant::Destructive);
    assert_eq!(notice.description, "Failed to add player. Please try again.");
}

#[tokio::test]
async fn test_player_team_filter_and_member_counts() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = PlayersView::mount(&ctx);
    within(view.query().settled()).await.unwrap();
    within(view.teams_query().settled()).await.unwrap();

    assert_eq!(view.render().unwrap().len(), 3);
    assert_eq!(view.captain_count().unwrap(), 1);
    assert_eq!(view.team_options().unwrap().len(), 5);

    view.set_team_filter("1");
    assert_eq!(view.render().unwrap().len(), 2);
    view.set_team_filter("not-a-team");
    assert_eq!(view.render().unwrap().len(), 3);

    let mut draft = NewPlayer::new("Ava", "Lopez");
    draft.team_id = Some(2);
    view.submit(draft).await.unwrap();

    let players = within(view.query().wait_until(|players| players.len() == 4))
        .await
        .unwrap();
    assert_eq!(players.len(), 4);
    assert_eq!(view.count_for_team(2).unwrap(), 2);

    // Creating a player also refreshes the team list.
    let teams = within(
        view.teams_query()
            .wait_until(|teams| teams.iter().any(|team| team.id == 2 && team.member_count == 19)),
    )
    .await
    .unwrap();
    assert_eq!(teams.len(), 4);
}
