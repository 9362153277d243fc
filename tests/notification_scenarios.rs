mod common;

use common::{context, within};
use std::sync::Arc;
use teamhub::{
    api::MockStore,
    core::filters::ReadTab,
    error::AppError,
    models::{NewNotification, NotificationCategory},
    views::{DashboardView, NoticeVariant, NotificationsView},
};

#[tokio::test]
async fn test_unread_tab_and_mark_read() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = NotificationsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();

    assert_eq!(view.render().unwrap().len(), 4);
    assert_eq!(view.unread_count().unwrap(), 2);

    view.set_tab(ReadTab::Unread);
    let unread = view.render().unwrap();
    assert_eq!(unread.len(), 2);
    assert!(unread.items().iter().all(|row| !row.notification.read));

    let marked = view.mark_read(1).await.unwrap();
    assert!(marked.read);
    // Optimistic write or refetch; either way the badge has moved.
    assert_eq!(view.unread_count().unwrap(), 1);

    within(view.query().wait_until(|list| list.iter().filter(|n| !n.read).count() == 1))
        .await
        .unwrap();
    assert_eq!(view.render().unwrap().len(), 1);

    view.set_tab(ReadTab::Read);
    assert_eq!(view.render().unwrap().len(), 3);
    assert_eq!(store.unread_notifications().await.len(), 1);
}

#[tokio::test]
async fn test_failed_mark_read_rolls_back() {
    let ctx = context(Arc::new(MockStore::new()));
    let mut view = NotificationsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();
    let before = view.query().records().unwrap();

    let result = view.mark_read(42).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
    assert_eq!(view.query().records().unwrap(), before);

    let notice = ctx.toaster.last().unwrap();
    assert_eq!(notice.variant, NoticeVariant::Destructive);
}

#[tokio::test]
async fn test_category_search_and_relative_age() {
    let ctx = context(Arc::new(MockStore::new()));
    let mut view = NotificationsView::mount(&ctx);
    within(view.query().settled()).await.unwrap();

    let rows = view.render().unwrap();
    // Newest first; the clock sits one hour after the game reminder.
    assert_eq!(rows.items()[0].notification.id, 1);
    assert_eq!(rows.items()[0].age, "1 hour ago");
    assert_eq!(rows.items()[0].priority.label, "High Priority");
    assert_eq!(rows.items()[3].age, "2 days ago");

    view.set_category_filter("game");
    let games = view.render().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games.items()[0].notification.category, NotificationCategory::Game);

    view.set_category_filter("all");
    view.set_search("REGISTRATION");
    let found = view.render().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.items()[0].notification.title, "Tournament Registration Open");
}

#[tokio::test]
async fn test_new_notification_updates_dashboard() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = NotificationsView::mount(&ctx);
    let mut dashboard = DashboardView::mount(&ctx);
    within(view.query().settled()).await.unwrap();
    within(dashboard.stats_query().settled()).await.unwrap();
    assert_eq!(dashboard.render().unwrap().stats.unwrap().unread_notifications, 2);

    let draft = NewNotification {
        title: "Field Closed".to_string(),
        message: "Main Field is closed for maintenance".to_string(),
        kind: "warning".into(),
        category: "general".into(),
        priority: "high".into(),
    };
    view.open_form();
    view.submit(draft).await.unwrap();
    assert!(!view.form().is_open);

    let stats = within(dashboard.stats_query().wait_until(|stats| stats.unread_notifications == 3))
        .await
        .unwrap();
    assert_eq!(stats.active_teams, 4);
    within(view.query().wait_until(|list| list.len() == 5)).await.unwrap();
}
