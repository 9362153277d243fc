mod common;

use common::{context, within};
use std::sync::Arc;
use std::time::Duration;
use teamhub::{
    api::MockStore,
    error::AppError,
    views::{ChatView, NoticeVariant},
};

#[tokio::test(start_paused = true)]
async fn test_chat_polls_until_dropped() {
    let ctx = context(Arc::new(MockStore::new()));
    let cache = ctx.client.cache().clone();
    let mut view = ChatView::mount(&ctx, 1);
    within(view.query().settled()).await.unwrap();
    assert!(view.is_polling());
    assert_eq!(cache.stats().fetches, 1);

    tokio::time::sleep(Duration::from_millis(3_100)).await;
    within(view.query().settled()).await.unwrap();
    assert_eq!(cache.stats().fetches, 2);

    tokio::time::sleep(Duration::from_secs(3)).await;
    within(view.query().settled()).await.unwrap();
    assert_eq!(cache.stats().fetches, 3);

    drop(view);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(cache.stats().fetches, 3);
}

#[tokio::test]
async fn test_send_urgent_reply() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = ChatView::mount(&ctx, 1);
    within(view.query().settled()).await.unwrap();
    assert_eq!(view.render().unwrap().len(), 2);

    view.set_draft("  Bring water bottles  ");
    view.set_urgent(true);
    view.reply_to(Some(2));
    let sent = view.send().await.unwrap();
    assert_eq!(sent.message, "Bring water bottles");
    assert!(sent.is_urgent);
    assert_eq!(sent.reply_to_id, Some(2));
    assert_eq!(view.draft(), "");

    let notice = ctx.toaster.last().unwrap();
    assert_eq!(notice.title, "Message sent");
    assert_eq!(notice.description, "Urgent message delivered to all team members");

    within(view.query().wait_until(|messages| messages.len() == 3))
        .await
        .unwrap();
    let rows = view.render().unwrap();
    let reply = &rows.items()[2];
    assert_eq!(reply.initials, "CT");
    assert_eq!(
        reply.reply_preview.as_ref().map(|(sender, _)| sender.as_str()),
        Some("Mike Johnson")
    );
}

#[tokio::test]
async fn test_blank_message_is_not_sent() {
    let store = Arc::new(MockStore::new());
    let ctx = context(store.clone());
    let mut view = ChatView::mount(&ctx, 1);
    within(view.query().settled()).await.unwrap();

    view.set_draft("   ");
    assert!(matches!(view.send().await, Err(AppError::Validation(_))));
    assert!(ctx.toaster.notices().is_empty());
    assert_eq!(store.team_messages(1).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_signed_out_send_fails_with_notice() {
    let ctx = context(Arc::new(MockStore::new().with_user(None)));
    let mut view = ChatView::mount(&ctx, 1);
    within(view.query().settled()).await.unwrap();

    view.set_draft("hello");
    assert!(matches!(view.send().await, Err(AppError::Unauthorized(_))));
    assert_eq!(view.draft(), "hello");
    let notice = ctx.toaster.last().unwrap();
    assert_eq!(notice.variant, NoticeVariant::Destructive);
    assert_eq!(notice.description, "Failed to send message");
}

#[tokio::test]
async fn test_unknown_team_renders_empty() {
    let ctx = context(Arc::new(MockStore::new()));
    let mut view = ChatView::mount(&ctx, 99);
    within(view.query().settled()).await.unwrap();
    let rows = view.render().unwrap();
    assert!(rows.is_empty());
    assert_eq!(rows.error, None);
}
