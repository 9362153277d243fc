// Prints the main Team Hub screens from a backend.
//
//   teamhub_console                      in-process mock store
//   teamhub_console --remote             server at API_BASE_URL
//   teamhub_console --dev-login <email>  development sign-in first

use std::sync::Arc;
use teamhub::{
    api::{MockStore, RemoteBackend},
    config::Config,
    core::formatters::pluralize,
    error::AppResult,
    infrastructure::{
        Auth, Clock, DevSessionProvider, InMemorySessionStore, QueryClient, RemoteSessionProvider,
        SessionProvider, DEV_CREDENTIALS,
    },
    views::{DashboardView, NotificationsView, ScheduleView, TeamsView, Toaster, ViewContext},
};
use tracing_subscriber::EnvFilter;

async fn print_screens(ctx: &ViewContext) -> AppResult<()> {
    let mut dashboard = DashboardView::mount(ctx);
    dashboard.stats_query().settled().await?;
    dashboard.upcoming_query().settled().await?;
    let snapshot = dashboard.render()?;
    println!("📊 Dashboard");
    for card in &snapshot.cards {
        println!("  {:<22} {}", card.label, card.value);
    }
    for row in snapshot.upcoming.items() {
        println!("  ⏰ {} - {} {}", row.event.title, row.date, row.time);
    }
    if let Some(err) = &snapshot.error {
        println!("  ⚠️  {}", err);
    }

    let mut teams = TeamsView::mount(ctx);
    teams.query().settled().await?;
    let teams = teams.render()?;
    println!("\n👥 Teams ({})", teams.len());
    for row in teams.items() {
        println!(
            "  {} {:<20} {:<12} {:<4} {}  ★ {}",
            row.sport.icon,
            row.team.name,
            row.sport.label,
            row.team.category,
            row.members,
            row.rating
        );
    }

    let mut schedule = ScheduleView::mount(ctx);
    schedule.query().settled().await?;
    let events = schedule.render()?;
    println!("\n📅 Schedule ({})", pluralize(events.len() as i64, "event"));
    for row in events.items() {
        println!(
            "  [{}] {:<34} {} at {} · {} ({})",
            row.kind.label, row.event.title, row.date, row.time, row.event.location, row.status.label
        );
    }

    let mut notifications = NotificationsView::mount(ctx);
    notifications.query().settled().await?;
    let rows = notifications.render()?;
    println!("\n🔔 Notifications ({} unread)", notifications.unread_count()?);
    for row in rows.items() {
        let marker = if row.notification.read { " " } else { "•" };
        println!(
            "  {} {:<30} {:<8} {:<10} {}",
            marker, row.notification.title, row.priority.label, row.category.label, row.age
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("teamhub=warn")),
        )
        .init();

    let mut config = Config::from_env()?;
    let args: Vec<String> = std::env::args().collect();
    let remote = args.iter().any(|arg| arg == "--remote");
    let dev_login = args
        .iter()
        .position(|arg| arg == "--dev-login")
        .map(|index| args.get(index + 1).cloned().unwrap_or_default());
    if dev_login.is_some() {
        config.dev_auth.enabled = true;
    }

    let client = QueryClient::new(config.cache.clone());
    let toaster = Toaster::new();
    let clock = Clock::system();

    let ctx = if remote {
        println!("🌐 Connecting to {}", config.client.api_base_url);
        let backend = Arc::new(RemoteBackend::new(&config.client)?);
        ViewContext::new(client, backend, toaster, clock.clone(), config.clone())
    } else {
        println!("🧪 Using the in-process mock store");
        let store = Arc::new(MockStore::from_config(&config.mock));
        ViewContext::new(client, store, toaster, clock.clone(), config.clone())
    };

    let dev = DevSessionProvider::new(Arc::new(InMemorySessionStore::new()), clock, &config.dev_auth)?
        .map(|dev| dev.with_invalidation(ctx.client.bus().clone()));
    if let (Some(dev), Some(email)) = (&dev, &dev_login) {
        let password = DEV_CREDENTIALS
            .iter()
            .find(|credential| credential.email == email.as_str())
            .map_or("dev", |credential| credential.password);
        dev.sign_in(email, password)?;
    }
    let remote_session: Arc<dyn SessionProvider> = Arc::new(RemoteSessionProvider::new(
        ctx.client.cache().clone(),
        ctx.fetcher.clone(),
    ));
    let auth = Auth::new(dev, Some(remote_session));
    match auth.resolve().await.user {
        Some(user) => println!("👤 Signed in as {} ({})", user.display_name(), user.role),
        None => println!("👤 Not signed in"),
    }

    print_screens(&ctx).await?;

    let stats = ctx.client.cache().stats();
    tracing::info!(
        "Cache: {} entries, {} fetches, hit rate {:.2}",
        stats.entries,
        stats.fetches,
        stats.hit_rate()
    );
    Ok(())
}
