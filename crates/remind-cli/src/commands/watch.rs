use std::sync::Arc;

use anyhow::Result;
use owo_colors::OwoColorize;
use remind_core::api::LocalReminderApi;
use remind_core::models::GeoPoint;
use remind_core::notify::NotificationPoller;
use tracing::warn;

use crate::cli::WatchCommand;
use crate::context::Context;
use crate::presenter::{FixedPosition, TerminalPresenter};

pub async fn watch(ctx: &Context, command: WatchCommand) -> Result<()> {
    let user_id = ctx.user()?;

    let api = Arc::new(LocalReminderApi::new(
        ctx.repo.clone(),
        ctx.repo().location_store(),
        user_id,
    ));
    let preferences = Arc::new(ctx.config.preferences());
    if let Some(radius_km) = command.radius_km {
        preferences.set_geofencing_radius_km(radius_km);
    }

    let mut poller = NotificationPoller::new(
        api,
        Arc::new(TerminalPresenter::new(ctx.tz)),
        preferences,
        ctx.config.poller_config(),
    );
    if let (Some(lat), Some(lng)) = (command.lat, command.lng) {
        poller = poller.with_position_source(Arc::new(FixedPosition(GeoPoint { lat, lng })));
    }

    poller.start()?;
    println!(
        "Watching reminders for user #{}. Press {} to stop.",
        user_id,
        "Ctrl-C".bold()
    );

    tokio::signal::ctrl_c().await?;
    if let Err(e) = poller.stop().await {
        warn!(error = %e, "poller did not stop cleanly");
    }

    println!("Stopped watching.");
    Ok(())
}
