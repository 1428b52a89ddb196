use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::repository::SharingRepository;

use crate::cli::{ShareCommand, ShareTarget};
use crate::context::Context;

pub async fn share_reminder(ctx: &Context, command: ShareCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let id = command.id;

    let target = match command.target {
        ShareTarget::Friend { friend_id, can_edit } => {
            ctx.repo().share_with_friend(user_id, id, friend_id, can_edit).await?;
            let right = if can_edit { "can edit" } else { "can view" };
            format!("user #{} ({})", friend_id, right)
        }
        ShareTarget::Group { group_id } => {
            ctx.repo().share_with_group(user_id, id, group_id).await?;
            format!("group #{}", group_id)
        }
    };

    println!(
        "{} Shared reminder #{} with {}",
        "✓".style(Style::new().green().bold()),
        id,
        target.yellow()
    );
    Ok(())
}

pub async fn unshare_reminder(ctx: &Context, command: ShareCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let id = command.id;

    let target = match command.target {
        ShareTarget::Friend { friend_id, .. } => {
            ctx.repo().unshare_with_friend(user_id, id, friend_id).await?;
            format!("user #{}", friend_id)
        }
        ShareTarget::Group { group_id } => {
            ctx.repo().unshare_with_group(user_id, id, group_id).await?;
            format!("group #{}", group_id)
        }
    };

    println!(
        "{} Reminder #{} is no longer shared with {}",
        "✓".style(Style::new().green().bold()),
        id,
        target.yellow()
    );
    Ok(())
}
