use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::models::{FriendshipStatus, UserId};
use remind_core::repository::SocialRepository;

use crate::cli::{FriendCommand, FriendSubcommand};
use crate::context::Context;
use crate::views::table::{display_requests, display_users};

pub async fn friend_command(ctx: &Context, command: FriendCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let success_style = Style::new().green().bold();

    match command.command {
        FriendSubcommand::Request { user_id: addressee } => {
            let request = ctx.repo().send_friend_request(user_id, addressee).await?;
            println!(
                "{} Friend request sent to user #{}",
                "✓".style(success_style),
                addressee
            );
            println!("  {} Request ID: {}", "→".blue(), request.id.to_string().yellow());
        }
        FriendSubcommand::Accept { request_id } => respond(ctx, user_id, request_id, true).await?,
        FriendSubcommand::Reject { request_id } => respond(ctx, user_id, request_id, false).await?,
        FriendSubcommand::List => {
            let friends = ctx.repo().list_friends(user_id).await?;
            display_users(&friends);
        }
        FriendSubcommand::Pending => {
            let requests = ctx.repo().list_pending_requests(user_id).await?;
            display_requests(&requests);
        }
    }
    Ok(())
}

async fn respond(ctx: &Context, user_id: UserId, request_id: i64, accept: bool) -> Result<()> {
    let friendship = ctx
        .repo()
        .respond_friend_request(user_id, request_id, accept)
        .await?;
    let verdict = match friendship.status {
        FriendshipStatus::Accepted => "accepted",
        _ => "rejected",
    };
    println!(
        "{} Friend request from user #{} {}",
        "✓".style(Style::new().green().bold()),
        friendship.requester_id,
        verdict
    );
    Ok(())
}
