use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::repository::SocialRepository;

use crate::cli::{GroupCommand, GroupSubcommand};
use crate::context::Context;
use crate::views::table::{display_groups, display_members};

pub async fn group_command(ctx: &Context, command: GroupCommand) -> Result<()> {
    let user_id = ctx.user()?;
    let success_style = Style::new().green().bold();

    match command.command {
        GroupSubcommand::Create { name, description } => {
            let group = ctx.repo().create_group(user_id, name, description).await?;
            println!(
                "{} Created group: {}",
                "✓".style(success_style),
                group.name.bright_white().bold()
            );
            println!("  {} Group ID: {}", "→".blue(), group.id.to_string().yellow());
        }
        GroupSubcommand::AddMember { group_id, user_id: member } => {
            ctx.repo().add_group_member(user_id, group_id, member).await?;
            println!(
                "{} Added user #{} to group #{}",
                "✓".style(success_style),
                member,
                group_id
            );
        }
        GroupSubcommand::RemoveMember { group_id, user_id: member } => {
            ctx.repo().remove_group_member(user_id, group_id, member).await?;
            if member == user_id {
                println!("{} Left group #{}", "✓".style(success_style), group_id);
            } else {
                println!(
                    "{} Removed user #{} from group #{}",
                    "✓".style(success_style),
                    member,
                    group_id
                );
            }
        }
        GroupSubcommand::List => {
            let groups = ctx.repo().list_groups(user_id).await?;
            display_groups(&groups);
        }
        GroupSubcommand::Members { group_id } => {
            let members = ctx.repo().list_group_members(user_id, group_id).await?;
            display_members(&members);
        }
    }
    Ok(())
}
