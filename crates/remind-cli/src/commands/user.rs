use anyhow::Result;
use owo_colors::{OwoColorize, Style};
use remind_core::repository::SocialRepository;

use crate::cli::{UserCommand, UserSubcommand};
use crate::context::Context;

pub async fn user_command(ctx: &Context, command: UserCommand) -> Result<()> {
    match command.command {
        UserSubcommand::Add { name, email } => {
            let user = ctx.repo().add_user(name, email).await?;
            println!(
                "{} Added user: {} <{}>",
                "✓".style(Style::new().green().bold()),
                user.name.bright_white().bold(),
                user.email
            );
            println!("  {} User ID: {}", "→".blue(), user.id.to_string().yellow());
        }
    }
    Ok(())
}
