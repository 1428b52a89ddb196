use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono_tz::Tz;
use remind_core::models::UserId;
use remind_core::repository::SqliteRepository;

use crate::config::Config;

/// Everything a command needs: the repository, settings and the acting user.
pub struct Context {
    pub repo: Arc<SqliteRepository>,
    pub config: Config,
    pub tz: Tz,
    user: Option<UserId>,
}

impl Context {
    pub fn new(repo: Arc<SqliteRepository>, config: Config, tz: Tz, user_flag: Option<UserId>) -> Self {
        let user = user_flag.or(config.user);
        Self { repo, config, tz, user }
    }

    pub fn repo(&self) -> &SqliteRepository {
        &self.repo
    }

    pub fn user(&self) -> Result<UserId> {
        self.user
            .ok_or_else(|| anyhow!("No acting user. Pass --user <ID> or set REMIND_USER"))
    }
}
