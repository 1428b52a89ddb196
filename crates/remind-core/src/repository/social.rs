use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::error::CoreError;
use crate::models::{
    Friendship, FriendshipStatus, Group, GroupId, GroupMember, GroupRole, User, UserId,
};
use crate::repository::{SocialRepository, SqliteRepository};

#[async_trait]
impl SocialRepository for SqliteRepository {
    async fn add_user(&self, name: String, email: String) -> Result<User, CoreError> {
        let name = name.trim().to_string();
        let email = email.trim().to_lowercase();
        if name.is_empty() || email.is_empty() {
            return Err(CoreError::Validation("Name and email are required".to_string()));
        }
        if self.find_user_by_email(&email).await?.is_some() {
            return Err(CoreError::Validation(format!("Email already registered: {}", email)));
        }

        let result = sqlx::query("INSERT INTO users (name, email, created_at) VALUES (?, ?, ?)")
            .bind(&name)
            .bind(&email)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;

        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, CoreError> {
        let user = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(self.pool())
            .await?;
        Ok(user)
    }

    async fn send_friend_request(&self, requester_id: UserId, addressee_id: UserId) -> Result<Friendship, CoreError> {
        if requester_id == addressee_id {
            return Err(CoreError::Validation("Cannot befriend yourself".to_string()));
        }
        if self.find_user_by_id(addressee_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("User {}", addressee_id)));
        }

        let existing: Option<Friendship> = sqlx::query_as(
            r#"SELECT * FROM friendships
            WHERE (requester_id = ? AND addressee_id = ?) OR (requester_id = ? AND addressee_id = ?)"#,
        )
        .bind(requester_id)
        .bind(addressee_id)
        .bind(addressee_id)
        .bind(requester_id)
        .fetch_optional(self.pool())
        .await?;

        let mut tx = self.pool().begin().await?;
        match existing.map(|f| (f.id, f.status)) {
            Some((_, FriendshipStatus::Accepted)) => {
                return Err(CoreError::Validation("Already friends".to_string()));
            }
            Some((_, FriendshipStatus::Pending)) => {
                return Err(CoreError::Validation("A friend request is already pending".to_string()));
            }
            Some((id, FriendshipStatus::Rejected)) => {
                sqlx::query("DELETE FROM friendships WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            None => {}
        }

        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO friendships (requester_id, addressee_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(requester_id)
        .bind(addressee_id)
        .bind(FriendshipStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let friendship = sqlx::query_as("SELECT * FROM friendships WHERE id = ?")
            .bind(result.last_insert_rowid())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        debug!(requester_id, addressee_id, "friend request sent");
        Ok(friendship)
    }

    async fn respond_friend_request(&self, addressee_id: UserId, friendship_id: i64, accept: bool) -> Result<Friendship, CoreError> {
        let status = if accept {
            FriendshipStatus::Accepted
        } else {
            FriendshipStatus::Rejected
        };

        let result = sqlx::query(
            r#"UPDATE friendships SET status = ?, updated_at = ?
            WHERE id = ? AND addressee_id = ? AND status = 'pending'"#,
        )
        .bind(status)
        .bind(Utc::now())
        .bind(friendship_id)
        .bind(addressee_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Friend request {}", friendship_id)));
        }

        let friendship = sqlx::query_as("SELECT * FROM friendships WHERE id = ?")
            .bind(friendship_id)
            .fetch_one(self.pool())
            .await?;
        Ok(friendship)
    }

    async fn list_friends(&self, user_id: UserId) -> Result<Vec<User>, CoreError> {
        let friends = sqlx::query_as(
            r#"SELECT u.* FROM users u
            JOIN friendships f
              ON (f.requester_id = ? AND f.addressee_id = u.id)
              OR (f.addressee_id = ? AND f.requester_id = u.id)
            WHERE f.status = 'accepted'
            ORDER BY u.name"#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(friends)
    }

    async fn list_pending_requests(&self, user_id: UserId) -> Result<Vec<Friendship>, CoreError> {
        let requests = sqlx::query_as(
            "SELECT * FROM friendships WHERE addressee_id = ? AND status = 'pending' ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(requests)
    }

    async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, CoreError> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM friendships
            WHERE status = 'accepted'
              AND ((requester_id = ? AND addressee_id = ?) OR (requester_id = ? AND addressee_id = ?))"#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_one(self.pool())
        .await?;
        Ok(count > 0)
    }

    async fn create_group(&self, owner_id: UserId, name: String, description: Option<String>) -> Result<Group, CoreError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(CoreError::Validation("Group name is required".to_string()));
        }

        let now = Utc::now();
        let mut tx = self.pool().begin().await?;
        let result = sqlx::query(
            "INSERT INTO user_groups (name, description, owner_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&name)
        .bind(&description)
        .bind(owner_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let group_id = result.last_insert_rowid();

        sqlx::query("INSERT INTO group_members (group_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)")
            .bind(group_id)
            .bind(owner_id)
            .bind(GroupRole::Admin)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let group = sqlx::query_as("SELECT * FROM user_groups WHERE id = ?")
            .bind(group_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(group_id, owner_id, "group created");
        Ok(group)
    }

    async fn add_group_member(&self, admin_id: UserId, group_id: GroupId, user_id: UserId) -> Result<(), CoreError> {
        match self.member_role(group_id, admin_id).await? {
            None => return Err(CoreError::NotFound(format!("Group {}", group_id))),
            Some(GroupRole::Member) => {
                return Err(CoreError::Forbidden("Only group admins can add members".to_string()));
            }
            Some(GroupRole::Admin) => {}
        }
        if !self.are_friends(admin_id, user_id).await? {
            return Err(CoreError::Forbidden(
                "Only accepted friends can be added to a group".to_string(),
            ));
        }
        if self.member_role(group_id, user_id).await?.is_some() {
            return Err(CoreError::Validation(format!(
                "User {} is already a member of group {}",
                user_id, group_id
            )));
        }

        sqlx::query("INSERT INTO group_members (group_id, user_id, role, joined_at) VALUES (?, ?, ?, ?)")
            .bind(group_id)
            .bind(user_id)
            .bind(GroupRole::Member)
            .bind(Utc::now())
            .execute(self.pool())
            .await?;

        debug!(group_id, user_id, "group member added");
        Ok(())
    }

    async fn remove_group_member(&self, actor_id: UserId, group_id: GroupId, user_id: UserId) -> Result<(), CoreError> {
        let owner_id: UserId = sqlx::query_scalar("SELECT owner_id FROM user_groups WHERE id = ?")
            .bind(group_id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Group {}", group_id)))?;

        let actor_role = self
            .member_role(group_id, actor_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Group {}", group_id)))?;

        if user_id == owner_id {
            return Err(CoreError::Validation("The group owner cannot leave the group".to_string()));
        }
        if actor_id != user_id && actor_role != GroupRole::Admin {
            return Err(CoreError::Forbidden("Only group admins can remove other members".to_string()));
        }

        let result = sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .execute(self.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "User {} in group {}",
                user_id, group_id
            )));
        }
        debug!(group_id, user_id, "group member removed");
        Ok(())
    }

    async fn list_groups(&self, user_id: UserId) -> Result<Vec<Group>, CoreError> {
        let groups = sqlx::query_as(
            r#"SELECT g.* FROM user_groups g
            JOIN group_members gm ON gm.group_id = g.id
            WHERE gm.user_id = ?
            ORDER BY g.created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?;
        Ok(groups)
    }

    async fn list_group_members(&self, user_id: UserId, group_id: GroupId) -> Result<Vec<GroupMember>, CoreError> {
        if !self.is_group_member(group_id, user_id).await? {
            return Err(CoreError::NotFound(format!("Group {}", group_id)));
        }

        let members = sqlx::query_as(
            r#"SELECT gm.group_id, gm.user_id, u.name, u.email, gm.role, gm.joined_at
            FROM group_members gm
            JOIN users u ON u.id = gm.user_id
            WHERE gm.group_id = ?
            ORDER BY gm.role, u.name"#,
        )
        .bind(group_id)
        .fetch_all(self.pool())
        .await?;
        Ok(members)
    }

    async fn is_group_member(&self, group_id: GroupId, user_id: UserId) -> Result<bool, CoreError> {
        Ok(self.member_role(group_id, user_id).await?.is_some())
    }
}

impl SqliteRepository {
    async fn member_role(&self, group_id: GroupId, user_id: UserId) -> Result<Option<GroupRole>, CoreError> {
        let role = sqlx::query_scalar("SELECT role FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .fetch_optional(self.pool())
            .await?;
        Ok(role)
    }
}
