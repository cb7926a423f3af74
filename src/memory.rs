//! In-process store backing both repositories. Used by the test suites and
//! handy for running the API without Postgres.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    titles::{repo::TitleRepo, repo_types::Title},
};

#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    titles: Mutex<Vec<Title>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> anyhow::Result<MutexGuard<'_, HashMap<Uuid, User>>> {
        self.users
            .lock()
            .map_err(|_| anyhow::anyhow!("user store lock poisoned"))
    }

    fn titles(&self) -> anyhow::Result<MutexGuard<'_, Vec<Title>>> {
        self.titles
            .lock()
            .map_err(|_| anyhow::anyhow!("title store lock poisoned"))
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self.users()?.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users()?.get(&id).cloned())
    }

    async fn create(&self, new: NewUser<'_>) -> anyhow::Result<Option<User>> {
        let mut users = self.users()?;
        if users.values().any(|u| u.email == new.email) {
            return Ok(None);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_string(),
            username: new.username.to_string(),
            password_hash: new.password_hash.to_string(),
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(Some(user))
    }

    async fn soft_delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut users = self.users()?;
        match users.get_mut(&id) {
            Some(user) if user.is_active() => {
                let now = OffsetDateTime::now_utc();
                user.deleted_at = Some(now);
                user.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl TitleRepo for MemoryStore {
    async fn create(&self, user_id: Uuid, title: &str) -> anyhow::Result<Title> {
        // Same guarantee the titles.user_id foreign key gives in Postgres.
        if !self.users()?.contains_key(&user_id) {
            anyhow::bail!("insert title: user {user_id} does not exist");
        }
        let now = OffsetDateTime::now_utc();
        let row = Title {
            id: Uuid::new_v4(),
            title: title.to_string(),
            user_id,
            created_at: now,
            updated_at: now,
        };
        self.titles()?.push(row.clone());
        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Title>> {
        Ok(self
            .titles()?
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Title>> {
        Ok(self.titles()?.iter().find(|t| t.id == id).cloned())
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut titles = self.titles()?;
        let before = titles.len();
        titles.retain(|t| t.id != id);
        Ok(titles.len() != before)
    }
}
