use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use scribe_core::domain::User;
use scribe_core::error::RepoError;
use scribe_core::ports::{BaseRepository, UserRepository, UserStats};
use scribe_core::query::{Page, PageRequest};

use super::{SharedTables, contains_ci, duplicate};

/// In-memory user repository.
pub struct InMemoryUserRepository {
    tables: SharedTables,
}

impl InMemoryUserRepository {
    pub(super) fn new(tables: SharedTables) -> Self {
        Self { tables }
    }
}

fn clashes(existing: &User, candidate: &User) -> Option<&'static str> {
    if existing.id == candidate.id {
        return None;
    }
    if existing.email == candidate.email {
        return Some("User with this email");
    }
    if existing.username == candidate.username {
        return Some("User with this username");
    }
    None
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(duplicate("User"));
        }
        if let Some(what) = tables.users.values().find_map(|u| clashes(u, &user)) {
            return Err(duplicate(what));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if let Some(what) = tables.users.values().find_map(|u| clashes(u, &user)) {
            return Err(duplicate(what));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        if self.tables.write().await.remove_user(id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self, search: Option<&str>, page: PageRequest) -> Result<Page<User>, RepoError> {
        let tables = self.tables.read().await;
        let needle = search.map(str::to_lowercase);

        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| {
                needle.as_deref().is_none_or(|n| {
                    u.display_name_contains(n) || contains_ci(&u.email, n)
                })
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));

        Ok(Page::from_sorted(users, page))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn count_posts(&self, id: Uuid) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| p.author_id == id).count() as u64)
    }

    async fn stats(&self, active_since: DateTime<Utc>) -> Result<UserStats, RepoError> {
        let tables = self.tables.read().await;
        let users = tables.users.values();
        Ok(UserStats {
            total_users: users.len() as u64,
            verified_users: tables.users.values().filter(|u| u.is_verified).count() as u64,
            active_users: tables
                .users
                .values()
                .filter(|u| u.last_login.is_some_and(|at| at >= active_since))
                .count() as u64,
        })
    }
}
