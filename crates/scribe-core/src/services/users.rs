use chrono::{NaiveDate, TimeDelta, Utc};
use uuid::Uuid;

use super::{BlogService, require_max_len, require_present};
use crate::authz::Actor;
use crate::domain::User;
use crate::error::DomainError;
use crate::query::{Page, PageRequest};

const MAX_USERNAME_LEN: usize = 150;
const MAX_NAME_LEN: usize = 150;
const MAX_BIO_LEN: usize = 500;
const MAX_LOCATION_LEN: usize = 30;

/// Registration input.
#[derive(Debug, Clone, Default)]
pub struct RegisterUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
}

/// Profile edits; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub birth_date: Option<Option<NaiveDate>>,
    pub avatar: Option<Option<String>>,
}

/// A user together with their derived post count.
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user: User,
    pub post_count: u64,
}

impl BlogService {
    /// Open registration. The new account starts unverified.
    pub async fn register_user(&self, input: RegisterUser) -> Result<User, DomainError> {
        let email = input.email.trim().to_string();
        let username = input.username.trim().to_string();

        validate_email(&email)?;
        validate_username(&username)?;
        if input.password != input.password_confirm {
            return Err(DomainError::validation("Passwords don't match"));
        }
        self.validate_password(&input.password)?;
        validate_profile_text(&input.first_name, &input.last_name, &input.bio, &input.location)?;

        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(DomainError::Conflict("Email already registered".to_string()));
        }
        if self.repos.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::Conflict("Username already taken".to_string()));
        }

        let password_hash = self
            .passwords
            .hash(&input.password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let mut user = User::new(email, username, password_hash);
        user.first_name = input.first_name;
        user.last_name = input.last_name;
        user.bio = input.bio;
        user.location = input.location;
        user.birth_date = input.birth_date;

        let user = self.repos.users.insert(user).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Check credentials and stamp `last_login`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, DomainError> {
        let mut user = self
            .repos
            .users
            .find_by_email(email.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            tracing::warn!(user_id = %user.id, "Rejected login attempt");
            return Err(DomainError::Unauthorized);
        }

        let now = Utc::now();
        self.repos.users.record_login(user.id, now).await?;
        user.last_login = Some(now);
        Ok(user)
    }

    pub async fn current_user(&self, actor: &Actor) -> Result<UserProfile, DomainError> {
        let id = actor.require_user()?;
        self.get_user(id).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<UserProfile, DomainError> {
        let user = self.load_user(id).await?;
        self.profile(user).await
    }

    pub async fn list_users(&self, search: Option<&str>, page: u64) -> Result<Page<UserProfile>, DomainError> {
        let request = PageRequest::new(page, self.settings.page_size)?;
        let search = search.map(str::trim).filter(|s| !s.is_empty());
        let users = self.repos.users.list(search, request).await?;

        let mut profiles = Vec::with_capacity(users.items.len());
        for user in users.items {
            profiles.push(self.profile(user).await?);
        }
        Ok(Page::new(profiles, users.total, request))
    }

    /// Self-service profile edit.
    pub async fn update_user(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: UserChanges,
    ) -> Result<UserProfile, DomainError> {
        actor.require_user()?;
        let mut user = self.load_user(id).await?;
        actor.require_owner(user.id)?;

        if let Some(username) = changes.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            if username != user.username {
                if let Some(existing) = self.repos.users.find_by_username(&username).await? {
                    if existing.id != user.id {
                        return Err(DomainError::Conflict("Username already taken".to_string()));
                    }
                }
            }
            user.username = username;
        }
        if let Some(first_name) = changes.first_name {
            user.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            user.last_name = last_name;
        }
        if let Some(bio) = changes.bio {
            user.bio = bio;
        }
        if let Some(location) = changes.location {
            user.location = location;
        }
        if let Some(birth_date) = changes.birth_date {
            user.birth_date = birth_date;
        }
        if let Some(avatar) = changes.avatar {
            user.avatar = avatar;
        }
        validate_profile_text(&user.first_name, &user.last_name, &user.bio, &user.location)?;

        user.updated_at = Utc::now();
        let user = self.repos.users.update(user).await?;
        self.profile(user).await
    }

    /// Self-service account removal.
    pub async fn delete_user(&self, actor: &Actor, id: Uuid) -> Result<(), DomainError> {
        actor.require_user()?;
        let user = self.load_user(id).await?;
        actor.require_owner(user.id)?;

        self.repos.users.delete(user.id).await?;
        tracing::info!(user_id = %user.id, "User deleted");
        Ok(())
    }

    async fn profile(&self, user: User) -> Result<UserProfile, DomainError> {
        let post_count = self.repos.users.count_posts(user.id).await?;
        Ok(UserProfile { user, post_count })
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        if password.chars().count() < self.settings.min_password_len {
            return Err(DomainError::validation(format!(
                "Password must be at least {} characters",
                self.settings.min_password_len
            )));
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(DomainError::validation("Password must not be entirely numeric"));
        }
        Ok(())
    }
}

/// Users count as active when they logged in within this window.
pub(super) fn active_window() -> TimeDelta {
    TimeDelta::days(7)
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !valid {
        return Err(DomainError::validation("Invalid email address"));
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    require_present("Username", username)?;
    require_max_len("Username", username, MAX_USERNAME_LEN)?;
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::validation(
            "Username may only contain letters, digits and @/./+/-/_",
        ));
    }
    Ok(())
}

fn validate_profile_text(first: &str, last: &str, bio: &str, location: &str) -> Result<(), DomainError> {
    require_max_len("First name", first, MAX_NAME_LEN)?;
    require_max_len("Last name", last, MAX_NAME_LEN)?;
    require_max_len("Bio", bio, MAX_BIO_LEN)?;
    require_max_len("Location", location, MAX_LOCATION_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_needs_both_halves() {
        assert!(validate_email("ada@example.com").is_ok());
        assert!(validate_email("ada.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ada@").is_err());
    }

    #[test]
    fn username_charset() {
        assert!(validate_username("ada.l+blog_1").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("ada lovelace").is_err());
    }
}
