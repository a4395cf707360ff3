use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity - an account that can author posts, comments and likes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
    pub location: String,
    pub birth_date: Option<NaiveDate>,
    pub avatar: Option<String>,
    pub is_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new, unverified user with generated ID and timestamps.
    pub fn new(email: String, username: String, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            username,
            password_hash,
            first_name: String::new(),
            last_name: String::new(),
            bio: String::new(),
            location: String::new(),
            birth_date: None,
            avatar: None,
            is_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", trimmed; empty when neither is set.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// Case-insensitive match against the fields that make up the display name.
    pub fn display_name_contains(&self, needle_lower: &str) -> bool {
        [&self.username, &self.first_name, &self.last_name]
            .iter()
            .any(|field| field.to_lowercase().contains(needle_lower))
    }
}
