//! Expiring in-memory cache of the user list.

use std::time::{Duration, Instant};

use crate::users::dto::PublicUser;

/// Cached entries are served for 5 minutes, same as the original client.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Ordered user list plus its fetch timestamp.
#[derive(Debug)]
pub struct UserCache {
    users: Vec<PublicUser>,
    fetched_at: Option<Instant>,
    ttl: Duration,
}

impl UserCache {
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            users: Vec::new(),
            fetched_at: None,
            ttl,
        }
    }

    /// A cache is valid while it is non-empty and younger than the TTL.
    pub fn is_valid(&self) -> bool {
        match self.fetched_at {
            Some(at) => !self.users.is_empty() && at.elapsed() < self.ttl,
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn users(&self) -> &[PublicUser] {
        &self.users
    }

    pub fn fill(&mut self, users: Vec<PublicUser>) {
        self.users = users;
        self.fetched_at = Some(Instant::now());
    }

    pub fn invalidate(&mut self) {
        self.users.clear();
        self.fetched_at = None;
    }

    pub fn find_by_id(&self, id: i64) -> Option<&PublicUser> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<&PublicUser> {
        self.users.iter().find(|u| u.email == email)
    }

    pub fn age(&self) -> Option<Duration> {
        self.fetched_at.map(|at| at.elapsed())
    }
}

impl Default for UserCache {
    fn default() -> Self {
        Self::new()
    }
}
