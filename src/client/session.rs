//! Session layer: composes the API client, the auth state machine, and the
//! user-list cache, and owns the policies between them — cache reuse,
//! stale-data tolerance, invalidation on mutation, and the client-side admin
//! gate.

use std::time::Duration;

use tokio::sync::broadcast;

use crate::client::api::{ClientError, UserApi};
use crate::client::auth::{AuthState, AuthStatus};
use crate::client::cache::UserCache;
use crate::client::ClientConfig;
use crate::users::dto::{CreateUserRequest, ProfileUpdateRequest, PublicUser};

/// State-change notifications fanned out to interested screens. Delivery is
/// per-subscriber: a lagging or dropped receiver cannot affect the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
    SessionExpired,
    UsersChanged,
}

/// Result of a list fetch. `stale_warning` is set when the request failed
/// and previously cached data was served instead.
#[derive(Debug)]
pub struct UserListing {
    pub users: Vec<PublicUser>,
    pub stale_warning: Option<String>,
}

pub struct ClientSession {
    api: UserApi,
    auth: AuthState,
    cache: UserCache,
    admin_email: String,
    events: broadcast::Sender<SessionEvent>,
}

impl ClientSession {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            api: UserApi::new(&config.base_url)?,
            auth: AuthState::new(),
            cache: UserCache::new(),
            admin_email: config.admin_email.clone(),
            events,
        })
    }

    /// Test constructor with injectable timeouts.
    pub fn with_parts(config: &ClientConfig, auth: AuthState, cache: UserCache) -> Result<Self, ClientError> {
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            api: UserApi::new(&config.base_url)?,
            auth,
            cache,
            admin_email: config.admin_email.clone(),
            events,
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; screens come and go.
        let _ = self.events.send(event);
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let user = self.api.login(email, password).await?;
        self.auth.record_login();
        self.emit(SessionEvent::LoggedIn);
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.api.logout();
        self.auth.record_logout();
        self.cache.invalidate();
        self.emit(SessionEvent::LoggedOut);
    }

    /// Authenticated-state query with the lazy expiry check. An elapsed
    /// timeout is observed here, dropping credentials and notifying
    /// subscribers once.
    pub fn is_authenticated(&mut self) -> bool {
        match self.auth.status() {
            AuthStatus::LoggedIn => self.api.is_authenticated(),
            AuthStatus::JustExpired => {
                self.api.logout();
                self.cache.invalidate();
                self.emit(SessionEvent::SessionExpired);
                self.emit(SessionEvent::LoggedOut);
                false
            }
            AuthStatus::LoggedOut => false,
        }
    }

    /// UX guard only; the server performs its own admin check.
    pub fn is_admin(&mut self) -> bool {
        self.is_authenticated()
            && self
                .api
                .current_user()
                .map(|u| u.email == self.admin_email)
                .unwrap_or(false)
    }

    pub fn current_user(&mut self) -> Option<PublicUser> {
        if self.is_authenticated() {
            self.api.current_user().cloned()
        } else {
            None
        }
    }

    pub fn time_remaining(&self) -> Option<Duration> {
        self.auth.time_remaining()
    }

    pub fn refresh_activity(&mut self) {
        self.auth.refresh();
    }

    /// Registration is open; a success invalidates the cached list.
    pub async fn register(&mut self, req: &CreateUserRequest) -> Result<PublicUser, ClientError> {
        let user = self.api.create_user(req).await?;
        self.cache.invalidate();
        self.emit(SessionEvent::UsersChanged);
        Ok(user)
    }

    /// Fetch the user list.
    ///
    /// Served from cache while it is valid, unless `force_refresh`. On a
    /// failed refresh, stale cached data is returned with a warning rather
    /// than propagating the failure — unless nothing is cached, in which
    /// case the error surfaces.
    pub async fn users(&mut self, force_refresh: bool) -> Result<UserListing, ClientError> {
        if !force_refresh && self.cache.is_valid() {
            return Ok(UserListing {
                users: self.cache.users().to_vec(),
                stale_warning: None,
            });
        }

        match self.api.list_users().await {
            Ok(users) => {
                self.cache.fill(users.clone());
                self.emit(SessionEvent::UsersChanged);
                Ok(UserListing {
                    users,
                    stale_warning: None,
                })
            }
            Err(e) if !self.cache.is_empty() => Ok(UserListing {
                users: self.cache.users().to_vec(),
                stale_warning: Some(format!("Using cached data: {e}")),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn update_profile(
        &mut self,
        req: &ProfileUpdateRequest,
    ) -> Result<PublicUser, ClientError> {
        let user = self.api.update_profile(req).await?;
        self.cache.invalidate();
        self.emit(SessionEvent::UsersChanged);
        Ok(user)
    }

    pub async fn change_password(
        &self,
        new_password: &str,
        repeat_password: &str,
    ) -> Result<(), ClientError> {
        self.api.change_password(new_password, repeat_password).await
    }

    pub async fn admin_delete_user(&mut self, id: i64) -> Result<(), ClientError> {
        if !self.is_admin() {
            return Err(ClientError::Forbidden);
        }
        self.api.admin_delete_user(id).await?;
        self.cache.invalidate();
        self.emit(SessionEvent::UsersChanged);
        Ok(())
    }

    pub async fn admin_change_user_password(
        &mut self,
        id: i64,
        new_password: &str,
    ) -> Result<(), ClientError> {
        if !self.is_admin() {
            return Err(ClientError::Forbidden);
        }
        self.api.admin_change_user_password(id, new_password).await
    }

    pub fn find_cached_user(&self, id: i64) -> Option<PublicUser> {
        self.cache.find_by_id(id).cloned()
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig {
            base_url: "http://localhost:8000".into(),
            admin_email: "admin@example.com".into(),
        }
    }

    #[tokio::test]
    async fn logged_out_session_has_no_user_and_no_admin_rights() {
        let mut session = ClientSession::new(&config()).expect("session builds");
        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
        assert!(session.current_user().is_none());
        assert_eq!(session.time_remaining(), None);
    }

    #[tokio::test]
    async fn admin_calls_are_gated_client_side() {
        let mut session = ClientSession::new(&config()).expect("session builds");
        let err = session.admin_delete_user(1).await.unwrap_err();
        assert!(matches!(err, ClientError::Forbidden));
        let err = session
            .admin_change_user_password(1, "abc12345")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Forbidden));
    }

    #[tokio::test]
    async fn expiry_emits_events_once() {
        let cfg = config();
        let mut session =
            ClientSession::with_parts(&cfg, AuthState::with_timeout(Duration::ZERO), UserCache::new())
                .expect("session builds");
        let mut events = session.subscribe();

        // Simulate a completed login without the network round-trip.
        session.refresh_activity();
        session.auth.record_login();
        std::thread::sleep(Duration::from_millis(5));

        assert!(!session.is_authenticated());
        assert_eq!(events.try_recv().unwrap(), SessionEvent::SessionExpired);
        assert_eq!(events.try_recv().unwrap(), SessionEvent::LoggedOut);
        assert!(events.try_recv().is_err());

        // Asking again does not replay the transition.
        assert!(!session.is_authenticated());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn events_do_not_block_without_subscribers() {
        let mut session = ClientSession::new(&config()).expect("session builds");
        // No receiver anywhere; emitting must be a no-op, not an error.
        session.logout();
        assert!(!session.is_authenticated());
    }
}
