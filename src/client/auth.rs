//! Login-state machine with a lazily checked session timeout.

use std::time::{Duration, Instant};

/// Sessions expire 8 hours after login, same as the original client.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(8 * 60 * 60);

/// Result of a lazy expiry check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    LoggedOut,
    LoggedIn,
    /// The session was logged in but the timeout has elapsed; this call
    /// performed the transition to logged-out. The caller is expected to
    /// drop credentials and notify subscribers exactly once.
    JustExpired,
}

/// LoggedOut -> LoggedIn(login time) -> LoggedOut on logout or expiry.
///
/// Expiry is observed on access, never by a background timer: every
/// authenticated-state query goes through [`AuthState::status`].
#[derive(Debug)]
pub struct AuthState {
    login_time: Option<Instant>,
    timeout: Duration,
}

impl AuthState {
    pub fn new() -> Self {
        Self::with_timeout(SESSION_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            login_time: None,
            timeout,
        }
    }

    pub fn record_login(&mut self) {
        self.login_time = Some(Instant::now());
    }

    pub fn record_logout(&mut self) {
        self.login_time = None;
    }

    /// Lazy expiry check; transitions to logged-out when the timeout has
    /// elapsed.
    pub fn status(&mut self) -> AuthStatus {
        match self.login_time {
            None => AuthStatus::LoggedOut,
            Some(at) if at.elapsed() > self.timeout => {
                self.login_time = None;
                AuthStatus::JustExpired
            }
            Some(_) => AuthStatus::LoggedIn,
        }
    }

    /// Time left before expiry, without side effects.
    pub fn time_remaining(&self) -> Option<Duration> {
        self.login_time
            .map(|at| self.timeout.saturating_sub(at.elapsed()))
    }

    /// Extend the session on user activity.
    pub fn refresh(&mut self) {
        if self.login_time.is_some() {
            self.login_time = Some(Instant::now());
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::new()
    }
}
