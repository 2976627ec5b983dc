pub mod api;
pub mod auth;
pub mod cache;
pub mod console;
pub mod session;

/// Connection settings for the client side.
///
/// `admin_email` mirrors the server's placeholder authorization model: the
/// console only offers administrative screens to this account, purely as a
/// UX guard. The server enforces its own check.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub admin_email: String,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
            admin_email: std::env::var("ADMIN_EMAIL")
                .unwrap_or_else(|_| "admin@example.com".into()),
        }
    }
}
