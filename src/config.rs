#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Placeholder authorization model: the single account allowed to use the
    /// administrative password-change endpoint. There is no role column.
    pub admin_email: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://userdesk.db?mode=rwc".into());
        let admin_email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".into());
        Ok(Self {
            database_url,
            admin_email,
        })
    }
}
