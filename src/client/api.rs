//! HTTP client for the user-management service.
//!
//! Wraps every outbound call, translates status codes into localized
//! [`ClientError`] values, and keeps the last-authenticated user's public
//! record in memory.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};

use crate::users::dto::{
    AdminPasswordChangeRequest, CreateUserRequest, Envelope, PasswordChangeRequest,
    ProfileUpdateRequest, PublicUser,
};

/// Fixed request timeout, matching the original client.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the API client, displayed to the user as-is.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Неверный логин или пароль")]
    Unauthorized,

    #[error("Недостаточно прав")]
    Forbidden,

    #[error("Пользователь не найден")]
    NotFound,

    #[error("Email уже используется")]
    EmailTaken,

    #[error("{}", .messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("Ошибка сервера")]
    Server(u16),

    #[error("Превышено время ожидания")]
    Timeout,

    #[error("Не удается подключиться к серверу")]
    Connect,

    #[error("Ошибка сети: {0}")]
    Transport(reqwest::Error),

    #[error("Неожиданная ошибка: {0}")]
    UnexpectedStatus(u16),

    #[error("Неожиданный формат ответа")]
    UnexpectedFormat,
}

#[derive(Debug, Clone)]
struct Credentials {
    email: String,
    password: String,
}

/// Client for the user-management HTTP API.
///
/// Holds the Basic-Auth credentials and the authenticated user's data as an
/// explicit per-instance context; nothing here is global.
pub struct UserApi {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<Credentials>,
    current_user: Option<PublicUser>,
}

impl UserApi {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ClientError::Transport)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            current_user: None,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(creds) = &self.credentials {
            builder = builder.basic_auth(&creds.email, Some(&creds.password));
        }
        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Envelope, ClientError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ClientError::Timeout
            } else if e.is_connect() {
                ClientError::Connect
            } else {
                ClientError::Transport(e)
            }
        })?;
        Self::interpret(response).await
    }

    /// Translate a response into an envelope or a localized error.
    async fn interpret(response: reqwest::Response) -> Result<Envelope, ClientError> {
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(response
                .json::<Envelope>()
                .await
                .unwrap_or_else(|_| Envelope::ok_message("Success"))),
            StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ClientError::Forbidden),
            StatusCode::NOT_FOUND => Err(ClientError::NotFound),
            StatusCode::CONFLICT => Err(ClientError::EmailTaken),
            StatusCode::UNPROCESSABLE_ENTITY => {
                let messages = match response.json::<Envelope>().await {
                    Ok(envelope) => {
                        let detailed: Vec<String> = envelope
                            .details
                            .unwrap_or_default()
                            .into_iter()
                            .map(|d| d.message)
                            .collect();
                        if detailed.is_empty() {
                            vec![envelope
                                .message
                                .unwrap_or_else(|| "Ошибка валидации данных".into())]
                        } else {
                            detailed
                        }
                    }
                    Err(_) => vec!["Ошибка валидации данных".into()],
                };
                Err(ClientError::Validation { messages })
            }
            s if s.is_server_error() => Err(ClientError::Server(s.as_u16())),
            s => Err(ClientError::UnexpectedStatus(s.as_u16())),
        }
    }

    /// Authenticate and remember the credentials.
    ///
    /// There is no dedicated "me" endpoint: credentials are validated by
    /// fetching the user list and the caller's own record is picked out of
    /// it. When the row is somehow absent a minimal stand-in is kept, same
    /// as the original client.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let email = email.trim().to_string();
        let previous = self.credentials.take();
        self.credentials = Some(Credentials {
            email: email.clone(),
            password: password.to_string(),
        });

        match self.send(self.request(Method::GET, "/users")).await {
            Ok(envelope) => {
                let users = envelope.users.unwrap_or_default();
                let me = users
                    .into_iter()
                    .find(|u| u.email == email)
                    .unwrap_or_else(|| PublicUser {
                        id: 0,
                        name: email.split('@').next().unwrap_or(&email).to_string(),
                        email: email.clone(),
                        created_at: chrono::Utc::now(),
                        phone: None,
                    });
                self.current_user = Some(me.clone());
                Ok(me)
            }
            Err(e) => {
                self.credentials = previous;
                self.current_user = None;
                Err(e)
            }
        }
    }

    /// Drop credentials and the cached user record.
    pub fn logout(&mut self) {
        self.credentials = None;
        self.current_user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some() && self.current_user.is_some()
    }

    pub fn current_user(&self) -> Option<&PublicUser> {
        self.current_user.as_ref()
    }

    /// Create a new user. The endpoint is open, no credentials required.
    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<PublicUser, ClientError> {
        let envelope = self
            .send(
                self.http
                    .post(format!("{}/users", self.base_url))
                    .json(req),
            )
            .await?;
        envelope.user.ok_or(ClientError::UnexpectedFormat)
    }

    pub async fn list_users(&self) -> Result<Vec<PublicUser>, ClientError> {
        let envelope = self.send(self.request(Method::GET, "/users")).await?;
        envelope.users.ok_or(ClientError::UnexpectedFormat)
    }

    pub async fn get_user(&self, id: i64) -> Result<PublicUser, ClientError> {
        let envelope = self
            .send(self.request(Method::GET, &format!("/users/{id}")))
            .await?;
        envelope.user.ok_or(ClientError::UnexpectedFormat)
    }

    /// Update the caller's profile and refresh the in-memory copy.
    pub async fn update_profile(
        &mut self,
        req: &ProfileUpdateRequest,
    ) -> Result<PublicUser, ClientError> {
        let envelope = self
            .send(self.request(Method::PUT, "/api/user/profile").json(req))
            .await?;
        let user = envelope.user.ok_or(ClientError::UnexpectedFormat)?;
        // Keep the stored credentials in sync when the login email changed.
        if let (Some(creds), true) = (
            self.credentials.as_mut(),
            req.email.is_some(),
        ) {
            creds.email = user.email.clone();
        }
        self.current_user = Some(user.clone());
        Ok(user)
    }

    pub async fn change_password(
        &self,
        new_password: &str,
        repeat_password: &str,
    ) -> Result<(), ClientError> {
        let body = PasswordChangeRequest {
            new_password: new_password.to_string(),
            new_password_repeat: repeat_password.to_string(),
        };
        self.send(self.request(Method::PUT, "/api/user/password").json(&body))
            .await?;
        Ok(())
    }

    pub async fn admin_delete_user(&self, id: i64) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, &format!("/users/{id}")))
            .await?;
        Ok(())
    }

    pub async fn admin_change_user_password(
        &self,
        id: i64,
        new_password: &str,
    ) -> Result<(), ClientError> {
        let body = AdminPasswordChangeRequest {
            new_password: new_password.to_string(),
        };
        self.send(
            self.request(Method::POST, &format!("/users/{id}/change-password"))
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
