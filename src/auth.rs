use std::sync::LazyLock;

use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    api::{Backend, LoginRequest, RegisterRequest},
    session::{SessionToken, TokenStore},
    view::{Effect, MessageKind, RedirectReason, Route, StatusSlot, View},
};

pub const MIN_PASSWORD_LEN: usize = 6;

// constant pattern, compiled once
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

const LOGIN_EMPTY: &str = "Пожалуйста, заполните все поля!";
const LOGIN_PROGRESS: &str = "Проверка данных...";
const LOGIN_REJECTED: &str = "Неверный логин/пароль";
const REGISTER_EMPTY: &str = "Пожалуйста, заполните все поля";
const REGISTER_MISMATCH: &str = "Пароли не совпадают";
const REGISTER_SHORT: &str = "Пароль должен содержать минимум 6 символов";
const REGISTER_BAD_EMAIL: &str = "Введите корректный email адрес";
const REGISTER_PROGRESS: &str = "Регистрация...";
const REGISTER_REJECTED: &str = "Ошибка регистрации!";
const REGISTER_DONE: &str = "Регистрация прошла успешно";
const SERVER_UNAVAILABLE: &str = "Ошибка сервера! Попробуйте позже";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Blocked by local validation; nothing was sent.
    Invalid,
    SignedIn { username: String },
    Registered,
    Rejected(String),
    Unreachable,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Local checks of the registration form, in the order they are reported.
pub fn validate_registration(
    username: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), &'static str> {
    if username.is_empty() || email.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(REGISTER_EMPTY);
    }
    if password != confirm {
        return Err(REGISTER_MISMATCH);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(REGISTER_SHORT);
    }
    if !is_valid_email(email) {
        return Err(REGISTER_BAD_EMAIL);
    }
    Ok(())
}

/// Sign-in page: login and registration forms.
pub struct AuthController<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    store: &'a S,
}

impl<'a, B, S> AuthController<'a, B, S>
where
    B: Backend + ?Sized,
    S: TokenStore + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a S) -> Self {
        Self { backend, store }
    }

    pub async fn login<V: View>(&self, username: &str, password: &str, view: &mut V) -> AuthOutcome {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            view.apply(login_status(MessageKind::Error, LOGIN_EMPTY));
            return AuthOutcome::Invalid;
        }

        view.apply(login_status(MessageKind::Progress, LOGIN_PROGRESS));

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let reply = match self.backend.login(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(?err, "login request failed");
                view.apply(login_status(MessageKind::Error, SERVER_UNAVAILABLE));
                return AuthOutcome::Unreachable;
            }
        };

        let session_id = reply.session_id.filter(|id| !id.is_empty());
        match (reply.success, session_id) {
            (true, Some(session_id)) => {
                if let Err(err) = self.store.set(&SessionToken::new(session_id)) {
                    error!(?err, "failed to persist session");
                    view.apply(login_status(MessageKind::Error, SERVER_UNAVAILABLE));
                    return AuthOutcome::Unreachable;
                }
                let username = reply.username.unwrap_or_else(|| username.to_string());
                info!(%username, "signed in");
                view.apply(login_status(
                    MessageKind::Success,
                    format!("Добро пожаловать, {username}!"),
                ));
                view.apply(Effect::redirect(Route::App, RedirectReason::SignedIn));
                AuthOutcome::SignedIn { username }
            }
            _ => {
                let text = non_blank(reply.error).unwrap_or_else(|| LOGIN_REJECTED.to_string());
                view.apply(login_status(MessageKind::Error, text.clone()));
                AuthOutcome::Rejected(text)
            }
        }
    }

    pub async fn register<V: View>(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
        view: &mut V,
    ) -> AuthOutcome {
        let username = username.trim();
        let email = email.trim();
        if let Err(message) = validate_registration(username, email, password, confirm) {
            view.apply(register_status(MessageKind::Error, message));
            return AuthOutcome::Invalid;
        }

        view.apply(register_status(MessageKind::Progress, REGISTER_PROGRESS));

        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.backend.register(&request).await {
            Ok(reply) if reply.success => {
                info!(%username, "account registered");
                let text = non_blank(reply.message).unwrap_or_else(|| REGISTER_DONE.to_string());
                view.apply(register_status(MessageKind::Success, text));
                AuthOutcome::Registered
            }
            Ok(reply) => {
                let text = non_blank(reply.error).unwrap_or_else(|| REGISTER_REJECTED.to_string());
                view.apply(register_status(MessageKind::Error, text.clone()));
                AuthOutcome::Rejected(text)
            }
            Err(err) => {
                warn!(?err, "register request failed");
                view.apply(register_status(MessageKind::Error, SERVER_UNAVAILABLE));
                AuthOutcome::Unreachable
            }
        }
    }
}

fn non_blank(text: Option<String>) -> Option<String> {
    text.filter(|text| !text.trim().is_empty())
}

fn login_status(kind: MessageKind, text: impl Into<String>) -> Effect {
    Effect::status(StatusSlot::Login, kind, text)
}

fn register_status(kind: MessageKind, text: impl Into<String>) -> Effect {
    Effect::status(StatusSlot::Register, kind, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        api::{LoginReply, RegisterReply},
        testing::{Call, FakeBackend, MemoryTokenStore, RecordingView},
    };

    #[test]
    fn email_pattern() {
        assert!(is_valid_email("user@example.com"));
        assert!(!is_valid_email("user@example"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn registration_checks_run_in_order() {
        assert_eq!(
            validate_registration("", "a@b.c", "secret", "secret"),
            Err(REGISTER_EMPTY)
        );
        assert_eq!(
            validate_registration("u", "bad", "secret", "other1"),
            Err(REGISTER_MISMATCH)
        );
        assert_eq!(
            validate_registration("u", "bad", "12345", "12345"),
            Err(REGISTER_SHORT)
        );
        assert_eq!(
            validate_registration("u", "bad", "123456", "123456"),
            Err(REGISTER_BAD_EMAIL)
        );
        assert_eq!(validate_registration("u", "a@b.cd", "123456", "123456"), Ok(()));
    }

    #[tokio::test]
    async fn login_persists_session_and_redirects() {
        let backend = FakeBackend::default().with_login(Ok(LoginReply {
            success: true,
            session_id: Some("new-session".to_string()),
            username: Some("olga".to_string()),
            error: None,
        }));
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .login("  olga ", "pw", &mut view)
            .await;

        assert_eq!(
            outcome,
            AuthOutcome::SignedIn {
                username: "olga".to_string()
            }
        );
        assert_eq!(store.get().unwrap().as_str(), "new-session");
        assert_eq!(backend.calls(), vec![Call::Login("olga".to_string())]);
        assert!(view.redirected_to(Route::App));
        assert_eq!(
            view.last_status(StatusSlot::Login),
            Some((MessageKind::Success, "Добро пожаловать, olga!".to_string()))
        );
    }

    #[tokio::test]
    async fn login_with_empty_fields_stays_local() {
        let backend = FakeBackend::default();
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .login("   ", "pw", &mut view)
            .await;

        assert_eq!(outcome, AuthOutcome::Invalid);
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn login_rejection_shows_backend_text() {
        let backend = FakeBackend::default().with_login(Ok(LoginReply {
            error: Some("Пользователь не найден".to_string()),
            ..LoginReply::default()
        }));
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .login("ghost", "pw", &mut view)
            .await;

        assert_eq!(
            outcome,
            AuthOutcome::Rejected("Пользователь не найден".to_string())
        );
        assert!(store.get().is_none());
        assert!(!view.redirected_to(Route::App));
    }

    #[tokio::test]
    async fn login_transport_error_is_generic() {
        let backend = FakeBackend::default().with_login(Err("refused"));
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .login("olga", "pw", &mut view)
            .await;

        assert_eq!(outcome, AuthOutcome::Unreachable);
        assert_eq!(
            view.last_status(StatusSlot::Login),
            Some((MessageKind::Error, SERVER_UNAVAILABLE.to_string()))
        );
    }

    #[tokio::test]
    async fn register_reports_backend_message() {
        let backend = FakeBackend::default().with_register(Ok(RegisterReply {
            success: true,
            message: Some("Аккаунт создан".to_string()),
            error: None,
        }));
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .register("olga", "olga@example.com", "secret1", "secret1", &mut view)
            .await;

        assert_eq!(outcome, AuthOutcome::Registered);
        assert_eq!(
            view.last_status(StatusSlot::Register),
            Some((MessageKind::Success, "Аккаунт создан".to_string()))
        );
        assert!(store.get().is_none());
    }

    #[tokio::test]
    async fn register_validation_blocks_request() {
        let backend = FakeBackend::default();
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .register("olga", "olga@example.com", "secret1", "secret2", &mut view)
            .await;

        assert_eq!(outcome, AuthOutcome::Invalid);
        assert!(backend.calls().is_empty());
        assert_eq!(
            view.last_status(StatusSlot::Register),
            Some((MessageKind::Error, REGISTER_MISMATCH.to_string()))
        );
    }

    #[tokio::test]
    async fn register_rejection_falls_back_to_generic_text() {
        let backend = FakeBackend::default().with_register(Ok(RegisterReply::default()));
        let store = MemoryTokenStore::default();
        let mut view = RecordingView::default();

        let outcome = AuthController::new(&backend, &store)
            .register("olga", "olga@example.com", "secret1", "secret1", &mut view)
            .await;

        assert_eq!(outcome, AuthOutcome::Rejected(REGISTER_REJECTED.to_string()));
    }
}
