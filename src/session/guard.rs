use tracing::{info, warn};

use crate::{
    api::Backend,
    session::{SessionToken, TokenStore},
    view::{Effect, Element, Label, RedirectReason, Route, View},
};

const LOGOUT_PROMPT: &str = "Вы уверены, что хотите выйти?";

/// Typed result of the fail-closed session policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Authenticated {
        username: String,
        token: SessionToken,
    },
    Unauthenticated,
}

impl SessionOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionOutcome::Authenticated { .. })
    }
}

/// Pages that require a confirmed session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectedPage {
    App,
    Results,
}

impl ProtectedPage {
    fn subtitle(&self, username: &str) -> String {
        match self {
            ProtectedPage::App => format!("веб-приложение для {username}"),
            ProtectedPage::Results => format!("треки для {username}"),
        }
    }
}

/// Verify the persisted token against the backend.
///
/// Any doubt ends signed out: a negative reply and a transport failure both clear the slot.
pub async fn check_session<B, S>(backend: &B, store: &S) -> SessionOutcome
where
    B: Backend + ?Sized,
    S: TokenStore + ?Sized,
{
    let Some(token) = store.get() else {
        return SessionOutcome::Unauthenticated;
    };

    match backend.check_session(&token).await {
        Ok(reply) if reply.success => SessionOutcome::Authenticated {
            username: reply.username.unwrap_or_default(),
            token,
        },
        Ok(_) => {
            info!("backend rejected stored session");
            forget_session(store);
            SessionOutcome::Unauthenticated
        }
        Err(err) => {
            warn!(?err, "session check failed");
            forget_session(store);
            SessionOutcome::Unauthenticated
        }
    }
}

pub(crate) fn forget_session<S: TokenStore + ?Sized>(store: &S) {
    if let Err(err) = store.clear() {
        warn!(?err, "failed to clear stored session");
    }
}

/// Entry gate of every protected page.
pub struct SessionGuard<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    store: &'a S,
}

impl<'a, B, S> SessionGuard<'a, B, S>
where
    B: Backend + ?Sized,
    S: TokenStore + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a S) -> Self {
        Self { backend, store }
    }

    pub async fn verify_session<V: View>(&self, page: ProtectedPage, view: &mut V) -> SessionOutcome {
        let outcome = check_session(self.backend, self.store).await;
        match &outcome {
            SessionOutcome::Authenticated { username, .. } => {
                view.apply(Effect::Reveal(Element::LogoutButton));
                view.apply(Effect::SetLabel {
                    label: Label::Subtitle,
                    text: page.subtitle(username),
                });
            }
            SessionOutcome::Unauthenticated => view.apply(Effect::redirect(
                Route::SignIn,
                RedirectReason::SessionRequired,
            )),
        }
        outcome
    }

    /// Sign-in page load: skip the form when the stored session is still valid.
    pub async fn redirect_if_authenticated<V: View>(&self, view: &mut V) -> bool {
        if self.store.get().is_none() {
            return false;
        }
        let outcome = check_session(self.backend, self.store).await;
        if outcome.is_authenticated() {
            view.apply(Effect::redirect(Route::App, RedirectReason::SignedIn));
            return true;
        }
        false
    }

    /// Ask for confirmation, then log out. Returns whether the user went through with it.
    pub async fn request_logout<V: View>(&self, view: &mut V) -> bool {
        if !view.confirm(LOGOUT_PROMPT) {
            return false;
        }
        self.logout(view).await;
        true
    }

    pub async fn logout<V: View>(&self, view: &mut V) {
        if let Some(token) = self.store.get() {
            if let Err(err) = self.backend.logout(&token).await {
                info!(?err, "logout notification not delivered");
            }
        }
        forget_session(self.store);
        view.apply(Effect::redirect(Route::SignIn, RedirectReason::SignedOut));
    }
}
