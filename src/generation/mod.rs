pub mod form;

pub use form::{FormEvent, GenerationForm, Rejection};

use tracing::{info, warn};

use crate::{
    api::Backend,
    session::TokenStore,
    view::{Effect, MessageKind, RedirectReason, Route, StatusSlot, View},
};

pub const TRIGGER_IDLE: &str = "Сгенерировать музыку";
const TRIGGER_BUSY: &str = "Генерирую...";
const PROGRESS_TEXT: &str = "🎵 Создаю уникальный трек...";
const MISSING_SELECTION_TEXT: &str = "❌ Выберите жанр, настроение и инструменты!";
const CONNECTION_ERROR_TEXT: &str = "❌ Ошибка соединения с сервером";
const UNKNOWN_ERROR: &str = "неизвестная ошибка";
const SUCCESS_TEXT: &str =
    "✅ Трек готов! Загрузка началась. Все треки доступны в разделе «Мои треки».";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Generated { download_url: String, filename: String },
    MissingSelection,
    Unauthenticated,
    /// Backend-reported failure, text as supplied.
    Rejected(String),
    /// No usable reply arrived.
    Unreachable,
}

/// Drives the generator page's submit button.
pub struct GenerationController<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    store: &'a S,
}

impl<'a, B, S> GenerationController<'a, B, S>
where
    B: Backend + ?Sized,
    S: TokenStore + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a S) -> Self {
        Self { backend, store }
    }

    pub async fn submit<V: View>(&self, form: &GenerationForm, view: &mut V) -> SubmitOutcome {
        view.apply(Effect::Trigger {
            enabled: false,
            label: TRIGGER_BUSY.to_string(),
        });
        view.apply(Effect::status(
            StatusSlot::Generation,
            MessageKind::Progress,
            PROGRESS_TEXT,
        ));

        let outcome = self.run(form, view).await;

        view.apply(Effect::Trigger {
            enabled: true,
            label: TRIGGER_IDLE.to_string(),
        });
        outcome
    }

    async fn run<V: View>(&self, form: &GenerationForm, view: &mut V) -> SubmitOutcome {
        let request = match form.build_request(self.store.get()) {
            Ok(request) => request,
            Err(Rejection::MissingSelection) => {
                view.apply(Effect::status(
                    StatusSlot::Generation,
                    MessageKind::Error,
                    MISSING_SELECTION_TEXT,
                ));
                return SubmitOutcome::MissingSelection;
            }
            Err(Rejection::Unauthenticated) => {
                view.apply(Effect::redirect(
                    Route::SignIn,
                    RedirectReason::SessionRequired,
                ));
                return SubmitOutcome::Unauthenticated;
            }
        };

        info!(
            genre = %request.genre,
            mood = %request.mood,
            instrument = %request.instrument,
            length = request.length,
            tempo = request.tempo,
            "submitting generation request"
        );

        let reply = match self.backend.generate(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(?err, "generation request failed");
                view.apply(Effect::status(
                    StatusSlot::Generation,
                    MessageKind::Error,
                    CONNECTION_ERROR_TEXT,
                ));
                return SubmitOutcome::Unreachable;
            }
        };

        match (reply.success, reply.download_url) {
            (true, Some(download_url)) => {
                let filename = reply
                    .filename
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or_else(|| filename_from_url(&download_url));
                view.apply(Effect::Download {
                    url: download_url.clone(),
                    filename: filename.clone(),
                });
                view.apply(Effect::status(
                    StatusSlot::Generation,
                    MessageKind::Success,
                    SUCCESS_TEXT,
                ));
                SubmitOutcome::Generated {
                    download_url,
                    filename,
                }
            }
            (success, _) => {
                if success {
                    warn!("generation succeeded without a download link");
                }
                let text = reply
                    .error
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                view.apply(Effect::status(
                    StatusSlot::Generation,
                    MessageKind::Error,
                    format!("❌ Ошибка: {text}"),
                ));
                SubmitOutcome::Rejected(text)
            }
        }
    }
}

fn filename_from_url(url: &str) -> String {
    url.rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("track.wav")
        .to_string()
}
