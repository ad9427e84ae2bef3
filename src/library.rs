use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::{
    api::{Backend, GeneratedFile},
    session::{SessionToken, TokenStore},
    view::{Effect, RedirectReason, Route, View},
};

const UNTITLED: &str = "Без названия";
const DELETE_PROMPT: &str = "Удалить трек?";
const DELETE_FAILED: &str = "Ошибка удаления";

/// One rendered entry of the track list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCard {
    pub title: String,
    pub filename: String,
    pub created_label: String,
    pub size_label: String,
    pub download_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryPage {
    pub cards: Vec<FileCard>,
}

impl LibraryPage {
    pub fn count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted,
    Failed,
    Unauthenticated,
}

pub fn download_link(filename: &str) -> String {
    format!("/files/{filename}")
}

pub fn format_file_size(bytes: Option<u64>) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    match bytes.unwrap_or(0) {
        0 => "0 B".to_string(),
        b if b < KIB => format!("{b} B"),
        b if b < MIB => format!("{:.1} KB", b as f64 / KIB as f64),
        b => format!("{:.1} MB", b as f64 / MIB as f64),
    }
}

pub fn format_relative_time(created: Option<f64>, now: DateTime<Utc>) -> String {
    let Some(created) = created
        .filter(|secs| secs.is_finite())
        .and_then(|secs| DateTime::from_timestamp(secs.floor() as i64, 0))
    else {
        return "дата неизвестна".to_string();
    };

    let elapsed = now.signed_duration_since(created);
    if elapsed.num_minutes() < 1 {
        "только что".to_string()
    } else if elapsed.num_hours() < 1 {
        format!("{} мин. назад", elapsed.num_minutes())
    } else if elapsed.num_days() < 1 {
        format!("{} ч. назад", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{} дн. назад", elapsed.num_days())
    } else {
        created.format("%d.%m.%Y %H:%M").to_string()
    }
}

pub fn render_page(files: &[GeneratedFile], now: DateTime<Utc>) -> LibraryPage {
    let cards = files
        .iter()
        .filter(|file| {
            let usable = !file.filename.trim().is_empty();
            if !usable {
                warn!(name = ?file.name, "skipping track record without a filename");
            }
            usable
        })
        .map(|file| FileCard {
            title: file
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .unwrap_or(UNTITLED)
                .to_string(),
            filename: file.filename.clone(),
            created_label: format_relative_time(file.created, now),
            size_label: format_file_size(file.size),
            download_url: download_link(&file.filename),
        })
        .collect();
    LibraryPage { cards }
}

/// Track list of the results page.
pub struct LibraryController<'a, B: ?Sized, S: ?Sized> {
    backend: &'a B,
    store: &'a S,
}

impl<'a, B, S> LibraryController<'a, B, S>
where
    B: Backend + ?Sized,
    S: TokenStore + ?Sized,
{
    pub fn new(backend: &'a B, store: &'a S) -> Self {
        Self { backend, store }
    }

    /// Fetch and render the list; failures render the empty state.
    pub async fn load_files<V: View>(&self, token: &SessionToken, view: &mut V) -> LibraryPage {
        let page = match self.backend.list_files(token).await {
            Ok(reply) if reply.success => render_page(&reply.files, Utc::now()),
            Ok(_) => LibraryPage::default(),
            Err(err) => {
                warn!(?err, "failed to load track list");
                LibraryPage::default()
            }
        };
        view.apply(Effect::RenderLibrary(page.clone()));
        page
    }

    pub async fn delete_file<V: View>(&self, filename: &str, view: &mut V) -> DeleteOutcome {
        if !view.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Cancelled;
        }

        let Some(token) = self.store.get() else {
            view.apply(Effect::redirect(
                Route::SignIn,
                RedirectReason::SessionRequired,
            ));
            return DeleteOutcome::Unauthenticated;
        };

        match self.backend.delete_file(&token, filename).await {
            Ok(true) => {
                info!(filename, "track deleted");
                self.load_files(&token, view).await;
                DeleteOutcome::Deleted
            }
            Ok(false) => {
                warn!(filename, "backend refused deletion");
                view.apply(Effect::Alert(DELETE_FAILED.to_string()));
                DeleteOutcome::Failed
            }
            Err(err) => {
                warn!(?err, filename, "delete request failed");
                view.apply(Effect::Alert(DELETE_FAILED.to_string()));
                DeleteOutcome::Failed
            }
        }
    }
}
