use std::io::{self, BufRead, Write};

use colored::Colorize;
use tracing::{debug, warn};

use crate::{
    library::LibraryPage,
    view::{Effect, Label, MessageKind, RedirectReason, Route, View},
};

const SIGN_IN_HINT: &str = "Требуется вход: выполните `musicgen login`.";

/// Line shown when a redirect needs explaining; voluntary navigation stays quiet.
fn redirect_notice(reason: RedirectReason) -> Option<&'static str> {
    match reason {
        RedirectReason::SessionRequired => Some(SIGN_IN_HINT),
        RedirectReason::SignedIn | RedirectReason::SignedOut => None,
    }
}

/// Renders effects as terminal output; downloads are queued for the caller.
#[derive(Default)]
pub struct TerminalView {
    assume_yes: bool,
    pending_downloads: Vec<(String, String)>,
    redirect: Option<Route>,
}

impl TerminalView {
    pub fn new(assume_yes: bool) -> Self {
        Self {
            assume_yes,
            ..Self::default()
        }
    }

    /// Downloads requested since the last call, as `(url, filename)`.
    pub fn take_downloads(&mut self) -> Vec<(String, String)> {
        std::mem::take(&mut self.pending_downloads)
    }

    pub fn redirect(&self) -> Option<Route> {
        self.redirect
    }

    fn render_library(page: &LibraryPage) {
        println!("{} {}", "Треков:".bold(), page.count());
        if page.is_empty() {
            println!("{}", "У вас пока нет сгенерированных треков.".dimmed());
            return;
        }
        for card in &page.cards {
            println!(
                "  {}  {}  {}  {}",
                card.title.bold(),
                card.created_label.dimmed(),
                card.size_label,
                card.filename.cyan()
            );
        }
    }
}

impl View for TerminalView {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Redirect { route, reason } => {
                self.redirect = Some(route);
                debug!(path = route.path(), ?reason, "navigation");
                if let Some(notice) = redirect_notice(reason) {
                    eprintln!("{}", notice.yellow());
                }
            }
            Effect::Trigger { enabled, label } => debug!(enabled, %label, "trigger"),
            Effect::Status { kind, text, .. } => match kind {
                MessageKind::Progress => println!("{}", text.dimmed()),
                MessageKind::Success => println!("{}", text.green()),
                MessageKind::Error => eprintln!("{}", text.red()),
            },
            Effect::SetLabel {
                label: Label::Subtitle,
                text,
            } => println!("{}", text.bold()),
            Effect::SetLabel { label, text } => debug!(?label, %text, "label"),
            Effect::Reveal(element) => debug!(?element, "reveal"),
            Effect::Select { group, index } => debug!(group = group.as_str(), index, "select"),
            Effect::Download { url, filename } => self.pending_downloads.push((url, filename)),
            Effect::RenderLibrary(page) => Self::render_library(&page),
            Effect::Alert(text) => eprintln!("{}", text.red().bold()),
        }
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        if self.assume_yes {
            return true;
        }

        print!("{prompt} [y/N] ");
        if let Err(err) = io::stdout().flush() {
            warn!(?err, "failed to flush prompt");
        }

        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(
                answer.trim().to_lowercase().as_str(),
                "y" | "yes" | "д" | "да"
            ),
            Err(err) => {
                warn!(?err, "failed to read confirmation");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downloads_are_queued_until_taken() {
        let mut view = TerminalView::new(true);
        view.apply(Effect::Download {
            url: "/download/a.wav".to_string(),
            filename: "a.wav".to_string(),
        });
        assert_eq!(
            view.take_downloads(),
            vec![("/download/a.wav".to_string(), "a.wav".to_string())]
        );
        assert!(view.take_downloads().is_empty());
    }

    #[test]
    fn assume_yes_skips_prompt() {
        let mut view = TerminalView::new(true);
        assert!(view.confirm("Удалить трек?"));
    }

    #[test]
    fn redirect_is_remembered() {
        let mut view = TerminalView::default();
        view.apply(Effect::redirect(Route::SignIn, RedirectReason::SignedOut));
        assert_eq!(view.redirect(), Some(Route::SignIn));
    }

    #[test]
    fn only_lost_sessions_get_a_sign_in_hint() {
        assert_eq!(
            redirect_notice(RedirectReason::SessionRequired),
            Some(SIGN_IN_HINT)
        );
        assert_eq!(redirect_notice(RedirectReason::SignedOut), None);
        assert_eq!(redirect_notice(RedirectReason::SignedIn), None);
    }
}
