pub mod terminal;

pub use terminal::TerminalView;

use anyhow::Result;
use reqwest::Url;

use crate::library::LibraryPage;

/// Navigable destinations of the web application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SignIn,
    App,
    Results,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::SignIn => "/sso.html",
            Route::App => "/app",
            Route::Results => "/results.html",
        }
    }

    /// Browser address of the page under the backend base URL.
    pub fn url(&self, base: &Url) -> Result<Url> {
        Ok(base.join(self.path().trim_start_matches('/'))?)
    }
}

/// Why a controller navigates away. Only a lost session needs explaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    SessionRequired,
    SignedIn,
    SignedOut,
}

/// Which message area a status line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSlot {
    Generation,
    Login,
    Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Progress,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Subtitle,
    Length,
    Tempo,
}

/// Elements hidden until the session has been confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Element {
    LogoutButton,
}

/// Single-select control clusters on the generator page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectGroup {
    Genre,
    Mood,
    Instrument,
    Preset,
}

impl SelectGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectGroup::Genre => "genre",
            SelectGroup::Mood => "mood",
            SelectGroup::Instrument => "instrument",
            SelectGroup::Preset => "preset",
        }
    }
}

/// Side effect requested by a controller. Views decide how to render it.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Redirect {
        route: Route,
        reason: RedirectReason,
    },
    Trigger {
        enabled: bool,
        label: String,
    },
    Status {
        slot: StatusSlot,
        kind: MessageKind,
        text: String,
    },
    SetLabel {
        label: Label,
        text: String,
    },
    Reveal(Element),
    Select {
        group: SelectGroup,
        index: usize,
    },
    Download {
        url: String,
        filename: String,
    },
    RenderLibrary(LibraryPage),
    Alert(String),
}

impl Effect {
    pub fn redirect(route: Route, reason: RedirectReason) -> Self {
        Effect::Redirect { route, reason }
    }

    pub fn status(slot: StatusSlot, kind: MessageKind, text: impl Into<String>) -> Self {
        Effect::Status {
            slot,
            kind,
            text: text.into(),
        }
    }
}

/// Rendering surface shared by every controller.
pub trait View {
    fn apply(&mut self, effect: Effect);

    /// Interactive yes/no confirmation before destructive actions.
    fn confirm(&mut self, prompt: &str) -> bool;
}
