mod api;
mod auth;
mod config;
mod downloads;
mod generation;
mod library;
mod session;
#[cfg(test)]
mod testing;
mod view;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::{
    api::HttpBackend,
    auth::{AuthController, AuthOutcome},
    config::ClientConfig,
    generation::{FormEvent, GenerationController, GenerationForm, SubmitOutcome},
    library::{DeleteOutcome, LibraryController},
    session::{FileTokenStore, ProtectedPage, SessionGuard, SessionOutcome, SessionToken},
    view::{Route, SelectGroup, TerminalView},
};

/// Terminal client for the music generation service
#[derive(Parser)]
#[command(name = "musicgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend base URL (overrides MUSICGEN_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session locally
    Login {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Create a new account
    Register {
        #[arg(short, long)]
        username: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Password confirmation
        #[arg(short, long)]
        confirm: String,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Check the stored session
    Whoami,

    /// Generate a track and download it
    Generate {
        /// Preset title, applied before the explicit selections
        #[arg(long)]
        preset: Option<String>,
        #[arg(short, long)]
        genre: Option<String>,
        #[arg(short, long)]
        mood: Option<String>,
        #[arg(short, long)]
        instrument: Option<String>,
        /// Length in minutes
        #[arg(short, long)]
        length: Option<i64>,
        /// Tempo in BPM
        #[arg(short, long)]
        tempo: Option<i64>,
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// List generated tracks
    Files,

    /// Delete a generated track
    Delete { filename: String },

    /// Show available genres, moods, instruments and presets
    Presets,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_tracing();

    if let Err(err) = app_main().await {
        error!(?err, "application error");
        std::process::exit(1);
    }
}

async fn app_main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("failed to load client configuration")?;
    if let Some(raw) = cli.base_url.as_deref() {
        config = config.with_base_url(raw)?;
    }
    info!(base_url = %config.base_url, channel = %config.session_channel, "client configured");

    let backend = HttpBackend::new(config.base_url.clone(), config.session_channel);
    let store = FileTokenStore::new(&config.storage_path);
    let mut view = TerminalView::new(cli.yes);

    match cli.command {
        Commands::Login { username, password } => {
            let guard = SessionGuard::new(&backend, &store);
            if guard.redirect_if_authenticated(&mut view).await {
                println!("Вы уже вошли в систему.");
                return Ok(());
            }
            let outcome = AuthController::new(&backend, &store)
                .login(&username, &password, &mut view)
                .await;
            if !matches!(outcome, AuthOutcome::SignedIn { .. }) {
                bail!("sign-in failed");
            }
        }
        Commands::Register {
            username,
            email,
            password,
            confirm,
        } => {
            let outcome = AuthController::new(&backend, &store)
                .register(&username, &email, &password, &confirm, &mut view)
                .await;
            if outcome != AuthOutcome::Registered {
                bail!("registration failed");
            }
        }
        Commands::Logout => {
            let done = SessionGuard::new(&backend, &store)
                .request_logout(&mut view)
                .await;
            if done && view.redirect() == Some(Route::SignIn) {
                println!("Вы вышли из аккаунта.");
            }
        }
        Commands::Whoami => {
            let outcome = SessionGuard::new(&backend, &store)
                .verify_session(ProtectedPage::App, &mut view)
                .await;
            require_session(&outcome)?;
        }
        Commands::Generate {
            preset,
            genre,
            mood,
            instrument,
            length,
            tempo,
            description,
        } => {
            let outcome = SessionGuard::new(&backend, &store)
                .verify_session(ProtectedPage::App, &mut view)
                .await;
            require_session(&outcome)?;

            let selections = Selections {
                preset,
                genre,
                mood,
                instrument,
                length,
                tempo,
                description,
            };
            let form = build_form(selections)?;
            let preset = form
                .active_preset()
                .and_then(|index| form.presets().get(index))
                .map(|preset| preset.title);
            info!(preset, "generation form prepared");

            let submitted = GenerationController::new(&backend, &store)
                .submit(&form, &mut view)
                .await;

            for (url, filename) in view.take_downloads() {
                let path =
                    downloads::save_download(&backend, &url, &filename, &config.download_dir)
                        .await?;
                println!("Сохранено: {}", path.display());
            }

            if !matches!(submitted, SubmitOutcome::Generated { .. }) {
                bail!("generation did not complete");
            }
        }
        Commands::Files => {
            let outcome = SessionGuard::new(&backend, &store)
                .verify_session(ProtectedPage::Results, &mut view)
                .await;
            let token = require_session(&outcome)?;
            LibraryController::new(&backend, &store)
                .load_files(token, &mut view)
                .await;
            println!("Веб-версия: {}", Route::Results.url(&config.base_url)?);
        }
        Commands::Delete { filename } => {
            let outcome = SessionGuard::new(&backend, &store)
                .verify_session(ProtectedPage::Results, &mut view)
                .await;
            require_session(&outcome)?;
            let deleted = LibraryController::new(&backend, &store)
                .delete_file(&filename, &mut view)
                .await;
            if deleted == DeleteOutcome::Failed {
                bail!("failed to delete {filename}");
            }
        }
        Commands::Presets => print_catalog(&GenerationForm::default()),
    }

    Ok(())
}

fn require_session(outcome: &SessionOutcome) -> Result<&SessionToken> {
    match outcome {
        SessionOutcome::Authenticated { token, .. } => Ok(token),
        SessionOutcome::Unauthenticated => bail!("no valid session"),
    }
}

struct Selections {
    preset: Option<String>,
    genre: Option<String>,
    mood: Option<String>,
    instrument: Option<String>,
    length: Option<i64>,
    tempo: Option<i64>,
    description: String,
}

/// Replay command-line choices as the clicks a user would make on the page.
fn build_form(selections: Selections) -> Result<GenerationForm> {
    let mut form = GenerationForm::default();
    let mut events = Vec::new();

    if let Some(title) = selections.preset.as_deref() {
        let wanted = title.trim().to_lowercase();
        let Some(index) = form
            .presets()
            .iter()
            .position(|preset| preset.title.to_lowercase() == wanted)
        else {
            bail!("unknown preset '{title}'");
        };
        events.push(FormEvent::PresetClicked(index));
    }

    for (group, value) in [
        (SelectGroup::Genre, selections.genre.as_deref()),
        (SelectGroup::Mood, selections.mood.as_deref()),
        (SelectGroup::Instrument, selections.instrument.as_deref()),
    ] {
        let Some(value) = value else { continue };
        let Some(chips) = form.group(group) else { continue };
        let Some(index) = chips.position(value) else {
            bail!(
                "unknown {} '{value}', expected one of: {}",
                group.as_str(),
                chips.options().join(", ")
            );
        };
        events.push(FormEvent::ChipClicked { group, index });
    }

    if let Some(minutes) = selections.length {
        events.push(FormEvent::LengthInput(minutes));
    }
    if let Some(bpm) = selections.tempo {
        events.push(FormEvent::TempoInput(bpm));
    }
    events.push(FormEvent::DescriptionInput(selections.description));

    for event in events {
        form = form.handle(event).0;
    }
    Ok(form)
}

fn print_catalog(form: &GenerationForm) {
    for group in [SelectGroup::Genre, SelectGroup::Mood, SelectGroup::Instrument] {
        if let Some(chips) = form.group(group) {
            println!("{}: {}", group.as_str(), chips.options().join(", "));
        }
    }
    for preset in form.presets() {
        println!("preset {}: {} / {}", preset.title, preset.genre, preset.mood);
    }
    let (min, max) = form.length().bounds();
    println!("length: {min}..={max} ({})", generation::form::duration_label(form.length().value()));
    let (min, max) = form.tempo().bounds();
    println!("tempo: {min}..={max} ({})", generation::form::tempo_label(form.tempo().value()));
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
