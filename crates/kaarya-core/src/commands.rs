use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::{self, AuthProvider, AuthScreen, RestAuth};
use crate::backend::BackendClient;
use crate::board::TaskBoard;
use crate::cli::Command;
use crate::config::Config;
use crate::filter::FilterMode;
use crate::i18n::Language;
use crate::notify::{NoticeLog, NotificationSink};
use crate::prefs::{self, FilePreferences, PreferenceStore};
use crate::render::Renderer;
use crate::session::{Screen, Session, SessionFile, SessionGate};
use crate::store::{RestStore, TaskStore};
use crate::suggest::{SuggestionProvider, TemplateSuggester};
use crate::task::{Task, TaskDraft, TaskId};

/// Where the auth and row-store collaborators come from.
pub trait Backend: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthProvider>;
    fn store(&self, session: &Session) -> Arc<dyn TaskStore>;
}

/// The hosted service configured in the kaaryarc.
pub struct HostedBackend {
    client: BackendClient,
}

impl HostedBackend {
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let settings = cfg.backend()?;
        Ok(Self {
            client: BackendClient::new(&settings)?,
        })
    }
}

impl Backend for HostedBackend {
    fn auth(&self) -> Arc<dyn AuthProvider> {
        Arc::new(RestAuth::new(self.client.clone()))
    }

    fn store(&self, session: &Session) -> Arc<dyn TaskStore> {
        Arc::new(RestStore::new(self.client.clone(), session.access_token.clone()))
    }
}

/// Per-invocation application context: settings, local files and the
/// language every screen renders with.
pub struct App {
    cfg: Config,
    prefs: Arc<dyn PreferenceStore>,
    sessions: SessionFile,
    notices: Arc<NoticeLog>,
    renderer: Renderer,
    lang: Language,
    suggester: Arc<dyn SuggestionProvider>,
    backend: Option<Arc<dyn Backend>>,
}

impl App {
    pub fn open(cfg: Config, data_dir: &Path) -> anyhow::Result<Self> {
        let prefs: Arc<dyn PreferenceStore> = Arc::new(FilePreferences::open(data_dir)?);
        let lang = prefs::load_language(prefs.as_ref());
        let renderer = Renderer::new(cfg.color()?, lang);
        let suggester = Arc::new(TemplateSuggester::new(cfg.suggest_delay()?));

        info!(data_dir = %data_dir.display(), lang = %lang, "application context ready");
        Ok(Self {
            sessions: SessionFile::open(data_dir)?,
            cfg,
            prefs,
            notices: Arc::new(NoticeLog::new()),
            renderer,
            lang,
            suggester,
            backend: None,
        })
    }

    /// Replaces the configured collaborators, e.g. with in-memory ones.
    pub fn with_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn with_suggester(mut self, suggester: Arc<dyn SuggestionProvider>) -> Self {
        self.suggester = suggester;
        self
    }

    pub fn language(&self) -> Language {
        self.lang
    }

    fn backend(&mut self) -> anyhow::Result<Arc<dyn Backend>> {
        if let Some(backend) = &self.backend {
            return Ok(backend.clone());
        }
        let backend: Arc<dyn Backend> = Arc::new(HostedBackend::from_config(&self.cfg)?);
        self.backend = Some(backend.clone());
        Ok(backend)
    }

    fn sink(&self) -> Arc<dyn NotificationSink> {
        self.notices.clone()
    }

    fn flush_notices<W: Write>(&self, out: &mut W) -> anyhow::Result<()> {
        let notices = self.notices.drain();
        self.renderer.write_notices(out, &notices)
    }
}

/// Runs one command. `Ok(false)` means the command failed in a way the user
/// has already been told about through notices.
#[tracing::instrument(skip_all)]
pub async fn dispatch<W: Write>(
    app: &mut App,
    command: Command,
    out: &mut W,
) -> anyhow::Result<bool> {
    match command {
        Command::Lang { language } => switch_language(app, language, out),
        Command::Whoami => {
            let session = app.sessions.load()?;
            app.renderer.write_identity(out, session.as_ref())?;
            Ok(true)
        }
        Command::Login { email, password } => {
            let screen = AuthScreen::new(app.lang, app.cfg.reset_redirect(), app.sink());
            run_auth_screen(app, screen, &email, &password, out).await
        }
        Command::Signup { email, password } => {
            let mut screen = AuthScreen::new(app.lang, app.cfg.reset_redirect(), app.sink());
            screen.toggle_mode();
            run_auth_screen(app, screen, &email, &password, out).await
        }
        Command::Reset { email } => {
            let mut screen = AuthScreen::new(app.lang, app.cfg.reset_redirect(), app.sink());
            screen.forgot_password();
            run_auth_screen(app, screen, &email, "", out).await
        }
        Command::Logout => logout(app, out).await,
        task_command => run_task_screen(app, task_command, out).await,
    }
}

fn switch_language<W: Write>(
    app: &mut App,
    language: Option<Language>,
    out: &mut W,
) -> anyhow::Result<bool> {
    if let Some(lang) = language {
        prefs::save_language(app.prefs.as_ref(), lang)
            .context("failed to save language preference")?;
        app.lang = lang;
        app.renderer.set_language(lang);
        info!(lang = %lang, "language switched");
    }
    writeln!(out, "{} · {}", app.lang.strings().app_title, app.lang.code())?;
    Ok(true)
}

async fn run_auth_screen<W: Write>(
    app: &mut App,
    mut screen: AuthScreen,
    email: &str,
    password: &str,
    out: &mut W,
) -> anyhow::Result<bool> {
    let auth = app.backend()?.auth();
    let result = screen.submit(auth.as_ref(), email, password).await;

    let ok = match result {
        Ok(Some(session)) => {
            app.sessions.save(&session)?;
            true
        }
        Ok(None) => true,
        Err(err) => {
            debug!(error = %err, "auth screen action failed");
            false
        }
    };

    app.flush_notices(out)?;
    if screen.shows_email_banner() {
        writeln!(out, "{}", app.lang.strings().email_banner)?;
    }
    Ok(ok)
}

async fn logout<W: Write>(app: &mut App, out: &mut W) -> anyhow::Result<bool> {
    let Some(session) = app.sessions.load()? else {
        app.renderer.write_identity(out, None)?;
        return Ok(true);
    };

    let auth = app.backend()?.auth();
    auth::sign_out(auth.as_ref(), &session, app.lang, app.notices.as_ref()).await;
    app.sessions.clear()?;
    app.flush_notices(out)?;
    Ok(true)
}

async fn run_task_screen<W: Write>(
    app: &mut App,
    command: Command,
    out: &mut W,
) -> anyhow::Result<bool> {
    let backend = app.backend()?;
    let saved = app.sessions.load()?;
    let auth = backend.auth();
    let screen = SessionGate::resolve(saved.clone(), auth.as_ref(), Utc::now()).await;
    let session = match screen {
        Screen::Tasks(session) => session,
        Screen::Auth => {
            app.sessions.clear()?;
            return Err(anyhow!("not signed in; run `kaarya login <email>` first"));
        }
    };
    if saved.as_ref() != Some(&session) {
        app.sessions.save(&session)?;
    }

    let board = TaskBoard::new(
        session.clone(),
        backend.store(&session),
        app.suggester.clone(),
        app.sink(),
        app.lang,
    );

    let loaded = board.load().await.is_ok();
    let mut mode = FilterMode::All;
    let mut query = String::new();

    let ok = match command {
        Command::List { filter, search } => {
            mode = filter;
            query = search;
            loaded
        }
        _ if !loaded => false,
        Command::Add { title, notes } => {
            board.open_add_form();
            board.create(TaskDraft::new(title, notes)).await.is_ok()
        }
        Command::Edit { id, title, notes } => {
            let tasks = board.tasks();
            let id = resolve_id(&tasks, &id)?;
            // The form starts from the stored notes; `--notes ""` clears them.
            let notes = notes.or_else(|| {
                tasks
                    .iter()
                    .find(|task| task.id == id)
                    .and_then(|task| task.notes.clone())
            });
            board.begin_edit(id);
            board.update(id, TaskDraft::new(title, notes)).await.is_ok()
        }
        Command::Done { id } => {
            let id = resolve_id(&board.tasks(), &id)?;
            board.toggle_complete(id).await.is_ok()
        }
        Command::Delete { id } => {
            let id = resolve_id(&board.tasks(), &id)?;
            board.delete(id).await.is_ok()
        }
        Command::Suggest { goal } => {
            board.open_suggestions();
            if !goal.trim().is_empty() {
                writeln!(out, "{}", app.lang.strings().generating)?;
            }
            board.suggest(&goal).await.is_ok()
        }
        other => {
            warn!(command = ?other, "command is not a task screen command");
            return Err(anyhow!("unsupported command: {other:?}"));
        }
    };

    app.flush_notices(out)?;

    board.set_query(query.clone());
    board.set_filter(mode);
    app.renderer.write_identity(out, Some(board.session()))?;
    app.renderer.write_stats(out, board.stats())?;
    app.renderer
        .write_task_table(out, &board.visible(), mode, &query)?;
    Ok(ok)
}

/// Accepts a full UUID or a unique prefix of one (with or without hyphens).
pub fn resolve_id(tasks: &[Task], input: &str) -> anyhow::Result<TaskId> {
    let needle = input.trim().to_ascii_lowercase();
    if needle.is_empty() {
        return Err(anyhow!("task id is empty"));
    }

    if let Ok(id) = Uuid::parse_str(&needle)
        && tasks.iter().any(|task| task.id == id)
    {
        return Ok(id);
    }

    let simple = needle.replace('-', "");
    let matches: Vec<TaskId> = tasks
        .iter()
        .filter(|task| task.id.simple().to_string().starts_with(&simple))
        .map(|task| task.id)
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(anyhow!("no task matches id {input}")),
        many => Err(anyhow!(
            "id {input} is ambiguous ({} tasks match); use more characters",
            many.len()
        )),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::resolve_id;
    use crate::task::Task;

    fn task(id: &str) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::parse_str(id).unwrap(),
            title: "t".to_string(),
            notes: None,
            completed: false,
            owner_id: Uuid::nil(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn resolves_full_ids_and_unique_prefixes() {
        let tasks = vec![
            task("0b0f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e"),
            task("0b1f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e"),
        ];

        assert_eq!(
            resolve_id(&tasks, "0B0F3A43-8A8E-4B8B-9F6C-0E5B1A2D3C4E").unwrap(),
            tasks[0].id
        );
        assert_eq!(resolve_id(&tasks, "0b1").unwrap(), tasks[1].id);
        assert!(resolve_id(&tasks, "0b").is_err());
        assert!(resolve_id(&tasks, "ff").is_err());
        assert!(resolve_id(&tasks, " ").is_err());
    }
}
