use std::sync::Arc;
use std::time::Duration;

use kaarya_core::auth::{AuthProvider, MemoryAuth};
use kaarya_core::cli::Command;
use kaarya_core::commands::{App, Backend, dispatch};
use kaarya_core::config::Config;
use kaarya_core::filter::FilterMode;
use kaarya_core::i18n::Language;
use kaarya_core::render::Renderer;
use kaarya_core::session::Session;
use kaarya_core::store::{MemoryStore, TaskStore};
use kaarya_core::suggest::TemplateSuggester;
use tempfile::{TempDir, tempdir};

struct MemoryBackend {
    auth: Arc<MemoryAuth>,
    store: Arc<MemoryStore>,
}

impl Backend for MemoryBackend {
    fn auth(&self) -> Arc<dyn AuthProvider> {
        self.auth.clone()
    }

    fn store(&self, _session: &Session) -> Arc<dyn TaskStore> {
        self.store.clone()
    }
}

fn app(temp: &TempDir, backend: Arc<MemoryBackend>) -> App {
    let app = App::open(Config::default(), temp.path()).expect("open app");
    let lang = app.language();
    app.with_backend(backend)
        .with_renderer(Renderer::plain(lang))
        .with_suggester(Arc::new(TemplateSuggester::new(Duration::ZERO)))
}

async fn run(app: &mut App, command: Command) -> (bool, String) {
    let mut out = Vec::new();
    let ok = dispatch(app, command, &mut out).await.expect("dispatch");
    (ok, String::from_utf8(out).expect("utf8"))
}

fn backend() -> Arc<MemoryBackend> {
    let auth = Arc::new(MemoryAuth::new());
    auth.add_account("asha@example.com", "secret1", true);
    Arc::new(MemoryBackend {
        auth,
        store: Arc::new(MemoryStore::new()),
    })
}

#[tokio::test]
async fn task_commands_need_a_session() {
    let temp = tempdir().expect("tempdir");
    let mut app = app(&temp, backend());

    let mut out = Vec::new();
    assert!(dispatch(&mut app, Command::Whoami, &mut out).await.is_ok());

    let err = dispatch(
        &mut app,
        Command::List {
            filter: FilterMode::All,
            search: String::new(),
        },
        &mut out,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("not signed in"));
}

#[tokio::test]
async fn login_add_toggle_and_list() {
    let temp = tempdir().expect("tempdir");
    let backend = backend();
    let mut app = app(&temp, backend.clone());

    let (ok, text) = run(
        &mut app,
        Command::Login {
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
        },
    )
    .await;
    assert!(ok);
    assert!(text.contains("Welcome back!"));

    let (ok, text) = run(
        &mut app,
        Command::Add {
            title: "Buy milk".to_string(),
            notes: Some("Full cream".to_string()),
        },
    )
    .await;
    assert!(ok);
    assert!(text.contains("Task added successfully!"));
    assert!(text.contains("Total: 1   Completed: 0   Pending: 1"));

    let id = backend.store.rows()[0].id.simple().to_string();
    let (ok, _) = run(&mut app, Command::Done { id: id[..6].to_string() }).await;
    assert!(ok);
    assert!(backend.store.rows()[0].completed);

    let (ok, text) = run(
        &mut app,
        Command::List {
            filter: FilterMode::Pending,
            search: String::new(),
        },
    )
    .await;
    assert!(ok);
    assert!(text.contains("No tasks yet"));

    let (ok, text) = run(&mut app, Command::Whoami).await;
    assert!(ok);
    assert!(text.contains("asha@example.com"));
}

#[tokio::test]
async fn bad_login_fails_quietly_with_a_notice() {
    let temp = tempdir().expect("tempdir");
    let mut app = app(&temp, backend());

    let (ok, text) = run(
        &mut app,
        Command::Login {
            email: "asha@example.com".to_string(),
            password: "wrong".to_string(),
        },
    )
    .await;
    assert!(!ok);
    assert!(text.contains("Invalid login credentials"));
}

#[tokio::test]
async fn language_choice_survives_restarts() {
    let temp = tempdir().expect("tempdir");
    let backend = backend();

    let mut first = app(&temp, backend.clone());
    assert_eq!(first.language(), Language::English);
    let (ok, text) = run(
        &mut first,
        Command::Lang {
            language: Some(Language::Hindi),
        },
    )
    .await;
    assert!(ok);
    assert!(text.contains("hi"));

    let second = app(&temp, backend);
    assert_eq!(second.language(), Language::Hindi);
}

#[tokio::test]
async fn logout_forgets_the_session() {
    let temp = tempdir().expect("tempdir");
    let mut app = app(&temp, backend());

    run(
        &mut app,
        Command::Login {
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
        },
    )
    .await;
    let (ok, text) = run(&mut app, Command::Logout).await;
    assert!(ok);
    assert!(text.contains("Logged out successfully"));

    let (_, text) = run(&mut app, Command::Whoami).await;
    assert!(!text.contains("asha@example.com"));
}

#[tokio::test]
async fn title_only_edit_keeps_the_notes() {
    let temp = tempdir().expect("tempdir");
    let backend = backend();
    let mut app = app(&temp, backend.clone());

    run(
        &mut app,
        Command::Login {
            email: "asha@example.com".to_string(),
            password: "secret1".to_string(),
        },
    )
    .await;
    run(
        &mut app,
        Command::Add {
            title: "Buy milk".to_string(),
            notes: Some("Full cream".to_string()),
        },
    )
    .await;
    let id = backend.store.rows()[0].id.simple().to_string();

    let (ok, text) = run(
        &mut app,
        Command::Edit {
            id: id[..8].to_string(),
            title: "Buy oat milk".to_string(),
            notes: None,
        },
    )
    .await;
    assert!(ok);
    assert!(text.contains("Task updated successfully!"));
    let row = &backend.store.rows()[0];
    assert_eq!(row.title, "Buy oat milk");
    assert_eq!(row.notes.as_deref(), Some("Full cream"));

    let (ok, _) = run(
        &mut app,
        Command::Edit {
            id: id[..8].to_string(),
            title: "Buy oat milk".to_string(),
            notes: Some(String::new()),
        },
    )
    .await;
    assert!(ok);
    assert_eq!(backend.store.rows()[0].notes, None);
}
