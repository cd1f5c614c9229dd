//! The task screen's list state and the operations that keep it in step
//! with the row store.
//!
//! Every mutation follows commit-then-display: the remote write goes first
//! and the local list is patched only after it succeeds. A failed write
//! leaves the list at its last known good value and queues one generic error
//! notice. The state lock is never held across a remote call, so handlers can
//! overlap; an id with a change still in flight refuses further changes
//! until that change resolves.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::{BoardError, Field, StoreError};
use crate::filter::{FilterMode, Stats, filter_tasks};
use crate::i18n::{Language, Strings};
use crate::notify::{Notice, NotificationSink};
use crate::session::Session;
use crate::store::TaskStore;
use crate::suggest::SuggestionProvider;
use crate::task::{NewTask, Task, TaskChanges, TaskDraft, TaskId};

#[derive(Debug, Default)]
struct BoardState {
    tasks: Vec<Task>,
    loading: bool,
    loaded: bool,
    in_flight: HashSet<TaskId>,
    query: String,
    mode: FilterMode,
    forms: Forms,
    lang: Language,
}

/// Open/closed state of the add form, the edit form and the suggestion panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Forms {
    pub adding: bool,
    pub editing: Option<TaskId>,
    pub suggesting: bool,
    pub suggest_loading: bool,
}

pub struct TaskBoard {
    session: Session,
    store: Arc<dyn TaskStore>,
    suggester: Arc<dyn SuggestionProvider>,
    notices: Arc<dyn NotificationSink>,
    state: Mutex<BoardState>,
}

/// Marks an id busy for as long as it lives.
struct InFlight<'a> {
    board: &'a TaskBoard,
    id: TaskId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.board.state.lock().in_flight.remove(&self.id);
    }
}

impl TaskBoard {
    pub fn new(
        session: Session,
        store: Arc<dyn TaskStore>,
        suggester: Arc<dyn SuggestionProvider>,
        notices: Arc<dyn NotificationSink>,
        lang: Language,
    ) -> Self {
        Self {
            session,
            store,
            suggester,
            notices,
            state: Mutex::new(BoardState {
                lang,
                ..BoardState::default()
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn language(&self) -> Language {
        self.state.lock().lang
    }

    pub fn set_language(&self, lang: Language) {
        self.state.lock().lang = lang;
    }

    fn strings(&self) -> &'static Strings {
        self.language().strings()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_loaded(&self) -> bool {
        self.state.lock().loaded
    }

    pub fn forms(&self) -> Forms {
        self.state.lock().forms.clone()
    }

    pub fn set_query(&self, query: impl Into<String>) {
        self.state.lock().query = query.into();
    }

    pub fn set_filter(&self, mode: FilterMode) {
        self.state.lock().mode = mode;
    }

    /// The list as currently searched and filtered.
    pub fn visible(&self) -> Vec<Task> {
        let state = self.state.lock();
        filter_tasks(&state.tasks, &state.query, state.mode)
    }

    pub fn stats(&self) -> Stats {
        Stats::of(&self.state.lock().tasks)
    }

    pub fn open_add_form(&self) {
        self.state.lock().forms.adding = true;
    }

    pub fn begin_edit(&self, id: TaskId) {
        self.state.lock().forms.editing = Some(id);
    }

    pub fn cancel_edit(&self) {
        self.state.lock().forms.editing = None;
    }

    pub fn open_suggestions(&self) {
        self.state.lock().forms.suggesting = true;
    }

    /// Fetches the signed-in user's tasks. A failure leaves an empty, loaded
    /// list behind.
    #[tracing::instrument(skip(self), fields(user = %self.session.user_id()))]
    pub async fn load(&self) -> Result<(), BoardError> {
        self.state.lock().loading = true;

        let result = self.store.select_by_owner(self.session.user_id()).await;

        let mut state = self.state.lock();
        state.loading = false;
        state.loaded = true;
        match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), "loaded tasks");
                state.tasks = tasks;
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to load tasks");
                state.tasks.clear();
                drop(state);
                self.notices.push(Notice::error(self.strings().error));
                Err(err.into())
            }
        }
    }

    /// Inserts a task and prepends the stored row.
    #[tracing::instrument(skip(self, draft))]
    pub async fn create(&self, draft: TaskDraft) -> Result<Task, BoardError> {
        let strings = self.strings();
        let Some(title) = draft.valid_title() else {
            self.notices.push(Notice::error(strings.title_required));
            return Err(BoardError::Validation(Field::Title));
        };

        let row = NewTask {
            title: title.to_string(),
            notes: draft.normalized_notes(),
            owner_id: self.session.user_id(),
            completed: false,
        };

        let inserted = match self.store.insert(vec![row]).await {
            Ok(rows) => rows,
            Err(err) => return Err(self.store_failure(err.into())),
        };
        let Some(task) = inserted.into_iter().next() else {
            return Err(self.store_failure(
                StoreError::Decode("insert returned no row".to_string()).into(),
            ));
        };

        {
            let mut state = self.state.lock();
            state.tasks.insert(0, task.clone());
            state.forms.adding = false;
        }
        info!(id = %task.id, "task created");
        self.notices.push(Notice::success(strings.task_added));
        Ok(task)
    }

    /// Replaces title and notes, keeping identity and creation time.
    #[tracing::instrument(skip(self, draft))]
    pub async fn update(&self, id: TaskId, draft: TaskDraft) -> Result<Task, BoardError> {
        let strings = self.strings();
        let Some(title) = draft.valid_title() else {
            self.notices.push(Notice::error(strings.title_required));
            return Err(BoardError::Validation(Field::Title));
        };

        let _guard = self.claim(id)?;
        let changes = TaskChanges::edit(title.to_string(), draft.normalized_notes(), Utc::now());
        if let Err(err) = self.store.update(id, &changes).await {
            return Err(self.store_failure(err.into()));
        }

        let patched = self.patch(id, &changes)?;
        self.state.lock().forms.editing = None;
        info!(id = %id, "task updated");
        self.notices.push(Notice::success(strings.task_updated));
        Ok(patched)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: TaskId) -> Result<(), BoardError> {
        let strings = self.strings();
        let _guard = self.claim(id)?;

        if let Err(err) = self.store.delete(id).await {
            return Err(self.store_failure(err.into()));
        }

        self.state.lock().tasks.retain(|task| task.id != id);
        info!(id = %id, "task deleted");
        self.notices.push(Notice::success(strings.task_deleted));
        Ok(())
    }

    /// Flips completion of the confirmed prior value. The local flip happens
    /// only after the store accepts it.
    #[tracing::instrument(skip(self))]
    pub async fn toggle_complete(&self, id: TaskId) -> Result<Task, BoardError> {
        let _guard = self.claim(id)?;
        let prior = self
            .state
            .lock()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .map(|task| task.completed)
            .ok_or(BoardError::NotFound(id))?;

        let changes = TaskChanges::completion(!prior, Utc::now());
        if let Err(err) = self.store.update(id, &changes).await {
            return Err(self.store_failure(err.into()));
        }

        let patched = self.patch(id, &changes)?;
        debug!(id = %id, completed = patched.completed, "completion toggled");
        Ok(patched)
    }

    /// Expands `goal` into suggested tasks, inserts them as one batch and
    /// prepends them in the order the store returned them.
    #[tracing::instrument(skip(self))]
    pub async fn suggest(&self, goal: &str) -> Result<Vec<Task>, BoardError> {
        let strings = self.strings();
        let goal = goal.trim();
        if goal.is_empty() {
            self.notices.push(Notice::error(strings.goal_required));
            return Err(BoardError::Validation(Field::Goal));
        }

        self.state.lock().forms.suggest_loading = true;
        let result = self.suggest_and_insert(goal).await;
        self.state.lock().forms.suggest_loading = false;

        match result {
            Ok(inserted) => {
                {
                    let mut state = self.state.lock();
                    let previous = std::mem::take(&mut state.tasks);
                    state.tasks = inserted.iter().cloned().chain(previous).collect();
                    state.forms.suggesting = false;
                }
                info!(count = inserted.len(), "suggested tasks inserted");
                self.notices
                    .push(Notice::success(strings.tasks_generated(inserted.len())));
                Ok(inserted)
            }
            Err(err) => Err(self.store_failure(err)),
        }
    }

    async fn suggest_and_insert(&self, goal: &str) -> Result<Vec<Task>, BoardError> {
        let drafts = self
            .suggester
            .suggest(goal)
            .await
            .map_err(|err| BoardError::Suggest(format!("{err:#}")))?;

        let owner = self.session.user_id();
        let rows = drafts
            .into_iter()
            .map(|draft| NewTask::from_draft(draft, owner))
            .collect();
        Ok(self.store.insert(rows).await?)
    }

    /// Marks `id` busy. Ids outside the current list are refused with the
    /// generic notice before any remote call.
    fn claim(&self, id: TaskId) -> Result<InFlight<'_>, BoardError> {
        let mut state = self.state.lock();
        if !state.tasks.iter().any(|task| task.id == id) {
            drop(state);
            warn!(id = %id, "refusing change to a task outside the list");
            self.notices.push(Notice::error(self.strings().error));
            return Err(BoardError::NotFound(id));
        }
        if !state.in_flight.insert(id) {
            drop(state);
            warn!(id = %id, "rejecting change while another is in flight");
            self.notices.push(Notice::error(self.strings().busy));
            return Err(BoardError::Busy(id));
        }
        Ok(InFlight { board: self, id })
    }

    fn patch(&self, id: TaskId, changes: &TaskChanges) -> Result<Task, BoardError> {
        let mut state = self.state.lock();
        let task = state
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or(BoardError::NotFound(id))?;
        changes.apply_to(task);
        Ok(task.clone())
    }

    fn store_failure(&self, err: BoardError) -> BoardError {
        warn!(error = %err, "remote write failed, list left unchanged");
        self.notices.push(Notice::error(self.strings().error));
        err
    }
}
