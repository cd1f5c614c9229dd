use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use tracing::trace;

use crate::i18n::Strings;
use crate::task::Task;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  clap::ValueEnum,
)]
pub enum FilterMode {
  #[default]
  All,
  Completed,
  Pending
}

impl FilterMode {
  pub fn admits(
    self,
    task: &Task
  ) -> bool {
    match self {
      | FilterMode::All => true,
      | FilterMode::Completed => {
        task.completed
      }
      | FilterMode::Pending => {
        !task.completed
      }
    }
  }

  pub fn label(
    self,
    strings: &Strings
  ) -> &'static str {
    match self {
      | FilterMode::All => {
        strings.all_tasks
      }
      | FilterMode::Completed => {
        strings.completed_tasks
      }
      | FilterMode::Pending => {
        strings.pending_tasks
      }
    }
  }
}

impl fmt::Display for FilterMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>
  ) -> fmt::Result {
    let name = match self {
      | FilterMode::All => "all",
      | FilterMode::Completed => {
        "completed"
      }
      | FilterMode::Pending => "pending"
    };
    f.write_str(name)
  }
}

impl FromStr for FilterMode {
  type Err = anyhow::Error;

  fn from_str(
    s: &str
  ) -> Result<Self, Self::Err> {
    match s
      .trim()
      .to_ascii_lowercase()
      .as_str()
    {
      | "all" => Ok(FilterMode::All),
      | "completed" | "done" => {
        Ok(FilterMode::Completed)
      }
      | "pending" | "open" => {
        Ok(FilterMode::Pending)
      }
      | other => Err(anyhow!(
        "unknown filter mode: {other}"
      ))
    }
  }
}

/// `needle` is already lowercased.
fn matches_needle(
  task: &Task,
  needle: &str
) -> bool {
  if needle.is_empty() {
    return true;
  }

  task
    .title
    .to_lowercase()
    .contains(needle)
    || task.notes.as_deref().is_some_and(
      |notes| {
        notes
          .to_lowercase()
          .contains(needle)
      }
    )
}

/// Derives the visible list. Order is
/// preserved and `tasks` is never
/// touched.
#[tracing::instrument(skip(tasks))]
pub fn filter_tasks(
  tasks: &[Task],
  query: &str,
  mode: FilterMode
) -> Vec<Task> {
  let needle = query.to_lowercase();

  let visible: Vec<Task> = tasks
    .iter()
    .filter(|task| {
      mode.admits(task)
        && matches_needle(task, &needle)
    })
    .cloned()
    .collect();

  trace!(
    total = tasks.len(),
    visible = visible.len(),
    "filtered task list"
  );
  visible
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
)]
pub struct Stats {
  pub total:     usize,
  pub completed: usize,
  pub pending:   usize
}

impl Stats {
  pub fn of(tasks: &[Task]) -> Self {
    let completed = tasks
      .iter()
      .filter(|task| task.completed)
      .count();
    Self {
      total: tasks.len(),
      completed,
      pending: tasks.len() - completed
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone,
    Utc
  };
  use uuid::Uuid;

  use super::{
    FilterMode,
    Stats,
    filter_tasks
  };
  use crate::task::Task;

  fn task(
    title: &str,
    notes: Option<&str>,
    completed: bool,
    age_minutes: i64
  ) -> Task {
    let created = Utc
      .with_ymd_and_hms(
        2026, 2, 16, 5, 0, 0
      )
      .unwrap()
      - Duration::minutes(age_minutes);
    Task {
      id: Uuid::new_v4(),
      title: title.to_string(),
      notes: notes
        .map(ToString::to_string),
      completed,
      owner_id: Uuid::nil(),
      created_at: created,
      updated_at: created
    }
  }

  #[test]
  fn search_is_case_insensitive() {
    let milk = task(
      "Buy milk", None, false, 0
    );
    let dog = task(
      "Walk dog", None, false, 1
    );
    let list =
      vec![milk.clone(), dog.clone()];

    for query in ["milk", "MILK", "mIlK"]
    {
      let visible = filter_tasks(
        &list,
        query,
        FilterMode::All
      );
      assert_eq!(
        visible,
        vec![milk.clone()]
      );
    }
  }

  #[test]
  fn search_looks_at_notes_and_tolerates_missing_notes()
   {
    let with_notes = task(
      "Errands",
      Some("pick up the DRY cleaning"),
      false,
      0
    );
    let without_notes =
      task("Dry run", None, true, 1);
    let other =
      task("Call mom", None, false, 2);
    let list = vec![
      with_notes.clone(),
      without_notes.clone(),
      other,
    ];

    let visible = filter_tasks(
      &list,
      "dry",
      FilterMode::All
    );
    assert_eq!(visible, vec![
      with_notes,
      without_notes
    ]);
  }

  #[test]
  fn modes_narrow_by_completion() {
    let done =
      task("a", None, true, 0);
    let open =
      task("b", None, false, 1);
    let list =
      vec![done.clone(), open.clone()];

    assert_eq!(
      filter_tasks(
        &list,
        "",
        FilterMode::Completed
      ),
      vec![done.clone()]
    );
    assert_eq!(
      filter_tasks(
        &list,
        "",
        FilterMode::Pending
      ),
      vec![open.clone()]
    );
    assert_eq!(
      filter_tasks(
        &list,
        "",
        FilterMode::All
      ),
      list
    );
    assert!(
      filter_tasks(
        &list,
        "b",
        FilterMode::Completed
      )
      .is_empty()
    );
  }

  #[test]
  fn filtering_is_pure() {
    let list = vec![
      task("one", None, true, 0),
      task("two", Some("x"), false, 1),
    ];
    let before = list.clone();

    let first = filter_tasks(
      &list,
      "O",
      FilterMode::Pending
    );
    let second = filter_tasks(
      &list,
      "O",
      FilterMode::Pending
    );

    assert_eq!(first, second);
    assert_eq!(list, before);
  }

  #[test]
  fn stats_count_whole_list() {
    let list = vec![
      task("one", None, true, 0),
      task("two", None, false, 1),
      task("three", None, false, 2),
    ];
    assert_eq!(Stats::of(&list), Stats {
      total:     3,
      completed: 1,
      pending:   2
    });
    assert_eq!(
      Stats::of(&[]),
      Stats::default()
    );
  }

  #[test]
  fn parses_mode_names() {
    assert_eq!(
      "Completed"
        .parse::<FilterMode>()
        .unwrap(),
      FilterMode::Completed
    );
    assert_eq!(
      "open"
        .parse::<FilterMode>()
        .unwrap(),
      FilterMode::Pending
    );
    assert!(
      "later"
        .parse::<FilterMode>()
        .is_err()
    );
  }
}
