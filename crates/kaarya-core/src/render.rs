use std::io::{self, IsTerminal, Write};

use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::filter::{FilterMode, Stats};
use crate::i18n::Language;
use crate::notify::{Level, Notice};
use crate::session::Session;
use crate::task::Task;

pub const SHORT_ID_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
    lang: Language,
}

impl Renderer {
    /// Colour is applied only when enabled and stdout is a terminal.
    pub fn new(color: bool, lang: Language) -> Self {
        Self {
            color: color && io::stdout().is_terminal(),
            lang,
        }
    }

    pub fn plain(lang: Language) -> Self {
        Self { color: false, lang }
    }

    pub fn set_language(&mut self, lang: Language) {
        self.lang = lang;
    }

    #[tracing::instrument(skip_all)]
    pub fn write_stats<W: Write>(&self, out: &mut W, stats: Stats) -> anyhow::Result<()> {
        let strings = self.lang.strings();
        writeln!(
            out,
            "{}: {}   {}: {}   {}: {}",
            strings.total,
            self.paint(&stats.total.to_string(), "1"),
            strings.completed,
            self.paint(&stats.completed.to_string(), "32"),
            strings.pending,
            self.paint(&stats.pending.to_string(), "33"),
        )?;
        Ok(())
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn write_task_table<W: Write>(
        &self,
        out: &mut W,
        tasks: &[Task],
        mode: FilterMode,
        query: &str,
    ) -> anyhow::Result<()> {
        let strings = self.lang.strings();

        let mut heading = mode.label(strings).to_string();
        if !query.trim().is_empty() {
            heading.push_str(&format!(" · \"{}\"", query.trim()));
        }
        writeln!(out, "{}", self.paint(&heading, "1"))?;

        if tasks.is_empty() {
            writeln!(out, "{}", strings.no_tasks)?;
            return Ok(());
        }

        let headers = vec![
            "ID".to_string(),
            String::new(),
            strings.task_title.to_string(),
            strings.task_notes.to_string(),
            "Created".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                let id = self.paint(&short_id(task), "33");
                let mark = if task.completed {
                    self.paint("[x]", "32")
                } else {
                    "[ ]".to_string()
                };
                let title = if task.completed {
                    self.paint(&task.title, "2")
                } else {
                    task.title.clone()
                };
                let created = task
                    .created_at
                    .with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M")
                    .to_string();
                vec![id, mark, title, task.notes_text().to_string(), created]
            })
            .collect();

        write_table(out, headers, rows)
    }

    pub fn write_notices<W: Write>(&self, out: &mut W, notices: &[Notice]) -> anyhow::Result<()> {
        for notice in notices {
            let (marker, code) = match notice.level {
                Level::Success => ("✓", "32"),
                Level::Error => ("✗", "31"),
                Level::Info => ("i", "36"),
            };
            writeln!(out, "{} {}", self.paint(marker, code), notice.message)?;
        }
        Ok(())
    }

    pub fn write_identity<W: Write>(
        &self,
        out: &mut W,
        session: Option<&Session>,
    ) -> anyhow::Result<()> {
        let strings = self.lang.strings();
        match session {
            Some(session) => writeln!(
                out,
                "{} · {} ({})",
                self.paint(strings.app_title, "1"),
                session.email(),
                session.user_id()
            )?,
            None => writeln!(out, "{} · {}", strings.app_title, strings.login)?,
        }
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn short_id(task: &Task) -> String {
    task.id.simple().to_string()[..SHORT_ID_LEN].to_string()
}

fn write_table<W: Write>(
    writer: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for (idx, header) in headers.iter().enumerate() {
        write_padded(writer, header, widths[idx])?;
    }
    writeln!(writer)?;

    for width in &widths {
        write!(writer, "{:-<width$} ", "", width = *width)?;
    }
    writeln!(writer)?;

    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            write_padded(writer, cell, widths[idx])?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Pads by display width, so wide and combining characters line up.
fn write_padded<W: Write>(writer: &mut W, cell: &str, width: usize) -> io::Result<()> {
    let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
    let padding = width.saturating_sub(visible_width);
    write!(writer, "{}{} ", cell, " ".repeat(padding))
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::{Renderer, short_id, strip_ansi};
    use crate::filter::{FilterMode, Stats};
    use crate::i18n::Language;
    use crate::notify::Notice;
    use crate::task::Task;

    fn task(title: &str, completed: bool) -> Task {
        let at = Utc.with_ymd_and_hms(2026, 2, 16, 5, 0, 0).unwrap();
        Task {
            id: Uuid::parse_str("0b0f3a43-8a8e-4b8b-9f6c-0e5b1a2d3c4e").unwrap(),
            title: title.to_string(),
            notes: None,
            completed,
            owner_id: Uuid::nil(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn table_lists_short_ids_and_marks() {
        let renderer = Renderer::plain(Language::English);
        let mut out = Vec::new();
        renderer
            .write_task_table(&mut out, &[task("Buy milk", true)], FilterMode::All, "")
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("All Tasks\n"));
        assert!(text.contains("0b0f3a43"));
        assert!(text.contains("[x]"));
        assert!(text.contains("Buy milk"));
    }

    #[test]
    fn empty_list_uses_localized_placeholder() {
        let renderer = Renderer::plain(Language::Hindi);
        let mut out = Vec::new();
        renderer
            .write_task_table(&mut out, &[], FilterMode::Pending, "दूध")
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("लंबित"));
        assert!(text.contains(Language::Hindi.strings().no_tasks));
    }

    #[test]
    fn stats_and_notices() {
        let renderer = Renderer::plain(Language::English);
        let mut out = Vec::new();
        renderer
            .write_stats(
                &mut out,
                Stats {
                    total: 3,
                    completed: 1,
                    pending: 2,
                },
            )
            .unwrap();
        renderer
            .write_notices(&mut out, &[Notice::success("Task added successfully!")])
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total: 3   Completed: 1   Pending: 2"));
        assert!(text.contains("✓ Task added successfully!"));
    }

    #[test]
    fn helpers() {
        assert_eq!(short_id(&task("x", false)), "0b0f3a43");
        assert_eq!(strip_ansi("\x1b[33mabc\x1b[0m"), "abc");
    }
}
