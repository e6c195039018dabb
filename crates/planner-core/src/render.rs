use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::Datelike;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::config::Config;
use crate::datetime::format_date;
use crate::grid::{DAYS_PER_WEEK, WEEKDAY_LABELS};
use crate::planner::{DayCell, MonthView};
use crate::task::Task;

/// Display columns per grid day.
const CELL_WIDTH: usize = 12;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color = match cfg.get("color") {
            Some(raw) if !is_bool_word(&raw) => {
                return Err(anyhow!("invalid color setting: {raw}"));
            }
            _ => cfg.get_bool("color").unwrap_or(true),
        };

        Ok(Self {
            color: color && io::stdout().is_terminal(),
        })
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, view))]
    pub fn print_month(&mut self, view: &MonthView) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        self.write_month(&mut out, view)
    }

    pub fn write_month<W: Write>(&self, mut writer: W, view: &MonthView) -> anyhow::Result<()> {
        writeln!(writer, "{}", view.title)?;

        for label in WEEKDAY_LABELS {
            write!(writer, "{label:<width$}", width = CELL_WIDTH)?;
        }
        writeln!(writer)?;

        for (cells, week) in view.cells.chunks(DAYS_PER_WEEK).zip(&view.weeks) {
            for cell in cells {
                let label = day_label(cell);
                let painted = if cell.is_today {
                    self.paint(&label, "1")
                } else if !cell.in_month {
                    self.paint(&label, "2")
                } else {
                    label.clone()
                };
                let padding = CELL_WIDTH.saturating_sub(UnicodeWidthStr::width(label.as_str()));
                write!(writer, "{}{}", painted, " ".repeat(padding))?;
            }
            writeln!(writer)?;

            for row in 0..week.row_count {
                let mut cursor = 0;
                let mut bars = week.tasks.iter().filter(|t| t.row == row).collect::<Vec<_>>();
                bars.sort_by_key(|t| t.offset);
                for bar in bars {
                    let start = bar.offset * CELL_WIDTH;
                    write!(writer, "{}", " ".repeat(start.saturating_sub(cursor)))?;
                    let width = bar.length * CELL_WIDTH;
                    let text = bar_text(&bar.task.title, width);
                    write!(writer, "{}", self.paint(&text, bar.task.status.ansi_color()))?;
                    cursor = start + width;
                }
                writeln!(writer)?;
            }
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, tasks))]
    pub fn print_task_table(&mut self, tasks: &[Task]) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Status".to_string(),
            "Start".to_string(),
            "End".to_string(),
            "Title".to_string(),
        ];

        let rows = tasks
            .iter()
            .map(|task| {
                vec![
                    task.id.to_string(),
                    self.paint(task.status.label(), task.status.ansi_color()),
                    format_date(task.start_date),
                    task.end_date.map(format_date).unwrap_or_default(),
                    task.title.clone(),
                ]
            })
            .collect();

        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn is_bool_word(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "on" | "off" | "yes" | "no" | "y" | "n" | "true" | "false" | "1" | "0"
    )
}

fn day_label(cell: &DayCell) -> String {
    let day = cell.date.day();
    match (cell.in_month, cell.is_today) {
        (_, true) => format!("*{day}"),
        (true, false) => format!("{day}"),
        (false, false) => format!("({day})"),
    }
}

/// `[title...]` filling exactly `width` display columns.
fn bar_text(title: &str, width: usize) -> String {
    let inner = width.saturating_sub(3);
    let mut text = String::from("[");
    let mut used = 0;
    for ch in title.chars() {
        let w = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w > inner {
            break;
        }
        text.push(ch);
        used += w;
    }
    text.push_str(&"=".repeat(inner - used));
    text.push(']');
    text.push(' ');
    text
}

fn write_table<W: Write>(
    mut writer: W,
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

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
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
