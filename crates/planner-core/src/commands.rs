use anyhow::Context;
use tracing::{debug, info, instrument, warn};

use crate::cli::Command;
use crate::config::Config;
use crate::datetime::{parse_date, parse_month};
use crate::editor::{Committed, EditorOutcome, TaskDraft};
use crate::interaction::Outcome;
use crate::planner::Planner;
use crate::render::Renderer;
use crate::store::Persistence;
use crate::task::{Status, TaskId};

#[instrument(skip(planner, cfg, renderer, command))]
pub fn dispatch<P: Persistence>(
    planner: &mut Planner<P>,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
) -> anyhow::Result<()> {
    let base_filter = cfg.default_filter()?;

    match command {
        Command::Month { month, filter } => {
            if let Some(raw) = month {
                planner.show_month(parse_month(&raw)?);
            }
            *planner.filter_mut() = filter.merge_into(base_filter);
            renderer.print_month(&planner.month_view())
        }
        Command::List { filter } => {
            *planner.filter_mut() = filter.merge_into(base_filter);
            let tasks = planner.visible_tasks();
            debug!(count = tasks.len(), "listing tasks");
            renderer.print_task_table(&tasks)
        }
        Command::Add {
            title,
            start,
            end,
            status,
        } => {
            let mut draft = TaskDraft::blank();
            draft.title = title;
            draft.status = status.unwrap_or(Status::ToDo);
            draft.start_date = Some(parse_date(&start)?);
            draft.end_date = end.as_deref().map(parse_date).transpose()?;
            report(planner.close_editor(EditorOutcome::Save(draft)));
            Ok(())
        }
        Command::Select {
            from,
            to,
            title,
            status,
        } => {
            let from = parse_date(&from)?;
            let to = parse_date(&to)?;
            planner.pointer_down_cell(from);
            planner.pointer_enter_cell(to);
            let Outcome::Draft(mut draft) = planner.pointer_up() else {
                warn!("selection produced no draft");
                return Ok(());
            };
            draft.title = title;
            if let Some(status) = status {
                draft.status = status;
            }
            report(planner.close_editor(EditorOutcome::Save(draft)));
            Ok(())
        }
        Command::Edit {
            id,
            title,
            status,
            start,
            end,
            single_day,
        } => {
            let id = TaskId::from(id);
            if !planner.open_task(&id) {
                warn!(id = %id, "no such task");
                return Ok(());
            }
            let mut draft = planner
                .editor()
                .cloned()
                .context("editor did not open")?;
            if let Some(title) = title {
                draft.title = title;
            }
            if let Some(status) = status {
                draft.status = status;
            }
            if let Some(start) = start {
                draft.start_date = Some(parse_date(&start)?);
            }
            if let Some(end) = end {
                draft.end_date = Some(parse_date(&end)?);
            }
            if single_day {
                draft.end_date = None;
            }
            report(planner.close_editor(EditorOutcome::Save(draft)));
            Ok(())
        }
        Command::Move { id, date } => {
            let id = TaskId::from(id);
            let day = parse_date(&date)?;
            let Some(payload) = planner.drag_start(&id)? else {
                warn!(id = %id, "no such task");
                return Ok(());
            };
            if let Outcome::Updated(id) = planner.drop_on(day, Some(&payload)) {
                info!(id = %id, date = %day, "moved task");
                println!("Moved task {id}.");
            }
            Ok(())
        }
        Command::Resize { id, edge, date } => {
            let id = TaskId::from(id);
            let day = parse_date(&date)?;
            if planner.store().get(&id).is_none() {
                warn!(id = %id, "no such task");
                return Ok(());
            }
            planner.pointer_down_handle(id.clone(), edge);
            planner.pointer_enter_cell(day);
            planner.pointer_up();
            if let Some(task) = planner.store().get(&id) {
                println!(
                    "Resized task {id}: {} .. {}.",
                    task.start_date,
                    task.effective_end()
                );
            }
            Ok(())
        }
        Command::Delete { id } => {
            let id = TaskId::from(id);
            let outcome = if planner.open_task(&id) {
                planner.editor().and_then(EditorOutcome::delete)
            } else {
                None
            };
            let Some(outcome) = outcome else {
                warn!(id = %id, "no such task");
                return Ok(());
            };
            report(planner.close_editor(outcome));
            Ok(())
        }
    }
}

fn report(committed: Committed) {
    match committed {
        Committed::Created(task) => println!("Created task {}.", task.id),
        Committed::Updated(id) => println!("Modified task {id}."),
        Committed::Deleted(id) => println!("Deleted task {id}."),
        Committed::Discarded => println!("Nothing saved."),
    }
}
