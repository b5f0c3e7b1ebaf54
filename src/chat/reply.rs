use crate::chat::intent::{ListFilter, TaskRef};
use crate::models::Task;

pub const HELP_TEXT: &str = "I can manage your todo list. Try:\n\
- \"add task buy milk\"\n\
- \"show my pending tasks\"\n\
- \"mark 2 as done\"\n\
- \"rename task 1 to Buy oat milk\"\n\
- \"delete task 3\"";

pub const GREETING_TEXT: &str =
    "Hi! I'm your task assistant. Ask me to add, list, complete, rename or delete tasks.";

pub const FALLBACK_TEXT: &str =
    "Sorry, I didn't understand that. Say \"help\" to see what I can do.";

/// Why a [`TaskRef`] could not be turned into a single task.
#[derive(Debug, PartialEq, Eq)]
pub enum ResolveError {
    NoTasks,
    OutOfRange { position: usize, total: usize },
    NotFound(String),
    Ambiguous { title: String, matches: Vec<String> },
}

impl ResolveError {
    pub fn message(&self) -> String {
        match self {
            ResolveError::NoTasks => "You don't have any tasks yet.".to_string(),
            ResolveError::OutOfRange { position, total } => format!(
                "There is no task #{}. You have {} task{}.",
                position,
                total,
                plural(*total)
            ),
            ResolveError::NotFound(title) => format!("I couldn't find a task called \"{}\".", title),
            ResolveError::Ambiguous { title, matches } => format!(
                "\"{}\" matches several tasks: {}. Which one did you mean? You can use its number.",
                title,
                matches
                    .iter()
                    .map(|m| format!("\"{}\"", m))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

/// Finds the task a reference points at.
///
/// `tasks` must be in creation order (oldest first); positions are 1-based.
/// Titles match exactly (ignoring case) first, then by unique substring.
pub fn resolve<'a>(reference: &TaskRef, tasks: &'a [Task]) -> Result<&'a Task, ResolveError> {
    if tasks.is_empty() {
        return Err(ResolveError::NoTasks);
    }

    match reference {
        TaskRef::Position(position) => {
            if *position == 0 || *position > tasks.len() {
                Err(ResolveError::OutOfRange {
                    position: *position,
                    total: tasks.len(),
                })
            } else {
                Ok(&tasks[position - 1])
            }
        }
        TaskRef::Title(title) => {
            let needle = title.trim().to_lowercase();
            // Every title contains the empty string.
            if needle.is_empty() {
                return Err(ResolveError::NotFound(title.clone()));
            }
            if let Some(task) = tasks.iter().find(|t| t.title.to_lowercase() == needle) {
                return Ok(task);
            }

            let partial: Vec<&Task> = tasks
                .iter()
                .filter(|t| t.title.to_lowercase().contains(&needle))
                .collect();
            match partial.as_slice() {
                [] => Err(ResolveError::NotFound(title.clone())),
                [task] => Ok(*task),
                many => Err(ResolveError::Ambiguous {
                    title: title.clone(),
                    matches: many.iter().map(|t| t.title.clone()).collect(),
                }),
            }
        }
    }
}

/// Renders the numbered task list. Numbers are positions in the full,
/// unfiltered list so they stay valid for follow-up commands.
pub fn format_task_list(tasks: &[Task], filter: ListFilter) -> String {
    let shown: Vec<(usize, &Task)> = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| match filter {
            ListFilter::All => true,
            ListFilter::Pending => !t.status.is_done(),
            ListFilter::Completed => t.status.is_done(),
        })
        .map(|(i, t)| (i + 1, t))
        .collect();

    let label = match filter {
        ListFilter::All => "",
        ListFilter::Pending => "pending ",
        ListFilter::Completed => "completed ",
    };

    if shown.is_empty() {
        return format!("You have no {}tasks.", label);
    }

    let mut out = format!(
        "You have {} {}task{}:",
        shown.len(),
        label,
        plural(shown.len())
    );
    for (position, task) in shown {
        let mark = if task.status.is_done() { "x" } else { " " };
        out.push_str(&format!(
            "\n{}. [{}] {} ({})",
            position,
            mark,
            task.title,
            task.priority.as_str()
        ));
    }
    out
}

pub fn filter_name(filter: ListFilter) -> &'static str {
    match filter {
        ListFilter::All => "all",
        ListFilter::Pending => "pending",
        ListFilter::Completed => "completed",
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}
