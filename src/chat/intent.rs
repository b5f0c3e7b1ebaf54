use lazy_static::lazy_static;
use regex::Regex;

/// How a chat message refers to an existing task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskRef {
    /// 1-based position in the user's task list, oldest first.
    Position(usize),
    /// Title, matched case-insensitively.
    Title(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    All,
    Pending,
    Completed,
}

/// What the user asked the assistant to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddTask { title: String },
    ListTasks(ListFilter),
    CompleteTask(TaskRef),
    DeleteTask(TaskRef),
    RenameTask { target: TaskRef, title: String },
    Greeting,
    Help,
    Unknown,
}

lazy_static! {
    static ref HELP_RE: Regex =
        Regex::new(r"(?i)^\s*(?:help|\?|what can you do|how does this work)\b").unwrap();
    static ref GREETING_RE: Regex =
        Regex::new(r"(?i)^\s*(?:hi|hello|hey|salam|good (?:morning|afternoon|evening))\b[\s!.]*$")
            .unwrap();
    static ref RENAME_RE: Regex = Regex::new(
        r"(?i)^\s*(?:rename|change|update|edit)\s+(?:the\s+)?(?:task\s+)?(?P<target>.+?)\s+(?:to|into|as)\s+(?P<title>.+?)\s*[.!]?$"
    )
    .unwrap();
    static ref MARK_DONE_RE: Regex = Regex::new(
        r"(?i)^\s*mark\s+(?:the\s+)?(?:task\s+)?(?P<target>.+?)\s+as\s+(?:done|complete|completed|finished)\s*[.!]?$"
    )
    .unwrap();
    static ref COMPLETE_RE: Regex = Regex::new(
        r"(?i)^\s*(?:complete|finish|done with|check off|tick off|close)\s+(?:the\s+)?(?:task\s+)?(?P<target>.+?)\s*[.!]?$"
    )
    .unwrap();
    static ref DELETE_RE: Regex = Regex::new(
        r"(?i)^\s*(?:delete|remove|drop|cancel|discard)\s+(?:the\s+)?(?:task\s+)?(?P<target>.+?)\s*[.!]?$"
    )
    .unwrap();
    static ref LIST_RE: Regex = Regex::new(
        r"(?i)^\s*(?:show|list|view|display|see|what(?:'s|\s+is|\s+are)|which)\b.*\b(?:tasks?|todos?|to-dos?|list)\b"
    )
    .unwrap();
    static ref COMPLETED_RE: Regex = Regex::new(r"(?i)\b(?:completed|done|finished)\b").unwrap();
    static ref PENDING_RE: Regex =
        Regex::new(r"(?i)\b(?:pending|open|remaining|incomplete|unfinished|left)\b").unwrap();
    static ref ADD_RE: Regex = Regex::new(
        r"(?i)^\s*(?:please\s+)?(?:add|create|new|remember\s+to|remind\s+me\s+to)\s+(?:a\s+)?(?:new\s+)?(?:(?:task|todo|to-do)\b\s*)?(?::|-|to\b|called\b|named\b)?\s*(?P<title>.+?)\s*[.!]?$"
    )
    .unwrap();
    static ref POSITION_RE: Regex = Regex::new(r"^#?(?P<n>\d+)$").unwrap();
}

/// Classifies a chat message.
///
/// Patterns are tried from most to least specific so that, for example,
/// "mark 2 as done" is a completion and not a list request.
pub fn parse(message: &str) -> Intent {
    let message = message.trim();
    if message.is_empty() {
        return Intent::Unknown;
    }

    if HELP_RE.is_match(message) {
        return Intent::Help;
    }
    if GREETING_RE.is_match(message) {
        return Intent::Greeting;
    }
    if let Some(caps) = RENAME_RE.captures(message) {
        if let (Some(target), Some(title)) = (parse_ref(&caps["target"]), clean_title(&caps["title"])) {
            return Intent::RenameTask { target, title };
        }
    }
    if let Some(target) = MARK_DONE_RE
        .captures(message)
        .or_else(|| COMPLETE_RE.captures(message))
        .and_then(|caps| parse_ref(&caps["target"]))
    {
        return Intent::CompleteTask(target);
    }
    if let Some(target) = DELETE_RE
        .captures(message)
        .and_then(|caps| parse_ref(&caps["target"]))
    {
        return Intent::DeleteTask(target);
    }
    if LIST_RE.is_match(message) {
        let filter = if COMPLETED_RE.is_match(message) {
            ListFilter::Completed
        } else if PENDING_RE.is_match(message) {
            ListFilter::Pending
        } else {
            ListFilter::All
        };
        return Intent::ListTasks(filter);
    }
    if let Some(caps) = ADD_RE.captures(message) {
        if let Some(title) = clean_title(&caps["title"]) {
            return Intent::AddTask { title };
        }
    }

    Intent::Unknown
}

/// `None` when nothing is left once quotes are stripped.
fn parse_ref(raw: &str) -> Option<TaskRef> {
    let raw = strip_quotes(raw.trim()).trim();
    if raw.is_empty() {
        return None;
    }
    let reference = match POSITION_RE.captures(raw) {
        Some(caps) => match caps["n"].parse::<usize>() {
            Ok(n) => TaskRef::Position(n),
            Err(_) => TaskRef::Title(raw.to_string()),
        },
        None => TaskRef::Title(raw.to_string()),
    };
    Some(reference)
}

fn clean_title(raw: &str) -> Option<String> {
    let title = strip_quotes(raw.trim()).trim();
    if title.is_empty() {
        None
    } else {
        Some(title.chars().take(200).collect())
    }
}

fn strip_quotes(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}
