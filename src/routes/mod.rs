pub mod auth;
pub mod chat;
pub mod health;
pub mod tasks;

use actix_web::web;
use std::fmt;

pub const AUTH_PREFIX: &str = "/api/auth";
pub const TASKS_PREFIX: &str = "/api/tasks";
pub const CHAT_PREFIX: &str = "/api/chat";

/// Signature every route group exposes: register your handlers under `prefix`.
pub type RegisterFn = fn(&mut web::ServiceConfig, &str);

/// A route group plus the prefix it is mounted at.
#[derive(Clone)]
pub struct RouterMount {
    name: &'static str,
    prefix: String,
    register: RegisterFn,
}

impl RouterMount {
    /// Trailing slashes are dropped and a leading one is added, so
    /// `api/tasks/` and `/api/tasks` are the same mount.
    pub fn new(name: &'static str, prefix: &str, register: RegisterFn) -> Self {
        let trimmed = prefix.trim().trim_matches('/');
        Self {
            name,
            prefix: format!("/{}", trimmed),
            register,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Two prefixes overlap when one equals, or is a path-segment ancestor
    /// of, the other. `/api/task` and `/api/tasks` do not overlap.
    pub fn overlaps(&self, path: &str) -> bool {
        segment_prefix(&self.prefix, path) || segment_prefix(path, &self.prefix)
    }

    pub fn register(&self, cfg: &mut web::ServiceConfig) {
        (self.register)(cfg, &self.prefix);
    }
}

impl fmt::Debug for RouterMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterMount")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .finish()
    }
}

fn segment_prefix(ancestor: &str, path: &str) -> bool {
    if ancestor == "/" {
        return true;
    }
    path == ancestor
        || path
            .strip_prefix(ancestor)
            .map_or(false, |rest| rest.starts_with('/'))
}

/// The three route groups of the application at their standard prefixes.
pub fn default_mounts() -> Vec<RouterMount> {
    vec![
        RouterMount::new("auth", AUTH_PREFIX, auth::register),
        RouterMount::new("tasks", TASKS_PREFIX, tasks::register),
        RouterMount::new("chat", CHAT_PREFIX, chat::register),
    ]
}
