//! Rule-based task assistant behind `POST /api/chat`.
//!
//! [`intent`] classifies a message, [`reply`] resolves task references and
//! renders answers. Both are pure; the route handler owns all database work.

pub mod intent;
pub mod reply;

pub use intent::{parse, Intent, ListFilter, TaskRef};
