//! Text heuristics applied to data coming from the meetings API.

mod assignee;
mod name;

pub use assignee::{extract_assignee, extract_assignee_with_pattern, AssigneePattern};
pub use name::{collapse_whitespace, reformat_name};
