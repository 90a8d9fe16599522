//! Output formatters for tables, reports and prompts.

mod json;
mod markdown;

pub use self::json::*;
pub use markdown::*;
