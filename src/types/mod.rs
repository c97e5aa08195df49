mod action;
mod report;

pub use action::{Action, ActionKind};
pub use report::ChangeReport;
