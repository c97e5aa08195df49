//! planning and execution of jail changes

pub mod apply;
mod destroy;
mod plan;
mod sync;

pub use apply::{apply, dry_run, execute, perform};
pub use destroy::destroy;
pub use plan::{plan, DesiredSet};
pub use sync::{converge, sync};
