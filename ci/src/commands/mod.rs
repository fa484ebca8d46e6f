// Lint commands
mod clippy;
mod format;

pub use clippy::*;
pub use format::*;

// Test commands
mod doc;
mod test_suite;

pub use doc::*;
pub use test_suite::*;

// Concurrency checking commands
mod loom;
mod miri;
mod shuttle;

pub use loom::*;
pub use miri::*;
pub use shuttle::*;
