//! The orchestrator's view of the user: a yes/no gate before writing and a
//! place to print progress.

use std::path::Path;

pub trait Shell {
    /// May `target` be (over)written? Asked before anything is fetched.
    fn may_write(&self, target: &Path) -> bool;

    /// User-facing progress line (e.g. `* creating <path>`).
    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

impl<S: Shell + ?Sized> Shell for &S {
    fn may_write(&self, target: &Path) -> bool {
        (**self).may_write(target)
    }

    fn info(&self, message: &str) {
        (**self).info(message)
    }
}

/// Never asks; every write is allowed. Used with `--force` and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unattended;

impl Shell for Unattended {
    fn may_write(&self, _target: &Path) -> bool {
        true
    }
}
