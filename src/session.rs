//! Tracks diagnostic state for a document.

use crate::log;

/// Diagnostic settings shared by a [`Document`](crate::Document) and all of its nodes.
///
/// A document gets a default session from [`Document::new`](crate::Document::new), which
/// enables logging when the `XMLREPR_LOG` environment variable is set.  Embedders that want
/// to control logging themselves can pass their own session to
/// [`Document::new_with_session`](crate::Document::new_with_session).
#[derive(Clone, Debug)]
pub struct Session {
    log_enabled: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            log_enabled: log::log_enabled(),
        }
    }

    /// A session that never logs, regardless of the environment.
    pub fn new_for_test_suite() -> Self {
        Self { log_enabled: false }
    }

    pub fn with_logging(enabled: bool) -> Self {
        Self {
            log_enabled: enabled,
        }
    }

    pub fn log_enabled(&self) -> bool {
        self.log_enabled
    }
}
