//! Utilities for logging messages from the library.

use once_cell::sync::Lazy;

/// Prints a diagnostic message if the given [`Session`](crate::Session) has logging enabled.
///
/// ```ignore
/// repr_log!(session, "position() called on a node without parent: {}", node);
/// ```
#[doc(hidden)]
#[macro_export]
macro_rules! repr_log {
    (
        $session:expr,
        $($arg:tt)+
    ) => {
        if $session.log_enabled() {
            println!("{}", format_args!($($arg)+));
        }
    };
}

/// Whether the `XMLREPR_LOG` environment variable is set.
///
/// This is read only once per process.
pub fn log_enabled() -> bool {
    static ENABLED: Lazy<bool> = Lazy::new(|| ::std::env::var_os("XMLREPR_LOG").is_some());

    *ENABLED
}
