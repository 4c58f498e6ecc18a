//! Processing limits to keep misbehaving observers in check.

/// Maximum nesting of notification passes within one document.
///
/// Observers may mutate the tree from inside their callbacks, which starts a new
/// notification pass before the current one has finished.  An observer that reacts to
/// every change by making another change would recurse forever; once this many passes
/// are nested, further mutations are refused with
/// [`TreeError::ObserverProtocol`](crate::TreeError::ObserverProtocol).
pub const MAX_NOTIFICATION_DEPTH: usize = 256;
