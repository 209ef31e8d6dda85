/// Per-day history digests.
pub mod inspect;

/// Recorder implementations: libgit2-backed and dry run.
pub mod recorder;
pub(crate) use recorder::*;
