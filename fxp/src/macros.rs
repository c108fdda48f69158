//! Internal macros.

/// Abort on an unrecoverable driver or hardware invariant violation.
///
/// The message is logged at error level before panicking so that a
/// supervisor capturing the log sees the cause even with `panic = "abort"`.
macro_rules! fatal {
    ($($arg:tt)+) => {{
        log::error!($($arg)+);
        panic!($($arg)+)
    }};
}
