//! # Logging.
//!
//! Log lines are routed through the account's notification stream as
//! [`crate::EventType::Info`]/[`Warning`](crate::EventType::Warning)/
//! [`Error`](crate::EventType::Error) so the embedding process decides what
//! reaches its logs. Identifiers are logged; emails and passphrases are not.

use crate::context::Context;

#[macro_export]
macro_rules! info {
    ($ctx:expr,  $msg:expr) => {
        info!($ctx, $msg,)
    };
    ($ctx:expr, $msg:expr, $($args:expr),* $(,)?) => {{
        let formatted = format!($msg, $($args),*);
        let full = format!("{file}:{line}: {msg}",
                           file = file!(),
                           line = line!(),
                           msg = &formatted);
        $ctx.emit_event($crate::EventType::Info(full));
    }};
}

#[macro_export]
macro_rules! warn {
    ($ctx:expr, $msg:expr) => {
        warn!($ctx, $msg,)
    };
    ($ctx:expr, $msg:expr, $($args:expr),* $(,)?) => {{
        let formatted = format!($msg, $($args),*);
        let full = format!("{file}:{line}: {msg}",
                           file = file!(),
                           line = line!(),
                           msg = &formatted);
        $ctx.emit_event($crate::EventType::Warning(full));
    }};
}

#[macro_export]
macro_rules! error {
    ($ctx:expr, $msg:expr) => {
        error!($ctx, $msg,)
    };
    ($ctx:expr, $msg:expr, $($args:expr),* $(,)?) => {{
        let formatted = format!($msg, $($args),*);
        $ctx.emit_event($crate::EventType::Error(formatted));
    }};
}

#[allow(dead_code)]
pub(crate) trait LogExt<T> {
    /// Emits a warning if the receiver contained an `Err` value and returns
    /// the `Ok` value, if any.
    ///
    /// The caller's location is attached to the warning so repeated warnings
    /// can be traced back to their origin.
    #[track_caller]
    fn log_err(self, context: &Context) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogExt<T> for Result<T, E> {
    #[track_caller]
    fn log_err(self, context: &Context) -> Option<T> {
        match self {
            Err(e) => {
                let location = std::panic::Location::caller();
                let full = format!(
                    "{file}:{line}: {e:#}",
                    file = location.file(),
                    line = location.line(),
                );
                // Can't use the warn!() macro here as the file!() and line!()
                // macros don't work with #[track_caller].
                context.emit_event(crate::EventType::Warning(full));
                None
            }
            Ok(v) => Some(v),
        }
    }
}
