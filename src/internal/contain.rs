//! Failure containment for user code (hooks, handlers, producers).

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Runs `f`, turning both returned errors and panics into a message.
pub(crate) fn contained<T, F>(f: F) -> Result<T, String>
where
    F: FnOnce() -> anyhow::Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(format!("{:#}", err)),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

/// Like [`contained`], also measuring how long `f` took.
pub(crate) fn tracked<F>(f: F) -> Result<Duration, String>
where
    F: FnOnce() -> anyhow::Result<()>,
{
    let start = Instant::now();
    contained(f).map(|()| start.elapsed())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}
