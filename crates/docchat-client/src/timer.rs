use std::future::Future;
use std::time::Duration;

use futures::future::{self, Either, LocalBoxFuture};

use crate::error::TransportError;

/// Source of delays for timeouts and reconnects
///
/// Implemented per platform so the transports never depend on a specific runtime.
pub trait Timer {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Run `fut`, giving up with [`TransportError::Timeout`] after `duration`
pub async fn with_timeout<F>(timer: &dyn Timer, duration: Duration, fut: F) -> Result<F::Output, TransportError>
where
    F: Future,
{
    futures::pin_mut!(fut);
    match future::select(fut, timer.sleep(duration)).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(_) => Err(TransportError::Timeout),
    }
}

/// Like [`with_timeout`], but `None` waits forever
pub async fn with_optional_timeout<F>(
    timer: &dyn Timer,
    duration: Option<Duration>,
    fut: F,
) -> Result<F::Output, TransportError>
where
    F: Future,
{
    match duration {
        Some(duration) => with_timeout(timer, duration, fut).await,
        None => Ok(fut.await),
    }
}
