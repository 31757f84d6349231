//! Cancellation for the one suspension point of a turn: waiting on the
//! response provider. Closing a session cancels its token, which
//! interrupts any pending delay.
use std::fmt;
use std::future::Future;

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl fmt::Display for Cancelled {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "pending response was cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Drive `fut` to completion unless `token` is cancelled first, in
/// which case `fut` is dropped.
pub async fn cancellable<F>(token: &CancellationToken, fut: F) -> Result<F::Output, Cancelled>
where
    F: Future,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        out = fut => Ok(out),
    }
}
