//! Driving the async cloud SDKs from the synchronous store trait.

use once_cell::sync::Lazy;
use tokio::runtime::{self, Handle};

use crate::error::{Result, SecretsEnvError};

static RUNTIME: Lazy<std::io::Result<runtime::Runtime>> = Lazy::new(|| {
    runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("secrets-env-rt")
        .build()
});

/// Run the provided future to completion regardless of the current context.
pub fn block_on<F>(fut: F) -> Result<F::Output>
where
    F: std::future::Future,
{
    if let Ok(handle) = Handle::try_current() {
        return Ok(tokio::task::block_in_place(|| handle.block_on(fut)));
    }
    match RUNTIME.as_ref() {
        Ok(rt) => Ok(rt.block_on(fut)),
        Err(e) => Err(SecretsEnvError::Other(format!(
            "failed to start async runtime: {}",
            e
        ))),
    }
}
