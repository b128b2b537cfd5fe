pub mod adapter;
pub mod factory;
pub mod fallback;
pub mod interface;
pub mod onnx;

pub use adapter::*;
pub use factory::*;
pub use fallback::*;
pub use interface::*;

use std::time::Duration;

use anyhow::{anyhow, Result};

/// Run a synchronous model call on the blocking pool, bounded by `timeout`.
///
/// A timed-out call keeps running on its blocking thread; only the awaiting
/// request is released.
pub async fn blocking_inference<T, F>(timeout: Duration, f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(f)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(anyhow!("Inference task failed: {}", join_err)),
        Err(_) => Err(anyhow!(
            "Inference timed out after {:.1}s",
            timeout.as_secs_f32()
        )),
    }
}
