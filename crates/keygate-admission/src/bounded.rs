use std::future::Future;
use std::time::Duration;

use keygate_core::StoreError;

/// Run a store call on its own task, bounded by `limit`.
///
/// The spawned task keeps running after a timeout or after the caller is
/// dropped, so an issued counter mutation always completes.
pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::time::timeout(limit, tokio::spawn(call)).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(StoreError::Unavailable(format!("store task failed: {join}"))),
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
