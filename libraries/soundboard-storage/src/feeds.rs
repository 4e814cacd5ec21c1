//! Query results that follow the store's change revision

use crate::error::Result;
use sqlx::SqlitePool;
use std::future::Future;
use tokio::sync::watch;

/// Publish `initial`, then re-run `load` whenever the revision moves
///
/// The task ends once every receiver is dropped or the store goes away.
/// Unchanged results are not republished.
pub(crate) fn spawn<T, F, Fut>(
    pool: SqlitePool,
    mut changes: watch::Receiver<u64>,
    initial: T,
    load: F,
) -> watch::Receiver<T>
where
    T: PartialEq + Send + Sync + 'static,
    F: Fn(SqlitePool) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let (tx, rx) = watch::channel(initial);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = tx.closed() => break,
            }

            match load(pool.clone()).await {
                Ok(value) => {
                    tx.send_if_modified(|current| {
                        if *current == value {
                            false
                        } else {
                            *current = value;
                            true
                        }
                    });
                }
                Err(e) => tracing::warn!(error = %e, "Failed to refresh feed"),
            }
        }
    });

    rx
}
