//! Background refresh of the needs list shown on the map.
//!
//! A single task owns the refetch loop. It wakes on a fixed interval and on
//! every change notification for the needs table. Only one fetch runs at a
//! time. Triggers that arrive while a fetch is running mark the feed dirty,
//! and exactly one follow-up fetch starts when the running one finishes, so
//! a steady stream of changes can delay a refresh but never starve it.

use crate::domain::{cluster, Cluster, Need, NeedFilter};
use crate::infrastructure::{ChangeKind, DataBackend, Table};
use neighborly_errors::AppError;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

type Fetch = Pin<Box<dyn Future<Output = Result<Vec<Need>, AppError>> + Send>>;

/// Latest needs list plus how many successful refreshes produced it.
#[derive(Debug, Clone, Default)]
pub struct FeedSnapshot {
    pub needs: Arc<Vec<Need>>,
    pub version: u64,
    pub refreshed_at: Option<chrono::DateTime<chrono::Utc>>,
}

pub struct LiveFeed {
    snapshot: watch::Receiver<FeedSnapshot>,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl LiveFeed {
    /// Spawns the refresh task. Must be called inside a tokio runtime.
    pub fn start(backend: Arc<dyn DataBackend>, interval: Duration) -> Self {
        let (tx, snapshot) = watch::channel(FeedSnapshot::default());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task = tokio::spawn(run(backend, interval, tx, shutdown_rx));

        tracing::info!(interval_secs = interval.as_secs(), "live feed started");
        Self {
            snapshot,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified every time the snapshot is replaced.
    pub fn watch(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshot.clone()
    }

    /// Filters the current snapshot and groups it into map clusters.
    pub fn clusters(&self, filter: &NeedFilter) -> Vec<Cluster> {
        let needs = self.snapshot.borrow().needs.clone();
        cluster::group_by_cell(filter.apply(needs.iter().cloned()))
    }

    /// Stops the task and waits for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "live feed task ended abnormally");
            }
        }
    }
}

impl Drop for LiveFeed {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn fetch(backend: &Arc<dyn DataBackend>) -> Fetch {
    let backend = Arc::clone(backend);
    Box::pin(async move { backend.list_needs(&NeedFilter::default()).await })
}

async fn run(
    backend: Arc<dyn DataBackend>,
    interval: Duration,
    tx: watch::Sender<FeedSnapshot>,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut changes = backend.subscribe(Table::Needs);
    let mut changes_open = true;

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut in_flight: Option<Fetch> = None;
    let mut dirty = false;
    let mut version = 0u64;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,

            _ = ticker.tick() => {
                if in_flight.is_some() {
                    dirty = true;
                } else {
                    in_flight = Some(fetch(&backend));
                }
            }

            event = changes.next(), if changes_open => match event {
                Some(event) => {
                    if event.kind == ChangeKind::Lagged {
                        tracing::debug!("change stream lagged, refreshing");
                    }
                    if in_flight.is_some() {
                        dirty = true;
                    } else {
                        in_flight = Some(fetch(&backend));
                    }
                }
                None => {
                    tracing::warn!("change stream closed, falling back to polling");
                    changes_open = false;
                }
            },

            result = async {
                match in_flight.as_mut() {
                    Some(f) => f.await,
                    None => std::future::pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                match result {
                    Ok(needs) => {
                        version += 1;
                        tx.send_replace(FeedSnapshot {
                            needs: Arc::new(needs),
                            version,
                            refreshed_at: Some(chrono::Utc::now()),
                        });
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "needs refresh failed, keeping previous snapshot");
                    }
                }
                if std::mem::take(&mut dirty) {
                    tracing::debug!("changes arrived during refresh, fetching again");
                    in_flight = Some(fetch(&backend));
                }
            }
        }
    }

    tracing::info!("live feed stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::need;
    use crate::domain::{VoteDirection, VoteTarget};
    use crate::infrastructure::MemoryBackend;

    const HOUR: Duration = Duration::from_secs(3600);

    async fn next_version(rx: &mut watch::Receiver<FeedSnapshot>) -> FeedSnapshot {
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .expect("feed did not refresh in time")
            .expect("feed task stopped");
        rx.borrow_and_update().clone()
    }

    #[tokio::test]
    async fn test_initial_fetch_fills_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();

        let feed = LiveFeed::start(backend, HOUR);
        let mut rx = feed.watch();
        let snapshot = next_version(&mut rx).await;

        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.needs.len(), 1);
    }

    #[tokio::test]
    async fn test_change_notification_replaces_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        let feed = LiveFeed::start(backend.clone(), HOUR);
        let mut rx = feed.watch();
        assert!(next_version(&mut rx).await.needs.is_empty());

        let added = backend.insert_need(need("Park", 0, 0)).await.unwrap();
        let snapshot = next_version(&mut rx).await;

        assert_eq!(snapshot.needs.len(), 1);
        assert_eq!(snapshot.needs[0].id, added.id);
        assert_eq!(feed.snapshot().version, snapshot.version);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();

        let feed = LiveFeed::start(backend.clone(), Duration::from_millis(20));
        let mut rx = feed.watch();
        let first = next_version(&mut rx).await;

        backend.set_unavailable(true);
        tokio::time::sleep(Duration::from_millis(100)).await;
        let stale = rx.borrow_and_update().clone();
        assert!(stale.version >= first.version);

        // Several ticks fail; the snapshot stays as it was.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(feed.snapshot().version, stale.version);
        assert_eq!(feed.snapshot().needs.len(), 1);

        backend.set_unavailable(false);
        let fresh = next_version(&mut rx).await;
        assert!(fresh.version > stale.version);
        assert_eq!(fresh.needs.len(), 1);
    }

    #[tokio::test]
    async fn test_clusters_from_snapshot() {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_need(need("a", 60, 0)).await.unwrap();
        backend.insert_need(need("b", 1, 0)).await.unwrap();

        let feed = LiveFeed::start(backend, HOUR);
        let mut rx = feed.watch();
        next_version(&mut rx).await;

        let clusters = feed.clusters(&NeedFilter::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[0].tier, crate::domain::HeatTier::OnFire);
    }

    #[tokio::test]
    async fn test_steady_votes_do_not_starve_refresh() {
        let backend = Arc::new(MemoryBackend::new());
        let target = backend.insert_need(need("Pharmacy", 0, 0)).await.unwrap();
        backend.set_list_delay(Duration::from_millis(50));

        let feed = LiveFeed::start(backend.clone(), Duration::from_millis(200));
        let voter = {
            let backend = backend.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    backend
                        .increment_vote(VoteTarget::Need(target.id), VoteDirection::Up)
                        .await
                        .unwrap();
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
            })
        };
        voter.await.unwrap();

        let during = feed.snapshot();
        assert!(during.version > 1, "only {} refreshes under load", during.version);
        assert_eq!(during.needs.len(), 1);

        // The follow-up fetch after the last vote sees the final count.
        let mut rx = feed.watch();
        let settled = tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let snapshot = rx.borrow_and_update().clone();
                if snapshot.needs.first().map(|n| n.upvotes) == Some(100) {
                    return snapshot;
                }
                rx.changed().await.unwrap();
            }
        })
        .await
        .expect("final vote count never reached the feed");
        assert!(settled.version >= during.version);
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        let backend = Arc::new(MemoryBackend::new());
        let feed = LiveFeed::start(backend, HOUR);
        let mut rx = feed.watch();
        next_version(&mut rx).await;

        feed.shutdown().await;
        assert!(rx.changed().await.is_err());
    }
}
