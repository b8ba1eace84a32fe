//! Wiring of the concrete adapters and the periodic scheduler behind `watch`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::bulk::BulkPermissionUpdater;
use crate::config::AccessConfig;
use crate::error::Result;
use crate::jobs::{OrphanedJobReclaimer, PidDirRegistry, ReclaimReport};
use crate::notifier::{LogNotifier, Notifier, WebhookNotifier};
use crate::platform::PlatformClient;
use crate::reconciler::{AccessReconciler, ReconcileOutcome};
use crate::store::{FileAccessStateStore, FileJobStore, FileWorkspaceDirectory};

pub struct Services {
    pub reconciler: AccessReconciler,
    pub reclaimer: Arc<OrphanedJobReclaimer>,
}

impl Services {
    pub fn from_config(config: &AccessConfig) -> Result<Self> {
        let platform = Arc::new(PlatformClient::new(&config.platform)?);
        let notifier: Arc<dyn Notifier> = match &config.notifier.webhook_url {
            Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
            None => Arc::new(LogNotifier),
        };

        let updater = BulkPermissionUpdater::new(
            Arc::new(FileWorkspaceDirectory::new(config.workspaces_path())),
            platform.clone(),
            config.managed_projects.clone(),
            config.deployment,
            config.bulk_concurrency,
        );
        let reconciler = AccessReconciler::new(
            Arc::new(FileAccessStateStore::new(config.state_path())),
            platform,
            notifier,
            updater,
            config.outage_revoke_level,
        );
        let reclaimer = Arc::new(OrphanedJobReclaimer::new(
            Arc::new(PidDirRegistry::new(config.pid_dir.clone())),
            Arc::new(FileJobStore::new(config.jobs_path())),
        ));

        Ok(Self {
            reconciler,
            reclaimer,
        })
    }
}

/// Runs both passes on their own intervals until `shutdown` resolves.
///
/// A failing pass is logged and retried on its next tick. The reclaim pass
/// does blocking file I/O, so it runs on the blocking pool; at most one is
/// in flight and it is awaited before returning.
pub async fn watch(
    services: &Services,
    reconcile_every: Duration,
    reclaim_every: Duration,
    shutdown: impl Future<Output = ()>,
) {
    let mut reconcile_tick = interval(reconcile_every);
    let mut reclaim_tick = interval(reclaim_every);
    reconcile_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    reclaim_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);
    let mut reclaims: JoinSet<Result<ReclaimReport>> = JoinSet::new();

    info!(
        reconcile_secs = reconcile_every.as_secs(),
        reclaim_secs = reclaim_every.as_secs(),
        "watching platform access and job locks"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown requested");
                break;
            }
            _ = reconcile_tick.tick() => {
                match services.reconciler.reconcile().await {
                    Ok(ReconcileOutcome::Unchanged(_)) => {}
                    Ok(ReconcileOutcome::Transitioned { transition, .. }) => {
                        info!(from = %transition.from, to = %transition.to, "reconcile tick changed access");
                    }
                    Err(e) => error!(error = %e, class = %e.class(), "reconcile tick failed"),
                }
            }
            _ = reclaim_tick.tick() => {
                if reclaims.is_empty() {
                    let reclaimer = Arc::clone(&services.reclaimer);
                    reclaims.spawn_blocking(move || reclaimer.reclaim());
                } else {
                    debug!("previous reclaim pass still running, skipping tick");
                }
            }
            Some(joined) = reclaims.join_next() => log_reclaim(joined),
        }
    }

    while let Some(joined) = reclaims.join_next().await {
        log_reclaim(joined);
    }
}

fn log_reclaim(joined: std::result::Result<Result<ReclaimReport>, JoinError>) {
    match joined {
        Ok(Ok(report)) => debug!(
            examined = report.examined,
            unlocked = report.unlocked,
            "reclaim tick finished"
        ),
        Ok(Err(e)) => error!(error = %e, class = %e.class(), "reclaim tick failed"),
        Err(e) => error!(error = %e, "reclaim task panicked"),
    }
}
