use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::bulk::{BulkPermissionUpdater, BulkReport};
use crate::error::{AccessError, Result};
use crate::notifier::{AdminAlert, Notifier};
use crate::platform::HealthProbe;
use crate::state_machine::{
    AccessState, AccessStateMachine, AccessValue, BulkMode, RevokeLevel, Transition,
};
use crate::store::AccessStateStore;

/// What a reconciliation or admin request did.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// No transition; carries the current value.
    Unchanged(AccessValue),
    Transitioned {
        transition: Transition,
        alert_sent: bool,
        /// `None` when the bulk pass could not start at all.
        bulk: Option<BulkReport>,
    },
}

/// Drives the platform access flag from health probes and admin requests.
///
/// The new value is saved before any alert or bulk pass, so a failed
/// notification or a partially applied bulk pass never rolls it back.
/// The outage latch is only disarmed after the alert was delivered.
pub struct AccessReconciler {
    store: Arc<dyn AccessStateStore>,
    probe: Arc<dyn HealthProbe>,
    notifier: Arc<dyn Notifier>,
    updater: BulkPermissionUpdater,
    outage_level: RevokeLevel,
}

impl AccessReconciler {
    pub fn new(
        store: Arc<dyn AccessStateStore>,
        probe: Arc<dyn HealthProbe>,
        notifier: Arc<dyn Notifier>,
        updater: BulkPermissionUpdater,
        outage_level: RevokeLevel,
    ) -> Self {
        Self {
            store,
            probe,
            notifier,
            updater,
            outage_level,
        }
    }

    /// Current state, created with defaults on first access.
    pub fn current(&self) -> Result<AccessState> {
        match self.store.load()? {
            Some(state) => Ok(state),
            None => {
                let state = AccessState::default();
                self.store.save(&state)?;
                info!(value = %state.value, "created default access state");
                Ok(state)
            }
        }
    }

    /// Stored state, or the default without persisting it.
    fn peek(&self) -> Result<AccessState> {
        Ok(self.store.load()?.unwrap_or_default())
    }

    pub fn is_enabled(&self) -> Result<bool> {
        Ok(self.current()?.value == AccessValue::On)
    }

    /// One health-check tick. Safe to call on any schedule.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome> {
        let pass_id = Uuid::new_v4();
        let mut state = self.current()?;
        let status = self.probe.status().await;
        debug!(%pass_id, available = status.ok, value = %state.value, "platform probed");

        let Some(transition) = AccessStateMachine::on_probe(&mut state, status.ok, self.outage_level)
        else {
            return Ok(ReconcileOutcome::Unchanged(state.value));
        };

        self.store.save(&state)?;
        warn!(
            %pass_id,
            from = %transition.from,
            to = %transition.to,
            failing = ?status.failing_systems(),
            "platform access changed by health check"
        );

        let alert_sent = match transition.alert {
            Some(kind) => {
                let sent = self
                    .send_alert(&AdminAlert::for_kind(kind, &status), pass_id)
                    .await;
                if sent && AccessStateMachine::alert_delivered(&mut state, kind) {
                    if let Err(e) = self.store.save(&state) {
                        error!(%pass_id, error = %e, class = %e.class(), "failed to disarm outage alert");
                    }
                }
                sent
            }
            None => false,
        };
        let bulk = self.run_bulk(transition.bulk, pass_id).await;

        Ok(ReconcileOutcome::Transitioned {
            transition,
            alert_sent,
            bulk,
        })
    }

    /// Admin request to set access to `on`, `readonly` or `off`.
    ///
    /// Unknown values and `local-off` are rejected before anything is
    /// written or any platform call is made.
    pub async fn apply_admin_request(&self, requested: &str) -> Result<ReconcileOutcome> {
        let requested: AccessValue = requested.parse()?;
        if requested == AccessValue::LocalOff {
            return Err(AccessError::ReservedAccessValue);
        }
        let pass_id = Uuid::new_v4();
        let mut state = self.peek()?;

        let Some(transition) = AccessStateMachine::admin_set(&mut state, requested)? else {
            info!(%pass_id, value = %state.value, "access already at requested value");
            return Ok(ReconcileOutcome::Unchanged(state.value));
        };

        self.store.save(&state)?;
        info!(
            %pass_id,
            from = %transition.from,
            to = %transition.to,
            "platform access changed by admin"
        );

        let bulk = self.run_bulk(transition.bulk, pass_id).await;
        Ok(ReconcileOutcome::Transitioned {
            transition,
            alert_sent: false,
            bulk,
        })
    }

    async fn send_alert(&self, alert: &AdminAlert, pass_id: Uuid) -> bool {
        match self.notifier.send_admin_alert(alert).await {
            Ok(()) => {
                info!(%pass_id, subject = %alert.subject, "admin alert sent");
                true
            }
            Err(e) => {
                error!(%pass_id, subject = %alert.subject, error = %e, "admin alert failed");
                false
            }
        }
    }

    async fn run_bulk(&self, mode: BulkMode, pass_id: Uuid) -> Option<BulkReport> {
        match self.updater.apply(mode).await {
            Ok(report) => {
                if !report.is_clean() {
                    warn!(
                        %pass_id,
                        %mode,
                        failed = report.failures.len(),
                        "bulk permission pass finished with failures"
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!(%pass_id, %mode, error = %e, class = %e.class(), "bulk permission pass failed");
                None
            }
        }
    }
}
