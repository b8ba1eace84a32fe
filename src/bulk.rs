use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::config::Deployment;
use crate::error::Result;
use crate::platform::{PermissionApi, PlatformAccessLevel};
use crate::state_machine::{BulkMode, RevokeLevel};
use crate::workspace::{Workspace, WorkspaceDirectory, WorkspaceFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantRole {
    Collaborator,
    Owner,
}

/// One access change for one principal in one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub principal: String,
    pub role: GrantRole,
    pub level: PlatformAccessLevel,
    pub can_share: bool,
    pub can_compute: bool,
}

impl RevokeLevel {
    fn platform_level(self) -> PlatformAccessLevel {
        match self {
            RevokeLevel::Reader => PlatformAccessLevel::Reader,
            RevokeLevel::NoAccess => PlatformAccessLevel::NoAccess,
        }
    }
}

/// Ordered grants for one workspace: every collaborator first, the owner last.
pub fn plan_grants(workspace: &Workspace, mode: BulkMode, deployment: Deployment) -> Vec<Grant> {
    let mut grants: Vec<Grant> = workspace
        .collaborators()
        .map(|share| match mode {
            BulkMode::Revoke(level) => Grant {
                principal: share.email.clone(),
                role: GrantRole::Collaborator,
                level: level.platform_level(),
                can_share: false,
                can_compute: false,
            },
            BulkMode::Restore => {
                let level = share.permission.platform_level();
                Grant {
                    principal: share.email.clone(),
                    role: GrantRole::Collaborator,
                    level,
                    can_share: level.can_share(),
                    can_compute: deployment.allows_compute() && level.can_write(),
                }
            }
        })
        .collect();

    let owner = match mode {
        BulkMode::Revoke(level) => Grant {
            principal: workspace.owner_email.clone(),
            role: GrantRole::Owner,
            level: level.platform_level(),
            can_share: false,
            can_compute: false,
        },
        BulkMode::Restore => Grant {
            principal: workspace.owner_email.clone(),
            role: GrantRole::Owner,
            level: PlatformAccessLevel::Writer,
            can_share: true,
            can_compute: deployment.allows_compute(),
        },
    };
    grants.push(owner);
    grants
}

/// An ACL push that failed during a bulk pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclFailure {
    pub project: String,
    pub workspace: String,
    pub principal: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkReport {
    pub mode: BulkMode,
    /// Eligible workspaces processed.
    pub workspaces: usize,
    /// ACL entries pushed successfully.
    pub pushed: usize,
    pub failures: Vec<AclFailure>,
}

impl BulkReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Pushes revoke or restore grants to every managed workspace.
///
/// Workspaces run concurrently up to `concurrency`; grants inside a
/// workspace run one after another so the owner is always last.
pub struct BulkPermissionUpdater {
    directory: Arc<dyn WorkspaceDirectory>,
    api: Arc<dyn PermissionApi>,
    managed_projects: BTreeSet<String>,
    deployment: Deployment,
    concurrency: usize,
}

impl BulkPermissionUpdater {
    pub fn new(
        directory: Arc<dyn WorkspaceDirectory>,
        api: Arc<dyn PermissionApi>,
        managed_projects: BTreeSet<String>,
        deployment: Deployment,
        concurrency: usize,
    ) -> Self {
        Self {
            directory,
            api,
            managed_projects,
            deployment,
            concurrency: concurrency.max(1),
        }
    }

    pub async fn apply(&self, mode: BulkMode) -> Result<BulkReport> {
        let mut report = BulkReport {
            mode,
            workspaces: 0,
            pushed: 0,
            failures: Vec::new(),
        };
        if self.managed_projects.is_empty() {
            debug!(%mode, "no managed projects configured, nothing to update");
            return Ok(report);
        }

        let filter = WorkspaceFilter::managed(&self.managed_projects);
        let eligible: Vec<Workspace> = self
            .directory
            .list_workspaces(&filter)?
            .into_iter()
            .filter(|ws| {
                let keep = filter.matches(ws);
                if !keep {
                    debug!(project = %ws.project, workspace = %ws.name, "workspace exempt from bulk update");
                }
                keep
            })
            .collect();

        let outcomes: Vec<(usize, Vec<AclFailure>)> = stream::iter(eligible.iter())
            .map(|ws| self.apply_to_workspace(ws, mode))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        report.workspaces = eligible.len();
        for (pushed, failures) in outcomes {
            report.pushed += pushed;
            report.failures.extend(failures);
        }

        info!(
            %mode,
            workspaces = report.workspaces,
            pushed = report.pushed,
            failed = report.failures.len(),
            "bulk permission pass finished"
        );
        Ok(report)
    }

    async fn apply_to_workspace(&self, ws: &Workspace, mode: BulkMode) -> (usize, Vec<AclFailure>) {
        let mut pushed = 0;
        let mut failures = Vec::new();

        for grant in plan_grants(ws, mode, self.deployment) {
            let entry = self.api.build_acl_entry(
                &grant.principal,
                grant.level,
                grant.can_share,
                grant.can_compute,
            );
            match self.api.push_acl(&ws.project, &ws.name, &entry).await {
                Ok(()) => pushed += 1,
                Err(e) => {
                    warn!(
                        project = %ws.project,
                        workspace = %ws.name,
                        principal = %grant.principal,
                        role = ?grant.role,
                        error = %e,
                        "ACL update failed"
                    );
                    failures.push(AclFailure {
                        project: ws.project.clone(),
                        workspace: ws.name.clone(),
                        principal: grant.principal,
                        error: e.to_string(),
                    });
                }
            }
        }

        (pushed, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryDirectory, RecordingPermissionApi, workspace};
    use crate::workspace::{CollaboratorShare, SharePermission};

    fn projects(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn updater(
        directory: MemoryDirectory,
        api: Arc<RecordingPermissionApi>,
        deployment: Deployment,
    ) -> BulkPermissionUpdater {
        BulkPermissionUpdater::new(
            Arc::new(directory),
            api,
            projects(&["billing-1", "billing-2"]),
            deployment,
            4,
        )
    }

    fn sample() -> Workspace {
        let mut ws = workspace("billing-1", "atlas");
        ws.shares = vec![
            CollaboratorShare {
                email: "ed@example.com".into(),
                permission: SharePermission::Edit,
                reviewer: false,
            },
            CollaboratorShare {
                email: "vi@example.com".into(),
                permission: SharePermission::View,
                reviewer: false,
            },
            CollaboratorShare {
                email: "rv@example.com".into(),
                permission: SharePermission::Reviewer,
                reviewer: true,
            },
        ];
        ws
    }

    #[test]
    fn revoke_plan_puts_owner_last_and_skips_reviewers() {
        let grants = plan_grants(
            &sample(),
            BulkMode::Revoke(RevokeLevel::NoAccess),
            Deployment::Staging,
        );
        let principals: Vec<&str> = grants.iter().map(|g| g.principal.as_str()).collect();
        assert_eq!(
            principals,
            vec!["ed@example.com", "vi@example.com", "owner@example.com"]
        );
        assert_eq!(grants.last().unwrap().role, GrantRole::Owner);
        assert!(grants.iter().all(|g| g.level == PlatformAccessLevel::NoAccess
            && !g.can_share
            && !g.can_compute));
    }

    #[test]
    fn revoke_to_reader() {
        let grants = plan_grants(&sample(), BulkMode::Revoke(RevokeLevel::Reader), Deployment::Development);
        assert!(grants.iter().all(|g| g.level == PlatformAccessLevel::Reader));
    }

    #[test]
    fn restore_plan_outside_production() {
        let grants = plan_grants(&sample(), BulkMode::Restore, Deployment::Staging);
        assert_eq!(
            grants[0],
            Grant {
                principal: "ed@example.com".into(),
                role: GrantRole::Collaborator,
                level: PlatformAccessLevel::Writer,
                can_share: false,
                can_compute: true,
            }
        );
        assert_eq!(grants[1].level, PlatformAccessLevel::Reader);
        assert!(!grants[1].can_compute);
        assert_eq!(
            grants[2],
            Grant {
                principal: "owner@example.com".into(),
                role: GrantRole::Owner,
                level: PlatformAccessLevel::Writer,
                can_share: true,
                can_compute: true,
            }
        );
    }

    #[test]
    fn restore_plan_in_production_never_grants_compute() {
        let grants = plan_grants(&sample(), BulkMode::Restore, Deployment::Production);
        assert!(grants.iter().all(|g| !g.can_compute));
        let owner = grants.last().unwrap();
        assert!(owner.can_share);
        assert_eq!(owner.level, PlatformAccessLevel::Writer);
    }

    #[tokio::test]
    async fn owner_is_pushed_after_collaborators_in_both_modes() {
        for mode in [BulkMode::Revoke(RevokeLevel::NoAccess), BulkMode::Restore] {
            let api = Arc::new(RecordingPermissionApi::default());
            let updater = updater(MemoryDirectory::new(vec![sample()]), api.clone(), Deployment::Staging);
            let report = updater.apply(mode).await.unwrap();
            assert_eq!(report.pushed, 3);

            let calls = api.calls_for("billing-1", "atlas");
            assert_eq!(calls.len(), 3);
            assert_eq!(calls.last().unwrap().email, "owner@example.com");
        }
    }

    #[tokio::test]
    async fn exempt_workspaces_receive_no_calls() {
        let mut deleted = workspace("billing-1", "trash");
        deleted.queued_for_deletion = true;
        let user_funded = workspace("user-funded", "lab");
        let directory = MemoryDirectory::new(vec![deleted, user_funded, workspace("billing-2", "kept")]);

        for mode in [BulkMode::Revoke(RevokeLevel::Reader), BulkMode::Restore] {
            let api = Arc::new(RecordingPermissionApi::default());
            let updater = updater(directory.clone(), api.clone(), Deployment::Production);
            let report = updater.apply(mode).await.unwrap();

            assert_eq!(report.workspaces, 1);
            assert!(api.calls_for("billing-1", "trash").is_empty());
            assert!(api.calls_for("user-funded", "lab").is_empty());
            assert_eq!(api.calls_for("billing-2", "kept").len(), 1);
        }
    }

    #[tokio::test]
    async fn failures_do_not_stop_the_pass() {
        let api = Arc::new(RecordingPermissionApi::failing_for(&["vi@example.com"]));
        let mut other = sample();
        other.name = "beacon".into();
        let updater = updater(MemoryDirectory::new(vec![sample(), other]), api.clone(), Deployment::Staging);

        let report = updater.apply(BulkMode::Revoke(RevokeLevel::NoAccess)).await.unwrap();

        assert_eq!(report.workspaces, 2);
        assert_eq!(report.pushed, 4);
        assert_eq!(report.failures.len(), 2);
        assert!(!report.is_clean());
        assert!(report.failures.iter().all(|f| f.principal == "vi@example.com"));
        assert_eq!(
            api.calls_for("billing-1", "beacon").last().unwrap().email,
            "owner@example.com"
        );
    }

    #[tokio::test]
    async fn no_managed_projects_means_no_calls() {
        let api = Arc::new(RecordingPermissionApi::default());
        let updater = BulkPermissionUpdater::new(
            Arc::new(MemoryDirectory::new(vec![sample()])),
            api.clone(),
            BTreeSet::new(),
            Deployment::Staging,
            2,
        );
        let report = updater.apply(BulkMode::Restore).await.unwrap();
        assert_eq!(report.workspaces, 0);
        assert!(api.all_calls().is_empty());
    }

    #[tokio::test]
    async fn directory_failure_is_returned() {
        let api = Arc::new(RecordingPermissionApi::default());
        let updater = updater(MemoryDirectory::unavailable(), api.clone(), Deployment::Staging);
        assert!(updater.apply(BulkMode::Restore).await.is_err());
        assert!(api.all_calls().is_empty());
    }
}
