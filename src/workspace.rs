use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::PlatformAccessLevel;

/// Permission a collaborator was given when the workspace was shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SharePermission {
    Edit,
    View,
    Reviewer,
}

impl SharePermission {
    pub fn platform_level(self) -> PlatformAccessLevel {
        match self {
            SharePermission::Edit => PlatformAccessLevel::Writer,
            SharePermission::View => PlatformAccessLevel::Reader,
            SharePermission::Reviewer => PlatformAccessLevel::NoAccess,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorShare {
    pub email: String,
    pub permission: SharePermission,
    #[serde(default)]
    pub reviewer: bool,
}

impl CollaboratorShare {
    /// Reviewers never hold platform access, so bulk passes skip them.
    pub fn is_reviewer(&self) -> bool {
        self.reviewer || self.permission == SharePermission::Reviewer
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub project: String,
    pub name: String,
    pub owner_email: String,
    #[serde(default)]
    pub queued_for_deletion: bool,
    #[serde(default)]
    pub shares: Vec<CollaboratorShare>,
}

impl Workspace {
    pub fn collaborators(&self) -> impl Iterator<Item = &CollaboratorShare> {
        self.shares.iter().filter(|s| !s.is_reviewer())
    }
}

/// Selection passed to [`WorkspaceDirectory::list_workspaces`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceFilter {
    pub exclude_queued_for_deletion: bool,
    pub projects: BTreeSet<String>,
}

impl WorkspaceFilter {
    /// Live workspaces of the automatically managed projects.
    pub fn managed(projects: &BTreeSet<String>) -> Self {
        Self {
            exclude_queued_for_deletion: true,
            projects: projects.clone(),
        }
    }

    pub fn matches(&self, workspace: &Workspace) -> bool {
        if self.exclude_queued_for_deletion && workspace.queued_for_deletion {
            return false;
        }
        self.projects.contains(&workspace.project)
    }
}

/// Source of the workspaces the application manages on the platform.
pub trait WorkspaceDirectory: Send + Sync {
    fn list_workspaces(&self, filter: &WorkspaceFilter) -> Result<Vec<Workspace>>;
}
