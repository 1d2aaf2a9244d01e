//! The select-project → select-scene → select-algorithm wizard.
//!
//! Each user has one server-side [`NavigationSelection`]. Choosing an
//! earlier step invalidates everything after it.

use serde::{Deserialize, Serialize};

use crate::types::DbId;

/// Where the user currently is in the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStep {
    SelectProject,
    SelectScene,
    SelectAlgorithm,
    Classify,
}

/// The ids a user has picked so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationSelection {
    pub project_id: Option<DbId>,
    pub scene_id: Option<DbId>,
    pub algo_id: Option<DbId>,
}

impl NavigationSelection {
    /// The next step the user has to complete.
    ///
    /// A later id without its predecessor (e.g. a scene whose project was
    /// deleted) does not count.
    pub fn step(&self) -> NavigationStep {
        match (self.project_id, self.scene_id, self.algo_id) {
            (None, _, _) => NavigationStep::SelectProject,
            (Some(_), None, _) => NavigationStep::SelectScene,
            (Some(_), Some(_), None) => NavigationStep::SelectAlgorithm,
            (Some(_), Some(_), Some(_)) => NavigationStep::Classify,
        }
    }

    /// Select a project, dropping any scene and algorithm.
    pub fn with_project(self, project_id: DbId) -> Self {
        Self {
            project_id: Some(project_id),
            scene_id: None,
            algo_id: None,
        }
    }

    /// Select a scene of `project_id`, dropping any algorithm.
    pub fn with_scene(self, project_id: DbId, scene_id: DbId) -> Self {
        Self {
            project_id: Some(project_id),
            scene_id: Some(scene_id),
            algo_id: None,
        }
    }

    pub fn with_algo(self, algo_id: DbId) -> Self {
        Self {
            algo_id: Some(algo_id),
            ..self
        }
    }
}
