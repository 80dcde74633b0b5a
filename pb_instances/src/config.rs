// ********* Input data structures ***********

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use snafu::prelude::*;

/// The set of project indices approved by one voter.
pub type ApprovalBallot = BTreeSet<usize>;

/// The canonical name of the project at the given index.
pub fn project_name(index: usize) -> String {
    format!("p{}", index)
}

/// Number of approvals received by each project.
///
/// The tally is always total over `0..num_projects`: a project that nobody
/// approved is present with a count of zero.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct VoteTally {
    counts: Vec<u64>,
}

impl VoteTally {
    pub fn from_counts(counts: Vec<u64>) -> VoteTally {
        VoteTally { counts }
    }

    /// Builds a tally from a sparse mapping. Every index in `0..num_projects`
    /// must be present, and no other index may appear.
    pub fn from_map(
        map: &BTreeMap<usize, u64>,
        num_projects: usize,
    ) -> Result<VoteTally, GeneratorError> {
        let mut counts: Vec<u64> = Vec::with_capacity(num_projects);
        for idx in 0..num_projects {
            let count = map.get(&idx).context(InvalidParameterSnafu {
                name: "tally",
                reason: format!("missing count for project index {}", idx),
            })?;
            counts.push(*count);
        }
        if let Some(extra) = map.keys().find(|idx| **idx >= num_projects) {
            return InvalidParameterSnafu {
                name: "tally",
                reason: format!(
                    "project index {} is outside of 0..{}",
                    extra, num_projects
                ),
            }
            .fail();
        }
        Ok(VoteTally { counts })
    }

    pub fn count(&self, project: usize) -> Option<u64> {
        self.counts.get(project).cloned()
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total_approvals(&self) -> u64 {
        self.counts.iter().sum()
    }
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub cost: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct ProjectMeta {
    pub cost: u64,
}

/// A participatory budgeting election: a budget limit and the candidate projects.
///
/// Instances are only built by the generator and are not modified afterwards.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Instance {
    budget_limit: u64,
    // In project index order.
    projects: Vec<Project>,
    project_meta: BTreeMap<String, ProjectMeta>,
}

impl Instance {
    pub(crate) fn new(budget_limit: u64, projects: Vec<Project>) -> Instance {
        let project_meta = projects
            .iter()
            .map(|p| (p.name.clone(), ProjectMeta { cost: p.cost }))
            .collect();
        Instance {
            budget_limit,
            projects,
            project_meta,
        }
    }

    pub fn budget_limit(&self) -> u64 {
        self.budget_limit
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn project_meta(&self) -> &BTreeMap<String, ProjectMeta> {
        &self.project_meta
    }

    pub fn get_project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn costs(&self) -> Vec<u64> {
        self.projects.iter().map(|p| p.cost).collect()
    }

    pub fn total_cost(&self) -> u64 {
        self.projects.iter().map(|p| p.cost).sum()
    }
}

/// The approval ballots of an instance, expressed with project names.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub ballots: Vec<BTreeSet<String>>,
}

impl Profile {
    pub fn num_ballots(&self) -> usize {
        self.ballots.len()
    }
}

/// The outcome of the cost draw for one project.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum CostDecision {
    Proportional,
    Inflated,
}

/// The instances of a sweep, with the probability used for each of them.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SweepResult {
    pub instances: Vec<Instance>,
    /// The proportionality probability used for each instance, in sweep order.
    pub prop_probs: Vec<f64>,
    /// The same probabilities rounded to 2 decimals.
    pub prop_prob_labels: Vec<f64>,
}

/// Errors that prevent the generator from producing instances.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum GeneratorError {
    #[snafu(display("Invalid parameter {name}: {reason}"))]
    InvalidParameter { name: &'static str, reason: String },

    #[snafu(display("Could not build the cost distribution"))]
    SamplingFailure { source: rand_distr::NormalError },

    #[snafu(display("The cost distribution produced a non-finite value {value}"))]
    NonFiniteSample { value: f64 },
}

// ********* Configuration **********

/// Standard deviation of the inflated cost distribution.
pub const DEFAULT_SIGMA: f64 = 20000.0;

/// The distribution used for inflated costs.
#[derive(PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostModel {
    pub sigma: f64,
}

impl CostModel {
    pub const DEFAULT: CostModel = CostModel {
        sigma: DEFAULT_SIGMA,
    };
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel::DEFAULT
    }
}

/// What to do when the sweep goes below a probability of zero.
///
/// - Extrapolate keeps decrementing. A negative probability means that every
/// project of the instance takes the inflation branch.
///
/// - Clamp stops the running probability at zero.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepBounds {
    Extrapolate,
    Clamp,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SweepSettings {
    pub num_instances: usize,
    pub prop_prob_start: f64,
    pub prop_prob_step: f64,
    pub bounds: SweepBounds,
}

impl SweepSettings {
    pub const DEFAULT_SETTINGS: SweepSettings = SweepSettings {
        num_instances: 40,
        prop_prob_start: 1.0,
        prop_prob_step: 0.025,
        bounds: SweepBounds::Extrapolate,
    };
}

impl Default for SweepSettings {
    fn default() -> Self {
        SweepSettings::DEFAULT_SETTINGS
    }
}
