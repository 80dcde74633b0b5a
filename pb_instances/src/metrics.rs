//! Per-project arrays handed to the statistics and plotting tools.
//!
//! All the arrays are in project index order, so that position `i` of each of
//! them describes the project `p<i>`.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::*;

/// Share of the budget taken by each project.
pub fn budget_percentages(instance: &Instance) -> Vec<f64> {
    let budget = instance.budget_limit() as f64;
    instance
        .projects()
        .iter()
        .map(|p| p.cost as f64 / budget)
        .collect()
}

/// Share of the voters approving each project.
pub fn vote_percentages(tally: &VoteTally, num_votes: usize) -> Vec<f64> {
    tally
        .counts()
        .iter()
        .map(|c| *c as f64 / num_votes as f64)
        .collect()
}

pub fn differences(budget_perc: &[f64], votes_perc: &[f64]) -> Vec<f64> {
    budget_perc
        .iter()
        .zip(votes_perc.iter())
        .map(|(b, v)| b - v)
        .collect()
}

/// 1.0 for the selected projects, 0.0 for the others.
pub fn selection_indicator(instance: &Instance, selected: &BTreeSet<String>) -> Vec<f64> {
    instance
        .projects()
        .iter()
        .map(|p| if selected.contains(&p.name) { 1.0 } else { 0.0 })
        .collect()
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMetrics {
    pub budget_perc: Vec<f64>,
    pub votes_perc: Vec<f64>,
    pub differences: Vec<f64>,
}

impl ProjectMetrics {
    pub fn compute(instance: &Instance, tally: &VoteTally, num_votes: usize) -> ProjectMetrics {
        let budget_perc = budget_percentages(instance);
        let votes_perc = vote_percentages(tally, num_votes);
        let differences = differences(&budget_perc, &votes_perc);
        ProjectMetrics {
            budget_perc,
            votes_perc,
            differences,
        }
    }
}

/// Aggregate description of one instance of a sweep.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct InstanceSummary {
    pub prop_prob: f64,
    pub total_cost: u64,
    /// Projects whose cost differs from their proportional cost.
    pub num_above_proportional: usize,
    pub costs: Vec<u64>,
    pub metrics: ProjectMetrics,
}

impl InstanceSummary {
    pub fn compute(
        instance: &Instance,
        prop_prob: f64,
        tally: &VoteTally,
        num_votes: usize,
    ) -> InstanceSummary {
        let num_above_proportional = instance
            .projects()
            .iter()
            .zip(tally.counts().iter())
            .filter(|(p, count)| {
                p.cost != crate::proportional_cost(**count, num_votes as u64, instance.budget_limit())
            })
            .count();
        InstanceSummary {
            prop_prob,
            total_cost: instance.total_cost(),
            num_above_proportional,
            costs: instance.costs(),
            metrics: ProjectMetrics::compute(instance, tally, num_votes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_cost_instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn proportional_instance() -> (Instance, VoteTally) {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let tally = VoteTally::from_counts(vec![50, 25, 15, 10]);
        let instance =
            create_cost_instance(1000, 1.0, 4, &tally, 100, &CostModel::DEFAULT, &mut rng)
                .unwrap();
        (instance, tally)
    }

    #[test]
    fn proportional_instance_has_no_difference() {
        let (instance, tally) = proportional_instance();
        let m = ProjectMetrics::compute(&instance, &tally, 100);
        assert_eq!(m.budget_perc, vec![0.5, 0.25, 0.15, 0.1]);
        assert_eq!(m.votes_perc, vec![0.5, 0.25, 0.15, 0.1]);
        assert!(m.differences.iter().all(|d| d.abs() < 1e-12));
    }

    #[test]
    fn indicator_follows_project_order() {
        let (instance, _) = proportional_instance();
        let selected: BTreeSet<String> = ["p1".to_string(), "p3".to_string()].into();
        assert_eq!(
            selection_indicator(&instance, &selected),
            vec![0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn summary_counts_inflated_projects() {
        let (instance, tally) = proportional_instance();
        let s = InstanceSummary::compute(&instance, 1.0, &tally, 100);
        assert_eq!(s.total_cost, 1000);
        assert_eq!(s.num_above_proportional, 0);

        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let inflated = create_cost_instance(
            1000,
            -1.0,
            4,
            &tally,
            100,
            &CostModel { sigma: 0.01 },
            &mut rng,
        )
        .unwrap();
        let s = InstanceSummary::compute(&inflated, -1.0, &tally, 100);
        assert_eq!(s.num_above_proportional, 4);
        assert_eq!(s.costs, vec![750, 625, 575, 550]);
    }
}
