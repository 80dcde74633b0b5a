mod config;
pub mod builder;
pub mod interfaces;
pub mod manual;
pub mod metrics;
pub mod sampler;

use log::{debug, info, warn};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use snafu::prelude::*;

pub use crate::config::*;
use crate::sampler::BallotSampler;

// **** Ballots and tally ****

/// Samples the approval ballots of an election.
///
/// Arguments:
/// * `sampler` the ballot model
/// * `num_votes` the number of simulated voters
/// * `num_projects` the number of projects, identified by `0..num_projects`
pub fn generate_ballots<S: BallotSampler, R: Rng + ?Sized>(
    sampler: &S,
    num_votes: usize,
    num_projects: usize,
    rng: &mut R,
) -> Result<Vec<ApprovalBallot>, GeneratorError> {
    ensure!(
        num_votes > 0,
        InvalidParameterSnafu {
            name: "num_votes",
            reason: "must be positive",
        }
    );
    ensure!(
        num_projects > 0,
        InvalidParameterSnafu {
            name: "num_projects",
            reason: "must be positive",
        }
    );
    let ballots = sampler.sample(num_votes, num_projects, rng)?;
    ensure!(
        ballots.len() == num_votes,
        InvalidParameterSnafu {
            name: "ballots",
            reason: format!(
                "sampler returned {} ballots for {} voters",
                ballots.len(),
                num_votes
            ),
        }
    );
    info!(
        "generate_ballots: {} ballots over {} projects",
        ballots.len(),
        num_projects
    );
    Ok(ballots)
}

/// Counts the approvals of each project in `0..num_projects`.
///
/// Projects that were never approved are present with a count of zero.
pub fn tally_ballots(
    ballots: &[ApprovalBallot],
    num_projects: usize,
) -> Result<VoteTally, GeneratorError> {
    let mut counts: Vec<u64> = vec![0; num_projects];
    for (ballot_idx, ballot) in ballots.iter().enumerate() {
        for project in ballot.iter() {
            let count = counts.get_mut(*project).context(InvalidParameterSnafu {
                name: "ballots",
                reason: format!(
                    "ballot {} approves project {} outside of 0..{}",
                    ballot_idx, project, num_projects
                ),
            })?;
            *count += 1;
        }
    }
    Ok(VoteTally::from_counts(counts))
}

/// Samples the ballots and computes their tally.
///
/// The ballots are meant to be shared by all the instances of a sweep, so that
/// the costs are the only thing that changes across the family.
pub fn create_ballots<S: BallotSampler, R: Rng + ?Sized>(
    sampler: &S,
    num_votes: usize,
    num_projects: usize,
    rng: &mut R,
) -> Result<(Vec<ApprovalBallot>, VoteTally), GeneratorError> {
    let ballots = generate_ballots(sampler, num_votes, num_projects, rng)?;
    let tally = tally_ballots(&ballots, num_projects)?;
    debug!("create_ballots: tally {:?}", tally.counts());
    Ok((ballots, tally))
}

// **** Cost synthesis ****

/// The cost of a project whose share of the budget equals its share of the votes:
/// `floor(count / num_votes * budget)`.
pub fn proportional_cost(count: u64, num_votes: u64, budget: u64) -> u64 {
    if num_votes == 0 {
        return 0;
    }
    // Exact floor, without going through floating point.
    (count as u128 * budget as u128 / num_votes as u128) as u64
}

fn check_inputs(
    budget: u64,
    num_projects: usize,
    tally: &VoteTally,
    num_votes: usize,
    cost_model: &CostModel,
) -> Result<(), GeneratorError> {
    ensure!(
        budget > 0,
        InvalidParameterSnafu {
            name: "budget",
            reason: "must be positive",
        }
    );
    ensure!(
        num_votes > 0,
        InvalidParameterSnafu {
            name: "num_votes",
            reason: "must be positive",
        }
    );
    ensure!(
        num_projects > 0,
        InvalidParameterSnafu {
            name: "num_projects",
            reason: "must be positive",
        }
    );
    ensure!(
        tally.len() == num_projects,
        InvalidParameterSnafu {
            name: "tally",
            reason: format!(
                "expected counts for {} projects, got {}",
                num_projects,
                tally.len()
            ),
        }
    );
    if let Some((idx, count)) = tally
        .counts()
        .iter()
        .enumerate()
        .find(|(_, c)| **c > num_votes as u64)
    {
        return InvalidParameterSnafu {
            name: "tally",
            reason: format!(
                "project {} has {} approvals for {} voters",
                idx, count, num_votes
            ),
        }
        .fail();
    }
    ensure!(
        cost_model.sigma.is_finite() && cost_model.sigma > 0.0,
        InvalidParameterSnafu {
            name: "sigma",
            reason: format!("{} is not a positive number", cost_model.sigma),
        }
    );
    Ok(())
}

// Nearest integer, ties to even, then clamped into [low, high].
fn round_and_clamp(value: f64, low: u64, high: u64) -> u64 {
    let rounded = value.round_ties_even() as i128;
    rounded.clamp(low as i128, high as i128) as u64
}

fn synthesize_costs<R: Rng + ?Sized>(
    budget: u64,
    prop_prob: f64,
    num_projects: usize,
    tally: &VoteTally,
    num_votes: usize,
    cost_model: &CostModel,
    rng: &mut R,
) -> Result<(Instance, Vec<CostDecision>), GeneratorError> {
    check_inputs(budget, num_projects, tally, num_votes, cost_model)?;

    let mut projects: Vec<Project> = Vec::with_capacity(num_projects);
    let mut decisions: Vec<CostDecision> = Vec::with_capacity(num_projects);
    for (idx, count) in tally.counts().iter().enumerate() {
        let name = project_name(idx);
        let prop_cost = proportional_cost(*count, num_votes as u64, budget);
        let higher_prob: f64 = rng.random();

        let (cost, decision) = if higher_prob > prop_prob {
            let mu = prop_cost as f64 + (budget - prop_cost) as f64 / 2.0;
            let normal = Normal::new(mu, cost_model.sigma).context(SamplingFailureSnafu {})?;
            let sample = normal.sample(rng);
            ensure!(sample.is_finite(), NonFiniteSampleSnafu { value: sample });
            (
                round_and_clamp(sample, prop_cost, budget),
                CostDecision::Inflated,
            )
        } else {
            (prop_cost, CostDecision::Proportional)
        };
        debug!(
            "synthesize_costs: {} votes: {} proportional: {} cost: {} ({:?})",
            name, count, prop_cost, cost, decision
        );
        projects.push(Project { name, cost });
        decisions.push(decision);
    }
    Ok((Instance::new(budget, projects), decisions))
}

/// Creates one instance for the given proportionality probability.
///
/// Each project starts from its proportional cost. With probability
/// `1 - prop_prob` its cost is instead drawn from a normal distribution centered
/// halfway between the proportional cost and the budget, rounded and clamped
/// into `[proportional cost, budget]`.
///
/// Arguments:
/// * `budget` the budget limit of the instance
/// * `prop_prob` the proportionality probability. Values outside of `[0, 1]`
///   are accepted: a negative value inflates every project.
/// * `num_projects` the number of projects
/// * `tally` the approvals of each project
/// * `num_votes` the number of voters
pub fn create_cost_instance<R: Rng + ?Sized>(
    budget: u64,
    prop_prob: f64,
    num_projects: usize,
    tally: &VoteTally,
    num_votes: usize,
    cost_model: &CostModel,
    rng: &mut R,
) -> Result<Instance, GeneratorError> {
    let (instance, _) = synthesize_costs(
        budget,
        prop_prob,
        num_projects,
        tally,
        num_votes,
        cost_model,
        rng,
    )?;
    Ok(instance)
}

/// Same as [`create_cost_instance`], also returning which projects were inflated.
pub fn create_cost_instance_traced<R: Rng + ?Sized>(
    budget: u64,
    prop_prob: f64,
    num_projects: usize,
    tally: &VoteTally,
    num_votes: usize,
    cost_model: &CostModel,
    rng: &mut R,
) -> Result<(Instance, Vec<CostDecision>), GeneratorError> {
    synthesize_costs(
        budget,
        prop_prob,
        num_projects,
        tally,
        num_votes,
        cost_model,
        rng,
    )
}

// **** Sweep ****

/// Rounds to 2 decimals, the same way the exact binary value is printed.
pub fn round_probability(prob: f64) -> f64 {
    format!("{:.2}", prob).parse::<f64>().unwrap_or(prob)
}

/// The sequence of probabilities of a sweep.
///
/// The running probability is decremented before it is used, so the first
/// value is `prop_prob_start - prop_prob_step`.
pub fn sweep_probabilities(settings: &SweepSettings) -> Result<Vec<f64>, GeneratorError> {
    ensure!(
        settings.prop_prob_step.is_finite() && settings.prop_prob_step > 0.0,
        InvalidParameterSnafu {
            name: "prop_prob_step",
            reason: format!("{} is not a positive number", settings.prop_prob_step),
        }
    );
    ensure!(
        settings.prop_prob_start.is_finite(),
        InvalidParameterSnafu {
            name: "prop_prob_start",
            reason: format!("{} is not finite", settings.prop_prob_start),
        }
    );
    let mut prop_prob = settings.prop_prob_start;
    let mut res: Vec<f64> = Vec::with_capacity(settings.num_instances);
    for _ in 0..settings.num_instances {
        prop_prob -= settings.prop_prob_step;
        if settings.bounds == SweepBounds::Clamp && prop_prob < 0.0 {
            prop_prob = 0.0;
        }
        res.push(prop_prob);
    }
    if let Some(last) = res.last() {
        if *last < 0.0 {
            warn!(
                "sweep_probabilities: the sweep goes below zero (last value {:.3}), all the projects of these instances are inflated",
                last
            );
        }
    }
    Ok(res)
}

/// Creates one instance per step of a descending sweep of proportionality
/// probabilities.
///
/// The same tally is used for every instance. The sweep fails as a whole if
/// any instance cannot be created.
pub fn create_list_cost_instances<R: Rng + ?Sized>(
    num_votes: usize,
    num_projects: usize,
    budget: u64,
    tally: &VoteTally,
    settings: &SweepSettings,
    cost_model: &CostModel,
    rng: &mut R,
) -> Result<SweepResult, GeneratorError> {
    check_inputs(budget, num_projects, tally, num_votes, cost_model)?;
    let prop_probs = sweep_probabilities(settings)?;
    info!(
        "create_list_cost_instances: {} instances, probabilities {:?}",
        prop_probs.len(),
        prop_probs
    );

    let mut instances: Vec<Instance> = Vec::with_capacity(prop_probs.len());
    for prop_prob in prop_probs.iter() {
        instances.push(create_cost_instance(
            budget,
            *prop_prob,
            num_projects,
            tally,
            num_votes,
            cost_model,
            rng,
        )?);
    }
    let prop_prob_labels = prop_probs.iter().map(|p| round_probability(*p)).collect();
    Ok(SweepResult {
        instances,
        prop_probs,
        prop_prob_labels,
    })
}
