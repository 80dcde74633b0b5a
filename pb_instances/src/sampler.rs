//! Approval ballot samplers.
//!
//! The generator only depends on the [`BallotSampler`] trait. The default
//! implementation is the disjoint resampling model: voters are attached to one
//! of several disjoint "central" ballots and each of their approvals is either
//! copied from it or resampled independently.

use log::debug;
use rand::Rng;
use snafu::prelude::*;

use crate::config::*;

/// Produces one approval ballot per voter over the projects `0..num_projects`.
pub trait BallotSampler {
    fn sample<R: Rng + ?Sized>(
        &self,
        num_votes: usize,
        num_projects: usize,
        rng: &mut R,
    ) -> Result<Vec<ApprovalBallot>, GeneratorError>;
}

/// Disjoint resampling model.
///
/// * `phi` the probability of resampling an approval instead of copying the
///   central ballot
/// * `rel_size_central_vote` the size of each central ballot, as a fraction of
///   the projects. This is also the approval probability when resampling.
/// * `num_central_votes` the number of disjoint central ballots
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct DisjointResampling {
    pub phi: f64,
    pub rel_size_central_vote: f64,
    pub num_central_votes: usize,
}

impl DisjointResampling {
    pub const DEFAULT: DisjointResampling = DisjointResampling {
        phi: 0.75,
        rel_size_central_vote: 0.125,
        num_central_votes: 2,
    };

    pub fn validate(&self, num_projects: usize) -> Result<(), GeneratorError> {
        ensure!(
            (0.0..=1.0).contains(&self.phi),
            InvalidParameterSnafu {
                name: "phi",
                reason: format!("{} is not a probability", self.phi),
            }
        );
        ensure!(
            (0.0..=1.0).contains(&self.rel_size_central_vote),
            InvalidParameterSnafu {
                name: "rel_size_central_vote",
                reason: format!("{} is not in [0, 1]", self.rel_size_central_vote),
            }
        );
        ensure!(
            self.num_central_votes > 0,
            InvalidParameterSnafu {
                name: "num_central_votes",
                reason: "must be positive",
            }
        );
        let size = self.central_vote_size(num_projects);
        ensure!(
            size * self.num_central_votes <= num_projects,
            InvalidParameterSnafu {
                name: "num_central_votes",
                reason: format!(
                    "{} disjoint central ballots of {} projects do not fit in {} projects",
                    self.num_central_votes, size, num_projects
                ),
            }
        );
        Ok(())
    }

    fn central_vote_size(&self, num_projects: usize) -> usize {
        (self.rel_size_central_vote * num_projects as f64).floor() as usize
    }
}

impl Default for DisjointResampling {
    fn default() -> Self {
        DisjointResampling::DEFAULT
    }
}

impl BallotSampler for DisjointResampling {
    fn sample<R: Rng + ?Sized>(
        &self,
        num_votes: usize,
        num_projects: usize,
        rng: &mut R,
    ) -> Result<Vec<ApprovalBallot>, GeneratorError> {
        self.validate(num_projects)?;
        let size = self.central_vote_size(num_projects);
        // Central ballot g covers the projects g*size .. (g+1)*size.
        let central_votes: Vec<std::ops::Range<usize>> = (0..self.num_central_votes)
            .map(|g| g * size..(g + 1) * size)
            .collect();
        debug!(
            "DisjointResampling: {} voters, central ballots {:?}",
            num_votes, central_votes
        );

        let mut ballots: Vec<ApprovalBallot> = Vec::with_capacity(num_votes);
        for _ in 0..num_votes {
            let central = &central_votes[rng.random_range(0..central_votes.len())];
            let mut ballot = ApprovalBallot::new();
            for project in 0..num_projects {
                let approved = if rng.random::<f64>() < self.phi {
                    rng.random::<f64>() < self.rel_size_central_vote
                } else {
                    central.contains(&project)
                };
                if approved {
                    ballot.insert(project);
                }
            }
            ballots.push(ballot);
        }
        Ok(ballots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn no_resampling_copies_central_votes() {
        let sampler = DisjointResampling {
            phi: 0.0,
            rel_size_central_vote: 0.25,
            num_central_votes: 2,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let ballots = sampler.sample(50, 8, &mut rng).unwrap();
        assert_eq!(ballots.len(), 50);
        let first: ApprovalBallot = [0, 1].into_iter().collect();
        let second: ApprovalBallot = [2, 3].into_iter().collect();
        for b in ballots.iter() {
            assert!(*b == first || *b == second, "unexpected ballot {:?}", b);
        }
    }

    #[test]
    fn full_resampling_stays_in_range() {
        let sampler = DisjointResampling {
            phi: 1.0,
            rel_size_central_vote: 0.5,
            num_central_votes: 1,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let ballots = sampler.sample(200, 6, &mut rng).unwrap();
        assert_eq!(ballots.len(), 200);
        assert!(ballots.iter().flatten().all(|p| *p < 6));
        // Roughly half of the 1200 possible approvals.
        let approvals: usize = ballots.iter().map(|b| b.len()).sum();
        assert!(approvals > 400 && approvals < 800, "{}", approvals);
    }

    #[test]
    fn central_votes_must_fit() {
        let sampler = DisjointResampling {
            phi: 0.75,
            rel_size_central_vote: 0.5,
            num_central_votes: 3,
        };
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let res = sampler.sample(10, 4, &mut rng);
        assert!(matches!(
            res,
            Err(GeneratorError::InvalidParameter {
                name: "num_central_votes",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_probability() {
        let sampler = DisjointResampling {
            phi: 1.5,
            ..DisjointResampling::DEFAULT
        };
        assert!(sampler.validate(20).is_err());
        assert!(DisjointResampling::DEFAULT.validate(20).is_ok());
    }
}
