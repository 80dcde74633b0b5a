pub use crate::config::*;

use snafu::prelude::*;

/// A builder for the profile of an instance.
///
/// The ballots refer to projects by index; the profile refers to them by name.
/// All the instances of a sweep share the same project names, so a profile
/// built against one of them is valid for the whole sweep.
///
/// ```
/// use pb_instances::builder::ProfileBuilder;
/// use pb_instances::{create_cost_instance, ApprovalBallot, CostModel, VoteTally};
/// # use pb_instances::GeneratorError;
///
/// let tally = VoteTally::from_counts(vec![1, 1]);
/// let mut rng = rand::rng();
/// let instance = create_cost_instance(100, 1.0, 2, &tally, 2, &CostModel::DEFAULT, &mut rng)?;
///
/// let mut builder = ProfileBuilder::new(&instance);
/// builder.add_ballot(&ApprovalBallot::from([0]))?;
/// builder.add_ballot(&ApprovalBallot::from([1]))?;
/// let profile = builder.build();
/// assert_eq!(profile.num_ballots(), 2);
///
/// # Ok::<(), GeneratorError>(())
/// ```
pub struct ProfileBuilder<'a> {
    pub(crate) _instance: &'a Instance,
    pub(crate) _ballots: Vec<std::collections::BTreeSet<String>>,
}

impl<'a> ProfileBuilder<'a> {
    pub fn new(instance: &'a Instance) -> ProfileBuilder<'a> {
        ProfileBuilder {
            _instance: instance,
            _ballots: Vec::new(),
        }
    }

    /// Adds the ballot of one voter.
    ///
    /// Every approved index must correspond to a project of the instance.
    pub fn add_ballot(&mut self, ballot: &ApprovalBallot) -> Result<(), GeneratorError> {
        let mut names = std::collections::BTreeSet::new();
        for idx in ballot.iter() {
            let name = project_name(*idx);
            ensure!(
                self._instance.get_project(&name).is_some(),
                InvalidParameterSnafu {
                    name: "ballots",
                    reason: format!("project {} is not part of the instance", name),
                }
            );
            names.insert(name);
        }
        self._ballots.push(names);
        Ok(())
    }

    pub fn build(self) -> Profile {
        Profile {
            ballots: self._ballots,
        }
    }
}

/// Creates the profile of the given ballots for an instance.
pub fn create_profile(
    ballots: &[ApprovalBallot],
    instance: &Instance,
) -> Result<Profile, GeneratorError> {
    let mut builder = ProfileBuilder::new(instance);
    for b in ballots {
        builder.add_ballot(b)?;
    }
    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::create_cost_instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn instance(num_projects: usize) -> Instance {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let tally = VoteTally::from_counts(vec![1; num_projects]);
        create_cost_instance(
            1000,
            1.0,
            num_projects,
            &tally,
            4,
            &CostModel::DEFAULT,
            &mut rng,
        )
        .unwrap()
    }

    #[test]
    fn names_follow_indices() {
        let inst = instance(3);
        let ballots = vec![
            ApprovalBallot::from([0, 2]),
            ApprovalBallot::new(),
            ApprovalBallot::from([1]),
        ];
        let profile = create_profile(&ballots, &inst).unwrap();
        assert_eq!(profile.num_ballots(), 3);
        assert!(profile.ballots[0].contains("p0"));
        assert!(profile.ballots[0].contains("p2"));
        assert!(profile.ballots[1].is_empty());
        assert_eq!(profile.ballots[2].len(), 1);
    }

    #[test]
    fn unknown_project_is_rejected() {
        let inst = instance(2);
        let ballots = vec![ApprovalBallot::from([0, 5])];
        assert!(create_profile(&ballots, &inst).is_err());
    }
}
