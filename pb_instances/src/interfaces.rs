//! Seams towards the collaborators that are not part of this crate: the
//! allocation rules (greedy utilitarian welfare, method of equal shares) and
//! the storage of instances.

use std::collections::BTreeSet;

use snafu::prelude::*;

use crate::config::*;

/// A participatory budgeting rule: selects a set of projects for an instance.
pub trait AllocationRule {
    type Error: std::error::Error + 'static;

    fn name(&self) -> &str;

    /// The names of the selected projects.
    fn select(&self, instance: &Instance, profile: &Profile)
        -> Result<BTreeSet<String>, Self::Error>;
}

/// Persists an instance together with its profile.
pub trait InstanceStore {
    type Error: std::error::Error + 'static;

    fn save(&mut self, key: &str, instance: &Instance, profile: &Profile)
        -> Result<(), Self::Error>;

    fn load(&self, key: &str) -> Result<(Instance, Profile), Self::Error>;
}

#[derive(Debug, Snafu)]
pub enum RuleError<E: std::error::Error + 'static> {
    #[snafu(display("Rule {rule} failed"))]
    RuleFailed { rule: String, source: E },

    #[snafu(display("Rule {rule} selected {project}, which is not part of the instance"))]
    UnknownProject { rule: String, project: String },
}

/// Runs a rule and returns its selection indicator, in project order.
pub fn evaluate_rule<A: AllocationRule>(
    rule: &A,
    instance: &Instance,
    profile: &Profile,
) -> Result<Vec<f64>, RuleError<A::Error>> {
    let selected = rule
        .select(instance, profile)
        .context(RuleFailedSnafu { rule: rule.name() })?;
    if let Some(unknown) = selected
        .iter()
        .find(|name| instance.get_project(name).is_none())
    {
        return UnknownProjectSnafu {
            rule: rule.name(),
            project: unknown.clone(),
        }
        .fail();
    }
    Ok(crate::metrics::selection_indicator(instance, &selected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::create_profile;
    use crate::create_cost_instance;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use std::collections::BTreeMap;

    /// Selects the cheapest projects first until the budget runs out.
    struct CheapestFirst;

    impl AllocationRule for CheapestFirst {
        type Error = std::convert::Infallible;

        fn name(&self) -> &str {
            "cheapest_first"
        }

        fn select(
            &self,
            instance: &Instance,
            _profile: &Profile,
        ) -> Result<BTreeSet<String>, Self::Error> {
            let mut projects: Vec<&Project> = instance.projects().iter().collect();
            projects.sort_by_key(|p| p.cost);
            let mut remaining = instance.budget_limit();
            let mut res = BTreeSet::new();
            for p in projects {
                if p.cost <= remaining {
                    remaining -= p.cost;
                    res.insert(p.name.clone());
                }
            }
            Ok(res)
        }
    }

    struct Bogus;

    impl AllocationRule for Bogus {
        type Error = std::convert::Infallible;

        fn name(&self) -> &str {
            "bogus"
        }

        fn select(&self, _: &Instance, _: &Profile) -> Result<BTreeSet<String>, Self::Error> {
            Ok(BTreeSet::from(["p42".to_string()]))
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        entries: BTreeMap<String, (Instance, Profile)>,
    }

    #[derive(Debug, Snafu)]
    enum StoreError {
        #[snafu(display("missing {key}"))]
        Missing { key: String },
    }

    impl InstanceStore for MemoryStore {
        type Error = StoreError;

        fn save(&mut self, key: &str, instance: &Instance, profile: &Profile) -> Result<(), StoreError> {
            self.entries
                .insert(key.to_string(), (instance.clone(), profile.clone()));
            Ok(())
        }

        fn load(&self, key: &str) -> Result<(Instance, Profile), StoreError> {
            self.entries.get(key).cloned().context(MissingSnafu { key })
        }
    }

    fn setup() -> (Instance, Profile) {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let tally = VoteTally::from_counts(vec![50, 25, 15, 10]);
        let instance =
            create_cost_instance(1000, 1.0, 4, &tally, 100, &CostModel::DEFAULT, &mut rng)
                .unwrap();
        let ballots = vec![ApprovalBallot::from([0, 1]), ApprovalBallot::from([3])];
        let profile = create_profile(&ballots, &instance).unwrap();
        (instance, profile)
    }

    #[test]
    fn rule_outcome_as_indicator() {
        let (instance, profile) = setup();
        // Costs 500, 250, 150, 100 add up to the budget exactly.
        let indicator = evaluate_rule(&CheapestFirst, &instance, &profile).unwrap();
        assert_eq!(indicator, vec![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let (instance, profile) = setup();
        let res = evaluate_rule(&Bogus, &instance, &profile);
        assert!(matches!(res, Err(RuleError::UnknownProject { .. })));
    }

    #[test]
    fn store_round_trip() {
        let (instance, profile) = setup();
        let mut store = MemoryStore::default();
        store.save("instance_0_0", &instance, &profile).unwrap();
        let (i2, p2) = store.load("instance_0_0").unwrap();
        assert_eq!(i2, instance);
        assert_eq!(p2, profile);
        assert!(store.load("instance_0_1").is_err());
    }
}
