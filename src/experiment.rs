use log::{debug, info, warn};

use pb_instances::builder::create_profile;
use pb_instances::interfaces::InstanceStore;
use pb_instances::metrics::InstanceSummary;
use pb_instances::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::experiment::config_reader::*;
use crate::experiment::io_json::{instance_key, JsonInstanceStore};

pub mod config_reader;
pub mod io_json;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExperimentError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error encoding JSON for {path}"))]
    EncodingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing file {path}"))]
    WritingJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error creating directory {path}"))]
    CreatingDir {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Instance generation failed"))]
    Generation { source: GeneratorError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ExpResult<T> = Result<T, ExperimentError>;

fn bounds_label(bounds: SweepBounds) -> &'static str {
    match bounds {
        SweepBounds::Extrapolate => "extrapolate",
        SweepBounds::Clamp => "clamp",
    }
}

fn experiment_to_json(exp: &Experiment) -> JSValue {
    json!({
        "numElections": exp.num_elections,
        "numVotes": exp.num_votes,
        "numProjects": exp.num_projects,
        "budget": exp.budget,
        "numInstances": exp.sweep.num_instances,
        "propProbStart": exp.sweep.prop_prob_start,
        "propProbStep": exp.sweep.prop_prob_step,
        "sweepBounds": bounds_label(exp.sweep.bounds),
        "sigma": exp.cost_model.sigma,
        "sampler": {
            "phi": exp.sampler.phi,
            "relSizeCentralVote": exp.sampler.rel_size_central_vote,
            "numCentralVotes": exp.sampler.num_central_votes,
        },
        "seed": exp.seed,
    })
}

fn instance_summary_to_json(key: &str, label: f64, s: &InstanceSummary) -> JSValue {
    json!({
        "instance": key,
        "propProb": label,
        "totalCost": s.total_cost,
        "numAboveProportional": s.num_above_proportional,
        "costs": s.costs,
        "budgetPerc": s.metrics.budget_perc,
        "votesPerc": s.metrics.votes_perc,
        "differences": s.metrics.differences,
    })
}

/// Samples the ballots of one election, creates its sweep of instances and
/// saves them.
pub fn run_election<R, S>(
    election: usize,
    exp: &Experiment,
    rng: &mut R,
    store: &mut S,
) -> ExpResult<JSValue>
where
    R: Rng + ?Sized,
    S: InstanceStore<Error = ExperimentError>,
{
    info!("Election {}: sampling {} ballots", election, exp.num_votes);
    let (ballots, tally) = create_ballots(&exp.sampler, exp.num_votes, exp.num_projects, rng)
        .context(GenerationSnafu {})?;

    let sweep = create_list_cost_instances(
        exp.num_votes,
        exp.num_projects,
        exp.budget,
        &tally,
        &exp.sweep,
        &exp.cost_model,
        rng,
    )
    .context(GenerationSnafu {})?;

    // All the instances share the project names, and therefore the profile.
    let first = sweep
        .instances
        .first()
        .whatever_context("the sweep did not produce any instance")?;
    let profile = create_profile(&ballots, first).context(GenerationSnafu {})?;

    let mut instances_js: Vec<JSValue> = Vec::new();
    for (variant, ((instance, prop_prob), label)) in sweep
        .instances
        .iter()
        .zip(sweep.prop_probs.iter())
        .zip(sweep.prop_prob_labels.iter())
        .enumerate()
    {
        let key = instance_key(election, variant);
        store.save(&key, instance, &profile)?;
        let summary = InstanceSummary::compute(instance, *prop_prob, &tally, exp.num_votes);
        debug!(
            "Election {} variant {} (p={}): {} projects above proportional cost",
            election, variant, label, summary.num_above_proportional
        );
        instances_js.push(instance_summary_to_json(&key, *label, &summary));
    }
    info!(
        "Election {}: saved {} instances",
        election,
        instances_js.len()
    );

    Ok(json!({
        "election": election,
        "tally": tally.counts(),
        "propProbs": sweep.prop_prob_labels,
        "instances": instances_js,
    }))
}

fn make_rng(seed: Option<u64>) -> ChaCha20Rng {
    match seed {
        Some(s) => ChaCha20Rng::seed_from_u64(s),
        None => ChaCha20Rng::from_os_rng(),
    }
}

/// Runs a full experiment and returns its summary.
///
/// Arguments:
/// * `config_path` the JSON description of the experiment. If not provided, the
///   defaults are used and relative paths are resolved against the current directory.
/// * `overrides` the options from the command line
/// * `out` where to write the summary: a file path, `stdout` or nothing
/// * `check_summary_path` a previous summary that this run must reproduce
pub fn run_experiment(
    config_path: Option<String>,
    overrides: &Overrides,
    out: Option<String>,
    check_summary_path: Option<String>,
) -> ExpResult<JSValue> {
    let (config, root) = match config_path {
        Some(p) => {
            let config = read_config(&p)?;
            let root = Path::new(&p)
                .parent()
                .map(|x| x.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (ExperimentConfig::default(), PathBuf::new()),
    };
    info!("config: {:?}", config);
    let exp = validate_config(&config, overrides, &root)?;
    info!("experiment: {:?}", exp);

    if check_summary_path.is_some() && exp.seed.is_none() {
        warn!("No seed was provided: the run cannot reproduce the reference summary");
    }

    let mut rng = make_rng(exp.seed);
    let mut store = JsonInstanceStore::create(&exp.output_directory)?;
    let mut elections: Vec<JSValue> = Vec::new();
    for election in 0..exp.num_elections {
        elections.push(run_election(election, &exp, &mut rng, &mut store)?);
    }

    let result_js = json!({
        "config": experiment_to_json(&exp),
        "elections": elections,
    });
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(EncodingJsonSnafu { path: "summary" })?;

    match out.as_deref() {
        None | Some("stdout") => {
            println!("{}", pretty_js_stats);
        }
        Some(path) => {
            info!("Writing summary to {}", path);
            fs::write(path, &pretty_js_stats).context(WritingJsonSnafu { path })?;
        }
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref = serde_json::to_string_pretty(&summary_ref)
            .context(EncodingJsonSnafu { path: summary_p })?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(result_js)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pbsweep_{}_{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_config(dir: &Path, seed: u64) -> String {
        let path = dir.join("experiment.json");
        let config = json!({
            "numElections": 2,
            "numVotes": 100,
            "numProjects": 8,
            "budget": 10000,
            "numInstances": 3,
            "sigma": 500.0,
            "seed": seed,
            "outputDirectory": "instances",
        });
        fs::write(&path, config.to_string()).unwrap();
        path.display().to_string()
    }

    #[test]
    fn full_run() {
        let dir = test_dir("full_run");
        let config_path = write_config(&dir, 5);
        let out = dir.join("summary.json").display().to_string();
        let res = run_experiment(
            Some(config_path),
            &Overrides::default(),
            Some(out.clone()),
            None,
        )
        .unwrap();

        let elections = res["elections"].as_array().unwrap();
        assert_eq!(elections.len(), 2);
        for e in elections {
            let instances = e["instances"].as_array().unwrap();
            assert_eq!(instances.len(), 3);
            let probs = e["propProbs"].as_array().unwrap();
            for (p, expected) in probs.iter().zip([0.975, 0.95, 0.925]) {
                assert!((p.as_f64().unwrap() - expected).abs() <= 0.0051);
            }
            for i in instances {
                let costs = i["costs"].as_array().unwrap();
                assert_eq!(costs.len(), 8);
                assert!(costs.iter().all(|c| c.as_u64().unwrap() <= 10000));
            }
        }
        assert!(dir.join("instances").join("instance_1_2.json").exists());
        assert!(Path::new(&out).exists());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn seeded_run_matches_reference() {
        let dir = test_dir("reference");
        let config_path = write_config(&dir, 11);
        let reference = dir.join("reference.json").display().to_string();
        run_experiment(
            Some(config_path.clone()),
            &Overrides::default(),
            Some(reference.clone()),
            None,
        )
        .unwrap();

        let again = dir.join("again.json").display().to_string();
        assert!(run_experiment(
            Some(config_path.clone()),
            &Overrides::default(),
            Some(again.clone()),
            Some(reference.clone()),
        )
        .is_ok());

        let other_seed = Overrides {
            seed: Some(12),
            ..Default::default()
        };
        assert!(run_experiment(Some(config_path), &other_seed, Some(again), Some(reference))
            .is_err());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_config_file() {
        let res = run_experiment(
            Some("/nonexistent/pbsweep/experiment.json".to_string()),
            &Overrides::default(),
            None,
            None,
        );
        assert!(matches!(res, Err(ExperimentError::OpeningJson { .. })));
    }
}
