use crate::experiment::*;

use pb_instances::sampler::DisjointResampling;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplerSettings {
    pub phi: Option<f64>,
    #[serde(rename = "relSizeCentralVote")]
    pub rel_size_central_vote: Option<f64>,
    #[serde(rename = "numCentralVotes")]
    pub num_central_votes: Option<usize>,
}

/// The experiment description, as written in the JSON file.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(rename = "numElections")]
    pub num_elections: Option<usize>,
    #[serde(rename = "numVotes")]
    pub num_votes: Option<usize>,
    #[serde(rename = "numProjects")]
    pub num_projects: Option<usize>,
    pub budget: Option<u64>,
    #[serde(rename = "numInstances")]
    pub num_instances: Option<usize>,
    #[serde(rename = "propProbStart")]
    pub prop_prob_start: Option<f64>,
    #[serde(rename = "propProbStep")]
    pub prop_prob_step: Option<f64>,
    pub sigma: Option<f64>,
    #[serde(rename = "sweepBounds")]
    pub sweep_bounds: Option<String>,
    pub sampler: Option<SamplerSettings>,
    pub seed: Option<u64>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

/// Options from the command line that take precedence over the file.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Overrides {
    pub seed: Option<u64>,
    pub num_elections: Option<usize>,
    pub num_instances: Option<usize>,
    pub output_directory: Option<String>,
}

/// A checked experiment, ready to run.
#[derive(PartialEq, Debug, Clone)]
pub struct Experiment {
    pub num_elections: usize,
    pub num_votes: usize,
    pub num_projects: usize,
    pub budget: u64,
    pub sweep: SweepSettings,
    pub cost_model: CostModel,
    pub sampler: DisjointResampling,
    pub seed: Option<u64>,
    pub output_directory: PathBuf,
}

pub const DEFAULT_NUM_ELECTIONS: usize = 100;
pub const DEFAULT_NUM_VOTES: usize = 1000;
pub const DEFAULT_NUM_PROJECTS: usize = 20;
pub const DEFAULT_BUDGET: u64 = 500_000;
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "instances";

pub fn read_config(path: &str) -> ExpResult<ExperimentConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: ExperimentConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> ExpResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

fn read_bounds(x: &Option<String>) -> ExpResult<SweepBounds> {
    match x.as_deref() {
        None | Some("extrapolate") => Ok(SweepBounds::Extrapolate),
        Some("clamp") => Ok(SweepBounds::Clamp),
        Some(s) => whatever!("unknown sweepBounds option: {}", s),
    }
}

/// Fills in the defaults and checks the experiment.
///
/// `root` is the directory against which a relative output directory is resolved.
pub fn validate_config(
    config: &ExperimentConfig,
    overrides: &Overrides,
    root: &Path,
) -> ExpResult<Experiment> {
    let sampler_settings = config.sampler.clone().unwrap_or_default();
    let sampler = DisjointResampling {
        phi: sampler_settings
            .phi
            .unwrap_or(DisjointResampling::DEFAULT.phi),
        rel_size_central_vote: sampler_settings
            .rel_size_central_vote
            .unwrap_or(DisjointResampling::DEFAULT.rel_size_central_vote),
        num_central_votes: sampler_settings
            .num_central_votes
            .unwrap_or(DisjointResampling::DEFAULT.num_central_votes),
    };

    let output_directory = overrides
        .output_directory
        .clone()
        .or_else(|| config.output_directory.clone())
        .unwrap_or_else(|| DEFAULT_OUTPUT_DIRECTORY.to_string());

    let res = Experiment {
        num_elections: overrides
            .num_elections
            .or(config.num_elections)
            .unwrap_or(DEFAULT_NUM_ELECTIONS),
        num_votes: config.num_votes.unwrap_or(DEFAULT_NUM_VOTES),
        num_projects: config.num_projects.unwrap_or(DEFAULT_NUM_PROJECTS),
        budget: config.budget.unwrap_or(DEFAULT_BUDGET),
        sweep: SweepSettings {
            num_instances: overrides
                .num_instances
                .or(config.num_instances)
                .unwrap_or(SweepSettings::DEFAULT_SETTINGS.num_instances),
            prop_prob_start: config
                .prop_prob_start
                .unwrap_or(SweepSettings::DEFAULT_SETTINGS.prop_prob_start),
            prop_prob_step: config
                .prop_prob_step
                .unwrap_or(SweepSettings::DEFAULT_SETTINGS.prop_prob_step),
            bounds: read_bounds(&config.sweep_bounds)?,
        },
        cost_model: CostModel {
            sigma: config.sigma.unwrap_or(DEFAULT_SIGMA),
        },
        sampler,
        seed: overrides.seed.or(config.seed),
        output_directory: root.join(output_directory),
    };

    ensure_whatever!(res.num_elections > 0, "numElections must be positive");
    ensure_whatever!(res.num_votes > 0, "numVotes must be positive");
    ensure_whatever!(res.num_projects > 0, "numProjects must be positive");
    ensure_whatever!(res.budget > 0, "budget must be positive");
    ensure_whatever!(res.sweep.num_instances > 0, "numInstances must be positive");
    ensure_whatever!(
        res.sweep.prop_prob_step.is_finite() && res.sweep.prop_prob_step > 0.0,
        "propProbStep must be a positive number, got {}",
        res.sweep.prop_prob_step
    );
    ensure_whatever!(
        res.cost_model.sigma.is_finite() && res.cost_model.sigma > 0.0,
        "sigma must be a positive number, got {}",
        res.cost_model.sigma
    );
    res.sampler
        .validate(res.num_projects)
        .context(GenerationSnafu {})?;

    let lowest = res.sweep.prop_prob_start
        - res.sweep.prop_prob_step * res.sweep.num_instances as f64;
    if lowest < 0.0 && res.sweep.bounds == SweepBounds::Extrapolate {
        warn!(
            "validate_config: the sweep reaches {:.3}, the last instances will have all their projects inflated",
            lowest
        );
    }
    Ok(res)
}
