use clap::Parser;

/// Generates participatory budgeting instances with controllable proportionality.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON description of the experiment. All the settings
    /// have defaults. See the manual of the pb_instances crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A summary from a previous run. If provided, pbsweep will check that
    /// the summary of this run matches it. This only makes sense with a fixed seed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the summary of the experiment in
    /// JSON format. By default it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (directory) Where to write the instances. Overrides the outputDirectory setting.
    #[clap(long, value_parser)]
    pub output_directory: Option<String>,

    /// (integer) Seed of the random generator. Overrides the seed setting.
    #[clap(short, long, value_parser)]
    pub seed: Option<u64>,

    /// (integer) Number of elections to generate. Overrides the numElections setting.
    #[clap(long, value_parser)]
    pub num_elections: Option<usize>,

    /// (integer) Number of instances per sweep. Overrides the numInstances setting.
    #[clap(long, value_parser)]
    pub num_instances: Option<usize>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
