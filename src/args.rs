use clap::{Parser, Subcommand};

/// Design generation and scoring for Best-Worst Scaling studies.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Generates the tuples and the batches of a study from item files.
    Generate(GenerateArgs),
    /// Computes the score of every item from annotation files.
    Score(ScoreArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct GenerateArgs {
    /// (file path, optional) A JSON file describing the study. See the manual for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, repeatable) A text file with one item per line. The items of all the files
    /// are merged. Setting this option overrides the item sources of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Vec<String>,

    /// (default 4, or 5 above 1000 items) The number of items in each tuple.
    #[clap(long, value_parser)]
    pub tuple_size: Option<usize>,

    /// (default 2, or 1.5 for very large pools) The number of tuples per item.
    #[clap(long, value_parser)]
    pub factor: Option<f64>,

    /// (optional) The exact number of tuples to generate. Overrides --factor.
    #[clap(long, value_parser)]
    pub num_tuples: Option<usize>,

    /// (default 100) The number of randomized trials.
    #[clap(long, value_parser)]
    pub iterations: Option<u32>,

    /// (optional) The seed of the random generator, for reproducible designs.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (optional) Stops starting new trials after this number of milliseconds.
    #[clap(long, value_parser)]
    pub time_budget_ms: Option<u64>,

    /// Runs all the trials on a single thread.
    #[clap(long, takes_value = false)]
    pub sequential: bool,

    /// (default 20) The number of tuples in a batch.
    #[clap(long, value_parser)]
    pub batch_size: Option<usize>,

    /// (default 5) The smallest size allowed for the last batch.
    #[clap(long, value_parser)]
    pub minimum: Option<usize>,

    /// (file path, 'stdout' or empty, default stdout) The location where the summary of the design
    /// is written in JSON format. An empty value skips the summary.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a readable listing of the batches will be
    /// written to the given location.
    #[clap(long, value_parser)]
    pub report: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ScoreArgs {
    /// (file path, repeatable) A CSV file of annotations: best, worst, then the items of the tuple.
    #[clap(short, long, value_parser, required = true)]
    pub input: Vec<String>,

    /// (file path or 'stdout', default stdout) Where to write the scores.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file with the expected scores. If provided, bwsgen will
    /// check that the computed scores match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, every annotated tuple will be listed with
    /// its best and worst choices at the given location.
    #[clap(long, value_parser)]
    pub report: Option<String>,
}
