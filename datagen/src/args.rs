use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "datagen")]
#[command(about = "Self-play training data generator for the NNUE evaluator")]
pub struct Args {
    /// Path to the quantized network file
    pub nnue: PathBuf,

    /// Directory for the per-worker .bin output files
    pub output: PathBuf,

    /// Number of worker threads (0 = all cores)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Games per thread (0 = generate until interrupted)
    #[arg(long, default_value_t = 0)]
    pub games: u64,

    /// Base RNG seed (random when omitted)
    #[arg(long)]
    pub seed: Option<u64>,
}
