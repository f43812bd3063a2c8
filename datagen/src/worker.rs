use std::error::Error;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use nnue::Network;

use crate::adjudicate::AdjudicationConfig;
use crate::format::RECORD_SIZE;
use crate::game::simulate;
use crate::progress::Progress;

/// Publish progress every this many games per worker.
const GAMES_PER_REPORT: u64 = 10;

/// Aggregate totals reported at shutdown.
pub struct Summary {
    pub games: u64,
    pub positions: u64,
    pub throughput: f64,
}

/// Runs N self-contained workers, each owning its random generator and
/// output file. The only shared mutable state is the progress counters.
pub struct Generator {
    threads: usize,
    games_per_thread: u64,
    base_seed: u64,
    adjudication: AdjudicationConfig,
}

impl Generator {
    /// `games_per_thread == 0` means generate until the stop flag is set.
    pub fn new(threads: usize, games_per_thread: u64, base_seed: u64) -> Self {
        Self {
            threads,
            games_per_thread,
            base_seed,
            adjudication: AdjudicationConfig::default(),
        }
    }

    pub fn run(
        &self,
        network: Arc<Network>,
        output_dir: &Path,
        stop_flag: Arc<AtomicBool>,
    ) -> Result<Summary, Box<dyn Error>> {
        log::info!("generating games with {} threads", self.threads);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()?;

        let progress = Progress::new();

        pool.install(|| {
            (0..self.threads).into_par_iter().for_each(|tid| {
                let mut worker = Worker::new(
                    tid,
                    output_dir.join(format!("{}.bin", tid)),
                    self.games_per_thread,
                    self.base_seed,
                    &self.adjudication,
                    &network,
                    &progress,
                    &stop_flag,
                );
                worker.run();
            });
        });

        progress.finish();

        Ok(Summary {
            games: progress.games(),
            positions: progress.positions(),
            throughput: progress.throughput(),
        })
    }
}

struct Worker<'a> {
    tid: usize,
    path: PathBuf,
    games_target: u64,
    base_seed: u64,
    adjudication: &'a AdjudicationConfig,
    network: &'a Network,
    progress: &'a Progress,
    stop_flag: &'a AtomicBool,

    games: u64,
    positions: u64,
}

impl<'a> Worker<'a> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        tid: usize,
        path: PathBuf,
        games_target: u64,
        base_seed: u64,
        adjudication: &'a AdjudicationConfig,
        network: &'a Network,
        progress: &'a Progress,
        stop_flag: &'a AtomicBool,
    ) -> Self {
        Self {
            tid,
            path,
            games_target,
            base_seed,
            adjudication,
            network,
            progress,
            stop_flag,
            games: 0,
            positions: 0,
        }
    }

    fn run(&mut self) {
        // A failed open aborts this worker only; siblings keep going.
        let file = match self.open_output() {
            Ok(file) => file,
            Err(err) => {
                log::error!(
                    "worker {}: failed to open {}: {}",
                    self.tid,
                    self.path.display(),
                    err
                );
                return;
            }
        };
        let mut writer = BufWriter::new(file);

        log::info!("worker {} started, writing to {}", self.tid, self.path.display());

        while !self.stop_flag.load(Ordering::Relaxed)
            && (self.games_target == 0 || self.games < self.games_target)
        {
            let seed = game_seed(self.base_seed, self.tid, self.games);
            let mut rng = SmallRng::seed_from_u64(seed);

            let game = simulate(self.network, self.adjudication, &mut rng);

            if let Err(err) = write_game_block(&mut writer, &game.records) {
                log::error!("worker {}: write failed: {}", self.tid, err);
                break;
            }

            self.games += 1;
            self.positions += game.records.len() as u64;
            self.progress.record_game(game.records.len() as u64);

            if self.games % GAMES_PER_REPORT == 0 {
                self.progress.publish();
            }
        }

        if let Err(err) = writer.flush() {
            log::error!("worker {}: final flush failed: {}", self.tid, err);
        }

        log::info!(
            "worker {} finished: {} positions from {} games",
            self.tid,
            self.positions,
            self.games
        );
    }

    fn open_output(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
    }
}

/// Serializes a finished game's records as one contiguous block and
/// flushes it, so an interrupt between games never truncates a game.
fn write_game_block(
    writer: &mut BufWriter<File>,
    records: &[crate::format::PackedBoard],
) -> std::io::Result<()> {
    if records.is_empty() {
        return Ok(());
    }

    let mut block = Vec::with_capacity(records.len() * RECORD_SIZE);
    for record in records {
        block.extend_from_slice(&record.to_bytes());
    }
    writer.write_all(&block)?;
    writer.flush()
}

/// Splitmix-style seed derivation keeps workers and games decorrelated.
fn game_seed(base: u64, tid: usize, game_index: u64) -> u64 {
    let mut seed = base
        ^ (tid as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ game_index.wrapping_mul(0xD1B5_4A32_D192_ED03);
    seed ^= seed >> 30;
    seed = seed.wrapping_mul(0xBF58_476D_1CE4_E5B9);
    seed ^= seed >> 27;
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Outcome, PackedBoard, RECORD_SIZE};
    use nnue::network::EXPECTED_BYTES;

    #[test]
    fn seeds_differ_across_workers_and_games() {
        let a = game_seed(42, 0, 0);
        let b = game_seed(42, 1, 0);
        let c = game_seed(42, 0, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn single_worker_single_game_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let network = Arc::new(Network::from_bytes(&vec![0u8; EXPECTED_BYTES]).unwrap());
        let stop_flag = Arc::new(AtomicBool::new(false));

        let generator = Generator::new(1, 1, 12345);
        let summary = generator
            .run(Arc::clone(&network), dir.path(), stop_flag)
            .unwrap();
        assert_eq!(summary.games, 1);

        let bytes = std::fs::read(dir.path().join("0.bin")).unwrap();
        assert_eq!(bytes.len() % RECORD_SIZE, 0);
        assert_eq!(bytes.len() / RECORD_SIZE, summary.positions as usize);

        let mut outcomes = Vec::new();
        for chunk in bytes.chunks_exact(RECORD_SIZE) {
            let record = PackedBoard::from_bytes(chunk.try_into().unwrap());
            assert!(Outcome::from_u8(record.to_bytes()[30]).is_some());
            outcomes.push(record.outcome());
        }
        // All records of one game carry the same outcome.
        outcomes.dedup();
        assert!(outcomes.len() <= 1);
    }

    #[test]
    fn runs_are_reproducible_for_a_fixed_seed() {
        let network = Arc::new(Network::from_bytes(&vec![0u8; EXPECTED_BYTES]).unwrap());

        let mut outputs = Vec::new();
        for _ in 0..2 {
            let dir = tempfile::tempdir().unwrap();
            let generator = Generator::new(1, 3, 777);
            generator
                .run(
                    Arc::clone(&network),
                    dir.path(),
                    Arc::new(AtomicBool::new(false)),
                )
                .unwrap();
            outputs.push(std::fs::read(dir.path().join("0.bin")).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }
}
