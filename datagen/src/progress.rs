use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Aggregate progress across all workers: two atomic counters plus a
/// spinner that renders them. Workers only ever increment and re-publish,
/// so concurrent updates commute.
pub struct Progress {
    games: AtomicU64,
    positions: AtomicU64,
    started: Instant,
    bar: ProgressBar,
}

impl Progress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template(" {spinner:.cyan} {elapsed_precise} | {msg}")
                .expect("static template"),
        );

        Self {
            games: AtomicU64::new(0),
            positions: AtomicU64::new(0),
            started: Instant::now(),
            bar,
        }
    }

    /// Records one completed game and its written position count.
    pub fn record_game(&self, positions: u64) {
        self.games.fetch_add(1, Ordering::Relaxed);
        self.positions.fetch_add(positions, Ordering::Relaxed);
    }

    /// Refreshes the spinner message from the current counters.
    pub fn publish(&self) {
        self.bar.set_message(format!(
            "{} games | {} positions | {:.0} positions/sec",
            self.games(),
            self.positions(),
            self.throughput()
        ));
        self.bar.tick();
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn games(&self) -> u64 {
        self.games.load(Ordering::Relaxed)
    }

    pub fn positions(&self) -> u64 {
        self.positions.load(Ordering::Relaxed)
    }

    pub fn throughput(&self) -> f64 {
        let elapsed = self.started.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.positions() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}
