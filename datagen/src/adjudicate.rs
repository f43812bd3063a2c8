use crate::format::Outcome;

/// Thresholds for early game termination. Scores fed to the tracker are
/// White-relative centipawns.
#[derive(Clone, Debug)]
pub struct AdjudicationConfig {
    /// Score magnitude counting toward a decisive result.
    pub win_score: i32,
    /// Score magnitude counting toward a draw.
    pub draw_score: i32,
    /// Earliest ply at which draw adjudication may begin.
    pub draw_min_ply: usize,
    /// Consecutive plies required to confirm a decisive result.
    pub win_plies: u32,
    /// Consecutive plies required to confirm a draw.
    pub draw_plies: u32,
}

impl Default for AdjudicationConfig {
    fn default() -> Self {
        // The win threshold sits above the static-eval clamp, so only
        // mate-range scores from a search backend would ever trip it.
        Self {
            win_score: 50000,
            draw_score: 10,
            draw_min_ply: 70,
            win_plies: 5,
            draw_plies: 10,
        }
    }
}

/// Per-game adjudication state machine: three consecutive-ply streaks,
/// at most one of which is ever non-zero.
pub struct OutcomeTracker {
    config: AdjudicationConfig,
    win_streak: u32,
    loss_streak: u32,
    draw_streak: u32,
}

impl OutcomeTracker {
    pub fn new(config: AdjudicationConfig) -> Self {
        Self {
            config,
            win_streak: 0,
            loss_streak: 0,
            draw_streak: 0,
        }
    }

    /// Feeds one ply's White-relative score; returns the adjudicated
    /// outcome once a streak reaches its configured length.
    pub fn update(&mut self, white_score: i32, ply: usize) -> Option<Outcome> {
        if white_score >= self.config.win_score {
            self.win_streak += 1;
            self.loss_streak = 0;
            self.draw_streak = 0;
            if self.win_streak >= self.config.win_plies {
                return Some(Outcome::WhiteWin);
            }
        } else if white_score <= -self.config.win_score {
            self.loss_streak += 1;
            self.win_streak = 0;
            self.draw_streak = 0;
            if self.loss_streak >= self.config.win_plies {
                return Some(Outcome::WhiteLoss);
            }
        } else if white_score.abs() <= self.config.draw_score && ply >= self.config.draw_min_ply {
            self.draw_streak += 1;
            self.win_streak = 0;
            self.loss_streak = 0;
            if self.draw_streak >= self.config.draw_plies {
                return Some(Outcome::Draw);
            }
        } else {
            self.win_streak = 0;
            self.loss_streak = 0;
            self.draw_streak = 0;
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AdjudicationConfig {
        AdjudicationConfig {
            win_score: 1000,
            draw_score: 10,
            draw_min_ply: 70,
            win_plies: 5,
            draw_plies: 10,
        }
    }

    #[test]
    fn win_fires_at_streak_length_not_before() {
        let mut tracker = OutcomeTracker::new(config());
        for ply in 0..4 {
            assert_eq!(tracker.update(1500, ply), None);
        }
        assert_eq!(tracker.update(1500, 4), Some(Outcome::WhiteWin));
    }

    #[test]
    fn loss_is_symmetric() {
        let mut tracker = OutcomeTracker::new(config());
        for ply in 0..4 {
            assert_eq!(tracker.update(-1500, ply), None);
        }
        assert_eq!(tracker.update(-1500, 4), Some(Outcome::WhiteLoss));
    }

    #[test]
    fn draw_waits_for_minimum_ply() {
        let mut tracker = OutcomeTracker::new(config());
        // Dead-even scores before the minimum ply must not build a streak.
        for ply in 0..69 {
            assert_eq!(tracker.update(0, ply), None);
        }
        for ply in 70..79 {
            assert_eq!(tracker.update(0, ply), None);
        }
        assert_eq!(tracker.update(0, 79), Some(Outcome::Draw));
    }

    #[test]
    fn out_of_band_score_resets_all_streaks() {
        let mut tracker = OutcomeTracker::new(config());
        for ply in 0..4 {
            assert_eq!(tracker.update(1500, ply), None);
        }
        // Mid-range score wipes the win streak.
        assert_eq!(tracker.update(300, 4), None);
        for ply in 5..9 {
            assert_eq!(tracker.update(1500, ply), None);
        }
        assert_eq!(tracker.update(1500, 9), Some(Outcome::WhiteWin));
    }

    #[test]
    fn opposite_decisive_scores_reset_each_other() {
        let mut tracker = OutcomeTracker::new(config());
        for ply in 0..4 {
            assert_eq!(tracker.update(1500, ply), None);
        }
        assert_eq!(tracker.update(-1500, 4), None);
        // Loss streak is now 1; four more complete it.
        for ply in 5..8 {
            assert_eq!(tracker.update(-1500, ply), None);
        }
        assert_eq!(tracker.update(-1500, 8), Some(Outcome::WhiteLoss));
    }
}
