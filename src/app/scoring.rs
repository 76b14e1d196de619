//! Per-player score counters.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub const ALL: [Self; 2] = [Self::One, Self::Two];
}

/// Snapshot of both counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scores {
    pub player_one: u32,
    pub player_two: u32,
}

impl Scores {
    pub fn is_zero(&self) -> bool {
        self.player_one == 0 && self.player_two == 0
    }
}

/// Mutable scoreboard.  Only the console service holds one, behind its lock.
#[derive(Debug, Default)]
pub struct ScoreBoard {
    scores: Scores,
}

impl ScoreBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one point for `player` and return the new totals.
    pub fn apply(&mut self, player: Player) -> Scores {
        let slot = match player {
            Player::One => &mut self.scores.player_one,
            Player::Two => &mut self.scores.player_two,
        };
        *slot = slot.saturating_add(1);
        self.scores
    }

    pub fn reset(&mut self) {
        self.scores = Scores::default();
    }

    pub fn scores(&self) -> Scores {
        self.scores
    }
}
