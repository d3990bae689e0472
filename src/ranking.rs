use crate::notices::ScoreRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingEntry {
    pub user: String,
    pub score: u64,
}

/// Best scores of one game, highest first. Lives for a single game view;
/// the rollup ledger is the system of record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    entries: Vec<RankingEntry>,
}

impl Ranking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping the list sorted descending by score. Equal scores go
    /// after the entries already present, so earlier submissions keep the
    /// better placement.
    pub fn insert(&mut self, entry: RankingEntry) {
        let at = self
            .entries
            .iter()
            .position(|existing| existing.score < entry.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(at, entry);
    }

    /// Rebuild a game's ranking by folding the full score history in
    /// emission order. Unfinished runs and other games' records are dropped.
    pub fn from_history<I>(records: I, game_id: &str) -> Self
    where
        I: IntoIterator<Item = ScoreRecord>,
    {
        let mut ranking = Ranking::new();
        for record in records {
            if record.finished && record.game_id == game_id {
                ranking.insert(RankingEntry {
                    user: record.player,
                    score: record.score,
                });
            }
        }
        ranking
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn leader(&self) -> Option<&RankingEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pad `score` with leading zeroes to the decimal width of the leader's
/// score, so runner-up rows line up under the leader on a fixed-width
/// board. A score wider than the leader's comes back unpadded.
pub fn format_score(leader_score: u64, score: u64) -> String {
    let leader = leader_score.to_string();
    let score = score.to_string();
    let padding = leader.len().saturating_sub(score.len());
    format!("{}{}", "0".repeat(padding), score)
}
