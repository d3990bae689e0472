use crate::{
    notices::{
        DecodeError,
        ReplayVerification,
        ScoreRecord,
    },
    ranking::{
        Ranking,
        RankingEntry,
    },
    session::{
        notice_decoder::NoticeDecoder,
        rollup_query::{
            QueryError,
            RollupQuery,
        },
    },
};
use std::time::Duration;
use thiserror::Error;

pub mod graphql_client;
pub mod notice_decoder;
pub mod rollup_query;


/// Grace period between a missing notice and the fallback report lookup.
/// The node processes inputs asynchronously; a rejected gameplay log yields
/// its report shortly after the notice lookup comes up empty.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no notice found for input {0}")]
    NoticeNotFound(u64),
    #[error("invalid gameplay: {0}")]
    GameplayRejected(String),
    #[error("score does not match game: expected {expected}, got {actual}")]
    GameMismatch { expected: String, actual: String },
    #[error("no result found for input {0}")]
    ResultNotFound(u64),
    #[error("replay failed verification")]
    ReplayInvalid,
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Query(#[from] QueryError),
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to load the score history")]
    Query(#[source] QueryError),
}

/// One opened game view: owns the game's ranking and runs the submission
/// flows against the node. Dropped on navigation, along with the ranking,
/// so a late result can never land on a disposed view.
pub struct GameSession<Query, Decoder> {
    query: Query,
    decoder: Decoder,
    game_id: String,
    ranking: Ranking,
    grace_period: Duration,
}

impl<Query, Decoder> GameSession<Query, Decoder> {
    pub fn new(query: Query, decoder: Decoder, game_id: impl Into<String>) -> Self {
        Self {
            query,
            decoder,
            game_id: game_id.into(),
            ranking: Ranking::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Override the notice-to-report fallback delay. Mostly for tests and
    /// for nodes with unusual settlement latency.
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    /// Merge a confirmed score into the session's ranking.
    pub fn apply_score(&mut self, record: &ScoreRecord) {
        self.ranking.insert(RankingEntry {
            user: record.player.clone(),
            score: record.score,
        });
    }
}

impl<Query, Decoder> GameSession<Query, Decoder>
where
    Query: RollupQuery,
    Decoder: NoticeDecoder,
{
    /// Rebuild the ranking by replaying every notice the node has emitted.
    /// The notice stream is shared with other output kinds, so payloads
    /// that do not decode as score records are skipped.
    pub async fn load_ranking(&mut self) -> Result<&Ranking, BuildError> {
        let payloads = self.query.notices().await.map_err(BuildError::Query)?;

        let mut records = Vec::with_capacity(payloads.len());
        for payload in &payloads {
            match self.decode_score(payload) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(%err, "skipping undecodable notice payload");
                }
            }
        }

        self.ranking = Ranking::from_history(records, &self.game_id);
        tracing::info!(
            game_id = %self.game_id,
            entries = self.ranking.len(),
            "ranking rebuilt from notice history"
        );
        Ok(&self.ranking)
    }

    /// Wait for the score produced by processing input `input_index`.
    ///
    /// A missing notice gets a single retry on the report side after the
    /// grace period: by the node's convention a rejected gameplay log
    /// yields a report instead of a notice.
    pub async fn await_score_result(
        &self,
        input_index: u64,
    ) -> Result<ScoreRecord, SubmitError> {
        let payload = match self.query.notice(input_index).await {
            Ok(payload) => payload,
            Err(QueryError::NotFound) => {
                tokio::time::sleep(self.grace_period).await;
                return match self.query.report(input_index).await {
                    Ok(report) => {
                        Err(SubmitError::GameplayRejected(report_text(&report)))
                    }
                    Err(QueryError::NotFound) => {
                        Err(SubmitError::NoticeNotFound(input_index))
                    }
                    Err(err) => Err(err.into()),
                };
            }
            Err(err) => return Err(err.into()),
        };

        let record = self.decode_score(&payload)?;
        if record.game_id != self.game_id {
            return Err(SubmitError::GameMismatch {
                expected: self.game_id.clone(),
                actual: record.game_id,
            });
        }
        Ok(record)
    }

    /// Check the outcome of a full-emulator gameplay log at `input_index`.
    /// Validation only: a confirmed score still travels through
    /// `await_score_result`.
    pub async fn await_replay_verification(
        &self,
        input_index: u64,
    ) -> Result<(), SubmitError> {
        let results = match self.query.input_results(input_index).await {
            Ok(results) => results,
            Err(QueryError::NotFound) => {
                return Err(SubmitError::ResultNotFound(input_index));
            }
            Err(err) => return Err(err.into()),
        };

        let Some(notice) = results.notices.first() else {
            return match results.reports.first() {
                Some(report) => {
                    Err(SubmitError::GameplayRejected(report_text(report)))
                }
                None => Err(SubmitError::ResultNotFound(input_index)),
            };
        };

        let decoded = self.decoder.decode_verify_replay_notice(notice)?;
        let verification = ReplayVerification::parse(&decoded)?;
        if verification.game_id != self.game_id {
            return Err(SubmitError::GameMismatch {
                expected: self.game_id.clone(),
                actual: verification.game_id,
            });
        }
        if !verification.valid {
            return Err(SubmitError::ReplayInvalid);
        }
        Ok(())
    }

    fn decode_score(&self, payload: &[u8]) -> Result<ScoreRecord, DecodeError> {
        let decoded = self.decoder.decode_score_notice(payload)?;
        ScoreRecord::parse(&decoded)
    }
}

// Reports carry diagnostic text; decode lossily so a mangled character
// cannot turn a rejection message into a second error.
fn report_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload).into_owned()
}
