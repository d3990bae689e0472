use serde_json::Value;
use thiserror::Error;

/// Schema violations raised while turning a decoded notice payload into a
/// typed record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("notice payload is not valid UTF-8")]
    NotText,
    #[error("score notice has {0} fields, expected 7")]
    FieldCount(usize),
    #[error("unparseable {field} field: {value:?}")]
    Field { field: &'static str, value: String },
    #[error("replay verification notice is not valid JSON: {0}")]
    Envelope(String),
    #[error("replay verification notice is missing the result tuple")]
    MissingTuple,
    #[error("replay verification tuple has {0} elements, expected at least 4")]
    TupleLength(usize),
}

pub const SCORE_NOTICE_FIELDS: usize = 7;
pub const VERIFY_TUPLE_MIN_LEN: usize = 4;

/// One submitted score, as the backend emits it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    pub game_id: String,
    pub player: String,
    pub timestamp: u64,
    pub finished: bool,
    pub score: u64,
    /// Auxiliary metric carried by the backend. Never used for ordering.
    pub score_diff: i64,
}

impl ScoreRecord {
    /// Parse the comma-joined tuple form of a score notice:
    /// game, player, timestamp, finished, reserved, score, diff-score
    pub fn parse(decoded: &str) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = decoded.split(',').collect();
        if fields.len() != SCORE_NOTICE_FIELDS {
            return Err(DecodeError::FieldCount(fields.len()));
        }

        Ok(ScoreRecord {
            game_id: fields[0].to_string(),
            player: fields[1].to_string(),
            timestamp: parse_field("timestamp", fields[2])?,
            finished: parse_field("finished", fields[3])?,
            score: parse_field("score", fields[5])?,
            score_diff: parse_field("diff-score", fields[6])?,
        })
    }
}

/// Outcome of replaying a full-emulator gameplay log on the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayVerification {
    pub game_id: String,
    pub player: Option<String>,
    pub valid: bool,
}

impl ReplayVerification {
    /// Parse the JSON envelope form of a replay verification notice. The
    /// envelope's `Array` field is a tuple: element 0 is the game id,
    /// element 3 the valid flag, element 1 the player when present.
    pub fn parse(decoded: &str) -> Result<Self, DecodeError> {
        let envelope: Value = serde_json::from_str(decoded)
            .map_err(|err| DecodeError::Envelope(err.to_string()))?;
        let tuple = envelope
            .get("Array")
            .and_then(Value::as_array)
            .ok_or(DecodeError::MissingTuple)?;
        if tuple.len() < VERIFY_TUPLE_MIN_LEN {
            return Err(DecodeError::TupleLength(tuple.len()));
        }

        let game_id = tuple[0]
            .as_str()
            .ok_or_else(|| DecodeError::Field {
                field: "game",
                value: tuple[0].to_string(),
            })?
            .to_string();
        let valid = tuple[3].as_bool().ok_or_else(|| DecodeError::Field {
            field: "valid",
            value: tuple[3].to_string(),
        })?;
        let player = tuple[1].as_str().map(str::to_string);

        Ok(ReplayVerification {
            game_id,
            player,
            valid,
        })
    }
}

fn parse_field<T: std::str::FromStr>(
    field: &'static str,
    value: &str,
) -> Result<T, DecodeError> {
    value.parse().map_err(|_| DecodeError::Field {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_score_tuple() {
        let record =
            ScoreRecord::parse("snake,0xabc,1712000000,true,,420,13").unwrap();

        assert_eq!(record.game_id, "snake");
        assert_eq!(record.player, "0xabc");
        assert_eq!(record.timestamp, 1712000000);
        assert!(record.finished);
        assert_eq!(record.score, 420);
        assert_eq!(record.score_diff, 13);
    }

    #[test]
    fn rejects_a_short_tuple() {
        let err = ScoreRecord::parse("snake,0xabc,1712000000").unwrap_err();
        assert_eq!(err, DecodeError::FieldCount(3));
    }

    #[test]
    fn rejects_a_non_boolean_finished_flag() {
        let err = ScoreRecord::parse("snake,0xabc,1712000000,yes,,420,13").unwrap_err();
        assert_eq!(
            err,
            DecodeError::Field {
                field: "finished",
                value: "yes".to_string()
            }
        );
    }

    #[test]
    fn parses_a_replay_verification_envelope() {
        let verification = ReplayVerification::parse(
            r#"{"Array":["snake","0xabc",1712000000,true]}"#,
        )
        .unwrap();

        assert_eq!(verification.game_id, "snake");
        assert_eq!(verification.player.as_deref(), Some("0xabc"));
        assert!(verification.valid);
    }

    #[test]
    fn rejects_an_envelope_without_the_tuple() {
        let err = ReplayVerification::parse(r#"{"valid":true}"#).unwrap_err();
        assert_eq!(err, DecodeError::MissingTuple);
    }

    #[test]
    fn rejects_a_truncated_tuple() {
        let err = ReplayVerification::parse(r#"{"Array":["snake","0xabc"]}"#).unwrap_err();
        assert_eq!(err, DecodeError::TupleLength(2));
    }
}
