use serde::{Deserialize, Serialize};

use handle_errors::Error;

use crate::types::principal::UserId;

/// A single up or down vote. Serialized as `1` / `-1`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(into = "i64", try_from = "i64")]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn value(self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl TryFrom<i64> for Vote {
    type Error = Error;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Vote::Up),
            -1 => Ok(Vote::Down),
            other => Err(Error::ValidationError(format!(
                "vote must be 1 (upvote) or -1 (downvote), got {}",
                other
            ))),
        }
    }
}

impl From<Vote> for i64 {
    fn from(vote: Vote) -> Self {
        vote.value()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteEntry {
    pub user_id: UserId,
    pub vote: Vote,
}

/// What a single ballot did to a ledger.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChange {
    Cast(Vote),
    Retracted(Vote),
    Changed { from: Vote, to: Vote },
}

impl VoteChange {
    /// Net effect on the score.
    pub fn delta(self) -> i64 {
        match self {
            VoteChange::Cast(vote) => vote.value(),
            VoteChange::Retracted(vote) => -vote.value(),
            VoteChange::Changed { from, to } => to.value() - from.value(),
        }
    }
}
