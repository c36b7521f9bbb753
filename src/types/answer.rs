use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use handle_errors::Error;

use crate::ledger::VoteLedger;
use crate::types::principal::UserId;
use crate::types::question::QuestionId;
use crate::types::vote::{Vote, VoteChange};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub struct AnswerId(pub i32);

impl std::fmt::Display for AnswerId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Answer {
    pub id: AnswerId,
    pub question_id: QuestionId,
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    #[serde(flatten)]
    pub ledger: VoteLedger,
    pub is_accepted: bool,
    pub is_active: bool,
    /// Bumped by every vote write on this answer.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewAnswer {
    pub question_id: QuestionId,
    pub content: String,
}

impl Answer {
    pub fn score(&self) -> i64 {
        self.ledger.score()
    }

    /// Records `user_id`'s ballot. Inactive answers and the author's own
    /// ballot are rejected without touching the ledger.
    pub fn apply_vote(&mut self, user_id: &UserId, vote: Vote) -> Result<VoteChange, Error> {
        if !self.is_active {
            return Err(Error::NotFound(format!("Answer {}", self.id)));
        }
        if &self.author_id == user_id {
            return Err(Error::Forbidden(
                "You cannot vote on your own answer".to_string(),
            ));
        }
        Ok(self.ledger.apply(user_id, vote))
    }
}
