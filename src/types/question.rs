use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::answer::Answer;
use crate::types::category::CategoryId;
use crate::types::principal::UserId;

#[derive(Serialize, Debug, Clone, Eq, Hash, Deserialize, PartialEq, Copy)]
pub struct QuestionId(pub i32);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub title: String,
    pub content: String,
    pub author_id: UserId,
    pub author_name: String,
    pub category_id: CategoryId,
    pub tags: Vec<String>,
    pub view_count: i64,
    /// Number of active answers. Only ever written by a recount.
    pub answer_count: i64,
    pub is_active: bool,
    pub is_closed: bool,
    /// Bumped by every acceptance transition on this question.
    pub revision: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    pub category_id: CategoryId,
    pub tags: Option<Vec<String>>,
}

/// Partial edit. Absent fields keep their current value.
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct QuestionUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// A question as shown on its own page, with its active answers in display
/// order.
#[derive(Serialize, Debug, Clone)]
pub struct QuestionDetail {
    #[serde(flatten)]
    pub question: Question,
    pub answers: Vec<Answer>,
}
