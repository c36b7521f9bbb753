//! Record store port.
//!
//! Services only talk to persistence through [`RecordStore`]. Every method is
//! a single bounded call; the conditional writes (`update_answer_votes`,
//! `switch_accepted_answer`) are compare-and-swap operations that report a
//! lost race as `Ok(false)` rather than an error, leaving the retry decision
//! to the caller.

use async_trait::async_trait;

use handle_errors::Error;

use crate::ledger::VoteLedger;
use crate::types::{
    answer::{Answer, AnswerId, NewAnswer},
    category::{Category, CategoryId, NewCategory},
    pagination::Pagination,
    principal::{Principal, UserId},
    question::{NewQuestion, Question, QuestionId, QuestionUpdate},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Which questions a listing covers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuestionFilter {
    pub category_id: Option<CategoryId>,
    pub author_id: Option<UserId>,
    /// Case-insensitive match against title, content or any tag.
    pub text: Option<String>,
    /// Include soft-deleted questions. Only maintenance sweeps set this.
    pub include_inactive: bool,
}

impl QuestionFilter {
    pub fn in_category(category_id: CategoryId) -> Self {
        QuestionFilter {
            category_id: Some(category_id),
            ..Default::default()
        }
    }

    pub fn matching(text: impl Into<String>) -> Self {
        QuestionFilter {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn everything() -> Self {
        QuestionFilter {
            include_inactive: true,
            ..Default::default()
        }
    }

    pub fn accepts(&self, question: &Question) -> bool {
        if !self.include_inactive && !question.is_active {
            return false;
        }
        if let Some(category_id) = self.category_id {
            if question.category_id != category_id {
                return false;
            }
        }
        if let Some(author_id) = &self.author_id {
            if &question.author_id != author_id {
                return false;
            }
        }
        match &self.text {
            Some(text) => {
                let needle = text.to_lowercase();
                question.title.to_lowercase().contains(&needle)
                    || question.content.to_lowercase().contains(&needle)
                    || question
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&needle))
            }
            None => true,
        }
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, Error>;

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, Error>;

    /// Active categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, Error>;

    async fn insert_category(&self, new_category: NewCategory) -> Result<Category, Error>;

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, Error>;

    /// Newest first.
    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Question>, Error>;

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64, Error>;

    async fn insert_question(
        &self,
        new_question: NewQuestion,
        author: &Principal,
    ) -> Result<Question, Error>;

    /// Overwrites only the fields present in `update` on an active question.
    /// `None` if the question is missing or inactive.
    async fn update_question_content(
        &self,
        id: QuestionId,
        update: &QuestionUpdate,
    ) -> Result<Option<Question>, Error>;

    /// `None` if the question is missing or inactive.
    async fn set_question_closed(
        &self,
        id: QuestionId,
        closed: bool,
    ) -> Result<Option<Question>, Error>;

    /// Soft-deletes an active question. `false` if it was missing or already
    /// inactive.
    async fn deactivate_question(&self, id: QuestionId) -> Result<bool, Error>;

    async fn increment_view_count(&self, id: QuestionId) -> Result<(), Error>;

    /// Recounts the active answers of `id` and stores the result on the
    /// question in one step. `None` if the question does not exist.
    async fn refresh_answer_count(&self, id: QuestionId) -> Result<Option<i64>, Error>;

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, Error>;

    /// Active answers of a question: accepted first, then by score, then
    /// newest first.
    async fn find_active_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error>;

    async fn insert_answer(&self, new_answer: NewAnswer, author: &Principal)
    -> Result<Answer, Error>;

    async fn update_answer_content(&self, id: AnswerId, content: &str) -> Result<(), Error>;

    /// Marks the answer inactive. `false` if it was not active.
    async fn deactivate_answer(&self, id: AnswerId) -> Result<bool, Error>;

    /// Replaces the ledger of an active answer if its version is still
    /// `expected_version`, bumping the version.
    async fn update_answer_votes(
        &self,
        id: AnswerId,
        ledger: &VoteLedger,
        expected_version: i64,
    ) -> Result<bool, Error>;

    /// Clears acceptance on every answer of `question_id` and accepts
    /// `answer_id`, all or nothing. Succeeds only while the question's
    /// revision equals `expected_revision` and the answer is still active and
    /// belongs to the question; bumps the revision.
    async fn switch_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        expected_revision: i64,
    ) -> Result<bool, Error>;
}
