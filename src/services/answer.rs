//! Answer lifecycle: create, edit, soft-delete, vote and accept.
//!
//! Every change to which answers are active is followed by a resync of the
//! owning question's answer count.

use std::sync::Arc;

use tracing::{Level, event, info, instrument};

use handle_errors::Error;

use crate::services::acceptance::AcceptanceCoordinator;
use crate::services::counters::QuestionCounters;
use crate::store::RecordStore;
use crate::types::answer::{Answer, AnswerId, NewAnswer};
use crate::types::principal::{Principal, UserId};
use crate::types::question::QuestionId;
use crate::types::vote::Vote;

pub struct AnswerService<S> {
    store: Arc<S>,
    counters: QuestionCounters<S>,
    acceptance: AcceptanceCoordinator<S>,
    max_write_attempts: u32,
}

impl<S> Clone for AnswerService<S> {
    fn clone(&self) -> Self {
        AnswerService {
            store: self.store.clone(),
            counters: self.counters.clone(),
            acceptance: self.acceptance.clone(),
            max_write_attempts: self.max_write_attempts,
        }
    }
}

impl<S: RecordStore> AnswerService<S> {
    pub fn new(
        store: Arc<S>,
        counters: QuestionCounters<S>,
        acceptance: AcceptanceCoordinator<S>,
        max_write_attempts: u32,
    ) -> Self {
        AnswerService {
            store,
            counters,
            acceptance,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    async fn find_active(&self, answer_id: AnswerId) -> Result<Answer, Error> {
        self.store
            .find_answer(answer_id)
            .await?
            .filter(|answer| answer.is_active)
            .ok_or_else(|| Error::NotFound(format!("Answer {}", answer_id)))
    }

    #[instrument(skip(self, content), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn create(
        &self,
        question_id: QuestionId,
        content: String,
        principal: &Principal,
    ) -> Result<Answer, Error> {
        let question = self
            .store
            .find_question(question_id)
            .await?
            .filter(|question| question.is_active)
            .ok_or_else(|| Error::NotFound(format!("Question {}", question_id)))?;

        if question.is_closed {
            return Err(Error::Conflict(
                "This question is closed for new answers".to_string(),
            ));
        }

        let answer = self
            .store
            .insert_answer(
                NewAnswer {
                    question_id,
                    content,
                },
                principal,
            )
            .await?;

        self.counters.resync_after_mutation(question_id).await;

        info!(
            answer_id = %answer.id,
            question_id = %question_id,
            author = %principal.username,
            "answer created"
        );
        Ok(answer)
    }

    #[instrument(skip(self, content), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn edit(
        &self,
        answer_id: AnswerId,
        content: String,
        principal: &Principal,
    ) -> Result<Answer, Error> {
        let mut answer = self.find_active(answer_id).await?;
        if !principal.is(&answer.author_id) {
            return Err(Error::Forbidden(
                "You can only edit your own answers".to_string(),
            ));
        }

        self.store.update_answer_content(answer_id, &content).await?;
        answer.content = content;

        info!(answer_id = %answer_id, "answer updated");
        Ok(answer)
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn soft_delete(&self, answer_id: AnswerId, principal: &Principal) -> Result<(), Error> {
        let answer = self.find_active(answer_id).await?;
        if !principal.is(&answer.author_id) {
            return Err(Error::Forbidden(
                "You can only delete your own answers".to_string(),
            ));
        }

        if !self.store.deactivate_answer(answer_id).await? {
            // Someone else got there first.
            return Err(Error::NotFound(format!("Answer {}", answer_id)));
        }

        self.counters.resync_after_mutation(answer.question_id).await;

        info!(answer_id = %answer_id, "answer deleted");
        Ok(())
    }

    /// Casts, changes or retracts `user_id`'s vote. `vote` must be `1` or
    /// `-1`.
    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn vote(&self, answer_id: AnswerId, user_id: &UserId, vote: i64) -> Result<Answer, Error> {
        let vote = Vote::try_from(vote)?;

        for attempt in 1..=self.max_write_attempts {
            let mut answer = self.find_active(answer_id).await?;
            let change = answer.apply_vote(user_id, vote)?;

            if self
                .store
                .update_answer_votes(answer.id, &answer.ledger, answer.version)
                .await?
            {
                answer.version += 1;
                info!(
                    answer_id = %answer_id,
                    user_id = %user_id,
                    delta = change.delta(),
                    score = answer.score(),
                    "vote recorded"
                );
                return Ok(answer);
            }

            event!(
                Level::WARN,
                attempt,
                answer_id = %answer_id,
                "answer changed during vote, retrying"
            );
        }

        Err(Error::Conflict(format!(
            "Answer {} is receiving too many concurrent votes, try again",
            answer_id
        )))
    }

    pub async fn accept(&self, answer_id: AnswerId, principal: &Principal) -> Result<Answer, Error> {
        self.acceptance.accept(answer_id, principal).await
    }

    /// Active answers of an active question in display order.
    #[instrument(skip(self))]
    pub async fn list_for_question(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error> {
        match self.store.find_question(question_id).await? {
            Some(question) if question.is_active => {
                self.store.find_active_answers(question_id).await
            }
            _ => Err(Error::NotFound(format!("Question {}", question_id))),
        }
    }
}
