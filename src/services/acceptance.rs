//! Answer acceptance.
//!
//! Only the author of a question may accept one of its answers, and at most
//! one answer per question is ever accepted. Switching acceptance clears the
//! previous answer and marks the new one in a single store transition guarded
//! by the question's revision.

use std::sync::Arc;

use tracing::{Level, event, info, instrument};

use handle_errors::Error;

use crate::store::RecordStore;
use crate::types::answer::{Answer, AnswerId};
use crate::types::principal::Principal;

pub struct AcceptanceCoordinator<S> {
    store: Arc<S>,
    max_write_attempts: u32,
}

impl<S> Clone for AcceptanceCoordinator<S> {
    fn clone(&self) -> Self {
        AcceptanceCoordinator {
            store: self.store.clone(),
            max_write_attempts: self.max_write_attempts,
        }
    }
}

impl<S: RecordStore> AcceptanceCoordinator<S> {
    pub fn new(store: Arc<S>, max_write_attempts: u32) -> Self {
        AcceptanceCoordinator {
            store,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn accept(&self, answer_id: AnswerId, principal: &Principal) -> Result<Answer, Error> {
        for attempt in 1..=self.max_write_attempts {
            let mut answer = self
                .store
                .find_answer(answer_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Answer {}", answer_id)))?;

            let question = self
                .store
                .find_question(answer.question_id)
                .await?
                .filter(|question| question.is_active)
                .ok_or_else(|| Error::NotFound(format!("Question {}", answer.question_id)))?;

            if !principal.is(&question.author_id) {
                return Err(Error::Forbidden(
                    "Only the question author can accept an answer".to_string(),
                ));
            }
            if !answer.is_active {
                return Err(Error::NotFound(format!("Answer {}", answer_id)));
            }
            if question.is_closed {
                return Err(Error::Conflict(
                    "This question is closed, its accepted answer is final".to_string(),
                ));
            }

            if self
                .store
                .switch_accepted_answer(question.id, answer.id, question.revision)
                .await?
            {
                answer.is_accepted = true;
                info!(answer_id = %answer.id, question_id = %question.id, "answer accepted");
                return Ok(answer);
            }

            event!(
                Level::WARN,
                attempt,
                question_id = %question.id,
                "question changed during acceptance, retrying"
            );
        }

        Err(Error::Conflict(format!(
            "Answer {} could not be accepted, the question kept changing",
            answer_id
        )))
    }
}
