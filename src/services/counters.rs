//! Denormalized answer counts.
//!
//! A count is never adjusted by a delta; it is always recounted from the
//! active answers, so overlapping or repeated resyncs converge on the same
//! value.

use std::sync::Arc;

use serde::Serialize;
use tracing::{Level, event, instrument};

use handle_errors::Error;

use crate::store::{QuestionFilter, RecordStore};
use crate::types::pagination::{MAX_PAGE_SIZE, Pagination};
use crate::types::question::QuestionId;

pub struct QuestionCounters<S> {
    store: Arc<S>,
}

impl<S> Clone for QuestionCounters<S> {
    fn clone(&self) -> Self {
        QuestionCounters {
            store: self.store.clone(),
        }
    }
}

/// Outcome of reconciling every question.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ResyncReport {
    pub questions: u64,
    pub failed: Vec<QuestionId>,
}

impl<S: RecordStore> QuestionCounters<S> {
    pub fn new(store: Arc<S>) -> Self {
        QuestionCounters { store }
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn resync(&self, question_id: QuestionId) -> Result<i64, Error> {
        match self.store.refresh_answer_count(question_id).await? {
            Some(count) => {
                event!(Level::DEBUG, question_id = %question_id, answer_count = count, "answer count resynced");
                Ok(count)
            }
            None => Err(Error::NotFound(format!("Question {}", question_id))),
        }
    }

    /// Resync after a mutation that already succeeded. A failure here must not
    /// fail the mutation; it is logged and left for the next resync.
    pub async fn resync_after_mutation(&self, question_id: QuestionId) {
        if let Err(e) = self.resync(question_id).await {
            event!(
                Level::WARN,
                question_id = %question_id,
                error = %e,
                "answer count resync failed, counter may be stale"
            );
        }
    }

    /// Recounts every question, soft-deleted ones included. Individual
    /// failures are collected instead of aborting the sweep.
    #[instrument(skip(self))]
    pub async fn resync_all(&self) -> Result<ResyncReport, Error> {
        let filter = QuestionFilter::everything();
        let mut report = ResyncReport::default();
        let mut page = 1;

        loop {
            let questions = self
                .store
                .find_questions(&filter, Pagination::new(page, MAX_PAGE_SIZE))
                .await?;
            if questions.is_empty() {
                break;
            }
            for question in &questions {
                report.questions += 1;
                if let Err(e) = self.resync(question.id).await {
                    event!(
                        Level::WARN,
                        question_id = %question.id,
                        error = %e,
                        "answer count resync failed during sweep"
                    );
                    report.failed.push(question.id);
                }
            }
            page += 1;
        }

        event!(
            Level::INFO,
            questions = report.questions,
            failed = report.failed.len(),
            "answer count sweep finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::answer::NewAnswer;
    use crate::types::category::NewCategory;
    use crate::types::principal::Principal;
    use crate::types::question::NewQuestion;

    async fn question_with_answers(store: &MemoryStore, answers: usize) -> QuestionId {
        let category = store
            .insert_category(NewCategory {
                name: format!("cat-{}", answers),
                description: "d".to_string(),
                color: None,
                icon: None,
            })
            .await
            .unwrap();
        let question = store
            .insert_question(
                NewQuestion {
                    title: "How do I count?".to_string(),
                    content: "Counting answers correctly".to_string(),
                    category_id: category.id,
                    tags: None,
                },
                &Principal::new("asker", "Asker"),
            )
            .await
            .unwrap();
        for i in 0..answers {
            store
                .insert_answer(
                    NewAnswer {
                        question_id: question.id,
                        content: format!("answer {}", i),
                    },
                    &Principal::new(format!("helper-{}", i), "Helper"),
                )
                .await
                .unwrap();
        }
        question.id
    }

    #[tokio::test]
    async fn resync_ignores_previous_counter_value() {
        let store = Arc::new(MemoryStore::new());
        let question_id = question_with_answers(&store, 2).await;
        let counters = QuestionCounters::new(store.clone());

        assert_eq!(counters.resync(question_id).await.unwrap(), 2);
        assert_eq!(counters.resync(question_id).await.unwrap(), 2);
        let question = store.find_question(question_id).await.unwrap().unwrap();
        assert_eq!(question.answer_count, 2);
    }

    #[tokio::test]
    async fn resync_of_missing_question_is_not_found() {
        let counters = QuestionCounters::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            counters.resync(QuestionId(404)).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn sweep_fixes_every_question() {
        let store = Arc::new(MemoryStore::new());
        let first = question_with_answers(&store, 1).await;
        let second = question_with_answers(&store, 3).await;
        let counters = QuestionCounters::new(store.clone());

        let report = counters.resync_all().await.unwrap();
        assert_eq!(report.questions, 2);
        assert!(report.failed.is_empty());
        assert_eq!(store.find_question(first).await.unwrap().unwrap().answer_count, 1);
        assert_eq!(store.find_question(second).await.unwrap().unwrap().answer_count, 3);
    }
}
