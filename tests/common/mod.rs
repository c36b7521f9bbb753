#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;

use content_service::Error;
use content_service::ledger::VoteLedger;
use content_service::services::Services;
use content_service::store::{MemoryStore, QuestionFilter, RecordStore};
use content_service::types::{
    answer::{Answer, AnswerId, NewAnswer},
    category::{Category, CategoryId, NewCategory},
    pagination::Pagination,
    principal::Principal,
    question::{NewQuestion, Question, QuestionId, QuestionUpdate},
};

pub fn asker() -> Principal {
    Principal::new("asker", "Asker")
}

pub async fn open_question(store: &MemoryStore) -> QuestionId {
    let category = store
        .insert_category(NewCategory {
            name: "General".to_string(),
            description: "Anything goes".to_string(),
            color: None,
            icon: None,
        })
        .await
        .unwrap();
    store
        .insert_question(
            NewQuestion {
                title: "What is the best way to share state?".to_string(),
                content: "Arc<Mutex<T>> or channels?".to_string(),
                category_id: category.id,
                tags: Some(vec!["concurrency".to_string()]),
            },
            &asker(),
        )
        .await
        .unwrap()
        .id
}

pub async fn answer_by(
    services: &Services<impl RecordStore>,
    question_id: QuestionId,
    who: &str,
) -> Answer {
    services
        .answers
        .create(
            question_id,
            format!("{} thinks channels", who),
            &Principal::new(who, who),
        )
        .await
        .unwrap()
}

/// Store whose compare-and-swap writes always lose the race.
#[derive(Clone, Default)]
pub struct AlwaysStale {
    pub inner: MemoryStore,
}

#[async_trait]
impl RecordStore for AlwaysStale {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, Error> {
        self.inner.find_category(id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        self.inner.find_category_by_name(name).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.inner.list_categories().await
    }

    async fn insert_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        self.inner.insert_category(new_category).await
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, Error> {
        self.inner.find_question(id).await
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Question>, Error> {
        self.inner.find_questions(filter, pagination).await
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64, Error> {
        self.inner.count_questions(filter).await
    }

    async fn insert_question(
        &self,
        new_question: NewQuestion,
        author: &Principal,
    ) -> Result<Question, Error> {
        self.inner.insert_question(new_question, author).await
    }

    async fn update_question_content(
        &self,
        id: QuestionId,
        update: &QuestionUpdate,
    ) -> Result<Option<Question>, Error> {
        self.inner.update_question_content(id, update).await
    }

    async fn set_question_closed(
        &self,
        id: QuestionId,
        closed: bool,
    ) -> Result<Option<Question>, Error> {
        self.inner.set_question_closed(id, closed).await
    }

    async fn deactivate_question(&self, id: QuestionId) -> Result<bool, Error> {
        self.inner.deactivate_question(id).await
    }

    async fn increment_view_count(&self, id: QuestionId) -> Result<(), Error> {
        self.inner.increment_view_count(id).await
    }

    async fn refresh_answer_count(&self, id: QuestionId) -> Result<Option<i64>, Error> {
        self.inner.refresh_answer_count(id).await
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, Error> {
        self.inner.find_answer(id).await
    }

    async fn find_active_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error> {
        self.inner.find_active_answers(question_id).await
    }

    async fn insert_answer(
        &self,
        new_answer: NewAnswer,
        author: &Principal,
    ) -> Result<Answer, Error> {
        self.inner.insert_answer(new_answer, author).await
    }

    async fn update_answer_content(&self, id: AnswerId, content: &str) -> Result<(), Error> {
        self.inner.update_answer_content(id, content).await
    }

    async fn deactivate_answer(&self, id: AnswerId) -> Result<bool, Error> {
        self.inner.deactivate_answer(id).await
    }

    async fn update_answer_votes(
        &self,
        _id: AnswerId,
        _ledger: &VoteLedger,
        _expected_version: i64,
    ) -> Result<bool, Error> {
        Ok(false)
    }

    async fn switch_accepted_answer(
        &self,
        _question_id: QuestionId,
        _answer_id: AnswerId,
        _expected_revision: i64,
    ) -> Result<bool, Error> {
        Ok(false)
    }
}

/// Store whose answer recount always fails, as if the database dropped the
/// statement.
#[derive(Clone, Default)]
pub struct BrokenCounter {
    pub inner: MemoryStore,
}

#[async_trait]
impl RecordStore for BrokenCounter {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, Error> {
        self.inner.find_category(id).await
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        self.inner.find_category_by_name(name).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.inner.list_categories().await
    }

    async fn insert_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        self.inner.insert_category(new_category).await
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, Error> {
        self.inner.find_question(id).await
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Question>, Error> {
        self.inner.find_questions(filter, pagination).await
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64, Error> {
        self.inner.count_questions(filter).await
    }

    async fn insert_question(
        &self,
        new_question: NewQuestion,
        author: &Principal,
    ) -> Result<Question, Error> {
        self.inner.insert_question(new_question, author).await
    }

    async fn update_question_content(
        &self,
        id: QuestionId,
        update: &QuestionUpdate,
    ) -> Result<Option<Question>, Error> {
        self.inner.update_question_content(id, update).await
    }

    async fn set_question_closed(
        &self,
        id: QuestionId,
        closed: bool,
    ) -> Result<Option<Question>, Error> {
        self.inner.set_question_closed(id, closed).await
    }

    async fn deactivate_question(&self, id: QuestionId) -> Result<bool, Error> {
        self.inner.deactivate_question(id).await
    }

    async fn increment_view_count(&self, id: QuestionId) -> Result<(), Error> {
        self.inner.increment_view_count(id).await
    }

    async fn refresh_answer_count(&self, _id: QuestionId) -> Result<Option<i64>, Error> {
        Err(Error::DatabaseQueryError(sqlx::Error::PoolTimedOut))
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, Error> {
        self.inner.find_answer(id).await
    }

    async fn find_active_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error> {
        self.inner.find_active_answers(question_id).await
    }

    async fn insert_answer(
        &self,
        new_answer: NewAnswer,
        author: &Principal,
    ) -> Result<Answer, Error> {
        self.inner.insert_answer(new_answer, author).await
    }

    async fn update_answer_content(&self, id: AnswerId, content: &str) -> Result<(), Error> {
        self.inner.update_answer_content(id, content).await
    }

    async fn deactivate_answer(&self, id: AnswerId) -> Result<bool, Error> {
        self.inner.deactivate_answer(id).await
    }

    async fn update_answer_votes(
        &self,
        id: AnswerId,
        ledger: &VoteLedger,
        expected_version: i64,
    ) -> Result<bool, Error> {
        self.inner
            .update_answer_votes(id, ledger, expected_version)
            .await
    }

    async fn switch_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        expected_revision: i64,
    ) -> Result<bool, Error> {
        self.inner
            .switch_accepted_answer(question_id, answer_id, expected_revision)
            .await
    }
}
