use std::sync::Arc;

use tracing::{info, instrument};

use handle_errors::Error;

use crate::store::{QuestionFilter, RecordStore};
use crate::types::category::CategoryId;
use crate::types::pagination::{Page, Pagination};
use crate::types::principal::Principal;
use crate::types::question::{NewQuestion, Question, QuestionDetail, QuestionId, QuestionUpdate};

pub const MIN_SEARCH_LEN: usize = 2;

pub struct QuestionService<S> {
    store: Arc<S>,
}

impl<S> Clone for QuestionService<S> {
    fn clone(&self) -> Self {
        QuestionService {
            store: self.store.clone(),
        }
    }
}

impl<S: RecordStore> QuestionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        QuestionService { store }
    }

    async fn find_active(&self, id: QuestionId) -> Result<Question, Error> {
        self.store
            .find_question(id)
            .await?
            .filter(|question| question.is_active)
            .ok_or_else(|| Error::NotFound(format!("Question {}", id)))
    }

    async fn find_owned(&self, id: QuestionId, principal: &Principal) -> Result<Question, Error> {
        let question = self.find_active(id).await?;
        if !principal.is(&question.author_id) {
            return Err(Error::Forbidden(
                "You can only change your own questions".to_string(),
            ));
        }
        Ok(question)
    }

    async fn paged(
        &self,
        filter: QuestionFilter,
        pagination: Pagination,
    ) -> Result<Page<Question>, Error> {
        let questions = self.store.find_questions(&filter, pagination).await?;
        let total = self.store.count_questions(&filter).await?;
        Ok(Page::new(questions, pagination, total))
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn create(
        &self,
        new_question: NewQuestion,
        principal: &Principal,
    ) -> Result<Question, Error> {
        match self.store.find_category(new_question.category_id).await? {
            Some(category) if category.is_active => {}
            _ => return Err(Error::ValidationError("Invalid category".to_string())),
        }

        let question = self.store.insert_question(new_question, principal).await?;
        info!(question_id = %question.id, author = %principal.username, "question created");
        Ok(question)
    }

    /// Loads a question for display and counts the view.
    #[instrument(skip(self))]
    pub async fn get(&self, id: QuestionId) -> Result<QuestionDetail, Error> {
        let mut question = self.find_active(id).await?;
        let answers = self.store.find_active_answers(id).await?;

        self.store.increment_view_count(id).await?;
        question.view_count += 1;

        Ok(QuestionDetail { question, answers })
    }

    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
        pagination: Pagination,
    ) -> Result<Page<Question>, Error> {
        match self.store.find_category(category_id).await? {
            Some(category) if category.is_active => {}
            _ => return Err(Error::NotFound(format!("Category {}", category_id.0))),
        }
        self.paged(QuestionFilter::in_category(category_id), pagination)
            .await
    }

    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, pagination: Pagination) -> Result<Page<Question>, Error> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_LEN {
            return Err(Error::ValidationError(format!(
                "Search query must be at least {} characters long",
                MIN_SEARCH_LEN
            )));
        }
        self.paged(QuestionFilter::matching(query), pagination).await
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn update(
        &self,
        id: QuestionId,
        update: QuestionUpdate,
        principal: &Principal,
    ) -> Result<Question, Error> {
        self.find_owned(id, principal).await?;

        let question = self
            .store
            .update_question_content(id, &update)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Question {}", id)))?;
        info!(question_id = %id, "question updated");
        Ok(question)
    }

    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn soft_delete(&self, id: QuestionId, principal: &Principal) -> Result<(), Error> {
        self.find_owned(id, principal).await?;
        if !self.store.deactivate_question(id).await? {
            return Err(Error::NotFound(format!("Question {}", id)));
        }
        info!(question_id = %id, "question deleted");
        Ok(())
    }

    /// Opens or closes a question for new answers.
    #[instrument(skip(self), fields(id = %uuid::Uuid::new_v4()))]
    pub async fn set_closed(
        &self,
        id: QuestionId,
        closed: bool,
        principal: &Principal,
    ) -> Result<Question, Error> {
        self.find_owned(id, principal).await?;
        let question = self
            .store
            .set_question_closed(id, closed)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Question {}", id)))?;
        info!(question_id = %id, closed, "question closed state changed");
        Ok(question)
    }
}
