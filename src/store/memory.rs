use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use handle_errors::Error;

use crate::ledger::VoteLedger;
use crate::store::{QuestionFilter, RecordStore};
use crate::types::{
    answer::{Answer, AnswerId, NewAnswer},
    category::{Category, CategoryId, DEFAULT_COLOR, DEFAULT_ICON, NewCategory},
    pagination::Pagination,
    principal::Principal,
    question::{NewQuestion, Question, QuestionId, QuestionUpdate},
};

/// In-process store backed by hash maps.
///
/// Whenever both tables are needed the question lock is taken before the
/// answer lock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    categories: Arc<RwLock<HashMap<CategoryId, Category>>>,
    questions: Arc<RwLock<HashMap<QuestionId, Question>>>,
    answers: Arc<RwLock<HashMap<AnswerId, Answer>>>,
    next_id: Arc<AtomicI32>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids are shared by all tables and start at 1.
    fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, Error> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        let name = name.to_lowercase();
        Ok(self
            .categories
            .read()
            .await
            .values()
            .find(|category| category.name.to_lowercase() == name)
            .cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        let mut categories: Vec<Category> = self
            .categories
            .read()
            .await
            .values()
            .filter(|category| category.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        let now = Utc::now();
        let category = Category {
            id: CategoryId(self.allocate_id()),
            name: new_category.name,
            description: new_category.description,
            color: new_category
                .color
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
            icon: new_category.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.categories
            .write()
            .await
            .insert(category.id, category.clone());
        Ok(category)
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, Error> {
        Ok(self.questions.read().await.get(&id).cloned())
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Question>, Error> {
        let mut questions: Vec<Question> = self
            .questions
            .read()
            .await
            .values()
            .filter(|question| filter.accepts(question))
            .cloned()
            .collect();
        questions.sort_by_key(|question| Reverse((question.created_at, question.id.0)));
        Ok(questions
            .into_iter()
            .skip(usize::try_from(pagination.offset()).unwrap_or(usize::MAX))
            .take(pagination.limit() as usize)
            .collect())
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64, Error> {
        Ok(self
            .questions
            .read()
            .await
            .values()
            .filter(|question| filter.accepts(question))
            .count() as u64)
    }

    async fn insert_question(
        &self,
        new_question: NewQuestion,
        author: &Principal,
    ) -> Result<Question, Error> {
        let now = Utc::now();
        let question = Question {
            id: QuestionId(self.allocate_id()),
            title: new_question.title,
            content: new_question.content,
            author_id: author.user_id.clone(),
            author_name: author.username.clone(),
            category_id: new_question.category_id,
            tags: new_question.tags.unwrap_or_default(),
            view_count: 0,
            answer_count: 0,
            is_active: true,
            is_closed: false,
            revision: 0,
            created_at: now,
            updated_at: now,
        };
        self.questions
            .write()
            .await
            .insert(question.id, question.clone());
        Ok(question)
    }

    async fn update_question_content(
        &self,
        id: QuestionId,
        update: &QuestionUpdate,
    ) -> Result<Option<Question>, Error> {
        let mut questions = self.questions.write().await;
        match questions.get_mut(&id) {
            Some(stored) if stored.is_active => {
                if let Some(title) = &update.title {
                    stored.title = title.clone();
                }
                if let Some(content) = &update.content {
                    stored.content = content.clone();
                }
                if let Some(tags) = &update.tags {
                    stored.tags = tags.clone();
                }
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn set_question_closed(
        &self,
        id: QuestionId,
        closed: bool,
    ) -> Result<Option<Question>, Error> {
        let mut questions = self.questions.write().await;
        match questions.get_mut(&id) {
            Some(stored) if stored.is_active => {
                stored.is_closed = closed;
                stored.updated_at = Utc::now();
                Ok(Some(stored.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn deactivate_question(&self, id: QuestionId) -> Result<bool, Error> {
        match self.questions.write().await.get_mut(&id) {
            Some(stored) if stored.is_active => {
                stored.is_active = false;
                stored.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn increment_view_count(&self, id: QuestionId) -> Result<(), Error> {
        if let Some(question) = self.questions.write().await.get_mut(&id) {
            question.view_count += 1;
        }
        Ok(())
    }

    async fn refresh_answer_count(&self, id: QuestionId) -> Result<Option<i64>, Error> {
        let mut questions = self.questions.write().await;
        let answers = self.answers.read().await;
        match questions.get_mut(&id) {
            Some(question) => {
                let count = answers
                    .values()
                    .filter(|answer| answer.question_id == id && answer.is_active)
                    .count() as i64;
                question.answer_count = count;
                Ok(Some(count))
            }
            None => Ok(None),
        }
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, Error> {
        Ok(self.answers.read().await.get(&id).cloned())
    }

    async fn find_active_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error> {
        let mut answers: Vec<Answer> = self
            .answers
            .read()
            .await
            .values()
            .filter(|answer| answer.question_id == question_id && answer.is_active)
            .cloned()
            .collect();
        answers.sort_by_key(|answer| {
            Reverse((answer.is_accepted, answer.score(), answer.created_at, answer.id.0))
        });
        Ok(answers)
    }

    async fn insert_answer(
        &self,
        new_answer: NewAnswer,
        author: &Principal,
    ) -> Result<Answer, Error> {
        let now = Utc::now();
        let answer = Answer {
            id: AnswerId(self.allocate_id()),
            question_id: new_answer.question_id,
            content: new_answer.content,
            author_id: author.user_id.clone(),
            author_name: author.username.clone(),
            ledger: VoteLedger::new(),
            is_accepted: false,
            is_active: true,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        self.answers.write().await.insert(answer.id, answer.clone());
        Ok(answer)
    }

    async fn update_answer_content(&self, id: AnswerId, content: &str) -> Result<(), Error> {
        match self.answers.write().await.get_mut(&id) {
            Some(answer) => {
                answer.content = content.to_string();
                answer.updated_at = Utc::now();
                Ok(())
            }
            None => Err(Error::NotFound(format!("Answer {}", id))),
        }
    }

    async fn deactivate_answer(&self, id: AnswerId) -> Result<bool, Error> {
        match self.answers.write().await.get_mut(&id) {
            Some(answer) if answer.is_active => {
                answer.is_active = false;
                answer.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_answer_votes(
        &self,
        id: AnswerId,
        ledger: &VoteLedger,
        expected_version: i64,
    ) -> Result<bool, Error> {
        match self.answers.write().await.get_mut(&id) {
            Some(answer) if answer.is_active && answer.version == expected_version => {
                answer.ledger = ledger.clone();
                answer.version += 1;
                answer.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn switch_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        expected_revision: i64,
    ) -> Result<bool, Error> {
        let mut questions = self.questions.write().await;
        let mut answers = self.answers.write().await;

        let question = match questions.get_mut(&question_id) {
            Some(question) if question.revision == expected_revision => question,
            _ => return Ok(false),
        };
        match answers.get(&answer_id) {
            Some(target) if target.is_active && target.question_id == question_id => {}
            _ => return Ok(false),
        }

        let now = Utc::now();
        for answer in answers
            .values_mut()
            .filter(|answer| answer.question_id == question_id)
        {
            let accepted = answer.id == answer_id;
            if answer.is_accepted != accepted {
                answer.is_accepted = accepted;
                answer.updated_at = now;
            }
        }
        question.revision += 1;
        Ok(true)
    }
}
