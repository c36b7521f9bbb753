//! Stateless services over an injected [`RecordStore`].
//!
//! Each service holds an `Arc` to the store and nothing else that changes,
//! so cloning one is cheap and every clone sees the same data.

use std::sync::Arc;

use crate::store::RecordStore;

pub mod acceptance;
pub mod answer;
pub mod category;
pub mod counters;
pub mod question;

pub use acceptance::AcceptanceCoordinator;
pub use answer::AnswerService;
pub use category::CategoryService;
pub use counters::QuestionCounters;
pub use question::QuestionService;

/// Attempts made for a compare-and-swap write before giving up with a
/// conflict.
pub const DEFAULT_WRITE_ATTEMPTS: u32 = 3;

/// Every service wired to one store.
pub struct Services<S> {
    pub categories: CategoryService<S>,
    pub questions: QuestionService<S>,
    pub answers: AnswerService<S>,
    pub acceptance: AcceptanceCoordinator<S>,
    pub counters: QuestionCounters<S>,
}

impl<S> Clone for Services<S> {
    fn clone(&self) -> Self {
        Services {
            categories: self.categories.clone(),
            questions: self.questions.clone(),
            answers: self.answers.clone(),
            acceptance: self.acceptance.clone(),
            counters: self.counters.clone(),
        }
    }
}

impl<S: RecordStore> Services<S> {
    pub fn new(store: Arc<S>, max_write_attempts: u32) -> Self {
        let counters = QuestionCounters::new(store.clone());
        let acceptance = AcceptanceCoordinator::new(store.clone(), max_write_attempts);
        Services {
            categories: CategoryService::new(store.clone()),
            questions: QuestionService::new(store.clone()),
            answers: AnswerService::new(
                store,
                counters.clone(),
                acceptance.clone(),
                max_write_attempts,
            ),
            acceptance,
            counters,
        }
    }
}
