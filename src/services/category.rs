use std::sync::Arc;

use tracing::{info, instrument};

use handle_errors::Error;

use crate::store::{QuestionFilter, RecordStore};
use crate::types::category::{Category, CategoryId, CategorySummary, NewCategory};

pub struct CategoryService<S> {
    store: Arc<S>,
}

impl<S> Clone for CategoryService<S> {
    fn clone(&self) -> Self {
        CategoryService {
            store: self.store.clone(),
        }
    }
}

impl<S: RecordStore> CategoryService<S> {
    pub fn new(store: Arc<S>) -> Self {
        CategoryService { store }
    }

    /// Names are unique regardless of case.
    #[instrument(skip(self))]
    pub async fn create(&self, new_category: NewCategory) -> Result<Category, Error> {
        if self
            .store
            .find_category_by_name(&new_category.name)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(
                "Category with this name already exists".to_string(),
            ));
        }

        let category = self.store.insert_category(new_category).await?;
        info!(category = %category.name, "category created");
        Ok(category)
    }

    pub async fn list(&self) -> Result<Vec<Category>, Error> {
        self.store.list_categories().await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: CategoryId) -> Result<CategorySummary, Error> {
        let category = self
            .store
            .find_category(id)
            .await?
            .filter(|category| category.is_active)
            .ok_or_else(|| Error::NotFound(format!("Category {}", id.0)))?;
        let question_count = self
            .store
            .count_questions(&QuestionFilter::in_category(id))
            .await?;

        Ok(CategorySummary {
            category,
            question_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::category::{DEFAULT_COLOR, DEFAULT_ICON};

    fn new_category(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: "About things".to_string(),
            color: None,
            icon: None,
        }
    }

    #[tokio::test]
    async fn duplicate_names_conflict_ignoring_case() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));
        let created = service.create(new_category("Unsafe")).await.unwrap();
        assert_eq!(created.color, DEFAULT_COLOR);
        assert_eq!(created.icon, DEFAULT_ICON);

        assert!(matches!(
            service.create(new_category("UNSAFE")).await,
            Err(Error::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn list_is_sorted_by_name() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));
        for name in ["Tokio", "Async", "Serde"] {
            service.create(new_category(name)).await.unwrap();
        }
        let names: Vec<String> = service
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();
        assert_eq!(names, vec!["Async", "Serde", "Tokio"]);
    }

    #[tokio::test]
    async fn get_reports_question_count() {
        let service = CategoryService::new(Arc::new(MemoryStore::new()));
        let category = service.create(new_category("Cargo")).await.unwrap();
        let summary = service.get(category.id).await.unwrap();
        assert_eq!(summary.question_count, 0);
        assert!(matches!(
            service.get(CategoryId(999)).await,
            Err(Error::NotFound(_))
        ));
    }
}
