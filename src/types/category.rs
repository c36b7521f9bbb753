use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_COLOR: &str = "#007bff";
pub const DEFAULT_ICON: &str = "book";

#[derive(Serialize, Debug, Clone, Eq, Hash, Deserialize, PartialEq, Copy)]
pub struct CategoryId(pub i32);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub color: String,
    pub icon: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: String,
    pub color: Option<String>,
    pub icon: Option<String>,
}

/// A category together with the number of active questions filed under it.
#[derive(Serialize, Debug, Clone)]
pub struct CategorySummary {
    #[serde(flatten)]
    pub category: Category,
    pub question_count: u64,
}
