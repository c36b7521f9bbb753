use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};

use handle_errors::Error;

use crate::ledger::VoteLedger;
use crate::store::{QuestionFilter, RecordStore};
use crate::types::{
    answer::{Answer, AnswerId, NewAnswer},
    category::{Category, CategoryId, DEFAULT_COLOR, DEFAULT_ICON, NewCategory},
    pagination::Pagination,
    principal::{Principal, UserId},
    question::{NewQuestion, Question, QuestionId, QuestionUpdate},
    vote::{Vote, VoteEntry},
};

const QUESTION_COLUMNS: &str = "id, title, content, author_id, author_name, category_id, tags, \
     view_count, answer_count, is_active, is_closed, revision, created_at, updated_at";

const ANSWER_COLUMNS: &str = "id, question_id, content, author_id, author_name, is_accepted, \
     is_active, version, created_at, updated_at";

// $1..$4 는 QuestionFilter 의 각 필드에 바인딩된다.
const QUESTION_FILTER: &str = "($1 OR is_active)
    AND ($2::INTEGER IS NULL OR category_id = $2)
    AND ($3::TEXT IS NULL OR author_id = $3)
    AND ($4::TEXT IS NULL
        OR title ILIKE '%' || $4 || '%'
        OR content ILIKE '%' || $4 || '%'
        OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE '%' || $4 || '%'))";

#[derive(Debug, Clone)]
pub struct PgStore {
    pub connection: PgPool,
}

fn query_failed(error: sqlx::Error) -> Error {
    tracing::event!(tracing::Level::ERROR, "{:?}", error);
    Error::DatabaseQueryError(error)
}

fn map_category(row: PgRow) -> Category {
    Category {
        id: CategoryId(row.get("id")),
        name: row.get("name"),
        description: row.get("description"),
        color: row.get("color"),
        icon: row.get("icon"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn map_question(row: PgRow) -> Question {
    Question {
        id: QuestionId(row.get("id")),
        title: row.get("title"),
        content: row.get("content"),
        author_id: UserId(row.get("author_id")),
        author_name: row.get("author_name"),
        category_id: CategoryId(row.get("category_id")),
        tags: row.get("tags"),
        view_count: row.get("view_count"),
        answer_count: row.get("answer_count"),
        is_active: row.get("is_active"),
        is_closed: row.get("is_closed"),
        revision: row.get("revision"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// 투표 목록은 answer_votes 테이블에서 따로 읽어 채운다.
fn map_answer(row: PgRow) -> Answer {
    Answer {
        id: AnswerId(row.get("id")),
        question_id: QuestionId(row.get("question_id")),
        content: row.get("content"),
        author_id: UserId(row.get("author_id")),
        author_name: row.get("author_name"),
        ledger: VoteLedger::new(),
        is_accepted: row.get("is_accepted"),
        is_active: row.get("is_active"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl PgStore {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self, Error> {
        let db_pool = match PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(db_url)
            .await
        {
            Ok(pool) => pool,
            Err(e) => return Err(query_failed(e)),
        };

        Ok(PgStore {
            connection: db_pool,
        })
    }

    pub async fn migrate(&self) -> Result<(), Error> {
        sqlx::migrate!().run(&self.connection).await?;
        Ok(())
    }

    async fn load_votes(
        &self,
        answer_ids: Vec<i32>,
    ) -> Result<HashMap<i32, Vec<VoteEntry>>, Error> {
        let rows = sqlx::query(
            "SELECT answer_id, user_id, vote FROM answer_votes WHERE answer_id = ANY($1)",
        )
        .bind(answer_ids)
        .fetch_all(&self.connection)
        .await
        .map_err(query_failed)?;

        let mut votes: HashMap<i32, Vec<VoteEntry>> = HashMap::new();
        for row in rows {
            let vote = Vote::try_from(i64::from(row.get::<i16, _>("vote")))?;
            votes
                .entry(row.get("answer_id"))
                .or_default()
                .push(VoteEntry {
                    user_id: UserId(row.get("user_id")),
                    vote,
                });
        }
        Ok(votes)
    }

    async fn with_votes(&self, mut answers: Vec<Answer>) -> Result<Vec<Answer>, Error> {
        if answers.is_empty() {
            return Ok(answers);
        }
        let mut votes = self
            .load_votes(answers.iter().map(|answer| answer.id.0).collect())
            .await?;
        for answer in answers.iter_mut() {
            if let Some(entries) = votes.remove(&answer.id.0) {
                answer.ledger = VoteLedger::from_entries(entries);
            }
        }
        Ok(answers)
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, Error> {
        match sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.0)
            .map(map_category)
            .fetch_optional(&self.connection)
            .await
        {
            Ok(category) => Ok(category),
            Err(error) => Err(query_failed(error)),
        }
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, Error> {
        sqlx::query("SELECT * FROM categories WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .map(map_category)
            .fetch_optional(&self.connection)
            .await
            .map_err(query_failed)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        sqlx::query("SELECT * FROM categories WHERE is_active ORDER BY name")
            .map(map_category)
            .fetch_all(&self.connection)
            .await
            .map_err(query_failed)
    }

    async fn insert_category(&self, new_category: NewCategory) -> Result<Category, Error> {
        match sqlx::query(
            "INSERT INTO categories (name, description, color, icon)
            VALUES ($1, $2, $3, $4)
            RETURNING *",
        )
        .bind(new_category.name)
        .bind(new_category.description)
        .bind(
            new_category
                .color
                .unwrap_or_else(|| DEFAULT_COLOR.to_string()),
        )
        .bind(new_category.icon.unwrap_or_else(|| DEFAULT_ICON.to_string()))
        .map(map_category)
        .fetch_one(&self.connection)
        .await
        {
            Ok(category) => Ok(category),
            Err(error) => Err(query_failed(error)),
        }
    }

    async fn find_question(&self, id: QuestionId) -> Result<Option<Question>, Error> {
        sqlx::query(&format!(
            "SELECT {} FROM questions WHERE id = $1",
            QUESTION_COLUMNS
        ))
        .bind(id.0)
        .map(map_question)
        .fetch_optional(&self.connection)
        .await
        .map_err(query_failed)
    }

    async fn find_questions(
        &self,
        filter: &QuestionFilter,
        pagination: Pagination,
    ) -> Result<Vec<Question>, Error> {
        let sql = format!(
            "SELECT {} FROM questions WHERE {}
            ORDER BY created_at DESC, id DESC
            LIMIT $5 OFFSET $6",
            QUESTION_COLUMNS, QUESTION_FILTER
        );
        sqlx::query(&sql)
            .bind(filter.include_inactive)
            .bind(filter.category_id.map(|id| id.0))
            .bind(filter.author_id.as_ref().map(|id| id.0.clone()))
            .bind(filter.text.clone())
            .bind(i64::from(pagination.limit()))
            .bind(i64::try_from(pagination.offset()).unwrap_or(i64::MAX))
            .map(map_question)
            .fetch_all(&self.connection)
            .await
            .map_err(query_failed)
    }

    async fn count_questions(&self, filter: &QuestionFilter) -> Result<u64, Error> {
        let sql = format!(
            "SELECT COUNT(*) AS count FROM questions WHERE {}",
            QUESTION_FILTER
        );
        let count: i64 = sqlx::query(&sql)
            .bind(filter.include_inactive)
            .bind(filter.category_id.map(|id| id.0))
            .bind(filter.author_id.as_ref().map(|id| id.0.clone()))
            .bind(filter.text.clone())
            .map(|row: PgRow| row.get("count"))
            .fetch_one(&self.connection)
            .await
            .map_err(query_failed)?;
        Ok(count.max(0) as u64)
    }

    async fn insert_question(
        &self,
        new_question: NewQuestion,
        author: &Principal,
    ) -> Result<Question, Error> {
        let sql = format!(
            "INSERT INTO questions (title, content, author_id, author_name, category_id, tags)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}",
            QUESTION_COLUMNS
        );
        match sqlx::query(&sql)
            .bind(new_question.title)
            .bind(new_question.content)
            .bind(author.user_id.0.clone())
            .bind(author.username.clone())
            .bind(new_question.category_id.0)
            .bind(new_question.tags.unwrap_or_default())
            .map(map_question)
            .fetch_one(&self.connection)
            .await
        {
            Ok(question) => Ok(question),
            Err(error) => Err(query_failed(error)),
        }
    }

    async fn update_question_content(
        &self,
        id: QuestionId,
        update: &QuestionUpdate,
    ) -> Result<Option<Question>, Error> {
        let sql = format!(
            "UPDATE questions
            SET title = COALESCE($1, title),
                content = COALESCE($2, content),
                tags = COALESCE($3, tags),
                updated_at = NOW()
            WHERE id = $4 AND is_active
            RETURNING {}",
            QUESTION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(update.title.clone())
            .bind(update.content.clone())
            .bind(update.tags.clone())
            .bind(id.0)
            .map(map_question)
            .fetch_optional(&self.connection)
            .await
            .map_err(query_failed)
    }

    async fn set_question_closed(
        &self,
        id: QuestionId,
        closed: bool,
    ) -> Result<Option<Question>, Error> {
        let sql = format!(
            "UPDATE questions SET is_closed = $1, updated_at = NOW()
            WHERE id = $2 AND is_active
            RETURNING {}",
            QUESTION_COLUMNS
        );
        sqlx::query(&sql)
            .bind(closed)
            .bind(id.0)
            .map(map_question)
            .fetch_optional(&self.connection)
            .await
            .map_err(query_failed)
    }

    async fn deactivate_question(&self, id: QuestionId) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE questions SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active",
        )
        .bind(id.0)
        .execute(&self.connection)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    async fn increment_view_count(&self, id: QuestionId) -> Result<(), Error> {
        sqlx::query("UPDATE questions SET view_count = view_count + 1 WHERE id = $1")
            .bind(id.0)
            .execute(&self.connection)
            .await
            .map_err(query_failed)?;
        Ok(())
    }

    async fn refresh_answer_count(&self, id: QuestionId) -> Result<Option<i64>, Error> {
        let mut tx = self.connection.begin().await.map_err(query_failed)?;

        // 행을 먼저 잠근 뒤 세어야 겹치는 재계산이 오래된 값을 덮어쓰지 않는다.
        let locked = sqlx::query("SELECT id FROM questions WHERE id = $1 FOR UPDATE")
            .bind(id.0)
            .fetch_optional(&mut tx)
            .await
            .map_err(query_failed)?;

        if locked.is_none() {
            tx.rollback().await.map_err(query_failed)?;
            return Ok(None);
        }

        let count: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM answers WHERE question_id = $1 AND is_active",
        )
        .bind(id.0)
        .map(|row: PgRow| row.get("count"))
        .fetch_one(&mut tx)
        .await
        .map_err(query_failed)?;

        sqlx::query("UPDATE questions SET answer_count = $1 WHERE id = $2")
            .bind(count)
            .bind(id.0)
            .execute(&mut tx)
            .await
            .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(Some(count))
    }

    async fn find_answer(&self, id: AnswerId) -> Result<Option<Answer>, Error> {
        let answer = sqlx::query(&format!(
            "SELECT {} FROM answers WHERE id = $1",
            ANSWER_COLUMNS
        ))
        .bind(id.0)
        .map(map_answer)
        .fetch_optional(&self.connection)
        .await
        .map_err(query_failed)?;

        match answer {
            Some(answer) => Ok(self.with_votes(vec![answer]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_active_answers(&self, question_id: QuestionId) -> Result<Vec<Answer>, Error> {
        let answers = sqlx::query(&format!(
            "SELECT {} FROM answers
            WHERE question_id = $1 AND is_active
            ORDER BY is_accepted DESC, score DESC, created_at DESC, id DESC",
            ANSWER_COLUMNS
        ))
        .bind(question_id.0)
        .map(map_answer)
        .fetch_all(&self.connection)
        .await
        .map_err(query_failed)?;

        self.with_votes(answers).await
    }

    async fn insert_answer(
        &self,
        new_answer: NewAnswer,
        author: &Principal,
    ) -> Result<Answer, Error> {
        let sql = format!(
            "INSERT INTO answers (question_id, content, author_id, author_name)
            VALUES ($1, $2, $3, $4)
            RETURNING {}",
            ANSWER_COLUMNS
        );
        match sqlx::query(&sql)
            .bind(new_answer.question_id.0)
            .bind(new_answer.content)
            .bind(author.user_id.0.clone())
            .bind(author.username.clone())
            .map(map_answer)
            .fetch_one(&self.connection)
            .await
        {
            Ok(answer) => Ok(answer),
            Err(error) => Err(query_failed(error)),
        }
    }

    async fn update_answer_content(&self, id: AnswerId, content: &str) -> Result<(), Error> {
        let result = sqlx::query(
            "UPDATE answers SET content = $1, updated_at = NOW() WHERE id = $2",
        )
        .bind(content)
        .bind(id.0)
        .execute(&self.connection)
        .await
        .map_err(query_failed)?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Answer {}", id)));
        }
        Ok(())
    }

    async fn deactivate_answer(&self, id: AnswerId) -> Result<bool, Error> {
        let result = sqlx::query(
            "UPDATE answers SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active",
        )
        .bind(id.0)
        .execute(&self.connection)
        .await
        .map_err(query_failed)?;

        Ok(result.rows_affected() == 1)
    }

    async fn update_answer_votes(
        &self,
        id: AnswerId,
        ledger: &VoteLedger,
        expected_version: i64,
    ) -> Result<bool, Error> {
        let mut tx = self.connection.begin().await.map_err(query_failed)?;

        // 버전이 그대로일 때만 점수를 쓴다. 다른 요청이 먼저 썼다면 0행이 갱신된다.
        let updated = sqlx::query(
            "UPDATE answers
            SET score = $1, version = version + 1, updated_at = NOW()
            WHERE id = $2 AND version = $3 AND is_active",
        )
        .bind(ledger.score())
        .bind(id.0)
        .bind(expected_version)
        .execute(&mut tx)
        .await
        .map_err(query_failed)?;

        if updated.rows_affected() == 0 {
            tx.rollback().await.map_err(query_failed)?;
            return Ok(false);
        }

        sqlx::query("DELETE FROM answer_votes WHERE answer_id = $1")
            .bind(id.0)
            .execute(&mut tx)
            .await
            .map_err(query_failed)?;

        for entry in ledger.entries() {
            sqlx::query("INSERT INTO answer_votes (answer_id, user_id, vote) VALUES ($1, $2, $3)")
                .bind(id.0)
                .bind(entry.user_id.0)
                .bind(entry.vote.value() as i16)
                .execute(&mut tx)
                .await
                .map_err(query_failed)?;
        }

        tx.commit().await.map_err(query_failed)?;
        Ok(true)
    }

    async fn switch_accepted_answer(
        &self,
        question_id: QuestionId,
        answer_id: AnswerId,
        expected_revision: i64,
    ) -> Result<bool, Error> {
        let mut tx = self.connection.begin().await.map_err(query_failed)?;

        let claimed = sqlx::query(
            "UPDATE questions SET revision = revision + 1 WHERE id = $1 AND revision = $2",
        )
        .bind(question_id.0)
        .bind(expected_revision)
        .execute(&mut tx)
        .await
        .map_err(query_failed)?;

        if claimed.rows_affected() == 0 {
            tx.rollback().await.map_err(query_failed)?;
            return Ok(false);
        }

        let target = sqlx::query(
            "SELECT id FROM answers WHERE id = $1 AND question_id = $2 AND is_active FOR UPDATE",
        )
        .bind(answer_id.0)
        .bind(question_id.0)
        .fetch_optional(&mut tx)
        .await
        .map_err(query_failed)?;

        if target.is_none() {
            tx.rollback().await.map_err(query_failed)?;
            return Ok(false);
        }

        // 유일 인덱스가 있으므로 기존 채택을 먼저 해제한 뒤 새 답변을 채택한다.
        sqlx::query(
            "UPDATE answers SET is_accepted = FALSE, updated_at = NOW()
            WHERE question_id = $1 AND is_accepted AND id <> $2",
        )
        .bind(question_id.0)
        .bind(answer_id.0)
        .execute(&mut tx)
        .await
        .map_err(query_failed)?;

        sqlx::query("UPDATE answers SET is_accepted = TRUE, updated_at = NOW() WHERE id = $1")
            .bind(answer_id.0)
            .execute(&mut tx)
            .await
            .map_err(query_failed)?;

        tx.commit().await.map_err(query_failed)?;
        Ok(true)
    }
}
