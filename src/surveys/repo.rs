use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Fixed set of question types a survey may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "question_type", rename_all = "lowercase")]
pub enum QuestionType {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
}

impl QuestionType {
    pub fn parse(raw: &str) -> Option<QuestionType> {
        match raw {
            "text" => Some(QuestionType::Text),
            "textarea" => Some(QuestionType::Textarea),
            "select" => Some(QuestionType::Select),
            "radio" => Some(QuestionType::Radio),
            "checkbox" => Some(QuestionType::Checkbox),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Survey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Image path relative to the public root.
    pub image: Option<String>,
    pub status: bool,
    pub expire_date: Option<Date>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, FromRow)]
pub struct SurveyQuestion {
    pub id: Uuid,
    pub survey_id: Uuid,
    pub question_type: QuestionType,
    pub question: String,
    pub description: Option<String>,
    pub data: serde_json::Value,
    pub position: i32,
    pub created_at: OffsetDateTime,
}

pub async fn count_by_user(db: &PgPool, user_id: Uuid) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM surveys WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

/// Surveys of one owner in creation order.
pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Survey>> {
    sqlx::query_as::<_, Survey>(
        r#"
        SELECT id, user_id, title, description, image, status, expire_date, created_at, updated_at
        FROM surveys
        WHERE user_id = $1
        ORDER BY created_at ASC, id ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Survey>> {
    sqlx::query_as::<_, Survey>(
        r#"
        SELECT id, user_id, title, description, image, status, expire_date, created_at, updated_at
        FROM surveys
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_tx(
    tx: &mut Transaction<'_, Postgres>,
    user_id: Uuid,
    title: &str,
    description: Option<&str>,
    image: Option<&str>,
    status: bool,
    expire_date: Option<Date>,
) -> sqlx::Result<Survey> {
    sqlx::query_as::<_, Survey>(
        r#"
        INSERT INTO surveys (user_id, title, description, image, status, expire_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, user_id, title, description, image, status, expire_date, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(title)
    .bind(description)
    .bind(image)
    .bind(status)
    .bind(expire_date)
    .fetch_one(&mut **tx)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    title: &str,
    description: Option<&str>,
    image: Option<&str>,
    status: bool,
    expire_date: Option<Date>,
) -> sqlx::Result<Survey> {
    sqlx::query_as::<_, Survey>(
        r#"
        UPDATE surveys
        SET title = $2, description = $3, image = $4, status = $5, expire_date = $6,
            updated_at = now()
        WHERE id = $1
        RETURNING id, user_id, title, description, image, status, expire_date, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(title)
    .bind(description)
    .bind(image)
    .bind(status)
    .bind(expire_date)
    .fetch_one(&mut **tx)
    .await
}

/// Remove a survey and its questions. The foreign key cascades as well;
/// the explicit delete keeps the invariant visible in one place.
pub async fn delete_tx(tx: &mut Transaction<'_, Postgres>, id: Uuid) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM survey_questions WHERE survey_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM surveys WHERE id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub async fn questions_by_survey(db: &PgPool, survey_id: Uuid) -> sqlx::Result<Vec<SurveyQuestion>> {
    sqlx::query_as::<_, SurveyQuestion>(
        r#"
        SELECT id, survey_id, question_type, question, description, data, position, created_at
        FROM survey_questions
        WHERE survey_id = $1
        ORDER BY position ASC, created_at ASC
        "#,
    )
    .bind(survey_id)
    .fetch_all(db)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_question_tx(
    tx: &mut Transaction<'_, Postgres>,
    survey_id: Uuid,
    question_type: QuestionType,
    question: &str,
    description: Option<&str>,
    data: &serde_json::Value,
    position: i32,
) -> sqlx::Result<SurveyQuestion> {
    sqlx::query_as::<_, SurveyQuestion>(
        r#"
        INSERT INTO survey_questions (survey_id, question_type, question, description, data, position)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, survey_id, question_type, question, description, data, position, created_at
        "#,
    )
    .bind(survey_id)
    .bind(question_type)
    .bind(question)
    .bind(description)
    .bind(data)
    .bind(position)
    .fetch_one(&mut **tx)
    .await
}

#[allow(clippy::too_many_arguments)]
pub async fn update_question_tx(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    question_type: QuestionType,
    question: &str,
    description: Option<&str>,
    data: &serde_json::Value,
    position: i32,
) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        UPDATE survey_questions
        SET question_type = $2, question = $3, description = $4, data = $5, position = $6
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(question_type)
    .bind(question)
    .bind(description)
    .bind(data)
    .bind(position)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Bulk delete by id set.
pub async fn delete_questions_tx(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> sqlx::Result<()> {
    sqlx::query("DELETE FROM survey_questions WHERE id = ANY($1)")
        .bind(ids)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_type_parses_every_variant() {
        assert_eq!(QuestionType::parse("text"), Some(QuestionType::Text));
        assert_eq!(QuestionType::parse("textarea"), Some(QuestionType::Textarea));
        assert_eq!(QuestionType::parse("select"), Some(QuestionType::Select));
        assert_eq!(QuestionType::parse("radio"), Some(QuestionType::Radio));
        assert_eq!(QuestionType::parse("checkbox"), Some(QuestionType::Checkbox));
    }

    #[test]
    fn question_type_rejects_unknown_values() {
        assert_eq!(QuestionType::parse("dropdown"), None);
        assert_eq!(QuestionType::parse("TEXT"), None);
        assert_eq!(QuestionType::parse(""), None);
    }

    #[test]
    fn question_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QuestionType::Checkbox).unwrap(),
            "\"checkbox\""
        );
    }
}
