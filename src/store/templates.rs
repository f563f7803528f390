use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

use super::models::{
    Difficulty, Page, PracticeTemplate, TemplateDraft, TemplateFilter, TemplateId, TemplateRow,
    UserId,
};
use super::Store;
use crate::error::{PitchError, PitchResult};

const TEMPLATE_COLUMNS: &str = "id, title, description, questions, difficulty, duration_minutes, \
     industry, target_market, target_market_code, image_url, is_active, usage_count, \
     created_at, updated_at";

/// Catalogue page size.
pub const TEMPLATE_PAGE_SIZE: i64 = 8;

/// How many templates the dashboard suggests.
const RECOMMENDATION_LIMIT: i64 = 3;

impl Store {
    pub async fn create_template(&self, draft: &TemplateDraft) -> PitchResult<PracticeTemplate> {
        let questions = encode_questions(draft)?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            INSERT INTO practice_templates (
                title, description, questions, difficulty, duration_minutes, industry,
                target_market, target_market_code, image_url, is_active, usage_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(questions)
        .bind(draft.difficulty)
        .bind(draft.duration_minutes)
        .bind(&draft.industry)
        .bind(&draft.target_market)
        .bind(&draft.target_market_code)
        .bind(&draft.image_url)
        .bind(draft.is_active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        info!(template_id = row.id, "Template created");

        Ok(row.try_into()?)
    }

    /// Replace the editable fields of a template. The usage counter is kept.
    pub async fn update_template(
        &self,
        id: TemplateId,
        draft: &TemplateDraft,
    ) -> PitchResult<PracticeTemplate> {
        let questions = encode_questions(draft)?;

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            UPDATE practice_templates SET
                title = ?, description = ?, questions = ?, difficulty = ?,
                duration_minutes = ?, industry = ?, target_market = ?,
                target_market_code = ?, image_url = ?, is_active = ?, updated_at = ?
            WHERE id = ?
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(questions)
        .bind(draft.difficulty)
        .bind(draft.duration_minutes)
        .bind(&draft.industry)
        .bind(&draft.target_market)
        .bind(&draft.target_market_code)
        .bind(&draft.image_url)
        .bind(draft.is_active)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| PitchError::not_found("template"))?;

        info!(template_id = id, "Template updated");

        Ok(row.try_into()?)
    }

    /// Delete a template nobody has practiced yet. Templates with sessions
    /// must be deactivated instead.
    pub async fn delete_template(&self, id: TemplateId) -> PitchResult<()> {
        let mut tx = self.pool.begin().await?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM pitching_sessions WHERE template_id = ?)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if in_use {
            return Err(PitchError::Conflict(
                "template has practice sessions; deactivate it instead".into(),
            ));
        }

        let affected = sqlx::query("DELETE FROM practice_templates WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(PitchError::not_found("template"));
        }

        tx.commit().await?;

        info!(template_id = id, "Template deleted");

        Ok(())
    }

    pub async fn template_by_id(&self, id: TemplateId) -> PitchResult<Option<PracticeTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM practice_templates WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PracticeTemplate::try_from).transpose()?)
    }

    /// Active templates matching `filter`, easiest first.
    pub async fn list_templates(
        &self,
        filter: &TemplateFilter,
        page: i64,
    ) -> PitchResult<Page<PracticeTemplate>> {
        let page = page.max(1);

        let mut count = QueryBuilder::<Sqlite>::new(
            "SELECT COUNT(*) FROM practice_templates WHERE is_active = 1",
        );
        push_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {TEMPLATE_COLUMNS} FROM practice_templates WHERE is_active = 1"
        ));
        push_filter(&mut select, filter);
        select
            .push(
                " ORDER BY CASE difficulty WHEN 'Beginner' THEN 0 WHEN 'Intermediate' THEN 1 ELSE 2 END, id",
            )
            .push(" LIMIT ")
            .push_bind(TEMPLATE_PAGE_SIZE)
            .push(" OFFSET ")
            .push_bind((page - 1).saturating_mul(TEMPLATE_PAGE_SIZE));

        let rows = select
            .build_query_as::<TemplateRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(Page::new(decode_all(rows)?, total, page, TEMPLATE_PAGE_SIZE))
    }

    /// Every template, active or not, for the admin console.
    pub async fn all_templates(&self) -> PitchResult<Vec<PracticeTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM practice_templates ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    pub async fn template_difficulties(&self) -> PitchResult<Vec<Difficulty>> {
        let mut values = sqlx::query_scalar::<_, Difficulty>(
            "SELECT DISTINCT difficulty FROM practice_templates WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;
        values.sort();

        Ok(values)
    }

    pub async fn template_industries(&self) -> PitchResult<Vec<String>> {
        let values = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT industry FROM practice_templates WHERE is_active = 1 ORDER BY industry",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    /// Most practiced active templates.
    pub async fn popular_templates(&self, limit: i64) -> PitchResult<Vec<PracticeTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM practice_templates WHERE is_active = 1 \
             ORDER BY usage_count DESC, id LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        decode_all(rows)
    }

    /// Templates in the industries the user has practiced before, falling
    /// back to the most popular ones.
    pub async fn recommended_templates(&self, user_id: UserId) -> PitchResult<Vec<PracticeTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            SELECT {TEMPLATE_COLUMNS} FROM practice_templates
            WHERE is_active = 1 AND industry IN (
                SELECT DISTINCT t.industry
                FROM pitching_sessions s
                JOIN practice_templates t ON t.id = s.template_id
                WHERE s.user_id = ?
            )
            ORDER BY usage_count DESC, id
            LIMIT ?
            "#
        ))
        .bind(user_id)
        .bind(RECOMMENDATION_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return self.popular_templates(RECOMMENDATION_LIMIT).await;
        }

        decode_all(rows)
    }
}

fn encode_questions(draft: &TemplateDraft) -> PitchResult<String> {
    if draft.title.trim().is_empty() {
        return Err(PitchError::InvalidInput("title must not be empty".into()));
    }
    if draft.duration_minutes <= 0 {
        return Err(PitchError::InvalidInput(
            "duration must be a positive number of minutes".into(),
        ));
    }
    if draft.questions.iter().all(|q| q.trim().is_empty()) {
        return Err(PitchError::InvalidInput(
            "template needs at least one question".into(),
        ));
    }

    serde_json::to_string(&draft.questions)
        .map_err(|e| PitchError::InvalidInput(format!("questions not encodable: {}", e)))
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &TemplateFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder
            .push(" AND title LIKE ")
            .push_bind(format!("%{}%", search));
    }
    if let Some(difficulty) = filter.difficulty {
        builder.push(" AND difficulty = ").push_bind(difficulty);
    }
    if let Some(industry) = filter.industry.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        builder.push(" AND industry = ").push_bind(industry.to_string());
    }
}

fn decode_all(rows: Vec<TemplateRow>) -> PitchResult<Vec<PracticeTemplate>> {
    Ok(rows
        .into_iter()
        .map(PracticeTemplate::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}
