use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::{Value, json};

use typewrite_db::models::StoryRow;
use typewrite_types::api::{CreateStoryRequest, StoryResponse, UpdateStoryRequest};
use typewrite_types::models::StoryStatus;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::ident::{new_entity_id, slugify};
use crate::pagination::{PageQuery, paginate};
use crate::render;

pub async fn get_stories(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = query.normalized();
    let count = state.db.count_stories().map_err(ApiError::Database)?;
    let rows = state
        .db
        .list_stories(query.limit, query.offset())
        .map_err(ApiError::Database)?;

    let stories = rows
        .iter()
        .map(|row| {
            let html = render::load_or_render(&state.config.story_cache_dir, &row.id, &row.markdown)?;
            story_to_response(row, html)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(json!({
        "status": "success",
        "stories": stories,
        "pagination": paginate(count, query),
    })))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let story = state
        .db
        .get_story(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("story"))?;

    let html = render::load_or_render(&state.config.story_cache_dir, &story.id, &story.markdown)?;
    success_envelope(&story, html)
}

pub async fn add_story(
    State(state): State<AppState>,
    Json(req): Json<CreateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".into()));
    }
    state
        .db
        .get_user(&req.author)
        .map_err(ApiError::Database)?
        .ok_or_else(|| ApiError::BadRequest(format!("author {} does not exist", req.author)))?;
    if let Some(publisher) = &req.publisher {
        state
            .db
            .get_user(publisher)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::BadRequest(format!("publisher {publisher} does not exist")))?;
    }

    let status = req.status.unwrap_or_default();
    let (uuid, id) = new_entity_id();
    let story = StoryRow {
        id,
        uuid,
        slug: slugify(&req.title),
        metas: default_metas(&req.title).to_string(),
        is_featured: req.is_featured.unwrap_or(false),
        status: status.to_string(),
        language: req.language.unwrap_or_else(|| "en".into()),
        author_id: req.author,
        publisher_id: req.publisher,
        markdown: req.markdown,
        primary_image_path: req.primary_image_path,
        tags: serde_json::to_string(&req.tags.unwrap_or_default())
            .map_err(|e| ApiError::Internal(e.into()))?,
        published_at: (status == StoryStatus::Published).then(now_rfc3339),
        title: req.title,
        created_at: String::new(),
        updated_at: String::new(),
    };

    state.db.create_story(&story).map_err(ApiError::Database)?;
    let story = state
        .db
        .get_story(&story.id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("story"))?;

    let html = render::write_cache(&state.config.story_cache_dir, &story.id, &story.markdown)?;
    success_envelope(&story, html)
}

pub async fn update_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut story = state
        .db
        .get_story(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("story"))?;

    if let Some(title) = req.title {
        if title.trim().is_empty() {
            return Err(ApiError::BadRequest("title must not be empty".into()));
        }
        story.title = title;
    }
    // Slug always tracks the (possibly updated) title
    story.slug = slugify(&story.title);

    if let Some(markdown) = req.markdown {
        story.markdown = markdown;
    }
    if let Some(publisher) = req.publisher {
        state
            .db
            .get_user(&publisher)
            .map_err(ApiError::Database)?
            .ok_or_else(|| ApiError::BadRequest(format!("publisher {publisher} does not exist")))?;
        story.publisher_id = Some(publisher);
    }
    if let Some(status) = req.status {
        if status == StoryStatus::Published && story.published_at.is_none() {
            story.published_at = Some(now_rfc3339());
        }
        story.status = status.to_string();
    }
    if let Some(language) = req.language {
        story.language = language;
    }
    if let Some(is_featured) = req.is_featured {
        story.is_featured = is_featured;
    }
    if let Some(tags) = req.tags {
        story.tags = serde_json::to_string(&tags).map_err(|e| ApiError::Internal(e.into()))?;
    }
    if let Some(primary_image_path) = req.primary_image_path {
        story.primary_image_path = Some(primary_image_path);
    }
    if let Some(metas) = req.metas {
        story.metas = metas.to_string();
    }

    state.db.update_story(&story).map_err(ApiError::Database)?;
    let story = state
        .db
        .get_story(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("story"))?;

    let html = render::write_cache(&state.config.story_cache_dir, &story.id, &story.markdown)?;
    success_envelope(&story, html)
}

/// Hard delete; the cached HTML file goes with the row.
pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let story = state
        .db
        .get_story(&id)
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("story"))?;

    state.db.delete_story(&id).map_err(ApiError::Database)?;
    render::remove_cache(&state.config.story_cache_dir, &id)?;

    let html = render::render_markdown(&story.markdown);
    success_envelope(&story, html)
}

fn story_to_response(story: &StoryRow, html: String) -> Result<StoryResponse, ApiError> {
    let status = story
        .status
        .parse::<StoryStatus>()
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("story {}: {e}", story.id)))?;
    let metas: Value = serde_json::from_str(&story.metas)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt metas on story {}: {e}", story.id)))?;
    let tags: Vec<String> = serde_json::from_str(&story.tags)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("corrupt tags on story {}: {e}", story.id)))?;

    Ok(StoryResponse {
        id: story.id.clone(),
        title: story.title.clone(),
        slug: story.slug.clone(),
        is_featured: story.is_featured,
        status,
        language: story.language.clone(),
        metas,
        author: story.author_id.clone(),
        publisher: story.publisher_id.clone(),
        markdown: story.markdown.clone(),
        html,
        primary_image_path: story.primary_image_path.clone(),
        tags,
        published_at: story.published_at.clone(),
        created_at: story.created_at.clone(),
        updated_at: story.updated_at.clone(),
    })
}

fn success_envelope(story: &StoryRow, html: String) -> Result<Json<serde_json::Value>, ApiError> {
    Ok(Json(json!({ "status": "success", "story": story_to_response(story, html)? })))
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Meta scaffolding seeded for every new story. Editors fill the blanks in
/// later via PUT.
fn default_metas(title: &str) -> Value {
    json!({
        "facebook": {
            "site_name": "",
            "url": "",
            "type": "article",
            "title": title,
            "image": "",
            "description": "",
        },
        "twitter": {
            "site": "",
            "url": "",
            "type": "summary",
            "title": title,
            "image": "",
            "description": "",
            "creator": "",
        },
        "others": "",
    })
}
