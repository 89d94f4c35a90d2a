//! Axum route handlers for the AI features.
//!
//! Each request passes the per-user AI throttle, then the plan quota, and
//! records usage only after the LLM call succeeds.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::ai::jd_text::extract_jd_text;
use crate::ai::prompts::{
    clean_input_text, combine_resume_fields, ALTERNATE_STYLE, COVER_LETTER_PROMPT_TEMPLATE,
    STANDARD_STYLE, SUMMARY_PROMPT_TEMPLATE, TAILOR_PROMPT_TEMPLATE,
};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::llm_client::prompts::{CAREER_WRITER_SYSTEM, JSON_ONLY_SYSTEM};
use crate::resumes::content::ResumeContent;
use crate::resumes::render::render_markdown;
use crate::resumes::versioning;
use crate::state::AppState;
use crate::subscription::usage::{ensure_quota, record_usage, UsageKind};
use crate::throttle::ThrottleRule;

const AI_WINDOW_SECS: u64 = 60;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SuggestRequest {
    pub name: String,
    pub education: String,
    pub experience: String,
    pub skills: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
pub struct SuggestResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LetterVariant {
    #[default]
    Standard,
    Alternate,
}

#[derive(Debug, Deserialize)]
pub struct CoverLetterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub key_points: String,
    #[serde(default)]
    pub variant: LetterVariant,
}

#[derive(Debug, Serialize)]
pub struct CoverLetterResponse {
    pub letter: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TailorReport {
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

async fn throttle_ai(state: &AppState, auth: &AuthUser) -> Result<(), AppError> {
    let rule = ThrottleRule::new(state.config.ai_requests_per_minute, AI_WINDOW_SECS);
    state
        .throttle
        .check_and_record(&format!("ai:{}", auth.id()), rule)
        .await?;
    Ok(())
}

fn build_cover_letter_prompt(req: &CoverLetterRequest) -> Result<String, AppError> {
    let required = [
        ("full_name", &req.full_name),
        ("job_title", &req.job_title),
        ("company_name", &req.company_name),
    ];
    let missing: Vec<&str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if !missing.is_empty() {
        return Err(AppError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )));
    }

    let key_points = match req.key_points.trim() {
        "" => "(none given; draw on the role itself)",
        points => points,
    };
    let style = match req.variant {
        LetterVariant::Standard => STANDARD_STYLE,
        LetterVariant::Alternate => ALTERNATE_STYLE,
    };

    Ok(COVER_LETTER_PROMPT_TEMPLATE
        .replace("{full_name}", &clean_input_text(&req.full_name))
        .replace("{job_title}", &clean_input_text(&req.job_title))
        .replace("{company_name}", &clean_input_text(&req.company_name))
        .replace("{key_points}", key_points)
        .replace("{style}", style))
}

/// POST /api/v1/resume/ai-suggest
pub async fn handle_ai_suggest(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SuggestRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    let fields = [&req.name, &req.education, &req.experience, &req.skills, &req.location];
    if fields.iter().all(|f| f.trim().is_empty()) {
        return Err(AppError::Validation(
            "Provide at least one of name, education, experience, skills or location".to_string(),
        ));
    }

    throttle_ai(&state, &auth).await?;
    ensure_quota(&state.db, &auth.user, UsageKind::AiGeneration).await?;

    let profile = combine_resume_fields(
        &req.name,
        &req.education,
        &req.experience,
        &req.skills,
        &req.location,
    );
    let prompt = SUMMARY_PROMPT_TEMPLATE.replace("{profile}", &profile);
    let summary = state
        .llm
        .call_text(&prompt, CAREER_WRITER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Summary suggestion failed: {e}")))?;

    record_usage(&state.db, auth.id(), UsageKind::AiGeneration).await?;
    info!("Generated summary suggestion for user {}", auth.id());

    Ok(Json(SuggestResponse { summary }))
}

/// POST /api/v1/ai/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CoverLetterRequest>,
) -> Result<Json<CoverLetterResponse>, AppError> {
    let prompt = build_cover_letter_prompt(&req)?;

    throttle_ai(&state, &auth).await?;
    ensure_quota(&state.db, &auth.user, UsageKind::AiGeneration).await?;

    let letter = state
        .llm
        .call_text(&prompt, CAREER_WRITER_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Cover letter generation failed: {e}")))?;

    record_usage(&state.db, auth.id(), UsageKind::AiGeneration).await?;
    info!(
        "Generated {:?} cover letter for user {}",
        req.variant,
        auth.id()
    );

    Ok(Json(CoverLetterResponse { letter }))
}

/// POST /api/v1/resumes/:id/tailor
///
/// Multipart upload with a `file` part holding the job description.
pub async fn handle_tailor_resume(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<TailorReport>, AppError> {
    let resume = versioning::get_owned_resume(&state.db, auth.id(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;

    ensure_quota(&state.db, &auth.user, UsageKind::Tailoring).await?;
    throttle_ai(&state, &auth).await?;

    let mut upload: Option<(Option<String>, Bytes)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read upload: {e}")))?;
        upload = Some((content_type, data));
        break;
    }
    let (content_type, data) = upload
        .ok_or_else(|| AppError::Validation("Missing 'file' part".to_string()))?;
    let job_description = extract_jd_text(content_type.as_deref(), data).await?;

    let version = versioning::get_version(&state.db, resume.id, resume.current_version)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} has no content")))?;
    let resume_md = render_markdown(&resume.title, &ResumeContent::from_stored(&version.content));

    let prompt = TAILOR_PROMPT_TEMPLATE
        .replace("{resume}", &resume_md)
        .replace("{job_description}", &job_description);
    let report: TailorReport = state
        .llm
        .call_json(&prompt, JSON_ONLY_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("Tailoring failed: {e}")))?;

    record_usage(&state.db, auth.id(), UsageKind::Tailoring).await?;
    info!(
        "Tailored resume {} v{} for user {}: {} matched, {} missing",
        resume.id,
        version.version,
        auth.id(),
        report.matched_keywords.len(),
        report.missing_keywords.len()
    );

    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn letter_request(value: serde_json::Value) -> CoverLetterRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_cover_letter_requires_fields() {
        let req = letter_request(json!({ "full_name": "Ada", "job_title": " " }));
        let err = build_cover_letter_prompt(&req).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Missing required fields: job_title, company_name"));
    }

    #[test]
    fn test_cover_letter_variants_change_style() {
        let standard = letter_request(json!({
            "full_name": "Ada Lovelace",
            "job_title": "Engineer",
            "company_name": "Analytical Engines",
            "key_points": "Wrote the first program"
        }));
        assert_eq!(standard.variant, LetterVariant::Standard);
        let prompt = build_cover_letter_prompt(&standard).unwrap();
        assert!(prompt.starts_with("Write a cover letter from Ada Lovelace applying for the Engineer position at Analytical Engines."));
        assert!(prompt.contains("Wrote the first program"));
        assert!(prompt.contains(STANDARD_STYLE));

        let alternate = letter_request(json!({
            "full_name": "Ada Lovelace",
            "job_title": "Engineer",
            "company_name": "Analytical Engines",
            "variant": "alternate"
        }));
        let prompt = build_cover_letter_prompt(&alternate).unwrap();
        assert!(prompt.contains(ALTERNATE_STYLE));
        assert!(prompt.contains("(none given"));
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        let result: Result<CoverLetterRequest, _> =
            serde_json::from_value(json!({ "variant": "poetic" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_tailor_report_tolerates_missing_lists() {
        let report: TailorReport =
            serde_json::from_value(json!({ "matched_keywords": ["Rust"] })).unwrap();
        assert_eq!(report.matched_keywords, vec!["Rust"]);
        assert!(report.suggestions.is_empty());
    }
}
