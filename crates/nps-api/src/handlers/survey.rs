//! Ad-hoc survey job: upload, processing trigger and polling.

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use nps_core::defaults::DETAIL_SAMPLE_RESPONSES;
use nps_core::{SurveyAnalysis, SurveyDetails, SurveyResults, SurveyStatusReport};
use nps_jobs::SurveyProcessor;

use crate::error::{or_empty, ApiError};
use crate::query_types::{ApiJson, ApiQuery};
use crate::upload;
use crate::AppState;

const FILE_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large()
    } else {
        ApiError::bad_request(err.body_text())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub survey_id: Uuid,
    pub total_responses: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub survey_id: Uuid,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyIdParams {
    pub survey_id: Option<Uuid>,
}

impl SurveyIdParams {
    fn require(&self) -> Result<Uuid, ApiError> {
        self.survey_id
            .ok_or_else(|| ApiError::bad_request("Survey ID is required"))
    }
}

/// Start processing in the background when a model is available.
fn start_processing(state: &AppState, survey_id: Uuid) -> Result<(), ApiError> {
    let processor = SurveyProcessor::new(state.surveys.clone(), state.generator()?)
        .with_config(state.run_config.clone());
    processor.spawn(survey_id);
    Ok(())
}

async fn find_survey(state: &AppState, survey_id: Uuid) -> Result<SurveyAnalysis, ApiError> {
    state
        .surveys
        .get(survey_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Survey not found".to_string()))
}

/// Accept a CSV upload, store its rows and kick off analysis.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(multipart_error)?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        file = Some((filename, content_type, bytes));
        break;
    }
    let (filename, content_type, bytes) =
        file.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    upload::validate_file(&filename, content_type.as_deref(), bytes.len())?;
    let parsed = upload::parse_survey(&filename, &bytes)?;
    let survey = state.surveys.create(parsed).await?;
    info!(
        subsystem = "api",
        component = "survey_upload",
        survey_id = %survey.id,
        filename = %filename,
        response_column = %survey.response_column,
        total_responses = survey.total_responses,
        "Survey uploaded"
    );

    let message = match start_processing(&state, survey.id) {
        Ok(()) => "Survey uploaded successfully. AI analysis in progress...",
        Err(_) => {
            warn!(
                subsystem = "api",
                component = "survey_upload",
                survey_id = %survey.id,
                "No model configured, survey stored without analysis"
            );
            "Survey uploaded successfully. AI analysis not started: OpenAI API key not configured"
        }
    };

    Ok(Json(UploadResponse {
        success: true,
        survey_id: survey.id,
        total_responses: survey.total_responses,
        message: message.to_string(),
    }))
}

/// (Re)start analysis of an uploaded survey.
pub async fn process(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SurveyIdParams>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let survey_id = body.require()?;
    find_survey(&state, survey_id).await?;
    start_processing(&state, survey_id)?;

    Ok(Json(ProcessResponse {
        success: true,
        survey_id,
        message: "AI analysis started".to_string(),
    }))
}

/// Progress plus whatever results are stored so far.
pub async fn status(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SurveyIdParams>,
) -> Result<Json<SurveyStatusReport>, ApiError> {
    let survey_id = params.require()?;
    let survey = find_survey(&state, survey_id).await?;
    let results = SurveyResults {
        themes: or_empty(state.surveys.themes(survey_id).await, "survey_themes")?,
        insights: or_empty(state.surveys.insights(survey_id).await, "survey_insights")?,
    };
    Ok(Json(SurveyStatusReport {
        progress: survey.progress(),
        survey,
        results,
    }))
}

pub async fn details(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SurveyIdParams>,
) -> Result<Json<SurveyDetails>, ApiError> {
    let survey_id = params.require()?;
    let survey = find_survey(&state, survey_id).await?;
    Ok(Json(SurveyDetails {
        survey,
        themes: or_empty(state.surveys.themes(survey_id).await, "survey_themes")?,
        insights: or_empty(state.surveys.insights(survey_id).await, "survey_insights")?,
        sample_responses: or_empty(
            state
                .surveys
                .sample_responses(survey_id, DETAIL_SAMPLE_RESPONSES)
                .await,
            "survey_sample_responses",
        )?,
    }))
}
