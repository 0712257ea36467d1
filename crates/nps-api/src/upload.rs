//! Ad-hoc survey upload validation and CSV parsing.

use serde_json::{Map, Value as JsonValue};

use nps_core::defaults::{MIN_RESPONSE_CHARS, UPLOAD_MAX_BYTES};
use nps_core::{Error, NewSurveyAnalysis, NewSurveyResponse, Result};

const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "text/csv",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
];

/// Header fragments that mark the free-text response column.
const RESPONSE_COLUMN_HINTS: &[&str] = &["response", "comment", "feedback", "answer", "text"];

const PARTICIPANT_COLUMN: &str = "participant_id";

/// Reject uploads by type and size before reading them.
pub fn validate_file(filename: &str, content_type: Option<&str>, size: usize) -> Result<()> {
    let type_ok = content_type.is_some_and(|ct| ALLOWED_CONTENT_TYPES.contains(&ct))
        || filename.to_lowercase().ends_with(".csv");
    if !type_ok {
        return Err(Error::InvalidInput(
            "Invalid file type. Please upload a CSV or Excel file.".to_string(),
        ));
    }
    if size > UPLOAD_MAX_BYTES {
        return Err(Error::InvalidInput(
            "File size must be less than 10MB".to_string(),
        ));
    }
    Ok(())
}

/// First header that looks like a free-text response column.
pub fn detect_response_column(headers: &[String]) -> Option<&str> {
    headers
        .iter()
        .find(|h| {
            let lower = h.to_lowercase();
            RESPONSE_COLUMN_HINTS.iter().any(|hint| lower.contains(hint))
        })
        .map(String::as_str)
}

fn survey_name(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

/// Parse an uploaded CSV into a survey with its analysable rows.
///
/// Rows whose response is not longer than the minimum length are dropped.
/// Row numbers are spreadsheet rows (the header is row 1).
pub fn parse_survey(filename: &str, bytes: &[u8]) -> Result<NewSurveyAnalysis> {
    let unreadable = |e: csv::Error| Error::InvalidInput(format!("Could not read CSV file: {}", e));

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(|h| h.trim_matches('"').to_string())
        .collect();

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.map_err(unreadable)?;
        if record.iter().any(|v| !v.is_empty()) {
            records.push(record);
        }
    }
    if headers.iter().all(|h| h.is_empty()) || records.is_empty() {
        return Err(Error::InvalidInput(
            "CSV file must contain at least a header row and one data row".to_string(),
        ));
    }

    let response_column = detect_response_column(&headers)
        .ok_or_else(|| {
            Error::InvalidInput(
                "No response column found. Name a column after response, comment, feedback, answer or text."
                    .to_string(),
            )
        })?
        .to_string();
    let response_idx = headers
        .iter()
        .position(|h| *h == response_column)
        .unwrap_or_default();
    let participant_idx = headers.iter().position(|h| h == PARTICIPANT_COLUMN);

    let mut responses = Vec::new();
    for (data_index, record) in records.iter().enumerate() {
        let text = record.get(response_idx).unwrap_or("").trim();
        if text.chars().count() <= MIN_RESPONSE_CHARS {
            continue;
        }
        let participant_id = participant_idx
            .and_then(|i| record.get(i))
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("P{}", responses.len() + 1));

        let mut metadata = Map::new();
        for (i, header) in headers.iter().enumerate() {
            if i == response_idx {
                continue;
            }
            if let Some(value) = record.get(i).filter(|v| !v.is_empty()) {
                metadata.insert(header.clone(), JsonValue::String(value.to_string()));
            }
        }

        responses.push(NewSurveyResponse {
            response_text: text.to_string(),
            question_text: Some(response_column.clone()),
            row_number: data_index as i32 + 2,
            participant_id,
            metadata: JsonValue::Object(metadata),
        });
    }

    if responses.is_empty() {
        return Err(Error::InvalidInput(
            "No valid responses found. Please ensure your response columns contain meaningful text."
                .to_string(),
        ));
    }

    Ok(NewSurveyAnalysis {
        name: survey_name(filename),
        original_filename: filename.to_string(),
        response_column,
        headers,
        responses,
    })
}
