use serde::{Serialize, Serializer};

use crate::error::PipelineError;

/// Result of one pipeline run as handed to callers.
///
/// On the wire a success is the payload's own fields plus `"success": true`,
/// and a failure is exactly `{"errorMessage": ..., "success": false}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure(String),
}

pub type SummaryResult = Outcome<Summary>;
pub type RecipeResult = Outcome<Recipe>;

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Outcome::Success(body) => Some(body),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure(message) => Some(message),
        }
    }
}

impl<T> From<Result<T, PipelineError>> for Outcome<T> {
    fn from(result: Result<T, PipelineError>) -> Self {
        match result {
            Ok(body) => Outcome::Success(body),
            Err(e) => Outcome::Failure(e.user_message()),
        }
    }
}

#[derive(Serialize)]
struct SuccessBody<'a, T> {
    #[serde(flatten)]
    body: &'a T,
    success: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody<'a> {
    error_message: &'a str,
    success: bool,
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Outcome::Success(body) => SuccessBody { body, success: true }.serialize(serializer),
            Outcome::Failure(message) => FailureBody {
                error_message: message,
                success: false,
            }
            .serialize(serializer),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub summary: String,
    pub title: String,
    pub url: String,
}

/// One numbered cooking step. Time fields stay empty when the model had no
/// transcript to ground them in.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub step_number: i64,
    pub description: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration: Option<String>,
    pub tips: Option<String>,
}

impl RecipeStep {
    pub fn simple(step_number: i64, description: impl Into<String>) -> Self {
        RecipeStep {
            step_number,
            description: description.into(),
            start_time: None,
            end_time: None,
            duration: None,
            tips: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub dish_name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<RecipeStep>,
    pub instructions: Vec<String>,
    pub cooking_time: String,
    pub difficulty: String,
    pub servings: String,
    #[serde(rename = "url")]
    pub source_url: String,
    pub video_title: String,
}
