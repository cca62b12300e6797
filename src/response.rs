use serde_json::{Map, Value};

use crate::VideoInfo;
use crate::error::{PipelineError, Result};
use crate::outcome::{Recipe, RecipeStep};

const NON_APPLICABLE_FALLBACK: &str = "Not a cooking video";

/// Trim whitespace and a surrounding markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Turn the model's recipe answer into a `Recipe`.
///
/// An `"error"` field means the model refused the task and maps to
/// `NonApplicable`. `dishName`, `cookingTime`, `difficulty` and `servings`
/// are required; list fields default to empty and every step field is
/// optional on its own. Never panics on arbitrary input.
pub fn parse_recipe_response(raw: &str, info: &VideoInfo) -> Result<Recipe> {
    let cleaned = strip_code_fence(raw);
    let json: Value = serde_json::from_str(cleaned).map_err(|e| PipelineError::ResponseParse(e.to_string()))?;
    let obj = json
        .as_object()
        .ok_or_else(|| PipelineError::ResponseParse(format!("expected a JSON object, got {}", kind(&json))))?;

    if let Some(error) = obj.get("error").filter(|v| !v.is_null()) {
        let message = as_text(error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| NON_APPLICABLE_FALLBACK.to_string());
        return Err(PipelineError::NonApplicable(message));
    }

    Ok(Recipe {
        dish_name: required_text(obj, "dishName")?,
        ingredients: text_list(obj.get("ingredients")),
        steps: steps(obj.get("steps")),
        instructions: text_list(obj.get("instructions")),
        cooking_time: required_text(obj, "cookingTime")?,
        difficulty: required_text(obj, "difficulty")?,
        servings: required_text(obj, "servings")?,
        source_url: info.canonical_url.clone(),
        video_title: info.title.clone(),
    })
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Scalars read as text; models often send `"servings": 2`.
fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_text(obj: &Map<String, Value>, field: &str) -> Result<String> {
    obj.get(field)
        .and_then(as_text)
        .ok_or_else(|| PipelineError::ResponseParse(format!("missing field {field}")))
}

fn text_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(as_text).collect())
        .unwrap_or_default()
}

fn steps(value: Option<&Value>) -> Vec<RecipeStep> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).map(step).collect())
        .unwrap_or_default()
}

fn step(obj: &Map<String, Value>) -> RecipeStep {
    let optional = |field: &str| obj.get(field).and_then(as_text);
    RecipeStep {
        step_number: obj.get("stepNumber").and_then(step_number).unwrap_or(0),
        description: optional("description").unwrap_or_default(),
        start_time: optional("startTime"),
        end_time: optional("endTime"),
        duration: optional("duration"),
        tips: optional("tips"),
    }
}

fn step_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::RecipeResult;

    fn info() -> VideoInfo {
        VideoInfo::new("dQw4w9WgXcQ", "Kimchi Stew".to_string(), "desc".to_string())
    }

    const FULL: &str = r#"{
  "dishName": "Kimchi stew",
  "ingredients": ["kimchi (200g)", "pork belly (150g)"],
  "steps": [
    {"stepNumber": 1, "description": "Prep", "startTime": "0:00", "endTime": "2:30", "duration": "2 min 30 s", "tips": "Use old kimchi"},
    {"stepNumber": 2, "description": "Boil"}
  ],
  "instructions": ["Prep", "Boil"],
  "cookingTime": "30 min",
  "difficulty": "easy",
  "servings": "2"
}"#;

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fence("```"), "");
    }

    #[test]
    fn test_parse_full_recipe() {
        let recipe = parse_recipe_response(FULL, &info()).unwrap();
        assert_eq!(recipe.dish_name, "Kimchi stew");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.steps[0].start_time.as_deref(), Some("0:00"));
        assert_eq!(recipe.steps[0].tips.as_deref(), Some("Use old kimchi"));
        assert_eq!(recipe.steps[1], RecipeStep::simple(2, "Boil"));
        assert_eq!(recipe.instructions, vec!["Prep", "Boil"]);
        assert_eq!(recipe.cooking_time, "30 min");
        assert_eq!(recipe.source_url, "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(recipe.video_title, "Kimchi Stew");
    }

    #[test]
    fn test_parse_fenced_recipe() {
        let fenced = format!("```json\n{FULL}\n```");
        let recipe = parse_recipe_response(&fenced, &info()).unwrap();
        assert_eq!(recipe.dish_name, "Kimchi stew");
    }

    #[test]
    fn test_not_a_cooking_video() {
        let err = parse_recipe_response(r#"{"error":"not a cooking video"}"#, &info()).unwrap_err();
        assert!(matches!(err, PipelineError::NonApplicable(ref m) if m == "not a cooking video"));

        let outcome = RecipeResult::from(Err::<Recipe, _>(err));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"errorMessage": "not a cooking video", "success": false})
        );
    }

    #[test]
    fn test_non_json_is_parse_error() {
        let err = parse_recipe_response("Sorry, I can't help with that.", &info()).unwrap_err();
        assert!(matches!(err, PipelineError::ResponseParse(_)));
    }

    #[test]
    fn test_truncated_json_is_parse_error() {
        let err = parse_recipe_response(&FULL[..FULL.len() / 2], &info()).unwrap_err();
        assert!(matches!(err, PipelineError::ResponseParse(_)));
    }

    #[test]
    fn test_non_object_is_parse_error() {
        let err = parse_recipe_response("[1, 2, 3]", &info()).unwrap_err();
        assert!(matches!(err, PipelineError::ResponseParse(ref m) if m.contains("an array")));
    }

    #[test]
    fn test_missing_required_field() {
        let err = parse_recipe_response(r#"{"dishName": "x", "difficulty": "easy"}"#, &info()).unwrap_err();
        assert!(matches!(err, PipelineError::ResponseParse(ref m) if m.contains("cookingTime")));
    }

    #[test]
    fn test_lists_default_to_empty() {
        let raw = r#"{"dishName": "Toast", "cookingTime": "5 min", "difficulty": "easy", "servings": "1", "steps": null}"#;
        let recipe = parse_recipe_response(raw, &info()).unwrap();
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.steps.is_empty());
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_scalars_read_as_text() {
        let raw = r#"{"dishName": "Toast", "cookingTime": 5, "difficulty": "easy", "servings": 2,
            "steps": [{"stepNumber": "3", "description": "Butter", "startTime": null}, {}, "junk"]}"#;
        let recipe = parse_recipe_response(raw, &info()).unwrap();
        assert_eq!(recipe.cooking_time, "5");
        assert_eq!(recipe.servings, "2");
        assert_eq!(recipe.steps.len(), 2);
        assert_eq!(recipe.steps[0].step_number, 3);
        assert_eq!(recipe.steps[0].start_time, None);
        assert_eq!(recipe.steps[1], RecipeStep::simple(0, ""));
    }

    #[test]
    fn test_null_error_field_is_ignored() {
        let raw = r#"{"error": null, "dishName": "Toast", "cookingTime": "5 min", "difficulty": "easy", "servings": "1"}"#;
        assert!(parse_recipe_response(raw, &info()).is_ok());
    }

    #[test]
    fn test_empty_error_message_gets_fallback() {
        let err = parse_recipe_response(r#"{"error": ""}"#, &info()).unwrap_err();
        assert_eq!(err.user_message(), NON_APPLICABLE_FALLBACK);
    }

    #[test]
    fn test_arbitrary_garbage_never_panics() {
        let inputs = ["", "```", "{", "}", "null", "\"str\"", "{\"steps\": 5}", "```json\n```", "\u{0}\u{1}"];
        for input in inputs {
            assert!(parse_recipe_response(input, &info()).is_err(), "input: {input:?}");
        }
    }
}
