use serde::Serialize;

use crate::outcome::{Outcome, Recipe, RecipeResult, RecipeStep, SummaryResult};

/// Render any result as the JSON the HTTP surface would return
pub fn render_json<T: Serialize>(outcome: &Outcome<T>) -> String {
    serde_json::to_string_pretty(outcome).unwrap_or_default()
}

pub fn render_summary(outcome: &SummaryResult) -> String {
    match outcome {
        Outcome::Success(s) => format!("{}\n{}\n\n{}", s.title, s.url, s.summary),
        Outcome::Failure(message) => format!("error: {message}"),
    }
}

pub fn render_recipe(outcome: &RecipeResult) -> String {
    match outcome {
        Outcome::Success(recipe) => render_recipe_text(recipe),
        Outcome::Failure(message) => format!("error: {message}"),
    }
}

fn render_recipe_text(recipe: &Recipe) -> String {
    let mut lines = vec![
        recipe.dish_name.clone(),
        format!("Video: {} ({})", recipe.video_title, recipe.source_url),
        format!(
            "Cooking time: {} | Difficulty: {} | Servings: {}",
            recipe.cooking_time, recipe.difficulty, recipe.servings
        ),
        String::new(),
        "Ingredients:".to_string(),
    ];
    lines.extend(recipe.ingredients.iter().map(|i| format!("- {i}")));

    lines.push(String::new());
    lines.push("Steps:".to_string());
    if recipe.steps.is_empty() {
        lines.extend(
            recipe
                .instructions
                .iter()
                .enumerate()
                .map(|(n, text)| format!("{}. {text}", n + 1)),
        );
    } else {
        for step in &recipe.steps {
            lines.extend(render_step(step));
        }
    }

    lines.join("\n")
}

fn render_step(step: &RecipeStep) -> Vec<String> {
    let span = match (&step.start_time, &step.end_time) {
        (Some(start), Some(end)) => format!("[{start}-{end}] "),
        (Some(start), None) => format!("[{start}] "),
        _ => String::new(),
    };
    let duration = step.duration.as_ref().map(|d| format!(" ({d})")).unwrap_or_default();

    let mut lines = vec![format!("{}. {span}{}{duration}", step.step_number, step.description)];
    if let Some(tips) = step.tips.as_deref().filter(|t| !t.is_empty()) {
        lines.push(format!("   Tip: {tips}"));
    }
    lines
}
