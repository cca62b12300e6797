use crate::{Segment, VideoInfo};

pub const NO_TRANSCRIPT_PLACEHOLDER: &str = "No transcript available - analyze the title and description only";

/// System and user message for one completion call
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

const SUMMARY_SYSTEM: &str = "You are an expert at summarizing YouTube videos. \
Using only the title and description you are given, summarize the video's key content.

Rules:
1. Answer in {language}, always.
2. Summarize in 3 to 5 main points.
3. Keep every point short and clear.
4. Cover the video's topic and its core message.
5. Leave out anything that is not essential.

Response format:
📺 **Video summary**

**Main points:**
• [point 1]
• [point 2]
• [point 3]

**Core message:**
[the video's main message or conclusion]";

const RECIPE_SYSTEM: &str = r#"You are a professional chef and video analyst.
Analyze the transcript and metadata of a YouTube cooking video and extract an accurate recipe with timestamps.

Input:
1. The video title and description
2. The transcript, one line per caption as "[M:SS] text"

Ingredient rules:
1. Extract every ingredient mentioned in the transcript together with its quantity.
2. Use concrete amounts such as "1 onion", "2 tbsp soy sauce", "a pinch of salt".
3. Estimate a typical amount when the transcript does not state one.
4. Order main ingredients first, then secondary ingredients, then seasoning.

Step and timestamp rules:
1. Find when each real cooking step happens using the transcript timestamps.
2. Give the exact start and end time of every step as they appear in the transcript.
3. Split steps on concrete actions such as "prep", "start frying", "add water", "finish".
4. Put the cook's tips and warnings into the step they belong to.
5. Only use times that actually appear in the transcript.

Write all text values in {language}.

Respond with exactly one JSON object and nothing else, in this shape:
{
  "dishName": "name of the dish",
  "ingredients": ["main ingredient (amount)", "secondary ingredient (amount)", "seasoning (amount)"],
  "steps": [
    {
      "stepNumber": 1,
      "description": "Prep: concrete description",
      "startTime": "0:00",
      "endTime": "2:30",
      "duration": "2 min 30 s",
      "tips": "tip or warning"
    }
  ],
  "instructions": ["Prep: concrete description"],
  "cookingTime": "total cooking time, e.g. 30 min",
  "difficulty": "easy / medium / hard",
  "servings": "e.g. 2-3 servings"
}

Only if the video has nothing to do with cooking or food, respond with:
{
  "error": "Not a cooking video"
}"#;

/// Summary mode: metadata only, bullet points plus a core message.
pub fn summary_prompt(info: &VideoInfo, language: &str) -> Prompt {
    Prompt {
        system: SUMMARY_SYSTEM.replace("{language}", language),
        user: format!("Summarize the following YouTube video:\n\n{}", info.content_for_prompt()),
    }
}

/// Recipe mode: metadata plus a rendered transcript block (or the placeholder).
pub fn recipe_prompt(info: &VideoInfo, transcript: &str, language: &str) -> Prompt {
    let user = format!(
        "Analyze this YouTube cooking video and extract the recipe with timestamps.

=== Video ===
{}

=== Transcript (with timestamps) ===
{}

Requirements:
1. Extract the ingredients and exact amounts mentioned in the transcript.
2. Base every step's timing on the transcript timestamps.
3. Give each step's start and end time from the transcript.
4. Include the cook's tips and warnings.
5. If there is no transcript, build a typical recipe from the title and description.

Respond with JSON only.",
        info.content_for_prompt(),
        transcript
    );

    Prompt {
        system: RECIPE_SYSTEM.replace("{language}", language),
        user,
    }
}

/// One `[M:SS] text` line per segment, in the order given.
pub fn render_transcript(segments: &[Segment]) -> String {
    if segments.is_empty() {
        return NO_TRANSCRIPT_PLACEHOLDER.to_string();
    }

    segments
        .iter()
        .map(|s| format!("[{}] {}", s.start_label, s.text))
        .collect::<Vec<_>>()
        .join("\n")
}
