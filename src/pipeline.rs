use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::config::Config;
use crate::error::{PipelineError, Result};
use crate::llm::{CompletionClient, CompletionOptions};
use crate::metadata::extract_metadata;
use crate::outcome::{Outcome, Recipe, RecipeResult, Summary, SummaryResult};
use crate::prompt::{self, NO_TRANSCRIPT_PLACEHOLDER, Prompt};
use crate::response::{parse_recipe_response, strip_code_fence};
use crate::youtube::{self, Fetcher};
use crate::{Segment, VideoInfo, extract_video_id};

/// Everything a pipeline run needs besides its collaborators
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub watch_url: String,
    pub language: String,
    pub page_timeout: Duration,
    pub transcript_page_timeout: Duration,
    pub caption_timeout: Duration,
    pub caption_languages: Vec<String>,
    pub retry_attempts: u32,
    pub summary: CompletionOptions,
    pub recipe: CompletionOptions,
}

impl From<&Config> for PipelineSettings {
    fn from(config: &Config) -> Self {
        PipelineSettings {
            watch_url: config.youtube.watch_url.clone(),
            language: config.language.clone(),
            page_timeout: Duration::from_millis(config.youtube.page_timeout_ms),
            transcript_page_timeout: Duration::from_millis(config.youtube.transcript_page_timeout_ms),
            caption_timeout: Duration::from_millis(config.youtube.caption_timeout_ms),
            caption_languages: config.youtube.caption_languages.clone(),
            retry_attempts: config.retry_attempts,
            summary: config.summary.options(),
            recipe: config.recipe.options(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        PipelineSettings::from(&Config::default())
    }
}

/// Retry an async operation with exponential backoff.
///
/// `max_attempts` of 0 or 1 runs the operation once.
pub async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if attempt + 1 < max_attempts => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Summary and recipe flows, built from named stages.
///
/// Holds no per-request state; one instance serves any number of
/// concurrent requests.
pub struct Pipeline {
    fetcher: Fetcher,
    completion: Arc<dyn CompletionClient>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(fetcher: Fetcher, completion: Arc<dyn CompletionClient>, settings: PipelineSettings) -> Self {
        Pipeline {
            fetcher,
            completion,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Stage: URL to video id. Never touches the network.
    pub fn identify(&self, url: &str) -> Result<String> {
        extract_video_id(url).ok_or_else(|| PipelineError::InvalidUrl(url.trim().to_string()))
    }

    fn watch_url(&self, video_id: &str) -> String {
        format!("{}{video_id}", self.settings.watch_url)
    }

    /// Stage: fetch the watch page and scrape title and description.
    pub async fn load_video_info(&self, video_id: &str) -> Result<VideoInfo> {
        let url = self.watch_url(video_id);
        let html = retry(self.settings.retry_attempts, || {
            self.fetcher.fetch(&url, self.settings.page_timeout)
        })
        .await?;

        let (title, description) = extract_metadata(&html);
        debug!("Video {video_id}: title={title:?}");
        Ok(VideoInfo::new(video_id, title, description))
    }

    /// Stage: caption track for the video, as timed segments.
    pub async fn load_transcript(&self, video_id: &str) -> Result<Vec<Segment>> {
        let url = self.watch_url(video_id);
        retry(self.settings.retry_attempts, || {
            youtube::fetch_transcript(
                &self.fetcher,
                &url,
                &self.settings.caption_languages,
                self.settings.transcript_page_timeout,
                self.settings.caption_timeout,
            )
        })
        .await
    }

    /// Stage: one model call.
    pub async fn complete(&self, prompt: &Prompt, options: &CompletionOptions) -> Result<String> {
        retry(self.settings.retry_attempts, || {
            self.completion.complete(&prompt.system, &prompt.user, options)
        })
        .await
    }

    /// Transcript block for the recipe prompt; a failed transcript degrades
    /// to the placeholder instead of failing the run.
    async fn transcript_block(&self, video_id: &str) -> String {
        match self.load_transcript(video_id).await {
            Ok(segments) => {
                debug!("Transcript for {video_id}: {} segments", segments.len());
                prompt::render_transcript(&segments)
            }
            Err(e) => {
                warn!("Transcript for {video_id} unavailable, using metadata only: {e}");
                NO_TRANSCRIPT_PLACEHOLDER.to_string()
            }
        }
    }

    pub async fn summarize(&self, url: &str, model: Option<&str>) -> SummaryResult {
        info!("Summary requested for {url}");
        let result = self.run_summary(url, model).await;
        finish("summary", url, result)
    }

    async fn run_summary(&self, url: &str, model: Option<&str>) -> Result<Summary> {
        let video_id = self.identify(url)?;
        let info = self.load_video_info(&video_id).await?;

        let prompt = prompt::summary_prompt(&info, &self.settings.language);
        let options = self.settings.summary.clone().with_model(model);
        let text = self.complete(&prompt, &options).await?;

        let summary = strip_code_fence(&text);
        if summary.is_empty() {
            return Err(PipelineError::ResponseParse("model returned an empty summary".to_string()));
        }

        Ok(Summary {
            summary: summary.to_string(),
            title: info.title,
            url: info.canonical_url,
        })
    }

    pub async fn recipe(&self, url: &str, model: Option<&str>) -> RecipeResult {
        info!("Recipe requested for {url}");
        let result = self.run_recipe(url, model).await;
        finish("recipe", url, result)
    }

    async fn run_recipe(&self, url: &str, model: Option<&str>) -> Result<Recipe> {
        let video_id = self.identify(url)?;
        let info = self.load_video_info(&video_id).await?;
        let transcript = self.transcript_block(&video_id).await;

        let prompt = prompt::recipe_prompt(&info, &transcript, &self.settings.language);
        let options = self.settings.recipe.clone().with_model(model);
        let text = self.complete(&prompt, &options).await?;

        parse_recipe_response(&text, &info)
    }
}

fn finish<T>(flow: &str, url: &str, result: Result<T>) -> Outcome<T> {
    match &result {
        Ok(_) => info!("{flow} for {url} succeeded"),
        Err(e) => warn!("{flow} for {url} failed: {e}"),
    }
    result.into()
}
