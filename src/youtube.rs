use std::sync::LazyLock;
use std::time::Duration;

use log::debug;
use regex::Regex;
use serde::Deserialize;

use crate::Segment;
use crate::error::{PipelineError, Result};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

const PLAYER_RESPONSE_MARKER: &str = "ytInitialPlayerResponse";

static PLAYER_RESPONSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"var ytInitialPlayerResponse = (\{.*?\});").unwrap());
static CAPTION_TRACKS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""captionTracks":\[(.*?)\]"#).unwrap());
static BASE_URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""baseUrl":"(.*?)""#).unwrap());

/// Plain GET with a desktop browser user agent. One attempt per call.
#[derive(Debug, Clone, Default)]
pub struct Fetcher {
    client: reqwest::Client,
}

impl Fetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Fetcher { client }
    }

    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String> {
        debug!("GET {url} (timeout {timeout:?})");

        let resp = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| request_error(url, timeout, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::fetch(url, format!("HTTP status {status}")));
        }

        resp.text().await.map_err(|e| request_error(url, timeout, e))
    }
}

fn request_error(url: &str, timeout: Duration, e: reqwest::Error) -> PipelineError {
    if e.is_timeout() {
        PipelineError::fetch(url, format!("timed out after {timeout:?}"))
    } else {
        PipelineError::fetch(url, e)
    }
}

#[derive(Debug, Deserialize)]
struct PlayerResponse {
    captions: Option<CaptionsData>,
}

#[derive(Debug, Deserialize)]
struct CaptionsData {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    player_captions_tracklist_renderer: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
struct CaptionTracklistRenderer {
    #[serde(rename = "captionTracks")]
    caption_tracks: Option<Vec<CaptionTrack>>,
}

#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: Option<String>,
}

/// Find the caption track URL embedded in a watch page.
///
/// The player configuration object assigned to `ytInitialPlayerResponse` is
/// cut out with a string-aware brace scan and deserialized. If that object
/// cannot be isolated or parsed, a pattern match over the raw markup is
/// tried instead (first track only). The URL is returned JSON-unescaped and
/// percent-decoded.
///
/// Track choice: the first track whose language appears in `preferred`, in
/// `preferred` order, else the first track listed. `None` means the page
/// offers no usable captions; callers treat that as a soft failure.
pub fn resolve_caption_url(html: &str, preferred: &[String]) -> Option<String> {
    let raw = match structural_caption_tracks(html) {
        Some(tracks) => select_track(&tracks, preferred)?.base_url.clone(),
        None => {
            debug!("player response not parseable, falling back to pattern scan");
            pattern_caption_url(html)?
        }
    };
    Some(decode_caption_url(&raw))
}

fn structural_caption_tracks(html: &str) -> Option<Vec<CaptionTrack>> {
    let json = player_response_json(html)?;
    let response: PlayerResponse = serde_json::from_str(json).ok()?;
    Some(
        response
            .captions
            .and_then(|c| c.player_captions_tracklist_renderer)
            .and_then(|r| r.caption_tracks)
            .unwrap_or_default(),
    )
}

fn player_response_json(html: &str) -> Option<&str> {
    html.match_indices(PLAYER_RESPONSE_MARKER).find_map(|(idx, marker)| {
        let rest = html[idx + marker.len()..].trim_start();
        let rest = rest.strip_prefix('=')?.trim_start();
        balanced_object(rest)
    })
}

/// Return the leading `{...}` of `s`, honouring string literals and escapes.
fn balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in s.bytes().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

fn pattern_caption_url(html: &str) -> Option<String> {
    let player_response = PLAYER_RESPONSE_RE.captures(html)?.get(1)?.as_str();
    let tracks = CAPTION_TRACKS_RE.captures(player_response)?.get(1)?.as_str();
    let base_url = BASE_URL_RE.captures(tracks)?.get(1)?.as_str();
    Some(base_url.to_string())
}

fn select_track<'a>(tracks: &'a [CaptionTrack], preferred: &[String]) -> Option<&'a CaptionTrack> {
    preferred
        .iter()
        .find_map(|lang| tracks.iter().find(|t| t.language_code.as_deref() == Some(lang.as_str())))
        .or_else(|| tracks.first())
}

fn decode_caption_url(raw: &str) -> String {
    let unescaped = raw.replace("\\u0026", "&").replace("\\/", "/").replace('+', " ");
    match urlencoding::decode(&unescaped) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unescaped,
    }
}

/// Fetch the watch page again, resolve its caption track and parse it.
///
/// Every failure comes back as `TranscriptUnavailable`.
pub async fn fetch_transcript(
    fetcher: &Fetcher,
    watch_url: &str,
    preferred: &[String],
    page_timeout: Duration,
    caption_timeout: Duration,
) -> Result<Vec<Segment>> {
    let page_html = fetcher
        .fetch(watch_url, page_timeout)
        .await
        .map_err(|e| PipelineError::TranscriptUnavailable(e.to_string()))?;

    let caption_url = resolve_caption_url(&page_html, preferred)
        .ok_or_else(|| PipelineError::TranscriptUnavailable(format!("no caption track on {watch_url}")))?;
    debug!("Using caption track: {caption_url}");

    let caption_xml = fetcher
        .fetch(&caption_url, caption_timeout)
        .await
        .map_err(|e| PipelineError::TranscriptUnavailable(e.to_string()))?;

    parse_caption_xml(&caption_xml)
}

/// Parse timed-text XML into segments, in document order.
///
/// Elements without numeric `start`/`dur` attributes or with blank text are
/// skipped. Entities are decoded twice since the platform double-escapes
/// some of them (`&amp;#39;`).
pub fn parse_caption_xml(xml: &str) -> Result<Vec<Segment>> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut current_dur: Option<f64> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.name().as_ref() == b"text" => {
                let mut start = None;
                let mut dur = None;
                for attr in e.attributes().flatten() {
                    match attr.key.as_ref() {
                        b"start" => {
                            start = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        b"dur" => {
                            dur = String::from_utf8_lossy(&attr.value).parse::<f64>().ok();
                        }
                        _ => {}
                    }
                }
                current_start = start;
                current_dur = dur;
            }
            Ok(Event::End(_)) => {
                current_start = None;
                current_dur = None;
            }
            Ok(Event::Text(ref e)) => {
                if let (Some(start), Some(dur)) = (current_start.take(), current_dur.take()) {
                    let raw_text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                    let text = html_escape::decode_html_entities(&raw_text);
                    let text = text.trim();
                    if !text.is_empty() {
                        segments.push(Segment::new(text, start, dur));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PipelineError::TranscriptUnavailable(format!(
                    "error parsing caption XML: {e}"
                )));
            }
            _ => {}
        }
    }

    Ok(segments)
}
