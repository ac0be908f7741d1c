//! Verdict extraction from free-form service replies.
//!
//! Services are asked for a JSON object but may wrap it in prose or code
//! fences, rename keys, or answer in `key: value` lines. Parsing tries, in
//! order: the first balanced JSON object in the text, then labelled lines.
//! When neither yields an accuracy flag the reply is rejected.

use crate::error::{ServiceError, ServiceResult};
use serde_json::{Map, Value};

/// The service's judgment of a caption.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisVerdict {
    /// Authoritative accuracy flag
    pub is_accurate: bool,
    /// Replacement caption, already normalized; `None` when absent or blank
    pub corrected_caption: Option<String>,
    /// Advisory confidence, never used for gating
    pub confidence: Option<f32>,
}

impl AnalysisVerdict {
    /// The correction to apply, if the verdict calls for one.
    ///
    /// An inaccurate verdict with no usable caption yields `None` and is
    /// treated like an accurate one.
    pub fn correction(&self) -> Option<&str> {
        if self.is_accurate {
            return None;
        }
        self.corrected_caption.as_deref()
    }
}

const FLAG_KEYS: &[&str] = &["isaccurate", "accurate", "accuracy", "captionaccurate"];
const CAPTION_KEYS: &[&str] = &[
    "correctedcaption",
    "corrected",
    "correction",
    "correctcaption",
    "revisedcaption",
];

const CAPTION_PREFIXES: &[&str] = &[
    "corrected caption:",
    "image caption:",
    "the caption:",
    "caption is:",
    "caption:",
    "description:",
];

/// Commentary the service tends to append after the caption itself.
const EXPLANATION_MARKERS: &[&str] = &[" - ", " because ", " since ", " (", " [", "\n"];

const MAX_CAPTION_WORDS: usize = 18;

/// Parse a service reply into a verdict.
pub fn parse_verdict(text: &str) -> ServiceResult<AnalysisVerdict> {
    let text = text.trim();
    if text.is_empty() {
        return Err(malformed("empty response"));
    }

    if let Some(verdict) = json_objects(text).find_map(|obj| verdict_from_json(&obj)) {
        return Ok(verdict);
    }
    if let Some(verdict) = verdict_from_lines(text) {
        return Ok(verdict);
    }

    Err(malformed(&format!(
        "no accuracy judgment found in reply: {}",
        preview(text)
    )))
}

/// Strip quotes, label prefixes and trailing commentary from a caption,
/// keeping at most 18 words.
pub fn clean_caption(caption: &str) -> Option<String> {
    let mut caption = trim_quotes(caption.trim());

    for prefix in CAPTION_PREFIXES {
        let matches = caption
            .get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
        if matches {
            caption = trim_quotes(caption[prefix.len()..].trim());
            break;
        }
    }

    let caption = trim_quotes(strip_explanation(caption));
    let lower = caption.to_lowercase();
    if caption.is_empty() || matches!(lower.as_str(), "null" | "none" | "n/a" | "-") {
        return None;
    }
    Some(limit_words(caption, MAX_CAPTION_WORDS))
}

/// Cut at the earliest explanation marker.
fn strip_explanation(caption: &str) -> &str {
    let end = EXPLANATION_MARKERS
        .iter()
        .filter_map(|marker| caption.find(marker))
        .min()
        .unwrap_or(caption.len());
    caption[..end].trim()
}

fn limit_words(caption: &str, max: usize) -> String {
    if caption.split_whitespace().count() <= max {
        return caption.to_string();
    }
    caption
        .split_whitespace()
        .take(max)
        .collect::<Vec<_>>()
        .join(" ")
}

fn malformed(message: &str) -> ServiceError {
    ServiceError::MalformedVerdict {
        message: message.to_string(),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn trim_quotes(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, '"' | '\'' | '`' | '\u{201c}' | '\u{201d}'))
        .trim()
}

/// Lowercase and drop everything but letters and digits.
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn parse_flag(value: &str) -> Option<bool> {
    let value = value
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_lowercase();
    let first = value.split(|c: char| !c.is_ascii_alphanumeric()).next()?;
    match first {
        "yes" | "true" | "y" | "accurate" | "correct" => Some(true),
        "no" | "false" | "n" | "inaccurate" | "incorrect" => Some(false),
        _ => None,
    }
}

fn flag_from_value(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => parse_flag(s),
        _ => None,
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    obj.iter()
        .find(|(k, _)| keys.contains(&normalize_key(k).as_str()))
        .map(|(_, v)| v)
}

fn verdict_from_json(obj: &Map<String, Value>) -> Option<AnalysisVerdict> {
    let is_accurate = lookup(obj, FLAG_KEYS).and_then(flag_from_value)?;
    let corrected_caption = lookup(obj, CAPTION_KEYS)
        .and_then(Value::as_str)
        .and_then(clean_caption);
    let confidence = obj
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c as f32);

    Some(AnalysisVerdict {
        is_accurate,
        corrected_caption,
        confidence,
    })
}

fn verdict_from_lines(text: &str) -> Option<AnalysisVerdict> {
    let mut is_accurate = None;
    let mut corrected_caption = None;
    let mut confidence = None;

    for line in text.lines() {
        let line = line.trim().trim_start_matches(['-', '*', '#', ' ']);
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = normalize_key(key);
        let value = value.trim().trim_matches('*').trim();

        if FLAG_KEYS.contains(&key.as_str()) {
            is_accurate = is_accurate.or_else(|| parse_flag(value));
        } else if CAPTION_KEYS.contains(&key.as_str()) {
            corrected_caption = corrected_caption.or_else(|| clean_caption(value));
        } else if key == "confidence" {
            confidence = confidence.or_else(|| value.parse::<f32>().ok());
        }
    }

    Some(AnalysisVerdict {
        is_accurate: is_accurate?,
        corrected_caption,
        confidence,
    })
}

/// Iterate over every balanced `{...}` span in `text` that decodes as a JSON object.
fn json_objects(text: &str) -> impl Iterator<Item = Map<String, Value>> + '_ {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .filter_map(move |(start, _)| {
            let end = balanced_end(&text[start..])?;
            match serde_json::from_str::<Value>(&text[start..start + end]) {
                Ok(Value::Object(obj)) => Some(obj),
                _ => None,
            }
        })
}

/// Byte length of the balanced object starting at `s[0] == '{'`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx + 1);
                }
            }
            _ => {}
        }
    }
    None
}
