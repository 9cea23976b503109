use crate::domain::model::ProfileInfo;
use crate::domain::ports::CompletionBackend;
use crate::utils::error::{Result, ScraperError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const DEFAULT_PROMPT_INSTRUCTIONS: &str = "The following text was scraped from a university faculty profile page. \
Reply with a single literal array of the form [name, email, specialization, specialization, ...]. \
Use null for any field that cannot be determined. \
Reduce the research specializations to well-known, generic subject categories and do not repeat a category. \
If the text is not a profile of a person, reply with the single word ERROR.\n\n";

const ERROR_MARKER: &str = "ERROR";
const NULL_TOKEN: &str = "null";
const GENERIC_MAILBOXES: &[&str] = &["enquiries", "inquiries", "info", "contact", "philosophy"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// 補全服務請求：單一 user 訊息，temperature 固定為 0
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
}

impl CompletionRequest {
    pub fn single_turn(model: &str, content: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: content.to_string(),
            }],
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// 取出第一個 choice 的內容並去除前後空白
pub fn completion_content(body: &str) -> Result<String> {
    let response: CompletionResponse = serde_json::from_str(body)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ScraperError::parse("completion response has no choices[0].message.content"))
}

/// 將 `[a, b, c]` 形式的回應切成 token；找不到括號時明確失敗
pub fn tokenize(content: &str) -> Result<Vec<String>> {
    let start = content
        .find('[')
        .ok_or_else(|| ScraperError::parse(format!("no '[' in completion content: {}", content)))?;
    let end = content[start..]
        .find(']')
        .map(|offset| start + offset)
        .ok_or_else(|| ScraperError::parse(format!("no ']' in completion content: {}", content)))?;

    Ok(content[start + 1..end].split(", ").map(clean_token).collect())
}

fn clean_token(raw: &str) -> String {
    let token = raw.trim();
    let token = token.strip_prefix('[').unwrap_or(token);
    let token = token.strip_suffix(']').unwrap_or(token).trim();
    for quote in ['\'', '"'] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return token[1..token.len() - 1].trim().to_string();
        }
    }
    token.to_string()
}

fn outside_brackets(content: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(content.len());
    for ch in content.chars() {
        match ch {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

fn field(token: Option<&String>) -> Option<String> {
    token
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case(NULL_TOKEN))
        .cloned()
}

/// 解析補全內容；`ERROR` 代表頁面不是個人簡介
pub fn parse_profile_info(content: &str) -> Result<ProfileInfo> {
    if outside_brackets(content).contains(ERROR_MARKER) {
        return Err(ScraperError::BogusProfile);
    }

    let tokens = tokenize(content)?;
    if tokens.len() == 1 && tokens[0] == ERROR_MARKER {
        return Err(ScraperError::BogusProfile);
    }

    let specializations = tokens
        .iter()
        .skip(2)
        .filter_map(|t| field(Some(t)))
        .collect();

    Ok(ProfileInfo::new(
        field(tokens.first()),
        field(tokens.get(1)),
        specializations,
    ))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+").expect("email pattern is valid")
    })
}

/// 在頁面文字中尋找唯一的個人信箱，忽略系所公用信箱
pub fn fallback_email(text: &str) -> Option<String> {
    let candidates: BTreeSet<&str> = email_pattern()
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches('.'))
        .filter(|email| !GENERIC_MAILBOXES.iter().any(|prefix| email.starts_with(prefix)))
        .collect();

    if candidates.len() == 1 {
        candidates.into_iter().next().map(str::to_string)
    } else {
        None
    }
}

fn faculty_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r">([a-zA-Z]+\s[a-zA-Z]+)<").expect("faculty name pattern is valid")
    })
}

/// 從教職員列表項目的 HTML 找出「名 姓」形式的文字節點，只有一個不同結果時才採用
pub fn fallback_name(faculty_entry: &str) -> Option<String> {
    let candidates: BTreeSet<&str> = faculty_name_pattern()
        .captures_iter(faculty_entry)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .collect();

    if candidates.len() == 1 {
        candidates.into_iter().next().map(str::to_string)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub prompt_instructions: String,
    pub max_content_chars: usize,
    pub email_fallback: bool,
    pub name_fallback: bool,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            prompt_instructions: DEFAULT_PROMPT_INSTRUCTIONS.to_string(),
            max_content_chars: 12_000,
            email_fallback: false,
            name_fallback: false,
        }
    }
}

pub struct ProfileExtractor<B: CompletionBackend> {
    backend: B,
    settings: ExtractorSettings,
}

impl<B: CompletionBackend> ProfileExtractor<B> {
    pub fn new(backend: B, settings: ExtractorSettings) -> Self {
        Self { backend, settings }
    }

    pub fn build_prompt(&self, text: &str) -> String {
        let mut prompt = self.settings.prompt_instructions.clone();
        if text.chars().count() > self.settings.max_content_chars {
            tracing::debug!(
                "Truncating profile text to {} chars",
                self.settings.max_content_chars
            );
            prompt.extend(text.chars().take(self.settings.max_content_chars));
        } else {
            prompt.push_str(text);
        }
        prompt
    }

    /// `faculty_entry` 是上游附帶的教職員列表 HTML，只用於姓名的後備判斷
    pub async fn extract(&self, text: &str, faculty_entry: Option<&str>) -> Result<ProfileInfo> {
        let content = self.backend.complete(&self.build_prompt(text)).await?;
        tracing::debug!("Completion content: {}", content);

        let mut info = parse_profile_info(&content)?;
        if info.name.is_none() && self.settings.name_fallback {
            info.name = faculty_entry.and_then(fallback_name);
            if let Some(name) = &info.name {
                tracing::debug!("Using name found in faculty entry: {}", name);
            }
        }
        if info.email.is_none() && self.settings.email_fallback {
            info.email = fallback_email(text);
            if let Some(email) = &info.email {
                tracing::debug!("Using email found in page text: {}", email);
            }
        }
        Ok(info)
    }
}
