//! 故事结构解析
//!
//! 将文本模型返回的原始文本解析为标题 + 有序页面列表。
//! 模型偶尔会用 markdown 代码块包裹 JSON，解析前先去掉。

use serde::Deserialize;
use thiserror::Error;

use super::book::Page;

/// 故事解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoryParseError {
    #[error("Story payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("Story payload has no title")]
    MissingTitle,

    #[error("Story payload has no pages")]
    NoPages,

    #[error("Story page {0} has no text")]
    MissingPageText(u32),

    #[error("No story page has an illustration description")]
    NoIllustrationPrompts,

    #[error("Story page {number} is invalid: {reason}")]
    InvalidPage { number: u32, reason: &'static str },
}

/// 解析后的故事
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryDraft {
    pub title: String,
    pub pages: Vec<StoryPage>,
}

/// 解析后的单页
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoryPage {
    pub text: String,
    pub image_prompt: String,
}

impl StoryDraft {
    /// 转换为页面实体，页码从 1 开始按顺序分配
    pub fn to_pages(&self) -> Result<Vec<Page>, StoryParseError> {
        self.pages
            .iter()
            .zip(1u32..)
            .map(|(page, number)| {
                Page::new(number, page.text.clone(), page.image_prompt.clone())
                    .map_err(|reason| StoryParseError::InvalidPage { number, reason })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct RawStory {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    pages: Option<Vec<RawPage>>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "imagePrompt", alias = "image_prompt")]
    image_prompt: Option<String>,
}

/// 去掉 ```json / ``` 代码块标记
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// 解析模型输出的故事 JSON
///
/// 要求: 非空标题、非空页面列表、每页都有正文、至少一页有插图描述。
/// 单页插图描述为空是允许的（插图阶段会跳过该页）。
pub fn parse_story(raw: &str) -> Result<StoryDraft, StoryParseError> {
    let cleaned = strip_code_fences(raw);

    let story: RawStory = match serde_json::from_str(&cleaned) {
        Ok(story) => story,
        Err(first_err) => {
            // 模型有时在 JSON 前后附带说明文字
            let candidate = outermost_object(&cleaned)
                .ok_or_else(|| StoryParseError::InvalidJson(first_err.to_string()))?;
            serde_json::from_str(candidate)
                .map_err(|e| StoryParseError::InvalidJson(e.to_string()))?
        }
    };

    let title = story
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(StoryParseError::MissingTitle)?;

    let raw_pages = story.pages.unwrap_or_default();
    if raw_pages.is_empty() {
        return Err(StoryParseError::NoPages);
    }

    let mut pages = Vec::with_capacity(raw_pages.len());
    for (raw_page, number) in raw_pages.into_iter().zip(1u32..) {
        let text = raw_page
            .text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(StoryParseError::MissingPageText(number))?;
        let image_prompt = raw_page
            .image_prompt
            .map(|p| p.trim().to_string())
            .unwrap_or_default();
        pages.push(StoryPage { text, image_prompt });
    }

    if pages.iter().all(|p| p.image_prompt.is_empty()) {
        return Err(StoryParseError::NoIllustrationPrompts);
    }

    Ok(StoryDraft { title, pages })
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_json() {
        let raw = r#"{"title":"The Castle Quest","pages":[
            {"text":"Mia saw a castle.","imagePrompt":"a girl looking at a castle"},
            {"text":"She went inside.","imagePrompt":"a girl at a castle gate"}
        ]}"#;

        let story = parse_story(raw).unwrap();
        assert_eq!(story.title, "The Castle Quest");
        assert_eq!(story.pages.len(), 2);
        assert_eq!(story.pages[1].image_prompt, "a girl at a castle gate");
    }

    #[test]
    fn test_parse_fenced_json() {
        let raw = "```json\n{\"title\":\"T\",\"pages\":[{\"text\":\"a\",\"imagePrompt\":\"b\"}]}\n```";
        let story = parse_story(raw).unwrap();
        assert_eq!(story.title, "T");
    }

    #[test]
    fn test_parse_snake_case_prompt_alias() {
        let raw = r#"{"title":"T","pages":[{"text":"a","image_prompt":"b"}]}"#;
        let story = parse_story(raw).unwrap();
        assert_eq!(story.pages[0].image_prompt, "b");
    }

    #[test]
    fn test_parse_with_preamble() {
        let raw = "Here is your story:\n{\"title\":\"T\",\"pages\":[{\"text\":\"a\",\"imagePrompt\":\"b\"}]}\nEnjoy!";
        assert!(parse_story(raw).is_ok());
    }

    #[test]
    fn test_missing_pages_rejected() {
        let raw = r#"{"title":"T"}"#;
        assert_eq!(parse_story(raw), Err(StoryParseError::NoPages));
    }

    #[test]
    fn test_empty_pages_rejected() {
        let raw = r#"{"title":"T","pages":[]}"#;
        assert_eq!(parse_story(raw), Err(StoryParseError::NoPages));
    }

    #[test]
    fn test_missing_title_rejected() {
        let raw = r#"{"title":"  ","pages":[{"text":"a","imagePrompt":"b"}]}"#;
        assert_eq!(parse_story(raw), Err(StoryParseError::MissingTitle));
    }

    #[test]
    fn test_page_without_text_rejected() {
        let raw = r#"{"title":"T","pages":[{"text":"a","imagePrompt":"b"},{"imagePrompt":"c"}]}"#;
        assert_eq!(parse_story(raw), Err(StoryParseError::MissingPageText(2)));
    }

    #[test]
    fn test_no_prompts_at_all_rejected() {
        let raw = r#"{"title":"T","pages":[{"text":"a"},{"text":"b","imagePrompt":" "}]}"#;
        assert_eq!(parse_story(raw), Err(StoryParseError::NoIllustrationPrompts));
    }

    #[test]
    fn test_single_blank_prompt_allowed() {
        let raw = r#"{"title":"T","pages":[{"text":"a"},{"text":"b","imagePrompt":"c"}]}"#;
        let story = parse_story(raw).unwrap();
        assert!(story.pages[0].image_prompt.is_empty());
    }

    #[test]
    fn test_not_json_rejected() {
        assert!(matches!(
            parse_story("once upon a time"),
            Err(StoryParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_to_pages_numbers_from_one() {
        let raw = r#"{"title":"T","pages":[{"text":"a","imagePrompt":"x"},{"text":"b","imagePrompt":"y"},{"text":"c","imagePrompt":"z"}]}"#;
        let story = parse_story(raw).unwrap();
        let pages = story.to_pages().unwrap();
        let numbers: Vec<u32> = pages.iter().map(|p| p.page_number()).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(pages.len(), story.pages.len());
        assert!(pages.iter().all(|p| p.image_url().is_none()));
    }
}
