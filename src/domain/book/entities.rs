//! Book Context - Entities

use serde::{Deserialize, Serialize};

/// 绘本页 - 最小的文本 + 插图单位
///
/// 不变量:
/// - page_number 从 1 开始，连续，与生成顺序一致
/// - image_url 只有在插图生成成功后才存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    page_number: u32,
    text: String,
    image_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image_url: Option<String>,
}

impl Page {
    pub fn new(
        page_number: u32,
        text: impl Into<String>,
        image_prompt: impl Into<String>,
    ) -> Result<Self, &'static str> {
        if page_number == 0 {
            return Err("page numbers start at 1");
        }
        Ok(Self {
            page_number,
            text: text.into(),
            image_prompt: image_prompt.into(),
            image_url: None,
        })
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_prompt(&self) -> &str {
        &self.image_prompt
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn has_illustration(&self) -> bool {
        self.image_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn attach_illustration(&mut self, url: impl Into<String>) {
        self.image_url = Some(url.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_zero_rejected() {
        assert!(Page::new(0, "text", "prompt").is_err());
    }

    #[test]
    fn test_attach_illustration() {
        let mut page = Page::new(1, "Once upon a time", "a castle").unwrap();
        assert!(!page.has_illustration());

        page.attach_illustration("https://img.example/1.png");
        assert!(page.has_illustration());
        assert_eq!(page.image_url(), Some("https://img.example/1.png"));
    }

    #[test]
    fn test_page_serializes_camel_case() {
        let page = Page::new(2, "text", "prompt").unwrap();
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["pageNumber"], 2);
        assert_eq!(json["imagePrompt"], "prompt");
        assert!(json.get("imageUrl").is_none());
    }
}
