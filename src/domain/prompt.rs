//! 故事提示词构建
//!
//! 根据绘本输入字段和画风描述拼出发送给文本模型的提示词

use std::collections::HashMap;

use super::book::BookInput;

/// 默认画风
pub const DEFAULT_ART_STYLE: &str = "watercolor";

/// 内置画风表（画风标识 → 描述）
pub const BUILTIN_ART_STYLES: &[(&str, &str)] = &[
    (
        "watercolor",
        "soft watercolor illustration, gentle washes of color, hand-painted storybook feel, warm and inviting",
    ),
    (
        "whimsical",
        "whimsical cartoon illustration, playful exaggerated features, bright cheerful colors, fun and bouncy",
    ),
    (
        "soft_pastel",
        "soft pastel illustration, dreamy gentle palette, cotton candy colors, soothing and warm",
    ),
    (
        "bold_pop",
        "bold colorful pop art illustration, vibrant saturated colors, graphic and punchy, modern picture book",
    ),
    (
        "fantasy",
        "fantasy illustration, magical ethereal atmosphere, glowing light effects, enchanted and dreamy",
    ),
    (
        "classic",
        "classic children's book illustration, timeless warm style, detailed and cozy, like Beatrix Potter",
    ),
];

/// 内置画风表
pub fn builtin_art_styles() -> HashMap<String, String> {
    BUILTIN_ART_STYLES
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 画风目录
///
/// 未知或缺失的画风标识回退到默认画风
#[derive(Debug, Clone)]
pub struct ArtStyleCatalog {
    styles: HashMap<String, String>,
    default_style: String,
}

impl Default for ArtStyleCatalog {
    fn default() -> Self {
        Self::new(builtin_art_styles(), DEFAULT_ART_STYLE)
    }
}

impl ArtStyleCatalog {
    pub fn new(styles: HashMap<String, String>, default_style: impl Into<String>) -> Self {
        Self {
            styles,
            default_style: default_style.into(),
        }
    }

    pub fn contains(&self, selector: &str) -> bool {
        self.styles.contains_key(selector)
    }

    /// 获取画风描述
    pub fn describe(&self, selector: &str) -> &str {
        self.styles
            .get(selector.trim())
            .or_else(|| self.styles.get(&self.default_style))
            .map(String::as_str)
            .unwrap_or(BUILTIN_ART_STYLES[0].1)
    }
}

/// 构建故事生成提示词
pub fn build_story_prompt(input: &BookInput, style_description: &str) -> String {
    let name = input.character_name.trim();
    let age_line = input
        .character_age
        .map(|age| age.to_string())
        .unwrap_or_else(|| "young child".to_string());
    let age_phrase = input
        .character_age
        .map(|age| age.to_string())
        .unwrap_or_else(|| "young".to_string());

    let inclusions = input
        .included_elements
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .map(|e| format!("- {}", e))
        .collect::<Vec<_>>();
    let inclusions = if inclusions.is_empty() {
        "- (none specified)".to_string()
    } else {
        inclusions.join("\n")
    };

    format!(
        r#"You are a beloved children's book author creating a personalized storybook.

CHARACTER:
- Name: {name}
- Age: {age_line}

STORY REQUEST FROM THE PARENT:
"{request}"

ELEMENTS TO INCLUDE:
{inclusions}

ART STYLE: {style}

INSTRUCTIONS:
1. Write a 12-page children's picture book (2-4 sentences per page, age-appropriate)
2. Create a charming title
3. Give the story a clear beginning, middle, and satisfying ending
4. Naturally weave in {name}'s name and the requested elements
5. Make it warm, imaginative, and positive

For EACH page, also write an IMAGE_PROMPT describing what the illustration should depict:
- Describe the scene, characters, actions, and mood
- Include "{style}" as the style reference
- Be specific enough for an AI image generator
- The main character is a {age_phrase} year old child named {name}
- Do NOT include any text or words in the illustration

Return ONLY this JSON (no markdown fences, no extra text):
{{
  "title": "The Book Title",
  "pages": [
    {{ "text": "Story text for this page.", "imagePrompt": "Detailed scene description for illustration..." }}
  ]
}}"#,
        request = input.story_prompt.trim(),
        style = style_description,
    )
}
