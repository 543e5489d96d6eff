//! Wire types for Gemini `generateContent`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct GenerateContentRequest<'a> {
    pub(crate) contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RequestContent<'a> {
    pub(crate) parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TextPart<'a> {
    pub(crate) text: &'a str,
}

impl<'a> GenerateContentRequest<'a> {
    pub(crate) fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![TextPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    pub(crate) candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Candidate {
    #[serde(default)]
    pub(crate) content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CandidateContent {
    #[serde(default)]
    pub(crate) parts: Vec<ResponsePart>,
}

// text parts are ignored, only inline data matters here
#[derive(Debug, Deserialize)]
pub(crate) struct ResponsePart {
    #[serde(default, rename = "inlineData", alias = "inline_data")]
    pub(crate) inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InlineData {
    #[serde(default, rename = "mimeType", alias = "mime_type")]
    pub(crate) mime_type: Option<String>,
    #[serde(default)]
    pub(crate) data: Option<String>,
}

impl GenerateContentResponse {
    /// First inline payload with non-empty data, across all candidates.
    pub(crate) fn into_first_image(self) -> Option<InlineData> {
        self.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.inline_data)
            .find(|inline| inline.data.as_deref().is_some_and(|data| !data.is_empty()))
    }
}
