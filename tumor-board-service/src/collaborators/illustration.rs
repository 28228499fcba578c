use async_trait::async_trait;
use board_sim::{IllustrationCollaborator, SimError};
use serde_json::{Value, json};
use tracing::{debug, info};

const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const GENERATE_CONTENT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Medical-illustration client backed by the Gemini image model.
///
/// Only constructed when GEMINI_API_KEY is present; without it the simulation
/// simply runs without illustrations.
pub struct NetterIllustrator {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl NetterIllustrator {
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").ok()?;
        let model =
            std::env::var("GEMINI_IMAGE_MODEL").unwrap_or_else(|_| DEFAULT_IMAGE_MODEL.to_string());
        info!(model = %model, "creating illustration client");
        Some(Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        })
    }
}

#[async_trait]
impl IllustrationCollaborator for NetterIllustrator {
    async fn generate_illustration(&self, description: &str) -> board_sim::Result<String> {
        let url = format!("{}/{}:generateContent", GENERATE_CONTENT_BASE, self.model);
        let body = json!({
            "contents": [{ "parts": [{ "text": illustration_prompt(description) }] }],
            "generationConfig": { "imageConfig": { "aspectRatio": "4:3" } }
        });

        debug!(model = %self.model, "requesting medical illustration");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| SimError::Collaborator(format!("image request failed: {}", e)))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| SimError::Collaborator(format!("image response unreadable: {}", e)))?;

        extract_inline_image(&payload)
            .ok_or_else(|| SimError::Collaborator("no image data in response".to_string()))
    }
}

fn illustration_prompt(description: &str) -> String {
    format!(
        r#"Generate a highly accurate medical illustration in the exact style of Frank Netter (The CIBA Collection of Medical Illustrations).

**Anatomical Subject**: {description}

**Style Specifications**:
1. **Technique**: Realistic watercolor and gouache with precise ink outlines.
2. **Color Palette**: Use the classic Netter palette (visceral reds, ligamentous creams, fascial greys, nerve yellows).
3. **Accuracy**: Anatomically perfect. Muscle insertions, vessel pathways, and organ relationships must be textbook-accurate.
4. **Composition**: Educational atlas view. Clean separation of structures.
5. **Background**: Pure white or very light off-white paper texture.
6. **Pathology**: The tumor/lesion should be clearly distinguishable but realistically integrated into the tissue (not a cartoon blob).

**Negative Constraints**:
- No text, labels, arrows, or leaders.
- No photorealistic digital 3D render style.
- No dark/black backgrounds.
- No blur or depth-of-field effects; keep everything in sharp educational focus."#
    )
}

/// Pull the first inline image out of a generateContent payload as a data URI.
fn extract_inline_image(payload: &Value) -> Option<String> {
    let parts = payload["candidates"][0]["content"]["parts"].as_array()?;
    for part in parts {
        let inline = &part["inlineData"];
        if let (Some(mime), Some(data)) = (inline["mimeType"].as_str(), inline["data"].as_str()) {
            return Some(format!("data:{};base64,{}", mime, data));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_image_becomes_a_data_uri() {
        let payload = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is the plate." },
                        { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                    ]
                }
            }]
        });

        assert_eq!(
            extract_inline_image(&payload).as_deref(),
            Some("data:image/png;base64,AAAA")
        );
    }

    #[test]
    fn text_only_payload_yields_no_image() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "no image" }] } }]
        });
        assert!(extract_inline_image(&payload).is_none());
    }

    #[test]
    fn prompt_embeds_the_anatomical_subject() {
        let prompt = illustration_prompt("Sagittal view of the pelvis");
        assert!(prompt.contains("Sagittal view of the pelvis"));
        assert!(prompt.contains("Netter"));
    }
}
