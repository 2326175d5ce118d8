//! services/api/src/adapters/recipe_llm.rs
//!
//! This module contains the adapter for the recipe-generating LLM.
//! It implements the `RecipeGenerationService` port from the `core` crate.

const SYSTEM_INSTRUCTIONS: &str = r#"You are a cooking assistant that writes recipes.

Reply with a single JSON object and nothing else, using exactly this shape:
{
  "name": "short recipe title",
  "description": "one or two sentences",
  "ingredients": [{"name": "flour", "amount": 200, "unit": "g"}],
  "steps": [
    {
      "number": 1,
      "step": "what to do in this step",
      "ingredients": [{"name": "flour"}],
      "equipment": [{"name": "bowl"}],
      "length": {"number": 5, "unit": "minutes"}
    }
  ]
}

Rules:
- Steps are numbered from 1 without gaps.
- Omit "length" when a step has no meaningful duration.
- Keep every step to one clear action a home cook can follow while cooking."#;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use cooking_assistant_core::{
    domain::{GeneratedRecipe, RecipeDraft},
    ports::{PortError, PortResult, RecipeGenerationService},
    recipe::{draft_from_json, steps_to_json},
};
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RecipeGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiRecipeAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiRecipeAdapter {
    /// Creates a new `OpenAiRecipeAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn build_user_prompt(query: &str, previous: Option<&GeneratedRecipe>) -> String {
    match previous {
        None => format!("Write a recipe for: {}", query),
        Some(recipe) => {
            let current = serde_json::json!({
                "name": recipe.name,
                "description": recipe.description,
                "ingredients": recipe.ingredients,
                "steps": steps_to_json(&recipe.steps),
            });
            format!(
                "Here is the current recipe:\n{}\n\nRewrite it with this change: {}",
                current, query
            )
        }
    }
}

//=========================================================================================
// JSON repair
//=========================================================================================

/// Extracts the recipe object from a model reply.
///
/// Models wrap JSON in code fences, add prose around it or leave trailing
/// commas; all three are tolerated.
pub fn repair_json(reply: &str) -> PortResult<Value> {
    let fence = Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```")
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
    let unfenced = fence
        .captures(reply)
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str());

    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    let candidate = match (start, end) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => {
            return Err(PortError::Unexpected(
                "Recipe LLM reply contained no JSON object.".to_string(),
            ))
        }
    };

    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        return Ok(value);
    }

    let trailing_comma =
        Regex::new(r",\s*([}\]])").map_err(|e| PortError::Unexpected(e.to_string()))?;
    let cleaned = trailing_comma.replace_all(candidate, "$1");
    serde_json::from_str::<Value>(&cleaned).map_err(|e| {
        PortError::Unexpected(format!("Recipe LLM reply is not valid JSON: {}", e))
    })
}

//=========================================================================================
// `RecipeGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl RecipeGenerationService for OpenAiRecipeAdapter {
    async fn generate_recipe(
        &self,
        query: &str,
        previous: Option<&GeneratedRecipe>,
    ) -> PortResult<RecipeDraft> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTIONS)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(build_user_prompt(query, previous))
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .response_format(ResponseFormat::JsonObject)
            .temperature(0.7)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Unexpected(e.to_string()))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Unexpected("Recipe LLM returned no text content.".to_string())
            })?;
        debug!("Recipe LLM replied with {} characters", content.len());

        let value = repair_json(&content)?;
        draft_from_json(&value).map_err(|e| {
            warn!("Generated recipe was rejected: {}", e);
            e
        })
    }
}

/// Stand-in used when no provider key is configured.
pub struct UnconfiguredGenerator;

#[async_trait]
impl RecipeGenerationService for UnconfiguredGenerator {
    async fn generate_recipe(
        &self,
        _query: &str,
        _previous: Option<&GeneratedRecipe>,
    ) -> PortResult<RecipeDraft> {
        Err(PortError::Unexpected(
            "Recipe generation is not configured (OPENAI_API_KEY is missing)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json_is_parsed() {
        let value = repair_json(r#"{"name": "Soup", "steps": []}"#).unwrap();
        assert_eq!(value["name"], "Soup");
    }

    #[test]
    fn fenced_json_with_prose_is_extracted() {
        let reply = "Sure! Here you go:\n```json\n{\"name\": \"Soup\", \"steps\": [{\"step\": \"Boil\"}]}\n```\nEnjoy!";
        let value = repair_json(reply).unwrap();
        assert_eq!(value["steps"][0]["step"], "Boil");
    }

    #[test]
    fn trailing_commas_are_removed() {
        let reply = r#"{"name": "Soup", "steps": [{"step": "Boil",},],}"#;
        let value = repair_json(reply).unwrap();
        assert_eq!(value, json!({"name": "Soup", "steps": [{"step": "Boil"}]}));
    }

    #[test]
    fn reply_without_object_is_an_error() {
        assert!(matches!(
            repair_json("I cannot help with that."),
            Err(PortError::Unexpected(_))
        ));
    }

    #[test]
    fn refinement_prompt_embeds_the_current_recipe() {
        let now = chrono::Utc::now();
        let recipe = GeneratedRecipe {
            id: 1,
            user_id: uuid::Uuid::new_v4(),
            name: "Tomato soup".to_string(),
            description: String::new(),
            ingredients: json!([]),
            steps: Vec::new(),
            query: "soup".to_string(),
            version: 1,
            created_at: now,
            updated_at: now,
        };
        let prompt = build_user_prompt("make it vegan", Some(&recipe));
        assert!(prompt.contains("Tomato soup"));
        assert!(prompt.ends_with("make it vegan"));
    }
}
