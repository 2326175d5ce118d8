//! crates/cooking_assistant_core/src/recipe.rs
//!
//! Step normalization and the recipe source resolver.
//!
//! Catalog and generated recipes both store their instructions as a JSON array
//! of step objects (`{"number", "step", "ingredients", "equipment", "length"}`).
//! The shape is only loosely enforced, so everything that reads steps goes
//! through `normalize_steps`.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::domain::{RecipeDraft, RecipeOrigin, ResolvedRecipe, Step};
use crate::ports::{PortError, PortResult, RecipeSource};

//=========================================================================================
// Step normalization
//=========================================================================================

/// Parses a raw step array into steps ordered and numbered `1..=n`.
///
/// A null or empty array is `RecipeHasNoSteps`; anything that is not an array
/// of objects is rejected as malformed.
pub fn normalize_steps(raw: &Value) -> PortResult<Vec<Step>> {
    let items = match raw {
        Value::Null => return Err(PortError::RecipeHasNoSteps),
        Value::Array(items) => items,
        other => {
            return Err(PortError::StoreUnavailable(format!(
                "malformed steps: expected an array, got {}",
                json_kind(other)
            )))
        }
    };
    if items.is_empty() {
        return Err(PortError::RecipeHasNoSteps);
    }

    let mut keyed = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let fields = item.as_object().ok_or_else(|| {
            PortError::StoreUnavailable(format!(
                "malformed steps: element {} is {}",
                position,
                json_kind(item)
            ))
        })?;
        let order = fields
            .get("number")
            .and_then(Value::as_i64)
            .unwrap_or(position as i64 + 1);
        keyed.push((order, step_from_fields(fields)));
    }

    // Stable, so duplicate numbers keep their array order.
    keyed.sort_by_key(|(order, _)| *order);

    Ok(keyed
        .into_iter()
        .enumerate()
        .map(|(index, (_, mut step))| {
            step.number = index as i32 + 1;
            step
        })
        .collect())
}

fn step_from_fields(fields: &Map<String, Value>) -> Step {
    let text = fields
        .get("step")
        .or_else(|| fields.get("text"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Step {
        number: 0,
        text,
        ingredients: fields.get("ingredients").cloned().unwrap_or_else(|| json!([])),
        equipment: fields.get("equipment").cloned().unwrap_or_else(|| json!([])),
        length: normalize_length(fields.get("length")),
    }
}

/// `length` is optional in the source data; null or empty values become `[]`.
pub fn normalize_length(length: Option<&Value>) -> Value {
    match length {
        None | Some(Value::Null) => json!([]),
        Some(Value::String(s)) if s.trim().is_empty() => json!([]),
        Some(Value::Object(map)) if map.is_empty() => json!([]),
        Some(Value::Array(items)) if items.is_empty() => json!([]),
        Some(other) => other.clone(),
    }
}

/// Serializes steps back into the stored array shape.
pub fn steps_to_json(steps: &[Step]) -> Value {
    Value::Array(
        steps
            .iter()
            .map(|s| {
                json!({
                    "number": s.number,
                    "step": s.text,
                    "ingredients": s.ingredients,
                    "equipment": s.equipment,
                    "length": s.length,
                })
            })
            .collect(),
    )
}

/// Validates a generated recipe object into a draft.
pub fn draft_from_json(value: &Value) -> PortResult<RecipeDraft> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| PortError::Unexpected("generated recipe has no name".to_string()))?;

    let description = value
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // A bad reply from the model is not a storage fault.
    let steps = normalize_steps(value.get("steps").unwrap_or(&Value::Null)).map_err(|e| match e {
        PortError::StoreUnavailable(msg) => PortError::Unexpected(msg),
        other => other,
    })?;

    Ok(RecipeDraft {
        name: name.to_string(),
        description,
        ingredients: value
            .get("ingredients")
            .cloned()
            .unwrap_or_else(|| json!([])),
        steps,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//=========================================================================================
// Resolver
//=========================================================================================

/// Picks the catalog or generated source based on the recipe's origin.
#[derive(Clone)]
pub struct RecipeResolver {
    catalog: Arc<dyn RecipeSource>,
    generated: Arc<dyn RecipeSource>,
}

impl RecipeResolver {
    pub fn new(catalog: Arc<dyn RecipeSource>, generated: Arc<dyn RecipeSource>) -> Self {
        Self { catalog, generated }
    }

    pub async fn resolve(
        &self,
        user_id: Uuid,
        recipe_id: i64,
        origin: RecipeOrigin,
    ) -> PortResult<ResolvedRecipe> {
        let source = match origin {
            RecipeOrigin::Catalog => &self.catalog,
            RecipeOrigin::Generated => &self.generated,
        };
        let recipe = source.load(user_id, recipe_id).await?;
        if recipe.steps.is_empty() {
            return Err(PortError::RecipeHasNoSteps);
        }
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_sorted_and_renumbered() {
        let raw = json!([
            {"number": 3, "step": "Serve"},
            {"number": 1, "step": "Chop"},
            {"number": 2, "step": "Fry", "length": {"number": 10, "unit": "minutes"}},
        ]);

        let steps = normalize_steps(&raw).unwrap();

        let texts: Vec<_> = steps.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Chop", "Fry", "Serve"]);
        assert_eq!(steps.iter().map(|s| s.number).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(steps[1].length, json!({"number": 10, "unit": "minutes"}));
    }

    #[test]
    fn gaps_in_numbering_are_closed() {
        let raw = json!([{"number": 5, "step": "b"}, {"number": 2, "step": "a"}]);
        let steps = normalize_steps(&raw).unwrap();
        assert_eq!(steps[0].number, 1);
        assert_eq!(steps[0].text, "a");
        assert_eq!(steps[1].number, 2);
    }

    #[test]
    fn missing_length_defaults_to_empty_array() {
        let raw = json!([
            {"number": 1, "step": "a"},
            {"number": 2, "step": "b", "length": null},
            {"number": 3, "step": "c", "length": {}},
            {"number": 4, "step": "d", "length": ""},
        ]);
        for step in normalize_steps(&raw).unwrap() {
            assert_eq!(step.length, json!([]), "step {}", step.number);
        }
    }

    #[test]
    fn ingredients_and_equipment_pass_through() {
        let ingredients = json!([{"id": 1, "name": "salt", "image": "salt.jpg"}]);
        let raw = json!([{"number": 1, "step": "Season", "ingredients": ingredients, "equipment": [{"name": "pan"}]}]);
        let steps = normalize_steps(&raw).unwrap();
        assert_eq!(steps[0].ingredients, ingredients);
        assert_eq!(steps[0].equipment, json!([{"name": "pan"}]));
    }

    #[test]
    fn empty_or_null_steps_are_rejected() {
        assert_eq!(normalize_steps(&json!([])), Err(PortError::RecipeHasNoSteps));
        assert_eq!(normalize_steps(&Value::Null), Err(PortError::RecipeHasNoSteps));
    }

    #[test]
    fn non_array_steps_are_malformed() {
        assert!(matches!(
            normalize_steps(&json!({"step": "x"})),
            Err(PortError::StoreUnavailable(msg)) if msg.starts_with("malformed steps")
        ));
        assert!(matches!(
            normalize_steps(&json!(["just text"])),
            Err(PortError::StoreUnavailable(msg)) if msg.starts_with("malformed steps")
        ));
    }

    #[test]
    fn draft_requires_name_and_steps() {
        let ok = json!({"name": " Soup ", "steps": [{"step": "Boil water"}]});
        let draft = draft_from_json(&ok).unwrap();
        assert_eq!(draft.name, "Soup");
        assert_eq!(draft.steps[0].number, 1);
        assert_eq!(draft.ingredients, json!([]));

        let no_steps = json!({"name": "Soup", "steps": []});
        assert_eq!(draft_from_json(&no_steps).unwrap_err(), PortError::RecipeHasNoSteps);

        let no_name = json!({"steps": [{"step": "Boil"}]});
        assert!(matches!(draft_from_json(&no_name), Err(PortError::Unexpected(_))));

        let text_steps = json!({"name": "Soup", "steps": "boil it"});
        assert!(matches!(draft_from_json(&text_steps), Err(PortError::Unexpected(_))));
    }

    #[test]
    fn stored_shape_normalizes_back_to_the_same_steps() {
        let raw = json!([{"number": 1, "step": "a", "length": {"number": 1, "unit": "minutes"}}]);
        let steps = normalize_steps(&raw).unwrap();
        assert_eq!(normalize_steps(&steps_to_json(&steps)).unwrap(), steps);
    }
}
