use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const MIN_SERVINGS: u32 = 1;
pub const MAX_SERVINGS: u32 = 20;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Ingredient {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Ingredient {
    pub fn new(name: &str, amount: Option<f64>, unit: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            amount,
            unit: unit.map(str::to_string),
        }
    }

    /// A free-text ingredient line with no structured quantity.
    pub fn from_text(line: &str) -> Self {
        Self {
            name: line.trim().to_string(),
            amount: None,
            unit: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct IngredientGroup {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<Ingredient>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Recipe {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub servings: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_ingredient_groups")]
    pub ingredients: Vec<IngredientGroup>,
}

impl Recipe {
    /// Stored servings, or 1 when missing.
    pub fn base_servings(&self) -> f64 {
        self.servings.unwrap_or(1.0)
    }

    /// Ingredient amounts rescaled from the stored servings to `target_servings`.
    pub fn scaled_ingredients(&self, target_servings: u32) -> Vec<IngredientGroup> {
        let base = self.base_servings();
        let factor = if base > 0.0 {
            f64::from(target_servings) / base
        } else {
            1.0
        };
        scale_groups(&self.ingredients, factor)
    }
}

pub fn scale_groups(groups: &[IngredientGroup], factor: f64) -> Vec<IngredientGroup> {
    groups
        .iter()
        .map(|group| IngredientGroup {
            title: group.title.clone(),
            items: group
                .items
                .iter()
                .map(|ingredient| Ingredient {
                    amount: ingredient.amount.map(|amount| amount * factor),
                    ..ingredient.clone()
                })
                .collect(),
        })
        .collect()
}

pub fn clamp_servings(requested: i64) -> u32 {
    requested.clamp(i64::from(MIN_SERVINGS), i64::from(MAX_SERVINGS)) as u32
}

/// All ingredients of all groups, in display order.
pub fn flatten_groups(groups: &[IngredientGroup]) -> Vec<&Ingredient> {
    groups.iter().flat_map(|group| group.items.iter()).collect()
}

/// Decodes whatever shape a stored ingredient payload has.
///
/// Accepts an array of groups, a flat array of ingredients (wrapped in one
/// untitled group), a JSON string holding either, or plain text lines.
pub fn decode_ingredient_groups(value: &Value) -> Vec<IngredientGroup> {
    match value {
        Value::Array(entries) => decode_array(entries),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(entries)) => decode_array(&entries),
            Ok(_) => Vec::new(),
            Err(_) => text_lines_group(raw),
        },
        _ => Vec::new(),
    }
}

fn decode_array(entries: &[Value]) -> Vec<IngredientGroup> {
    if entries.is_empty() {
        return Vec::new();
    }

    let grouped = matches!(
        entries.first(),
        Some(Value::Object(first)) if matches!(first.get("items"), Some(Value::Array(_)))
    );

    if grouped {
        entries
            .iter()
            .filter_map(|entry| entry.as_object())
            .map(|group| IngredientGroup {
                title: group
                    .get("title")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                items: group
                    .get("items")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(decode_ingredient).collect())
                    .unwrap_or_default(),
            })
            .collect()
    } else {
        vec![IngredientGroup {
            title: String::new(),
            items: entries.iter().filter_map(decode_ingredient).collect(),
        }]
    }
}

fn decode_ingredient(value: &Value) -> Option<Ingredient> {
    match value {
        Value::String(line) => Some(Ingredient::from_text(line)),
        Value::Object(fields) => Some(Ingredient {
            name: match fields.get("name") {
                Some(Value::String(name)) => name.clone(),
                Some(Value::Number(number)) => number.to_string(),
                _ => String::new(),
            },
            amount: fields.get("amount").and_then(coerce_amount),
            unit: fields
                .get("unit")
                .and_then(Value::as_str)
                .map(str::to_string),
        }),
        _ => None,
    }
}

fn text_lines_group(raw: &str) -> Vec<IngredientGroup> {
    let items: Vec<Ingredient> = raw
        .split(['\n', ','])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Ingredient::from_text)
        .collect();

    if items.is_empty() {
        Vec::new()
    } else {
        vec![IngredientGroup {
            title: String::new(),
            items,
        }]
    }
}

/// Numbers pass through, numeric strings are parsed, everything else is absent.
fn coerce_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn deserialize_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_amount))
}

fn deserialize_ingredient_groups<'de, D>(deserializer: D) -> Result<Vec<IngredientGroup>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(decode_ingredient_groups(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_grouped_ingredients() {
        let value = json!([
            { "title": "Dough", "items": [{ "name": "Flour", "amount": 500, "unit": "g" }] },
            { "title": "Topping", "items": [{ "name": "Sugar", "amount": "2", "unit": "tbsp" }, "salt to taste"] }
        ]);
        let groups = decode_ingredient_groups(&value);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].title, "Dough");
        assert_eq!(groups[0].items[0], Ingredient::new("Flour", Some(500.0), Some("g")));
        assert_eq!(groups[1].items[0].amount, Some(2.0));
        assert_eq!(groups[1].items[1], Ingredient::from_text("salt to taste"));
    }

    #[test]
    fn test_decode_flat_list_becomes_single_group() {
        let value = json!([
            { "name": "Banana", "amount": 200, "unit": "g" },
            { "name": "Milk", "amount": null, "unit": null }
        ]);
        let groups = decode_ingredient_groups(&value);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].title, "");
        assert_eq!(groups[0].items.len(), 2);
        assert_eq!(groups[0].items[1].amount, None);
        assert_eq!(groups[0].items[1].unit, None);
    }

    #[test]
    fn test_decode_json_string_payload() {
        let value = json!(r#"[{"name":"Egg","amount":2,"unit":"pcs"}]"#);
        let groups = decode_ingredient_groups(&value);
        assert_eq!(groups[0].items[0], Ingredient::new("Egg", Some(2.0), Some("pcs")));
    }

    #[test]
    fn test_decode_plain_text_payload() {
        let value = json!("2 eggs\n100 g flour, pinch of salt\n");
        let groups = decode_ingredient_groups(&value);
        let names: Vec<&str> = groups[0].items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["2 eggs", "100 g flour", "pinch of salt"]);
        assert!(groups[0].items.iter().all(|i| i.amount.is_none()));
    }

    #[test]
    fn test_decode_unusable_payloads_yield_nothing() {
        assert!(decode_ingredient_groups(&json!(null)).is_empty());
        assert!(decode_ingredient_groups(&json!({ "name": "x" })).is_empty());
        assert!(decode_ingredient_groups(&json!([])).is_empty());
        assert!(decode_ingredient_groups(&json!("")).is_empty());
    }

    #[test]
    fn test_non_numeric_amount_is_absent() {
        let ingredient: Ingredient =
            serde_json::from_value(json!({ "name": "Salt", "amount": "a bit", "unit": "pinch" }))
                .unwrap();
        assert_eq!(ingredient.amount, None);
    }

    #[test]
    fn test_recipe_deserializes_any_ingredient_shape() {
        let recipe: Recipe = serde_json::from_value(json!({
            "slug": "banana-bread",
            "servings": "4",
            "ingredients": "[{\"name\":\"Banana\",\"amount\":3,\"unit\":\"pcs\"}]"
        }))
        .unwrap();
        assert_eq!(recipe.servings, Some(4.0));
        assert_eq!(flatten_groups(&recipe.ingredients).len(), 1);
    }

    #[test]
    fn test_scaling_follows_servings_ratio() {
        let recipe = Recipe {
            slug: "pancakes".to_string(),
            title: "Pancakes".to_string(),
            servings: Some(2.0),
            ingredients: vec![IngredientGroup {
                title: String::new(),
                items: vec![
                    Ingredient::new("Flour", Some(200.0), Some("g")),
                    Ingredient::from_text("butter for the pan"),
                ],
            }],
        };
        let scaled = recipe.scaled_ingredients(6);
        assert_eq!(scaled[0].items[0].amount, Some(600.0));
        assert_eq!(scaled[0].items[1].amount, None);
        assert_eq!(scaled[0].items[0].unit.as_deref(), Some("g"));
    }

    #[test]
    fn test_scaling_with_invalid_base_keeps_amounts() {
        let recipe = Recipe {
            slug: "odd".to_string(),
            title: String::new(),
            servings: Some(0.0),
            ingredients: vec![IngredientGroup {
                title: String::new(),
                items: vec![Ingredient::new("Rice", Some(80.0), Some("g"))],
            }],
        };
        assert_eq!(recipe.scaled_ingredients(4)[0].items[0].amount, Some(80.0));
    }

    #[test]
    fn test_clamp_servings() {
        assert_eq!(clamp_servings(0), 1);
        assert_eq!(clamp_servings(7), 7);
        assert_eq!(clamp_servings(25), 20);
        assert_eq!(clamp_servings(-3), 1);
    }
}
