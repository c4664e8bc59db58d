//! Spoonacular adapter for ostomate
//!
//! Premium ingredient data. The search endpoint returns names only, so the
//! top hits are enriched with a per-ingredient information call; a failed
//! enrichment keeps the bare record.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use futures_util::future::join_all;
use ostomate_core::{
    get_env_opt, get_env_or, null_as_default, FoodProvider, FoodRecord, Nutrient,
    NutritionPer100g, OstomateError, ProviderId, Result,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, warn};

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com";

/// How many search hits get the extra information call
pub const ENRICH_TOP: usize = 5;

const IMAGE_BASE_URL: &str = "https://spoonacular.com/cdn/ingredients_100x100";

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default()
        })
        .clone()
}

/// Adapter settings
#[derive(Debug, Clone)]
pub struct SpoonacularConfig {
    /// Spoonacular API key
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
}

impl SpoonacularConfig {
    /// Settings with the default API root
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read `SPOONACULAR_API_KEY` and `SPOONACULAR_BASE_URL`.
    ///
    /// Returns `None` when no key is configured; the adapter is then left out.
    pub fn from_env() -> Option<Self> {
        let api_key = get_env_opt("SPOONACULAR_API_KEY").filter(|k| !k.trim().is_empty())?;
        Some(Self {
            api_key,
            base_url: get_env_or("SPOONACULAR_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

/// Premium provider backed by Spoonacular
pub struct SpoonacularProvider {
    client: Client,
    config: SpoonacularConfig,
}

impl SpoonacularProvider {
    /// Create an adapter with the given settings
    pub fn new(config: SpoonacularConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create an adapter when a key is configured
    pub fn from_env() -> Option<Self> {
        SpoonacularConfig::from_env().map(Self::new)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.config.base_url, path))
            .query(&[("apiKey", self.config.api_key.as_str())])
    }

    async fn information(&self, id: u64) -> Result<RawIngredient> {
        let resp = self
            .get(&format!("/food/ingredients/{}/information", id))
            .query(&[("amount", "100"), ("unit", "grams")])
            .send()
            .await?;
        read_json(resp, "ingredient information").await
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
    match resp.status() {
        // 402 is Spoonacular's "daily points exhausted"
        StatusCode::TOO_MANY_REQUESTS | StatusCode::PAYMENT_REQUIRED => Err(
            OstomateError::rate_limit(format!("Spoonacular {}", what)),
        ),
        StatusCode::UNAUTHORIZED => Err(OstomateError::config(
            "Spoonacular rejected the API key; check SPOONACULAR_API_KEY",
        )),
        status if !status.is_success() => Err(OstomateError::provider(format!(
            "Spoonacular {} returned {}",
            what, status
        ))),
        _ => Ok(resp.json().await?),
    }
}

#[async_trait]
impl FoodProvider for SpoonacularProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Premium
    }

    fn name(&self) -> &str {
        "spoonacular"
    }

    async fn search_by_query(&self, query: &str, limit: usize) -> Result<Vec<FoodRecord>> {
        let number = limit.to_string();
        let resp = self
            .get("/food/ingredients/search")
            .query(&[("query", query), ("number", number.as_str())])
            .send()
            .await?;
        let body: SearchResponse = read_json(resp, "ingredient search").await?;

        let hits: Vec<RawIngredient> = body.results.into_iter().take(limit).collect();
        let enriched = join_all(
            hits.iter()
                .take(ENRICH_TOP)
                .filter_map(|hit| hit.id)
                .map(|id| self.information(id)),
        )
        .await;

        let mut details = enriched.into_iter();
        let records: Vec<FoodRecord> = hits
            .into_iter()
            .enumerate()
            .filter_map(|(i, hit)| {
                if i >= ENRICH_TOP || hit.id.is_none() {
                    return map_ingredient(hit);
                }
                match details.next() {
                    Some(Ok(info)) => map_ingredient(info).or_else(|| map_ingredient(hit)),
                    Some(Err(e)) => {
                        warn!(id = ?hit.id, error = %e, "spoonacular enrichment failed");
                        map_ingredient(hit)
                    }
                    None => map_ingredient(hit),
                }
            })
            .collect();

        debug!(query, count = records.len(), "spoonacular search");
        Ok(records)
    }

    async fn get_by_barcode(&self, code: &str) -> Result<Option<FoodRecord>> {
        let resp = self
            .get(&format!("/food/products/upc/{}", code))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let product: RawProduct = read_json(resp, "product lookup").await?;
        Ok(map_product(product, code))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    results: Vec<RawIngredient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIngredient {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    aisle: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    category_path: Vec<String>,
    #[serde(default)]
    nutrition: Option<RawNutrition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProduct {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    upc: Option<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    ingredient_list: Option<String>,
    #[serde(default)]
    nutrition: Option<RawNutrition>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNutrition {
    #[serde(default, deserialize_with = "null_as_default")]
    nutrients: Vec<RawNutrient>,
}

#[derive(Debug, Default, Deserialize)]
struct RawNutrient {
    #[serde(default, deserialize_with = "null_as_default")]
    name: String,
    #[serde(default)]
    amount: Option<Value>,
    #[serde(default)]
    unit: Option<String>,
}

fn map_ingredient(raw: RawIngredient) -> Option<FoodRecord> {
    let id = raw.id?;
    let name = raw.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;

    let mut record = FoodRecord::new(ProviderId::Premium, id, name).with_nutrition(
        raw.nutrition
            .as_ref()
            .map(|n| map_nutrients(&n.nutrients))
            .unwrap_or_default(),
    );
    record.categories = raw
        .category_path
        .into_iter()
        .chain(raw.aisle)
        .filter(|c| !c.trim().is_empty())
        .collect();
    record.image_url = raw
        .image
        .filter(|i| !i.trim().is_empty())
        .map(|i| image_url(&i));
    Some(record)
}

fn map_product(raw: RawProduct, code: &str) -> Option<FoodRecord> {
    let id = raw.id?;
    let name = raw.title.as_deref().map(str::trim).filter(|t| !t.is_empty())?;

    let mut record = FoodRecord::new(ProviderId::Premium, format!("product-{}", id), name)
        .with_brand(raw.brand)
        .with_nutrition(
            raw.nutrition
                .as_ref()
                .map(|n| map_nutrients(&n.nutrients))
                .unwrap_or_default(),
        );
    record.barcode = Some(
        raw.upc
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| code.to_string()),
    );
    record.ingredients = raw
        .ingredient_list
        .as_deref()
        .map(|text| {
            text.split(',')
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty())
                .collect()
        })
        .unwrap_or_default();
    record.image_url = raw.image.filter(|i| i.starts_with("http"));
    Some(record)
}

fn map_nutrients(nutrients: &[RawNutrient]) -> NutritionPer100g {
    let mut nutrition = NutritionPer100g::new();
    for n in nutrients {
        let nutrient = match n.name.to_lowercase().as_str() {
            "calories" => Nutrient::Calories,
            "protein" => Nutrient::Protein,
            "carbohydrates" => Nutrient::Carbs,
            "fat" => Nutrient::Fat,
            "fiber" => Nutrient::Fiber,
            "sugar" => Nutrient::Sugar,
            "sodium" => Nutrient::Sodium,
            _ => continue,
        };
        let Some(mut amount) = n.amount.as_ref().and_then(Value::as_f64) else {
            continue;
        };
        if nutrient == Nutrient::Sodium && n.unit.as_deref() == Some("g") {
            amount *= 1000.0;
        }
        nutrition.set(nutrient, amount);
    }
    nutrition
}

fn image_url(image: &str) -> String {
    if image.starts_with("http") {
        image.to_string()
    } else {
        format!("{}/{}", IMAGE_BASE_URL, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_search_hit_maps_without_nutrition() {
        let body: SearchResponse = serde_json::from_value(json!({
            "results": [
                { "id": 9003, "name": "apple", "image": "apple.jpg" },
                { "name": "no id" }
            ],
            "offset": 0,
            "number": 2,
            "totalResults": 2
        }))
        .unwrap();
        let records: Vec<FoodRecord> = body
            .results
            .into_iter()
            .filter_map(map_ingredient)
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "premium:9003");
        assert!(records[0].nutrition.is_empty());
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://spoonacular.com/cdn/ingredients_100x100/apple.jpg")
        );
    }

    #[test]
    fn test_information_fixture_maps_nutrition() {
        let info: RawIngredient = serde_json::from_value(json!({
            "id": 9003,
            "name": "apple",
            "aisle": "Produce",
            "categoryPath": ["fruit"],
            "nutrition": {
                "nutrients": [
                    { "name": "Calories", "amount": 52.0, "unit": "kcal" },
                    { "name": "Protein", "amount": 0.26, "unit": "g" },
                    { "name": "Carbohydrates", "amount": 13.81, "unit": "g" },
                    { "name": "Fiber", "amount": 2.4, "unit": "g" },
                    { "name": "Sodium", "amount": 1.0, "unit": "mg" },
                    { "name": "Vitamin C", "amount": 4.6, "unit": "mg" }
                ]
            }
        }))
        .unwrap();
        let record = map_ingredient(info).unwrap();
        assert_eq!(record.nutrition.len(), 5);
        assert_eq!(record.nutrition.get(Nutrient::Calories), Some(52.0));
        assert!(record.categories.contains("fruit"));
        assert!(record.categories.contains("Produce"));
    }

    #[test]
    fn test_null_collections_are_tolerated() {
        let info: RawIngredient = serde_json::from_value(json!({
            "id": 11090,
            "name": "broccoli",
            "aisle": "Produce",
            "categoryPath": null,
            "nutrition": {
                "nutrients": [
                    { "name": null, "amount": 34.0, "unit": "kcal" },
                    { "name": "Fiber", "amount": 2.6, "unit": "g" }
                ]
            }
        }))
        .unwrap();
        let record = map_ingredient(info).unwrap();
        assert!(record.categories.contains("Produce"));
        assert_eq!(record.nutrition.len(), 1);
        assert_eq!(record.nutrition.get(Nutrient::Fiber), Some(2.6));

        let bare: RawNutrition = serde_json::from_value(json!({ "nutrients": null })).unwrap();
        assert!(bare.nutrients.is_empty());
        let body: SearchResponse = serde_json::from_value(json!({ "results": null })).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn test_product_fixture() {
        let product: RawProduct = serde_json::from_value(json!({
            "id": 30004,
            "title": "Swan Flour",
            "brand": "Swan",
            "upc": "",
            "ingredientList": "wheat flour, niacin, iron",
            "nutrition": {
                "nutrients": [{ "name": "Sodium", "amount": 0.002, "unit": "g" }]
            }
        }))
        .unwrap();
        let record = map_product(product, "633148100013").unwrap();
        assert_eq!(record.id, "premium:product-30004");
        assert_eq!(record.barcode.as_deref(), Some("633148100013"));
        assert_eq!(record.ingredients.len(), 3);
        let sodium = record.nutrition.get(Nutrient::Sodium).unwrap();
        assert!((sodium - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_requires_key() {
        let provider = SpoonacularProvider::new(SpoonacularConfig::new("k"));
        assert_eq!(FoodProvider::id(&provider), ProviderId::Premium);
        assert_eq!(provider.config.base_url, DEFAULT_BASE_URL);
    }
}
