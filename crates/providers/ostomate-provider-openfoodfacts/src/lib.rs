//! Open Food Facts adapter for ostomate
//!
//! Crowd-sourced packaged products. No API key is needed; searches use the
//! legacy `search.pl` endpoint and barcodes the v2 product endpoint.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use ostomate_core::{
    get_env_or, null_as_default, FoodProvider, FoodRecord, Nutrient, NutritionPer100g,
    OstomateError, ProviderId, Result,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Default public instance
pub const DEFAULT_BASE_URL: &str = "https://world.openfoodfacts.org";

/// Shared HTTP client for connection pooling
static HTTP_CLIENT: OnceLock<Client> = OnceLock::new();

fn get_http_client() -> Client {
    HTTP_CLIENT
        .get_or_init(|| {
            Client::builder()
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(Duration::from_secs(90))
                .user_agent(concat!("ostomate/", env!("CARGO_PKG_VERSION")))
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default()
        })
        .clone()
}

/// Adapter settings
#[derive(Debug, Clone)]
pub struct OpenFoodFactsConfig {
    /// Instance root, without trailing slash
    pub base_url: String,
}

impl Default for OpenFoodFactsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl OpenFoodFactsConfig {
    /// Read `OFF_BASE_URL`
    pub fn from_env() -> Self {
        Self {
            base_url: get_env_or("OFF_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Crowd provider backed by Open Food Facts
pub struct OpenFoodFactsProvider {
    client: Client,
    config: OpenFoodFactsConfig,
}

impl OpenFoodFactsProvider {
    /// Create an adapter with the given settings
    pub fn new(config: OpenFoodFactsConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create an adapter from the environment
    pub fn from_env() -> Self {
        Self::new(OpenFoodFactsConfig::from_env())
    }
}

#[async_trait]
impl FoodProvider for OpenFoodFactsProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Crowd
    }

    fn name(&self) -> &str {
        "openfoodfacts"
    }

    async fn search_by_query(&self, query: &str, limit: usize) -> Result<Vec<FoodRecord>> {
        let page_size = limit.to_string();
        let resp = self
            .client
            .get(format!("{}/cgi/search.pl", self.config.base_url))
            .query(&[
                ("search_terms", query),
                ("search_simple", "1"),
                ("action", "process"),
                ("json", "1"),
                ("page_size", page_size.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OstomateError::rate_limit("Open Food Facts search"));
        }
        if !status.is_success() {
            return Err(OstomateError::provider(format!(
                "Open Food Facts search returned {}",
                status
            )));
        }

        let body: SearchResponse = resp.json().await?;
        let records = map_search(body, limit);
        debug!(query, count = records.len(), "open food facts search");
        Ok(records)
    }

    async fn get_by_barcode(&self, code: &str) -> Result<Option<FoodRecord>> {
        let resp = self
            .client
            .get(format!(
                "{}/api/v2/product/{}.json",
                self.config.base_url, code
            ))
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(OstomateError::provider(format!(
                "Open Food Facts product lookup returned {}",
                status
            )));
        }

        let body: ProductResponse = resp.json().await?;
        Ok(map_product_response(body, code))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    products: Vec<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct ProductResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    product: Option<RawProduct>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProduct {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    product_name_en: Option<String>,
    #[serde(default)]
    generic_name: Option<String>,
    #[serde(default)]
    brands: Option<String>,
    #[serde(default)]
    ingredients_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    allergens_tags: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    categories_tags: Vec<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    nutriments: Map<String, Value>,
}

fn map_search(body: SearchResponse, limit: usize) -> Vec<FoodRecord> {
    body.products
        .into_iter()
        .filter_map(|p| map_product(p, None))
        .take(limit)
        .collect()
}

fn map_product_response(body: ProductResponse, code: &str) -> Option<FoodRecord> {
    if body.status != 1 {
        return None;
    }
    map_product(body.product?, Some(code))
}

/// Translate one product; products without a usable name or code are skipped
fn map_product(raw: RawProduct, fallback_code: Option<&str>) -> Option<FoodRecord> {
    let code = raw
        .code
        .as_ref()
        .and_then(|c| match c {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|c| !c.is_empty())
        .or_else(|| fallback_code.map(str::to_string))?;

    let name = [&raw.product_name, &raw.product_name_en, &raw.generic_name]
        .into_iter()
        .flatten()
        .map(|n| n.trim())
        .find(|n| !n.is_empty())?
        .to_string();

    let brand = raw
        .brands
        .as_deref()
        .and_then(|b| b.split(',').next())
        .map(|b| b.trim().to_string());

    let mut record = FoodRecord::new(ProviderId::Crowd, &code, name)
        .with_brand(brand)
        .with_nutrition(map_nutriments(&raw.nutriments));
    record.barcode = Some(code);
    record.ingredients = raw
        .ingredients_text
        .as_deref()
        .map(split_ingredients)
        .unwrap_or_default();
    record.allergens = raw.allergens_tags.iter().map(|t| strip_lang(t)).collect();
    record.categories = raw.categories_tags.iter().map(|t| strip_lang(t)).collect();
    record.image_url = raw.image_url.filter(|u| !u.trim().is_empty());
    Some(record)
}

fn map_nutriments(nutriments: &Map<String, Value>) -> NutritionPer100g {
    let get = |key: &str| nutriments.get(key).and_then(number);

    let mut nutrition = NutritionPer100g::new();
    nutrition.set_opt(
        Nutrient::Calories,
        get("energy-kcal_100g").or_else(|| get("energy_100g").map(|kj| kj / 4.184)),
    );
    nutrition.set_opt(Nutrient::Protein, get("proteins_100g"));
    nutrition.set_opt(Nutrient::Carbs, get("carbohydrates_100g"));
    nutrition.set_opt(Nutrient::Fat, get("fat_100g"));
    nutrition.set_opt(Nutrient::Fiber, get("fiber_100g"));
    nutrition.set_opt(Nutrient::Sugar, get("sugars_100g"));
    // Reported in grams
    nutrition.set_opt(Nutrient::Sodium, get("sodium_100g").map(|g| g * 1000.0));
    nutrition
}

/// Nutriment values arrive as numbers or numeric strings
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().replace(',', ".").parse().ok(),
        _ => None,
    }
}

fn split_ingredients(text: &str) -> Vec<String> {
    text.split([',', ';'])
        .map(|i| i.trim().trim_end_matches('.').trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

/// `en:milk` -> `milk`
fn strip_lang(tag: &str) -> String {
    tag.split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(tag)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn product_fixture() -> Value {
        json!({
            "code": "3017620422003",
            "product_name": "Nutella",
            "brands": "Ferrero, Nutella",
            "ingredients_text": "Sugar, palm oil, hazelnuts 13%, skimmed milk powder 8.7%.",
            "allergens_tags": ["en:milk", "en:nuts"],
            "categories_tags": ["en:spreads", "en:sweet-spreads"],
            "image_url": "https://images.openfoodfacts.org/nutella.jpg",
            "nutriments": {
                "energy-kcal_100g": 539,
                "proteins_100g": "6.3",
                "carbohydrates_100g": 57.5,
                "fat_100g": 30.9,
                "sugars_100g": 56.3,
                "sodium_100g": 0.0428
            }
        })
    }

    #[test]
    fn test_search_fixture_maps_to_records() {
        let body: SearchResponse = serde_json::from_value(json!({
            "count": 3,
            "products": [
                product_fixture(),
                { "code": "123", "product_name": "   " },
                { "code": 5000159484695_u64, "generic_name": "Banana chips" }
            ]
        }))
        .unwrap();

        let records = map_search(body, 10);
        assert_eq!(records.len(), 2);

        let nutella = &records[0];
        assert_eq!(nutella.id, "crowd:3017620422003");
        assert_eq!(nutella.source, ProviderId::Crowd);
        assert_eq!(nutella.brand.as_deref(), Some("Ferrero"));
        assert_eq!(nutella.barcode.as_deref(), Some("3017620422003"));
        assert_eq!(nutella.ingredients[0], "Sugar");
        assert_eq!(nutella.ingredients.len(), 4);
        assert!(nutella.allergens.contains("milk"));
        assert!(nutella.categories.contains("spreads"));
        assert_eq!(nutella.nutrition.get(Nutrient::Protein), Some(6.3));
        let sodium = nutella.nutrition.get(Nutrient::Sodium).unwrap();
        assert!((sodium - 42.8).abs() < 1e-9);

        assert_eq!(records[1].id, "crowd:5000159484695");
        assert_eq!(records[1].name, "Banana chips");
    }

    #[test]
    fn test_missing_nutriments_default_to_empty() {
        let body: SearchResponse = serde_json::from_value(json!({
            "products": [{ "code": "42", "product_name": "Plain crackers" }]
        }))
        .unwrap();
        let records = map_search(body, 10);
        assert_eq!(records.len(), 1);
        assert!(records[0].nutrition.is_empty());
        assert!(records[0].ingredients.is_empty());
        assert!(records[0].brand.is_none());
    }

    #[test]
    fn test_null_collections_are_tolerated() {
        let body: SearchResponse = serde_json::from_value(json!({
            "products": [{
                "code": "3560070791460",
                "product_name": "Rice cakes",
                "allergens_tags": null,
                "categories_tags": null,
                "nutriments": null
            }]
        }))
        .unwrap();
        let records = map_search(body, 10);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Rice cakes");
        assert!(records[0].nutrition.is_empty());
        assert!(records[0].categories.is_empty());

        let empty: SearchResponse = serde_json::from_value(json!({ "products": null })).unwrap();
        assert!(map_search(empty, 10).is_empty());
    }

    #[test]
    fn test_search_respects_limit() {
        let products: Vec<Value> = (0..5)
            .map(|i| json!({ "code": i.to_string(), "product_name": format!("Bread {}", i) }))
            .collect();
        let body: SearchResponse = serde_json::from_value(json!({ "products": products })).unwrap();
        assert_eq!(map_search(body, 2).len(), 2);
    }

    #[test]
    fn test_product_response_status() {
        let found: ProductResponse = serde_json::from_value(json!({
            "status": 1,
            "product": { "product_name": "Nutella" }
        }))
        .unwrap();
        let record = map_product_response(found, "3017620422003").unwrap();
        assert_eq!(record.id, "crowd:3017620422003");

        let missing: ProductResponse = serde_json::from_value(json!({
            "status": 0,
            "status_verbose": "product not found"
        }))
        .unwrap();
        assert!(map_product_response(missing, "000").is_none());
    }

    #[test]
    fn test_energy_falls_back_to_kilojoules() {
        let mut nutriments = Map::new();
        nutriments.insert("energy_100g".to_string(), json!(418.4));
        let nutrition = map_nutriments(&nutriments);
        let kcal = nutrition.get(Nutrient::Calories).unwrap();
        assert!((kcal - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_config_default() {
        let provider = OpenFoodFactsProvider::new(OpenFoodFactsConfig::default());
        assert_eq!(provider.config.base_url, DEFAULT_BASE_URL);
        assert_eq!(FoodProvider::id(&provider), ProviderId::Crowd);
    }
}
