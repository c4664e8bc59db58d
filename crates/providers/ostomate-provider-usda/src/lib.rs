//! USDA FoodData Central adapter for ostomate
//!
//! Government nutrition data. `DEMO_KEY` works for light use; set
//! `USDA_API_KEY` for anything else.

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;
use ostomate_core::{
    get_env_or, null_as_default, FoodProvider, FoodRecord, Nutrient, NutritionPer100g,
    OstomateError, ProviderId, Result,
};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.nal.usda.gov/fdc/v1";

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
pub struct UsdaConfig {
    /// FoodData Central API key
    pub api_key: String,
    /// API root, without trailing slash
    pub base_url: String,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            api_key: "DEMO_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl UsdaConfig {
    /// Read `USDA_API_KEY` and `USDA_BASE_URL`
    pub fn from_env() -> Self {
        Self {
            api_key: get_env_or("USDA_API_KEY", "DEMO_KEY"),
            base_url: get_env_or("USDA_BASE_URL", DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

/// Government provider backed by FoodData Central
pub struct UsdaProvider {
    client: Client,
    config: UsdaConfig,
}

impl UsdaProvider {
    /// Create an adapter with the given settings
    pub fn new(config: UsdaConfig) -> Self {
        Self {
            client: get_http_client(),
            config,
        }
    }

    /// Create an adapter from the environment
    pub fn from_env() -> Self {
        Self::new(UsdaConfig::from_env())
    }

    async fn search_foods(&self, query: &str, page_size: usize) -> Result<SearchResponse> {
        let page_size = page_size.to_string();
        let resp = self
            .client
            .get(format!("{}/foods/search", self.config.base_url))
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("query", query),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await?;

        match resp.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(OstomateError::rate_limit("USDA food search")),
            StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(OstomateError::config(
                "USDA rejected the API key; check USDA_API_KEY",
            )),
            status if !status.is_success() => Err(OstomateError::provider(format!(
                "USDA food search returned {}",
                status
            ))),
            _ => Ok(resp.json().await?),
        }
    }
}

#[async_trait]
impl FoodProvider for UsdaProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Government
    }

    fn name(&self) -> &str {
        "usda"
    }

    async fn search_by_query(&self, query: &str, limit: usize) -> Result<Vec<FoodRecord>> {
        let body = self.search_foods(query, limit).await?;
        let records: Vec<FoodRecord> = map_search(body).into_iter().take(limit).collect();
        debug!(query, count = records.len(), "usda search");
        Ok(records)
    }

    async fn get_by_barcode(&self, code: &str) -> Result<Option<FoodRecord>> {
        let body = self.search_foods(code, 5).await?;
        Ok(find_by_gtin(body, code))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    foods: Vec<RawFood>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFood {
    #[serde(default)]
    fdc_id: Option<u64>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    brand_owner: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    gtin_upc: Option<String>,
    #[serde(default)]
    ingredients: Option<String>,
    #[serde(default)]
    food_category: Option<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    food_nutrients: Vec<RawNutrient>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNutrient {
    #[serde(default)]
    nutrient_id: Option<u32>,
    #[serde(default)]
    nutrient_number: Option<String>,
    #[serde(default)]
    value: Option<Value>,
}

fn map_search(body: SearchResponse) -> Vec<FoodRecord> {
    body.foods.into_iter().filter_map(map_food).collect()
}

fn find_by_gtin(body: SearchResponse, code: &str) -> Option<FoodRecord> {
    let wanted = code.trim_start_matches('0');
    body.foods
        .into_iter()
        .find(|f| {
            f.gtin_upc
                .as_deref()
                .is_some_and(|g| g.trim().trim_start_matches('0') == wanted)
        })
        .and_then(map_food)
}

/// Translate one food; entries without an id or description are skipped
fn map_food(raw: RawFood) -> Option<FoodRecord> {
    let fdc_id = raw.fdc_id?;
    let name = raw.description.as_deref().map(str::trim).filter(|d| !d.is_empty())?;

    let brand = raw.brand_name.clone().or(raw.brand_owner.clone());
    let mut record = FoodRecord::new(ProviderId::Government, fdc_id, name)
        .with_brand(brand)
        .with_nutrition(map_nutrients(&raw.food_nutrients));
    record.barcode = raw.gtin_upc.filter(|g| !g.trim().is_empty());
    record.ingredients = raw
        .ingredients
        .as_deref()
        .map(|text| {
            text.split(',')
                .map(|i| i.trim().trim_end_matches('.').to_string())
                .filter(|i| !i.is_empty())
                .collect()
        })
        .unwrap_or_default();
    // Search results carry a plain string, detail payloads an object
    let category = match raw.food_category {
        Some(Value::String(s)) => Some(s),
        Some(Value::Object(o)) => o
            .get("description")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    };
    record.categories.extend(category.filter(|c| !c.is_empty()));
    Some(record)
}

fn map_nutrients(nutrients: &[RawNutrient]) -> NutritionPer100g {
    let mut nutrition = NutritionPer100g::new();
    for n in nutrients {
        let Some(value) = n.value.as_ref().and_then(Value::as_f64) else {
            continue;
        };
        let nutrient = match (n.nutrient_id, n.nutrient_number.as_deref()) {
            (Some(1008), _) | (_, Some("208")) => Nutrient::Calories,
            (Some(1003), _) | (_, Some("203")) => Nutrient::Protein,
            (Some(1005), _) | (_, Some("205")) => Nutrient::Carbs,
            (Some(1004), _) | (_, Some("204")) => Nutrient::Fat,
            (Some(1079), _) | (_, Some("291")) => Nutrient::Fiber,
            (Some(2000), _) | (_, Some("269")) => Nutrient::Sugar,
            (Some(1093), _) | (_, Some("307")) => Nutrient::Sodium,
            _ => continue,
        };
        if nutrition.get(nutrient).is_none() {
            nutrition.set(nutrient, value);
        }
    }
    nutrition
}
