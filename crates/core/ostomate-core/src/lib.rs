//! Ostomate Core
//!
//! Food resolution and daily-log extraction for people living with a stoma.
//! It includes:
//!
//! - A similarity matcher based on edit distance
//! - A curated food table with ostomy annotations
//! - A concurrent aggregator over independent food data providers
//! - A condition resolver that annotates and ranks foods
//! - An entry extractor with a language-model path and a local fallback
//!
//! # Example
//!
//! ```no_run
//! use ostomate_core::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ostomate = Ostomate::new(CoreConfig::from_env()?);
//!     let foods = ostomate
//!         .search_annotated("chiken", &ostomate.default_search_options())
//!         .await;
//!     let entries = ostomate
//!         .extract("I had 2 eggs at 8am, felt gassy around 10am", chrono::Local::now().fixed_offset())
//!         .await;
//!     println!("{} foods, {} entries", foods.len(), entries.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod aggregator;
pub mod condition;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod nlp;
pub mod provider;
pub mod templates;
pub mod testing;
pub mod types;
pub mod utils;

pub use aggregator::{
    deduplicate, Aggregator, ContributionStatus, ProviderContribution, SearchOptions,
    SearchOutcome,
};
pub use condition::{rank_by_friendliness, AnnotationStore, ConditionResolver};
pub use config::{
    get_env_bool, get_env_float, get_env_int, get_env_opt, get_env_or, get_required_env,
    load_env, load_env_from_path, parse_provider_list, CoreConfig, MAX_SEARCH_LIMIT,
};
pub use dataset::{CuratedDataset, CuratedFood, LocalDatasetProvider, MatchKind};
pub use engine::{Ostomate, OstomateBuilder};
pub use error::{OstomateError, Result};
pub use extractor::{
    EntryExtractor, EntryModel, Extraction, ExtractionRequest, ExtractionSource, LocalExtractor,
};
pub use nlp::{edit_distance, similarity};
pub use provider::FoodProvider;
pub use templates::{render_extraction_prompt, TemplateEngine, EXTRACTION_TEMPLATE};
pub use types::*;
pub use utils::{init_logging, null_as_default, Logger};
