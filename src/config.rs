use serde::Deserialize;

use crate::error::AppError;

/// Server configuration.
///
/// Layered from built-in defaults, an optional `neighborly.{toml,yaml,json}`
/// file in the working directory and `NEIGHBORLY__*` environment variables
/// (e.g. `NEIGHBORLY__MONGODB__URI`).
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub mongodb: MongoConfig,
    pub search: SearchConfig,
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,
    /// Serve seeded in-memory posts instead of connecting to MongoDB.
    #[serde(default)]
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    /// How long the driver waits for a usable server before the search
    /// reports the store as unavailable.
    pub server_selection_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Statuses hidden from search in addition to `deleted`.
    #[serde(default)]
    pub exclude_statuses: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaxonomyConfig {
    /// YAML compatibility table replacing the built-in one.
    pub path: Option<String>,
}

impl ServerConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(
            config::File::with_name("neighborly").required(false),
            config::Environment::with_prefix("NEIGHBORLY")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("search.exclude_statuses")
                .try_parsing(true),
        )
    }

    fn load_from<F, E>(file: F, env: E) -> Result<Self, AppError>
    where
        F: config::Source + Send + Sync + 'static,
        E: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .set_default("mongodb.uri", "mongodb://localhost:27017")
            .and_then(|b| b.set_default("mongodb.database", "neighborly"))
            .and_then(|b| b.set_default("mongodb.collection", "posts"))
            .and_then(|b| b.set_default("mongodb.server_selection_timeout_ms", 5_000))
            .and_then(|b| b.set_default("search.exclude_statuses", vec!["deleted"]))
            .and_then(|b| b.set_default("demo_mode", false))
            .map_err(|e| AppError::Config(e.to_string()))?
            .add_source(file)
            .add_source(env)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(e.to_string()))
    }

    /// Load the type taxonomy named by the configuration.
    pub fn load_taxonomy(&self) -> Result<crate::search::taxonomy::TypeTaxonomy, AppError> {
        use crate::search::taxonomy::TypeTaxonomy;

        match &self.taxonomy.path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Cannot read type taxonomy '{path}': {e}"))
                })?;
                TypeTaxonomy::from_yaml_str(&raw)
            }
            None => TypeTaxonomy::builtin(),
        }
    }
}
