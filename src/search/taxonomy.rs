use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The compatibility table shipped with the binary.
const BUILTIN_TAXONOMY: &str = include_str!("../../config/type_taxonomy.yaml");

/// Logical content category a page or section restricts its search to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeScope {
    /// General community board. Also owns every record without a type.
    Board,
    PropertyInfo,
    MovingService,
    ExpertTip,
}

impl TypeScope {
    pub const ALL: [TypeScope; 4] = [
        TypeScope::Board,
        TypeScope::PropertyInfo,
        TypeScope::MovingService,
        TypeScope::ExpertTip,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeScope::Board => "board",
            TypeScope::PropertyInfo => "property-info",
            TypeScope::MovingService => "moving-service",
            TypeScope::ExpertTip => "expert-tip",
        }
    }

    /// Human-readable section name.
    pub fn label(&self) -> &'static str {
        match self {
            TypeScope::Board => "Board",
            TypeScope::PropertyInfo => "Property info",
            TypeScope::MovingService => "Moving services",
            TypeScope::ExpertTip => "Expert tips",
        }
    }

    /// Parse a scope name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(s: &str) -> Result<Self, AppError> {
        let wanted = s.trim().to_lowercase();
        TypeScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == wanted)
            .ok_or_else(|| AppError::UnknownScope(s.to_string()))
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TypeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeScope {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeScope::parse(s)
    }
}

/// On-disk shape of the compatibility table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaxonomyFile {
    version: u32,
    scopes: BTreeMap<TypeScope, Vec<String>>,
}

/// Maps each [`TypeScope`] to every raw `metadata.type` value that has ever
/// represented it.
///
/// Built once at startup and shared read-only afterwards. Construction
/// guarantees that every scope has a non-empty variant set containing its
/// canonical name and that no raw value belongs to two scopes.
#[derive(Debug, Clone)]
pub struct TypeTaxonomy {
    version: u32,
    variants: [BTreeSet<String>; 4],
    owners: HashMap<String, TypeScope>,
}

impl TypeTaxonomy {
    /// The table embedded from `config/type_taxonomy.yaml`.
    pub fn builtin() -> Result<Self, AppError> {
        Self::from_yaml_str(BUILTIN_TAXONOMY)
    }

    /// Parse and validate a YAML compatibility table.
    pub fn from_yaml_str(raw: &str) -> Result<Self, AppError> {
        let file: TaxonomyFile = serde_yaml::from_str(raw)
            .map_err(|e| AppError::Config(format!("Invalid type taxonomy: {e}")))?;
        Self::from_table(file.version, file.scopes)
    }

    /// Build a taxonomy from explicit `(scope, variants)` pairs.
    pub fn from_table<I>(version: u32, table: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (TypeScope, Vec<String>)>,
    {
        let mut variants: [BTreeSet<String>; 4] = Default::default();
        let mut present = [false; 4];

        for (scope, values) in table {
            present[scope.index()] = true;
            let set = &mut variants[scope.index()];
            set.insert(scope.as_str().to_string());
            for value in values {
                let value = value.trim();
                if value.is_empty() {
                    return Err(AppError::Config(format!(
                        "Empty type variant listed for scope '{scope}'"
                    )));
                }
                set.insert(value.to_string());
            }
        }

        if let Some(missing) = TypeScope::ALL.into_iter().find(|s| !present[s.index()]) {
            return Err(AppError::Config(format!(
                "Type taxonomy has no entry for scope '{missing}'"
            )));
        }

        let mut owners = HashMap::new();
        for scope in TypeScope::ALL {
            for value in &variants[scope.index()] {
                if let Some(previous) = owners.insert(value.clone(), scope) {
                    return Err(AppError::Config(format!(
                        "Type variant '{value}' is claimed by both '{previous}' and '{scope}'"
                    )));
                }
            }
        }

        Ok(Self {
            version,
            variants,
            owners,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// Every raw tag value treated as equivalent to `scope`.
    pub fn variants_for(&self, scope: TypeScope) -> &BTreeSet<String> {
        &self.variants[scope.index()]
    }

    /// The effective scope of a stored record given its raw `metadata.type`.
    ///
    /// An absent or null tag means `board`. Tags no scope claims yield `None`.
    pub fn scope_of_tag(&self, tag: Option<&str>) -> Option<TypeScope> {
        match tag {
            None => Some(TypeScope::Board),
            Some(tag) => self.owners.get(tag).copied(),
        }
    }
}
