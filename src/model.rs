use serde::{Deserialize, Serialize};

/// Inclusive bounds for association weights. Enforced when a game is
/// written, not when it is read back.
pub const WEIGHT_MIN: i64 = 0;
pub const WEIGHT_MAX: i64 = 10;

/// Sensory modality tag on a game, drawn from a closed set. Persisted by
/// UPPERCASE name inside the game row's materials column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Material {
    Visual,
    Verbal,
    Tactile,
    Auditory,
}

impl Material {
    pub const ALL: [Material; 4] = [
        Material::Visual,
        Material::Verbal,
        Material::Tactile,
        Material::Auditory,
    ];

    /// The persisted spelling.
    pub fn name(self) -> &'static str {
        match self {
            Material::Visual => "VISUAL",
            Material::Verbal => "VERBAL",
            Material::Tactile => "TACTILE",
            Material::Auditory => "AUDITORY",
        }
    }
}

/// A weighted cognitive category. `id` is absent until the row is
/// persisted; identity is the id from then on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveCategory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl CognitiveCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// Identical shape to `CognitiveCategory`, distinct namespace and table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CognitiveFunction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl CognitiveFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

/// A cognitive-training exercise. Categories and functions are ordered
/// weighted associations; both lists are stored denormalized inside the
/// game row (see codec.rs for the wire format).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub categories: Vec<(CognitiveCategory, i64)>,
    #[serde(default)]
    pub functions: Vec<(CognitiveFunction, i64)>,
}

impl Game {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
