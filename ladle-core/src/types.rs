use serde::{Deserialize, Serialize};

/// Identifier of the user a recipe belongs to.
pub type OwnerId = i64;

/// Store-assigned recipe identifier.
pub type RecipeId = i64;

/// A persisted recipe, keyed by `id` and unique on `source_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub image_url: Option<String>,
    pub source_url: String,
    pub owner_id: OwnerId,
}

/// Recipe-shaped value produced by extraction, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeCandidate {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Sparse set of field changes for a stored recipe.
///
/// `source_url` and `owner_id` are deliberately absent: they never change after insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<Vec<String>>,
    /// `Some(None)` clears the image.
    pub image_url: Option<Option<String>>,
}

impl RecipeUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
            && self.image_url.is_none()
    }
}
