use chrono::NaiveDateTime;
use diesel::prelude::*;
use ladle_core::{Recipe, RecipeUpdate};

use crate::store::StoreError;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[allow(dead_code)]
pub struct RecipeRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub ingredients: String,
    pub instructions: String,
    pub image_url: Option<String>,
    pub source_url: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl RecipeRow {
    pub fn into_recipe(self) -> Result<Recipe, StoreError> {
        Ok(Recipe {
            id: self.id,
            ingredients: decode_lines("ingredients", &self.ingredients)?,
            instructions: decode_lines("instructions", &self.instructions)?,
            name: self.name,
            image_url: self.image_url,
            source_url: self.source_url,
            owner_id: self.owner_id,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub owner_id: i64,
    pub name: &'a str,
    pub ingredients: String,
    pub instructions: String,
    pub image_url: Option<&'a str>,
    pub source_url: &'a str,
}

/// Column changes for a partial update. `None` leaves a column alone.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::recipes)]
pub struct RecipeChangeset {
    pub name: Option<String>,
    pub ingredients: Option<String>,
    pub instructions: Option<String>,
    pub image_url: Option<Option<String>>,
    pub updated_at: NaiveDateTime,
}

impl RecipeChangeset {
    pub fn from_update(update: RecipeUpdate, now: NaiveDateTime) -> Result<Self, StoreError> {
        Ok(Self {
            name: update.name,
            ingredients: update
                .ingredients
                .as_deref()
                .map(|lines| encode_lines("ingredients", lines))
                .transpose()?,
            instructions: update
                .instructions
                .as_deref()
                .map(|lines| encode_lines("instructions", lines))
                .transpose()?,
            image_url: update.image_url,
            updated_at: now,
        })
    }
}

/// Ordered text sequences are stored as JSON arrays of strings.
pub fn encode_lines(field: &'static str, lines: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(lines).map_err(|e| StoreError::Corrupt {
        field,
        reason: e.to_string(),
    })
}

pub fn decode_lines(field: &'static str, stored: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(stored).map_err(|e| StoreError::Corrupt {
        field,
        reason: e.to_string(),
    })
}
