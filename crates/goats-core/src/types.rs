//! Shared types used across the Best Goats crates.

use serde::{Deserialize, Serialize};

pub type GoatId = u32;

/// A goat in the featured catalogue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goat {
    pub id: GoatId,
    pub name: String,
    pub image: String,
    #[serde(rename = "imageSmall")]
    pub image_small: String,
}

/// A goat as shown in a list, flagged when the visitor favorited it.
#[derive(Debug, Clone, PartialEq)]
pub struct GoatListItem {
    pub id: GoatId,
    pub name: String,
    pub image: String,
    pub image_small: String,
    pub is_favorite: bool,
}

impl GoatListItem {
    pub fn from_goat(goat: Goat, favorites: &[GoatId]) -> Self {
        let is_favorite = favorites.contains(&goat.id);
        Self {
            id: goat.id,
            name: goat.name,
            image: goat.image,
            image_small: goat.image_small,
            is_favorite,
        }
    }
}

/// Build list items for `goats`, preserving catalogue order.
pub fn goat_list_items(goats: Vec<Goat>, favorites: &[GoatId]) -> Vec<GoatListItem> {
    goats
        .into_iter()
        .map(|goat| GoatListItem::from_goat(goat, favorites))
        .collect()
}

/// Edit applied to a visitor's favorites list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoritesAction {
    Add,
    Remove,
}

impl FavoritesAction {
    /// Apply the action in place. Returns true if the list changed.
    ///
    /// Additions go to the front so the most recent favorite is listed first.
    pub fn apply(self, favorites: &mut Vec<GoatId>, goat_id: GoatId) -> bool {
        match self {
            FavoritesAction::Add => {
                if favorites.contains(&goat_id) {
                    false
                } else {
                    favorites.insert(0, goat_id);
                    true
                }
            }
            FavoritesAction::Remove => match favorites.iter().position(|id| *id == goat_id) {
                Some(idx) => {
                    favorites.remove(idx);
                    true
                }
                None => false,
            },
        }
    }
}
