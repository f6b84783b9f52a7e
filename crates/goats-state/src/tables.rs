//! redb table definitions. Keys are `&str`, values JSON bytes.

use redb::TableDefinition;

/// Goat catalogue. The featured list lives under [`FEATURED_KEY`].
pub const GOATS: TableDefinition<&str, &[u8]> = TableDefinition::new("goats");

/// Favorite goat ids keyed by visitor user id.
pub const FAVORITES: TableDefinition<&str, &[u8]> = TableDefinition::new("favorites");

pub const FEATURED_KEY: &str = "featured";
