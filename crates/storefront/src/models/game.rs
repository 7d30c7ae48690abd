//! Catalog domain types.

use pixel_vault_core::{GameId, Platform, Price, Stock, cover_key};

/// A game in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    pub name: String,
    pub details: String,
    pub developer: String,
    pub publisher: String,
    pub platform: Platform,
    pub price: Price,
}

impl Game {
    /// Key of the cover image stored for this game.
    #[must_use]
    pub fn cover_key(&self) -> String {
        cover_key(&self.name)
    }

    /// Public path of the cover image.
    #[must_use]
    pub fn cover_url(&self) -> String {
        format!("/covers/{}.jpg", self.cover_key())
    }
}

/// A game annotated with its current inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameWithStock {
    pub game: Game,
    pub stock: Stock,
}

impl GameWithStock {
    /// Whether the game can currently be bought.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock.is_available()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_url_uses_sanitized_name() {
        let game = Game {
            id: GameId::new(7),
            name: "Doom: Eternal".to_owned(),
            details: String::new(),
            developer: String::new(),
            publisher: String::new(),
            platform: Platform::Pc,
            price: Price::parse("39.99").unwrap(),
        };
        assert_eq!(game.cover_url(), "/covers/Doom Eternal.jpg");
    }
}
