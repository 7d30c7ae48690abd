//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! games:
//!   - name: Celeste
//!     details: Help Madeline survive her inner demons on her journey to the top.
//!     developer: Maddy Makes Games
//!     publisher: Maddy Makes Games
//!     platform: Switch
//!     price: 19.99
//!     stock: 25
//!     cover: covers/celeste.jpg   # relative to the YAML file
//! ```
//!
//! The whole file, cover images included, is validated before the database
//! or the covers directory is touched.

use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info, warn};

use pixel_vault_core::{NewGame, Platform, Price, Stock, ValidationError};
use pixel_vault_storefront::db::{GameRepository, RepositoryError};
use pixel_vault_storefront::services::CoverStore;
use pixel_vault_storefront::services::covers::CoverError;

use super::ConnectError;

/// Largest cover image accepted from a seed file.
const MAX_COVER_BYTES: usize = 5 * 1024 * 1024;

/// Default cover directory, matching the storefront's.
const DEFAULT_COVERS_DIR: &str = "crates/storefront/static/covers";

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// The file could not be read.
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid YAML for a catalog.
    #[error("Invalid catalog file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// One or more entries failed validation.
    #[error("{0} invalid catalog entries")]
    Invalid(usize),

    /// Could not reach the database.
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Inserting a game failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Storing a cover image failed.
    #[error("Cover error: {0}")]
    Cover(#[from] CoverError),
}

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub games: Vec<SeedGame>,
}

/// One catalog entry as written in YAML.
#[derive(Debug, Deserialize)]
pub struct SeedGame {
    pub name: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub developer: String,
    #[serde(default)]
    pub publisher: String,
    pub platform: String,
    pub price: Decimal,
    pub stock: i32,
    /// Cover image path, relative to the catalog file.
    #[serde(default)]
    pub cover: Option<PathBuf>,
}

/// A validated entry ready to insert.
#[derive(Debug)]
pub struct SeedEntry {
    pub game: NewGame,
    pub stock: Stock,
    pub cover: Option<PathBuf>,
    /// Cover contents, filled in by [`load_covers`].
    pub cover_bytes: Option<Vec<u8>>,
}

impl SeedGame {
    /// Validate the entry and resolve its cover path against `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn into_entry(self, base_dir: &Path) -> Result<SeedEntry, ValidationError> {
        let platform = self.platform.parse::<Platform>()?;
        let price = Price::new(self.price)?;
        let stock = Stock::new(self.stock)?;
        let game = NewGame {
            name: self.name,
            details: self.details,
            developer: self.developer,
            publisher: self.publisher,
            platform,
            price,
        }
        .validate()?;

        Ok(SeedEntry {
            game,
            stock,
            cover: self.cover.map(|path| base_dir.join(path)),
            cover_bytes: None,
        })
    }
}

/// Parse and validate a catalog document.
///
/// Logs every invalid entry before failing.
///
/// # Errors
///
/// Returns `SeedError::Yaml` for malformed YAML and `SeedError::Invalid`
/// if any entry fails validation.
pub fn parse_catalog(content: &str, base_dir: &Path) -> Result<Vec<SeedEntry>, SeedError> {
    let file: CatalogFile = serde_yaml::from_str(content)?;

    let mut entries = Vec::with_capacity(file.games.len());
    let mut invalid = 0;
    for (index, seed) in file.games.into_iter().enumerate() {
        let name = seed.name.clone();
        match seed.into_entry(base_dir) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                error!("  - entry {} ({name}): {e}", index + 1);
                invalid += 1;
            }
        }
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(entries)
}

/// Cover store configured from `PIXEL_VAULT_COVERS_DIR`.
#[must_use]
pub fn cover_store_from_env() -> CoverStore {
    let covers_dir = std::env::var("PIXEL_VAULT_COVERS_DIR")
        .unwrap_or_else(|_| DEFAULT_COVERS_DIR.to_owned());
    CoverStore::new(covers_dir, MAX_COVER_BYTES)
}

/// Read every entry's cover and run the upload checks on it.
///
/// Logs every unreadable or rejected cover before failing.
///
/// # Errors
///
/// Returns `SeedError::Invalid` with the number of bad covers.
pub async fn load_covers(entries: &mut [SeedEntry], covers: &CoverStore) -> Result<(), SeedError> {
    let mut invalid = 0;
    for (index, entry) in entries.iter_mut().enumerate() {
        let Some(cover_path) = &entry.cover else {
            continue;
        };
        let name = &entry.game.name;

        let bytes = match tokio::fs::read(cover_path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("  - entry {} ({name}): cannot read {}: {e}", index + 1, cover_path.display());
                invalid += 1;
                continue;
            }
        };
        let file_name = cover_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Err(e) = covers.validate_upload(&file_name, &bytes) {
            error!("  - entry {} ({name}): {e}", index + 1);
            invalid += 1;
            continue;
        }
        entry.cover_bytes = Some(bytes);
    }

    if invalid > 0 {
        return Err(SeedError::Invalid(invalid));
    }
    Ok(())
}

/// Load games from `path` into the catalog.
///
/// Nothing is written unless every entry and every cover is valid. Each game
/// is then inserted in its own transaction; its cover is published only once
/// that insert has committed.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, a cover is not a
/// usable JPEG, or a database write fails. Games inserted before a database
/// failure stay in the catalog.
pub async fn catalog(path: &Path, covers: &CoverStore, dry_run: bool) -> Result<(), SeedError> {
    info!(path = %path.display(), "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut entries = parse_catalog(&content, base_dir)?;
    load_covers(&mut entries, covers).await?;

    info!(games = entries.len(), "Catalog validated successfully");
    if dry_run {
        info!("Dry run, nothing written");
        return Ok(());
    }

    let pool = super::connect().await?;
    let games = GameRepository::new(&pool);

    let mut with_cover = 0;
    for entry in &entries {
        let staged = match &entry.cover_bytes {
            Some(bytes) => Some(covers.stage(&entry.game.cover_key(), bytes).await?),
            None => {
                warn!(name = %entry.game.name, "No cover image given");
                None
            }
        };

        let id = match games.create(&entry.game, entry.stock).await {
            Ok(id) => id,
            Err(e) => {
                if let Some(staged) = staged {
                    staged.discard().await;
                }
                return Err(e.into());
            }
        };
        if let Some(staged) = staged {
            staged.commit().await?;
            with_cover += 1;
        }
        info!(game_id = %id, name = %entry.game.name, stock = %entry.stock, "Game added");
    }

    info!("Seeding complete!");
    info!("  Games inserted: {}", entries.len());
    info!("  Covers stored: {}", with_cover);

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
games:
  - name: Celeste
    details: Climb the mountain.
    platform: Nintendo Switch
    price: 19.99
    stock: 25
    cover: covers/celeste.jpg
  - name: Hades
    platform: PC
    price: '24.99'
    stock: 0
";

    #[test]
    fn test_parse_catalog() {
        let entries = parse_catalog(CATALOG, Path::new("seed")).unwrap();
        assert_eq!(entries.len(), 2);

        let celeste = &entries[0];
        assert_eq!(celeste.game.platform, Platform::Switch);
        assert_eq!(celeste.game.price.to_string(), "$19.99");
        assert_eq!(celeste.stock.count(), 25);
        assert_eq!(
            celeste.cover.as_deref(),
            Some(Path::new("seed/covers/celeste.jpg"))
        );

        let hades = &entries[1];
        assert_eq!(hades.stock, Stock::ZERO);
        assert!(hades.cover.is_none());
        assert!(hades.game.details.is_empty());
    }

    #[test]
    fn test_invalid_entries_are_counted() {
        let yaml = r"
games:
  - name: Negative
    platform: PC
    price: -1
    stock: 1
  - name: Nowhere
    platform: Dreamcast
    price: 5
    stock: 1
  - name: Fine
    platform: PS5
    price: 5
    stock: 1
";
        assert!(matches!(
            parse_catalog(yaml, Path::new(".")),
            Err(SeedError::Invalid(2))
        ));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let seed = SeedGame {
            name: "Game".to_owned(),
            details: String::new(),
            developer: String::new(),
            publisher: String::new(),
            platform: "PC".to_owned(),
            price: Decimal::ONE,
            stock: -3,
            cover: None,
        };
        assert!(matches!(
            seed.into_entry(Path::new(".")),
            Err(ValidationError::Stock(_))
        ));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            parse_catalog("games: [", Path::new(".")),
            Err(SeedError::Yaml(_))
        ));
    }

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

    const TWO_COVERS: &str = r"
games:
  - name: First
    platform: PC
    price: 5
    stock: 1
    cover: first.jpg
  - name: Second
    platform: PC
    price: 5
    stock: 1
    cover: second.jpg
";

    fn store(dir: &Path) -> CoverStore {
        CoverStore::new(dir.join("store"), 1024)
    }

    #[tokio::test]
    async fn test_catalog_dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, CATALOG).unwrap();
        std::fs::create_dir(dir.path().join("covers")).unwrap();
        std::fs::write(dir.path().join("covers/celeste.jpg"), JPEG).unwrap();

        let covers = store(dir.path());
        catalog(&path, &covers, true).await.unwrap();
        assert!(!covers.root().exists());
    }

    #[tokio::test]
    async fn test_dry_run_rejects_bad_cover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, TWO_COVERS).unwrap();
        std::fs::write(dir.path().join("first.jpg"), JPEG).unwrap();
        std::fs::write(dir.path().join("second.jpg"), b"not a jpeg").unwrap();

        let err = catalog(&path, &store(dir.path()), true).await.unwrap_err();
        assert!(matches!(err, SeedError::Invalid(1)));
    }

    #[tokio::test]
    async fn test_bad_second_cover_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yaml");
        std::fs::write(&path, TWO_COVERS).unwrap();
        std::fs::write(dir.path().join("first.jpg"), JPEG).unwrap();
        std::fs::write(dir.path().join("second.jpg"), b"not a jpeg").unwrap();

        // Fails during validation, before a database connection is opened.
        let covers = store(dir.path());
        let err = catalog(&path, &covers, false).await.unwrap_err();
        assert!(matches!(err, SeedError::Invalid(1)));
        assert!(!covers.exists("First").await);
        assert!(!covers.root().exists());
    }

    #[tokio::test]
    async fn test_load_covers_counts_missing_and_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.jpg"), b"GIF89a").unwrap();

        let mut entries = parse_catalog(TWO_COVERS, dir.path()).unwrap();
        let err = load_covers(&mut entries, &store(dir.path())).await.unwrap_err();
        assert!(matches!(err, SeedError::Invalid(2)));
    }

    #[tokio::test]
    async fn test_load_covers_reads_valid_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.jpg"), JPEG).unwrap();
        std::fs::write(dir.path().join("second.jpg"), JPEG).unwrap();

        let mut entries = parse_catalog(TWO_COVERS, dir.path()).unwrap();
        load_covers(&mut entries, &store(dir.path())).await.unwrap();
        assert!(entries.iter().all(|e| e.cover_bytes.as_deref() == Some(JPEG)));
    }

    #[tokio::test]
    async fn test_catalog_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = catalog(&dir.path().join("absent.yaml"), &store(dir.path()), true)
            .await
            .unwrap_err();
        assert!(matches!(err, SeedError::Read { .. }));
    }
}
