//! Seed commands: a catalog from YAML, and the demo accounts.
//!
//! # Catalog file format
//!
//! ```yaml
//! categories:
//!   - name: Fortnite
//!     slug: fortnite            # optional, derived from the name
//!     subcategories:
//!       - name: V-Bucks
//!         products:
//!           - name: 1,000 V-Bucks
//!             description: Delivered as a gift within 24 hours
//!             price: "7.99"
//!             stock: 40
//!             specifications:
//!               rarity: common
//! ```
//!
//! Existing categories and subcategories (matched by slug) are reused.
//! Products are only inserted into subcategories this run created, so
//! re-running the same file does not duplicate them.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use gamestore_core::Money;
use gamestore_core::catalog::{CatalogError, check_price, resolve_slug};
use gamestore_core::settings::DEMO_ACCOUNTS;
use gamestore_store::RepositoryError;
use gamestore_store::db::{CategoryRepository, ProductRepository};
use gamestore_store::models::NewProduct;
use gamestore_store::services::{AuthError, AuthService};

use super::{DATABASE_URL_VAR, connect, database_url};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Could not read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} validation errors found")]
    Invalid(usize),

    #[error("Database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<CategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub subcategories: Vec<SubcategorySeed>,
}

#[derive(Debug, Deserialize)]
pub struct SubcategorySeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
    #[serde(default)]
    pub specifications: serde_json::Map<String, serde_json::Value>,
}

/// A product that passed validation, waiting for its subcategory ID.
#[derive(Debug)]
struct ProductDraft {
    name: String,
    description: String,
    price: Money,
    stock: i32,
    image_url: Option<String>,
    specifications: serde_json::Map<String, serde_json::Value>,
}

impl ProductSeed {
    fn validate(&self) -> Result<ProductDraft, String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("product name is empty".to_owned());
        }
        let price: Money = self
            .price
            .parse()
            .map_err(|_| format!("{name}: '{}' is not a valid price", self.price))?;
        let price = check_price(price).map_err(|e| format!("{name}: {e}"))?;
        if self.stock < 0 {
            return Err(format!("{name}: {}", CatalogError::Negative("stock")));
        }

        Ok(ProductDraft {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            stock: self.stock,
            image_url: self
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(ToOwned::to_owned),
            specifications: self.specifications.clone(),
        })
    }
}

/// Every problem in the file, so they can be fixed in one pass.
fn validate_catalog(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    for category in &file.categories {
        if let Err(e) = resolve_slug(&category.name, category.slug.as_deref()) {
            errors.push(format!("category '{}': {e}", category.name));
        }
        for sub in &category.subcategories {
            if let Err(e) = resolve_slug(&sub.name, sub.slug.as_deref()) {
                errors.push(format!("subcategory '{}': {e}", sub.name));
            }
            for product in &sub.products {
                if let Err(e) = product.validate() {
                    errors.push(e);
                }
            }
        }
    }

    errors
}

// =============================================================================
// Commands
// =============================================================================

/// Totals reported after a catalog seed.
#[derive(Debug, Default)]
struct SeedSummary {
    categories: usize,
    subcategories: usize,
    products: usize,
    skipped_subcategories: usize,
}

/// Load a catalog from a YAML file.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or a database
/// operation fails.
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let url = database_url().ok_or(SeedError::MissingEnvVar(DATABASE_URL_VAR))?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&file);
    if !errors.is_empty() {
        tracing::error!("Catalog validation failed:");
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect(&url).await?;
    let categories = CategoryRepository::new(&pool);
    let products = ProductRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for category_seed in &file.categories {
        let slug = resolve_slug(&category_seed.name, category_seed.slug.as_deref())
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
        let category = if let Some(existing) = categories.get_by_slug(&slug).await? {
            existing
        } else {
            summary.categories += 1;
            categories.create(category_seed.name.trim(), &slug).await?
        };

        let existing_subs = categories.subcategories_of(category.id).await?;

        for sub_seed in &category_seed.subcategories {
            let sub_slug = resolve_slug(&sub_seed.name, sub_seed.slug.as_deref())
                .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;
            if existing_subs.iter().any(|s| s.slug == sub_slug) {
                summary.skipped_subcategories += 1;
                warn!(
                    category = %category.name,
                    subcategory = %sub_seed.name,
                    "Subcategory already exists, skipping its products"
                );
                continue;
            }

            let sub = categories
                .create_subcategory(category.id, sub_seed.name.trim(), &sub_slug)
                .await?;
            summary.subcategories += 1;

            for product_seed in &sub_seed.products {
                let draft = product_seed
                    .validate()
                    .map_err(RepositoryError::DataCorruption)?;
                products
                    .create(&NewProduct {
                        subcategory_id: sub.id,
                        name: draft.name,
                        description: draft.description,
                        price: draft.price,
                        image_url: draft.image_url,
                        stock: draft.stock,
                        specifications: draft.specifications,
                    })
                    .await?;
                summary.products += 1;
            }
        }
    }

    info!("Seeding complete!");
    info!("  Categories created: {}", summary.categories);
    info!("  Subcategories created: {}", summary.subcategories);
    info!("  Products created: {}", summary.products);
    if summary.skipped_subcategories > 0 {
        info!(
            "  Subcategories skipped (already exist): {}",
            summary.skipped_subcategories
        );
    }

    Ok(())
}

/// Create the demo accounts. Existing shopper accounts are left alone; the
/// demo admin always ends up with admin rights and the demo password.
///
/// # Errors
///
/// Returns an error if a database operation fails.
pub async fn demo() -> Result<(), SeedError> {
    let url = database_url().ok_or(SeedError::MissingEnvVar(DATABASE_URL_VAR))?;
    let pool = connect(&url).await?;
    let auth = AuthService::new(&pool);

    for account in DEMO_ACCOUNTS {
        if account.is_admin {
            auth.ensure_admin(account.email, account.password).await?;
            info!(email = account.email, "Demo admin ready");
            continue;
        }

        match auth
            .register(account.email, account.password, account.password)
            .await
        {
            Ok(_) => info!(email = account.email, "Demo shopper created"),
            Err(AuthError::UserAlreadyExists) => {
                info!(email = account.email, "Demo shopper already exists");
            }
            Err(e) => return Err(e.into()),
        }
    }

    warn!("Demo accounts use published passwords; turn testing mode off in production");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - name: Fortnite
    subcategories:
      - name: V-Bucks
        products:
          - name: 1,000 V-Bucks
            price: "7.99"
            stock: 40
            specifications:
              rarity: common
              platform: PC
  - name: Roblox
    slug: rbx
    subcategories: []
"#;

    #[test]
    fn test_parse_sample() {
        let file: CatalogFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(file.categories.len(), 2);
        assert!(validate_catalog(&file).is_empty());

        let product = file
            .categories
            .first()
            .unwrap()
            .subcategories
            .first()
            .unwrap()
            .products
            .first()
            .unwrap();
        let draft = product.validate().unwrap();
        assert_eq!(draft.price.to_string(), "7.99");
        assert_eq!(
            draft.specifications.get("rarity").unwrap(),
            &serde_json::json!("common")
        );
        assert_eq!(draft.image_url, None);
    }

    #[test]
    fn test_validation_collects_every_error() {
        let file: CatalogFile = serde_yaml::from_str(
            r#"
categories:
  - name: "!!!"
    subcategories:
      - name: Items
        products:
          - name: Sword
            price: "abc"
          - name: Shield
            price: "-1.00"
          - name: Bow
            price: "2.00"
            stock: -3
          - name: Crown
            price: "100000000.00"
"#,
        )
        .unwrap();

        let errors = validate_catalog(&file);
        assert_eq!(errors.len(), 5, "{errors:?}");
        assert!(errors.iter().any(|e| e.starts_with("Crown: price cannot be more than")));
        assert!(errors.iter().any(|e| e.contains("'abc' is not a valid price")));
        assert!(errors.iter().any(|e| e.starts_with("Bow")));
    }

    #[test]
    fn test_bundled_catalog_is_valid() {
        let file: CatalogFile =
            serde_yaml::from_str(include_str!("../../seed/catalog.yaml")).unwrap();
        assert!(!file.categories.is_empty());
        assert!(validate_catalog(&file).is_empty());
    }
}
