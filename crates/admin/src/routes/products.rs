//! Product management: inventory table, create/edit forms and sales.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use gamestore_core::catalog::{
    CatalogError, ProductSort, SalePercentage, check_price, parse_specifications,
};
use gamestore_core::{Money, ProductId, SubcategoryId};
use gamestore_store::RepositoryError;
use gamestore_store::db::{CategoryRepository, ProductRepository};
use gamestore_store::models::{NewProduct, ProductUpdate};

use super::{Flash, FlashQuery, page, redirect_with, sentence};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::{AdminLayout, ProductRow};

// =============================================================================
// Form Types
// =============================================================================

/// `?q=` name search and `?sort=` column.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

/// Create/edit form. `subcategory_id` is only read on create.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub subcategory_id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: String,
    pub stock: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub specifications: String,
}

/// Start-sale form.
#[derive(Debug, Deserialize)]
pub struct SaleForm {
    pub percentage: String,
}

/// Reasons a product form is rejected.
#[derive(Debug, Error)]
pub enum ProductFormError {
    #[error("name is required")]
    MissingName,
    #[error("'{0}' is not a valid price")]
    InvalidPrice(String),
    #[error("'{0}' is not a valid stock count")]
    InvalidStock(String),
    #[error("choose a subcategory")]
    MissingSubcategory,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl ProductForm {
    /// Validate the editable fields.
    ///
    /// # Errors
    ///
    /// Returns [`ProductFormError`] for a blank name, an unparsable, negative
    /// or oversized price, a negative stock, or specifications that are not a
    /// JSON object.
    pub fn to_update(&self) -> std::result::Result<ProductUpdate, ProductFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ProductFormError::MissingName);
        }

        let price: Money = self
            .price
            .parse()
            .map_err(|_| ProductFormError::InvalidPrice(self.price.clone()))?;
        let price = check_price(price)?;

        let stock: i32 = self
            .stock
            .trim()
            .parse()
            .map_err(|_| ProductFormError::InvalidStock(self.stock.clone()))?;
        if stock < 0 {
            return Err(CatalogError::Negative("stock").into());
        }

        let image_url = Some(self.image_url.trim())
            .filter(|u| !u.is_empty())
            .map(ToOwned::to_owned);

        Ok(ProductUpdate {
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            price,
            image_url,
            stock,
            specifications: parse_specifications(&self.specifications)?,
        })
    }

    /// Validate a new product.
    ///
    /// # Errors
    ///
    /// As [`Self::to_update`], plus a missing subcategory.
    pub fn to_new(&self) -> std::result::Result<NewProduct, ProductFormError> {
        let subcategory_id = self
            .subcategory_id
            .map(SubcategoryId::new)
            .ok_or(ProductFormError::MissingSubcategory)?;
        let fields = self.to_update()?;
        Ok(NewProduct {
            subcategory_id,
            name: fields.name,
            description: fields.description,
            price: fields.price,
            image_url: fields.image_url,
            stock: fields.stock,
            specifications: fields.specifications,
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Subcategory choice in the create form.
#[derive(Debug, Clone)]
pub struct SubcategoryOption {
    pub id: i32,
    pub label: String,
}

/// Sort choice in the product table header.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub value: &'static str,
    pub selected: bool,
}

/// Product table template.
#[derive(Template, WebTemplate)]
#[template(path = "products/index.html")]
pub struct ProductsTemplate {
    pub layout: AdminLayout,
    pub products: Vec<ProductRow>,
    pub subcategories: Vec<SubcategoryOption>,
    pub query: String,
    pub sorts: Vec<SortOption>,
    pub sale_presets: Vec<u8>,
    pub low_stock_threshold: i32,
}

/// Product edit template.
#[derive(Template, WebTemplate)]
#[template(path = "products/edit.html")]
pub struct EditProductTemplate {
    pub layout: AdminLayout,
    pub product: ProductRow,
    pub sale_presets: Vec<u8>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Product table with search and sort.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(list): Query<ProductListQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<ProductsTemplate> {
    let (settings, layout) = page(&state, Some(&admin), "products", flash).await?;

    let sort: ProductSort = list
        .sort
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or_default();
    let query = list.q.unwrap_or_default().trim().to_owned();
    let search = Some(query.as_str()).filter(|q| !q.is_empty());

    let products = ProductRepository::new(state.pool())
        .search(search, sort)
        .await?
        .iter()
        .map(|l| ProductRow::new(l, &settings))
        .collect();

    let subcategories = CategoryRepository::new(state.pool())
        .list_subcategories()
        .await?
        .into_iter()
        .map(|s| SubcategoryOption {
            id: s.id.as_i32(),
            label: format!("{} / {}", s.category_name, s.name),
        })
        .collect();

    Ok(ProductsTemplate {
        layout,
        products,
        subcategories,
        query,
        sorts: [
            ProductSort::Name,
            ProductSort::Price,
            ProductSort::Stock,
            ProductSort::Category,
        ]
        .into_iter()
        .map(|s| SortOption {
            value: s.as_str(),
            selected: s == sort,
        })
        .collect(),
        sale_presets: SalePercentage::PRESETS.to_vec(),
        low_stock_threshold: settings.low_stock_threshold,
    })
}

/// Create a product.
#[instrument(skip(state, admin, form))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let new = match form.to_new() {
        Ok(new) => new,
        Err(e) => {
            return Ok(
                redirect_with("/products", Flash::Error, &sentence(&e.to_string())).into_response(),
            );
        }
    };

    match ProductRepository::new(state.pool()).create(&new).await {
        Ok(product) => {
            tracing::info!(admin_id = %admin.id, product_id = %product.id, "Product created");
            Ok(redirect_with(
                "/products",
                Flash::Success,
                &format!("Created {}", product.name),
            )
            .into_response())
        }
        Err(RepositoryError::NotFound) => Ok(redirect_with(
            "/products",
            Flash::Error,
            "That subcategory no longer exists",
        )
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Edit form.
#[instrument(skip(state, admin, flash))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<EditProductTemplate> {
    let (settings, layout) = page(&state, Some(&admin), "products", flash).await?;

    let listing = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(EditProductTemplate {
        layout,
        product: ProductRow::new(&listing, &settings),
        sale_presets: SalePercentage::PRESETS.to_vec(),
    })
}

/// Save the edit form.
#[instrument(skip(state, admin, form))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
    Form(form): Form<ProductForm>,
) -> Result<Response> {
    let edit_path = format!("/products/{id}/edit");
    let update = match form.to_update() {
        Ok(update) => update,
        Err(e) => {
            return Ok(
                redirect_with(&edit_path, Flash::Error, &sentence(&e.to_string())).into_response(),
            );
        }
    };

    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &update)
        .await?;
    tracing::info!(admin_id = %admin.id, product_id = %product.id, "Product updated");

    Ok(redirect_with(&edit_path, Flash::Success, "Product saved").into_response())
}

/// Delete a product. Cart lines referencing it go with it.
#[instrument(skip(state, admin))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match ProductRepository::new(state.pool())
        .delete(ProductId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, product_id = id, "Product deleted");
            Ok(redirect_with("/products", Flash::Success, "Product deleted").into_response())
        }
        Err(RepositoryError::NotFound) => {
            Ok(redirect_with("/products", Flash::Error, "Product not found").into_response())
        }
        Err(e) => Err(e.into()),
    }
}

/// Put a product on sale at the posted percentage.
#[instrument(skip(state, admin, form))]
pub async fn start_sale(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
    Form(form): Form<SaleForm>,
) -> Result<Response> {
    let pct = form
        .percentage
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(|p| SalePercentage::new(p).ok());
    let pct = match pct {
        Some(pct) => pct,
        None => {
            return Ok(redirect_with(
                "/products",
                Flash::Error,
                "Sale percentage must be a whole number between 1 and 99",
            )
            .into_response());
        }
    };

    let product = ProductRepository::new(state.pool())
        .start_sale(ProductId::new(id), pct)
        .await?;
    tracing::info!(
        admin_id = %admin.id,
        product_id = %product.id,
        percentage = pct.get(),
        "Sale started"
    );

    Ok(redirect_with(
        "/products",
        Flash::Success,
        &format!("{} is now {}% off", product.name, pct.get()),
    )
    .into_response())
}

/// End a product's sale.
#[instrument(skip(state, admin))]
pub async fn end_sale(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let product = ProductRepository::new(state.pool())
        .end_sale(ProductId::new(id))
        .await?;
    tracing::info!(admin_id = %admin.id, product_id = %product.id, "Sale ended");

    Ok(redirect_with(
        "/products",
        Flash::Success,
        &format!("Sale removed from {}", product.name),
    )
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(price: &str, stock: &str, specs: &str) -> ProductForm {
        ProductForm {
            subcategory_id: Some(2),
            name: "  Gem Pack  ".to_owned(),
            description: "500 gems".to_owned(),
            price: price.to_owned(),
            stock: stock.to_owned(),
            image_url: "   ".to_owned(),
            specifications: specs.to_owned(),
        }
    }

    #[test]
    fn test_valid_form() {
        let new = form("4.99", "10", r#"{"rarity":"rare"}"#).to_new().unwrap();
        assert_eq!(new.name, "Gem Pack");
        assert_eq!(new.price, Money::from_cents(499));
        assert_eq!(new.stock, 10);
        assert_eq!(new.image_url, None);
        assert_eq!(new.subcategory_id, SubcategoryId::new(2));
        assert_eq!(new.specifications.get("rarity").unwrap(), "rare");
    }

    #[test]
    fn test_blank_specifications_are_empty() {
        let update = form("1", "0", "").to_update().unwrap();
        assert!(update.specifications.is_empty());
    }

    #[test]
    fn test_rejects_bad_numbers() {
        assert!(matches!(
            form("abc", "1", "").to_update(),
            Err(ProductFormError::InvalidPrice(_))
        ));
        assert!(matches!(
            form("-1", "1", "").to_update(),
            Err(ProductFormError::Catalog(CatalogError::Negative("price")))
        ));
        assert!(matches!(
            form("100000000", "1", "").to_update(),
            Err(ProductFormError::Catalog(CatalogError::PriceTooLarge))
        ));
        assert!(form("99999999.99", "1", "").to_update().is_ok());
        assert!(matches!(
            form("1", "-3", "").to_update(),
            Err(ProductFormError::Catalog(CatalogError::Negative("stock")))
        ));
        assert!(matches!(
            form("1", "1", "[1,2]").to_update(),
            Err(ProductFormError::Catalog(CatalogError::InvalidSpecifications(_)))
        ));
    }

    #[test]
    fn test_create_requires_subcategory_and_name() {
        let mut f = form("1", "1", "");
        f.subcategory_id = None;
        assert!(matches!(f.to_new(), Err(ProductFormError::MissingSubcategory)));

        let mut f = form("1", "1", "");
        f.name = " ".to_owned();
        assert!(matches!(f.to_update(), Err(ProductFormError::MissingName)));
    }
}
