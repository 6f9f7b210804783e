//! Catalog route handlers: home listing, category pages, product detail.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use tracing::instrument;

use gamestore_core::ProductId;
use gamestore_store::db::{CategoryRepository, ProductRepository};
use gamestore_store::models::Category;

use super::{FlashQuery, page};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::state::AppState;
use crate::views::{Layout, ProductView};

/// `?q=` name search on the home page.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Products of one subcategory on a category page.
#[derive(Debug, Clone)]
pub struct SubcategorySection {
    pub name: String,
    pub products: Vec<ProductView>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
    pub products: Vec<ProductView>,
    pub query: String,
}

/// Category page template.
#[derive(Template, WebTemplate)]
#[template(path = "category.html")]
pub struct CategoryTemplate {
    pub layout: Layout,
    pub categories: Vec<Category>,
    pub category: Category,
    pub sections: Vec<SubcategorySection>,
    /// This page, for add-to-cart forms to return to.
    pub path: String,
}

/// Product detail template.
#[derive(Template, WebTemplate)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub layout: Layout,
    pub product: ProductView,
    pub delivery_time: Option<String>,
    pub signed_in: bool,
}

/// Catalog, newest first, optionally filtered by name.
#[instrument(skip(state, user, flash))]
pub async fn home(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Query(search): Query<SearchQuery>,
    Query(flash): Query<FlashQuery>,
) -> Result<HomeTemplate> {
    let (settings, layout) = page(&state, user.as_ref(), flash).await?;

    let query = search.q.map(|q| q.trim().to_owned()).unwrap_or_default();
    let term = (!query.is_empty()).then_some(query.as_str());

    let categories = CategoryRepository::new(state.pool()).list().await?;
    let products = ProductRepository::new(state.pool())
        .list_newest(term)
        .await?
        .iter()
        .map(|l| ProductView::new(l, &settings))
        .collect();

    Ok(HomeTemplate {
        layout,
        categories,
        products,
        query,
    })
}

/// One category with its products grouped by subcategory.
#[instrument(skip(state, user, flash))]
pub async fn category(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(slug): Path<String>,
    Query(flash): Query<FlashQuery>,
) -> Result<CategoryTemplate> {
    let (settings, layout) = page(&state, user.as_ref(), flash).await?;

    let repo = CategoryRepository::new(state.pool());
    let category = repo
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;
    let categories = repo.list().await?;
    let subcategories = repo.subcategories_of(category.id).await?;

    let listings = ProductRepository::new(state.pool())
        .list_in_category(category.id)
        .await?;

    let sections = subcategories
        .into_iter()
        .map(|sub| SubcategorySection {
            products: listings
                .iter()
                .filter(|l| l.product.subcategory_id == sub.id)
                .map(|l| ProductView::new(l, &settings))
                .collect(),
            name: sub.name,
        })
        .collect();

    Ok(CategoryTemplate {
        layout,
        categories,
        path: format!("/categories/{}", category.slug),
        category,
        sections,
    })
}

/// Product detail page.
#[instrument(skip(state, user, flash))]
pub async fn product(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<i32>,
    Query(flash): Query<FlashQuery>,
) -> Result<ProductTemplate> {
    let (settings, layout) = page(&state, user.as_ref(), flash).await?;

    let listing = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(ProductTemplate {
        layout,
        product: ProductView::new(&listing, &settings),
        delivery_time: settings.delivery_time.clone(),
        signed_in: user.is_some(),
    })
}
