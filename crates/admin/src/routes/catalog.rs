//! Category and subcategory management.
//!
//! Deleting a category takes its subcategories and their products with it
//! (`ON DELETE CASCADE`).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use gamestore_core::catalog::resolve_slug;
use gamestore_core::{CategoryId, SubcategoryId};
use gamestore_store::db::CategoryRepository;
use gamestore_store::models::{Category, Subcategory};

use super::{Flash, FlashQuery, flash_repository_error, page, redirect_with, sentence};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::AdminLayout;

/// New category form. A blank slug is derived from the name.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

/// New subcategory form.
#[derive(Debug, Deserialize)]
pub struct SubcategoryForm {
    pub category_id: i32,
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct SubcategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
}

/// A category with its subcategories.
#[derive(Debug, Clone)]
pub struct CategoryView {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub subcategories: Vec<SubcategoryView>,
}

/// Attach each subcategory to its category, keeping both orders.
fn group(categories: Vec<Category>, subcategories: &[Subcategory]) -> Vec<CategoryView> {
    categories
        .into_iter()
        .map(|c| CategoryView {
            subcategories: subcategories
                .iter()
                .filter(|s| s.category_id == c.id)
                .map(|s| SubcategoryView {
                    id: s.id.as_i32(),
                    name: s.name.clone(),
                    slug: s.slug.clone(),
                })
                .collect(),
            id: c.id.as_i32(),
            name: c.name,
            slug: c.slug,
        })
        .collect()
}

/// Categories page template.
#[derive(Template, WebTemplate)]
#[template(path = "categories.html")]
pub struct CategoriesTemplate {
    pub layout: AdminLayout,
    pub categories: Vec<CategoryView>,
}

/// Categories page handler.
#[instrument(skip(state, admin, flash))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<CategoriesTemplate> {
    let (_, layout) = page(&state, Some(&admin), "categories", flash).await?;

    let repo = CategoryRepository::new(state.pool());
    let categories = repo.list().await?;
    let subcategories = repo.list_subcategories().await?;

    Ok(CategoriesTemplate {
        layout,
        categories: group(categories, &subcategories),
    })
}

/// Create a category.
#[instrument(skip(state, admin, form))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<CategoryForm>,
) -> Result<Response> {
    let name = form.name.trim();
    let slug = match resolve_slug(name, Some(form.slug.as_str())) {
        Ok(slug) => slug,
        Err(e) => {
            return Ok(
                redirect_with("/categories", Flash::Error, &sentence(&e.to_string())).into_response(),
            );
        }
    };

    match CategoryRepository::new(state.pool()).create(name, &slug).await {
        Ok(category) => {
            tracing::info!(admin_id = %admin.id, category_id = %category.id, "Category created");
            Ok(redirect_with(
                "/categories",
                Flash::Success,
                &format!("Created {}", category.name),
            )
            .into_response())
        }
        Err(e) => flash_repository_error("/categories", e),
    }
}

/// Delete a category.
#[instrument(skip(state, admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match CategoryRepository::new(state.pool())
        .delete(CategoryId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, category_id = id, "Category deleted");
            Ok(redirect_with("/categories", Flash::Success, "Category deleted").into_response())
        }
        Err(e) => flash_repository_error("/categories", e),
    }
}

/// Create a subcategory.
#[instrument(skip(state, admin, form))]
pub async fn create_subcategory(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Form(form): Form<SubcategoryForm>,
) -> Result<Response> {
    let name = form.name.trim();
    let slug = match resolve_slug(name, Some(form.slug.as_str())) {
        Ok(slug) => slug,
        Err(e) => {
            return Ok(
                redirect_with("/categories", Flash::Error, &sentence(&e.to_string())).into_response(),
            );
        }
    };

    match CategoryRepository::new(state.pool())
        .create_subcategory(CategoryId::new(form.category_id), name, &slug)
        .await
    {
        Ok(sub) => {
            tracing::info!(admin_id = %admin.id, subcategory_id = %sub.id, "Subcategory created");
            Ok(redirect_with(
                "/categories",
                Flash::Success,
                &format!("Added {} to {}", sub.name, sub.category_name),
            )
            .into_response())
        }
        Err(e) => flash_repository_error("/categories", e),
    }
}

/// Delete a subcategory.
#[instrument(skip(state, admin))]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    match CategoryRepository::new(state.pool())
        .delete_subcategory(SubcategoryId::new(id))
        .await
    {
        Ok(()) => {
            tracing::info!(admin_id = %admin.id, subcategory_id = id, "Subcategory deleted");
            Ok(redirect_with("/categories", Flash::Success, "Subcategory deleted").into_response())
        }
        Err(e) => flash_repository_error("/categories", e),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn test_group_keeps_subcategories_with_their_category() {
        let categories = vec![
            Category {
                id: CategoryId::new(1),
                name: "Fortnite".to_owned(),
                slug: "fortnite".to_owned(),
                created_at: Utc::now(),
            },
            Category {
                id: CategoryId::new(2),
                name: "Roblox".to_owned(),
                slug: "roblox".to_owned(),
                created_at: Utc::now(),
            },
        ];
        let subcategories = vec![Subcategory {
            id: SubcategoryId::new(9),
            category_id: CategoryId::new(2),
            category_name: "Roblox".to_owned(),
            name: "Robux".to_owned(),
            slug: "robux".to_owned(),
            created_at: Utc::now(),
        }];

        let views = group(categories, &subcategories);
        assert!(views.first().unwrap().subcategories.is_empty());
        let roblox = views.get(1).unwrap();
        assert_eq!(roblox.subcategories.len(), 1);
        assert_eq!(roblox.subcategories.first().unwrap().id, 9);
    }
}
