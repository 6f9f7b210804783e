//! Admin guide, rendered from the markdown bundled into the binary.

use std::sync::LazyLock;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use comrak::{Options, markdown_to_html};
use tracing::instrument;

use super::{FlashQuery, page};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;
use crate::views::AdminLayout;

const GUIDE_MARKDOWN: &str = include_str!("../../content/guide.md");

/// Rendered once on first view.
static GUIDE_HTML: LazyLock<String> = LazyLock::new(|| render(GUIDE_MARKDOWN));

/// Admin guide template.
#[derive(Template, WebTemplate)]
#[template(path = "guide.html")]
pub struct GuideTemplate {
    pub layout: AdminLayout,
    pub html: &'static str,
}

/// Admin guide page handler.
#[instrument(skip(state, admin, flash))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdminAuth(admin): RequireAdminAuth,
    Query(flash): Query<FlashQuery>,
) -> Result<GuideTemplate> {
    let (_, layout) = page(&state, Some(&admin), "guide", flash).await?;
    Ok(GuideTemplate {
        layout,
        html: GUIDE_HTML.as_str(),
    })
}

fn render(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());

    markdown_to_html(markdown, &options)
}
