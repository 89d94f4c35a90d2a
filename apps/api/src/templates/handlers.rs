use axum::{
    extract::{Path, Query},
    Json,
};

use crate::errors::AppError;
use crate::templates::catalog::{find_template, list_templates, Template, TemplateFilter};

/// GET /api/v1/templates
pub async fn handle_list_templates(
    Query(filter): Query<TemplateFilter>,
) -> Json<Vec<&'static Template>> {
    Json(list_templates(&filter))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(Path(id): Path<i32>) -> Result<Json<&'static Template>, AppError> {
    find_template(id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))
}
