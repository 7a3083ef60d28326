//! Route definitions for the GTM administration API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/anotaciones", annotation_routes())
        .nest("/lubricentro", product_routes())
        .nest("/inventario-taller", workshop_routes())
        .nest("/herramientas", tool_routes())
        .nest("/reportes", report_routes())
        .route("/dashboard", get(handlers::get_dashboard))
}

/// Annotation routes
fn annotation_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_annotations).post(handlers::create_annotation),
        )
        .route("/rango", get(handlers::list_annotations_in_range))
        .route(
            "/:id",
            get(handlers::get_annotation)
                .put(handlers::update_annotation)
                .delete(handlers::delete_annotation),
        )
        .route("/:id/cancelar", post(handlers::cancel_annotation))
}

/// Lubricentro product routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
}

/// Workshop inventory routes
fn workshop_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_workshop_items).post(handlers::create_workshop_item),
        )
        .route("/ubicaciones", get(handlers::list_workshop_locations))
        .route(
            "/:id",
            get(handlers::get_workshop_item)
                .put(handlers::update_workshop_item)
                .delete(handlers::delete_workshop_item),
        )
}

/// Tool routes
fn tool_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_tools).post(handlers::create_tool))
        .route(
            "/:id",
            get(handlers::get_tool)
                .put(handlers::update_tool)
                .delete(handlers::delete_tool),
        )
}

/// Report routes
fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/ventas", get(handlers::get_sales_report))
        .route("/filtros", get(handlers::get_filters_report))
}
