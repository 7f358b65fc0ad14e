//! Router assembly. Public routes are open; everything in `protected_routes`
//! runs behind `jwt_auth_middleware`.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::{config, SecurityConfig};
use crate::handlers::{protected, public};
use crate::images::ImageHost;
use crate::middleware::jwt_auth_middleware;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// `None` when no image host is configured; uploads answer 503
    pub images: Option<Arc<dyn ImageHost>>,
}

impl AppState {
    pub fn new(pool: PgPool, images: Option<Arc<dyn ImageHost>>) -> Self {
        Self { pool, images }
    }
}

pub fn app(state: AppState) -> Router {
    let api = &config().api;

    let router = Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(auth_public_routes())
        .merge(catalog_routes())
        .merge(protected_routes())
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(api.max_request_size_bytes))
                .layer(cors_layer(&config().security))
                .layer(DefaultBodyLimit::disable()),
        );

    let router = if api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use public::auth;

    Router::new()
        .route("/auth/login/customer", post(auth::login_customer))
        .route("/auth/login/employee", post(auth::login_employee))
        .route("/auth/register", post(auth::register))
}

fn catalog_routes() -> Router<AppState> {
    use public::catalog;

    Router::new()
        .route("/api/products", get(catalog::product_list))
        .route("/api/products/:id", get(catalog::product_get))
        .route("/api/categories", get(catalog::category_list))
        .route("/api/categories/:id", get(catalog::category_get))
}

// Write methods on the catalog paths merge with the public GETs above; the
// auth layer wraps only the methods registered here.
fn protected_routes() -> Router<AppState> {
    use protected::{categories, customers, employees, orders, products};

    Router::new()
        .route("/api/auth/whoami", get(protected::whoami))
        // Catalog maintenance
        .route("/api/categories", post(categories::create))
        .route("/api/categories/:id", put(categories::update).delete(categories::delete))
        .route("/api/products", post(products::create))
        .route("/api/products/:id", put(products::update).delete(products::delete))
        .route("/api/products/:id/images", post(products::upload_image))
        .route("/api/products/:id/images/:image_id", delete(products::delete_image))
        // People
        .route("/api/customers", get(customers::list))
        .route(
            "/api/customers/:id",
            get(customers::get).put(customers::update).delete(customers::delete),
        )
        .route("/api/employees", get(employees::list).post(employees::create))
        .route(
            "/api/employees/:id",
            get(employees::get).put(employees::update).delete(employees::delete),
        )
        // Orders
        .route("/api/orders", get(orders::list).post(orders::create))
        .route("/api/orders/:id", get(orders::get).delete(orders::cancel))
        .route("/api/orders/:id/status", put(orders::update_status))
        .route_layer(from_fn(jwt_auth_middleware))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
