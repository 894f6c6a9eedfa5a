use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{handlers, middleware, state::AppState};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(24 * 60 * 60))
}

pub fn build_router(state: AppState) -> Router {
    // Build public routes (no auth)
    let public_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth::login))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        );

    // Build user-protected routes (auth required)
    let user_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/session-status", get(handlers::auth::session_status))
        .route(
            "/api/users/change-password",
            put(handlers::auth::change_password),
        )
        .route(
            "/api/users/{username}/details",
            get(handlers::users::user_details),
        )
        .route(
            "/api/user/theme",
            get(handlers::users::get_theme).put(handlers::users::update_theme),
        )
        .route("/api/profile/get", get(handlers::profile::get_profile))
        .route("/api/profile/update", put(handlers::profile::update_profile))
        .route(
            "/api/academics/list",
            get(handlers::academics::list_academics),
        )
        .route(
            "/api/academics/{id}/view",
            get(handlers::academics::view_academic),
        )
        .route(
            "/api/academics/add",
            post(handlers::academics::add_academic),
        )
        .route(
            "/api/academics/{id}",
            put(handlers::academics::update_academic)
                .delete(handlers::academics::delete_academic),
        )
        .route("/api/students/list", get(handlers::students::list_students))
        .route("/api/students/add", post(handlers::students::add_student))
        .route(
            "/api/students/{id}/view",
            get(handlers::students::view_student),
        )
        .route(
            "/api/students/{id}",
            put(handlers::students::update_student).delete(handlers::students::delete_student),
        )
        .route("/api/events/list", get(handlers::events::list_events))
        .route("/api/events/add", post(handlers::events::add_event))
        .route(
            "/api/events/{id}/register",
            post(handlers::events::register_for_event),
        )
        .route(
            "/api/events/{id}/registrations",
            get(handlers::events::event_registrations),
        )
        .route(
            "/api/timetable/list",
            get(handlers::timetable::list_timetable),
        )
        .route(
            "/api/timetable/add",
            post(handlers::timetable::add_timetable_entry),
        )
        .route(
            "/api/timetable/{id}",
            put(handlers::timetable::update_timetable_entry)
                .delete(handlers::timetable::delete_timetable_entry),
        )
        .route(
            "/api/dashboard/stats",
            get(handlers::dashboard::dashboard_stats),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth,
        ));

    // Build admin-protected routes (auth + admin role)
    let admin_routes = Router::new()
        .route("/api/users/list", get(handlers::admin::list_users))
        .route("/api/users/add", post(handlers::admin::add_user))
        .route(
            "/api/users/{username}/status",
            put(handlers::admin::update_user_status),
        )
        .route(
            "/api/activities/list",
            get(handlers::admin::list_activities),
        )
        .route("/api/data/clear", post(handlers::admin::clear_data))
        .route("/api/backup/create", post(handlers::admin::create_backup))
        .route(
            "/api/export/{data_type}",
            get(handlers::admin::export_data),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::auth_admin,
        ));

    // Compose app with shared layers and shared state; the first layer listed is outermost
    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(middleware::request_id::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config.cors_allow_origins))
                .layer(axum_middleware::from_fn(
                    middleware::logging::log_error_responses,
                ))
                .layer(axum_middleware::from_fn_with_state(
                    state.clone(),
                    middleware::error_boundary::error_boundary,
                ))
                .layer(CatchPanicLayer::custom(
                    middleware::error_boundary::panic_response,
                )),
        )
        .with_state(state)
}
