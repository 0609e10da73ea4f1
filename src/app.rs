use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::{jwt_auth_middleware, rate_limit_middleware};
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let config = state.config.clone();

    let protected = protected_routes().route_layer(middleware::from_fn_with_state(
        state.jwt.clone(),
        jwt_auth_middleware,
    ));

    let mut api = Router::new().merge(submission_routes()).merge(protected);
    if config.api.enable_rate_limiting {
        api = api.layer(middleware::from_fn_with_state(
            state.rate_limiter.clone(),
            rate_limit_middleware,
        ));
    }

    let mut app = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));

    if config.security.enable_cors {
        app = app.layer(cors_layer(&config.security));
    }
    if config.api.enable_request_logging {
        app = app.layer(TraceLayer::new_for_http());
    }

    app.with_state(state)
}

/// Anonymous respondent endpoints, keyed by the form's public domain
fn submission_routes() -> Router<AppState> {
    use public::submission;

    Router::new()
        .route("/submission/:domain", get(submission::show))
        .route("/submission/:domain/responses", post(submission::start_response))
        .route(
            "/submission/:domain/responses/:response_id",
            put(submission::submit_response),
        )
        .route("/submission/:domain/uploads", post(submission::upload))
}

fn protected_routes() -> Router<AppState> {
    use protected::{dashboard, edges, forms, projects, questions, responses, teams, uploads, versions};

    Router::new()
        // Teams and membership
        .route("/teams", get(teams::list).post(teams::create))
        .route(
            "/teams/:team_id",
            get(teams::show).patch(teams::rename).delete(teams::delete),
        )
        .route("/teams/:team_id/members", get(teams::members).post(teams::add_member))
        .route("/teams/:team_id/members/:user_id", axum::routing::delete(teams::remove_member))
        // Projects
        .route("/teams/:team_id/projects", get(projects::list).post(projects::create))
        .route(
            "/projects/:project_id",
            get(projects::show).patch(projects::update).delete(projects::delete),
        )
        // Forms
        .route("/projects/:project_id/forms", get(forms::list).post(forms::create))
        .route(
            "/forms/:form_id",
            get(forms::show).patch(forms::update).delete(forms::delete),
        )
        .route("/forms/:form_id/publish", post(versions::publish))
        .route("/forms/:form_id/draft", post(versions::save_draft))
        .route("/forms/:form_id/versions", get(versions::list))
        .route("/forms/:form_id/versions/:version_id", get(versions::show))
        // Questions and edges
        .route("/forms/:form_id/questions", get(questions::list).post(questions::create))
        .route(
            "/questions/:question_id",
            get(questions::show).patch(questions::update).delete(questions::delete),
        )
        .route("/forms/:form_id/edges", get(edges::list).post(edges::create))
        .route("/edges/:edge_id", axum::routing::patch(edges::update).delete(edges::delete))
        // Files
        .route("/forms/:form_id/uploads", post(uploads::presign_upload).delete(uploads::delete))
        .route("/forms/:form_id/uploads/download", post(uploads::presign_download))
        // Results
        .route("/forms/:form_id/dashboard", get(dashboard::show))
        .route("/forms/:form_id/responses", get(responses::list))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if security.cors_origins.is_empty() || security.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}
