use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::auth::{JwtError, JwtVerifier};
use crate::config::AppConfig;
use crate::middleware::RateLimiter;
use crate::services::{
    EdgeService, FormPublisher, FormService, PgVersionStore, ProjectService, QuestionService,
    ResponseService, SubmissionResolver, TeamService, UploadService, VersionStore,
};
use crate::storage::ObjectStorage;

/// Everything a handler can reach, built once at startup
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub pool: PgPool,
    pub teams: Arc<TeamService>,
    pub projects: Arc<ProjectService>,
    pub forms: Arc<FormService>,
    pub questions: Arc<QuestionService>,
    pub edges: Arc<EdgeService>,
    pub responses: Arc<ResponseService>,
    pub versions: Arc<dyn VersionStore>,
    pub publisher: Arc<FormPublisher>,
    pub resolver: Arc<SubmissionResolver>,
    pub uploads: Arc<UploadService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub jwt: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(config: AppConfig, pool: PgPool, storage: Arc<dyn ObjectStorage>) -> Result<Self, JwtError> {
        let base_domain = config.public.base_domain.clone();

        let versions: Arc<dyn VersionStore> = Arc::new(PgVersionStore::new(pool.clone()));
        let forms = Arc::new(FormService::new(pool.clone(), base_domain.clone()));
        let resolver = Arc::new(SubmissionResolver::new(forms.clone(), versions.clone(), base_domain));
        let publisher = Arc::new(FormPublisher::new(versions.clone()));
        let uploads = Arc::new(UploadService::new(storage, &config.storage));
        let rate_limiter = Arc::new(RateLimiter::new(
            config.api.rate_limit_requests,
            Duration::from_secs(config.api.rate_limit_window_secs),
        ));
        let jwt = Arc::new(JwtVerifier::new(&config.security)?);

        Ok(Self {
            teams: Arc::new(TeamService::new(pool.clone())),
            projects: Arc::new(ProjectService::new(pool.clone())),
            questions: Arc::new(QuestionService::new(pool.clone())),
            edges: Arc::new(EdgeService::new(pool.clone())),
            responses: Arc::new(ResponseService::new(pool.clone())),
            config: Arc::new(config),
            pool,
            forms,
            versions,
            publisher,
            resolver,
            uploads,
            rate_limiter,
            jwt,
        })
    }
}
