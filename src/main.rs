use std::{process, sync::Arc, time::Duration};

use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use tsunagu::{
    application::{
        admin::{
            dashboard::AdminDashboardService, faqs::AdminFaqService, grants::AdminGrantService,
            interviews::AdminInterviewService, media::AdminMediaService, news::AdminNewsService,
            organizations::AdminOrganizationService, taxonomy::AdminTaxonomyService,
        },
        auth::AdminAuthService,
        error::AppError,
        ordering::SortOrderService,
        repos::{
            FaqsRepo, FaqsWriteRepo, GrantsRepo, GrantsWriteRepo, HealthRepo, InterviewsRepo,
            InterviewsWriteRepo, NewsRepo, NewsWriteRepo, OrganizationsRepo,
            OrganizationsWriteRepo, SlugRepo, SortOrderRepo, StatsRepo, TaxonomyRepo,
            TaxonomyWriteRepo,
        },
        site::SiteService,
        slugs::UniqueSlugResolver,
        storage::ObjectStore,
        summary::SummaryGenerator,
    },
    config,
    infra::{
        db::{ClientRole, PostgresRepositories},
        error::InfraError,
        http::{self, AdminState, AuthState, HttpState, LoginRateLimiter, RouterState},
        storage::LocalObjectStore,
        summary::GeminiSummaryClient,
        telemetry,
    },
    presentation::views::SiteIdentity,
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

fn database_error(err: impl std::fmt::Display) -> AppError {
    AppError::from(InfraError::database(err.to_string()))
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = require_url(settings.database.url.as_deref(), "database url")?;
    let pool = PostgresRepositories::connect(database_url, 1, ClientRole::Service)
        .await
        .map_err(database_error)?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(target = "tsunagu::migrate", "migrations applied");
    Ok(())
}

fn require_url<'a>(value: Option<&'a str>, what: &str) -> Result<&'a str, AppError> {
    value
        .ok_or_else(|| InfraError::configuration(format!("{what} is not configured")))
        .map_err(AppError::from)
}

struct Repositories {
    public: Arc<PostgresRepositories>,
    service: Arc<PostgresRepositories>,
}

/// Two pools: the public site reads through a read-only role, the admin CMS
/// writes through the service role.
async fn init_repositories(settings: &config::Settings) -> Result<Repositories, AppError> {
    let service_url = require_url(settings.database.url.as_deref(), "database url")?;
    let public_url = require_url(
        settings.database.public_url.as_deref(),
        "database public url",
    )?;

    let service_pool = PostgresRepositories::connect(
        service_url,
        settings.database.max_connections.get(),
        ClientRole::Service,
    )
    .await
    .map_err(database_error)?;

    PostgresRepositories::run_migrations(&service_pool)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    let public_pool = PostgresRepositories::connect(
        public_url,
        settings.database.public_max_connections.get(),
        ClientRole::Public,
    )
    .await
    .map_err(database_error)?;

    Ok(Repositories {
        public: Arc::new(PostgresRepositories::new(public_pool)),
        service: Arc::new(PostgresRepositories::new(service_pool)),
    })
}

fn build_summary_generator(
    settings: &config::SummarySettings,
) -> Result<Option<Arc<dyn SummaryGenerator>>, AppError> {
    let Some(api_key) = settings.api_key.clone() else {
        warn!(
            target = "tsunagu::summary",
            "summary api key not configured; interview summaries are disabled"
        );
        return Ok(None);
    };
    let client = GeminiSummaryClient::new(settings.endpoint.as_str(), &settings.model, api_key)
        .map_err(|err| AppError::unexpected(format!("failed to build summary client: {err}")))?;
    Ok(Some(Arc::new(client)))
}

fn build_http_state(
    settings: &config::Settings,
    repositories: &Repositories,
    storage: Arc<dyn ObjectStore>,
) -> HttpState {
    let public = &repositories.public;
    let organizations: Arc<dyn OrganizationsRepo> = public.clone();
    let interviews: Arc<dyn InterviewsRepo> = public.clone();
    let grants: Arc<dyn GrantsRepo> = public.clone();
    let news: Arc<dyn NewsRepo> = public.clone();
    let faqs: Arc<dyn FaqsRepo> = public.clone();
    let taxonomy: Arc<dyn TaxonomyRepo> = public.clone();
    let health: Arc<dyn HealthRepo> = public.clone();

    let site = Arc::new(SiteService::new(
        organizations,
        interviews,
        grants,
        news,
        faqs,
        taxonomy,
        settings.site.timezone,
    ));

    HttpState {
        site,
        identity: Arc::new(SiteIdentity {
            title: settings.site.title.clone(),
            public_site_url: settings.server.public_site_url.clone(),
            timezone: settings.site.timezone,
        }),
        storage,
        health,
    }
}

fn build_admin_state(
    settings: &config::Settings,
    repositories: &Repositories,
    storage: Arc<dyn ObjectStore>,
    summary: Option<Arc<dyn SummaryGenerator>>,
) -> Result<AdminState, AppError> {
    let service = &repositories.service;
    let organizations_repo: Arc<dyn OrganizationsRepo> = service.clone();
    let organizations_write: Arc<dyn OrganizationsWriteRepo> = service.clone();
    let interviews_repo: Arc<dyn InterviewsRepo> = service.clone();
    let interviews_write: Arc<dyn InterviewsWriteRepo> = service.clone();
    let grants_repo: Arc<dyn GrantsRepo> = service.clone();
    let grants_write: Arc<dyn GrantsWriteRepo> = service.clone();
    let news_repo: Arc<dyn NewsRepo> = service.clone();
    let news_write: Arc<dyn NewsWriteRepo> = service.clone();
    let faqs_repo: Arc<dyn FaqsRepo> = service.clone();
    let faqs_write: Arc<dyn FaqsWriteRepo> = service.clone();
    let taxonomy_repo: Arc<dyn TaxonomyRepo> = service.clone();
    let taxonomy_write: Arc<dyn TaxonomyWriteRepo> = service.clone();
    let slug_repo: Arc<dyn SlugRepo> = service.clone();
    let sort_repo: Arc<dyn SortOrderRepo> = service.clone();
    let stats_repo: Arc<dyn StatsRepo> = service.clone();

    let slugs = UniqueSlugResolver::new(slug_repo);
    let ordering = SortOrderService::new(sort_repo);
    let auth = &settings.auth;
    let max_upload_bytes = settings.storage.max_upload_bytes.get();

    Ok(AdminState {
        site_title: Arc::from(settings.site.title.as_str()),
        timezone: settings.site.timezone,
        auth: AuthState {
            service: Arc::new(AdminAuthService::new(
                auth.admin_password.as_deref(),
                auth.session_secret.as_deref(),
            )),
            limiter: LoginRateLimiter::new(auth.login_window, auth.login_max_attempts.get()),
            secure_cookie: auth.secure_cookie,
        },
        dashboard: Arc::new(AdminDashboardService::new(stats_repo)),
        organizations: Arc::new(AdminOrganizationService::new(
            organizations_repo.clone(),
            organizations_write,
            taxonomy_repo.clone(),
            slugs.clone(),
        )),
        interviews: Arc::new(AdminInterviewService::new(
            interviews_repo,
            interviews_write,
            organizations_repo,
            slugs.clone(),
            summary,
        )),
        grants: Arc::new(AdminGrantService::new(
            grants_repo,
            grants_write,
            taxonomy_repo.clone(),
            slugs.clone(),
        )),
        news: Arc::new(AdminNewsService::new(news_repo, news_write, slugs.clone())),
        faqs: Arc::new(AdminFaqService::new(faqs_repo, faqs_write, ordering.clone())),
        taxonomy: Arc::new(AdminTaxonomyService::new(
            taxonomy_repo,
            taxonomy_write,
            slugs,
            ordering,
        )),
        media: Arc::new(AdminMediaService::new(storage, max_upload_bytes)),
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    let storage: Arc<dyn ObjectStore> = Arc::new(
        LocalObjectStore::new(settings.storage.directory.clone())
            .map_err(|err| AppError::from(InfraError::from(err)))?,
    );
    let summary = build_summary_generator(&settings.summary)?;

    let http_state = build_http_state(&settings, &repositories, storage.clone());
    let admin_state = build_admin_state(&settings, &repositories, storage, summary)?;
    if !admin_state.auth.service.is_enabled() {
        warn!(
            target = "tsunagu::admin::auth",
            "admin password not configured; the admin CMS cannot be signed into"
        );
    }

    serve_http(&settings, http_state, admin_state).await
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let router_state = RouterState {
        http: http_state,
        admin: admin_state,
    };
    // Multipart framing on top of the largest accepted file.
    let upload_body_limit = settings.storage.max_upload_bytes.get() as usize + 64 * 1024;
    let router = http::build_router(router_state, upload_body_limit);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "tsunagu::server",
        addr = %settings.server.addr,
        public_site_url = %settings.server.public_site_url,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace))
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "tsunagu::server", "server stopped");
    Ok(())
}

/// Resolve on Ctrl-C; if in-flight requests outlive `grace`, exit hard.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(target = "tsunagu::server", error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!(
        target = "tsunagu::server",
        grace_secs = grace.as_secs(),
        "shutdown requested; draining connections"
    );
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!(target = "tsunagu::server", "graceful shutdown timed out");
        process::exit(1);
    });
}
