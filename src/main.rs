use std::{process, sync::Arc, time::Duration};

use scribe::{
    application::{
        error::AppError,
        feed::FeedService,
        follows::FollowService,
        groups::{CreateGroupCommand, GroupService},
        pagination::Paginator,
        posts::PostService,
        repos::{
            AuthorsRepo, CommentsRepo, FollowsRepo, GroupsRepo, HealthRepo, PostsRepo,
            PostsWriteRepo,
        },
    },
    cache::{PageCacheConfig, PageCacheState},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AdminState, HttpState},
        telemetry,
    },
};
use tokio::{net::TcpListener, try_join};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

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
        config::Command::Groups(args) => run_groups(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let app = build_application_context(repositories, &settings);
    serve_http(&settings, app.http_state, app.admin_state).await
}

async fn run_groups(settings: config::Settings, args: config::GroupsArgs) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let groups_repo: Arc<dyn GroupsRepo> = repositories;
    let service = GroupService::new(groups_repo);

    match args.command {
        config::GroupsCommand::Create(create) => {
            let group = service
                .create(CreateGroupCommand {
                    title: create.title,
                    slug: create.slug,
                    description: create.description,
                })
                .await?;
            info!(
                target = "scribe::groups",
                id = group.id,
                slug = %group.slug,
                "group created"
            );
            println!("{}\t{}\t{}", group.id, group.slug, group.title);
        }
        config::GroupsCommand::List(_) => {
            for group in service.list().await? {
                println!("{}\t{}\t{}", group.id, group.slug, group.title);
            }
        }
    }

    Ok(())
}

struct ApplicationContext {
    http_state: HttpState,
    admin_state: AdminState,
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::migration(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_application_context(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> ApplicationContext {
    let authors_repo: Arc<dyn AuthorsRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let follows_repo: Arc<dyn FollowsRepo> = repositories.clone();
    let health_repo: Arc<dyn HealthRepo> = repositories;

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        authors_repo.clone(),
        Paginator::new(settings.feed.page_size),
    ));
    let posts = Arc::new(PostService::new(
        posts_repo,
        posts_write_repo,
        groups_repo,
        comments_repo,
    ));
    let follows = Arc::new(FollowService::new(authors_repo.clone(), follows_repo));

    let cache_config = PageCacheConfig::from(&settings.cache);
    let cache = cache_config
        .enabled
        .then(|| PageCacheState::new(cache_config.clone(), settings.auth.user_header.clone()));

    let http_state = HttpState {
        feed,
        posts,
        follows,
        authors: authors_repo,
        auth: settings.auth.clone(),
        cache: cache.clone(),
    };

    let admin_state = AdminState {
        cache,
        health: health_repo,
    };

    ApplicationContext {
        http_state,
        admin_state,
    }
}

async fn serve_http(
    settings: &config::Settings,
    http_state: HttpState,
    admin_state: AdminState,
) -> Result<(), AppError> {
    let public_router = http::build_router(http_state);
    let admin_router = http::build_admin_router(admin_state);

    let public_addr = settings.server.public_addr;
    let admin_addr = settings.server.admin_addr;
    let public_listener = TcpListener::bind(public_addr)
        .await
        .map_err(|err| AppError::from(InfraError::bind(public_addr, err)))?;
    let admin_listener = TcpListener::bind(admin_addr)
        .await
        .map_err(|err| AppError::from(InfraError::bind(admin_addr, err)))?;

    info!(
        target = "scribe::serve",
        public = %public_addr,
        admin = %admin_addr,
        "listening"
    );

    let grace = settings.server.graceful_shutdown;
    let public_server = axum::serve(public_listener, public_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace));
    let admin_server = axum::serve(admin_listener, admin_router.into_make_service())
        .with_graceful_shutdown(shutdown_signal(grace));

    try_join!(public_server, admin_server)
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "scribe::serve", "listeners stopped");
    Ok(())
}

/// Resolve on Ctrl-C. A second signal, or the grace period running out, exits hard.
async fn shutdown_signal(grace: Duration) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(target = "scribe::serve", error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!(
        target = "scribe::serve",
        grace_seconds = grace.as_secs(),
        "shutdown requested, draining connections"
    );

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(grace) => {
                warn!(target = "scribe::serve", "grace period elapsed, exiting");
            }
            _ = tokio::signal::ctrl_c() => {
                warn!(target = "scribe::serve", "second interrupt, exiting");
            }
        }
        process::exit(1);
    });
}
