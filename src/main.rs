use std::{future::IntoFuture, process, sync::Arc};

use questionnaire::{
    application::{documents::render_blank_questionnaire, error::AppError, export::ExportService},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::Notify};
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
    let (cli_args, settings) = config::load_with_cli()?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
        config::Command::ExportCsv(args) => run_export_csv(settings, args).await,
        config::Command::RenderBlank(args) => run_render_blank(settings, args).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = HttpState::new(repositories, settings.documents);
    serve_http(&settings, state).await
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let pool = connect_pool(&settings).await?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::migrate)?;
    info!(target = "questionnaire::migrate", "migrations applied");
    Ok(())
}

async fn run_export_csv(
    settings: config::Settings,
    args: config::ExportCsvArgs,
) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let path = args.file;

    info!(
        target = "questionnaire::export",
        path = %path.display(),
        "Starting export"
    );

    let bytes = ExportService::new(repositories).export_csv().await?;
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|err| InfraError::write(path.clone(), err))?;

    info!(
        target = "questionnaire::export",
        bytes = bytes.len(),
        "Export completed"
    );
    Ok(())
}

async fn run_render_blank(
    settings: config::Settings,
    args: config::RenderBlankArgs,
) -> Result<(), AppError> {
    let bytes = render_blank_questionnaire(&settings.documents)?;
    tokio::fs::write(&args.file, &bytes)
        .await
        .map_err(|err| InfraError::write(args.file.clone(), err))?;

    info!(
        target = "questionnaire::render_blank",
        path = %args.file.display(),
        bytes = bytes.len(),
        "blank questionnaire written"
    );
    Ok(())
}

async fn connect_pool(settings: &config::Settings) -> Result<sqlx::PgPool, AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or(InfraError::MissingDatabaseUrl)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(InfraError::connect)?;
    Ok(pool)
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let pool = connect_pool(settings).await?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(InfraError::migrate)?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);
    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|source| InfraError::Bind {
            addr: settings.server.addr,
            source,
        })?;

    info!(
        target = "questionnaire::serve",
        addr = %settings.server.addr,
        "listening"
    );

    let shutdown = Arc::new(Notify::new());
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move { shutdown.notified().await }
        })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => return server_result(result),
        () = shutdown_signal() => {}
    }

    info!(
        target = "questionnaire::serve",
        grace_seconds = settings.server.graceful_shutdown.as_secs(),
        "shutdown requested, draining connections"
    );
    shutdown.notify_one();

    match tokio::time::timeout(settings.server.graceful_shutdown, server).await {
        Ok(result) => server_result(result),
        Err(_) => {
            warn!(
                target = "questionnaire::serve",
                "graceful shutdown timed out; dropping remaining connections"
            );
            Ok(())
        }
    }
}

fn server_result(
    result: Result<Result<(), std::io::Error>, tokio::task::JoinError>,
) -> Result<(), AppError> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(InfraError::Server(err).into()),
        Err(err) => Err(AppError::unexpected(format!("server task failed: {err}"))),
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "questionnaire::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
