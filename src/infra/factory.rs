use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::{postgres::{PgPoolOptions, PgConnectOptions}, sqlite::{SqlitePoolOptions, SqliteJournalMode, SqliteConnectOptions}};
use sqlx::{PgPool, SqlitePool, ConnectOptions};
use tracing::info;
use tracing::log::LevelFilter;
use tera::Tera;

use crate::config::Config;
use crate::state::AppState;
use crate::domain::services::ledger::LedgerService;
use crate::domain::services::scheduling::SchedulingGateway;
use crate::infra::notify::http_notification_service::HttpNotificationService;
use crate::infra::scheduling::{
    http_calendar_service::HttpCalendarService, http_meeting_service::HttpMeetingService,
};
use crate::infra::repositories::{
    postgres_booking_repo::PostgresBookingRepo, postgres_job_repo::PostgresJobRepo,
    postgres_package_repo::PostgresPackageRepo, postgres_voucher_repo::PostgresVoucherRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_job_repo::SqliteJobRepo,
    sqlite_package_repo::SqlitePackageRepo, sqlite_voucher_repo::SqliteVoucherRepo,
};

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let notification_service = Arc::new(HttpNotificationService::new(
        config.notification_service_url.clone(),
        config.notification_service_token.clone(),
    ));

    let calendar_service = Arc::new(HttpCalendarService::new(
        config.calendar_service_url.clone(),
        config.calendar_service_token.clone(),
    ));
    let meeting_service = Arc::new(HttpMeetingService::new(
        config.meeting_service_url.clone(),
        config.meeting_service_token.clone(),
    ));
    let gateway = SchedulingGateway::new(
        calendar_service,
        meeting_service,
        Duration::from_millis(config.gateway_timeout_ms),
    );

    let mut tera = Tera::default();
    tera.add_raw_template(
        "booking_confirmed.html",
        include_str!("../templates/booking_confirmed.html"),
    )
    .expect("Failed to load booking confirmation template");
    tera.add_raw_template(
        "package_approved.html",
        include_str!("../templates/package_approved.html"),
    )
    .expect("Failed to load package approved template");
    tera.add_raw_template(
        "package_rejected.html",
        include_str!("../templates/package_rejected.html"),
    )
    .expect("Failed to load package rejected template");
    tera.add_raw_template(
        "session_reminder.html",
        include_str!("../templates/session_reminder.html"),
    )
    .expect("Failed to load session reminder template");
    let templates = Arc::new(tera);

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts.log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let package_repo = Arc::new(PostgresPackageRepo::new(pool.clone()));
        let voucher_repo = Arc::new(PostgresVoucherRepo::new(pool.clone()));
        let booking_repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
        let job_repo = Arc::new(PostgresJobRepo::new(pool.clone()));

        let ledger = Arc::new(LedgerService::new(
            package_repo.clone(),
            voucher_repo.clone(),
            booking_repo.clone(),
            gateway.clone(),
        ));

        AppState {
            config: config.clone(),
            package_repo,
            voucher_repo,
            booking_repo,
            job_repo,
            notification_service,
            ledger,
            templates,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let package_repo = Arc::new(SqlitePackageRepo::new(pool.clone()));
        let voucher_repo = Arc::new(SqliteVoucherRepo::new(pool.clone()));
        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let job_repo = Arc::new(SqliteJobRepo::new(pool.clone()));

        let ledger = Arc::new(LedgerService::new(
            package_repo.clone(),
            voucher_repo.clone(),
            booking_repo.clone(),
            gateway,
        ));

        AppState {
            config: config.clone(),
            package_repo,
            voucher_repo,
            booking_repo,
            job_repo,
            notification_service,
            ledger,
            templates,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
