use ledger_backend::{
    api::router::create_router,
    background::start_background_worker,
    config::Config,
    domain::models::package::{
        NewPackageParams, Package, PackageStatus, ParticipantType, SessionMode, SessionTemplate,
    },
    domain::models::voucher::{NewVoucherParams, Voucher},
    domain::ports::{CalendarService, MeetingService, NotificationService},
    domain::services::ledger::LedgerService,
    domain::services::scheduling::SchedulingGateway,
    error::AppError,
    infra::repositories::{
        sqlite_booking_repo::SqliteBookingRepo, sqlite_job_repo::SqliteJobRepo,
        sqlite_package_repo::SqlitePackageRepo, sqlite_voucher_repo::SqliteVoucherRepo,
    },
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tera::Tera;
use uuid::Uuid;

pub struct MockCalendarService {
    available: AtomicBool,
    delay_ms: AtomicU64,
}

impl MockCalendarService {
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Makes every availability check hang for the given duration,
    /// simulating a stalled provider.
    pub fn set_delay_ms(&self, delay_ms: u64) {
        self.delay_ms.store(delay_ms, Ordering::SeqCst);
    }
}

#[async_trait]
impl CalendarService for MockCalendarService {
    async fn check_availability(
        &self,
        _therapist_id: &str,
        _when: DateTime<Utc>,
        _duration_min: i32,
    ) -> Result<bool, AppError> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        Ok(self.available.load(Ordering::SeqCst))
    }
}

pub struct MockMeetingService;

#[async_trait]
impl MeetingService for MockMeetingService {
    async fn create_meeting(
        &self,
        _topic: &str,
        _when: DateTime<Utc>,
        _duration_min: i32,
    ) -> Result<String, AppError> {
        Ok(format!("https://meet.test/{}", Uuid::new_v4()))
    }
}

pub struct MockNotificationService {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl NotificationService for MockNotificationService {
    async fn send(&self, recipient_id: &str, subject: &str, _body: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .unwrap()
            .push((recipient_id.to_string(), subject.to_string()));
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub calendar: Arc<MockCalendarService>,
    pub notifications: Arc<MockNotificationService>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let mut tera = Tera::default();
        tera.add_raw_template("booking_confirmed.html", "<html>Booked {{ package_title }}</html>").unwrap();
        tera.add_raw_template("package_approved.html", "<html>Approved {{ package_title }}</html>").unwrap();
        tera.add_raw_template("package_rejected.html", "<html>Rejected {{ package_title }}: {{ reason }}</html>").unwrap();
        tera.add_raw_template("session_reminder.html", "<html>Reminder {{ session_title }}</html>").unwrap();
        let templates = Arc::new(tera);

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            calendar_service_url: "http://localhost".to_string(),
            calendar_service_token: "token".to_string(),
            meeting_service_url: "http://localhost".to_string(),
            meeting_service_token: "token".to_string(),
            notification_service_url: "http://localhost".to_string(),
            notification_service_token: "token".to_string(),
            gateway_timeout_ms: 500,
        };

        let calendar = Arc::new(MockCalendarService {
            available: AtomicBool::new(true),
            delay_ms: AtomicU64::new(0),
        });
        let notifications = Arc::new(MockNotificationService {
            sent: Mutex::new(Vec::new()),
        });

        let gateway = SchedulingGateway::new(
            calendar.clone(),
            Arc::new(MockMeetingService),
            Duration::from_millis(config.gateway_timeout_ms),
        );

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

        let state = Arc::new(AppState {
            config,
            package_repo,
            voucher_repo,
            booking_repo,
            job_repo,
            notification_service: notifications.clone(),
            ledger,
            templates,
        });

        let worker_state = state.clone();
        tokio::spawn(async move {
            start_background_worker(worker_state).await;
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            calendar,
            notifications,
        }
    }

    /// Seeds an already-approved package directly through the repository,
    /// skipping the moderation flow tested elsewhere.
    #[allow(dead_code)]
    pub async fn seed_approved_package(
        &self,
        therapist_id: &str,
        price: i64,
        fee_percent: i64,
        session_durations: &[i32],
    ) -> Package {
        let templates = session_durations
            .iter()
            .enumerate()
            .map(|(i, duration)| SessionTemplate {
                duration_minutes: *duration,
                title: format!("Session {}", i + 1),
                description: None,
                participant_type: ParticipantType::Individual,
            })
            .collect();

        let mut package = Package::new(NewPackageParams {
            therapist_id: therapist_id.to_string(),
            title: "Seeded Package".to_string(),
            description: "Seeded for tests".to_string(),
            price,
            category: "test".to_string(),
            languages: vec!["en".to_string()],
            mode: SessionMode::Video,
            max_participants: 1,
            session_templates: templates,
            tags: vec![],
            platform_fee_percent: Some(fee_percent),
            save_as_draft: false,
        });
        package.status = PackageStatus::Approved;

        self.state.package_repo.create(&package).await.unwrap()
    }

    #[allow(dead_code)]
    pub async fn seed_voucher(&self, params: NewVoucherParams) -> Voucher {
        let voucher = Voucher::new(params);
        self.state.voucher_repo.create(&voucher).await.unwrap()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

/// Request builder with the identity headers the auth gateway would set.
#[allow(dead_code)]
pub fn request_as(
    method: &str,
    uri: &str,
    user: (&str, &str),
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-User-Id", user.0)
        .header("X-User-Role", user.1)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
