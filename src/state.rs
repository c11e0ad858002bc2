use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, JobRepository, NotificationService, PackageRepository, VoucherRepository,
};
use crate::domain::services::ledger::LedgerService;
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub package_repo: Arc<dyn PackageRepository>,
    pub voucher_repo: Arc<dyn VoucherRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub notification_service: Arc<dyn NotificationService>,
    pub ledger: Arc<LedgerService>,
    pub templates: Arc<Tera>,
}
