pub mod postgres_booking_repo;
pub mod postgres_job_repo;
pub mod postgres_package_repo;
pub mod postgres_voucher_repo;
pub mod sqlite_booking_repo;
pub mod sqlite_job_repo;
pub mod sqlite_package_repo;
pub mod sqlite_voucher_repo;
