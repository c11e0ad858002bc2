pub mod booking;
pub mod identity;
pub mod job;
pub mod package;
pub mod voucher;
