pub mod booking;
pub mod credit;
pub mod health;
pub mod job;
pub mod package;
pub mod voucher;
