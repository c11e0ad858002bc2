pub mod commission;
pub mod ledger;
pub mod policy;
pub mod scheduling;
pub mod voucher;
