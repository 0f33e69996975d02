pub mod booking;
pub mod conflict;
pub mod ledger;
pub mod lifecycle;
