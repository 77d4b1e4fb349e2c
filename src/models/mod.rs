pub mod account;
pub mod booking;
pub mod payment;
pub mod pricing;
pub mod profile;
pub mod review;
pub mod tour;
