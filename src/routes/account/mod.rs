pub mod bookings;
pub mod profile;
