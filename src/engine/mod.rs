pub mod bookings;
pub mod lifecycle;
pub mod pricing;
pub mod views;
