pub mod booking_wizard;
pub mod notification_service;
pub mod order_service;
pub mod payment;
pub mod payment_client;
pub mod paypal;
pub mod pricing_service;
pub mod review_service;
pub mod tour_service;
pub mod validation;
