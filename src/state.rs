use std::sync::Arc;

use crate::db::repository::{
    BookingRepository, ProfileRepository, ReviewRepository, StoreHealth, TourRepository,
};
use crate::services::order_service::OrderService;

/// Shared handles registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<OrderService>,
    pub bookings: Arc<dyn BookingRepository>,
    pub tours: Arc<dyn TourRepository>,
    pub reviews: Arc<dyn ReviewRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub health: Arc<dyn StoreHealth>,
    pub jwt_secret: String,
    pub environment: String,
}
