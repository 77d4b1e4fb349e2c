use std::io;
use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use safari_booking_api::config::AppConfig;
use safari_booking_api::db::supabase::create_supabase_client;
use safari_booking_api::routes;
use safari_booking_api::services::notification_service::{
    NotificationOutbox, RetryPolicy, SupabaseFunctionsNotifier,
};
use safari_booking_api::services::order_service::{OrderService, OrderSettings};
use safari_booking_api::services::paypal::PayPalProvider;
use safari_booking_api::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("{}", e);
        io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
    })?;
    log::info!(
        "Starting in {} mode, PayPal API {}",
        config.environment,
        config.paypal.api_url
    );

    let db = create_supabase_client(&config.supabase).await;
    let notifier = Arc::new(SupabaseFunctionsNotifier::new(
        db.base_url(),
        db.service_key(),
    ));
    let (outbox, _worker) = NotificationOutbox::start(notifier, RetryPolicy::default());

    let orders = OrderService::new(
        Arc::new(PayPalProvider::new(&config.paypal)),
        db.clone(),
        db.clone(),
        outbox,
        OrderSettings::new(&config.frontend_url, config.paypal.merchant_email.clone()),
    );

    let state = AppState {
        orders: Arc::new(orders),
        bookings: db.clone(),
        tours: db.clone(),
        reviews: db.clone(),
        profiles: db.clone(),
        health: db,
        jwt_secret: config.supabase.jwt_secret.clone(),
        environment: config.environment.clone(),
    };

    log::info!("Binding to {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(web::Data::new(state.clone()))
            .configure(routes::config)
    })
    .bind((config.host.clone(), config.port))?
    .run()
    .await
}
