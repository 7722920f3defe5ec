// storefront/src/web/routes.rs

use actix_web::web;

use crate::state::AppState;
use crate::web::handlers::{admin_handlers, checkout_handlers, order_handlers, status_handlers, webhook_handlers};

/// Liveness plus a database round trip; the service stays up when the database is not.
async fn health_check_handler(app_state: web::Data<AppState>) -> actix_web::HttpResponse {
  let database = match sqlx::query("SELECT 1").execute(&app_state.db_pool).await {
    Ok(_) => "ok",
    Err(e) => {
      tracing::warn!(error = %e, "Health check could not reach the database.");
      "unavailable"
    }
  };
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok", "database": database }))
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .route("/statuses", web::get().to(status_handlers::list_statuses_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("/eligibility", web::get().to(order_handlers::eligibility_handler))
          .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
      )
      .service(
        web::scope("/checkout/sessions")
          .route("/{session_id}", web::put().to(checkout_handlers::sync_session_handler))
          .route(
            "/{session_id}/settle",
            web::post().to(checkout_handlers::settle_session_handler),
          ),
      )
      .service(
        web::scope("/webhooks").route("/gateway", web::post().to(webhook_handlers::gateway_webhook_handler)),
      )
      .service(
        web::scope("/admin")
          .route(
            "/orders/{order_id}/status",
            web::post().to(admin_handlers::transition_status_handler),
          )
          .route(
            "/orders/{order_id}/delivery-schedule",
            web::put().to(admin_handlers::set_delivery_schedule_handler),
          )
          .route(
            "/statuses/refresh",
            web::post().to(admin_handlers::refresh_statuses_handler),
          ),
      ),
  );
}
