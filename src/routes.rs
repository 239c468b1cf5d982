use crate::{
    api::{admin, attendance, expenses, leave, location, quotations, todos},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter that refills evenly over a minute.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .route("/me", web::get().to(handlers::me))
            .service(
                web::scope("/attendance")
                    .route("", web::get().to(attendance::my_attendance))
                    .route("/check-in", web::post().to(attendance::check_in))
                    .route("/check-out", web::post().to(attendance::check_out)),
            )
            .service(
                web::scope("/leave")
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::my_leave))
                            .route(web::post().to(leave::request_leave)),
                    )
                    .route("/manage", web::get().to(leave::manage))
                    .route("/events", web::get().to(leave::leave_events))
                    .route("/{req_id}/approve", web::post().to(leave::approve))
                    .route("/{req_id}/reject", web::post().to(leave::reject)),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::get().to(expenses::my_expenses))
                            .route(web::post().to(expenses::submit_expense)),
                    )
                    .route("/manage", web::get().to(expenses::manage))
                    .route("/{expense_id}/approve", web::post().to(expenses::approve))
                    .route("/{expense_id}/reject", web::post().to(expenses::reject)),
            )
            .service(
                web::scope("/todos")
                    .service(
                        web::resource("")
                            .route(web::get().to(todos::my_todos))
                            .route(web::post().to(todos::create)),
                    )
                    .route("/{todo_id}/status", web::post().to(todos::set_status)),
            )
            .service(
                web::scope("/quotations")
                    .route("", web::get().to(quotations::index))
                    .route("/upload", web::post().to(quotations::upload))
                    // before /{quotation_id}, which would swallow it
                    .route("/search", web::get().to(quotations::search))
                    .route("/bulk-delete", web::post().to(quotations::bulk_delete))
                    .route("/bulk-image", web::post().to(quotations::bulk_image))
                    .route("/{quotation_id}", web::get().to(quotations::get)),
            )
            .service(
                web::scope("/location")
                    .route("", web::get().to(location::my_location))
                    .route("/ping", web::post().to(location::ping))
                    .route("/latest", web::get().to(location::latest)),
            )
            .service(
                web::scope("/admin")
                    .route("/dashboard", web::get().to(admin::dashboard))
                    .route("/users", web::get().to(admin::list_users)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};

    #[actix_web::test]
    async fn limiter_handles_extreme_rates() {
        build_limiter(0);
        build_limiter(1);
        build_limiter(1_000_000);
    }

    #[actix_web::test]
    async fn api_routes_require_a_token() {
        let config = Config::for_tests();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config.clone()))
                .configure(|cfg| configure(cfg, config.clone())),
        )
        .await;

        for uri in ["/api/attendance", "/api/leave/events", "/api/quotations/search?q=ethanol", "/api/admin/dashboard"] {
            let req = test::TestRequest::get()
                .uri(uri)
                .peer_addr("127.0.0.1:5000".parse().unwrap())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
