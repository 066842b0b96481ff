use crate::{
    api::{attendance, exception},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(limiter)
            .service(
                web::scope("/exception")
                    // /exception
                    .service(
                        web::resource("")
                            .route(web::post().to(exception::submit_exception))
                            .route(web::get().to(exception::exception_list)),
                    )
                    // /exception/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(exception::get_exception))
                            .route(web::put().to(exception::update_exception)),
                    )
                    // /exception/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(exception::approve_exception)),
                    )
                    // /exception/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(exception::reject_exception)),
                    )
                    // /exception/{id}/confirm
                    .service(
                        web::resource("/{id}/confirm")
                            .route(web::put().to(exception::confirm_exception)),
                    )
                    // /exception/{id}/hours
                    .service(
                        web::resource("/{id}/hours")
                            .route(web::get().to(exception::exception_hours)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance/{worker_id}/{date}
                    .service(
                        web::resource("/{worker_id}/{date}")
                            .route(web::get().to(attendance::reconcile_day))
                            .route(web::put().to(attendance::adjust_attendance)),
                    )
                    // /attendance/{worker_id}/{date}/confirm
                    .service(
                        web::resource("/{worker_id}/{date}/confirm")
                            .route(web::put().to(attendance::confirm_attendance)),
                    ),
            ),
    );
}
