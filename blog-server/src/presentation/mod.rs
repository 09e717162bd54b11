pub mod http_handlers;
pub mod middleware;


use actix_web::middleware::from_fn;
use actix_web::web;
use http_handlers as h;
use middleware::require_login;

/// Registers every route. Expects `Arc<AuthService>`, `Arc<BlogService>` and
/// `Arc<SessionService>` as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/accounts")
            .service(
                web::resource("/register/")
                    .route(web::get().to(h::register_form))
                    .route(web::post().to(h::register)),
            )
            .service(
                web::resource("/login/")
                    .route(web::get().to(h::login_form))
                    .route(web::post().to(h::login)),
            )
            .service(
                web::resource("/logout/")
                    .wrap(from_fn(require_login))
                    .route(web::post().to(h::logout)),
            ),
    )
    .route("/", web::get().to(h::list_posts))
    .service(
        web::resource("/post/new/")
            .wrap(from_fn(require_login))
            .route(web::get().to(h::new_post_form))
            .route(web::post().to(h::create_post)),
    )
    .service(web::resource("/post/{id:\\d+}/").route(web::get().to(h::get_post)))
    .service(
        web::resource("/post/{id:\\d+}/edit/")
            .wrap(from_fn(require_login))
            .route(web::get().to(h::edit_post_form))
            .route(web::post().to(h::update_post)),
    )
    .service(
        web::resource("/post/{id:\\d+}/delete/")
            .wrap(from_fn(require_login))
            .route(web::get().to(h::delete_post_confirm))
            .route(web::post().to(h::delete_post)),
    )
    .service(
        web::resource("/post/{id:\\d+}/comment/")
            .wrap(from_fn(require_login))
            .route(web::post().to(h::add_comment)),
    );
}
