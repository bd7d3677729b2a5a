// HTTP server setup using actix-web

use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};

use crate::api;
use crate::state::SharedState;

/// Build the HTTP server (does not start it — caller must await the
/// returned `Server`).
pub fn run_server(state: SharedState, port: u16) -> std::io::Result<Server> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .route("/status", web::get().to(api::get_status))
            .route("/diagnostics", web::get().to(api::get_all_diagnostics))
            .route("/diagnostics/{path:.*}", web::get().to(api::get_file_diagnostics))
            .route("/ast/{path:.*}", web::get().to(api::get_file_ast))
            .route("/notify", web::post().to(api::post_notify))
    })
    .disable_signals()
    .bind(("0.0.0.0", port))?
    .run();

    Ok(server)
}
