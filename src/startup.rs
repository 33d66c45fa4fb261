use std::net::TcpListener;

use actix_web::{dev::Server, middleware::Logger, web, App, HttpServer};

use crate::{
    configuration::Settings,
    routes::{default_route, scrape_route},
};

pub fn run(listener: TcpListener, settings: Settings) -> Result<Server, std::io::Error> {
    let settings = web::Data::new(settings);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::health_check)
            .service(scrape_route::scrape)
            .app_data(settings.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
