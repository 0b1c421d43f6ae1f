/// Album Service - HTTP server
///
/// Serves album upload/profile retrieval and the producer side of the review
/// pipeline: reviews are validated here, handed to the broker queue, and
/// persisted asynchronously by the review-worker binary.
use actix_web::{middleware, web, App, HttpServer};
use album_service::handlers;
use album_service::queue::ReviewQueue;
use album_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().map_err(to_io_err)?;
    let bind_address = format!("{}:{}", config.app.host, config.app.port);

    // Initialize database connection pool
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("database connect: {e}")))?;

    album_service::db::ensure_tables(&pool).await.map_err(to_io_err)?;

    // Long-lived broker client held in app state; each publish takes a
    // multiplexed connection from it instead of dialing per request.
    let queue = ReviewQueue::connect(&config.queue).map_err(to_io_err)?;
    queue.ensure_group().await.map_err(to_io_err)?;

    tracing::info!(%bind_address, "album service starting");

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(queue.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(handlers::albums::health))
            .route("/albums", web::post().to(handlers::albums::create_album))
            .route(
                "/albums/{albumID}",
                web::get().to(handlers::albums::get_album),
            )
            .route(
                "/review/{action}/{albumID}",
                web::post().to(handlers::reviews::submit_review),
            )
    })
    .bind(&bind_address)?
    .run()
    .await
}

fn to_io_err(err: album_service::AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}
