use std::env;
use std::error::Error;
use std::fs;
use std::sync::Arc;

use futures::future::FutureExt;
use log::{info, initialize_logger};
use tokio::sync::mpsc;
use warp::Filter;

use proofing::audio::probe::Prober;
use proofing::config::{get_ffprobe, get_variable};
use proofing::environment::{Config, Environment};
use proofing::persistence::Gateway;
use proofing::routes;
use proofing::urls::Urls;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    let logger = initialize_logger();

    let main_port: u16 = get_variable("PROOFING_PORT")
        .parse()
        .expect("parse PROOFING_PORT as u16");
    let admin_port: u16 = get_variable("PROOFING_ADMIN_PORT")
        .parse()
        .expect("parse PROOFING_ADMIN_PORT as u16");

    let config = Config::from_env();

    info!(logger, "Starting..."; "main_port" => main_port, "admin_port" => admin_port, "data_root" => %config.data_root().display(), "labels" => config.labels().join(","));
    let logger = Arc::new(logger);

    fs::create_dir_all(config.data_root()).expect("ensure data root exists");

    let ffprobe_path = get_ffprobe(env::var("PROOFING_FFPROBE_PATH").ok());
    match &ffprobe_path {
        Some(path) => info!(logger, "Using ffprobe"; "path" => %path.display()),
        None => info!(logger, "No ffprobe found; only WAV durations will be known"),
    }
    let prober = Arc::new(Prober::new(ffprobe_path));

    let gateway = Arc::new(Gateway::new(config.data_root(), logger.clone()));
    let urls = Arc::new(Urls::new(get_variable("PROOFING_BASE_URL")));

    let environment = Environment::new(logger.clone(), gateway, urls, prober, config);

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // the receiver only goes away once shutdown has begun
            termination_sender.send(()).await.ok();
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let logger2 = logger.clone();

        let routes = routes::make_routes(environment.clone())
            .recover(move |r| routes::format_rejection(logger2.clone(), r));

        let (_, main_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], main_port), async {
                should_terminate.await;
            });

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let routes = routes::admin::make_healthz_route(environment.clone()).or(
            routes::admin::make_termination_route(environment.clone(), terminate),
        );

        let (_, admin_server) =
            warp::serve(routes).bind_with_graceful_shutdown(([0, 0, 0, 0], admin_port), async {
                should_terminate.await;
            });

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");

    Ok(())
}
