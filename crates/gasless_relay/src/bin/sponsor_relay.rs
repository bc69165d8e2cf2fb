use actix_web::middleware::Logger;
use actix_web::{App, HttpServer, web};
use env_logger::Env;
use gasless_algod::AlgodClient;
use gasless_relay::{Relay, RelayConfig, SponsorAccountManager, server};
use log::info;
use std::sync::Arc;
use std::time::Duration;

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = RelayConfig::from_env()?;
    info!("Using algod at {}", config.algod.base_url());

    let algod = AlgodClient::from_config(&config.algod, Some(Duration::from_secs(30)))?;
    let sponsor = Arc::new(SponsorAccountManager::from_secret(
        config.sponsor_mnemonic.as_deref(),
    ));
    let relay = web::Data::new(Relay::new(algod, sponsor, &config));

    info!("Sponsor relay listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(relay.clone())
            .configure(server::configure)
    })
    .bind(config.bind.as_str())?
    .run()
    .await?;

    Ok(())
}
