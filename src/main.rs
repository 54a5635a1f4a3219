use bunni_ldf::config::Config;
use bunni_ldf::web::build_rocket;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = Config::from_env()?;
    log::info!("starting LDF quote service on {}:{}", config.bind_address, config.port);

    build_rocket(&config)
        .launch()
        .await
        .map_err(|e| anyhow::anyhow!("rocket failed: {}", e))?;
    Ok(())
}
