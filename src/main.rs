use airwave::{
    bot,
    common::{
        banner::{BannerInfo, print_banner},
        logger,
    },
    configs::Config,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    logger::init(config.logging.as_ref());
    print_banner(&BannerInfo::default(), &config);
    info!(
        "Loaded {} predefined streams, prefix `{}`",
        config.stations.len(),
        config.bot.prefix
    );

    if let Err(err) = bot::run(config).await {
        error!("CRITICAL: {}", err);
        std::process::exit(1);
    }
}
