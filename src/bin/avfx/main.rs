use clap::Parser;

use avfx::config::Config;

mod app;
mod args;

use app::{App, AppError};
use args::Args;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // clion needs help in trait annotation
    let args = <Args as Parser>::parse();

    let app = load_config(&args).and_then(App::new);

    match app {
        Ok(app) => app.run(),
        Err(e) => {
            log::error!("{e}");
            std::process::exit(1);
        }
    }
}

fn load_config(args: &Args) -> Result<Config, AppError> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("reading config from {:?}", path);
            Config::load_from_path(path)?
        }
        None => Config::default(),
    };

    args.apply(&mut config);
    config.validate()?;

    Ok(config)
}
