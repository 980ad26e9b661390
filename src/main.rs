use std::process::ExitCode;

use darius::app::App;
use darius::config::Config;
use darius::error::FetchError;
use darius::fetch::HttpImageSource;
use darius::Framebuffer;
use log::{error, info};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), FetchError> {
    let config = Config::default();
    let source = HttpImageSource::new(config.diameter);

    // The first image is fetched before the window opens. Nothing is drawn
    // if it fails.
    let mut app = App::start(config.clone(), source)?;
    let mut fb = Framebuffer::new(config.diameter, config.diameter, config.title, config.top_fps);

    info!("running at {} fps", fb.target_fps());
    fb.run(&mut app);

    app.finish()
}
