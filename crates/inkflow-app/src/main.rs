//! Main application entry point.

fn main() {
    env_logger::init();
    log::info!("Starting InkFlow");

    if let Err(err) = inkflow_app::App::run() {
        log::error!("event loop failed: {err}");
        std::process::exit(1);
    }
}
