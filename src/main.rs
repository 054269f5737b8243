mod app;
mod audio;
mod color;
mod config;
mod format;
mod library;
mod logging;
mod runtime;
mod session;
mod ui;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    runtime::run()
}
