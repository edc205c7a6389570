mod app;
mod args;
mod config;
mod entry;
mod error;
mod http;
mod logger;
mod metrics;
mod report;
mod shutdown;
mod shutdown_handlers;
mod version;

use error::AppResult;

fn main() -> AppResult<()> {
    entry::run()
}
