//! bedtime: a terminal capture pad for story prompts.

mod app;
mod canvas;
mod capture;
mod commands;
mod config;
mod logging;
mod ui;
mod words;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    app::run().await
}
