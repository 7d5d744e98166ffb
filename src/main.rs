use env_logger::Env;
use followback::cli;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    cli::run().await;
}
