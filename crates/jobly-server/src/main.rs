use clap::Parser;
use jobly_server::config::Command;
use jobly_server::{Config, app};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = Config::parse();

    let result = match config.command.clone() {
        Some(Command::Token { username }) => app::print_token(&config, &username).await,
        Some(Command::Serve) | None => {
            app::init_logging();
            app::serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("\nError: {e:#}\n");
        std::process::exit(1);
    }
}
