use clap::Parser;
use claude_chat_proxy::cli::{run, Args};
use colored::Colorize;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(args).await {
        eprintln!("\n{} {e}", "Error:".red().bold());
        std::process::exit(1);
    }
}
