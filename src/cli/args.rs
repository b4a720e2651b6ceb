use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the proxy that holds the Claude API key
    Serve {
        /// Address to listen on, overriding the configured one
        #[arg(long)]
        bind: Option<String>,
    },
    /// Send a prompt through a running proxy and print the reply
    Chat {
        /// Your message to Claude
        #[arg(required = true)]
        query: Vec<String>,

        /// Model identifier
        #[arg(short, long)]
        model: Option<String>,

        /// File to attach (repeatable)
        #[arg(short, long = "attach", value_name = "FILE")]
        attachments: Vec<PathBuf>,

        /// Disable streaming mode
        #[arg(long)]
        no_stream: bool,

        /// Request extended thinking (only honored by models that support it)
        #[arg(long)]
        extended_thinking: bool,

        /// Proxy endpoint, overriding the configured one
        #[arg(long)]
        proxy_url: Option<String>,
    },
}
