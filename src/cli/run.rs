use log::{debug, info, warn};

use super::args::{Args, Command};
use crate::{
    attachments::{human_readable_size, Attachment},
    claude::ChatRequest,
    client::ProxyClient,
    core::{ChatError, Config},
    proxy::{ProxyForwarder, ProxyServer},
};
use std::io::{self, Write};
use std::path::PathBuf;

const API_KEY_VAR: &str = "CLAUDE_API_KEY";

/// Reads the upstream credential once, from `.env` or the environment.
fn load_api_key() -> Option<String> {
    dotenv::var(API_KEY_VAR)
        .or_else(|_| std::env::var(API_KEY_VAR))
        .ok()
}

pub async fn run(args: Args) -> Result<(), ChatError> {
    let _ = dotenv::dotenv();
    let config = Config::load()?;

    match args.command {
        Command::Serve { bind } => serve(config, bind).await,
        Command::Chat {
            query,
            model,
            attachments,
            no_stream,
            extended_thinking,
            proxy_url,
        } => {
            let options = ChatOptions {
                query: query.join(" "),
                model,
                attachments,
                stream: !no_stream,
                extended_thinking,
                proxy_url,
            };
            chat(config, options).await
        }
    }
}

async fn serve(mut config: Config, bind: Option<String>) -> Result<(), ChatError> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let forwarder = ProxyForwarder::new(config.upstream.clone(), load_api_key());
    if !forwarder.has_credential() {
        warn!("{API_KEY_VAR} is not set; chat requests will fail with a configuration error");
    }

    ProxyServer::new(config.server, forwarder).run().await
}

struct ChatOptions {
    query: String,
    model: Option<String>,
    attachments: Vec<PathBuf>,
    stream: bool,
    extended_thinking: bool,
    proxy_url: Option<String>,
}

async fn chat(mut config: Config, options: ChatOptions) -> Result<(), ChatError> {
    if options.query.trim().is_empty() {
        return Err(ChatError::InvalidRequest("Query must not be empty".to_string()));
    }
    if let Some(proxy_url) = options.proxy_url {
        config.client.proxy_url = proxy_url;
    }

    let attachments = options
        .attachments
        .iter()
        .map(|path| Attachment::from_path(path, &config.attachments))
        .collect::<Result<Vec<_>, _>>()?;
    for attachment in &attachments {
        info!(
            "Attaching {} ({}, {})",
            attachment.name,
            attachment.media_type,
            human_readable_size(attachment.size)
        );
    }

    let model = options
        .model
        .unwrap_or_else(|| config.client.default_model.clone());
    let request = ChatRequest::for_prompt(model, &[], &options.query)
        .with_attachments(attachments)
        .with_extended_thinking(options.extended_thinking)
        .with_stream(options.stream);

    let client = ProxyClient::new(&config.client)?;
    debug!(
        "[SETTINGS] proxy: {}, model: {}, stream: {}",
        client.proxy_url(),
        request.model,
        request.stream
    );

    let mut stdout = io::stdout();
    if request.stream {
        client
            .stream_chat(&request, |chunk| {
                let _ = write!(stdout, "{chunk}");
                let _ = stdout.flush();
            })
            .await?;
    } else {
        let reply = client.send(&request).await?;
        write!(stdout, "{reply}")?;
    }

    writeln!(stdout)?;
    Ok(())
}
