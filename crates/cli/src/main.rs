use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use shadow_agents::{build_http_agent, HttpShadowAgent};
use shadow_core::{classify, QueryRequest};
use shadow_lookup::{DEFAULT_SEARCH_URL, DEFAULT_TRANSLATE_URL};
use shadow_observability::{init_tracing, AppMetrics};
use url::Url;

#[derive(Debug, Parser)]
#[command(name = "shadow")]
#[command(about = "Shadow Brain CLI")]
struct Cli {
    #[arg(long, env = "SHADOW_TRANSLATE_URL", default_value = DEFAULT_TRANSLATE_URL)]
    translate_url: Url,

    #[arg(long, env = "SHADOW_SEARCH_URL", default_value = DEFAULT_SEARCH_URL)]
    search_url: Url,

    /// Per-request timeout for provider calls, in seconds.
    #[arg(long, env = "SHADOW_LOOKUP_TIMEOUT_SECONDS")]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Send one message through the full pipeline.
    Ask {
        message: String,
        #[arg(long)]
        lang: Option<String>,
    },
    /// Show detected language and intent without calling any provider.
    Classify {
        text: String,
        #[arg(long)]
        lang: Option<String>,
    },
    Chat {
        #[arg(long)]
        lang: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("shadow_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Classify { text, lang } => {
            let classification = classify(lang.as_deref(), text.trim());
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Command::Ask { message, lang } => {
            let agent = build_agent(cli.translate_url, cli.search_url, cli.timeout_secs)?;
            let reply = agent.answer(QueryRequest { message, lang }).await;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
        Command::Chat { lang } => {
            let agent = build_agent(cli.translate_url, cli.search_url, cli.timeout_secs)?;
            run_chat(agent, lang).await?;
        }
    }

    Ok(())
}

async fn run_chat(agent: HttpShadowAgent, lang: Option<String>) -> Result<()> {
    println!("Shadow Brain chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let reply = agent
            .answer(QueryRequest {
                message: message.to_string(),
                lang: lang.clone(),
            })
            .await;

        println!(
            "\n{}\n[{} · {:.2}]\n",
            reply.answer,
            reply.source.as_str(),
            reply.confidence
        );
    }

    Ok(())
}

fn build_agent(
    translate_url: Url,
    search_url: Url,
    timeout_secs: Option<u64>,
) -> Result<HttpShadowAgent> {
    build_http_agent(
        translate_url,
        search_url,
        timeout_secs.map(Duration::from_secs),
        AppMetrics::shared(),
    )
}
