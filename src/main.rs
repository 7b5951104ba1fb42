/*!
 * Copyright (c) 2026 Ming Lyu, aka mingcheng
 *
 * This source code is licensed under the MIT License,
 * which is located in the LICENSE file in the source tree's root directory.
 *
 * File: main.rs
 * Author: mingcheng <mingcheng@apache.org>
 * File Created: 2026-03-02 09:48:51
 *
 * Modified By: mingcheng <mingcheng@apache.org>
 * Last Modified: 2026-03-03 17:05:12
 */

mod config;
mod errors;
mod imap_client;
mod message;
mod traits;
mod words;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use config::AppConfig;
use imap_client::MailClient;
use log::{error, info};
use std::io::Write;
use words::WordsClient;

struct MultiWriter {
    writers: Vec<Box<dyn Write + Send + 'static>>,
}

impl Write for MultiWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        for w in &mut self.writers {
            let _ = w.write(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        for w in &mut self.writers {
            let _ = w.flush();
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a random word and its definition
    Word,

    /// List messages from a sender
    Emails {
        #[arg(short, long)]
        from: String,

        /// List the oldest messages first
        #[arg(long)]
        oldest_first: bool,

        #[arg(short, long)]
        limit: Option<usize>,

        /// Only messages received on or after this date (YYYY-MM-DD)
        #[arg(short, long)]
        since: Option<NaiveDate>,

        /// Print the message body under each summary
        #[arg(long)]
        show_body: bool,
    },
}

fn initialize_logger(config: &AppConfig) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::new();

    if let Some(level) = &config.log_level {
        builder.parse_filters(level);
    } else if let Ok(env_level) = std::env::var("RUST_LOG") {
        builder.parse_filters(&env_level);
    } else {
        builder.filter_level(log::LevelFilter::Info);
    }

    if let Some(log_file) = &config.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .map_err(|e| anyhow::anyhow!("Failed to open log file {}: {}", log_file, e))?;

        if config.quiet {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        } else {
            let multi_writer = MultiWriter {
                writers: vec![Box::new(file), Box::new(std::io::stderr())],
            };
            builder.target(env_logger::Target::Pipe(Box::new(multi_writer)));
        }
    } else if config.quiet {
        builder.target(env_logger::Target::Pipe(Box::new(std::io::sink())));
    }

    builder.init();
    Ok(())
}

async fn print_random_word(config: &AppConfig) -> anyhow::Result<()> {
    let client = WordsClient::new(&config.words, config.request_timeout())?;
    let record = client.get_random_word().await?;

    if record.definition.is_empty() {
        println!("{}", record.word);
    } else {
        println!("{}: {}", record.word, record.definition);
    }
    Ok(())
}

async fn print_emails(
    config: &AppConfig,
    from: &str,
    oldest_first: bool,
    limit: Option<usize>,
    since: Option<NaiveDate>,
    show_body: bool,
) -> anyhow::Result<()> {
    let mut client = MailClient::new(config.mail.clone());

    let result = client.obtain_emails(from, !oldest_first, limit, since).await;

    if let Err(e) = client.logout().await {
        error!("Failed to logout cleanly: {:?}", e);
    }

    let messages = result?;
    info!("Retrieved {} messages from {}", messages.len(), from);

    for message in &messages {
        println!("{}", message.summary());
        if show_body {
            for name in ["To", "Cc"] {
                if let Some(value) = message.header(name) {
                    println!("{}: {}", name, value);
                }
            }
            let body = message
                .text_body
                .as_deref()
                .or(message.html_body.as_deref())
                .unwrap_or_default();
            println!("{}\n", body.trim_end());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = match args.config {
        Some(path) => AppConfig::new_from_file(&path),
        None => AppConfig::new(),
    }
    .unwrap_or_else(|e| {
        eprintln!("Failed to load config: {:?}", e);
        if let Ok(path) = std::env::current_dir() {
            eprintln!("Current search path: {:?}", path);
        }
        eprintln!("Please create a `config.toml` or set APP_... environment variables, or specify a config file with --config.");
        std::process::exit(1);
    });

    initialize_logger(&config)?;

    match args.command {
        Command::Word => print_random_word(&config).await,
        Command::Emails {
            from,
            oldest_first,
            limit,
            since,
            show_body,
        } => print_emails(&config, &from, oldest_first, limit, since, show_body).await,
    }
}
