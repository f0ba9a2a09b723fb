//! `mailscope` - Interactive read-only IMAP mailbox scanner.
//!
//! Connects to a mailbox over implicit TLS, then offers a small menu of
//! analyses over the most recent messages: sender statistics, per-sender
//! counts and listings, and subject keyword search. Headers are streamed
//! and folded into in-memory aggregates; nothing is stored and nothing
//! on the server is ever modified.

#![forbid(unsafe_code)]

mod render;

use std::io::{self, Write as _};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mailscope_core::{
    DEFAULT_BATCH_SIZE, DEFAULT_SAMPLE_LIMIT, ScanEngine, ScanError, ScanMode, ScanPhase,
};
use mailscope_imap::{ConnectParams, MailboxSession, provider};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Read-only IMAP mailbox scanner", long_about = None)]
struct Args {
    /// Email address of the mailbox; prompted for when omitted.
    #[clap(long)]
    email: Option<String>,

    /// IMAP server hostname; overrides provider detection.
    #[clap(long)]
    server: Option<String>,

    /// IMAP port (implicit TLS).
    #[clap(long, default_value_t = mailscope_imap::DEFAULT_PORT)]
    port: u16,

    /// Folder to scan.
    #[clap(long, default_value = mailscope_imap::DEFAULT_FOLDER)]
    folder: String,

    /// How many of the most recent messages each scan covers.
    #[clap(long, default_value_t = DEFAULT_SAMPLE_LIMIT)]
    sample: u32,

    /// Messages fetched per batch (1..=500).
    #[clap(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: u32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailscope=info,mailscope_imap=warn,mailscope_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    run(Args::parse()).await
}

async fn run(args: Args) -> anyhow::Result<()> {
    let email = match args.email {
        Some(email) => email,
        None => prompt("Email address: ")?,
    };
    anyhow::ensure!(email.contains('@'), "not an email address: {email}");

    let resolved = provider::resolve(&email);
    let host = match args.server {
        Some(server) => server,
        None => {
            if !resolved.verified {
                warn!(
                    host = %resolved.host,
                    "no known provider for this domain; guessing the server, \
                     pass --server to override"
                );
            }
            resolved.host.clone()
        }
    };

    let password = rpassword::prompt_password(format!("Password for {email}: "))?;
    let params = ConnectParams::new(&email, &host, password)
        .port(args.port)
        .folder(&args.folder);

    println!("Connecting to {host}:{}...", args.port);
    let mut session = match MailboxSession::connect(&params).await {
        Ok(session) => session,
        Err(err) => {
            if matches!(err, mailscope_imap::Error::Auth(_)) {
                eprintln!("{}", resolved.provider.auth_hint());
            } else if err.is_connection() {
                eprintln!(
                    "could not reach {host}:{}; check the server name and your network",
                    args.port
                );
            }
            return Err(err.into());
        }
    };
    println!(
        "Connected. {} messages in {}",
        session.message_count(),
        session.folder()
    );

    // Ctrl-C flips a flag the progress callback polls, so a running
    // scan stops at the next batch boundary with partial results
    // instead of killing the session.
    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    let engine = ScanEngine::new()
        .sample_limit(args.sample)
        .batch_size(args.batch_size);

    loop {
        println!();
        println!("1. Mailbox statistics");
        println!("2. Count messages from a sender");
        println!("3. Search subjects for a keyword");
        println!("4. List messages from a sender");
        println!("5. Quit");

        let Some(mode) = read_mode()? else { break };

        // Cheap liveness check before a potentially long scan.
        if let Err(err) = session.noop().await {
            session.logout().await;
            return Err(anyhow::Error::from(err).context("connection to the server was lost"));
        }

        cancelled.store(false, Ordering::Relaxed);
        let outcome = engine
            .run(&mut session, mode, |progress| {
                if progress.phase == ScanPhase::Scanning {
                    eprint!("\r{progress}");
                } else {
                    eprintln!("\r{progress}");
                }
                !cancelled.load(Ordering::Relaxed)
            })
            .await;

        match outcome {
            Ok(outcome) => render::print_outcome(&outcome),
            Err(ScanError::Mailbox(err)) if err.is_connection() => {
                session.logout().await;
                return Err(anyhow::Error::from(err).context("scan aborted, connection lost"));
            }
            Err(err) => eprintln!("scan failed: {err}"),
        }

        // Ctrl-C means quit, not just cancel: the partial results are
        // already printed, so close the session and leave.
        if cancelled.load(Ordering::Relaxed) {
            println!("cancelled");
            break;
        }
    }

    session.logout().await;
    println!("Bye.");
    Ok(())
}

/// Reads one menu choice and any follow-up inputs it needs. `None`
/// means quit.
fn read_mode() -> anyhow::Result<Option<ScanMode>> {
    loop {
        let choice = prompt("Choose an option: ")?;
        let mode = match choice.as_str() {
            "1" => ScanMode::Statistics,
            "2" => {
                let Some(sender) = prompt_required("Sender address: ")? else {
                    continue;
                };
                ScanMode::SenderCount {
                    sender,
                    include_list: false,
                }
            }
            "3" => {
                let Some(keyword) = prompt_required("Subject keyword: ")? else {
                    continue;
                };
                let limit = prompt("Max results [50]: ")?;
                let limit = if limit.is_empty() {
                    50
                } else {
                    limit.parse().unwrap_or(50)
                };
                ScanMode::SubjectSearch { keyword, limit }
            }
            "4" => {
                let Some(sender) = prompt_required("Sender address: ")? else {
                    continue;
                };
                ScanMode::SenderListing { sender }
            }
            "5" | "q" | "quit" | "" => return Ok(None),
            other => {
                println!("unknown option: {other}");
                continue;
            }
        };
        return Ok(Some(mode));
    }
}

fn prompt(text: &str) -> io::Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Like [`prompt`], but an empty answer returns `None` instead of an
/// empty string.
fn prompt_required(text: &str) -> io::Result<Option<String>> {
    let answer = prompt(text)?;
    if answer.is_empty() {
        println!("nothing entered, back to the menu");
        return Ok(None);
    }
    Ok(Some(answer))
}
