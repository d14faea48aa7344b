pub mod render;

use crate::backend::UploadFile;
use crate::session::{ SendOutcome, SessionController, SkipReason };
use log::{ error, info };
use std::error::Error;
use tokio::io::{ AsyncBufReadExt, BufReader };

const HELP: &str = "\
Type a question to ask the claims assistant, or one of:
  /upload <file.csv>...   upload claims CSV files
  /clear-data             delete all stored claims data on the backend
  /reset                  clear this conversation
  /stop                   stop the answer being generated
  /theme                  toggle light/dark colours
  /health                 check that the backend is reachable
  /help                   show this text
  /quit                   exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Upload(Vec<String>),
    ClearData,
    Reset,
    Stop,
    Theme,
    Health,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Ask(line.to_string());
    }

    let mut parts = line.split_whitespace();
    let name = parts.next().unwrap_or_default();
    match name {
        "/upload" => Command::Upload(parts.map(str::to_string).collect()),
        "/clear-data" => Command::ClearData,
        "/reset" => Command::Reset,
        "/stop" => Command::Stop,
        "/theme" => Command::Theme,
        "/health" => Command::Health,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

/// Line to print for a send that never reached the backend. Everything else
/// is reported through session events.
pub fn send_notice(outcome: &SendOutcome) -> Option<&'static str> {
    match outcome {
        SendOutcome::Skipped(SkipReason::Busy) => {
            Some("still answering the previous question, /stop to cancel it")
        }
        _ => None,
    }
}

async fn read_files(paths: &[String]) -> Vec<UploadFile> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match UploadFile::from_path(path).await {
            Ok(file) => files.push(file),
            Err(e) => error!("Skipping {}: {}", path, e),
        }
    }
    files
}

/// Line-oriented front end: reads commands from stdin, renders session events
/// to stdout. Queries run in the background so `/stop` and `/reset` stay
/// usable while an answer streams; Ctrl-C stops a running answer.
pub async fn run_console(session: SessionController) -> Result<(), Box<dyn Error + Send + Sync>> {
    let renderer = tokio::spawn(render::render_events(session.subscribe(), session.theme().await));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{}", HELP);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                if session.stop_generating().await {
                    continue;
                }
                None
            }
        };
        let Some(line) = line else { break };

        match parse_command(&line) {
            Command::Ask(text) => {
                let session = session.clone();
                tokio::spawn(async move {
                    if let Some(notice) = send_notice(&session.send_query(&text).await) {
                        println!("{}", notice);
                    }
                });
            }
            Command::Upload(paths) if paths.is_empty() => println!("usage: /upload <file.csv>..."),
            Command::Upload(paths) => {
                let files = read_files(&paths).await;
                if files.is_empty() {
                    println!("no readable files to upload");
                    continue;
                }
                let session = session.clone();
                tokio::spawn(async move { session.upload_files(files).await });
            }
            Command::ClearData => {
                let session = session.clone();
                tokio::spawn(async move { session.clear_data().await });
            }
            Command::Health => {
                let session = session.clone();
                tokio::spawn(async move { session.check_health().await });
            }
            Command::Reset => session.reset_chat().await,
            Command::Stop => {
                if !session.stop_generating().await {
                    println!("nothing is being generated");
                }
            }
            Command::Theme => {
                session.toggle_theme().await;
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => break,
            Command::Unknown(name) => println!("unknown command {}, try /help", name),
            Command::Empty => {}
        }
    }

    info!("Leaving console");
    session.stop_generating().await;
    renderer.abort();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(
            parse_command("  How many claims in March? "),
            Command::Ask("How many claims in March?".into())
        );
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(
            parse_command("/upload march.csv  april.csv"),
            Command::Upload(vec!["march.csv".into(), "april.csv".into()])
        );
        assert_eq!(parse_command("/clear-data"), Command::ClearData);
        assert_eq!(parse_command("/reset"), Command::Reset);
        assert_eq!(parse_command("/exit"), Command::Quit);
        assert_eq!(parse_command("/frobnicate"), Command::Unknown("/frobnicate".into()));
    }

    #[test]
    fn busy_send_gets_a_notice() {
        assert!(send_notice(&SendOutcome::Skipped(SkipReason::Busy)).is_some());
        assert_eq!(send_notice(&SendOutcome::Skipped(SkipReason::EmptyQuery)), None);
        assert_eq!(send_notice(&SendOutcome::Completed), None);
        assert_eq!(send_notice(&SendOutcome::Cancelled), None);
    }

    #[tokio::test]
    async fn unreadable_paths_yield_no_files() {
        let missing = std::env::temp_dir()
            .join(format!("claims-chat-missing-{}.csv", std::process::id()))
            .to_string_lossy()
            .into_owned();

        assert!(read_files(&[missing]).await.is_empty());
    }
}
