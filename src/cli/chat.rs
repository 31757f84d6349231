use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ai::chat::{ChatSession, Message, PendingTurn, TurnOutcome};
use crate::core::{AppConfig, provider};

#[derive(Debug, PartialEq)]
enum Input {
    Empty,
    Quit,
    FollowUp(usize),
    Message(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Empty,
        "/quit" | "/exit" => Input::Quit,
        "/1" => Input::FollowUp(0),
        "/2" => Input::FollowUp(1),
        _ => Input::Message(line.to_string()),
    }
}

fn render_reply(msg: &Message) -> String {
    let mut out = msg.text().to_string();
    if let Some(questions) = msg.follow_up_questions() {
        for (i, q) in questions.iter().enumerate() {
            out.push_str(&format!("\n  [{}] {}", i + 1, q));
        }
    }
    out
}

/// Print a loading indicator until the turn settles.
async fn wait_for_reply(pending: PendingTurn) -> Result<TurnOutcome> {
    let settled = pending.settled();
    tokio::pin!(settled);
    let mut ticker = tokio::time::interval(Duration::from_millis(250));

    loop {
        tokio::select! {
            outcome = &mut settled => {
                println!();
                return outcome;
            }
            _ = ticker.tick() => {
                print!(".");
                io::stdout().flush()?;
            }
        }
    }
}

pub async fn run(config: AppConfig) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let session = ChatSession::new(&config.title, provider(&config));

    println!("{}", session.title());
    println!("Type a message, /1 or /2 to pick a follow-up, /quit to close.");

    loop {
        let readline = rl.readline(">>> ");
        let line = match readline {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let pending = match parse_input(&line) {
            Input::Empty => continue,
            Input::Quit => break,
            Input::FollowUp(idx) => {
                let question = session
                    .last_ai_message()
                    .and_then(|m| m.follow_up_questions().map(|q| q[idx].clone()));
                match question {
                    Some(question) => {
                        println!("> {}", question);
                        session.select_follow_up(&question)
                    }
                    None => {
                        println!("No follow-up questions yet.");
                        continue;
                    }
                }
            }
            Input::Message(text) => {
                let _ = rl.add_history_entry(text.as_str());
                session.send(&text)
            }
        };

        let Some(pending) = pending else {
            continue;
        };
        if let TurnOutcome::Answered(msg) = wait_for_reply(pending).await? {
            println!("{}", render_reply(&msg));
        }
    }

    session.close();
    Ok(())
}
