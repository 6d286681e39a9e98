//! Line-based terminal front end for [`ChatSession`]

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use super::{Category, ChatBackend, ChatSession};

const SUMMARY_WIDTH: usize = 50;

const HELP: &str = "Commands: /chats, /open <n>, /new, /clear, /help, /quit. Anything else is sent as a prompt.";

/// Shorten a prompt for the chat list
pub fn truncate_summary(prompt: &str) -> String {
    if prompt.chars().count() > SUMMARY_WIDTH {
        let head: String = prompt.chars().take(SUMMARY_WIDTH).collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    }
}

enum Command<'a> {
    Chats,
    Open(&'a str),
    New,
    Clear,
    Help,
    Quit,
    Prompt(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    match trimmed.split_once(' ') {
        Some(("/open", arg)) => Command::Open(arg.trim()),
        _ => match trimmed {
            "/chats" => Command::Chats,
            "/new" => Command::New,
            "/clear" => Command::Clear,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Prompt(line),
        },
    }
}

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    async fn ask(&mut self, question: &str) -> anyhow::Result<Option<String>> {
        let mut stdout = io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.flush().await?;
        Ok(self.lines.next_line().await?)
    }
}

pub async fn run<B: ChatBackend>(mut session: ChatSession<B>) -> anyhow::Result<()> {
    let mut terminal = Terminal {
        lines: BufReader::new(io::stdin()).lines(),
    };

    session.refresh_chats().await;

    loop {
        let Some(category) = session.state().category else {
            println!("\nSelect a category:");
            for (i, category) in Category::ALL.iter().enumerate() {
                println!("  {}) {}", i + 1, category.name());
            }
            let Some(choice) = terminal.ask("category> ").await? else {
                return Ok(());
            };
            match Category::from_choice(&choice) {
                Some(category) => {
                    session.state_mut().select_category(category);
                    println!("AI Writing Assistant - {}", category.name());
                    println!("{}", HELP);
                }
                None => println!("Unknown category: {}", choice.trim()),
            }
            continue;
        };

        let label = match category {
            Category::SimpleChat => "message".to_string(),
            other => other.name().to_lowercase(),
        };
        let Some(line) = terminal.ask(&format!("{}> ", label)).await? else {
            return Ok(());
        };

        match parse_command(&line) {
            Command::Quit => return Ok(()),
            Command::Help => println!("{}", HELP),
            Command::New => session.state_mut().new_chat(),
            Command::Chats => {
                session.refresh_chats().await;
                print_chats(&session);
            }
            Command::Open(arg) => {
                let id = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| session.state().chats.get(i))
                    .map(|chat| chat.id.clone());
                match id {
                    Some(id) => {
                        if session.load_chat(&id).await.is_ok() {
                            print_messages(&session);
                        }
                    }
                    None => println!("No chat numbered {}", arg),
                }
            }
            Command::Clear => {
                let answer = terminal
                    .ask("Are you sure you want to delete all chats? [y/N] ")
                    .await?
                    .unwrap_or_default();
                if answer.trim().eq_ignore_ascii_case("y") {
                    match session.clear_all().await {
                        Ok(()) => println!("All chats cleared"),
                        Err(_) => println!("Failed to clear chats"),
                    }
                }
            }
            Command::Prompt(text) => {
                session.state_mut().prompt = text.to_string();
                if let Ok(true) = session.submit().await {
                    if let Some(last) = session.state().messages.last() {
                        println!("\n{}\n", last.response);
                    }
                }
            }
        }
    }
}

fn print_chats<B: ChatBackend>(session: &ChatSession<B>) {
    let state = session.state();
    if state.chats.is_empty() {
        println!("No chats yet");
        return;
    }
    for (i, chat) in state.chats.iter().enumerate() {
        let marker = if state.current_chat_id.as_deref() == Some(chat.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{}{:>3}. {}  ({})",
            marker,
            i + 1,
            truncate_summary(&chat.last_prompt),
            chat.last_timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_messages<B: ChatBackend>(session: &ChatSession<B>) {
    for message in &session.state().messages {
        println!("\nYou: {}\n\nAI: {}", message.prompt, message.response);
    }
    println!();
}
