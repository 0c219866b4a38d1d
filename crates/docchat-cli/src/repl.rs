use anyhow::Result;
use colored::Colorize;
use docchat_client::{ChatClient, ChatView, KeyValueBackend, SendOutcome};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// One line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum ReplCommand<'a> {
    Empty,
    Exit,
    Clear,
    History,
    Help,
    Unknown(&'a str),
    Ask(&'a str),
}

impl<'a> ReplCommand<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => ReplCommand::Empty,
            "exit" | "quit" => ReplCommand::Exit,
            "/clear" => ReplCommand::Clear,
            "/history" => ReplCommand::History,
            "/help" => ReplCommand::Help,
            _ if line.starts_with('/') => ReplCommand::Unknown(line),
            _ => ReplCommand::Ask(line),
        }
    }
}

fn print_help() {
    println!("{} Commands:", "💡".bright_yellow());
    println!("  /clear                  - Forget this conversation here and on the server");
    println!("  /history                - Reprint the stored conversation");
    println!("  /help                   - Show this help");
    println!("  exit, quit              - Leave");
}

/// Run interactive REPL mode
pub async fn run_repl<V, B>(client: &ChatClient<V, B>) -> Result<()>
where
    V: ChatView,
    B: KeyValueBackend,
{
    println!("{}", "📚 Documentation assistant".bright_cyan().bold());
    println!(
        "{}",
        format!(
            "Endpoint: {} ({})",
            client.config().endpoint,
            client.config().transport.as_str()
        )
        .bright_black()
    );
    println!("{}", "Type 'exit' or 'quit' to exit, or '/help' for commands\n".bright_black());

    client.load();

    let mut rl = DefaultEditor::new()?;
    loop {
        let readline = rl.readline(&format!("{} ", ">".bright_green().bold()));

        match readline {
            Ok(line) => match ReplCommand::parse(&line) {
                ReplCommand::Empty => continue,
                ReplCommand::Exit => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                ReplCommand::Clear => {
                    if client.clear().await {
                        println!("{} Conversation cleared", "🧹".bright_green());
                    }
                }
                ReplCommand::History => {
                    client.load();
                }
                ReplCommand::Help => print_help(),
                ReplCommand::Unknown(command) => {
                    eprintln!("{} Unknown command: {}", "❌".bright_red(), command);
                    print_help();
                }
                ReplCommand::Ask(question) => {
                    rl.add_history_entry(question)?;
                    if let SendOutcome::Busy = client.send(question).await {
                        eprintln!("{} Still waiting for the previous answer", "⏳".yellow());
                    }
                }
            },
            Err(ReadlineError::Interrupted) => {
                println!("{}", "^C".bright_black());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {}", "Error:".bright_red().bold(), err);
                break;
            }
        }
    }

    client.shutdown().await;
    Ok(())
}
