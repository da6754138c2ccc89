use attune_core::EventContext;
use std::io::{BufRead, Write};
use tracing::{debug, error};

use super::AppContext;

const EXIT_WORDS: &[&str] = &["quit", "exit", "bye"];

pub async fn run(message: Option<String>, user: Option<String>, name: Option<String>) -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let mut assistant = ctx.assistant(user, name)?;

    if let Some(message) = message {
        let reply = assistant.chat(&message, EventContext::new())?;
        println!("{}", reply);
        return Ok(());
    }

    let conversation_id = assistant.start_conversation();
    debug!(conversation_id = %conversation_id, "Interactive chat started");

    println!("attune interactive mode");
    println!("Providers: {}", assistant.registry().names().join(", "));
    println!(
        "Hello {}! Type 'help' to see what I can do, or 'quit' to exit.",
        assistant.user_name()
    );
    println!();

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if is_exit(input) {
            println!("\nAssistant: Goodbye! I'll remember our conversation for next time.");
            break;
        }

        match assistant.chat(input, EventContext::new()) {
            Ok(reply) => println!("\nAssistant: {}\n", reply),
            Err(e) => {
                error!(error = %e, "Chat turn failed");
                println!("\nError: {}\n", e);
            }
        }
    }

    Ok(())
}

fn is_exit(input: &str) -> bool {
    EXIT_WORDS.contains(&input.to_lowercase().as_str())
}
