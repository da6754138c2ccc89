use serde_json::Value;

use super::AppContext;

pub async fn suggest(user: Option<String>) -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let assistant = ctx.assistant(user, None)?;

    println!("Suggestions for {}:", assistant.user_id());
    for suggestion in assistant.get_suggestions() {
        println!("  • {}", suggestion);
    }
    Ok(())
}

pub async fn preferences(user: Option<String>, set: Vec<String>) -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let mut assistant = ctx.assistant(user, None)?;

    if !set.is_empty() {
        let mut updates = serde_json::Map::new();
        for pair in &set {
            let (key, value) = parse_assignment(pair)?;
            updates.insert(key, value);
        }
        let count = updates.len();
        assistant.update_preferences(updates)?;
        println!("✓ Saved {} preference(s)", count);
        println!();
    }

    println!("Profile preferences:");
    println!("{}", serde_json::to_string_pretty(&assistant.profile().preferences)?);
    println!();
    println!("Learned from usage:");
    println!("{}", serde_json::to_string_pretty(&assistant.get_preferences())?);
    println!();
    println!("Insights:");
    println!("{}", serde_json::to_string_pretty(&assistant.learner().insights())?);
    Ok(())
}

pub async fn history(user: Option<String>, limit: Option<usize>) -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let limit = limit.unwrap_or(ctx.config.assistant.history_limit);
    let assistant = ctx.assistant(user, None)?;

    let conversations = assistant.conversation_history(limit)?;
    if conversations.is_empty() {
        println!("No conversations yet.");
        return Ok(());
    }

    for conversation in conversations {
        println!(
            "{}  {}  ({} messages)",
            conversation.created_at.format("%Y-%m-%d %H:%M"),
            conversation.conversation_id,
            conversation.messages.len()
        );
        if let Some(first) = conversation.messages.first() {
            println!("    {}", first.content);
        }
    }
    Ok(())
}

/// `key=value`; the value is read as JSON when it parses, else kept as text.
fn parse_assignment(pair: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = pair
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected KEY=VALUE, got '{}'", pair))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("Empty preference key in '{}'", pair);
    }
    let value = serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.trim().to_string()));
    Ok((key.to_string(), value))
}
