use super::AppContext;

pub async fn run() -> anyhow::Result<()> {
    let ctx = AppContext::load()?;
    let paths = &ctx.paths;

    println!("attune status");
    println!("=============");
    println!();

    let config_path = paths.config_file();
    println!(
        "Config:    {} {}",
        config_path.display(),
        if config_path.exists() { "✓" } else { "✗ (using defaults)" }
    );
    let data_dir = paths.data_dir();
    println!(
        "Data:      {} {}",
        data_dir.display(),
        if data_dir.exists() { "✓" } else { "✗ (not created yet)" }
    );
    println!();

    let config = &ctx.config;
    println!("User:      {} ({})", config.assistant.default_user_id, config.assistant.default_user_name);
    println!("History:   {} conversations", config.assistant.history_limit);
    println!();

    println!("Providers:");
    println!("  {:<10} {}", "calendar", enabled(config.providers.calendar));
    println!("  {:<10} {}", "notes", enabled(config.providers.notes));
    println!();

    println!("Gateway:   {}:{}", config.gateway.host, config.gateway.port);
    Ok(())
}

fn enabled(on: bool) -> &'static str {
    if on {
        "✓ enabled"
    } else {
        "✗ disabled"
    }
}
