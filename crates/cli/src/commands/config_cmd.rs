//! `treatorhell config` — Show the effective configuration.

use treatorhell_config::AppConfig;

pub fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = toml::to_string_pretty(&config.redacted())?;
    println!("{toml_str}");

    match config.validate() {
        Ok(()) => println!("# ✅ Configuration is valid"),
        Err(e) => println!("# ⚠️  {e}"),
    }
    println!("# Storage backend: {}", storage_summary(config));

    Ok(())
}

fn storage_summary(config: &AppConfig) -> String {
    match config.storage.remote_url() {
        Some(url) if config.storage.remote_token().is_some() => format!("redis ({url})"),
        _ => format!("file ({})", config.storage.path.display()),
    }
}
