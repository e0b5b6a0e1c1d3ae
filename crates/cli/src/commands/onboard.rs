//! `ragline onboard` — First-time setup.

use ragline_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("Ragline — First-Time Setup");
    println!("==========================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("Created config directory: {}", config_dir.display());
    } else {
        println!("Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\nConfig already exists at: {}", config_path.display());
        println!("Edit it manually or delete and re-run onboard.\n");
    } else {
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("Created config.toml at: {}", config_path.display());
        println!("\nNext steps:");
        println!("  1. Set your model API key:");
        println!("       export OPENAI_API_KEY='sk-...'");
        println!("       (or RAGLINE_API_KEY for a non-OpenAI endpoint)");
        println!("  2. Point [index] at your vector index:");
        println!("       host     = \"https://your-index.svc.pinecone.io\"");
        println!("       api key  via PINECONE_API_KEY");
        println!("  3. Try it:");
        println!("       ragline ask \"who leads the finance team?\"");
        println!("       ragline serve");
    }

    Ok(())
}
