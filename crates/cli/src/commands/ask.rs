//! `ragline ask` — One-shot question with a streamed answer.

use ragline_config::AppConfig;
use ragline_core::memory::UserId;
use ragline_pipeline::AnswerEvent;
use std::io::Write;

pub async fn run(message: String, user: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    export OPENAI_API_KEY='sk-...'");
        eprintln!("    export RAGLINE_API_KEY='...'   (generic)");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let pipeline = ragline_gateway::build_pipeline(&config)?;
    let user = user
        .map(|u| UserId::from(u.as_str()))
        .unwrap_or_else(UserId::anonymous);

    let mut rx = pipeline.answer(&message, user).await?;
    let mut stdout = std::io::stdout();

    while let Some(event) = rx.recv().await {
        match event {
            AnswerEvent::LeadIn => {
                print!("{}", ragline_pipeline::LEAD_IN);
                stdout.flush()?;
            }
            AnswerEvent::Chunk { content } => {
                print!("{content}");
                stdout.flush()?;
            }
            AnswerEvent::NoMatches => {
                println!("{}", ragline_pipeline::NO_MATCHES_MESSAGE);
            }
            AnswerEvent::EmptyContext => {
                println!("{}", ragline_pipeline::EMPTY_CONTEXT_MESSAGE);
            }
            AnswerEvent::Done { .. } => {
                println!();
            }
            AnswerEvent::Error { message } => {
                eprintln!();
                return Err(message.into());
            }
        }
    }

    Ok(())
}
