use anyhow::{Context, Result};

use crate::client::RagClient;
use crate::config::Config;
use crate::controller::ConversationController;
use crate::message::Role;
use crate::view::{render_state, Alignment, ConversationView};

/// Run a single turn and print the resulting conversation
pub async fn ask(config: &Config, message: &str) -> Result<()> {
    let client = RagClient::new(config).context("Failed to create HTTP client")?;
    let mut controller = ConversationController::new(client, config.controller_settings());

    if !controller.submit(message).await {
        println!("Nothing to send.");
        return Ok(());
    }

    let view = render_state(&controller, &config.ui.assistant_name);
    print!("{}", format_transcript(&view, &config.ui.assistant_name));
    Ok(())
}

/// Print the effective configuration, or write the defaults to disk
pub fn config(config: &Config, init: bool) -> Result<()> {
    if init {
        let path = config.config_path();
        if path.exists() {
            println!("Config already exists at {}", path.display());
            return Ok(());
        }
        let path = config.save()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    println!("# {}", config.config_path().display());
    print!("{}", toml::to_string_pretty(config).context("Failed to serialize config")?);
    Ok(())
}

/// Plain-text rendering of a conversation for non-interactive output
pub fn format_transcript(view: &ConversationView, assistant_name: &str) -> String {
    let mut out = String::new();

    for bubble in &view.bubbles {
        let label = match bubble.role {
            Role::User => "You",
            Role::Assistant => assistant_name,
            Role::System => "!",
        };
        let prefix = match bubble.alignment {
            Alignment::Trailing => "> ",
            Alignment::Leading => "< ",
            Alignment::Centered => "  ",
        };
        out.push_str(&format!("{prefix}{label}: {}\n", bubble.text));
    }

    if !view.metric_lines.is_empty() {
        out.push_str("\nMetrics:\n");
        for line in &view.metric_lines {
            out.push_str(&format!("  {line}\n"));
        }
    }

    if let Some(evaluation) = &view.evaluation {
        out.push_str(&format!("\nEvaluation:\n  {evaluation}\n"));
    }

    out
}
