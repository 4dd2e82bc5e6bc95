//! AI backend diagnostics

use anyhow::Result;
use verde_core::{AIBackend, AIClient, AIOrchestrator, ModelRouter, TaskType};

/// Check the configured backend, the router and the tool-calling host
pub async fn cmd_health() -> Result<()> {
    println!("Checking AI configuration...\n");

    match AIClient::from_env() {
        Ok(ai) => {
            println!("  Backend: {}", ai.kind());
            println!("  Model:   {}", ai.model());
            println!("  Host:    {}", ai.host());
            print!("  Status:  ");
            if ai.health_check().await {
                println!("✅ Available");
            } else {
                println!("❌ Unreachable");
            }
        }
        Err(e) => {
            println!("  ⚠️  No AI backend: {}", e);
            println!("\n  Set AI_BACKEND=mock to try Verde offline.");
        }
    }

    let router = match ModelRouter::new() {
        Ok(router) => router,
        Err(e) => {
            println!("\n  ⚠️  Invalid router config ({}), using defaults", e);
            ModelRouter::default()
        }
    };
    println!("\nModel routing:");
    if let Some(path) = router.config_path() {
        println!("  Config: {}", path.display());
    }
    for task in TaskType::all() {
        let config = router.config_for_task(*task);
        println!(
            "  {:<14} model={:<20} timeout={}s",
            task.as_str(),
            config.model.as_deref().unwrap_or("(backend default)"),
            config.timeout.as_secs()
        );
    }

    println!("\nTool calling:");
    match AIOrchestrator::from_env() {
        Some(orchestrator) => {
            let backend = orchestrator.backend();
            println!("  Host:   {}", backend.host());
            println!("  Model:  {}", orchestrator.model());
            print!("  Status: ");
            if backend.health_check().await {
                println!("✅ Available");
            } else {
                println!("❌ Unreachable");
            }
        }
        None => println!("  Not configured (set ANTHROPIC_COMPATIBLE_HOST)"),
    }

    Ok(())
}
