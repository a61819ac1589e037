use anyhow::{Context, Result};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use canvas_tools::{tools, CanvasClient, Config};

fn print_help() {
    println!("canvas-tools — Canvas LMS data-access tools for LLM agents");
    println!();
    println!("USAGE:");
    println!("  canvas-tools <tool> [json-args]   Run one tool, print JSON");
    println!("  canvas-tools --list               Print the tool definitions");
    println!("  canvas-tools --init               Generate a default config file");
    println!();
    println!("EXAMPLES:");
    println!("  canvas-tools get_courses");
    println!("  canvas-tools get_assignments '{{\"course_id\": 80546}}'");
    println!("  canvas-tools get_upcoming_assignments '{{\"days\": 14}}'");
    println!();
    println!("CONFIG:");
    println!("  File: ~/.config/canvas-tools/config.toml");
    println!("  Or set env vars: CANVAS_URL and CANVAS_TOKEN");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--init") {
        let path = Config::generate_default()?;
        println!("Generated config file at: {}", path.display());
        println!("Edit it with your Canvas URL and API token, then run canvas-tools.");
        return Ok(());
    }

    if args.iter().any(|a| a == "--list") {
        let defs: Vec<Value> = tools::tool_defs()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "name": d.name,
                    "description": d.description,
                    "input_schema": d.input_schema,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&defs)?);
        return Ok(());
    }

    let tool_name = &args[0];
    let tool_args: Value = match args.get(1) {
        Some(raw) => serde_json::from_str(raw)
            .with_context(|| format!("Tool arguments are not valid JSON: {raw}"))?,
        None => Value::Object(Default::default()),
    };

    let config = Config::load().with_context(|| {
        "Failed to load configuration.\n\
         Run `canvas-tools --init` to generate a config file,\n\
         or set CANVAS_URL and CANVAS_TOKEN environment variables."
    })?;
    let client = CanvasClient::from_config(&config)?;

    let result = tools::dispatch(&client, tool_name, &tool_args).await;
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
