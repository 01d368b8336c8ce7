use anyhow::{bail, Result};
use cipherbot::load;
use std::{env, path::PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

/// Offline check of a programs file: `lookup <PATH> [--json] [QUERY...]`.
fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next().map(PathBuf::from) else {
        bail!("Usage: lookup <PROGRAMS_PATH> [--json] [QUERY...]");
    };
    let (flags, queries): (Vec<String>, Vec<String>) = args.partition(|a| a == "--json");
    let json = !flags.is_empty();

    let records = load::load(&path);
    println!("{}: {} records", path.display(), records.count());

    for query in &queries {
        let lines = records.search(query);
        if json {
            println!(
                "{}",
                serde_json::to_string(&serde_json::json!({ "query": query, "results": lines }))?
            );
        } else if lines.is_empty() {
            println!("'{}': not found", query.trim());
        } else {
            println!("'{}': {} found", query.trim(), lines.len());
            for line in &lines {
                println!("  {}", line);
            }
        }
    }
    Ok(())
}
