//! dsrelay-ctl — command-line interface for a running relay.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::Deserialize;

const DEFAULT_PORT: u16 = 8811;

// ── Response types ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StatusResponse {
    nodes:          usize,
    basic:          usize,
    extended:       usize,
    extra_online:   usize,
    total_known:    usize,
    watch_queue:    usize,
    self_reporting: usize,
}

#[derive(Deserialize)]
struct ListResponse {
    nodes: Vec<NodeInfo>,
}

#[derive(Deserialize)]
struct NodeInfo {
    steamid:      String,
    name:         String,
    sl:           i32,
    phantom_type: i32,
    mp_zone:      i32,
    world:        String,
    covenant:     Option<i32>,
    indictments:  Option<i32>,
    dscm_version: Option<String>,
}

#[derive(Deserialize)]
struct WatchResponse {
    watch: String,
}

// ── HTTP helpers ──────────────────────────────────────────────────────────────

fn base_url(host: &str, port: u16) -> String {
    format!("http://{}:{}", host, port)
}

async fn get(url: &str) -> Result<reqwest::Response> {
    let resp = reqwest::get(url)
        .await
        .with_context(|| format!("failed to connect to dsrelayd at {} (is it running?)", url))?;
    if resp.status().is_client_error() || resp.status().is_server_error() {
        anyhow::bail!("{} returned {}", url, resp.status());
    }
    Ok(resp)
}

async fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T> {
    get(url)
        .await?
        .json::<T>()
        .await
        .context("failed to parse response")
}

// ── Subcommand handlers ───────────────────────────────────────────────────────

async fn cmd_status(base: &str) -> Result<()> {
    let resp: StatusResponse = get_json(&format!("{}/status", base)).await?;

    println!("═══════════════════════════════════════");
    println!("  Relay Status");
    println!("═══════════════════════════════════════");
    println!("  Nodes            : {}", resp.nodes);
    println!("    basic          : {}", resp.basic);
    println!("    extended       : {}", resp.extended);
    println!("  Extra online     : {}", resp.extra_online);
    println!("  Total known      : {}", resp.total_known);
    println!("  Watch queue      : {}", resp.watch_queue);
    println!("  Self-reporting   : {}", resp.self_reporting);

    Ok(())
}

async fn cmd_list(base: &str) -> Result<()> {
    // reqwest sends Accept-Encoding: gzip and decodes transparently.
    let resp: ListResponse = get_json(&format!("{}/list", base)).await?;

    if resp.nodes.is_empty() {
        println!("No nodes known.");
        return Ok(());
    }

    println!("═══════════════════════════════════════");
    println!("  Nodes ({})", resp.nodes.len());
    println!("═══════════════════════════════════════");

    for n in &resp.nodes {
        println!("  ┌─ {} ({})", n.steamid, n.name);
        println!("  │  sl / phantom : {} / {}", n.sl, n.phantom_type);
        println!("  │  zone / world : {} / {}", n.mp_zone, n.world);
        match (n.covenant, n.indictments, &n.dscm_version) {
            (Some(c), Some(i), Some(v)) => {
                println!("  │  covenant     : {}", c);
                println!("  │  indictments  : {}", i);
                println!("  └─ client       : {}", v);
            }
            _ => println!("  └─ (basic)"),
        }
    }

    Ok(())
}

async fn cmd_watch(base: &str) -> Result<()> {
    let resp = get(&format!("{}/get_watch", base)).await?;
    if resp.status() == StatusCode::NO_CONTENT {
        println!("No watch candidate available.");
        return Ok(());
    }
    let watch: WatchResponse = resp.json().await.context("failed to parse response")?;
    println!("{}", watch.watch);
    Ok(())
}

fn print_usage() {
    println!("Usage: dsrelay-ctl [--host <host>] [--port <port>] <command>");
    println!();
    println!("Commands:");
    println!("  status   Show node counts");
    println!("  list     List known nodes");
    println!("  watch    Take the next watch candidate");
    println!();
    println!("Options:");
    println!("  --host <host>   Relay host (default: 127.0.0.1)");
    println!("  --port <port>   Relay HTTP port (default: {})", DEFAULT_PORT);
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut host = "127.0.0.1".to_string();
    let mut port = DEFAULT_PORT;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--host" => {
                i += 1;
                host = args.get(i).context("--host requires a value")?.clone();
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    let base = base_url(&host, port);
    match remaining.as_slice() {
        ["status"] | []                => cmd_status(&base).await,
        ["list"]                       => cmd_list(&base).await,
        ["watch"]                      => cmd_watch(&base).await,
        ["help"] | ["--help"] | ["-h"] => { print_usage(); Ok(()) }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
}
