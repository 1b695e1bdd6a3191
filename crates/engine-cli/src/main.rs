use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use contracts::GameConfig;
use engine_api::{serve, AdvisorConfig, LlmAdvisorSuite, ServerOptions};
use engine_core::{AdvisorSuite, GameWorld, NoopAdvisors};

fn print_usage() {
    println!("statecraft <command>");
    println!("commands:");
    println!("  serve [addr]");
    println!("    default addr: 127.0.0.1:8080 (or BIND_ADDR)");
    println!("  simulate [ticks]");
    println!("    run a local game offline with advisor fallbacks");
    println!();
    println!("environment:");
    println!("  ADVISOR_API_KEY / ADVISOR_API_URL / ADVISOR_MODEL / ADVISOR_TIMEOUT_MS");
    println!("  TICK_INTERVAL_HOURS, MAX_PLAYERS_PER_SERVER, SQLITE_PATH, BIND_ADDR");
}

fn env_u32(key: &str, fallback: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(fallback)
}

fn parse_socket_addr(value: Option<&String>) -> Result<SocketAddr, String> {
    let fallback = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let raw = value.map(String::as_str).unwrap_or(fallback.as_str());
    raw.parse::<SocketAddr>()
        .map_err(|_| format!("invalid addr: {raw}"))
}

fn build_advisors() -> Arc<dyn AdvisorSuite + Send + Sync> {
    match AdvisorConfig::from_env() {
        Some(config) => match LlmAdvisorSuite::from_config(config) {
            Ok(suite) => {
                tracing::info!("advisor transport configured");
                Arc::new(suite)
            }
            Err(err) => {
                tracing::warn!(%err, "advisor transport unavailable, stages will fall back");
                Arc::new(NoopAdvisors)
            }
        },
        None => {
            tracing::info!("no ADVISOR_API_KEY set, advisor stages run on fallbacks");
            Arc::new(NoopAdvisors)
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("serve") => match parse_socket_addr(args.get(2)) {
            Ok(addr) => {
                let mut options = ServerOptions::new(build_advisors());
                options.tick_interval_hours = env_u32("TICK_INTERVAL_HOURS", 4);
                options.max_players = env_u32("MAX_PLAYERS_PER_SERVER", 20) as u16;
                println!("serving api on http://{addr}");
                if let Err(err) = serve(addr, options).await {
                    eprintln!("server error: {err}");
                    std::process::exit(1);
                }
            }
            Err(err) => {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        },
        Some("simulate") => {
            let ticks = args.get(2).and_then(|value| value.parse::<u64>().ok()).unwrap_or(10);
            let mut config = GameConfig::new("srv_local", 1);
            config.tick_interval_hours = env_u32("TICK_INTERVAL_HOURS", 4);
            let mut world = GameWorld::new(config, 0);
            for _ in 0..ticks {
                let report = world.run_tick(&NoopAdvisors);
                println!(
                    "tick {} hash={} actions={} events={}",
                    report.tick,
                    &report.content_hash[..12],
                    report.actions_resolved,
                    report.events_applied
                );
            }
        }
        _ => {
            print_usage();
            std::process::exit(2);
        }
    }
}
