//! vhs-horror CLI - headless theme sessions
//!
//!   vhs-horror simulate [--seconds N] [--seed N]   → fast-forward a session, print a summary
//!   vhs-horror simulate --json                     → print the surface command journal
//!   vhs-horror run [--seconds N]                   → drive a session in real time until Ctrl+C
//!   vhs-horror config                              → print the default configuration
//!
//! Configuration:
//!   --config <file>   JSON file with the theme options (env: VHS_CONFIG)

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::time::Duration;
use tracing::{debug, info};
use vhs_horror::logging::init_logging;
use vhs_horror::runtime::{drive, install_signal_handlers, FRAME_INTERVAL};
use vhs_horror::{
    Chance, EffectScheduler, ElementKind, MemorySurface, RandChance, RecordingAudio, Surface,
    ThemeConfig,
};

/// Host frame used by `simulate`, in ms
const SIM_FRAME_MS: u64 = 16;

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("vhs-horror {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("simulate") | Some("sim") => cmd_simulate(&opts),
        Some("run") => cmd_run(&opts),
        Some("config") => cmd_config(&opts),
        Some(cmd) => Err(anyhow::anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = opts.pretty || std::io::stdout().is_terminal();
    match result {
        Ok(output) => println!("{}", render(&output, pretty)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{:#}", e) }), pretty));
            std::process::exit(1);
        }
    }
}

fn render(value: &Value, pretty: bool) -> String {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    seconds: Option<u64>,
    seed: Option<u64>,
    config: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--seconds" | "-s" => {
                    if i + 1 < args.len() {
                        opts.seconds = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        opts.seed = args[i + 1].parse().ok();
                        i += 1;
                    }
                }
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        opts.config = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        // Environment has lower priority than flags
        if opts.config.is_none() {
            opts.config = env::var("VHS_CONFIG").ok().filter(|s| !s.is_empty());
        }
        if opts.seed.is_none() {
            opts.seed = env::var("VHS_SEED").ok().and_then(|s| s.parse().ok());
        }

        opts
    }

    fn load_config(&self) -> Result<ThemeConfig> {
        match self.config.as_deref() {
            Some(path) => ThemeConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path)),
            None => Ok(ThemeConfig::default()),
        }
    }
}

fn print_usage() {
    println!(
        r#"vhs-horror - analog horror effect scheduler

USAGE:
    vhs-horror <command> [options]

COMMANDS:
    simulate                Fast-forward a session on an in-memory page
    run                     Drive a session in real time (Ctrl+C to stop)
    config                  Print the default configuration as JSON

OPTIONS:
    --seconds, -s <n>       Session length (simulate default: 60, run default: until Ctrl+C)
    --seed <n>              Seed the randomness source (env: VHS_SEED)
    --config, -c <file>     JSON theme options (env: VHS_CONFIG)
    --json                  simulate: print the full command journal
    --pretty                Pretty-print JSON
    --version, -V           Print version

LOGGING:
    RUST_LOG=debug          Show every effect as it fires
    VHS_LOG_JSON=1          Log as JSON lines

EXAMPLES:
    vhs-horror simulate --seconds 120 --seed 7
    vhs-horror run --seconds 30 --config theme.json
"#
    );
}

/// A small themed page: card with heading and copy, a tagged title, a button
fn demo_page() -> MemorySurface {
    let mut page = MemorySurface::new("Archive 1987");
    let card = page.add_element("div", &["vhs-card"], "");
    page.add_child(card, "h2", "Tape 04: Basement");
    page.add_child(card, "p", "Recovered from the estate sale. Do not play after midnight.");
    let title = page.add_element("h1", &[], "LOST SIGNAL");
    page.set_element_id(title, "main-title");
    page.add_element("p", &["vhs-corrupted-text"], "PLEASE STAND BY");
    let button = page.add_element("button", &[], "PLAY");
    page.set_element_id(button, "play");
    page
}

fn build(opts: &ParsedArgs) -> Result<EffectScheduler<MemorySurface>> {
    let config = opts.load_config()?;
    let chance: Box<dyn Chance> = match opts.seed {
        Some(seed) => Box::new(RandChance::seeded(seed)),
        None => Box::new(RandChance::from_entropy()),
    };
    let mut theme = EffectScheduler::new(demo_page(), config)
        .with_chance(chance)
        .with_audio(Box::new(RecordingAudio::new(8_000)));
    theme.init();
    theme.apply_to_element("#main-title", ElementKind::Title);
    theme.apply_to_element("play", ElementKind::Button);
    Ok(theme)
}

fn summary(theme: &EffectScheduler<MemorySurface>, started_at: &str, driven_ms: u64) -> Value {
    json!({
        "startedAt": started_at,
        "drivenMs": driven_ms,
        "sessionMs": theme.elapsed_ms(),
        "title": theme.surface().title(),
        "pageFilter": theme.surface().page_filter(),
        "pendingTimers": theme.pending_timers(),
        "overlays": theme.surface().overlays().len(),
        "audio": theme.audio_active(),
        "stats": theme.stats(),
    })
}

fn session_ms(seconds: u64) -> u64 {
    seconds.saturating_mul(1000)
}

fn cmd_simulate(opts: &ParsedArgs) -> Result<Value> {
    let seconds = opts.seconds.unwrap_or(60);
    let started_at = chrono::Utc::now().to_rfc3339();
    let mut theme = build(opts)?;
    info!(seconds, seed = ?opts.seed, "Simulating session");

    let total = session_ms(seconds);
    let mut driven = 0;
    while driven < total {
        let dt = SIM_FRAME_MS.min(total - driven);
        theme.advance(dt);
        driven += dt;
        // Pretend the visitor moved the pointer once a second
        if driven % 1000 < SIM_FRAME_MS {
            let x = (driven / 7 % 640) as f64;
            let y = (driven / 11 % 480) as f64;
            theme.pointer_move(x, y);
        }
    }
    debug!(driven, "Simulation finished");

    if opts.json {
        return Ok(serde_json::to_value(theme.surface().journal())?);
    }
    let mut out = summary(&theme, &started_at, driven);
    theme.destroy();
    out["afterDestroy"] = json!({
        "title": theme.surface().title(),
        "themed": theme.surface().themed(),
        "pendingTimers": theme.pending_timers(),
    });
    Ok(out)
}

fn cmd_run(opts: &ParsedArgs) -> Result<Value> {
    let started_at = chrono::Utc::now().to_rfc3339();
    let mut theme = build(opts)?;
    let limit = opts.seconds.map(Duration::from_secs);

    let rt = tokio::runtime::Runtime::new().context("Failed to create runtime")?;
    let driven = rt.block_on(async {
        let shutdown = install_signal_handlers();
        info!(?limit, "Theme running, Ctrl+C to stop");
        drive(&mut theme, FRAME_INTERVAL, limit, shutdown.subscribe()).await
    });

    let out = summary(&theme, &started_at, driven);
    theme.destroy();
    Ok(out)
}

fn cmd_config(opts: &ParsedArgs) -> Result<Value> {
    let config = opts.load_config()?;
    Ok(serde_json::to_value(config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_length_saturates() {
        assert_eq!(session_ms(60), 60_000);
        assert_eq!(session_ms(u64::MAX), u64::MAX);
    }
}
