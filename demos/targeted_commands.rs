//! # Example: targeted_commands
//!
//! Workers grouped by color listen on a [`Tagged`] conductor; commands typed on
//! stdin reach one color or every worker.
//!
//! Shows how to:
//! - Register a worker on its tag with [`with_tag`] and a named listener
//! - Address one tag with [`with_tagged_send`], or all of them with [`with_send`]
//! - Stop listed colors on exit with a [`SetPolicy`]
//!
//! ## Commands
//! ```text
//! add [color] [millis]   spawn a worker (default: white, 1000ms)
//! start [color]          resume ticking
//! stop [color]           pause ticking
//! reset [color]          zero the counters
//! ```
//! End input (Ctrl-D) to quit: the policy sends `Quit` to red, green and blue
//! workers; workers of other colors end with the process.
//!
//! ## Run
//! ```bash
//! cargo run --example targeted_commands
//! ```

use std::collections::HashMap;
use std::time::Duration;

use conductor::{
    Builder, ConductorConfig, Context, SetPolicy, Tagged, with_cancel, with_send, with_tag,
    with_tagged_send,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const COLORS: [(&str, &str); 7] = [
    ("red", "\x1b[0;31m"),
    ("green", "\x1b[0;32m"),
    ("yellow", "\x1b[0;33m"),
    ("blue", "\x1b[0;34m"),
    ("purple", "\x1b[0;35m"),
    ("cyan", "\x1b[0;36m"),
    ("white", "\x1b[0;37m"),
];
const RESET: &str = "\x1b[0;0m";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Start,
    Stop,
    Reset,
    Quit,
}

fn escape(color: &str) -> anyhow::Result<&'static str> {
    COLORS
        .iter()
        .find(|(name, _)| *name == color)
        .map(|(_, code)| *code)
        .ok_or_else(|| anyhow::anyhow!("color not supported: {color}"))
}

async fn worker(bus: Tagged<Action>, color: String, instance: usize, period: Duration) {
    let commands = with_tag(&bus, color.as_str()).listen_as(format!("{color}-{instance}"));
    let code = escape(&color).unwrap_or(RESET);
    let mut ticker = tokio::time::interval(period);
    let (mut running, mut counter) = (true, 0u64);

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Action::Start) => running = true,
                Some(Action::Stop) => running = false,
                Some(Action::Reset) => counter = 0,
                Some(Action::Quit) | None => return,
            },
            _ = ticker.tick() => {
                if running {
                    eprintln!("{code}[{instance}] tick -> {counter}{RESET}");
                    counter += 1;
                }
            }
        }
    }
}

fn dispatch(
    bus: &Tagged<Action>,
    replicas: &mut HashMap<String, usize>,
    line: &str,
) -> anyhow::Result<()> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        anyhow::bail!("missing command");
    };
    let color = words.next();

    let action = match verb {
        "add" => {
            let color = color.unwrap_or("white").to_string();
            escape(&color)?;
            let period = match words.next() {
                Some(ms) => Duration::from_millis(ms.parse()?),
                None => Duration::from_secs(1),
            };
            let n = replicas.entry(color.clone()).or_default();
            *n += 1;
            tokio::spawn(worker(bus.clone(), color, *n, period));
            return Ok(());
        }
        "start" => Action::Start,
        "stop" => Action::Stop,
        "reset" => Action::Reset,
        other => anyhow::bail!("unknown command: {other}"),
    };

    match color {
        Some(color) => {
            escape(color)?;
            let send = with_tagged_send(bus, [color]);
            tokio::spawn(async move { send.send(action).await });
        }
        None => {
            let send = with_send(bus);
            tokio::spawn(async move { send.send(action).await });
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== targeted_commands example ===\n");

    // 1. Tagged conductor with a delivery log and a quit policy for some colors
    let cfg = ConductorConfig {
        delivery_log: Some(std::env::temp_dir().join("targeted_commands.log")),
        ..ConductorConfig::default()
    };
    let root = Builder::new(cfg).tagged::<Action>()?;
    let (bus, cancel) = with_cancel(&root);
    let bus = bus.with_lifecycle_policy(
        SetPolicy::default()
            .with("red", Action::Quit)
            .with("green", Action::Quit)
            .with("blue", Action::Quit),
    );

    // 2. Read commands until EOF
    let mut replicas = HashMap::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match dispatch(&bus, &mut replicas, &line) {
            Ok(()) => println!("OK"),
            Err(err) => println!("Failed: {err}"),
        }
    }

    // 3. Fire the policy and give it a moment to reach the workers
    cancel.cancel();
    bus.done().await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    println!("\n=== done ===");
    Ok(())
}
