//! # Example: coordinated_pausing
//!
//! Several workers tick at their own pace and react to commands broadcast by a
//! single [`Simple`] conductor.
//!
//! Shows how to:
//! - Bridge OS signals into commands with [`with_notify`]
//! - Stop everything with a [`ConstantPolicy`] once the run times out
//! - Give each consumer its own named listener with [`Simple::listen_as`]
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► with_timeout(Simple::new(), 20s) + ConstantPolicy(Stop)
//!   ├─► SIGUSR1 ─► Pause    SIGUSR2 ─► Unpause    SIGINT ─► Stop
//!   ├─► spawn worker-1..4   (tick only while unpaused, exit on Stop)
//!   └─► printer loop        (one status line, exits on Stop)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example coordinated_pausing
//! kill -USR1 <pid>   # pause
//! kill -USR2 <pid>   # unpause
//! ```

use std::time::Duration;

use conductor::{Builder, ConductorConfig, ConstantPolicy, Simple, with_notify, with_timeout};
use tokio::sync::mpsc;
use tokio::time::Instant;

const WORKERS: usize = 4;
const RUN_FOR: Duration = Duration::from_secs(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    Pause,
    Unpause,
    Stop,
}

/// Ticks every `period` while unpaused and reports the tick to `out`.
async fn worker(
    bus: Simple<Action>,
    idx: usize,
    period: Duration,
    out: mpsc::Sender<(usize, Instant)>,
) {
    let commands = bus.listen_as(format!("worker-{}", idx + 1));
    let mut ticker = tokio::time::interval(period);
    let mut current = Action::Unpause;

    loop {
        tokio::select! {
            cmd = commands.recv() => match cmd {
                Some(Action::Stop) | None => return,
                Some(action) => current = action,
            },
            t = ticker.tick() => {
                if current == Action::Unpause && out.send((idx, t)).await.is_err() {
                    return;
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    println!("=== coordinated_pausing example (pid {}) ===\n", std::process::id());

    // 1. Conductor that logs deliveries and stops everyone after RUN_FOR
    let cfg = ConductorConfig {
        delivery_log: Some(std::env::temp_dir().join("conductor.log")),
        ..ConductorConfig::default()
    };
    let root = Builder::new(cfg).simple::<Action>()?;
    let (bus, _cancel) = with_timeout(&root, RUN_FOR);
    let bus = bus.with_lifecycle_policy(ConstantPolicy::new(Action::Stop));

    // 2. Signals become commands
    #[cfg(unix)]
    {
        use conductor::{SignalKind, Signals};
        let notify = with_notify(&bus);
        notify.notify(Action::Stop, Signals::new([SignalKind::interrupt()])?);
        notify.notify(Action::Pause, Signals::new([SignalKind::user_defined1()])?);
        notify.notify(Action::Unpause, Signals::new([SignalKind::user_defined2()])?);
    }
    #[cfg(not(unix))]
    with_notify(&bus).notify(Action::Stop, conductor::CtrlC);

    // 3. Workers with different periods
    let (tx, mut ticks) = mpsc::channel(WORKERS);
    for idx in 0..WORKERS {
        let period = Duration::from_millis(400 * (idx as u64 + 1));
        println!("worker-{} ticks every {period:?}", idx + 1);
        tokio::spawn(worker(bus.clone(), idx, period, tx.clone()));
    }
    drop(tx);

    // 4. Status line
    let status = bus.listen_as("printer");
    let start = Instant::now();
    let mut last = [Duration::ZERO; WORKERS];
    loop {
        tokio::select! {
            cmd = status.recv() => {
                let Some(cmd) = cmd else { break };
                print!("\x1b[2K\rStatus: {cmd:?}");
                if cmd == Action::Stop {
                    println!("    =>   Stopping...");
                    break;
                }
            }
            Some((idx, at)) = ticks.recv() => {
                last[idx] = at.duration_since(start);
                let line = last
                    .iter()
                    .enumerate()
                    .map(|(i, d)| format!("{}: {:>8.3}s", i + 1, d.as_secs_f64()))
                    .collect::<Vec<_>>()
                    .join(" | ");
                print!("\x1b[2K\r{line}");
            }
        }
    }

    println!("\n=== done ===");
    Ok(())
}
