//! Register hotkeys from the command line and print them as they fire.
//!
//! Stands in for a real binding layer: creates one context, registers
//! the requested combinations, pumps a platform event loop and polls on
//! a short cadence.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tao::event_loop::{ControlFlow, EventLoop};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use system_hotkey::{Hotkey, HotkeyContext};

#[derive(Parser, Debug)]
#[command(name = "system-hotkey-cli")]
#[command(about = "Watch global hotkeys and print them as they fire", long_about = None)]
struct Args {
    /// Hotkeys to watch, e.g. "ctrl+shift+a" or "f9"
    #[arg(required = true)]
    hotkeys: Vec<Hotkey>,

    /// Hotkey that exits the program
    #[arg(long, default_value = "ctrl+shift+escape")]
    exit_key: Hotkey,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .without_time()
                .with_target(false),
        )
        .with(EnvFilter::from_default_env())
        .init();

    // The event loop must run on the main thread; on macOS and Windows
    // hotkey events are only delivered while it is pumping.
    let event_loop = EventLoop::new();

    let ctx = HotkeyContext::new().context("failed to create hotkey context")?;

    let exit_key = args.exit_key;
    ctx.register(exit_key)
        .with_context(|| format!("failed to register exit key {exit_key}"))?;
    for hotkey in args.hotkeys.iter().filter(|h| **h != exit_key) {
        ctx.register(*hotkey)
            .with_context(|| format!("failed to register {hotkey}"))?;
        println!("watching {hotkey}");
    }
    println!("press {exit_key} to exit");

    let poll_interval = Duration::from_millis(args.poll_ms);
    event_loop.run(move |_event, _, control_flow| {
        if ctx.is_closed() {
            *control_flow = ControlFlow::Exit;
            return;
        }
        *control_flow = ControlFlow::WaitUntil(Instant::now() + poll_interval);

        let triggered = match ctx.poll() {
            Ok(triggered) => triggered,
            Err(e) => {
                warn!(error = %e, "poll failed");
                *control_flow = ControlFlow::Exit;
                return;
            }
        };

        for hotkey in triggered {
            if hotkey == exit_key {
                info!("exit hotkey pressed");
                if let Err(e) = ctx.shutdown() {
                    warn!(error = %e, "shutdown reported an error");
                }
                *control_flow = ControlFlow::Exit;
                return;
            }
            println!("{hotkey}");
        }
    });

    // The event loop only returns via ControlFlow::Exit, which ends the
    // process inside run() on some platforms.
    #[allow(unreachable_code)]
    Ok(())
}
