//! Automatic motor controller.
//!
//! Powers up, holds speed briefly, then powers down on its own. The motor is
//! switched on again every ten seconds until Ctrl-C, after which it is
//! switched off and the program waits for it to come to rest.
//!
//! Run with `RUST_LOG=debug` to see every transition.

use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use waypoint::{CallbackError, Machine, MachineConfig, MachineHandle, State};

/// Simulated time spent in each powered phase.
const PHASE: Duration = Duration::from_secs(2);

/// Raise `event` once `PHASE` has elapsed, off the worker thread.
fn raise_later(machine: &MachineHandle, event: &'static str) {
    let machine = machine.clone();
    thread::spawn(move || {
        thread::sleep(PHASE);
        if let Err(err) = machine.raise(event) {
            warn!(%err, event, "motor event dropped");
        }
    });
}

struct Idle;

impl State for Idle {
    fn id(&self) -> &str {
        "idle"
    }

    fn on_entry(&mut self, _machine: &MachineHandle) -> Result<(), CallbackError> {
        info!("motor at rest");
        Ok(())
    }
}

struct PowerUp;

impl State for PowerUp {
    fn id(&self) -> &str {
        "power_up"
    }

    fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        info!("spinning up");
        raise_later(machine, "maintain_speed");
        Ok(())
    }

    fn on_exit(&mut self, _machine: &MachineHandle) -> Result<(), CallbackError> {
        info!("spin-up complete");
        Ok(())
    }
}

struct SpeedControl {
    cycles: u32,
}

impl State for SpeedControl {
    fn id(&self) -> &str {
        "speed_control"
    }

    fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        self.cycles += 1;
        info!(cycle = self.cycles, "holding speed");
        raise_later(machine, "off");
        Ok(())
    }
}

struct PowerDown;

impl State for PowerDown {
    fn id(&self) -> &str {
        "power_down"
    }

    fn on_entry(&mut self, machine: &MachineHandle) -> Result<(), CallbackError> {
        info!("spinning down");
        raise_later(machine, "has_shutdown");
        Ok(())
    }
}

fn motor() -> Result<Machine, waypoint::EngineError> {
    let mut machine = Machine::with_config(MachineConfig::new("motor").thread_name("motor-fsm"));
    machine.add_state(Idle)?;
    machine.add_state(PowerUp)?;
    machine.add_state(SpeedControl { cycles: 0 })?;
    machine.add_state(PowerDown)?;

    machine.add_rule("idle", "on", "power_up")?;
    machine.add_rule("power_up", "maintain_speed", "speed_control")?;
    machine.add_rule("speed_control", "off", "power_down")?;
    machine.add_rule("power_up", "off", "power_down")?;
    machine.add_rule("power_down", "on", "power_up")?;
    machine.add_rule("power_down", "has_shutdown", "idle")?;

    machine.start("idle")?;
    Ok(machine)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut machine = motor()?;
    info!(state = %machine.active_state()?, "controller ready");

    let mut ticker = tokio::time::interval(Duration::from_secs(10));
    loop {
        tokio::select! {
            _ = ticker.tick() => machine.raise("on")?,
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!(state = %machine.active_state()?, "shutdown requested");
    machine.raise("off")?;
    while machine.is_running()
        && (machine.has_pending_events() || machine.active_state()? != "idle")
    {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    info!("motor idle");

    let history = tokio::task::spawn_blocking(move || {
        machine.stop().map(|()| machine.history())
    })
    .await??;
    info!(transitions = history.total_recorded(), "controller stopped");
    Ok(())
}
