//! Headless skirmish demo.
//!
//! Wires the battle controller to mock devices and runs a scripted
//! engagement: an enemy tank fires on a fixed cadence, our unit returns
//! fire whenever the cannon is loaded, and a friendly repair vehicle steps
//! in once damage gets serious. Battle events stream to the log; the final
//! snapshot can be dumped as JSON.

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use irbattle_core::commands::Command;
use irbattle_core::constants::TICK_MS;
use irbattle_core::enums::{Protocol, WeightClass};
use irbattle_core::settings::BattleSettings;
use irbattle_core::types::SignalCapture;
use irbattle_sim::mock::MockBench;
use irbattle_sim::{BattleController, ControllerConfig};

#[derive(Clone, Copy, ValueEnum)]
enum ClassArg {
    Light,
    Medium,
    Heavy,
}

impl From<ClassArg> for WeightClass {
    fn from(class: ClassArg) -> WeightClass {
        match class {
            ClassArg::Light => WeightClass::Light,
            ClassArg::Medium => WeightClass::Medium,
            ClassArg::Heavy => WeightClass::Heavy,
        }
    }
}

#[derive(Parser)]
#[command(name = "irbattle", about = "Headless IR battle skirmish demo")]
struct Args {
    /// RNG seed for the light effects.
    #[arg(long, default_value_t = 7)]
    seed: u64,

    /// Simulated battle length in seconds.
    #[arg(long, default_value_t = 90)]
    seconds: u64,

    /// Weight class of our unit.
    #[arg(long, value_enum, default_value_t = ClassArg::Medium)]
    class: ClassArg,

    /// Interval between incoming enemy shots (ms).
    #[arg(long, default_value_t = 4_000)]
    enemy_interval_ms: u64,

    /// Dump the final snapshot as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<(), serde_json::Error> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = BattleSettings {
        weight_class: args.class.into(),
        reload_notify: true,
        ..BattleSettings::default()
    };
    let (bench, devices) = MockBench::new();
    let mut controller = BattleController::new(
        ControllerConfig {
            settings,
            seed: args.seed,
        },
        devices,
    );

    let ticks = args.seconds * 1_000 / TICK_MS;
    let mut snap = controller.tick();
    for _ in 1..ticks {
        let now = snap.time.now_ms;

        if now % args.enemy_interval_ms == 0 {
            bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        }
        // A friendly repair vehicle answers once we are badly damaged.
        if now % 1_000 == 0
            && snap.damage_percent >= 50.0
            && !snap.destroyed
            && !snap.repair_ongoing
        {
            bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
        }
        if snap.cannon_reloaded && !snap.destroyed && !snap.repair_ongoing {
            controller.queue_command(Command::Fire);
        }

        snap = controller.tick();
        for event in &snap.events {
            info!(
                tick = snap.time.tick,
                damage = snap.damage_percent,
                ?event,
                "battle event"
            );
        }
    }

    info!(
        damage = snap.damage_percent,
        cannon_hits = snap.cannon_hits_taken,
        destroyed = snap.destroyed,
        shots_returned = bench.transmitter.send_count(),
        "skirmish over"
    );
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    }
    Ok(())
}
