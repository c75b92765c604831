//! Tests for the battle controller: hit disambiguation, damage and
//! destruction, repair, recovery, firing, and determinism.

use irbattle_core::commands::Command;
use irbattle_core::constants::*;
use irbattle_core::enums::{HitKind, Protocol, Team, UnitRole, WeightClass};
use irbattle_core::events::BattleEvent;
use irbattle_core::settings::{BattleSettings, ClassSettings};
use irbattle_core::state::BattleSnapshot;
use irbattle_core::types::{ProtocolSet, SignalCapture};

use crate::controller::{BattleController, ControllerConfig};
use crate::mock::MockBench;

fn setup(settings: BattleSettings) -> (BattleController, MockBench) {
    let (bench, devices) = MockBench::new();
    let controller = BattleController::new(ControllerConfig { settings, seed: 7 }, devices);
    (controller, bench)
}

/// Run for (at least) the given span, returning the last snapshot.
fn run_ms(controller: &mut BattleController, ms: u64) -> BattleSnapshot {
    let mut snap = BattleSnapshot::default();
    for _ in 0..ms.div_ceil(TICK_MS) {
        snap = controller.tick();
    }
    snap
}

/// Run for the given span, returning the last snapshot and every event
/// emitted along the way.
fn run_ms_events(controller: &mut BattleController, ms: u64) -> (BattleSnapshot, Vec<BattleEvent>) {
    let mut snap = BattleSnapshot::default();
    let mut events = Vec::new();
    for _ in 0..ms.div_ceil(TICK_MS) {
        snap = controller.tick();
        events.extend(snap.events.clone());
    }
    (snap, events)
}

/// A capture of the Tamiya 2-shot kill code, which also decodes as plain
/// Tamiya.
fn two_shot_capture() -> SignalCapture {
    SignalCapture {
        candidates: ProtocolSet::single(Protocol::Tamiya2Shot).with(Protocol::Tamiya),
        value: 0,
    }
}

fn custom_mg_settings() -> BattleSettings {
    BattleSettings {
        weight_class: WeightClass::Custom,
        class: ClassSettings {
            reload_ms: 5_000,
            recovery_ms: 12_000,
            max_cannon_hits: 6,
            max_mg_hits: 4,
        },
        accept_mg_damage: true,
        ..BattleSettings::default()
    }
}

// ---- Damage and destruction ----

#[test]
fn test_medium_class_destroyed_after_six_hits() {
    let (mut controller, bench) = setup(BattleSettings::default());

    for hit in 1..=6u8 {
        bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        let snap = controller.tick();
        assert_eq!(snap.cannon_hits_taken, hit);
        if hit < 6 {
            assert!(!snap.destroyed);
            assert!(snap.damage_percent < 100.0);
            run_ms(&mut controller, 1_200);
        } else {
            assert!(snap.destroyed);
            assert_eq!(snap.damage_percent, 100.0);
            assert!(snap.events.contains(&BattleEvent::Destroyed));
        }
    }
}

#[test]
fn test_destroyed_unit_ignores_further_hits() {
    let (mut controller, bench) = setup(BattleSettings::default());

    for _ in 0..6 {
        bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        controller.tick();
        run_ms(&mut controller, 1_200);
    }
    let before = bench.receiver.dropped_count();
    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(bench.receiver.dropped_count(), before + 1);
    assert_eq!(snap.cannon_hits_taken, 6);
    assert_eq!(snap.damage_percent, 100.0);
}

#[test]
fn test_two_shot_kill_code_destroys_in_two() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(two_shot_capture());
    let snap = controller.tick();
    assert_eq!(snap.damage_percent, TWO_SHOT_DAMAGE_PCT);
    assert_eq!(snap.last_hit_protocol, Some(Protocol::Tamiya2Shot));
    assert!(!snap.destroyed);

    run_ms(&mut controller, 1_200);
    bench.receiver.inject(two_shot_capture());
    let snap = controller.tick();
    assert_eq!(snap.damage_percent, 100.0);
    assert!(snap.destroyed);
}

#[test]
fn test_plain_tamiya_normal_damage_on_two_shot_listener() {
    let settings = BattleSettings {
        fire_protocol: Some(Protocol::Tamiya2Shot),
        alt_hit_protocol: None,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert_eq!(snap.last_hit_protocol, Some(Protocol::Tamiya));
    assert!(snap.damage_percent < TWO_SHOT_DAMAGE_PCT);
}

#[test]
fn test_alternate_protocol_registers() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::HengLong));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert_eq!(snap.last_hit_protocol, Some(Protocol::HengLong));
}

#[test]
fn test_unrecognized_protocol_ignored() {
    let settings = BattleSettings {
        alt_hit_protocol: None,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench.receiver.inject(SignalCapture::new(Protocol::VsTank));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 0);
    assert_eq!(snap.damage_percent, 0.0);
    assert!(!snap.invulnerable);
}

#[test]
fn test_ir_disabled_unit_cannot_be_hit() {
    let settings = BattleSettings {
        fire_protocol: None,
        alt_hit_protocol: None,
        mg_protocol: None,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 0);
    assert_eq!(snap.damage_percent, 0.0);
}

// ---- Hit filter ----

#[test]
fn test_hit_filter_absorbs_signal_repeats() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert!(snap.invulnerable);

    // The same physical shot keeps repeating its signal inside the window.
    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = run_ms(&mut controller, 500);
    assert_eq!(bench.receiver.dropped_count(), 1);
    assert_eq!(snap.cannon_hits_taken, 1);
    assert!(snap.invulnerable);

    // Once the window expires a fresh shot registers.
    let snap = run_ms(&mut controller, 700);
    assert!(!snap.invulnerable);
    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 2);
}

// ---- Friendly fire ----

#[test]
fn test_own_team_hits_are_discarded() {
    let settings = BattleSettings {
        fire_protocol: Some(Protocol::Fov),
        alt_hit_protocol: None,
        team: Team::Fov2,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench
        .receiver
        .inject(SignalCapture::with_value(Protocol::Fov, FOV_TEAM_2_VALUE));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 0);
    assert!(snap
        .events
        .contains(&BattleEvent::FriendlyFireIgnored { team: Team::Fov2 }));
    assert!(!snap.invulnerable);

    bench
        .receiver
        .inject(SignalCapture::with_value(Protocol::Fov, FOV_TEAM_3_VALUE));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert_eq!(snap.last_hit_team, Team::Fov3);
}

#[test]
fn test_no_team_fov_value_always_counts() {
    let settings = BattleSettings {
        fire_protocol: Some(Protocol::Fov),
        alt_hit_protocol: None,
        team: Team::Fov2,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench
        .receiver
        .inject(SignalCapture::with_value(Protocol::Fov, FOV_TEAM_1_VALUE));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert_eq!(snap.last_hit_team, Team::None);
}

// ---- Machine-gun damage ----

#[test]
fn test_mg_hits_destroy_at_budget() {
    let (mut controller, bench) = setup(custom_mg_settings());

    for hit in 1..=4u8 {
        bench.receiver.inject(SignalCapture::new(Protocol::MgClark));
        let snap = controller.tick();
        assert_eq!(snap.mg_hits_taken, hit);
        if hit < 4 {
            assert!(!snap.destroyed);
            // No filter window for MG fire.
            assert!(!snap.invulnerable);
        } else {
            assert!(snap.destroyed);
            assert_eq!(snap.damage_percent, 100.0);
        }
    }
}

#[test]
fn test_mg_ignored_without_mg_damage_enabled() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::MgClark));
    let snap = controller.tick();
    assert_eq!(snap.mg_hits_taken, 0);
    assert_eq!(snap.damage_percent, 0.0);
}

// ---- Repair ----

#[test]
fn test_repair_restores_one_hit_of_health() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    controller.tick();
    run_ms(&mut controller, 1_200);

    bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
    let snap = controller.tick();
    assert!(snap.repair_ongoing);
    assert!(snap.events.contains(&BattleEvent::RepairStarted));
    // A unit under repair is still a legitimate target.
    assert!(!snap.invulnerable);

    let (snap, events) = run_ms_events(&mut controller, REPAIR_TIME_MS + 100);
    assert!(events.contains(&BattleEvent::RepairComplete));
    assert!(!snap.repair_ongoing);
    assert_eq!(snap.damage_percent, 0.0);
    assert_eq!(snap.cannon_hits_taken, 0);
}

#[test]
fn test_repair_ignored_at_full_health() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
    let snap = controller.tick();
    assert!(!snap.repair_ongoing);
    assert!(snap.events.is_empty());
}

#[test]
fn test_enemy_fire_cancels_repair_without_healing() {
    let (mut controller, bench) = setup(BattleSettings::default());

    for _ in 0..2 {
        bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        controller.tick();
        run_ms(&mut controller, 1_200);
    }
    bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
    controller.tick();
    run_ms(&mut controller, 5_000);

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert!(snap.events.contains(&BattleEvent::RepairCancelled));
    assert!(!snap.repair_ongoing);
    assert_eq!(snap.cannon_hits_taken, 3);
    assert!((snap.damage_percent - 50.0).abs() < 0.01);

    // The original completion instant passes without a heal.
    let (snap, events) = run_ms_events(&mut controller, REPAIR_TIME_MS);
    assert!(!events.contains(&BattleEvent::RepairComplete));
    assert_eq!(snap.cannon_hits_taken, 3);
}

#[test]
fn test_stop_repair_command_aborts_without_healing() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let hit_snap = controller.tick();
    let damage = hit_snap.damage_percent;
    run_ms(&mut controller, 1_200);

    bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
    controller.tick();
    controller.queue_command(Command::StopRepair);
    let snap = controller.tick();
    assert!(snap.events.contains(&BattleEvent::RepairCancelled));
    assert!(!snap.repair_ongoing);
    assert_eq!(snap.damage_percent, damage);

    let (snap, events) = run_ms_events(&mut controller, REPAIR_TIME_MS + 100);
    assert!(!events.contains(&BattleEvent::RepairComplete));
    assert_eq!(snap.damage_percent, damage);
}

// ---- Destruction and recovery ----

#[test]
fn test_recovery_resets_health_then_restores_vulnerability() {
    let (mut controller, bench) = setup(BattleSettings::default());

    for _ in 0..6 {
        bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        controller.tick();
        run_ms(&mut controller, 1_200);
    }

    // Inoperative window, then health resets and recovery blanking starts.
    let (snap, events) = run_ms_events(&mut controller, DESTROYED_INOPERATIVE_TIME_MS + 100);
    assert!(events.contains(&BattleEvent::RecoveryStarted));
    assert!(!snap.destroyed);
    assert_eq!(snap.damage_percent, 0.0);
    assert_eq!(snap.cannon_hits_taken, 0);
    assert!(snap.invulnerable);

    // Medium recovery time, then the unit can be hit again.
    let (snap, events) = run_ms_events(&mut controller, MEDIUM_RECOVERY_MS + 100);
    assert!(events.contains(&BattleEvent::RecoveryComplete));
    assert!(!snap.invulnerable);

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
}

// ---- Firing ----

#[test]
fn test_fire_sends_ir_recoil_flash_and_reloads() {
    let (mut controller, bench) = setup(BattleSettings::default());

    controller.queue_command(Command::Fire);
    let snap = controller.tick();
    assert!(snap.events.contains(&BattleEvent::CannonFired));
    assert_eq!(bench.transmitter.sent(), vec![(Protocol::Tamiya, None)]);
    assert_eq!(bench.recoil.kick_count(), 1);
    assert!(bench.muzzle_flash.is_firing());
    assert!(!snap.cannon_reloaded);

    let snap = run_ms(&mut controller, MUZZLE_FLASH_MS + 10);
    assert!(!bench.muzzle_flash.is_firing());
    assert!(!snap.cannon_reloaded);

    let (snap, events) = run_ms_events(&mut controller, MEDIUM_RELOAD_MS);
    assert!(events.contains(&BattleEvent::ReloadComplete));
    assert!(snap.cannon_reloaded);
}

#[test]
fn test_fire_ignored_until_reloaded() {
    let (mut controller, bench) = setup(BattleSettings::default());

    controller.queue_command(Command::Fire);
    controller.tick();
    controller.queue_command(Command::Fire);
    let snap = controller.tick();
    assert_eq!(bench.transmitter.send_count(), 1);
    assert!(!snap.events.contains(&BattleEvent::CannonFired));
}

#[test]
fn test_fov_fire_carries_team_value() {
    let settings = BattleSettings {
        fire_protocol: Some(Protocol::Fov),
        alt_hit_protocol: None,
        team: Team::Fov2,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    controller.queue_command(Command::Fire);
    controller.tick();
    assert_eq!(
        bench.transmitter.sent(),
        vec![(Protocol::Fov, Some(FOV_TEAM_2_VALUE))]
    );
}

#[test]
fn test_transmit_blanking_holds_until_send_completes() {
    let (mut controller, bench) = setup(BattleSettings::default());
    bench.transmitter.set_send_latency(3);

    controller.queue_command(Command::Fire);
    let snap = controller.tick();
    assert!(snap.invulnerable);

    // A signal arriving while blanked never registers.
    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));

    // Completion is re-polled every few milliseconds.
    let snap = run_ms(&mut controller, 25);
    assert!(!snap.invulnerable);
    assert_eq!(snap.cannon_hits_taken, 0);
}

// ---- Repair units ----

#[test]
fn test_repair_unit_trigger_sends_repair_signal() {
    let settings = BattleSettings {
        role: UnitRole::Repair,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    controller.queue_command(Command::Fire);
    let snap = controller.tick();
    assert!(snap.events.contains(&BattleEvent::RepairSignalSent));
    assert_eq!(bench.transmitter.sent(), vec![(Protocol::RprClark, None)]);
    assert_eq!(bench.recoil.kick_count(), 0);
    assert!(snap.repair_ongoing);

    // Engaged for the full repair; the trigger does nothing meanwhile.
    controller.queue_command(Command::Fire);
    run_ms(&mut controller, 5_000);
    assert_eq!(bench.transmitter.send_count(), 1);

    let (snap, events) = run_ms_events(&mut controller, REPAIR_TIME_MS);
    assert!(events.contains(&BattleEvent::RepairComplete));
    assert!(!snap.repair_ongoing);
    // The outgoing side does not heal itself.
    assert_eq!(snap.damage_percent, 0.0);
}

#[test]
fn test_repair_on_hit_answers_with_repair_signal() {
    let settings = BattleSettings {
        role: UnitRole::Repair,
        repair_on_hit: true,
        ..BattleSettings::default()
    };
    let (mut controller, bench) = setup(settings);

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.cannon_hits_taken, 1);
    assert!(snap.events.contains(&BattleEvent::RepairSignalSent));
    assert_eq!(bench.transmitter.sent(), vec![(Protocol::RprClark, None)]);
    assert!(snap.repair_ongoing);
    // The hit filter still applies.
    assert!(snap.invulnerable);
    let snap = run_ms(&mut controller, 500);
    assert!(snap.invulnerable);
}

// ---- Light effects ----

#[test]
fn test_cannon_hit_lights_lamp_then_fades_out() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    let snap = controller.tick();
    assert_eq!(snap.lamp_level, 255);

    let snap = run_ms(&mut controller, 8_000);
    assert_eq!(snap.lamp_level, 0);
    // The lamp actually flickered on the way down.
    assert!(bench.lamp.history().len() > 10);
}

#[test]
fn test_destroyed_lamp_blinks_slowly() {
    let (mut controller, bench) = setup(custom_mg_settings());

    for _ in 0..4 {
        bench.receiver.inject(SignalCapture::new(Protocol::MgClark));
        controller.tick();
    }
    assert_eq!(bench.lamp.level(), 255);
    let snap = run_ms(&mut controller, DESTROYED_BLINK_MS + 20);
    assert_eq!(snap.lamp_level, 0);
    let snap = run_ms(&mut controller, DESTROYED_BLINK_MS);
    assert_eq!(snap.lamp_level, 255);
}

#[test]
fn test_repair_lamp_blinks_then_silences_on_completion() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    controller.tick();
    run_ms(&mut controller, 8_000);

    bench.receiver.inject(SignalCapture::new(Protocol::RprClark));
    let snap = controller.tick();
    assert_eq!(snap.lamp_level, 255);

    let snap = run_ms(&mut controller, REPAIR_TIME_MS + 100);
    assert_eq!(snap.lamp_level, 0);
}

#[test]
fn test_reload_notify_blink() {
    let settings = BattleSettings {
        reload_notify: true,
        ..BattleSettings::default()
    };
    let (mut controller, _bench) = setup(settings);

    controller.queue_command(Command::Fire);
    controller.tick();
    let (snap, events) = run_ms_events(&mut controller, MEDIUM_RELOAD_MS + 100);
    assert!(events.contains(&BattleEvent::ReloadComplete));
    assert_eq!(snap.lamp_level, 255);

    let snap = run_ms(&mut controller, RELOAD_NOTIFY_BLINK_MS + 20);
    assert_eq!(snap.lamp_level, 0);
}

// ---- Setup ----

#[test]
fn test_recoil_endpoints_forwarded_at_setup() {
    let settings = BattleSettings::default();
    let mut recoil = settings.recoil;
    recoil.endpoint_min = 1_100;
    recoil.endpoint_max = 1_900;
    let settings = BattleSettings { recoil, ..settings };
    let (_controller, bench) = setup(settings);
    assert_eq!(bench.recoil.endpoints(), Some((1_100, 1_900)));
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let (bench_a, devices_a) = MockBench::new();
    let (bench_b, devices_b) = MockBench::new();
    let config = ControllerConfig {
        settings: BattleSettings::default(),
        seed: 12345,
    };
    let mut controller_a = BattleController::new(config.clone(), devices_a);
    let mut controller_b = BattleController::new(config, devices_b);

    for i in 0..2_000u32 {
        if i == 10 || i == 400 {
            bench_a.receiver.inject(SignalCapture::new(Protocol::Tamiya));
            bench_b.receiver.inject(SignalCapture::new(Protocol::Tamiya));
        }
        if i == 700 {
            controller_a.queue_command(Command::Fire);
            controller_b.queue_command(Command::Fire);
        }
        let json_a = serde_json::to_string(&controller_a.tick()).unwrap();
        let json_b = serde_json::to_string(&controller_b.tick()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds_diverge() {
    let (bench_a, devices_a) = MockBench::new();
    let (bench_b, devices_b) = MockBench::new();
    let mut controller_a = BattleController::new(
        ControllerConfig {
            settings: BattleSettings::default(),
            seed: 111,
        },
        devices_a,
    );
    let mut controller_b = BattleController::new(
        ControllerConfig {
            settings: BattleSettings::default(),
            seed: 222,
        },
        devices_b,
    );

    // The flicker ramps are the only randomized behavior; a hit makes the
    // lamp trajectories diverge.
    bench_a.receiver.inject(SignalCapture::new(Protocol::Tamiya));
    bench_b.receiver.inject(SignalCapture::new(Protocol::Tamiya));

    let mut diverged = false;
    for _ in 0..600 {
        let snap_a = controller_a.tick();
        let snap_b = controller_b.tick();
        if snap_a.lamp_level != snap_b.lamp_level {
            diverged = true;
            break;
        }
    }
    assert!(diverged, "Different seeds should produce divergent flicker");
}

// ---- Event payloads ----

#[test]
fn test_hit_event_carries_kind_and_protocol() {
    let (mut controller, bench) = setup(BattleSettings::default());

    bench.receiver.inject(SignalCapture::new(Protocol::HengLong));
    let snap = controller.tick();
    assert!(snap.events.iter().any(|event| matches!(
        event,
        BattleEvent::HitTaken {
            kind: HitKind::Cannon,
            protocol: Protocol::HengLong,
            team: Team::None,
        }
    )));
}
