//! Light-effect sequencer for the hit-notification lamp.
//!
//! Each effect is a small state machine re-entered through timer actions
//! rather than run to completion: its callback reschedules itself, carrying
//! progress in an explicit per-effect state struct. The lamp has a single
//! writer at any time — starting a hit or destroyed effect pre-empts an
//! in-progress repair blink by cancelling its timer first.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

use irbattle_core::constants::*;
use irbattle_timer::{TimerId, TimerPool};

use crate::controller::TimerAction;
use crate::devices::HitLamp;

/// Cannon-hit flicker: random up/down brightness ramps within fixed
/// bright/dim bands, then a slow ease-to-off.
#[derive(Default)]
struct FlickerState {
    update_timer: Option<TimerId>,
    stop_timer: Option<TimerId>,
    level: i16,
    target: i16,
    step: i16,
    /// Set when the effect window elapses; the next upward ramp becomes the
    /// final slow fade instead.
    fade_out: bool,
    stop_next: bool,
}

/// Machine-gun blink: fixed three-step on/off sequence.
#[derive(Default)]
struct MgBlinkState {
    timer: Option<TimerId>,
    step: u8,
}

/// Destroyed effect: slow blink while destroyed, then a toggle to
/// synchronize fade start to a light-on instant, then a linear ramp-down.
struct DestroyedState {
    timer: Option<TimerId>,
    started: bool,
    fade_level: i16,
}

impl Default for DestroyedState {
    fn default() -> Self {
        DestroyedState {
            timer: None,
            started: false,
            fade_level: MAX_BRIGHT,
        }
    }
}

/// Repair blink: interval starts long and shortens geometrically toward a
/// minimum, restarting while the repair is ongoing.
#[derive(Default)]
struct RepairBlinkState {
    timer: Option<TimerId>,
    started: bool,
    interval: i32,
    subtract: i32,
}

/// All lamp effects plus the current output state.
#[derive(Default)]
pub(crate) struct LightShow {
    lamp_on: bool,
    level: u8,
    flicker: FlickerState,
    mg: MgBlinkState,
    destroyed_fx: DestroyedState,
    repair_fx: RepairBlinkState,
}

impl LightShow {
    /// Current lamp brightness, for the snapshot.
    pub(crate) fn level(&self) -> u8 {
        self.level
    }

    fn set_level(&mut self, lamp: &mut dyn HitLamp, level: u8) {
        lamp.set_level(level);
        self.level = level;
        self.lamp_on = level > 0;
    }

    fn toggle(&mut self, lamp: &mut dyn HitLamp) {
        if self.lamp_on {
            self.set_level(lamp, 0);
        } else {
            self.set_level(lamp, MAX_BRIGHT as u8);
        }
    }

    pub(crate) fn lamp_off(&mut self, lamp: &mut dyn HitLamp) {
        self.set_level(lamp, 0);
    }

    /// One-shot notification blink (reload complete).
    pub(crate) fn blink_notify(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
    ) {
        self.set_level(lamp, MAX_BRIGHT as u8);
        let _ = pool.after(now_ms, RELOAD_NOTIFY_BLINK_MS, TimerAction::ReloadNotifyOff);
    }

    // ---- Cannon-hit flicker ----

    /// Start (or extend) the flicker effect. Pre-empts a repair blink.
    pub(crate) fn start_cannon_flicker(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        rng: &mut ChaCha8Rng,
        now_ms: u64,
    ) {
        self.silence_repair(pool, lamp);

        // Effect already running: extend its window, let the ramps continue.
        if let Some(stop) = self.flicker.stop_timer {
            if pool.contains(stop) {
                pool.cancel(stop);
                self.flicker.stop_timer = pool
                    .after(now_ms, FLICKER_EFFECT_MS, TimerAction::FlickerStop)
                    .ok();
            }
        }

        let running = self
            .flicker
            .update_timer
            .map(|id| pool.contains(id))
            .unwrap_or(false);
        if !running {
            self.flicker.fade_out = false;
            self.flicker.stop_next = false;
            self.flicker.level = MAX_BRIGHT;
            self.set_level(lamp, MAX_BRIGHT as u8);
            self.flicker.target = rng.gen_range(MIN_BRIGHT..DIM_FADE_BREAK);
            self.flicker.step = -rng.gen_range(MIN_FADE_STEP..MAX_FADE_STEP);
            self.flicker.update_timer = pool
                .every(now_ms, FADE_UPDATE_MS, TimerAction::FlickerUpdate)
                .ok();
            self.flicker.stop_timer = pool
                .after(now_ms, FLICKER_EFFECT_MS, TimerAction::FlickerStop)
                .ok();
        }
    }

    /// One brightness step of the flicker ramp.
    pub(crate) fn flicker_update(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        rng: &mut ChaCha8Rng,
        now_ms: u64,
        destroyed: bool,
    ) {
        self.flicker.level += self.flicker.step;
        let clamped = self.flicker.level.clamp(0, MAX_BRIGHT) as u8;
        self.set_level(lamp, clamped);

        if self.flicker.step > 0 && self.flicker.level >= self.flicker.target {
            // Reached a bright target: ramp back down.
            if self.flicker.fade_out {
                // Final fade: slow ease all the way to off.
                self.flicker.target = 0;
                self.flicker.step = -FINAL_FADE_STEP;
                self.flicker.stop_next = true;
            } else {
                self.flicker.target = rng.gen_range(MIN_BRIGHT..DIM_FADE_BREAK);
                self.flicker.step = -rng.gen_range(MIN_FADE_STEP..MAX_FADE_STEP);
            }
        } else if self.flicker.step < 0 && self.flicker.level <= self.flicker.target {
            if self.flicker.stop_next {
                // End of the last fade.
                if let Some(id) = self.flicker.update_timer.take() {
                    pool.cancel(id);
                }
                self.set_level(lamp, 0);
                self.flicker.level = 0;
                self.flicker.stop_next = false;
                // A destroyed unit chains straight into the destroyed effect.
                if destroyed {
                    self.destroyed_step(pool, lamp, now_ms, true);
                }
            } else {
                // Reached a dim target: ramp back up.
                self.flicker.target = rng.gen_range(BRIGHT_FADE_BREAK..MAX_BRIGHT);
                self.flicker.step = rng.gen_range(MIN_FADE_STEP..MAX_FADE_STEP);
            }
        }
    }

    /// The flicker window elapsed; ease out on the next upward ramp.
    pub(crate) fn flicker_stop(&mut self, pool: &TimerPool<TimerAction>) {
        let running = self
            .flicker
            .update_timer
            .map(|id| pool.contains(id))
            .unwrap_or(false);
        if running {
            self.flicker.fade_out = true;
        }
        self.flicker.stop_timer = None;
    }

    // ---- Machine-gun blink ----

    /// Start the MG blink sequence from the top. Pre-empts a repair blink.
    pub(crate) fn start_mg_blink(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
    ) {
        self.silence_repair(pool, lamp);
        self.mg.step = 0;
        self.mg_blink_step(pool, lamp, now_ms);
    }

    /// One step of the MG blink sequence: even steps on, odd steps off.
    pub(crate) fn mg_blink_step(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
    ) {
        let step = self.mg.step as usize;
        if step < MG_BLINK_STEPS_MS.len() {
            if step % 2 == 1 {
                self.set_level(lamp, 0);
            } else {
                self.set_level(lamp, MAX_BRIGHT as u8);
            }
            self.mg.timer = pool
                .after(now_ms, MG_BLINK_STEPS_MS[step], TimerAction::MgBlinkStep)
                .ok();
            self.mg.step += 1;
        } else {
            self.set_level(lamp, 0);
            self.mg.step = 0;
            self.mg.timer = None;
        }
    }

    // ---- Destroyed effect ----

    /// Start the destroyed effect. Pre-empts a repair blink.
    pub(crate) fn start_destroyed(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
    ) {
        self.silence_repair(pool, lamp);
        self.destroyed_step(pool, lamp, now_ms, true);
    }

    /// One step of the four-phase destroyed machine, keyed on whether the
    /// effect has been started and whether the unit is still destroyed.
    pub(crate) fn destroyed_step(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
        destroyed: bool,
    ) {
        match (self.destroyed_fx.started, destroyed) {
            (false, true) => {
                // Phase 1: begin the slow blink.
                if let Some(id) = self.destroyed_fx.timer.take() {
                    pool.cancel(id);
                }
                self.set_level(lamp, MAX_BRIGHT as u8);
                self.destroyed_fx.timer = pool
                    .every(now_ms, DESTROYED_BLINK_MS, TimerAction::DestroyedBlinkStep)
                    .ok();
                self.destroyed_fx.started = true;
            }
            (true, true) => {
                // Phase 2: keep blinking.
                self.toggle(lamp);
            }
            (true, false) => {
                // Phase 3: recovery began. Fade-out must start from a
                // light-on instant, so toggle until the lamp is on, then
                // switch to the fast update cadence.
                if self.lamp_on {
                    if let Some(id) = self.destroyed_fx.timer.take() {
                        pool.cancel(id);
                    }
                    self.destroyed_fx.timer = pool
                        .every(now_ms, FADE_UPDATE_MS, TimerAction::DestroyedBlinkStep)
                        .ok();
                    self.destroyed_fx.started = false;
                } else {
                    self.toggle(lamp);
                }
            }
            (false, false) => {
                // Phase 4: linear ramp-down to off.
                self.destroyed_fx.fade_level -= DESTROYED_FADE_STEP;
                if self.destroyed_fx.fade_level > 0 {
                    self.set_level(lamp, self.destroyed_fx.fade_level as u8);
                } else {
                    if let Some(id) = self.destroyed_fx.timer.take() {
                        pool.cancel(id);
                    }
                    self.set_level(lamp, 0);
                    self.destroyed_fx.fade_level = MAX_BRIGHT;
                }
            }
        }
    }

    // ---- Repair blink ----

    /// Continue the escalating repair blink while a repair is ongoing, or
    /// silence it deterministically the instant the repair ends.
    pub(crate) fn repair_blink_handler(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
        repair_ongoing: bool,
    ) {
        if repair_ongoing {
            self.repair_step(pool, lamp, now_ms);
        } else {
            self.silence_repair(pool, lamp);
        }
    }

    /// One toggle of the repair blink; the interval shortens on the
    /// three-tier schedule, and the sequence re-arms itself from the
    /// handler once it bottoms out.
    pub(crate) fn repair_step(
        &mut self,
        pool: &mut TimerPool<TimerAction>,
        lamp: &mut dyn HitLamp,
        now_ms: u64,
    ) {
        if !self.repair_fx.started {
            self.repair_fx.interval = REPAIR_BLINK_START_MS;
            self.repair_fx.subtract = REPAIR_SUBTRACT_START;
            self.repair_fx.started = true;
        } else {
            let subtract = &mut self.repair_fx.subtract;
            if *subtract > REPAIR_KNEE_1 {
                *subtract -= REPAIR_STEP_1;
            } else if *subtract > REPAIR_KNEE_2 {
                *subtract -= REPAIR_STEP_2;
            } else if *subtract > REPAIR_KNEE_3 {
                *subtract -= REPAIR_STEP_3;
            }
            if *subtract < 0 {
                *subtract = 0;
            }
        }

        self.toggle(lamp);

        if self.repair_fx.interval <= 0 {
            self.repair_fx.started = false;
            self.set_level(lamp, 0);
            self.repair_fx.timer = pool
                .after(now_ms, REPAIR_RESTART_MS, TimerAction::RepairBlinkRestart)
                .ok();
        } else {
            self.repair_fx.timer = pool
                .after(
                    now_ms,
                    self.repair_fx.interval as u64,
                    TimerAction::RepairBlinkStep,
                )
                .ok();
        }

        self.repair_fx.interval -= self.repair_fx.subtract;
    }

    /// Cancel the repair blink timer, reset its progress, lamp off.
    fn silence_repair(&mut self, pool: &mut TimerPool<TimerAction>, lamp: &mut dyn HitLamp) {
        if let Some(id) = self.repair_fx.timer.take() {
            pool.cancel(id);
            self.repair_fx.started = false;
            self.set_level(lamp, 0);
        }
    }
}
