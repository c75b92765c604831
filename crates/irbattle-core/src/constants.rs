//! Controller constants and tuning parameters.
//!
//! The battle timings are the Tamiya battle-system values; the light-effect
//! numbers reproduce the stock "apple" notification behavior.

/// Control loop rate (Hz).
pub const TICK_RATE: u32 = 200;

/// Milliseconds per control-loop tick.
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

// --- Timer pool ---

/// Fixed timer pool capacity. Sized to the sum of worst-case concurrently
/// active timers (reload + muzzle flash + hit filter + transmit blanking +
/// repair + recovery + light-effect chains) with headroom.
pub const TIMER_SLOTS: usize = 20;

/// Retry interval while waiting for the transmitter to finish sending
/// before hit reception may be re-enabled.
pub const TX_POLL_MS: u64 = 5;

// --- Battle timings ---

/// Duration of a repair operation. The unit stays vulnerable throughout;
/// health is restored only on completion.
pub const REPAIR_TIME_MS: u64 = 15_000;

/// How long the unit stays inoperative after destruction before recovery
/// begins (Tamiya spec; not the class recovery/invulnerability time).
pub const DESTROYED_INOPERATIVE_TIME_MS: u64 = 15_000;

/// After taking a cannon hit, further hits are ignored for this window.
/// A single real-world shot repeats its signal for a full second, so this
/// must stay above 1000 ms.
pub const HIT_FILTER_MS: u64 = 1_100;

/// Trigger pulse width for the high-intensity muzzle flash output.
pub const MUZZLE_FLASH_MS: u64 = 50;

/// Damage inflicted by one 2-shot kill-code hit, in percent.
pub const TWO_SHOT_DAMAGE_PCT: f32 = 50.0;

// --- Weight class presets (Tamiya #53447 battle system insert) ---

pub const LIGHT_RELOAD_MS: u64 = 3_000;
pub const LIGHT_RECOVERY_MS: u64 = 15_000;
pub const LIGHT_MAX_HITS: u8 = 3;

pub const MEDIUM_RELOAD_MS: u64 = 5_000;
pub const MEDIUM_RECOVERY_MS: u64 = 12_000;
pub const MEDIUM_MAX_HITS: u8 = 6;

pub const HEAVY_RELOAD_MS: u64 = 9_000;
pub const HEAVY_RECOVERY_MS: u64 = 10_000;
pub const HEAVY_MAX_HITS: u8 = 9;

/// Tamiya classes ignore machine-gun fire; MG hit budgets only apply to
/// custom classes with MG damage enabled.
pub const DEFAULT_MAX_MG_HITS: u8 = 20;

// --- FOV team payload values ---

pub const FOV_TEAM_1_VALUE: u16 = 0;
pub const FOV_TEAM_2_VALUE: u16 = 1;
pub const FOV_TEAM_3_VALUE: u16 = 2;
pub const FOV_TEAM_4_VALUE: u16 = 3;

// --- Cannon-hit flicker effect ---

/// Maximum lamp brightness during the flicker effect.
pub const MAX_BRIGHT: i16 = 255;

/// Minimum lamp brightness during the flicker effect.
pub const MIN_BRIGHT: i16 = 10;

/// Upward ramps always target some value above this break.
pub const BRIGHT_FADE_BREAK: i16 = 150;

/// Downward ramps always target some value below this break.
pub const DIM_FADE_BREAK: i16 = 130;

/// Largest brightness change per fade step.
pub const MAX_FADE_STEP: i16 = 50;

/// Smallest brightness change per fade step.
pub const MIN_FADE_STEP: i16 = 10;

/// Interval between brightness updates.
pub const FADE_UPDATE_MS: u64 = 20;

/// Total length of the random flicker before easing to the final fade-out.
pub const FLICKER_EFFECT_MS: u64 = 3_000;

/// Step size of the slow ease-to-off at the end of the flicker effect.
pub const FINAL_FADE_STEP: i16 = 4;

// --- Machine-gun blink effect ---

/// Per-step durations of the MG blink sequence (on/off/on).
pub const MG_BLINK_STEPS_MS: [u64; 3] = [100, 60, 40];

// --- Destroyed effect ---

/// Slow on/off blink interval while destroyed.
pub const DESTROYED_BLINK_MS: u64 = 450;

/// Linear ramp-down step for the post-recovery fade-out (per FADE_UPDATE_MS).
pub const DESTROYED_FADE_STEP: i16 = 2;

// --- Repair effect ---

/// Repair blink starts at this interval and shortens every step.
pub const REPAIR_BLINK_START_MS: i32 = 500;

/// Initial amount subtracted from the interval each step.
pub const REPAIR_SUBTRACT_START: i32 = 43;

/// Three-tier step-down schedule for the subtract amount.
pub const REPAIR_KNEE_1: i32 = 36;
pub const REPAIR_KNEE_2: i32 = 18;
pub const REPAIR_KNEE_3: i32 = 1;
pub const REPAIR_STEP_1: i32 = 4;
pub const REPAIR_STEP_2: i32 = 2;
pub const REPAIR_STEP_3: i32 = 1;

/// Pause before the escalating blink sequence restarts while a repair is
/// still ongoing.
pub const REPAIR_RESTART_MS: u64 = 250;

// --- Reload notification ---

/// Length of the optional lamp blink when the cannon finishes reloading.
pub const RELOAD_NOTIFY_BLINK_MS: u64 = 250;
