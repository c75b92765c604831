//! Device collaborator contracts.
//!
//! The bit-level IR codec, the recoil actuator hardware, and the raw pin
//! I/O live outside this crate; the controller only sees these traits.
//! All of them are driven from the single control-loop thread — the
//! receiver's interrupt-time capture happens inside its implementation and
//! is surfaced here as a pull-based, fully decoded result.

use irbattle_core::enums::Protocol;
use irbattle_core::types::SignalCapture;

/// Infrared signal receiver. Capture runs asynchronously; the decoded
/// result is polled synchronously once per loop iteration. After a capture
/// is delivered the receiver halts until [`IrReceiver::resume`] clears the
/// decode buffer and re-arms it.
pub trait IrReceiver {
    /// The decoded capture, if one is pending.
    fn poll_decoded(&mut self) -> Option<SignalCapture>;
    /// Clear the decode buffer and re-arm capture.
    fn resume(&mut self);
    /// Master enable for signal capture.
    fn set_capture_enabled(&mut self, enabled: bool);
}

/// Infrared signal transmitter. `send` returns immediately; the actual
/// pulse train finishes asynchronously and completion is polled.
pub trait IrTransmitter {
    /// Transmit the given protocol, optionally overriding the payload value
    /// (used for team-tagged transmissions).
    fn send(&mut self, protocol: Protocol, value: Option<u16>);
    /// Whether the last transmission has finished.
    fn is_send_complete(&self) -> bool;
}

/// Recoil actuator. The kick is non-blocking; only the one-time homing ramp
/// at power-up (inside the implementation) may block.
pub trait RecoilActuator {
    /// Kick and return, at the configured recoil/return speeds.
    fn trigger_recoil(&mut self);
    /// Set the servo end-point limits in microseconds.
    fn set_endpoints(&mut self, min_us: u16, max_us: u16);
}

/// Hit-notification lamp ("apple" LEDs). Dimmable; 0 is off, 255 full on.
pub trait HitLamp {
    fn set_level(&mut self, level: u8);
}

/// Muzzle-flash trigger output. The hardware line is active-low; the
/// implementation owns the inversion, callers speak in terms of firing.
pub trait MuzzleFlashOutput {
    fn set_firing(&mut self, firing: bool);
}

/// The full set of device collaborators handed to the controller at setup.
pub struct Devices {
    pub receiver: Box<dyn IrReceiver>,
    pub transmitter: Box<dyn IrTransmitter>,
    pub recoil: Box<dyn RecoilActuator>,
    pub lamp: Box<dyn HitLamp>,
    pub muzzle_flash: Box<dyn MuzzleFlashOutput>,
}
