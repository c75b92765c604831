//! Mock devices for tests and the headless demo.
//!
//! Each mock is a cheap clonable handle over shared interior state
//! (`Rc<RefCell<..>>`, fine under the single-threaded model), so a test can
//! keep a handle while the controller owns the boxed trait object.

use std::cell::RefCell;
use std::rc::Rc;

use irbattle_core::enums::Protocol;
use irbattle_core::types::SignalCapture;

use crate::devices::{Devices, HitLamp, IrReceiver, IrTransmitter, MuzzleFlashOutput, RecoilActuator};

// ---- Receiver ----

#[derive(Default)]
struct ReceiverState {
    /// At most one decoded capture is buffered, like the real decoder;
    /// capturing halts until the buffer is cleared by a resume.
    pending: Option<SignalCapture>,
    armed: bool,
    capture_enabled: bool,
    resumes: u32,
    dropped: u32,
}

/// Mock IR receiver fed by test-injected captures. A capture injected while
/// the decoder is halted or disabled models a signal passing an inactive
/// receiver: it is lost, not queued.
#[derive(Clone, Default)]
pub struct MockReceiver {
    state: Rc<RefCell<ReceiverState>>,
}

impl MockReceiver {
    pub fn new() -> MockReceiver {
        let mock = MockReceiver::default();
        {
            let mut state = mock.state.borrow_mut();
            state.armed = true;
            state.capture_enabled = true;
        }
        mock
    }

    /// A signal arrives right now: captured if the decoder is armed,
    /// otherwise lost.
    pub fn inject(&self, capture: SignalCapture) {
        let mut state = self.state.borrow_mut();
        if state.armed && state.capture_enabled && state.pending.is_none() {
            state.pending = Some(capture);
            state.armed = false;
        } else {
            state.dropped += 1;
        }
    }

    pub fn resume_count(&self) -> u32 {
        self.state.borrow().resumes
    }

    /// Count of injected signals that found the receiver halted.
    pub fn dropped_count(&self) -> u32 {
        self.state.borrow().dropped
    }
}

impl IrReceiver for MockReceiver {
    fn poll_decoded(&mut self) -> Option<SignalCapture> {
        self.state.borrow_mut().pending.take()
    }

    fn resume(&mut self) {
        let mut state = self.state.borrow_mut();
        state.pending = None;
        state.armed = true;
        state.resumes += 1;
    }

    fn set_capture_enabled(&mut self, enabled: bool) {
        let mut state = self.state.borrow_mut();
        state.capture_enabled = enabled;
        if !enabled {
            state.pending = None;
        }
    }
}

// ---- Transmitter ----

#[derive(Default)]
struct TransmitterState {
    sent: Vec<(Protocol, Option<u16>)>,
    /// Polls of `is_send_complete` remaining before the transmission
    /// reports done; models the in-flight pulse train.
    busy_polls: u32,
    latency_polls: u32,
}

/// Mock IR transmitter recording every transmission.
#[derive(Clone, Default)]
pub struct MockTransmitter {
    state: Rc<RefCell<TransmitterState>>,
}

impl MockTransmitter {
    pub fn new() -> MockTransmitter {
        MockTransmitter::default()
    }

    /// Make every send stay in flight for this many completion polls.
    pub fn set_send_latency(&self, polls: u32) {
        self.state.borrow_mut().latency_polls = polls;
    }

    pub fn sent(&self) -> Vec<(Protocol, Option<u16>)> {
        self.state.borrow().sent.clone()
    }

    pub fn send_count(&self) -> usize {
        self.state.borrow().sent.len()
    }
}

impl IrTransmitter for MockTransmitter {
    fn send(&mut self, protocol: Protocol, value: Option<u16>) {
        let mut state = self.state.borrow_mut();
        state.busy_polls = state.latency_polls;
        state.sent.push((protocol, value));
    }

    fn is_send_complete(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.busy_polls > 0 {
            state.busy_polls -= 1;
            false
        } else {
            true
        }
    }
}

// ---- Recoil ----

#[derive(Default)]
struct RecoilState {
    kicks: u32,
    endpoints: Option<(u16, u16)>,
}

/// Mock recoil actuator counting kicks.
#[derive(Clone, Default)]
pub struct MockRecoil {
    state: Rc<RefCell<RecoilState>>,
}

impl MockRecoil {
    pub fn new() -> MockRecoil {
        MockRecoil::default()
    }

    pub fn kick_count(&self) -> u32 {
        self.state.borrow().kicks
    }

    pub fn endpoints(&self) -> Option<(u16, u16)> {
        self.state.borrow().endpoints
    }
}

impl RecoilActuator for MockRecoil {
    fn trigger_recoil(&mut self) {
        self.state.borrow_mut().kicks += 1;
    }

    fn set_endpoints(&mut self, min_us: u16, max_us: u16) {
        self.state.borrow_mut().endpoints = Some((min_us, max_us));
    }
}

// ---- Lamp ----

#[derive(Default)]
struct LampState {
    level: u8,
    history: Vec<u8>,
}

/// Mock notification lamp recording every level change.
#[derive(Clone, Default)]
pub struct MockLamp {
    state: Rc<RefCell<LampState>>,
}

impl MockLamp {
    pub fn new() -> MockLamp {
        MockLamp::default()
    }

    pub fn level(&self) -> u8 {
        self.state.borrow().level
    }

    pub fn history(&self) -> Vec<u8> {
        self.state.borrow().history.clone()
    }
}

impl HitLamp for MockLamp {
    fn set_level(&mut self, level: u8) {
        let mut state = self.state.borrow_mut();
        state.level = level;
        state.history.push(level);
    }
}

// ---- Muzzle flash ----

#[derive(Default)]
struct FlashState {
    firing: bool,
    pulses: u32,
}

/// Mock muzzle-flash output counting trigger pulses.
#[derive(Clone, Default)]
pub struct MockMuzzleFlash {
    state: Rc<RefCell<FlashState>>,
}

impl MockMuzzleFlash {
    pub fn new() -> MockMuzzleFlash {
        MockMuzzleFlash::default()
    }

    pub fn is_firing(&self) -> bool {
        self.state.borrow().firing
    }

    pub fn pulse_count(&self) -> u32 {
        self.state.borrow().pulses
    }
}

impl MuzzleFlashOutput for MockMuzzleFlash {
    fn set_firing(&mut self, firing: bool) {
        let mut state = self.state.borrow_mut();
        if firing && !state.firing {
            state.pulses += 1;
        }
        state.firing = firing;
    }
}

// ---- Bench harness ----

/// Handles to every mock device, kept by the test while the controller
/// owns the boxed counterparts.
pub struct MockBench {
    pub receiver: MockReceiver,
    pub transmitter: MockTransmitter,
    pub recoil: MockRecoil,
    pub lamp: MockLamp,
    pub muzzle_flash: MockMuzzleFlash,
}

impl MockBench {
    pub fn new() -> (MockBench, Devices) {
        let bench = MockBench {
            receiver: MockReceiver::new(),
            transmitter: MockTransmitter::new(),
            recoil: MockRecoil::new(),
            lamp: MockLamp::new(),
            muzzle_flash: MockMuzzleFlash::new(),
        };
        let devices = Devices {
            receiver: Box::new(bench.receiver.clone()),
            transmitter: Box::new(bench.transmitter.clone()),
            recoil: Box::new(bench.recoil.clone()),
            lamp: Box::new(bench.lamp.clone()),
            muzzle_flash: Box::new(bench.muzzle_flash.clone()),
        };
        (bench, devices)
    }
}
