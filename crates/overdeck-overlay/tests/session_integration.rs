//! Integration tests for the overlay session lifecycle.
//!
//! These drive `OverlaySession` over the scripted `MockRuntime` and observe
//! both sides of the seam: the overlay control calls the session issues and
//! the UI events the pump delivers to a recording panel double.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use overdeck_core::event::raw::{MouseDownEvent, MouseMoveEvent, MouseUpEvent};
use overdeck_core::{
    CursorSlot, DeviceButton, DeviceIndex, ElementId, PanelPoint, PanelSurface, RawOverlayEvent,
    UiEvent, UiPanel, YOrigin,
};

use overdeck_overlay::application::session::{
    OverlayAnchor, OverlaySession, RuntimeError, SessionConfig,
};
use overdeck_overlay::infrastructure::vr::mock::{MockRuntime, RuntimeCall};

const LEFT_DEV: DeviceIndex = DeviceIndex(1);
const RIGHT_DEV: DeviceIndex = DeviceIndex(2);

const ROOT: ElementId = ElementId(1);
const BUTTON_A: ElementId = ElementId(10);
const BUTTON_B: ElementId = ElementId(20);

// ── Doubles ───────────────────────────────────────────────────────────────────

struct Region {
    element: ElementId,
    min: (f32, f32),
    max: (f32, f32),
}

impl Region {
    fn contains(&self, point: PanelPoint) -> bool {
        point.x >= self.min.0 && point.x < self.max.0 && point.y >= self.min.1 && point.y < self.max.1
    }
}

/// Two buttons side by side on a 200×100 surface.
struct RecordingPanel {
    regions: Vec<Region>,
    sent: Mutex<Vec<(ElementId, UiEvent)>>,
}

impl RecordingPanel {
    fn new() -> Self {
        RecordingPanel {
            regions: vec![
                Region { element: BUTTON_A, min: (0.0, 0.0), max: (50.0, 50.0) },
                Region { element: BUTTON_B, min: (50.0, 0.0), max: (100.0, 50.0) },
            ],
            sent: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<(ElementId, UiEvent)> {
        std::mem::take(&mut self.sent.lock().unwrap())
    }
}

impl UiPanel for RecordingPanel {
    fn root(&self) -> ElementId {
        ROOT
    }

    fn pick_all(&self, point: PanelPoint, chain: &mut Vec<ElementId>) -> Option<ElementId> {
        chain.clear();
        for region in &self.regions {
            if region.contains(point) {
                chain.push(region.element);
            }
        }
        chain.first().copied()
    }

    fn send(&self, element: ElementId, event: &UiEvent) {
        self.sent.lock().unwrap().push((element, *event));
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

struct Rig {
    session: OverlaySession<MockRuntime>,
    panel: RecordingPanel,
    t0: Instant,
}

fn make_rig_with(config: SessionConfig) -> Rig {
    let mut runtime = MockRuntime::new();
    runtime.set_device(OverlayAnchor::LeftHand, LEFT_DEV);
    runtime.set_device(OverlayAnchor::RightHand, RIGHT_DEV);
    runtime.set_dominant(RIGHT_DEV);
    Rig {
        session: OverlaySession::new(runtime, config),
        panel: RecordingPanel::new(),
        t0: Instant::now(),
    }
}

fn make_rig() -> Rig {
    make_rig_with(SessionConfig {
        surface: PanelSurface::new(200.0, 100.0, YOrigin::TopLeft),
        ..SessionConfig::default()
    })
}

impl Rig {
    /// Starts the session and discards the startup call sequence.
    fn start(&mut self) {
        self.session.start().unwrap();
        self.session.runtime_mut().take_calls();
    }

    /// Queues `events` as one scripted batch, runs one session tick at
    /// `t0 + at_secs`, and returns everything the panel received.
    fn tick(&mut self, at_secs: f32, events: &[RawOverlayEvent]) -> Vec<(ElementId, UiEvent)> {
        self.session.runtime_mut().push_tick(events.to_vec());
        self.session.runtime_mut().next_tick();
        self.session
            .tick(self.t0 + Duration::from_secs_f32(at_secs), &self.panel);
        self.panel.take()
    }

    fn calls(&mut self) -> Vec<RuntimeCall> {
        self.session.runtime_mut().take_calls()
    }

    fn aim(&mut self, device: DeviceIndex, hit: Option<(f32, f32)>) {
        self.session.runtime_mut().set_intersection(device, hit);
    }
}

fn mv(slot: u32, device: DeviceIndex, x: f32, y: f32) -> RawOverlayEvent {
    RawOverlayEvent::MouseMove(MouseMoveEvent {
        cursor: CursorSlot(slot),
        device,
        x,
        y,
    })
}

fn down(slot: u32, x: f32, y: f32) -> RawOverlayEvent {
    RawOverlayEvent::MouseDown(MouseDownEvent {
        cursor: CursorSlot(slot),
        button: DeviceButton::Trigger,
        x,
        y,
    })
}

fn up(slot: u32, x: f32, y: f32) -> RawOverlayEvent {
    RawOverlayEvent::MouseUp(MouseUpEvent {
        cursor: CursorSlot(slot),
        button: DeviceButton::Trigger,
        x,
        y,
    })
}

fn kind(event: &UiEvent) -> &'static str {
    match event {
        UiEvent::PointerDown(_) => "down",
        UiEvent::PointerMove(_) => "move",
        UiEvent::PointerUp(_) => "up",
        UiEvent::PointerEnter(_) => "enter",
        UiEvent::PointerLeave(_) => "leave",
        UiEvent::Click { .. } => "click",
        UiEvent::Wheel(_) => "wheel",
        UiEvent::KeyDown(_) => "key_down",
        UiEvent::KeyUp(_) => "key_up",
        UiEvent::FocusOut => "focus_out",
    }
}

fn kinds(events: &[(ElementId, UiEvent)]) -> Vec<&'static str> {
    events.iter().map(|(_, event)| kind(event)).collect()
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn test_start_configures_overlay_in_order() {
    let mut rig = make_rig();

    rig.session.start().unwrap();

    assert_eq!(
        rig.calls(),
        vec![
            RuntimeCall::Create {
                key: "overdeck.panel".to_string(),
                name: "Overdeck".to_string(),
            },
            RuntimeCall::FlipVertical,
            RuntimeCall::SetMouseScale(200.0, 100.0),
            RuntimeCall::SetWidthM(0.17),
            RuntimeCall::Show,
            RuntimeCall::SetSmoothScroll(true),
            RuntimeCall::SetMultiCursor(true),
        ]
    );
}

#[test]
fn test_start_fails_when_runtime_unavailable() {
    let mut rig = make_rig();
    rig.session.runtime_mut().set_available(false);

    let result = rig.session.start();

    assert!(matches!(result, Err(RuntimeError::Unavailable)));
    assert!(rig.calls().is_empty(), "no overlay calls without a runtime");
}

#[test]
fn test_tick_before_start_is_inert() {
    let mut rig = make_rig();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));

    let events = rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0)]);

    assert!(events.is_empty());
    assert!(rig.calls().is_empty());
}

#[test]
fn test_shutdown_destroys_overlay_once() {
    let mut rig = make_rig();
    rig.start();

    rig.session.shutdown();
    assert_eq!(rig.calls(), vec![RuntimeCall::Destroy]);

    rig.session.shutdown();
    assert!(rig.calls().is_empty(), "second shutdown must be a no-op");
}

// ── Hover gate ────────────────────────────────────────────────────────────────

#[test]
fn test_hover_gate_opens_immediately_and_closes_after_delay() {
    let mut rig = make_rig();
    rig.start();

    // A controller ray lands on the overlay: input switches on this tick.
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));
    rig.tick(0.0, &[]);
    assert_eq!(
        rig.calls(),
        vec![
            RuntimeCall::SetMouseInput(true),
            RuntimeCall::SetInteractiveIfVisible(true),
        ]
    );
    assert!(rig.session.is_interactive());

    // The ray leaves: the gate holds for the off-delay.
    rig.aim(RIGHT_DEV, None);
    rig.tick(0.1, &[]);
    rig.tick(0.6, &[]);
    assert!(rig.calls().is_empty(), "gate must hold during the delay");
    assert!(rig.session.is_interactive());

    // Past the delay the gate closes.
    rig.tick(1.2, &[]);
    assert_eq!(
        rig.calls(),
        vec![
            RuntimeCall::SetMouseInput(false),
            RuntimeCall::SetInteractiveIfVisible(false),
        ]
    );
    assert!(!rig.session.is_interactive());
}

#[test]
fn test_hover_return_cancels_pending_gate_off() {
    let mut rig = make_rig();
    rig.start();

    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));
    rig.tick(0.0, &[]);
    rig.calls();

    rig.aim(RIGHT_DEV, None);
    rig.tick(0.1, &[]);
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));
    rig.tick(0.5, &[]);

    // Well past the original off deadline: the gate must still be open.
    rig.tick(1.5, &[]);
    assert!(rig.calls().is_empty(), "cancelled off must not fire");
    assert!(rig.session.is_interactive());
}

// ── Pump wiring ───────────────────────────────────────────────────────────────

#[test]
fn test_pointer_events_flow_to_panel() {
    let mut rig = make_rig();
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));

    let pressed = rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0), down(0, 10.0, 10.0)]);
    assert_eq!(kinds(&pressed), vec!["down", "move", "enter"]);
    assert_eq!(pressed[0].0, BUTTON_A);

    rig.tick(0.05, &[up(0, 10.0, 10.0)]);

    let burst = rig.tick(0.7, &[]);
    assert_eq!(kinds(&burst), vec!["click"]);
    match burst[0] {
        (element, UiEvent::Click { count, .. }) => {
            assert_eq!(element, BUTTON_A);
            assert_eq!(count, 1);
        }
        ref other => panic!("expected a click, got {other:?}"),
    }
}

#[test]
fn test_pending_click_flushes_while_gate_is_off() {
    let mut rig = make_rig_with(SessionConfig {
        surface: PanelSurface::new(200.0, 100.0, YOrigin::TopLeft),
        multi_click_window: Duration::from_secs(2),
        ..SessionConfig::default()
    });
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));

    rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0), down(0, 10.0, 10.0)]);
    rig.tick(0.05, &[up(0, 10.0, 10.0)]);

    // The ray leaves and the gate closes before the click window elapses.
    rig.aim(RIGHT_DEV, None);
    rig.tick(0.1, &[]);
    rig.tick(1.2, &[]);
    assert!(!rig.session.is_interactive());

    // The pump keeps running while the gate is off, so the pending click
    // still flushes when its window elapses.
    let burst = rig.tick(2.2, &[]);
    assert_eq!(kinds(&burst), vec!["click"]);
}

// ── Discontinuities ───────────────────────────────────────────────────────────

#[test]
fn test_anchor_change_resets_hover() {
    let mut rig = make_rig();
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));

    let entered = rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0)]);
    assert_eq!(kinds(&entered), vec!["move", "enter"]);

    rig.session.set_anchor(OverlayAnchor::LeftHand);

    // The panel now rides the left hand; stale hover is cleared first.
    let events = rig.tick(0.1, &[]);
    assert_eq!(kinds(&events), vec!["leave"]);
    assert_eq!(events[0].0, BUTTON_A);

    // The pointer re-enters normally afterwards.
    let back = rig.tick(0.2, &[mv(0, RIGHT_DEV, 12.0, 10.0)]);
    assert_eq!(kinds(&back), vec!["move", "enter"]);
}

#[test]
fn test_hiding_the_overlay_resets_hover() {
    let mut rig = make_rig();
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));
    rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0)]);
    rig.calls();

    rig.session.set_visible(false).unwrap();
    assert_eq!(rig.calls(), vec![RuntimeCall::Hide]);

    let events = rig.tick(0.1, &[]);
    assert_eq!(kinds(&events), vec!["leave"]);
}

#[test]
fn test_unavailable_runtime_suspends_pumping() {
    let mut rig = make_rig();
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));
    rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0)]);

    // The runtime drops out: queued events must not reach the panel.
    rig.session.runtime_mut().set_available(false);
    let during = rig.tick(0.1, &[mv(0, RIGHT_DEV, 60.0, 10.0)]);
    assert!(during.is_empty());

    // On recovery the stale hover is cleared, then the queued move lands.
    rig.session.runtime_mut().set_available(true);
    let after = rig.tick(0.2, &[]);
    assert_eq!(kinds(&after), vec!["leave", "move", "enter"]);
    assert_eq!(after[0].0, BUTTON_A);
    assert_eq!(after[2].0, BUTTON_B);
}

// ── Live preferences ──────────────────────────────────────────────────────────

#[test]
fn test_apply_prefs_updates_click_window_live() {
    let mut rig = make_rig();
    rig.start();
    rig.aim(RIGHT_DEV, Some((10.0, 10.0)));

    // With the default 0.5 s window, clicks 0.65 s apart stay separate.
    rig.tick(0.0, &[mv(0, RIGHT_DEV, 10.0, 10.0), down(0, 10.0, 10.0)]);
    rig.tick(0.05, &[up(0, 10.0, 10.0)]);
    let separated = rig.tick(0.7, &[down(0, 10.0, 10.0)]);
    assert_eq!(kinds(&separated), vec!["click", "down"]);
    rig.tick(0.75, &[up(0, 10.0, 10.0)]);
    let second = rig.tick(1.4, &[]);
    assert!(matches!(second[0].1, UiEvent::Click { count: 1, .. }));

    // Widen the window to 1 s: the same rhythm now merges.
    rig.session.apply_prefs(&SessionConfig {
        surface: PanelSurface::new(200.0, 100.0, YOrigin::TopLeft),
        multi_click_window: Duration::from_secs(1),
        ..SessionConfig::default()
    });

    rig.tick(2.0, &[down(0, 10.0, 10.0)]);
    rig.tick(2.05, &[up(0, 10.0, 10.0)]);
    rig.tick(2.7, &[down(0, 10.0, 10.0)]);
    rig.tick(2.75, &[up(0, 10.0, 10.0)]);
    let merged = rig.tick(4.0, &[]);
    assert_eq!(kinds(&merged), vec!["click"]);
    assert!(matches!(merged[0].1, UiEvent::Click { count: 2, .. }));
}

#[test]
fn test_apply_prefs_resizes_overlay() {
    let mut rig = make_rig();
    rig.start();

    rig.session.apply_prefs(&SessionConfig {
        surface: PanelSurface::new(200.0, 100.0, YOrigin::TopLeft),
        size_m: 0.4,
        ..SessionConfig::default()
    });
    assert_eq!(rig.calls(), vec![RuntimeCall::SetWidthM(0.4)]);

    // Out-of-range widths clamp instead of reaching the runtime raw.
    rig.session.apply_prefs(&SessionConfig {
        surface: PanelSurface::new(200.0, 100.0, YOrigin::TopLeft),
        size_m: 7.5,
        ..SessionConfig::default()
    });
    assert_eq!(rig.calls(), vec![RuntimeCall::SetWidthM(1.0)]);
}
