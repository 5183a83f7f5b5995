//! Overdeck overlay host entry point.
//!
//! Wires together preferences, the module deck, and an overlay session over
//! the scripted mock runtime, then pumps the input-synthesis engine at a
//! fixed tick rate.  Synthesized UI events are printed by the built-in demo
//! panel, so the full pipeline can be observed without a headset.
//!
//! # Usage
//!
//! ```text
//! overdeck-overlay [OPTIONS]
//!
//! Options:
//!   --replay <FILE>    JSON replay script (array of per-tick raw event arrays)
//!   --tick-hz <HZ>     Pump rate in frames per second [default: 90]
//!   --prefs <FILE>     Preferences file path override
//! ```
//!
//! # Environment variable overrides
//!
//! CLI args take precedence when both are present.
//!
//! | Variable           | Default            | Description                  |
//! |--------------------|--------------------|------------------------------|
//! | `OVERDECK_REPLAY`  | (built-in demo)    | Replay script path           |
//! | `OVERDECK_TICK_HZ` | `90`               | Pump rate in Hz              |
//! | `OVERDECK_PREFS`   | (platform default) | Preferences file path        |
//! | `RUST_LOG`         | prefs directive    | `tracing` filter directive   |
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_prefs()          -- defaults on first run, backup on corruption
//!  └─ scan_module_roots()   -- module deck discovery + validation
//!  └─ OverlaySession::start()
//!  └─ tick loop
//!       ├─ MockRuntime::next_tick()   (scripted raw events)
//!       ├─ OverlaySession::tick()     (gate + pump → DemoPanel)
//!       ├─ RepeatScheduler::due()     (repeat-mode module launches)
//!       └─ PrefsStore::maintain()     (debounced autosave)
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use overdeck_core::event::raw::{
    ButtonPressEvent, ButtonUnpressEvent, FocusLeaveEvent, MouseDownEvent, MouseMoveEvent,
    MouseUpEvent, ScrollEvent,
};
use overdeck_core::{
    CursorSlot, DeviceButton, DeviceIndex, ElementId, PanelPoint, PanelSurface, RawOverlayEvent,
    UiEvent, UiPanel, YOrigin,
};

use overdeck_overlay::application::modules::{
    scan_module_roots, ExecMode, LoadedModule, ModuleRegistry, RepeatScheduler,
};
use overdeck_overlay::application::session::{OverlayAnchor, OverlaySession, SessionConfig};
use overdeck_overlay::infrastructure::launch::{ModuleLauncher, ProcessLauncher};
use overdeck_overlay::infrastructure::storage::default_module_roots;
use overdeck_overlay::infrastructure::storage::prefs::{
    load_prefs, prefs_file_path, Prefs, PrefsStore,
};
use overdeck_overlay::infrastructure::vr::mock::MockRuntime;

/// Tracked devices the demo/replay runtime reports for the two controllers.
const LEFT_DEVICE: DeviceIndex = DeviceIndex(1);
const RIGHT_DEVICE: DeviceIndex = DeviceIndex(2);

/// Cursor slots the script uses per hand.
const RIGHT_SLOT: u32 = 0;
const LEFT_SLOT: u32 = 1;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Overdeck VR overlay host.
///
/// Drives the input-synthesis engine over a scripted runtime: either the
/// built-in demonstration script or a JSON replay file.
#[derive(Debug, Parser)]
#[command(
    name = "overdeck-overlay",
    about = "VR overlay input host for the overdeck panel",
    version
)]
struct Cli {
    /// JSON replay script: an array of ticks, each an array of raw events.
    ///
    /// Events use the serde representation of the engine's raw event model,
    /// e.g. `{"MouseMove": {"cursor": 0, "device": 2, "x": 60.0, "y": 24.0}}`.
    #[arg(long, env = "OVERDECK_REPLAY")]
    replay: Option<PathBuf>,

    /// Pump rate in frames per second.
    #[arg(long, default_value_t = 90, env = "OVERDECK_TICK_HZ")]
    tick_hz: u32,

    /// Preferences file path override.
    #[arg(long, env = "OVERDECK_PREFS")]
    prefs: Option<PathBuf>,
}

// ── Demo panel ────────────────────────────────────────────────────────────────

struct Region {
    element: ElementId,
    min: (f32, f32),
    max: (f32, f32),
}

/// A fixed four-element panel that logs every synthesized event.
///
/// Layout (640×400, top-left origin): two buttons along the top, a content
/// panel below, and a slider sitting on top of the content panel.
struct DemoPanel {
    /// Hit regions, topmost first.
    regions: Vec<Region>,
}

const ROOT: ElementId = ElementId(1);
const SETTINGS_BUTTON: ElementId = ElementId(10);
const MODULES_BUTTON: ElementId = ElementId(11);
const CONTENT_PANEL: ElementId = ElementId(20);
const SLIDER: ElementId = ElementId(21);

impl DemoPanel {
    fn new() -> Self {
        DemoPanel {
            regions: vec![
                Region {
                    element: SLIDER,
                    min: (24.0, 64.0),
                    max: (360.0, 96.0),
                },
                Region {
                    element: SETTINGS_BUTTON,
                    min: (8.0, 8.0),
                    max: (120.0, 40.0),
                },
                Region {
                    element: MODULES_BUTTON,
                    min: (128.0, 8.0),
                    max: (240.0, 40.0),
                },
                Region {
                    element: CONTENT_PANEL,
                    min: (8.0, 48.0),
                    max: (632.0, 392.0),
                },
            ],
        }
    }

    fn surface() -> PanelSurface {
        PanelSurface::new(640.0, 400.0, YOrigin::TopLeft)
    }
}

impl UiPanel for DemoPanel {
    fn root(&self) -> ElementId {
        ROOT
    }

    fn pick_all(&self, point: PanelPoint, chain: &mut Vec<ElementId>) -> Option<ElementId> {
        chain.clear();
        for region in &self.regions {
            if point.x >= region.min.0
                && point.x < region.max.0
                && point.y >= region.min.1
                && point.y < region.max.1
            {
                chain.push(region.element);
            }
        }
        chain.first().copied()
    }

    fn send(&self, element: ElementId, event: &UiEvent) {
        info!(element = element.0, event = ?event, "ui event");
    }
}

// ── Demo script ───────────────────────────────────────────────────────────────

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

fn scroll(slot: u32, delta_x: f32, delta_y: f32) -> RawOverlayEvent {
    RawOverlayEvent::Scroll(ScrollEvent {
        cursor: CursorSlot(slot),
        delta_x,
        delta_y,
    })
}

fn press(device: DeviceIndex, button: u32) -> RawOverlayEvent {
    RawOverlayEvent::ButtonPress(ButtonPressEvent { device, button })
}

fn unpress(device: DeviceIndex, button: u32) -> RawOverlayEvent {
    RawOverlayEvent::ButtonUnpress(ButtonUnpressEvent { device, button })
}

fn focus_leave(slot: u32) -> RawOverlayEvent {
    RawOverlayEvent::FocusLeave(FocusLeaveEvent {
        cursor: CursorSlot(slot),
    })
}

fn quiet(ticks: &mut Vec<Vec<RawOverlayEvent>>, count: usize) {
    ticks.extend(std::iter::repeat_with(Vec::new).take(count));
}

/// The built-in demonstration: hover, click, drag, a second hand, scroll,
/// controller keys, and focus loss.  Quiet stretches let the click window
/// elapse so bursts flush mid-script.
fn demo_script() -> Vec<Vec<RawOverlayEvent>> {
    let mut ticks: Vec<Vec<RawOverlayEvent>> = Vec::new();

    // Hover onto the settings button and click it.
    ticks.push(vec![mv(RIGHT_SLOT, RIGHT_DEVICE, 60.0, 24.0)]);
    ticks.push(Vec::new());
    ticks.push(vec![down(RIGHT_SLOT, 60.0, 24.0)]);
    ticks.push(Vec::new());
    ticks.push(vec![up(RIGHT_SLOT, 60.0, 24.0)]);
    quiet(&mut ticks, 50);

    // Grab the slider and drag it a few frames.
    ticks.push(vec![mv(RIGHT_SLOT, RIGHT_DEVICE, 180.0, 80.0)]);
    ticks.push(vec![down(RIGHT_SLOT, 180.0, 80.0)]);
    ticks.push(vec![mv(RIGHT_SLOT, RIGHT_DEVICE, 205.0, 80.0)]);
    ticks.push(vec![mv(RIGHT_SLOT, RIGHT_DEVICE, 230.0, 82.0)]);
    ticks.push(vec![mv(RIGHT_SLOT, RIGHT_DEVICE, 255.0, 84.0)]);
    ticks.push(vec![up(RIGHT_SLOT, 255.0, 84.0)]);
    quiet(&mut ticks, 50);

    // The other hand joins: hover the content panel and wheel-scroll it.
    ticks.push(vec![mv(LEFT_SLOT, LEFT_DEVICE, 320.0, 220.0)]);
    ticks.push(vec![scroll(LEFT_SLOT, 0.0, -1.0)]);
    ticks.push(Vec::new());

    // A controller chord on the dominant hand.
    ticks.push(vec![press(RIGHT_DEVICE, 1)]);
    ticks.push(vec![unpress(RIGHT_DEVICE, 1)]);

    // Both pointers wander off; the panel loses focus.
    ticks.push(vec![focus_leave(RIGHT_SLOT)]);
    ticks.push(vec![focus_leave(LEFT_SLOT)]);
    quiet(&mut ticks, 10);

    ticks
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn session_config(prefs: &Prefs, surface: PanelSurface) -> SessionConfig {
    SessionConfig {
        anchor: prefs.overlay.anchor,
        size_m: prefs.overlay.size_m,
        multi_click_window: Duration::from_secs_f32(
            prefs.overlay.multi_click_window_secs.max(0.0),
        ),
        surface,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let prefs_path = match &cli.prefs {
        Some(path) => path.clone(),
        None => prefs_file_path().context("resolving preferences path")?,
    };
    let loaded = load_prefs(&prefs_path);

    // Initialise structured logging.  `RUST_LOG` wins; the prefs directive is
    // the fallback.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&loaded.prefs.logging.directive)),
        )
        .init();

    info!("overdeck overlay starting");
    if let Some(recovery) = &loaded.recovered {
        warn!(
            reason = %recovery.reason,
            backup = ?recovery.backup,
            "preferences file was unreadable; defaults restored"
        );
    }

    let mut store = PrefsStore::new(prefs_path, loaded.prefs);

    // ── Module deck ───────────────────────────────────────────────────────────
    let mut roots = default_module_roots();
    roots.extend(store.prefs().modules.extra_roots.iter().cloned());
    let outcomes = scan_module_roots(&roots, store.prefs().modules.scan_concurrency).await;

    let scan_done = Instant::now();
    let mut registry = ModuleRegistry::new();
    let mut scheduler = RepeatScheduler::new();
    for outcome in &outcomes {
        if outcome.valid {
            let module = LoadedModule::from_outcome(outcome);
            if module.manifest.command.exec_mode == ExecMode::Repeat {
                scheduler.schedule(
                    module.id,
                    Duration::from_secs(module.manifest.command.repeat_interval_secs),
                    scan_done,
                );
            }
            registry.insert(module);
        } else {
            warn!(
                folder = %outcome.folder.display(),
                problems = %outcome.messages.join("; "),
                "module rejected"
            );
        }
    }
    info!(
        scanned = outcomes.len(),
        loaded = registry.len(),
        "module scan complete"
    );
    let launcher = ProcessLauncher;

    // ── Runtime and session ───────────────────────────────────────────────────
    let mut runtime = MockRuntime::new();
    runtime.set_device(OverlayAnchor::LeftHand, LEFT_DEVICE);
    runtime.set_device(OverlayAnchor::RightHand, RIGHT_DEVICE);
    runtime.set_dominant(RIGHT_DEVICE);
    // Keep the hover gate open while scripted events play.
    runtime.set_intersection(RIGHT_DEVICE, Some((0.0, 0.0)));

    let script = match &cli.replay {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading replay script {}", path.display()))?;
            let script: Vec<Vec<RawOverlayEvent>> =
                serde_json::from_str(&text).context("parsing replay script")?;
            info!(path = %path.display(), ticks = script.len(), "replay script loaded");
            script
        }
        None => demo_script(),
    };
    let script_ticks = script.len();
    for batch in script {
        runtime.push_tick(batch);
    }

    let panel = DemoPanel::new();
    let mut session = OverlaySession::new(runtime, session_config(store.prefs(), DemoPanel::surface()));
    session.start()?;

    if cli.tick_hz == 0 {
        anyhow::bail!("--tick-hz must be positive");
    }
    let tick = Duration::from_secs_f64(1.0 / f64::from(cli.tick_hz));
    let mut timer = tokio::time::interval(tick);
    info!(ticks = script_ticks, tick_hz = cli.tick_hz, "pumping script");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break;
            }
            _ = timer.tick() => {
                if !session.runtime_mut().next_tick() {
                    break;
                }
                let now = Instant::now();
                session.tick(now, &panel);

                for id in scheduler.due(now) {
                    if let Some(module) = registry.get(id) {
                        match launcher.launch(module).await {
                            Ok(run) => info!(
                                module = %module.name,
                                class = %run.class,
                                exit_code = ?run.exit_code,
                                "repeat module finished"
                            ),
                            Err(e) => warn!(
                                module = %module.name,
                                error = %e,
                                "repeat module launch failed"
                            ),
                        }
                    }
                }

                store.maintain(now);
            }
        }
    }

    // One second of empty ticks lets trailing click deadlines flush.
    for _ in 0..cli.tick_hz {
        timer.tick().await;
        session.tick(Instant::now(), &panel);
    }

    session.shutdown();
    store.flush();
    info!("overdeck overlay stopped");
    Ok(())
}
