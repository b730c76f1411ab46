//! Windowed host for the Courtside render surface.
//!
//! This binary is the "thin adapter" side of the embedding contract: the
//! winit window is the drawable, and its lifecycle callbacks forward to
//! plain controller methods — attach starts rendering, resize routes
//! through, close forces a synchronous stop before the window is dropped.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use courtside_bracket::{Bracket, BracketScene, Side, Team};
use courtside_engine::device::DrawableHandle;
use courtside_engine::logging::{LoggingConfig, init_logging};
use courtside_engine::surface::{SurfaceController, SurfaceEvent, SurfaceObserver, WgpuDriver};

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = ViewerApp::new();

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    Ok(())
}

/// Sample field with a couple of decided first-round games.
fn sample_bracket() -> Bracket {
    let teams = vec![
        Team::new("Ridgeline", 1),
        Team::new("Harbor City", 8),
        Team::new("Northgate", 4),
        Team::new("Summit", 5),
        Team::new("Lakeview", 3),
        Team::new("Ironwood", 6),
        Team::new("Westbrook", 2),
        Team::new("Dune Valley", 7),
    ];
    let mut bracket = Bracket::single_elimination(teams).expect("field of 8 is a valid bracket");
    bracket.record_winner(0, 0, Side::Home);
    bracket.record_winner(0, 1, Side::Away);
    bracket
}

struct EventLogger;

impl SurfaceObserver for EventLogger {
    fn on_event(&self, event: &SurfaceEvent) {
        match event {
            SurfaceEvent::StartFailed(err) => log::error!("surface failed to start: {err}"),
            SurfaceEvent::DeviceLost => log::error!("surface lost its GPU device"),
            other => log::info!("surface event: {other:?}"),
        }
    }
}

struct ViewerApp {
    window: Option<Arc<Window>>,
    controller: Option<SurfaceController>,
    scene: Arc<Mutex<BracketScene>>,
}

impl ViewerApp {
    fn new() -> Self {
        Self {
            window: None,
            controller: None,
            scene: Arc::new(Mutex::new(BracketScene::new(&sample_bracket()))),
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title("Courtside")
            .with_inner_size(LogicalSize::new(1280.0, 720.0));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let size = window.inner_size();
        self.scene
            .lock()
            .unwrap()
            .set_aspect(size.width, size.height);

        let driver = WgpuDriver::new(DrawableHandle::new(&window));
        let mut controller =
            SurfaceController::new(driver, self.scene.clone(), (size.width, size.height));
        controller.set_observer(Arc::new(EventLogger));
        controller.start_rendering();

        self.window = Some(window);
        self.controller = Some(controller);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                // Stop synchronously before the window (the drawable) drops.
                if let Some(controller) = self.controller.as_mut() {
                    controller.host_view_destroyed();
                }
                self.controller = None;
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                self.scene
                    .lock()
                    .unwrap()
                    .set_aspect(size.width, size.height);
                if let Some(controller) = self.controller.as_mut() {
                    controller.resize(size.width, size.height);
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        // The render thread paces itself; the event loop only services
        // window events.
        event_loop.set_control_flow(ControlFlow::Wait);
    }
}
