// Declare the window-side modules directly in the binary crate root
pub mod error;
pub mod input;
pub mod render;
pub mod state;
pub mod ui;

use crate::error::AppError;
use crate::state::State;
use sparse_life::{Engine, EngineConfig, SimulationHandle, View};

use winit::{
    dpi::PhysicalSize,
    event::{Event, MouseScrollDelta, WindowEvent},
    event_loop::{ControlFlow, EventLoop},
    window::Window,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

// Fallback when no monitor is reported
const DEFAULT_WINDOW_SIZE: (u32, u32) = (1280, 720);

// Longest the host loop sleeps, so redraws requested by the simulation thread
// are picked up promptly.
const MAX_HOST_WAIT: Duration = Duration::from_millis(4);

async fn run(
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    engine: Arc<Engine>,
    view: View,
    simulation: SimulationHandle,
) -> Result<(), AppError> {
    let mut state = State::new(window, engine, view).await?;
    let mut simulation = Some(simulation);

    event_loop.run(move |event, window_target| {
        match event {
            Event::WindowEvent { window_id, ref event }
                if window_id == state.window.id() =>
            {
                // Pass window-specific events to egui_winit FIRST
                let response = state.egui_winit_state.on_window_event(&state.window, event);

                if response.repaint {
                    state.window.request_redraw();
                }

                // Resizes, close requests and redraws are handled regardless of egui
                let consumed_by_egui = response.consumed
                    && !matches!(
                        event,
                        WindowEvent::Resized(_) | WindowEvent::CloseRequested | WindowEvent::RedrawRequested
                    );
                if consumed_by_egui {
                    return;
                }

                match event {
                    WindowEvent::CloseRequested => {
                        state.engine.request_shutdown();
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        state.resize(*new_size);
                    }
                    WindowEvent::MouseInput { state: element_state, button, .. } => {
                        input::handle_mouse_input(&mut state, *button, *element_state);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input::handle_cursor_move(&mut state, *position);
                    }
                    WindowEvent::CursorLeft { .. } => {
                        input::handle_cursor_left(&mut state);
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let scroll_amount = match delta {
                            MouseScrollDelta::LineDelta(_, y) => *y,
                            MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                        };
                        if scroll_amount != 0.0 {
                            input::handle_zoom(&mut state, scroll_amount);
                        }
                    }
                    WindowEvent::KeyboardInput { event: key_event, .. } => {
                        input::handle_key(&mut state, key_event);
                    }
                    WindowEvent::RedrawRequested => match state.render() {
                        Ok(()) => {}
                        Err(wgpu::SurfaceError::Lost) => {
                            log::warn!("Surface lost, recreating...");
                            state.resize(state.size);
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("Out of memory while acquiring a frame, exiting");
                            state.engine.request_shutdown();
                            window_target.exit();
                        }
                        Err(e) => {
                            log::warn!("Skipping frame due to surface {:?}", e);
                        }
                    },
                    _ => (),
                }
            }
            Event::AboutToWait => {
                // Gated by the frame rate, or immediately after a state change
                if state.engine.poll_frame() {
                    state.window.request_redraw();
                }
                let wait = state.engine.time_until_frame().min(MAX_HOST_WAIT);
                window_target.set_control_flow(ControlFlow::WaitUntil(Instant::now() + wait));
            }
            Event::LoopExiting => {
                if let Some(simulation) = simulation.take() {
                    log::info!("Waiting for the simulation thread to stop...");
                    simulation.shutdown();
                }
            }
            _ => (),
        }
    })?;

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = start() {
        log::error!("{}", err);
        std::process::exit(1);
    }
}

fn start() -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;

    // Size the window to 100/141 of the screen
    let (width, height) = event_loop
        .primary_monitor()
        .map(|monitor| {
            let screen = monitor.size();
            (screen.width * 100 / 141, screen.height * 100 / 141)
        })
        .unwrap_or(DEFAULT_WINDOW_SIZE);

    let window = Arc::new(winit::window::WindowBuilder::new()
        .with_title(state::TITLE)
        .with_inner_size(PhysicalSize::new(width, height))
        .build(&event_loop)?);

    // Restarts place the seed in the middle of the initial viewport
    let view = View::default();
    let size = window.inner_size();
    let engine = Arc::new(Engine::new(EngineConfig {
        seed_origin: view.screen_to_cell(size.width as f64 / 2.0, size.height as f64 / 2.0),
        ..EngineConfig::default()
    }));
    let simulation = Engine::spawn(Arc::clone(&engine))?;

    pollster::block_on(run(event_loop, window, engine, view, simulation))
}
