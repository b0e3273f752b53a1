//! The viewer application: binds a [`SceneSession`] to a winit window.
//!
//! The window side owns exactly three input surfaces (resize, keyboard,
//! mouse) plus the redraw callback, and projects the session's pointer-lock
//! affordance onto cursor grab state and the window title. Scheduling is the
//! continuous-re-arm model: every `about_to_wait` requests the next redraw,
//! and closing the window stops re-arming rather than halting mid-tick.

use std::sync::Arc;

use log::warn;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, MouseButton, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{CursorGrabMode, Window, WindowAttributes},
};

use crate::session::{SceneSession, SessionConfig};

const TITLE_UNLOCKED: &str = "orrery - click to fly, Esc to release";
const TITLE_LOCKED: &str = "orrery";

pub struct OrreryApp {
    event_loop: Option<EventLoop<()>>,
    state: ViewerState,
}

struct ViewerState {
    window: Option<Arc<Window>>,
    session: Option<SceneSession>,
}

impl OrreryApp {
    /// Starts the scene session (including its initial load) and prepares
    /// the event loop. The window itself is created on `resumed`.
    pub fn new(config: SessionConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new()?;
        let session = SceneSession::start(config)?;

        Ok(Self {
            event_loop: Some(event_loop),
            state: ViewerState {
                window: None,
                session: Some(session),
            },
        })
    }

    /// Run the application (consumes self and starts the event loop)
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .expect("Event loop already consumed");
        event_loop.set_control_flow(ControlFlow::Poll);
        event_loop.run_app(&mut self.state)?;
        Ok(())
    }
}

impl ViewerState {
    /// Projects the affordance state onto the window: locked mode grabs and
    /// hides the cursor, unlocked shows the "click to fly" hint again.
    fn apply_lock_state(window: &Window, locked: bool) {
        if locked {
            let grab = window
                .set_cursor_grab(CursorGrabMode::Locked)
                .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
            if let Err(err) = grab {
                warn!("cursor grab unavailable: {err}");
            }
            window.set_cursor_visible(false);
            window.set_title(TITLE_LOCKED);
        } else {
            let _ = window.set_cursor_grab(CursorGrabMode::None);
            window.set_cursor_visible(true);
            window.set_title(TITLE_UNLOCKED);
        }
    }
}

impl ApplicationHandler for ViewerState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Ok(window) = event_loop.create_window(
            WindowAttributes::default()
                .with_title(TITLE_UNLOCKED)
                .with_inner_size(winit::dpi::LogicalSize::new(1200, 800)),
        ) {
            let window_handle = Arc::new(window);
            self.window = Some(window_handle.clone());

            let (width, height) = window_handle.inner_size().into();
            if let Some(session) = self.session.as_mut() {
                // Surface binding completes before the first redraw request.
                session.bind_surface(window_handle, width, height);
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match event {
            WindowEvent::KeyboardInput {
                event:
                    winit::event::KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => match key_code {
                KeyCode::Escape => {
                    if session.release_lock() {
                        if let Some(window) = self.window.as_deref() {
                            Self::apply_lock_state(window, session.is_locked());
                        }
                    }
                }
                KeyCode::KeyP => session.save_state(),
                KeyCode::KeyX => session.clear_saved(),
                key => {
                    session.handle_key(key);
                }
            },
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if session.request_lock() {
                    if let Some(window) = self.window.as_deref() {
                        Self::apply_lock_state(window, session.is_locked());
                    }
                }
            }
            WindowEvent::Focused(false) => {
                // Focus loss is an unlock signal.
                if session.release_lock() {
                    if let Some(window) = self.window.as_deref() {
                        Self::apply_lock_state(window, session.is_locked());
                    }
                }
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                session.on_resize(width, height);
            }
            WindowEvent::CloseRequested => {
                if let Some(session) = self.session.take() {
                    session.stop();
                }
                event_loop.exit();
            }
            WindowEvent::RedrawRequested => {
                session.tick();
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        // Continuous re-arm: the render loop lives exactly as long as this
        // keeps requesting redraws.
        if self.session.is_some() {
            if let Some(ref window) = self.window {
                window.request_redraw();
            }
        }
    }
}
