use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::GpuInit;
use crate::math::Rect;
use crate::presenter::{Renderer, WgpuRenderer};
use crate::time::{FrameClock, FrameTime};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl RuntimeConfig {
    pub fn new(title: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            title: title.into(),
            initial_size: LogicalSize::new(width, height),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new("faro", 1280.0, 720.0)
    }
}

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Per-frame context passed to [`App::on_frame`].
///
/// The frame is already prepared when the callback runs and is presented
/// when it returns; the app only issues `render` calls (and any
/// out-of-frame work like resource creation or camera binding).
pub struct FrameCtx<'a, 'w> {
    pub renderer: &'a mut WgpuRenderer<'w>,
    pub time: FrameTime,
}

/// Application contract implemented by the host.
pub trait App {
    /// Called for window events the runtime does not consume.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called once per rendered frame, between `prepare` and `present`.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Runs `app` in a window until it exits or the window closes.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<()>
    where
        A: 'static + App,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,

    window: Window,

    #[borrows(window)]
    #[covariant]
    renderer: WgpuRenderer<'this>,
}

struct AppState<A>
where
    A: App + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    window_id: Option<WindowId>,
    exit_requested: bool,
}

impl<A> AppState<A>
where
    A: App + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            window_id: None,
            exit_requested: false,
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        self.window_id = Some(window.id());
        let gpu_init = self.gpu_init.clone();

        let entry = WindowEntryBuilder {
            clock: FrameClock::default(),
            window,
            renderer_builder: |w| {
                pollster::block_on(WgpuRenderer::new(w, gpu_init))
                    .expect("renderer initialization failed for window")
            },
        }
        .build();

        self.entry = Some(entry);
        Ok(())
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: App + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create initial window: {e:#}");
            self.request_exit(event_loop);
            return;
        }

        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw; the table animates every frame.
        if let Some(entry) = &self.entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested || self.window_id != Some(window_id) {
            return;
        }

        if self.app.on_window_event(&event) == AppControl::Exit {
            self.request_exit(event_loop);
            return;
        }

        if matches!(event, WindowEvent::CloseRequested) {
            self.entry = None;
            self.request_exit(event_loop);
            return;
        }

        // Split borrows so the app can be used inside `ouroboros` closures.
        let (app, entry) = (&mut self.app, &mut self.entry);
        let Some(entry) = entry.as_mut() else {
            return;
        };

        match &event {
            WindowEvent::Resized(new_size) => {
                let rect = Rect::from_size(new_size.width as f32, new_size.height as f32);
                entry.with_renderer_mut(|r| r.resize_buffers(rect));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                let new_size = entry.with_window(|w| w.inner_size());
                let rect = Rect::from_size(new_size.width as f32, new_size.height as f32);
                entry.with_renderer_mut(|r| r.resize_buffers(rect));
                entry.with_window(|w| w.request_redraw());
            }

            WindowEvent::RedrawRequested => {
                let mut control = AppControl::Continue;

                entry.with_mut(|fields| {
                    let time: FrameTime = fields.clock.tick();

                    Renderer::prepare(&mut *fields.renderer);

                    // Scope so the ctx reborrow ends before present().
                    {
                        let mut ctx = FrameCtx {
                            renderer: &mut *fields.renderer,
                            time,
                        };
                        control = app.on_frame(&mut ctx);
                    }

                    Renderer::present(&mut *fields.renderer);
                });

                if control == AppControl::Exit {
                    self.request_exit(event_loop);
                }
            }

            _ => {}
        }
    }
}
