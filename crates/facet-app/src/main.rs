// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::Result;
use clap::Parser;
use facet_core::init_tracing;
use facet_render_vk::{FrameOutcome, RenderConfig, VkRenderer};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use facet_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::{Window, WindowId},
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file; missing file means defaults
    #[arg(long, default_value = "facet.toml")]
    config: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
struct RenderCfg {
    #[serde(default = "default_clear")]
    clear_color: [f32; 4],
    #[serde(default = "default_validation")]
    validation: bool,
    #[serde(default = "default_vertex_shader")]
    vertex_shader: PathBuf,
    #[serde(default = "default_fragment_shader")]
    fragment_shader: PathBuf,
}

#[derive(Debug, Deserialize, Default)]
struct AppCfg {
    #[serde(default)]
    render: RenderCfg,
}

impl Default for RenderCfg {
    fn default() -> Self {
        RenderCfg {
            clear_color: default_clear(),
            validation: default_validation(),
            vertex_shader: default_vertex_shader(),
            fragment_shader: default_fragment_shader(),
        }
    }
}

fn default_clear() -> [f32; 4] {
    [0.15, 0.15, 0.2, 1.0]
}
fn default_validation() -> bool {
    true
}
fn default_vertex_shader() -> PathBuf {
    PathBuf::from("shaders/v.spv")
}
fn default_fragment_shader() -> PathBuf {
    PathBuf::from("shaders/f.spv")
}

fn load_cfg(path: &Path) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str::<AppCfg>(&s).unwrap_or_default(),
        Err(_) => AppCfg::default(),
    }
}

impl RenderCfg {
    fn to_render_config(&self) -> RenderConfig {
        RenderConfig {
            clear_color: self.clear_color,
            validation: self.validation,
            vertex_shader: self.vertex_shader.clone(),
            fragment_shader: self.fragment_shader.clone(),
        }
    }
}

struct App {
    cfg: AppCfg,
    window: Option<Window>,
    renderer: Option<VkRenderer>,

    exiting: bool,
    fatal: Option<anyhow::Error>,
    out_of_date_logged: bool,
    frames: u32,
    last_fps_instant: std::time::Instant,
}

impl App {
    fn new(cfg: AppCfg) -> Self {
        App {
            cfg,
            window: None,
            renderer: None,
            exiting: false,
            fatal: None,
            out_of_date_logged: false,
            frames: 0,
            last_fps_instant: std::time::Instant::now(),
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.fatal = Some(err);
        self.exiting = true;
        self.renderer = None;
        self.window = None;
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop
                .create_window(facet_platform::main_window_attributes("facet"))
            {
                Ok(w) => w,
                Err(e) => return self.fail(event_loop, e.into()),
            };

            let wh = window.window_handle().expect("window_handle");
            let dh = window.display_handle().expect("display_handle");

            match VkRenderer::new(
                dh.as_raw(),
                wh.as_raw(),
                &self.cfg.render.to_render_config(),
            ) {
                Ok(renderer) => {
                    let (w, h) = renderer.extent();
                    info!("renderer ready ({w}x{h}, {} images)", renderer.image_count());
                    self.renderer = Some(renderer);
                }
                Err(e) => return self.fail(event_loop, e.into()),
            }

            self.window = Some(window);
        }

        // The frame loop is fence-paced, not event-paced.
        event_loop.set_control_flow(ControlFlow::Poll);
        if let Some(w) = &self.window {
            w.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                info!("CloseRequested");
                self.exiting = true;
                // Renderer drop waits for the GPU to go idle before tearing
                // anything down.
                self.renderer = None;
                self.window = None;
                event_loop.exit();
            }

            WindowEvent::RedrawRequested => {
                if self.exiting {
                    return;
                }
                if let Some(renderer) = &mut self.renderer {
                    match renderer.draw_frame() {
                        Ok(FrameOutcome::Presented) => {
                            self.frames = self.frames.saturating_add(1);
                        }
                        Ok(FrameOutcome::SurfaceOutOfDate) => {
                            // Known limitation: the swapchain is never
                            // recreated, so frames stop reaching the display
                            // until the surface matches again.
                            if !self.out_of_date_logged {
                                warn!("presentation surface out of date; continuing without recreating the swapchain");
                                self.out_of_date_logged = true;
                            }
                        }
                        Err(e) => self.fail(event_loop, e.into()),
                    }
                }
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if self.exiting {
            return;
        }
        if let Some(w) = &self.window {
            w.request_redraw();
        }

        let now = std::time::Instant::now();
        if now.duration_since(self.last_fps_instant).as_secs_f32() >= 1.0 {
            info!("fps ~ {}", self.frames);
            self.frames = 0;
            self.last_fps_instant = now;
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let event_loop: EventLoop<()> = EventLoop::new()?;

    let mut app = App::new(load_cfg(&args.config));
    event_loop.run_app(&mut app)?;

    // Fatal init or steady-state errors surface as a non-zero exit code;
    // a plain window close exits 0.
    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_stock_setup() {
        let cfg = AppCfg::default();
        assert_eq!(cfg.render.clear_color, [0.15, 0.15, 0.2, 1.0]);
        assert!(cfg.render.validation);
        assert_eq!(cfg.render.vertex_shader, Path::new("shaders/v.spv"));
        assert_eq!(cfg.render.fragment_shader, Path::new("shaders/f.spv"));
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let cfg: AppCfg = toml::from_str(
            r#"
            [render]
            clear_color = [0.0, 0.0, 0.0, 1.0]
            validation = false
            "#,
        )
        .unwrap();
        assert_eq!(cfg.render.clear_color, [0.0, 0.0, 0.0, 1.0]);
        assert!(!cfg.render.validation);
        assert_eq!(cfg.render.vertex_shader, Path::new("shaders/v.spv"));
    }
}
