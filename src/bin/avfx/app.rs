use glutin::config::{ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Instant;

use cgmath::Matrix4;

use thiserror::Error;

use winit::dpi::{PhysicalSize, Size};
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

use avfx::config::{Config, ConfigError};
use avfx::fit::{self, FitMode};
use avfx::image::Image;
use avfx::playback::Playback;
use avfx::quad::{QUAD, QUAD_ATTRIBUTES};
use avfx::sequence::{DecodeMsg, FrameSequence, SequenceError};
use avfx::shader_source::{ShaderSources, SourceError};

use gl_wrapper::error::{check_error, GlError};
use gl_wrapper::geometry::{GBError, Geometry, GeometryBuilder};
use gl_wrapper::program::{PBError, Program, ProgramBuilder};
use gl_wrapper::renderer::GlRenderer;
use gl_wrapper::texture::{Texture2D, TextureError, TextureFormats};

const PLACEHOLDER_SIZE: u32 = 64;

pub struct App {
    event_loop: EventLoop<()>,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    viewer: Viewer,
}

impl App {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(Size::Physical(PhysicalSize::new(
                config.window.width,
                config.window.height,
            )))
            .with_min_inner_size(Size::Physical(PhysicalSize::new(
                config.window.min_width,
                config.window.min_height,
            )))
            .with_title(config.window.title.as_str());
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        let (window, gl_config) = display_builder
            .build(&event_loop, template, |configs| {
                configs
                    .reduce(|a, b| if b.num_samples() > a.num_samples() { b } else { a })
                    .expect("display offered no GL config")
            })
            .map_err(|e| AppError::Display(e.to_string()))?;

        let window = window.ok_or(AppError::NoWindow)?;
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_profile(GlProfile::Core)
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window.raw_window_handle()));

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        if let Some(one) = NonZeroU32::new(1) {
            if let Err(e) = gl_window
                .surface
                .set_swap_interval(&gl_context, SwapInterval::Wait(one))
            {
                log::warn!("could not enable vsync: {e}");
            }
        }

        gl::load_with(|s| match CString::new(s) {
            Ok(symbol) => gl_display.get_proc_address(symbol.as_c_str()).cast(),
            Err(_) => std::ptr::null(),
        });

        let size = gl_window.window.inner_size();
        let viewer = Viewer::new(&config, (size.width, size.height))?;

        check_error()?;

        log::info!("OpenGL context ready, window {}x{}", size.width, size.height);

        Ok(Self {
            event_loop,
            gl_context,
            gl_window,
            viewer,
        })
    }

    pub fn run(mut self) -> ! {
        self.event_loop
            .run(move |event, _window_target, control_flow| {
                *control_flow = ControlFlow::Wait;
                match event {
                    Event::MainEventsCleared => {
                        self.gl_window.window.request_redraw();
                    }
                    Event::WindowEvent { event, .. } => match event {
                        WindowEvent::Resized(size) => {
                            if let (Some(w), Some(h)) =
                                (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                            {
                                self.gl_window.surface.resize(&self.gl_context, w, h);
                                self.viewer.resize(size.width, size.height);
                            }
                        }
                        WindowEvent::KeyboardInput {
                            input:
                                KeyboardInput {
                                    state: ElementState::Pressed,
                                    virtual_keycode: Some(key),
                                    ..
                                },
                            ..
                        } => {
                            if key == VirtualKeyCode::Escape {
                                control_flow.set_exit();
                            } else {
                                self.viewer.handle_key(key);
                            }
                        }
                        WindowEvent::DroppedFile(path) => {
                            self.viewer.open(&path);
                        }
                        WindowEvent::CloseRequested => {
                            control_flow.set_exit();
                        }
                        _ => (),
                    },
                    Event::RedrawRequested(_) => {
                        if let Err(e) = self.viewer.tick() {
                            log::error!("could not upload frame: {e}");
                        }

                        self.viewer.draw();

                        if let Err(e) = self.gl_window.surface.swap_buffers(&self.gl_context) {
                            log::error!("could not swap buffers: {e}");
                        }

                        if cfg!(debug_assertions) {
                            if let Err(e) = check_error() {
                                log::error!("{e}");
                            }
                        }
                    }
                    _ => (),
                }
            })
    }
}

/// GL objects and playback state of the single textured quad.
struct Viewer {
    quad: Geometry,
    program: Program,
    transform_loc: Option<i32>,
    texture: Texture2D,
    renderer: GlRenderer,
    sequence: FrameSequence,
    playback: Playback,
    looping: bool,
    shown: Option<usize>,
    image_size: (u32, u32),
    fit: FitMode,
    transform: Matrix4<f32>,
    clear_color: [f32; 3],
    last_tick: Instant,
}

impl Viewer {
    fn new(config: &Config, window_size: (u32, u32)) -> Result<Self, AppError> {
        let quad = QUAD_ATTRIBUTES
            .iter()
            .fold(GeometryBuilder::new(&QUAD), |b, attr| b.with_attribute(*attr))
            .build()?;

        let sources =
            ShaderSources::load(&config.assets.vertex_shader, &config.assets.fragment_shader)?;
        sources.validate()?;

        let program = ProgramBuilder::new(&sources.vertex, &sources.fragment).build()?;
        program.set_i32(program.uniform_location("u_texture")?, 0);

        let transform_loc = match program.uniform_location("u_transform") {
            Ok(loc) => Some(loc),
            Err(e) => {
                log::warn!("{e}, fit mode has no effect");
                None
            }
        };

        let placeholder = Image::checkerboard(PLACEHOLDER_SIZE, PLACEHOLDER_SIZE, 8);
        let texture = Texture2D::new(
            placeholder.width(),
            placeholder.height(),
            placeholder.data(),
            TextureFormats::RgbaU8,
            config.render.filter.into(),
            config.render.wrap.into(),
        )?;

        let sequence = FrameSequence::open(&config.assets.texture, config.playback.fps)?;

        let mut renderer = GlRenderer::new();
        renderer.resize(window_size.0, window_size.1);

        let mut viewer = Self {
            quad,
            program,
            transform_loc,
            texture,
            renderer,
            sequence,
            playback: Playback::new(config.playback.fps, config.playback.looping),
            looping: config.playback.looping,
            shown: None,
            image_size: (placeholder.width(), placeholder.height()),
            fit: config.render.fit,
            transform: fit::identity(),
            clear_color: config.render.clear_color,
            last_tick: Instant::now(),
        };
        viewer.update_transform();

        Ok(viewer)
    }

    fn tick(&mut self) -> Result<(), TextureError> {
        for msg in self.sequence.poll() {
            match msg {
                DecodeMsg::Frame(i) => log::trace!("decoded frame {i}"),
                DecodeMsg::Done => log::info!(
                    "decoded {} frame(s) from {:?}",
                    self.sequence.frame_count(),
                    self.sequence.source()
                ),
                DecodeMsg::Failed(e) => log::error!("{e}"),
            }
        }

        let now = Instant::now();
        let dt = now - self.last_tick;
        self.last_tick = now;

        // done first: a finished decoder has published every frame
        let complete = self.sequence.is_done();
        let available = self.sequence.frame_count();
        self.playback.advance(dt, available, complete);

        self.show(self.playback.current_frame(available))
    }

    fn show(&mut self, index: Option<usize>) -> Result<(), TextureError> {
        if index == self.shown {
            return Ok(());
        }

        let Some(frame) = index.and_then(|i| self.sequence.frame(i)) else {
            return Ok(());
        };

        self.texture.update(frame.width(), frame.height(), frame.data())?;
        self.shown = index;

        let size = (frame.width(), frame.height());
        if size != self.image_size {
            self.image_size = size;
            self.update_transform();
        }

        Ok(())
    }

    fn draw(&mut self) {
        self.renderer.clear(self.clear_color);

        if let Some(loc) = self.transform_loc {
            self.program.set_mat4(loc, &self.transform);
        }

        self.renderer
            .draw_textured(&self.quad, &self.program, &self.texture);
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(width, height);
        self.update_transform();
    }

    fn update_transform(&mut self) {
        self.transform = self.fit.transform(self.renderer.viewport(), self.image_size);
    }

    fn handle_key(&mut self, key: VirtualKeyCode) {
        let available = self.sequence.frame_count();

        match key {
            VirtualKeyCode::Space => {
                self.playback.toggle_pause();
                let state = if self.playback.is_paused() { "paused" } else { "resumed" };
                log::info!("playback {state}");
            }
            VirtualKeyCode::Left => self.playback.step(-1, available),
            VirtualKeyCode::Right => self.playback.step(1, available),
            VirtualKeyCode::Home => {
                self.playback
                    .seek_fraction(0.0, self.sequence.total_frames(), available)
            }
            VirtualKeyCode::End => {
                self.playback
                    .seek_fraction(1.0, self.sequence.total_frames(), available)
            }
            VirtualKeyCode::F => {
                self.fit = self.fit.toggled();
                self.update_transform();
                log::info!("fit mode {:?}", self.fit);
            }
            _ => {}
        }
    }

    fn open(&mut self, path: &Path) {
        match FrameSequence::open(path, self.playback.fps()) {
            Ok(sequence) => {
                log::info!("opened {:?}", path);
                // the old decoder is cancelled and detached, not joined
                self.sequence = sequence;
                self.playback = Playback::new(self.playback.fps(), self.looping);
                self.shown = None;
            }
            Err(e) => log::error!("could not open {:?}: {e}", path),
        }
    }
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &glutin::config::Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();
        let attrs = SurfaceAttributesBuilder::<WindowSurface>::new().build(
            raw_window_handle,
            NonZeroU32::new(width).ok_or(AppError::ZeroSize)?,
            NonZeroU32::new(height).ok_or(AppError::ZeroSize)?,
        );

        let surface = unsafe { config.display().create_window_surface(config, &attrs)? };

        Ok(Self { window, surface })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not create display: {0}")]
    Display(String),
    #[error("display did not create a window")]
    NoWindow,
    #[error("window size must be non-zero")]
    ZeroSize,
    #[error("OpenGL context: {0}")]
    Context(#[from] glutin::error::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ShaderSource(#[from] SourceError),
    #[error(transparent)]
    Program(#[from] PBError),
    #[error(transparent)]
    Geometry(#[from] GBError),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Gl(#[from] GlError),
}
