use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use glam::Vec2;
use log::{error, info};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode as WinitKey, PhysicalKey};
use winit::platform::run_on_demand::EventLoopExtRunOnDemand;
use winit::window::WindowBuilder;

use scene_gallery::playback::{parse_drag, parse_key};
use scene_gallery::{
    print_summary, run_headless, Action, DemoKind, Gallery, GalleryConfig, InputEvent, InputState,
    KeyCode, MouseButton, NamedKey, Playback, Renderer, ScatterMode, Summary, Viewport,
};

/// Pixels scrolled per wheel notch.
const LINE_HEIGHT: f32 = 100.0;
/// Longest frame the simulation is allowed to see.
const MAX_FRAME_DT: f32 = 0.1;

const USAGE: &str = "Usage: scene-gallery [--demo <name>] [--model <path>] [--seed <u64>] \
[--reroll-scatter] [--headless] [--frames <n>] [--hold <key>]... [--press <key>]... \
[--scroll <fraction>] [--drag <x0,y0:x1,y1>] [--light-x <value>] [--json] [--list]";

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if options.help {
        println!("{USAGE}");
        return Ok(());
    }
    if options.list {
        for kind in DemoKind::ALL {
            println!("{} {:<10} {}", kind.digit(), kind.name(), kind.description());
        }
        return Ok(());
    }

    let config = options.gallery_config();
    if options.headless {
        return run_batch(&options, config);
    }
    match run_interactive(&options, config.clone()) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --headless mode (set DISPLAY or install a GPU driver to enable rendering)."
                );
                run_batch(&options, config)
            } else {
                Err(err)
            }
        }
    }
}

fn run_batch(options: &CliOptions, config: GalleryConfig) -> Result<()> {
    let mut gallery = Gallery::new(options.demo, config);
    let summary = run_headless(&mut gallery, &options.playback, options.frames);
    report(&summary, options.json)
}

fn report(summary: &Summary, json: bool) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(summary).context("failed to encode summary")?;
        println!("{text}");
    } else {
        print_summary(summary);
    }
    Ok(())
}

fn run_interactive(options: &CliOptions, mut config: GalleryConfig) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let mut event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Scene Gallery")
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window)))
        .map_err(|err| WindowInitError::from_error("GPU renderer", format!("{err:#}")))?;
    let size = renderer.size();
    config.viewport = Viewport::new(size.width, size.height);

    let mut app = AppState {
        renderer,
        gallery: Gallery::new(options.demo, config),
        input: InputState::new(),
        last_frame: Instant::now(),
        title: String::new(),
        last_error: None,
    };
    for event in options.playback.events(app.gallery.config().viewport) {
        app.dispatch(event);
    }

    event_loop
        .run_on_demand(|event, elwt| {
            elwt.set_control_flow(ControlFlow::Poll);
            if let Err(err) = app.process_event(&event, elwt) {
                app.last_error = Some(err);
                elwt.exit();
            }
        })
        .context("event loop failed")?;

    if let Some(err) = app.last_error {
        return Err(err);
    }
    report(&Summary::capture(&app.gallery, 0), options.json)
}

struct AppState {
    renderer: Renderer,
    gallery: Gallery,
    input: InputState,
    last_frame: Instant,
    title: String,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

impl AppState {
    fn process_event(&mut self, event: &Event<()>, elwt: &EventLoopWindowTarget<()>) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.dispatch(InputEvent::Resized {
                            width: size.width,
                            height: size.height,
                        });
                    }
                    WindowEvent::KeyboardInput { event, .. } => self.handle_keyboard(event),
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        self.dispatch(InputEvent::PointerMoved(pos));
                    }
                    WindowEvent::MouseWheel { delta, .. } => {
                        let pixels = match delta {
                            MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT,
                            MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                        };
                        self.dispatch(InputEvent::Scroll(pixels));
                    }
                    WindowEvent::RedrawRequested => self.redraw()?,
                    _ => {}
                }
            }
            Event::AboutToWait => {
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, event: InputEvent) {
        self.input.apply(&event);
        if self.gallery.handle_event(&event) {
            self.input.release_all();
        }
    }

    fn redraw(&mut self) -> Result<()> {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;
        self.gallery.update(dt, &self.input);

        let title = self.gallery.title();
        if title != self.title {
            self.renderer.window().set_title(&title);
            self.title = title;
        }

        let demo = self.gallery.active();
        if let Err(err) = self.renderer.render(demo.scene(), demo.camera()) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let size = self.renderer.window().inner_size();
                    self.renderer.resize(size);
                }
                wgpu::SurfaceError::OutOfMemory => {
                    return Err(anyhow!("GPU is out of memory"));
                }
                wgpu::SurfaceError::Timeout => {
                    info!("Surface timeout; retrying next frame");
                }
                other => error!("surface error: {other}"),
            }
        }
        Ok(())
    }

    fn handle_keyboard(&mut self, event: &KeyEvent) {
        if event.repeat {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let Some(keycode) = map_keycode(code) else {
            return;
        };
        match event.state {
            ElementState::Pressed => self.dispatch(InputEvent::KeyDown(keycode)),
            ElementState::Released => self.dispatch(InputEvent::KeyUp(keycode)),
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let index = match button {
            WinitMouseButton::Left => 0,
            WinitMouseButton::Right => 1,
            WinitMouseButton::Middle => 2,
            WinitMouseButton::Back => 3,
            WinitMouseButton::Forward => 4,
            WinitMouseButton::Other(value) => value.min(u16::from(u8::MAX)),
        } as u8;
        let button = MouseButton::new(index);
        match state {
            ElementState::Pressed => self.dispatch(InputEvent::PointerDown(button)),
            ElementState::Released => self.dispatch(InputEvent::PointerUp(button)),
        }
    }
}

fn map_keycode(code: WinitKey) -> Option<KeyCode> {
    use WinitKey as Key;
    Some(match code {
        Key::Space => KeyCode::Named(NamedKey::Space),
        Key::Enter => KeyCode::Named(NamedKey::Enter),
        Key::Tab => KeyCode::Named(NamedKey::Tab),
        Key::ArrowLeft => KeyCode::Named(NamedKey::Left),
        Key::ArrowRight => KeyCode::Named(NamedKey::Right),
        Key::ArrowUp => KeyCode::Named(NamedKey::Up),
        Key::ArrowDown => KeyCode::Named(NamedKey::Down),
        Key::Escape => KeyCode::Named(NamedKey::Escape),
        Key::Backspace => KeyCode::Named(NamedKey::Backspace),
        Key::Home => KeyCode::Named(NamedKey::Home),
        Key::End => KeyCode::Named(NamedKey::End),
        Key::PageUp => KeyCode::Named(NamedKey::PageUp),
        Key::PageDown => KeyCode::Named(NamedKey::PageDown),
        Key::ShiftLeft => KeyCode::Named(NamedKey::LeftShift),
        Key::ShiftRight => KeyCode::Named(NamedKey::RightShift),
        Key::Equal | Key::NumpadAdd => KeyCode::Named(NamedKey::Plus),
        Key::Minus | Key::NumpadSubtract => KeyCode::Named(NamedKey::Minus),
        Key::Digit0 => KeyCode::Digit(0),
        Key::Digit1 => KeyCode::Digit(1),
        Key::Digit2 => KeyCode::Digit(2),
        Key::Digit3 => KeyCode::Digit(3),
        Key::Digit4 => KeyCode::Digit(4),
        Key::Digit5 => KeyCode::Digit(5),
        Key::Digit6 => KeyCode::Digit(6),
        Key::Digit7 => KeyCode::Digit(7),
        Key::Digit8 => KeyCode::Digit(8),
        Key::Digit9 => KeyCode::Digit(9),
        Key::KeyA => KeyCode::Character('A'),
        Key::KeyB => KeyCode::Character('B'),
        Key::KeyC => KeyCode::Character('C'),
        Key::KeyD => KeyCode::Character('D'),
        Key::KeyE => KeyCode::Character('E'),
        Key::KeyF => KeyCode::Character('F'),
        Key::KeyG => KeyCode::Character('G'),
        Key::KeyH => KeyCode::Character('H'),
        Key::KeyI => KeyCode::Character('I'),
        Key::KeyJ => KeyCode::Character('J'),
        Key::KeyK => KeyCode::Character('K'),
        Key::KeyL => KeyCode::Character('L'),
        Key::KeyM => KeyCode::Character('M'),
        Key::KeyN => KeyCode::Character('N'),
        Key::KeyO => KeyCode::Character('O'),
        Key::KeyP => KeyCode::Character('P'),
        Key::KeyQ => KeyCode::Character('Q'),
        Key::KeyR => KeyCode::Character('R'),
        Key::KeyS => KeyCode::Character('S'),
        Key::KeyT => KeyCode::Character('T'),
        Key::KeyU => KeyCode::Character('U'),
        Key::KeyV => KeyCode::Character('V'),
        Key::KeyW => KeyCode::Character('W'),
        Key::KeyX => KeyCode::Character('X'),
        Key::KeyY => KeyCode::Character('Y'),
        Key::KeyZ => KeyCode::Character('Z'),
        Key::F1 => KeyCode::Function(1),
        Key::F2 => KeyCode::Function(2),
        Key::F3 => KeyCode::Function(3),
        Key::F4 => KeyCode::Function(4),
        Key::F5 => KeyCode::Function(5),
        Key::F6 => KeyCode::Function(6),
        Key::F7 => KeyCode::Function(7),
        Key::F8 => KeyCode::Function(8),
        Key::F9 => KeyCode::Function(9),
        Key::F10 => KeyCode::Function(10),
        Key::F11 => KeyCode::Function(11),
        Key::F12 => KeyCode::Function(12),
        _ => return None,
    })
}

struct CliOptions {
    demo: DemoKind,
    model: Option<PathBuf>,
    seed: Option<u64>,
    scatter_mode: ScatterMode,
    headless: bool,
    frames: u32,
    playback: Playback,
    json: bool,
    list: bool,
    help: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            demo: DemoKind::Transfer,
            model: None,
            seed: None,
            scatter_mode: ScatterMode::Fixed,
            headless: false,
            frames: 120,
            playback: Playback::new(),
            json: false,
            list: false,
            help: false,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value\n{USAGE}"))
            };
            match arg.as_str() {
                "--demo" => {
                    let name = value()?;
                    options.demo = DemoKind::from_name(&name)
                        .ok_or_else(|| anyhow!("unknown demo: {name}. Try --list"))?;
                }
                "--model" => options.model = Some(PathBuf::from(value()?)),
                "--seed" => {
                    let seed = value()?;
                    options.seed =
                        Some(seed.parse().with_context(|| format!("invalid seed: {seed}"))?);
                }
                "--frames" => {
                    let frames = value()?;
                    options.frames = frames
                        .parse()
                        .with_context(|| format!("invalid frame count: {frames}"))?;
                }
                "--hold" => options.playback.push(Action::Hold(parse_key(&value()?)?)),
                "--press" => options.playback.push(Action::Press(parse_key(&value()?)?)),
                "--scroll" => {
                    let fraction = value()?;
                    let fraction: f32 = fraction
                        .parse()
                        .with_context(|| format!("invalid scroll fraction: {fraction}"))?;
                    options.playback.push(Action::Scroll(fraction));
                }
                "--drag" => {
                    let (from, to) = parse_drag(&value()?)?;
                    options.playback.push(Action::Drag { from, to });
                }
                "--light-x" => {
                    let x = value()?;
                    let x: f32 = x.parse().with_context(|| format!("invalid light x: {x}"))?;
                    options.playback.push(Action::LightX(x));
                }
                "--reroll-scatter" => options.scatter_mode = ScatterMode::Reroll,
                "--headless" => options.headless = true,
                "--json" => options.json = true,
                "--list" => options.list = true,
                "--help" | "-h" => options.help = true,
                other => bail!("Unknown argument: {other}\n{USAGE}"),
            }
        }
        Ok(options)
    }

    fn gallery_config(&self) -> GalleryConfig {
        let defaults = GalleryConfig::default();
        let seed = self.seed.unwrap_or_else(rand::random);
        info!("particle seed {seed}");
        GalleryConfig {
            seed,
            model_path: self.model.clone().unwrap_or(defaults.model_path),
            scatter_mode: self.scatter_mode,
            viewport: defaults.viewport,
        }
    }
}
