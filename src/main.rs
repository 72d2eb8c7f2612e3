//! osr-bridge - Off-Screen Browser Session Bridge
//!
//! Runs a scripted headless session against an in-process engine and prints
//! what the engine received. With `--dump <file.png>` the composited surface
//! is written to disk; `--gpu` uploads into a wgpu texture instead.

use std::env;
use std::path::{Path, PathBuf};

use osr_bridge::compositor::{
    frame_len, DamageRect, GpuContext, SoftwareTexture, TextureBackend, WgpuTexture,
};
use osr_bridge::cursor::CursorType;
use osr_bridge::drag::{DragData, DragOperations};
use osr_bridge::engine::{EngineCommand, RecordingEngine};
use osr_bridge::input::{keys, KeyModifiers};
use osr_bridge::provision::PreinstalledArtifacts;
use osr_bridge::{BridgeSettings, EngineCallbacks, RenderQueue, SessionContext, SharedSession, NAME, VERSION};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 200;

#[derive(Debug, Default)]
struct Options {
    config: Option<PathBuf>,
    dump: Option<PathBuf>,
    gpu: bool,
}

fn parse_args() -> Result<Options, String> {
    let mut options = Options::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--gpu" => options.gpu = true,
            "--dump" => options.dump = Some(args.next().ok_or("--dump needs a file name")?.into()),
            "--config" => options.config = Some(args.next().ok_or("--config needs a file name")?.into()),
            other => return Err(format!("unknown argument `{}`", other)),
        }
    }
    Ok(options)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let options = match parse_args() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("usage: {} [--config settings.json] [--dump surface.png] [--gpu]", NAME);
            std::process::exit(2);
        }
    };

    if let Err(e) = run(options) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(options: Options) -> osr_bridge::Result<()> {
    log::info!("{} v{}", NAME, VERSION);

    let settings = match &options.config {
        Some(path) => BridgeSettings::load(path)?,
        None => BridgeSettings::default(),
    };

    let queue = RenderQueue::new();
    let mut context = SessionContext::initialize(settings, &mut PreinstalledArtifacts, queue.submitter())?;

    let software = SoftwareTexture::new();
    let backend: Box<dyn TextureBackend> = if options.gpu {
        Box::new(gpu_backend()?)
    } else {
        Box::new(software.clone())
    };

    let engine = RecordingEngine::with_history(1, 0);
    let session = context.create_session_with_size(Box::new(engine.clone()), backend, WIDTH, HEIGHT)?;
    session.with_session(|s| {
        s.set_cursor_listener(std::sync::Arc::new(|cursor: CursorType| {
            log::info!("Cursor -> {:?}", cursor)
        }))
    });
    queue.run_pending();

    run_script(&session);

    for command in engine.commands() {
        log::debug!("{:?}", command);
    }
    log::info!(
        "Engine received {} commands ({} mouse, {} wheel, {} key, {} reload)",
        engine.commands().len(),
        engine.count(|c| matches!(c, EngineCommand::Mouse(_))),
        engine.count(|c| matches!(c, EngineCommand::Wheel(_))),
        engine.count(|c| matches!(c, EngineCommand::Key(_))),
        engine.count(|c| *c == EngineCommand::Reload),
    );

    if let Some(path) = &options.dump {
        dump_surface(&software, path, options.gpu)?;
    }

    context.shutdown();
    queue.run_pending();
    Ok(())
}

fn gpu_backend() -> osr_bridge::Result<WgpuTexture> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let mut gpu = GpuContext::new();
    runtime.block_on(gpu.initialize())?;
    Ok(WgpuTexture::new(&gpu)?)
}

/// BGRA gradient with a solid block at `(bx, by)`
fn test_pattern(width: u32, height: u32, block: Option<(u32, u32)>) -> Vec<u8> {
    let mut pixels = vec![0; frame_len(width, height)];
    for (i, px) in pixels.chunks_exact_mut(4).enumerate() {
        let x = i as u32 % width;
        let y = i as u32 / width;
        let inside = block.is_some_and(|(bx, by)| (bx..bx + 32).contains(&x) && (by..by + 32).contains(&y));
        if inside {
            px.copy_from_slice(&[0x20, 0x20, 0xe0, 0xff]);
        } else {
            px.copy_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 0x40, 0xff]);
        }
    }
    pixels
}

fn run_script(session: &SharedSession) {
    // engine paints the whole page at the initial size
    let mut engine_side = session.clone();
    engine_side.on_paint(
        false,
        &[DamageRect::full(WIDTH, HEIGHT)],
        &test_pattern(WIDTH, HEIGHT, None),
        WIDTH,
        HEIGHT,
    );

    // partial repaint of one block
    engine_side.on_paint(
        false,
        &[DamageRect::new(40, 40, 32, 32)],
        &test_pattern(WIDTH, HEIGHT, Some((40, 40))),
        WIDTH,
        HEIGHT,
    );

    // a dropdown opens
    let popup = DamageRect::new(200, 20, 80, 60);
    engine_side.on_popup_geometry(popup);
    engine_side.on_popup_show(true);
    let popup_pixels: Vec<u8> = [0xf0, 0xf0, 0xf0, 0xff].repeat((popup.width * popup.height) as usize);
    engine_side.on_paint(
        true,
        &[DamageRect::full(popup.width, popup.height)],
        &popup_pixels,
        popup.width,
        popup.height,
    );

    // pointer interaction
    engine_side.on_cursor_change(CursorType::Hand.id());
    session.with_session(|s| {
        s.pointer_move(50, 50);
        s.pointer_press(50, 50, 0);
        s.pointer_release(50, 50, 0);
        s.wheel(50, 50, -0.5);
        s.key_typed('a', KeyModifiers::empty());
        s.key_press(keys::KEY_R, 19, KeyModifiers::CONTROL);
        s.key_release(keys::KEY_R, 19, KeyModifiers::CONTROL);
    });

    // the page starts dragging a link and the pointer carries it across
    session.with_session(|s| s.pointer_press(60, 60, 0));
    engine_side.on_start_dragging(DragData::new("https://example.com"), DragOperations::LINK, 60, 60);
    engine_side.on_drag_cursor_update(DragOperations::LINK);
    session.with_session(|s| {
        s.pointer_move(90, 90);
        s.pointer_release(120, 120, 0);
    });

    // the dropdown closes and the page repaints underneath it
    engine_side.on_popup_show(false);
    engine_side.on_paint(
        false,
        &[popup],
        &test_pattern(WIDTH, HEIGHT, Some((40, 40))),
        WIDTH,
        HEIGHT,
    );
}

fn dump_surface(software: &SoftwareTexture, path: &Path, gpu: bool) -> osr_bridge::Result<()> {
    if gpu {
        log::warn!("--dump reads the software surface and is ignored with --gpu");
        return Ok(());
    }
    let Some(image) = software.frame().and_then(|frame| frame.to_rgba_image()) else {
        log::warn!("Surface is empty, nothing to dump");
        return Ok(());
    };
    image
        .save(path)
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    log::info!("Surface written to {}", path.display());
    Ok(())
}
