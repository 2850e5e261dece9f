use anyhow::{Context, Result};
use flip_config::FlipConfig;
use flip_engine::{FlipController, FlipOptions, Layout};
use flip_sim::{ElementId, SimDocument};
use serde::Serialize;

/// Sampling interval for the printed frames.
const FRAME_MS: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SceneKind {
    /// Three boxes in a row, a fourth inserted after the first.
    Insert,
    /// The first of three boxes removed.
    Remove,
    /// The first box grows and pushes its neighbours.
    Grow,
    /// The viewport narrows until the row wraps.
    Wrap,
}

impl SceneKind {
    fn from_env() -> Self {
        let env = std::env::var("FLIP_SCENE").ok();
        let arg = std::env::args().find_map(|a| a.strip_prefix("--scene=").map(str::to_string));
        match arg.or(env).as_deref() {
            Some("remove") => Self::Remove,
            Some("grow") => Self::Grow,
            Some("wrap") => Self::Wrap,
            _ => Self::Insert,
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Line<'a> {
    Style(&'a flip_sim::StyleWrite),
    Frame {
        at_ms: f64,
        element: ElementId,
        top: f64,
        left: f64,
    },
}

fn main() -> Result<()> {
    let config = FlipConfig::load();
    init_logging(&config);

    let options = FlipOptions::from_config(&config)
        .with_context(|| format!("invalid easing {:?}", config.animation.easing))?;
    let scene = SceneKind::from_env();
    log::info!("playing {scene:?} with {options:?}");

    let mut doc = SimDocument::new(320.0)?;
    let root = doc.root();
    let mut boxes = Vec::new();
    for _ in 0..3 {
        let id = doc.create_element(100.0, 20.0)?;
        doc.append_child(root, id)?;
        boxes.push(id);
    }

    let mut controller = FlipController::new(options);
    controller.attach(&mut doc, root);

    let mut animating = 0;
    match scene {
        SceneKind::Insert => {
            let id = doc.create_element(100.0, 20.0)?;
            doc.insert_after(root, id, Some(boxes[0]))?;
        }
        SceneKind::Remove => doc.remove(boxes[0])?,
        SceneKind::Grow => doc.set_size(boxes[0], 160.0, 20.0)?,
        SceneKind::Wrap => {
            animating += doc.resize_viewport(&mut controller, 220.0)?.len();
        }
    }
    animating += doc.flush(&mut controller).len();
    log::info!("{animating} element(s) animating");

    let mut printed = 0;
    loop {
        printed = print_styles(&doc, printed)?;
        for &node in controller.tracked() {
            if let Some(rect) = doc.bounding_rect(node) {
                let line = Line::Frame {
                    at_ms: doc.now(),
                    element: node,
                    top: rect.top,
                    left: rect.left,
                };
                println!("{}", serde_json::to_string(&line)?);
            }
        }
        if doc.pending_timers() == 0 {
            break;
        }
        doc.advance(&mut controller, FRAME_MS);
    }
    print_styles(&doc, printed)?;
    Ok(())
}

fn print_styles(doc: &SimDocument, from: usize) -> Result<usize> {
    let writes = doc.writes();
    for write in &writes[from..] {
        println!("{}", serde_json::to_string(&Line::Style(write))?);
    }
    Ok(writes.len())
}

fn init_logging(config: &FlipConfig) {
    let mut builder = env_logger::Builder::from_default_env();
    if let Some(filter) = &config.log.filter {
        builder.parse_filters(filter);
    }
    let _ = builder.try_init();
}
