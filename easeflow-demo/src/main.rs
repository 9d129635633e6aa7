use anyhow::Context;
use easeflow::prelude::*;
use std::sync::Mutex;

/// Button and panel state the transitions write back into
#[derive(Debug)]
struct Controls {
    button_background: Color,
    panel_size: Size,
}

impl Controls {
    fn new() -> Self {
        Self {
            button_background: Color::rgb(0x2d, 0x2d, 0x30),
            panel_size: Size::new(240.0, 120.0),
        }
    }
}

const BUTTON: u64 = 1;
const PANEL: u64 = 2;

/// Terminal walkthrough of hover and resize transitions
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    easeflow::init_logging();

    let profile = match std::env::args().nth(1).as_deref() {
        Some("snappy") => AnimationProfile::Snappy,
        Some("smooth") => AnimationProfile::Smooth,
        Some("disabled") => AnimationProfile::Disabled,
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading animation options from {}", path))?;
            AnimationProfile::Custom(AnimationOptions::from_json(&json)?)
        }
        None => AnimationProfile::Balanced,
    };
    let options = profile.resolve();
    options.validate()?;
    log::info!("animation options: {}", options.to_json()?);

    let controls = Arc::new(Mutex::new(Controls::new()));
    let mut registry = TransitionRegistry::default();

    let interrupted = tokio::select! {
        result = run_scenario(&mut registry, &options, &controls) => {
            result?;
            false
        }
        _ = tokio::signal::ctrl_c() => true,
    };
    if interrupted {
        log::info!("interrupted, cancelling {} transitions", registry.active_count());
        registry.cancel_all();
    }

    let controls = controls
        .lock()
        .map_err(|_| anyhow::anyhow!("controls lock poisoned"))?;
    log::info!(
        "final state: background {:?}, panel {}x{}",
        controls.button_background,
        controls.panel_size.width,
        controls.panel_size.height
    );
    Ok(())
}

async fn run_scenario(
    registry: &mut TransitionRegistry,
    options: &AnimationOptions,
    controls: &Arc<Mutex<Controls>>,
) -> anyhow::Result<()> {
    let background = PropertyKey::new(BUTTON, "background");
    let panel = PropertyKey::new(PANEL, "size");
    let idle = Color::rgb(0x2d, 0x2d, 0x30);
    let hover = Color::rgb(0x3e, 0x3e, 0x42);

    log::info!("pointer enters button");
    registry
        .replace(
            background.clone(),
            background_request(options, idle, hover, controls),
        )
        .await?;

    log::info!("panel opens");
    let open = Size::new(480.0, 320.0);
    registry
        .replace(panel.clone(), panel_request(options, open, controls)?)
        .await?;

    // Leave before the hover-in finishes so the hover-out supersedes it
    delay(options.spec(Interaction::Hover).duration() / 2).await;
    let current = current_background(controls)?;
    log::info!("pointer leaves button at {:?}", current);
    registry
        .replace(
            background.clone(),
            background_request(options, current, idle, controls),
        )
        .await?;

    for key in [&background, &panel] {
        if let Some(handle) = registry.handle(key) {
            let outcome = handle.wait().await;
            log::info!("{} finished: {:?}", key, outcome);
            outcome.into_result()?;
        }
    }
    registry.prune_finished();
    Ok(())
}

fn background_request(
    options: &AnimationOptions,
    from: Color,
    to: Color,
    controls: &Arc<Mutex<Controls>>,
) -> TransitionRequest {
    let controls = controls.clone();
    TransitionRequest::fallible(from, to, options.spec(Interaction::Hover), move |value| {
        let color = value
            .as_color()
            .ok_or_else(|| SinkError::new("background expects a color"))?;
        log::info!("background -> #{:02x}{:02x}{:02x}", color.r, color.g, color.b);
        let mut controls = controls
            .lock()
            .map_err(|_| SinkError::new("controls lock poisoned"))?;
        controls.button_background = color;
        Ok(())
    })
    .with_easing(options.use_easing(Interaction::Hover))
}

fn panel_request(
    options: &AnimationOptions,
    to: Size,
    controls: &Arc<Mutex<Controls>>,
) -> anyhow::Result<TransitionRequest> {
    let from = controls
        .lock()
        .map_err(|_| anyhow::anyhow!("controls lock poisoned"))?
        .panel_size;
    let controls = controls.clone();
    let request = TransitionRequest::fallible(
        from,
        to,
        options.spec(Interaction::OpenClose),
        move |value| {
            let size = value
                .as_size()
                .ok_or_else(|| SinkError::new("panel expects a size"))?;
            log::info!("panel -> {:.1}x{:.1}", size.width, size.height);
            controls
                .lock()
                .map_err(|_| SinkError::new("controls lock poisoned"))?
                .panel_size = size;
            Ok(())
        },
    )
    .with_easing(options.use_easing(Interaction::OpenClose));
    Ok(request)
}

fn current_background(controls: &Arc<Mutex<Controls>>) -> anyhow::Result<Color> {
    Ok(controls
        .lock()
        .map_err(|_| anyhow::anyhow!("controls lock poisoned"))?
        .button_background)
}
