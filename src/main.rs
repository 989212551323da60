use color_eyre::Result;
use padstate::config::{Acquisition, PadConfig};
use padstate::controller::{ListenerSettings, PadListener, PadSource, PadState, UpdateRate};
use padstate::keyboard::{self, KeyCode, KeyEvent, KeyboardOverlay};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::FmtSubscriber;

/// Frames between analog/rate reports
const REPORT_EVERY: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    let set_log_level = setup()?;

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = PadConfig::load(config_path.as_deref()).await?;
    set_log_level(config.log_level())?;
    info!("Starting with config: {:?}", config);

    let mut source = open_source(&config);
    let (key_sender, mut keyboard) = keyboard::channel(64);
    let _stdin_task = tokio::spawn(read_keys(key_sender));
    let mut overlay = KeyboardOverlay::new(config.keyboard.clone());

    // stand-in copy while no backend is available, keyboard still works
    let mut idle_pad = PadState::default().with_repeat_policy(config.repeat);

    let mut ticker = tokio::time::interval(Duration::from_millis(config.frame_interval_ms));
    let mut frame: u64 = 0;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    info!("Entering frame loop, type +w / -w to press and release keys");
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut ctrl_c => {
                info!("Interrupted, leaving frame loop");
                break;
            }
        }

        overlay.poll(&mut keyboard);
        let rate = source
            .as_ref()
            .and_then(|source| source.store())
            .and_then(|store| store.update_rate());
        let pad = match source.as_mut() {
            Some(source) => source.refresh(),
            None => {
                idle_pad.merge_from(&PadState::default());
                &mut idle_pad
            }
        };
        overlay.apply(pad);
        report_frame(frame, pad, rate);
        frame += 1;
    }

    Ok(())
}

fn setup() -> Result<impl Fn(Level) -> Result<()>> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(setup_logging_env())
}

/// Install the subscriber at info. The returned closure swaps in the
/// configured level once the config is loaded.
fn setup_logging_env() -> impl Fn(Level) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .with_filter_reloading();
    let handle = builder.reload_handle();
    builder.init();

    move |level| {
        handle.reload(LevelFilter::from_level(level))?;
        debug!("Log level set to {}", level);
        Ok(())
    }
}

/// Open the configured acquisition mode, falling back to polling when push
/// registration fails and to no pad at all when gilrs is unavailable.
fn open_source(config: &PadConfig) -> Option<PadSource> {
    let settings = ListenerSettings {
        joystick_deadzone: config.deadzone,
    };

    let listener = match PadListener::create(Some(settings.clone())) {
        Ok(listener) => listener,
        Err(e) => {
            error!("No pad backend, running keyboard only: {}", e);
            return None;
        }
    };

    if config.acquisition == Acquisition::Push {
        match PadSource::push(listener, config.repeat) {
            Ok(source) => return Some(source),
            Err(e) => warn!("Push mode unavailable, falling back to polling: {}", e),
        }
        return match PadListener::create(Some(settings)) {
            Ok(listener) => Some(PadSource::poll(listener, config.slot, config.repeat)),
            Err(e) => {
                error!("No pad backend, running keyboard only: {}", e);
                None
            }
        };
    }

    Some(PadSource::poll(listener, config.slot, config.repeat))
}

/// Lines like `+w` press a key, `-w` release it.
async fn read_keys(sender: mpsc::Sender<KeyEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        };
        let line = line.trim();
        let (pressed, name) = match line.split_at_checked(1) {
            Some(("+", name)) => (true, name),
            Some(("-", name)) => (false, name),
            _ => {
                debug!("Ignoring input line {:?}", line);
                continue;
            }
        };
        match name.parse::<KeyCode>() {
            Ok(code) => {
                if sender.send(KeyEvent { code, pressed }).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("{}", e),
        }
    }
    debug!("Key reader finished");
}

fn report_frame(frame: u64, pad: &PadState, rate: Option<UpdateRate>) {
    for (channel, button) in pad.buttons() {
        if button.on() {
            info!("{:?} on", channel);
        } else if button.release() {
            info!("{:?} release", channel);
        } else if button.is_repeating() {
            debug!("{:?} repeat", channel);
        }
    }

    if frame % REPORT_EVERY != 0 || !pad.enabled {
        return;
    }
    debug!(
        "Pad {}: L=({:.2}, {:.2}) R=({:.2}, {:.2}) T=({:.2}, {:.2})",
        pad.identity, pad.left_x, pad.left_y, pad.right_x, pad.right_y, pad.trigger_l, pad.trigger_r
    );
    if let Some(rate) = rate {
        info!(
            "{:.3}/{}/{:.1}",
            rate.per_second,
            rate.count,
            rate.window.num_milliseconds() as f64 / 1000.0
        );
    }
}
