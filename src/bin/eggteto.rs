//! eggteto: Eggen vs Teto face-shape classifier
//!
//! Analyze a photo once, or run an interactive session where images are
//! dropped onto the terminal.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use eggteto::camera::Camera;
use eggteto::config::{Config, Secrets};
use eggteto::presentation::{self, Style};
use eggteto::{Acquisition, AppController, EggtetoError, GeminiClient, SessionState, codec};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Eggen vs Teto face-shape classifier
#[derive(Parser)]
#[command(name = "eggteto")]
#[command(version = eggteto::PKG_VERSION)]
#[command(about = "Classify a face photo as Eggen or Teto")]
struct Args {
    /// Config file (default: ~/.eggteto/config.toml, then /etc/eggteto/config.toml)
    #[arg(short, long, global = true, env = "EGGTETO_CONFIG")]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze an image file
    Analyze {
        /// Image to analyze
        path: PathBuf,
        /// Print the validated result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Take a photo with the camera and analyze it
    Capture {
        /// Video device (default: config, then the first front-facing device)
        #[arg(short, long)]
        device: Option<String>,
        /// Print the validated result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List camera devices
    Devices,

    /// Interactive session (default)
    Interactive,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Logs go to stderr so they never mix with rendered results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let style = if config.display.color && !args.no_color && std::io::stdout().is_terminal() {
        Style::Ansi
    } else {
        Style::Plain
    };

    let code = match args.command.unwrap_or(Command::Interactive) {
        Command::Devices => {
            list_devices();
            ExitCode::SUCCESS
        }
        Command::Analyze { path, json } => {
            let controller = build_controller(&config)?;
            let image = codec::encode_path(&path, Acquisition::Gallery).await;
            run_once(&controller, image, json, style, &config).await?
        }
        Command::Capture { device, json } => {
            let controller = build_controller(&config)?;
            let image = match open_camera(device.or(config.camera.device.clone())) {
                Ok(camera) => codec::encode_capture(camera).await,
                Err(e) => Err(e),
            };
            run_once(&controller, image, json, style, &config).await?
        }
        Command::Interactive => {
            interactive(build_controller(&config)?, &config, style).await?;
            ExitCode::SUCCESS
        }
    };

    Ok(code)
}

/// Build the session around a Gemini client.
///
/// A missing or rejected credential does not stop startup; it surfaces as
/// `ServiceUnavailable` on the first classification.
fn build_controller(config: &Config) -> eggteto::Result<AppController> {
    let client = GeminiClient::new(&config.service, Secrets::load().api_key())?;
    debug!(model = client.model(), "classifier ready");
    Ok(AppController::new(Arc::new(client)))
}

/// Submit one image and print the outcome.
///
/// User-facing failures print their localized message and exit non-zero;
/// only environment problems bubble up as errors.
async fn run_once(
    controller: &AppController,
    image: eggteto::Result<eggteto::EncodedImage>,
    json: bool,
    style: Style,
    config: &Config,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let outcome = match image {
        Ok(image) => controller.submit(image).await,
        Err(e) => Err(e),
    };

    match outcome {
        Ok(result) if json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(result) => {
            let view = presentation::ResultView::new(&result, config.display.bar_width);
            print!("{}", view.render(style));
            Ok(ExitCode::SUCCESS)
        }
        Err(e @ EggtetoError::Configuration(_)) => Err(e.into()),
        Err(e) => {
            debug!(error = %e, "analysis did not complete");
            eprint!("{}", presentation::render_error(&e, style));
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Read commands and dropped files from stdin until EOF or `quit`.
async fn interactive(
    controller: AppController,
    config: &Config,
    style: Style,
) -> Result<(), Box<dyn std::error::Error>> {
    let bar_width = config.display.bar_width;
    let mut states = controller.subscribe();
    print!(
        "{}",
        presentation::render_state(&states.borrow_and_update(), style, bar_width)
    );

    let renderer = tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            print!("{}", presentation::render_state(&state, style, bar_width));
        }
    });

    let camera_device = config.camera.device.clone();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "retry" => {
                if !controller.retry() {
                    println!("{}", notice(&controller));
                }
            }
            "dismiss" => {
                if !controller.dismiss() {
                    println!("{}", notice(&controller));
                }
            }
            "share" => match controller.state() {
                SessionState::Succeeded(result) => println!("{}", presentation::share_text(&result)),
                _ => println!("공유할 결과가 없습니다."),
            },
            "camera" => {
                let image = match open_camera(camera_device.clone()) {
                    Ok(camera) => codec::encode_capture(camera).await,
                    Err(e) => Err(e),
                };
                dispatch(&controller, image, style);
            }
            input if input.starts_with("data:") => {
                dispatch(&controller, codec::decode_data_url(input, Acquisition::Drop), style);
            }
            input => {
                let paths = codec::parse_dropped_paths(input);
                dispatch(&controller, codec::encode_dropped_paths(&paths).await, style);
            }
        }
    }

    renderer.abort();
    Ok(())
}

/// Hand an image to the controller in the background.
///
/// Rejected input never reaches the controller, so the session state is
/// left as it was.
fn dispatch(controller: &AppController, image: eggteto::Result<eggteto::EncodedImage>, style: Style) {
    let image = match image {
        Ok(image) => image,
        Err(e) => {
            debug!(error = %e, "input rejected");
            eprint!("{}", presentation::render_error(&e, style));
            return;
        }
    };

    let controller = controller.clone();
    tokio::spawn(async move {
        // Classification outcomes reach the screen through the state channel.
        if let Err(e @ EggtetoError::SessionBusy(_)) = controller.submit(image).await {
            eprintln!("{}", e.user_message());
        }
    });
}

fn notice(controller: &AppController) -> String {
    format!("(nothing to do while {})", controller.state().name())
}

#[cfg(feature = "v4l-camera")]
fn open_camera(device: Option<String>) -> eggteto::Result<Arc<dyn Camera>> {
    use eggteto::camera::{Facing, V4lCamera};

    let camera = match device {
        Some(path) => V4lCamera::open(&path)?,
        None => V4lCamera::open_preferred(Facing::User)?,
    };
    Ok(Arc::new(camera))
}

#[cfg(not(feature = "v4l-camera"))]
fn open_camera(_device: Option<String>) -> eggteto::Result<Arc<dyn Camera>> {
    Err(EggtetoError::Camera(
        "built without camera support (enable the v4l-camera feature)".to_string(),
    ))
}

#[cfg(feature = "v4l-camera")]
fn list_devices() {
    let devices = eggteto::camera::V4lCamera::list_devices();
    if devices.is_empty() {
        println!("no video capture devices found");
        return;
    }
    for device in devices {
        println!("{:<14} {} ({}, {})", device.path, device.name, device.driver, device.bus);
    }
}

#[cfg(not(feature = "v4l-camera"))]
fn list_devices() {
    println!("camera support not compiled in (enable the v4l-camera feature)");
}
