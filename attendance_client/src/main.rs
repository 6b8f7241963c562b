use clap::{Parser, Subcommand};
use crate::modules::{
    coordinator::{CoordinatorOptions, SubmissionCoordinator, MSG_NO_CAMERA, TITLE_ERROR},
    location_acquirer::{FixedLocation, GpsdLocation, HostLocation},
    media_acquirer::{self, FrameSource, NoCameraSource, StillImageSource, VideoSurface},
    navigator::TerminalNavigator,
    notifier::{NoticeKind, Notifier, TerminalNotifier},
    registration,
    transport::HttpTransport,
};
use log::{error, info, warn};
use std::{process, sync::Arc};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    time::Duration,
};

mod config;
mod modules;

#[derive(Parser)]
#[command(name = "attendance_client")]
#[command(about = "Submit face and location verified attendance", long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(long, default_value = "attendance_client/Config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit attendance for one course
    Submit {
        /// Course identifier as listed by the server
        #[arg(long)]
        course: String,
    },
    /// Read course identifiers from stdin, one submission per line
    Interactive,
    /// Register the face currently in front of the camera
    Register,
    /// Check that the attendance server is up
    Health,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Load the configuration before anything else, logging depends on it
    let config = match config::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.logging.level.as_str())).init();

    let transport = match HttpTransport::new(&config.server) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error creating HTTP client: {}", e);
            process::exit(1);
        }
    };

    if let Command::Health = args.command {
        match transport.health().await {
            Ok(reply) => {
                println!("{}: {}", reply.service, reply.status);
                return;
            }
            Err(e) => {
                eprintln!("Health check failed: {}", e);
                process::exit(1);
            }
        }
    }

    // Stdin carries course ids in interactive mode, so results cannot wait for Enter
    let auto_acknowledge = config.notifier.auto_acknowledge || matches!(args.command, Command::Interactive);
    let notifier = TerminalNotifier::new(auto_acknowledge);

    // Camera is requested once for the whole session
    let surface = VideoSurface::new(config.camera.width, config.camera.height, config.camera.jpeg_quality);
    let source: Arc<dyn FrameSource> = match (&config.camera.source, &config.camera.snapshot_path) {
        (config::CameraSourceKind::Still, Some(path)) => Arc::new(StillImageSource::new(path)),
        _ => Arc::new(NoCameraSource),
    };
    let _playback = match media_acquirer::start_camera(source, surface.clone(), config.camera.frame_rate) {
        Ok(playback) => Some(playback),
        Err(e) => {
            // Not fatal, captures fall back to the blank surface
            error!("Error accessing camera: {}", e);
            notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_NO_CAMERA).await;
            None
        }
    };

    if let Command::Register = args.command {
        match registration::register_face(&surface, &transport, &notifier).await {
            Ok(_) => return,
            Err(e) => {
                warn!("Face registration ended: {}", e);
                process::exit(1);
            }
        }
    }

    let location = match config.location.provider {
        config::LocationProviderKind::Gpsd => HostLocation::Gpsd(GpsdLocation::new(
            config.location.gpsd_address.clone(),
            Duration::from_secs(config.location.host_timeout_secs),
        )),
        config::LocationProviderKind::Fixed => {
            HostLocation::Fixed(FixedLocation::new(config.location.latitude, config.location.longitude))
        }
    };

    let coordinator = Arc::new(SubmissionCoordinator::new(
        surface,
        location,
        transport,
        notifier,
        TerminalNavigator,
        CoordinatorOptions {
            placeholder: config.course.placeholder.clone(),
            records_destination: config.server.url_for(&config.server.records_path),
            reject_overlapping: config.coordinator.reject_overlapping,
        },
    ));

    match args.command {
        Command::Submit { course } => {
            if let Err(e) = coordinator.submit(&course).await {
                warn!("Attendance attempt ended: {}", e);
                process::exit(1);
            }
        }
        Command::Interactive => {
            info!("Reading course identifiers from stdin");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut attempts = Vec::new();

            // Each line is its own attempt, running alongside any earlier one
            loop {
                match lines.next_line().await {
                    Ok(Some(course)) => {
                        let coordinator = coordinator.clone();
                        attempts.push(tokio::spawn(async move {
                            if let Err(e) = coordinator.submit(&course).await {
                                warn!("Attendance attempt ended: {}", e);
                            }
                        }));
                    }
                    Ok(None) => break,
                    Err(e) => {
                        error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }

            // Let attempts still in flight finish
            for result in futures::future::join_all(attempts).await {
                if let Err(e) = result {
                    error!("Submission task failed: {}", e);
                }
            }
        }
        Command::Register | Command::Health => {}
    }
}
