use base64::{Engine, engine::general_purpose};
use image::{codecs::jpeg::JpegEncoder, imageops, RgbImage};
use log::{debug, info, warn};
use std::{
    io::ErrorKind,
    path::PathBuf,
    sync::{Arc, Mutex, RwLock},
    time::SystemTime,
};
use tokio::{
    task::{self, JoinHandle},
    time::{self, Duration},
};

use crate::modules::{
    coordinator::request::CaptureFrame,
    error::MediaError,
};

// Upper bound of the playback repaint rate
pub const MAX_FRAME_RATE: u32 = 120;

// Anything the coordinator can pull a still from
pub trait MediaAcquirer: Send + Sync {
    // Copies whatever is on the surface right now. No buffering, no frame queue
    fn capture_frame(&self) -> Result<CaptureFrame, MediaError>;
}

// Camera stream as seen by the playback task
pub trait FrameSource: Send + Sync {
    // Requests access to the camera. Called once per session
    fn open(&self) -> Result<(), MediaError>;

    // Latest frame of the open stream, None when nothing new has arrived
    fn next_frame(&self) -> Result<Option<RgbImage>, MediaError>;
}

// The renderable surface the live stream is bound to.
// Clones share the same pixels
#[derive(Clone)]
pub struct VideoSurface {

    // Last painted frame, black until the camera delivers one
    pixels: Arc<RwLock<RgbImage>>,

    // Size of the offscreen canvas a capture is drawn into
    width: u32,
    height: u32,

    jpeg_quality: u8,
}

impl VideoSurface {
    pub fn new(width: u32, height: u32, jpeg_quality: u8) -> Self {
        Self {
            pixels: Arc::new(RwLock::new(RgbImage::new(width, height))),
            width,
            height,
            jpeg_quality,
        }
    }

    // Replace the visible frame
    pub fn paint(&self, frame: RgbImage) {
        match self.pixels.write() {
            Ok(mut pixels) => *pixels = frame,
            Err(e) => warn!("Video surface lock poisoned, frame dropped: {}", e),
        }
    }
}

impl MediaAcquirer for VideoSurface {
    fn capture_frame(&self) -> Result<CaptureFrame, MediaError> {
        // Draw the visible frame onto a canvas of the configured size
        let canvas = {
            let pixels = self.pixels
                .read()
                .map_err(|e| MediaError::EncodingError(e.to_string()))?;
            if pixels.dimensions() == (self.width, self.height) {
                pixels.clone()
            } else {
                imageops::resize(&*pixels, self.width, self.height, imageops::FilterType::Triangle)
            }
        }; // Release the read lock before encoding

        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, self.jpeg_quality)
            .encode_image(&canvas)
            .map_err(|e| MediaError::EncodingError(e.to_string()))?;

        let data_uri = format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(&jpeg));
        debug!("Captured {}x{} frame ({} bytes)", self.width, self.height, jpeg.len());
        Ok(CaptureFrame::from_data_uri(data_uri))
    }
}

// Requests the camera and, on grant, keeps the surface painted with its stream.
// Returns the playback task; on denial the surface simply stays blank
pub fn start_camera(
    source: Arc<dyn FrameSource>,
    surface: VideoSurface,
    frame_rate: u32,
) -> Result<JoinHandle<()>, MediaError> {
    source.open()?;

    // First frame is painted before returning, so a capture right after start-up
    // already sees the camera
    match source.next_frame() {
        Ok(Some(frame)) => surface.paint(frame),
        Ok(None) => {},
        Err(e) => debug!("No first frame yet: {}", e),
    }

    let frame_rate = frame_rate.clamp(1, MAX_FRAME_RATE);
    info!("Camera access granted, starting playback at {} fps", frame_rate);

    let period = Duration::from_secs_f64(1.0 / f64::from(frame_rate));
    Ok(tokio::spawn(async move {
        let mut ticker = time::interval(period);
        loop {
            ticker.tick().await;

            // Decoding is blocking work, keep it off the runtime threads
            let frame_source = source.clone();
            match task::spawn_blocking(move || frame_source.next_frame()).await {
                Ok(Ok(Some(frame))) => surface.paint(frame),
                Ok(Ok(None)) => {},
                Ok(Err(e)) => debug!("Skipping frame: {}", e),
                Err(e) => {
                    warn!("Playback task failed: {}", e);
                    return;
                }
            }
        }
    }))
}

// Snapshot file kept fresh by an external capture tool (e.g. a v4l2 grabber
// writing one JPEG per frame). Re-decoded whenever its mtime changes
pub struct StillImageSource {
    path: PathBuf,
    last_modified: Mutex<Option<SystemTime>>,
}

impl StillImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), last_modified: Mutex::new(None) }
    }
}

impl FrameSource for StillImageSource {
    fn open(&self) -> Result<(), MediaError> {
        match std::fs::metadata(&self.path) {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                Err(MediaError::AccessDenied(format!("{}: {}", self.path.display(), e)))
            }
            Err(e) => Err(MediaError::NoCamera(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn next_frame(&self) -> Result<Option<RgbImage>, MediaError> {
        let modified = std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| MediaError::NoCamera(e.to_string()))?;

        { // Skip the decode when the file has not changed
            let last = self.last_modified
                .lock()
                .map_err(|e| MediaError::EncodingError(e.to_string()))?;
            if *last == Some(modified) {
                return Ok(None);
            }
        }

        let frame = image::open(&self.path)
            .map_err(|e| MediaError::EncodingError(e.to_string()))?
            .to_rgb8();

        if let Ok(mut last) = self.last_modified.lock() {
            *last = Some(modified);
        }
        Ok(Some(frame))
    }
}

// Host without any camera capability
pub struct NoCameraSource;

impl FrameSource for NoCameraSource {
    fn open(&self) -> Result<(), MediaError> {
        Err(MediaError::NoCamera("no camera configured on this host".to_string()))
    }

    fn next_frame(&self) -> Result<Option<RgbImage>, MediaError> {
        Ok(None)
    }
}
