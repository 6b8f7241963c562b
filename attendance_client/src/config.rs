use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use crate::modules::{error::ConfigError, media_acquirer::MAX_FRAME_RATE};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub course: CourseConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    // Scheme, host and port of the attendance server, no trailing slash
    pub base_url: String,
    #[serde(default = "default_attendance_path")]
    pub attendance_path: String,
    #[serde(default = "default_records_path")]
    pub records_path: String,
    #[serde(default = "default_registration_path")]
    pub registration_path: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraSourceKind {
    // Snapshot file kept fresh by an external capture tool
    Still,
    // Host without a camera
    None,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_camera_source")]
    pub source: CameraSourceKind,
    #[serde(default)]
    pub snapshot_path: Option<String>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            source: default_camera_source(),
            snapshot_path: None,
            width: default_width(),
            height: default_height(),
            frame_rate: default_frame_rate(),
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationProviderKind {
    Gpsd,
    Fixed,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_location_provider")]
    pub provider: LocationProviderKind,
    #[serde(default = "default_gpsd_address")]
    pub gpsd_address: String,
    // Applied by the positioning host itself, never layered on by the coordinator
    #[serde(default = "default_host_timeout")]
    pub host_timeout_secs: u64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            provider: default_location_provider(),
            gpsd_address: default_gpsd_address(),
            host_timeout_secs: default_host_timeout(),
            latitude: None,
            longitude: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseConfig {
    // Value of the "nothing selected" entry of the course list
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for CourseConfig {
    fn default() -> Self {
        Self { placeholder: default_placeholder() }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CoordinatorConfig {
    #[serde(default)]
    pub reject_overlapping: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub auto_acknowledge: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

fn default_attendance_path() -> String { "/mark_attendance".to_string() }
fn default_records_path() -> String { "/records".to_string() }
fn default_registration_path() -> String { "/process_face_registration".to_string() }
fn default_health_path() -> String { "/health".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_camera_source() -> CameraSourceKind { CameraSourceKind::Still }
fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 480 }
fn default_frame_rate() -> u32 { 10 }
fn default_jpeg_quality() -> u8 { 92 }
fn default_location_provider() -> LocationProviderKind { LocationProviderKind::Gpsd }
fn default_gpsd_address() -> String { "127.0.0.1:2947".to_string() }
fn default_host_timeout() -> u64 { 30 }
fn default_placeholder() -> String { String::new() }
fn default_log_level() -> String { "info".to_string() }

pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let mut file = File::open(path).map_err(|e| ConfigError::ReadError(format!("{}: {}", path, e)))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| ConfigError::ReadError(format!("{}: {}", path, e)))?;

    let config: Config = toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.server.base_url.trim().is_empty() {
        return Err(ConfigError::InvalidValue("server.base_url must not be empty".to_string()));
    }
    if config.camera.width == 0 || config.camera.height == 0 {
        return Err(ConfigError::InvalidValue("camera.width and camera.height must be positive".to_string()));
    }
    if !(1..=MAX_FRAME_RATE).contains(&config.camera.frame_rate) {
        return Err(ConfigError::InvalidValue(format!(
            "camera.frame_rate must be within 1..={}",
            MAX_FRAME_RATE
        )));
    }
    if !(1..=100).contains(&config.camera.jpeg_quality) {
        return Err(ConfigError::InvalidValue("camera.jpeg_quality must be within 1..=100".to_string()));
    }
    if config.camera.source == CameraSourceKind::Still && config.camera.snapshot_path.is_none() {
        return Err(ConfigError::InvalidValue("camera.snapshot_path is required for the still source".to_string()));
    }
    Ok(())
}
