use log::{debug, info};
use serde::Deserialize;
use std::{future::Future, io::ErrorKind};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::Mutex,
    time::{timeout, Duration},
};

use crate::modules::{
    coordinator::request::GeoFix,
    error::{LocationError, LocationErrorKind},
};

// One-shot position requests against the host's positioning service.
// No retry and no extra timeout, failures go straight back to the caller
pub trait LocationAcquirer: Send + Sync {
    fn get_fix(&self) -> impl Future<Output = Result<GeoFix, LocationError>> + Send;
}

// gpsd watch command, enables JSON reports on the connection
const WATCH_COMMAND: &[u8] = b"?WATCH={\"enable\":true,\"json\":true};\n";

// Subset of a gpsd report line. Only TPV reports carry a position
#[derive(Debug, Deserialize)]
struct GpsdReport {
    class: String,
    #[serde(default)]
    mode: u8,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

// Positioning through a gpsd daemon
pub struct GpsdLocation {

    // host:port of the daemon
    address: String,

    // gpsd's own patience, the only timeout applied to a fix request
    host_timeout: Duration,

    // Serializes requests, at most one is in flight
    in_flight: Mutex<()>,
}

impl GpsdLocation {
    pub fn new(address: impl Into<String>, host_timeout: Duration) -> Self {
        Self { address: address.into(), host_timeout, in_flight: Mutex::new(()) }
    }

    async fn read_fix(&self) -> Result<GeoFix, LocationError> {
        let stream = TcpStream::connect(&self.address).await.map_err(|e| {
            let kind = match e.kind() {
                ErrorKind::PermissionDenied => LocationErrorKind::PermissionDenied,
                _ => LocationErrorKind::PositionUnavailable,
            };
            LocationError::new(kind, format!("cannot reach gpsd at {}: {}", self.address, e))
        })?;

        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(WATCH_COMMAND)
            .await
            .map_err(|e| LocationError::new(LocationErrorKind::PositionUnavailable, e.to_string()))?;

        let mut lines = BufReader::new(reader).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    return Err(LocationError::new(
                        LocationErrorKind::PositionUnavailable,
                        "gpsd closed the connection before reporting a fix",
                    ))
                }
                Err(e) => return Err(LocationError::new(LocationErrorKind::PositionUnavailable, e.to_string())),
            };

            let report: GpsdReport = match serde_json::from_str(&line) {
                Ok(report) => report,
                Err(e) => {
                    debug!("Ignoring unparseable gpsd line: {}", e);
                    continue;
                }
            };

            // Mode 2 is a 2D fix, 3 a 3D fix. Anything lower has no position yet
            if report.class != "TPV" || report.mode < 2 {
                continue;
            }
            if let (Some(lat), Some(lon)) = (report.lat, report.lon) {
                return GeoFix::new(lat, lon);
            }
        }
    }
}

impl LocationAcquirer for GpsdLocation {
    async fn get_fix(&self) -> Result<GeoFix, LocationError> {
        let _guard = self.in_flight.lock().await;
        debug!("Requesting fix from gpsd at {}", self.address);

        match timeout(self.host_timeout, self.read_fix()).await {
            Ok(result) => {
                if let Ok(fix) = &result {
                    info!("Got fix ({}, {})", fix.latitude(), fix.longitude());
                }
                result
            }
            Err(_) => Err(LocationError::new(
                LocationErrorKind::Timeout,
                format!("no fix from gpsd within {:?}", self.host_timeout),
            )),
        }
    }
}

// Static position for hosts at a known site
pub struct FixedLocation {
    position: Option<(f64, f64)>,
}

impl FixedLocation {
    pub fn new(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let position = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };
        Self { position }
    }
}

impl LocationAcquirer for FixedLocation {
    async fn get_fix(&self) -> Result<GeoFix, LocationError> {
        match self.position {
            Some((lat, lon)) => GeoFix::new(lat, lon),
            None => Err(LocationError::new(
                LocationErrorKind::PositionUnavailable,
                "no fixed position configured",
            )),
        }
    }
}

// Provider picked from configuration at start-up
pub enum HostLocation {
    Gpsd(GpsdLocation),
    Fixed(FixedLocation),
}

impl LocationAcquirer for HostLocation {
    async fn get_fix(&self) -> Result<GeoFix, LocationError> {
        match self {
            HostLocation::Gpsd(gpsd) => gpsd.get_fix().await,
            HostLocation::Fixed(fixed) => fixed.get_fix().await,
        }
    }
}
