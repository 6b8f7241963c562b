use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::modules::{
    error::SubmissionError,
    location_acquirer::LocationAcquirer,
    media_acquirer::MediaAcquirer,
    navigator::Navigator,
    notifier::{NoticeKind, Notifier},
    transport::AttendanceTransport,
};

pub mod outcome;
pub mod request;

use outcome::SubmissionOutcome;
use request::{CourseSelection, SubmissionRequest};

pub const TITLE_WARNING: &str = "Peringatan";
pub const TITLE_ERROR: &str = "Error";
pub const TITLE_SUCCESS: &str = "Berhasil!";
pub const TITLE_INFO: &str = "Info";
pub const TITLE_FAILED: &str = "Gagal!";
pub const TITLE_PROCESSING: &str = "Memproses...";

pub const MSG_NO_COURSE: &str = "Anda harus memilih mata kuliah terlebih dahulu.";
pub const MSG_PROCESSING: &str = "Mohon tunggu, sedang mengambil lokasi dan mengenali wajah Anda.";
pub const MSG_NO_LOCATION: &str =
    "Tidak dapat mengambil lokasi. Pastikan GPS atau layanan lokasi aktif dan berikan izin.";
pub const MSG_NO_FRAME: &str = "Tidak dapat mengambil gambar dari kamera.";
pub const MSG_NO_CAMERA: &str = "Tidak dapat mengakses kamera. Pastikan Anda memberikan izin.";
pub const MSG_TRANSPORT: &str = "Terjadi kesalahan saat berkomunikasi dengan server.";
pub const MSG_IN_FLIGHT: &str = "Presensi sedang diproses, mohon tunggu.";

#[derive(Debug, Clone)]
pub struct CoordinatorOptions {
    // Value meaning "nothing selected" in the course list
    pub placeholder: String,
    // Where to send the user after a recorded attendance
    pub records_destination: String,
    // Refuse a new attempt while one is still running
    pub reject_overlapping: bool,
}

// Drives one submission attempt from validation to the final notice.
// Holds no state between attempts apart from the optional in-flight flag
pub struct SubmissionCoordinator<M, L, T, N, V> {
    media: M,
    location: L,
    transport: T,
    notifier: N,
    navigator: V,
    options: CoordinatorOptions,
    in_flight: AtomicBool,
}

// Clears the in-flight flag on every exit path
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<M, L, T, N, V> SubmissionCoordinator<M, L, T, N, V>
where
    M: MediaAcquirer,
    L: LocationAcquirer,
    T: AttendanceTransport,
    N: Notifier,
    V: Navigator,
{
    pub fn new(media: M, location: L, transport: T, notifier: N, navigator: V, options: CoordinatorOptions) -> Self {
        Self { media, location, transport, notifier, navigator, options, in_flight: AtomicBool::new(false) }
    }

    // One attempt: validate, fix, frame, send, classify. Every failure ends the
    // attempt after exactly one notice, nothing is retried
    pub async fn submit(&self, course: &str) -> Result<String, SubmissionError> {
        let attempt_id = Uuid::new_v4();

        // Precondition, checked before anything is shown or acquired
        let course = match CourseSelection::parse(course, &self.options.placeholder) {
            Some(course) => course,
            None => {
                warn!("[{}] No course selected", attempt_id);
                self.notifier.show_result(NoticeKind::Warning, TITLE_WARNING, MSG_NO_COURSE).await;
                return Err(SubmissionError::ValidationWarning(MSG_NO_COURSE.to_string()));
            }
        };

        let _guard = if self.options.reject_overlapping {
            if self.in_flight.swap(true, Ordering::AcqRel) {
                warn!("[{}] Rejected, another attempt is in flight", attempt_id);
                self.notifier.show_result(NoticeKind::Info, TITLE_INFO, MSG_IN_FLIGHT).await;
                return Err(SubmissionError::AttemptInFlight);
            }
            Some(InFlightGuard(&self.in_flight))
        } else {
            None
        };

        info!("[{}] Submitting attendance for course {}", attempt_id, course.as_str());
        self.notifier.show_blocking(TITLE_PROCESSING, MSG_PROCESSING);

        // 1. Location first
        let fix = match self.location.get_fix().await {
            Ok(fix) => fix,
            Err(e) => {
                error!("[{}] Error getting location: {}", attempt_id, e);
                self.notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_NO_LOCATION).await;
                return Err(SubmissionError::LocationUnavailable(e));
            }
        };

        // 2. Whatever the video surface shows right now
        let frame = match self.media.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("[{}] Error capturing frame: {}", attempt_id, e);
                self.notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_NO_FRAME).await;
                return Err(SubmissionError::MediaUnavailable(e));
            }
        };
        debug!("[{}] Frame captured ({} bytes encoded)", attempt_id, frame.as_str().len());

        // 3. Send to the server
        let request = SubmissionRequest::assemble(frame, fix, course);
        let reply = match self.transport.submit_attendance(request).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("[{}] Error communicating with server: {}", attempt_id, e);
                self.notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_TRANSPORT).await;
                return Err(SubmissionError::TransportFailure(e));
            }
        };

        // 4. Present the server's verdict
        let outcome = SubmissionOutcome::classify(reply);
        info!("[{}] Server outcome: {:?}", attempt_id, outcome);
        match &outcome {
            SubmissionOutcome::Success(msg) => {
                self.notifier.show_result(NoticeKind::Success, TITLE_SUCCESS, msg).await;
                self.navigator.navigate(&self.options.records_destination);
            }
            SubmissionOutcome::Warning(msg) => {
                self.notifier.show_result(NoticeKind::Info, TITLE_INFO, msg).await;
            }
            SubmissionOutcome::Error(msg) => {
                self.notifier.show_result(NoticeKind::Error, TITLE_FAILED, msg).await;
            }
        }
        outcome.into_result()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::modules::{
        coordinator::{outcome::ServerReply, request::{CaptureFrame, GeoFix}},
        error::{LocationError, LocationErrorKind, MediaError, TransportError},
    };
    use std::sync::{Arc, Mutex};
    use tokio::time::{sleep, Duration};

    // Shared record of everything the fakes saw, in order
    pub type Journal = Arc<Mutex<Vec<String>>>;

    fn log(journal: &Journal, entry: String) {
        journal.lock().unwrap().push(entry);
    }

    pub struct FakeMedia {
        pub journal: Journal,
        pub fail: bool,
    }

    impl MediaAcquirer for FakeMedia {
        fn capture_frame(&self) -> Result<CaptureFrame, MediaError> {
            log(&self.journal, "capture".to_string());
            if self.fail {
                return Err(MediaError::EncodingError("corrupt surface".to_string()));
            }
            Ok(CaptureFrame::from_data_uri("data:image/jpeg;base64,/9j/4AAQ".to_string()))
        }
    }

    pub struct FakeLocation {
        journal: Journal,
        result: Result<(f64, f64), LocationErrorKind>,
        delay: Duration,
    }

    impl LocationAcquirer for FakeLocation {
        async fn get_fix(&self) -> Result<GeoFix, LocationError> {
            log(&self.journal, "fix".to_string());
            sleep(self.delay).await;
            match self.result {
                Ok((lat, lon)) => GeoFix::new(lat, lon),
                Err(kind) => Err(LocationError::new(kind, "User denied Geolocation")),
            }
        }
    }

    pub struct FakeTransport {
        journal: Journal,
        reply: Result<(&'static str, &'static str), ()>,
        sent: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    impl AttendanceTransport for FakeTransport {
        async fn submit_attendance(&self, request: SubmissionRequest) -> Result<ServerReply, TransportError> {
            log(&self.journal, "send".to_string());
            self.sent.lock().unwrap().push(serde_json::to_value(&request).unwrap());
            match self.reply {
                Ok((status, message)) => Ok(ServerReply { status: status.to_string(), message: message.to_string() }),
                Err(()) => Err(TransportError::RequestError("connection refused".to_string())),
            }
        }
    }

    pub struct RecordingNotifier {
        pub journal: Journal,
    }

    impl Notifier for RecordingNotifier {
        fn show_blocking(&self, title: &str, _text: &str) {
            log(&self.journal, format!("blocking:{}", title));
        }

        async fn show_result(&self, kind: NoticeKind, title: &str, message: &str) {
            log(&self.journal, format!("result:{:?}:{}:{}", kind, title, message));
        }
    }

    struct RecordingNavigator {
        journal: Journal,
    }

    impl Navigator for RecordingNavigator {
        fn navigate(&self, destination: &str) {
            log(&self.journal, format!("navigate:{}", destination));
        }
    }

    struct Harness {
        journal: Journal,
        sent: Arc<Mutex<Vec<serde_json::Value>>>,
        coordinator: SubmissionCoordinator<FakeMedia, FakeLocation, FakeTransport, RecordingNotifier, RecordingNavigator>,
    }

    struct Setup {
        fix: Result<(f64, f64), LocationErrorKind>,
        fix_delay: Duration,
        media_fails: bool,
        reply: Result<(&'static str, &'static str), ()>,
        reject_overlapping: bool,
    }

    impl Default for Setup {
        fn default() -> Self {
            Self {
                fix: Ok((-6.2, 106.8)),
                fix_delay: Duration::ZERO,
                media_fails: false,
                reply: Ok(("success", "Hadir tercatat")),
                reject_overlapping: false,
            }
        }
    }

    fn harness(setup: Setup) -> Harness {
        let journal: Journal = Arc::new(Mutex::new(Vec::new()));
        let sent = Arc::new(Mutex::new(Vec::new()));
        let coordinator = SubmissionCoordinator::new(
            FakeMedia { journal: journal.clone(), fail: setup.media_fails },
            FakeLocation { journal: journal.clone(), result: setup.fix, delay: setup.fix_delay },
            FakeTransport { journal: journal.clone(), reply: setup.reply, sent: sent.clone() },
            RecordingNotifier { journal: journal.clone() },
            RecordingNavigator { journal: journal.clone() },
            CoordinatorOptions {
                placeholder: "0".to_string(),
                records_destination: "/records".to_string(),
                reject_overlapping: setup.reject_overlapping,
            },
        );
        Harness { journal, sent, coordinator }
    }

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    fn count(journal: &Journal, prefix: &str) -> usize {
        entries(journal).iter().filter(|e| e.starts_with(prefix)).count()
    }

    #[tokio::test]
    async fn test_success_shows_message_then_navigates() {
        let h = harness(Setup::default());

        let result = h.coordinator.submit("CS101").await;
        assert_eq!(result, Ok("Hadir tercatat".to_string()));
        assert_eq!(
            entries(&h.journal),
            vec![
                "blocking:Memproses...",
                "fix",
                "capture",
                "send",
                "result:Success:Berhasil!:Hadir tercatat",
                "navigate:/records",
            ]
        );

        let sent = h.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["matakuliah_id"], "CS101");
        assert_eq!(sent[0]["location"], serde_json::json!({ "latitude": -6.2, "longitude": 106.8 }));
        assert_eq!(sent[0]["image_data"], "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[tokio::test]
    async fn test_placeholder_or_empty_course_only_warns() {
        for course in ["0", "", "   "] {
            let h = harness(Setup::default());

            let result = h.coordinator.submit(course).await;
            assert!(matches!(result, Err(SubmissionError::ValidationWarning(_))));
            assert_eq!(
                entries(&h.journal),
                vec![format!("result:Warning:Peringatan:{}", MSG_NO_COURSE)]
            );
            assert!(h.sent.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_location_denied_stops_before_capture_and_network() {
        let h = harness(Setup { fix: Err(LocationErrorKind::PermissionDenied), ..Setup::default() });

        let result = h.coordinator.submit("CS101").await;
        match result {
            Err(SubmissionError::LocationUnavailable(e)) => assert_eq!(e.kind, LocationErrorKind::PermissionDenied),
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(
            entries(&h.journal),
            vec![
                "blocking:Memproses...".to_string(),
                "fix".to_string(),
                format!("result:Error:Error:{}", MSG_NO_LOCATION),
            ]
        );
        assert_eq!(count(&h.journal, "send"), 0);
    }

    #[tokio::test]
    async fn test_each_location_failure_kind_is_one_error() {
        for kind in [LocationErrorKind::PositionUnavailable, LocationErrorKind::Timeout] {
            let h = harness(Setup { fix: Err(kind), ..Setup::default() });
            assert!(matches!(
                h.coordinator.submit("CS101").await,
                Err(SubmissionError::LocationUnavailable(_))
            ));
            assert_eq!(count(&h.journal, "result:"), 1);
            assert_eq!(count(&h.journal, "send"), 0);
        }
    }

    #[tokio::test]
    async fn test_invalid_fix_is_location_unavailable() {
        let h = harness(Setup { fix: Ok((f64::NAN, 106.8)), ..Setup::default() });
        assert!(matches!(
            h.coordinator.submit("CS101").await,
            Err(SubmissionError::LocationUnavailable(_))
        ));
        assert_eq!(count(&h.journal, "send"), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_one_error_without_navigation() {
        let h = harness(Setup { reply: Err(()), ..Setup::default() });

        let result = h.coordinator.submit("CS101").await;
        assert!(matches!(result, Err(SubmissionError::TransportFailure(_))));
        assert_eq!(count(&h.journal, "send"), 1);
        assert_eq!(count(&h.journal, "result:"), 1);
        assert_eq!(count(&h.journal, &format!("result:Error:Error:{}", MSG_TRANSPORT)), 1);
        assert_eq!(count(&h.journal, "navigate"), 0);
    }

    #[tokio::test]
    async fn test_warning_reply_is_info_without_navigation() {
        let h = harness(Setup {
            reply: Ok(("warning", "Anda sudah melakukan presensi hari ini")),
            ..Setup::default()
        });

        let result = h.coordinator.submit("CS101").await;
        assert_eq!(
            result,
            Err(SubmissionError::ServerWarning("Anda sudah melakukan presensi hari ini".to_string()))
        );
        assert_eq!(count(&h.journal, "result:Info:Info:Anda sudah melakukan presensi hari ini"), 1);
        assert_eq!(count(&h.journal, "result:"), 1);
        assert_eq!(count(&h.journal, "navigate"), 0);
    }

    #[tokio::test]
    async fn test_error_reply_shows_server_message() {
        let h = harness(Setup { reply: Ok(("error", "Wajah tidak dikenali")), ..Setup::default() });

        let result = h.coordinator.submit("CS101").await;
        assert_eq!(result, Err(SubmissionError::ServerRejected("Wajah tidak dikenali".to_string())));
        assert_eq!(
            entries(&h.journal).last().unwrap(),
            "result:Error:Gagal!:Wajah tidak dikenali"
        );
        assert_eq!(count(&h.journal, "navigate"), 0);
    }

    #[tokio::test]
    async fn test_unrecognized_status_is_error() {
        for status in ["", "ok", "Success", "pending"] {
            let h = harness(Setup { reply: Ok((status, "?")), ..Setup::default() });
            assert!(matches!(
                h.coordinator.submit("CS101").await,
                Err(SubmissionError::ServerRejected(_))
            ));
            assert_eq!(count(&h.journal, "result:Error:Gagal!"), 1);
            assert_eq!(count(&h.journal, "navigate"), 0);
        }
    }

    #[tokio::test]
    async fn test_frame_failure_stops_before_network() {
        let h = harness(Setup { media_fails: true, ..Setup::default() });

        assert!(matches!(
            h.coordinator.submit("CS101").await,
            Err(SubmissionError::MediaUnavailable(_))
        ));
        assert_eq!(count(&h.journal, "send"), 0);
        assert_eq!(count(&h.journal, &format!("result:Error:Error:{}", MSG_NO_FRAME)), 1);
    }

    #[tokio::test]
    async fn test_overlapping_attempts_run_independently_by_default() {
        let h = harness(Setup { fix_delay: Duration::from_millis(30), ..Setup::default() });

        let (first, second) = tokio::join!(h.coordinator.submit("CS101"), h.coordinator.submit("CS102"));
        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(count(&h.journal, "send"), 2);
        assert_eq!(count(&h.journal, "navigate"), 2);
    }

    #[tokio::test]
    async fn test_overlap_guard_rejects_second_attempt() {
        let h = harness(Setup {
            fix_delay: Duration::from_millis(30),
            reject_overlapping: true,
            ..Setup::default()
        });

        let (first, second) = tokio::join!(h.coordinator.submit("CS101"), h.coordinator.submit("CS102"));
        assert!(first.is_ok());
        assert_eq!(second, Err(SubmissionError::AttemptInFlight));
        assert_eq!(count(&h.journal, "send"), 1);
        assert_eq!(count(&h.journal, &format!("result:Info:Info:{}", MSG_IN_FLIGHT)), 1);

        // Flag is cleared once the first attempt is over
        assert!(h.coordinator.submit("CS103").await.is_ok());
        assert_eq!(count(&h.journal, "send"), 2);
    }

    #[tokio::test]
    async fn test_guard_released_after_failed_attempt() {
        let h = harness(Setup {
            fix: Err(LocationErrorKind::Timeout),
            reject_overlapping: true,
            ..Setup::default()
        });

        assert!(h.coordinator.submit("CS101").await.is_err());
        assert!(matches!(
            h.coordinator.submit("CS101").await,
            Err(SubmissionError::LocationUnavailable(_))
        ));
    }
}
