use log::{error, info};

use crate::modules::{
    coordinator::{
        MSG_NO_FRAME, MSG_TRANSPORT, TITLE_ERROR, TITLE_FAILED, TITLE_PROCESSING, TITLE_SUCCESS,
    },
    error::SubmissionError,
    media_acquirer::MediaAcquirer,
    notifier::{NoticeKind, Notifier},
    transport::{RegistrationRequest, RegistrationTransport},
};

const MSG_REGISTERING: &str = "Mohon tunggu, sedang mendaftarkan wajah Anda.";

// Enrols the face currently on the video surface. Same single-shot contract
// as an attendance attempt: one notice per outcome, no retry
pub async fn register_face<M, T, N>(media: &M, transport: &T, notifier: &N) -> Result<String, SubmissionError>
where
    M: MediaAcquirer,
    T: RegistrationTransport,
    N: Notifier,
{
    notifier.show_blocking(TITLE_PROCESSING, MSG_REGISTERING);

    let frame = match media.capture_frame() {
        Ok(frame) => frame,
        Err(e) => {
            error!("Error capturing frame for registration: {}", e);
            notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_NO_FRAME).await;
            return Err(SubmissionError::MediaUnavailable(e));
        }
    };

    let reply = match transport.register_face(RegistrationRequest { image: frame.into_inner() }).await {
        Ok(reply) => reply,
        Err(e) => {
            error!("Error communicating with server: {}", e);
            notifier.show_result(NoticeKind::Error, TITLE_ERROR, MSG_TRANSPORT).await;
            return Err(SubmissionError::TransportFailure(e));
        }
    };

    info!("Registration reply: success={}", reply.success);
    if reply.success {
        notifier.show_result(NoticeKind::Success, TITLE_SUCCESS, &reply.message).await;
        Ok(reply.message)
    } else {
        notifier.show_result(NoticeKind::Error, TITLE_FAILED, &reply.message).await;
        Err(SubmissionError::ServerRejected(reply.message))
    }
}
