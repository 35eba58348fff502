use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Instant;

use crate::models::QrAction;
use crate::resolver::{DownloadFile, FailureKind, ImmediateAction, Navigator};

pub const TIMING_HEADER: &str = "x-scanroute-timing-ms";

/// Turns resolution outcomes into HTTP responses.
///
/// Protocol URIs (`tel:`, `mailto:`, `sms:`) and new-context opens are issued as redirects too;
/// the client platform decides which handler takes them.
pub struct HttpNavigator {
    redirect_status: StatusCode,
    started: Instant,
}

impl HttpNavigator {
    pub fn new(redirect_status: StatusCode, started: Instant) -> Self {
        Self {
            redirect_status,
            started,
        }
    }

    fn location(&self, target: &str) -> Response {
        match HeaderValue::from_str(target) {
            Ok(value) => self.timed((self.redirect_status, [(header::LOCATION, value)]).into_response()),
            Err(_) => {
                tracing::warn!(destination = target, "destination is not a valid Location header value");
                self.fail(&FailureKind::NoDestination)
            }
        }
    }

    fn timed(&self, mut response: Response) -> Response {
        let elapsed = self.started.elapsed().as_millis() as u64;
        response
            .headers_mut()
            .insert(TIMING_HEADER, HeaderValue::from(elapsed));
        response
    }
}

impl Navigator for HttpNavigator {
    type Output = Response;

    fn redirect(&self, url: &str) -> Response {
        self.location(url)
    }

    fn invoke(&self, action: &ImmediateAction) -> Response {
        self.location(&action.uri)
    }

    fn open_in_new_context(&self, url: &str) -> Response {
        self.location(url)
    }

    fn download(&self, file: &DownloadFile) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", file.filename.replace('"', ""));
        let response = (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, file.content_type.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            file.body.clone(),
        )
            .into_response();
        self.timed(response)
    }

    fn show_text(&self, text: &str) -> Response {
        let response = (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            text.to_string(),
        )
            .into_response();
        self.timed(response)
    }

    fn show_menu(&self, actions: &[QrAction]) -> Response {
        self.timed(Json(json!({ "actions": actions })).into_response())
    }

    fn fail(&self, kind: &FailureKind) -> Response {
        let status = match kind {
            FailureKind::NotFoundOrInactive | FailureKind::NoDestination => StatusCode::NOT_FOUND,
            FailureKind::InvalidLocation
            | FailureKind::UnknownAction(_)
            | FailureKind::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        (status, kind.user_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ImmediateKind;

    fn navigator() -> HttpNavigator {
        HttpNavigator::new(StatusCode::FOUND, Instant::now())
    }

    #[test]
    fn test_redirect_uses_configured_status() {
        let response = HttpNavigator::new(StatusCode::TEMPORARY_REDIRECT, Instant::now())
            .redirect("https://example.com");
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://example.com");
        assert!(response.headers().contains_key(TIMING_HEADER));
    }

    #[test]
    fn test_invoke_points_at_protocol_uri() {
        let response = navigator().invoke(&ImmediateAction {
            kind: ImmediateKind::Email,
            uri: "mailto:a@b.co".to_string(),
        });
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "mailto:a@b.co");
    }

    #[test]
    fn test_download_is_an_attachment() {
        let response = navigator().download(&DownloadFile::vcard("jo", "BEGIN:VCARD".to_string()));
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"jo.vcf\""
        );
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/vcard; charset=utf-8"
        );
    }

    #[test]
    fn test_failure_statuses() {
        let nav = navigator();
        assert_eq!(
            nav.fail(&FailureKind::NotFoundOrInactive).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(nav.fail(&FailureKind::NoDestination).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            nav.fail(&FailureKind::MissingField("email")).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_unencodable_destination_fails() {
        let response = navigator().redirect("https://example.com/\nbad");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
