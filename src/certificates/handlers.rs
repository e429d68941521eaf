use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{CertificateView, PeriodResponse, SubmitResponse},
    photo::PhotoUpload,
    services::{self, SubmissionForm},
};
use crate::{
    auth::extractors::PensionerUser,
    db::Period,
    error::{AppError, AppResult},
    state::AppState,
};

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/certificates/period", get(current_period))
        .route("/certificates/:id", get(get_certificate))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/certificates", get(list_certificates).post(submit_certificate))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn current_period(
    State(state): State<AppState>,
    PensionerUser(user): PensionerUser,
) -> AppResult<Json<PeriodResponse>> {
    let period = Period::current();
    let submitted = services::submitted_for(&state, user.id, period).await?;
    Ok(Json(PeriodResponse::new(period, submitted)))
}

#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list_certificates(
    State(state): State<AppState>,
    PensionerUser(user): PensionerUser,
) -> AppResult<Json<Vec<CertificateView>>> {
    let items = services::history(&state, user.id)
        .await?
        .into_iter()
        .map(CertificateView::from)
        .collect();
    Ok(Json(items))
}

#[instrument(skip_all, fields(user_id = %user.id, %id))]
pub async fn get_certificate(
    State(state): State<AppState>,
    PensionerUser(user): PensionerUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CertificateView>> {
    let cert = services::own_certificate(&state, user.id, id).await?;
    Ok(Json(cert.into()))
}

async fn read_form(mut mp: Multipart) -> AppResult<SubmissionForm> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        let status = e.status();
        warn!(error = %e, %status, "unreadable multipart body");
        AppError::Body(status, e.body_text())
    };

    let mut form = SubmissionForm::default();
    while let Some(field) = mp.next_field().await.map_err(bad)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "witness_name" => form.witness_name = field.text().await.map_err(bad)?,
            "witness_phone" => form.witness_phone = field.text().await.map_err(bad)?,
            "witness_relationship" => {
                form.witness_relationship = field.text().await.map_err(bad)?
            }
            "photo" | "certificate_photo" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await.map_err(bad)?;
                form.photo = Some(PhotoUpload {
                    file_name,
                    content_type,
                    body,
                });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /certificates (multipart): witness_name, witness_phone,
/// witness_relationship, optional photo file.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn submit_certificate(
    State(state): State<AppState>,
    PensionerUser(user): PensionerUser,
    mp: Multipart,
) -> AppResult<(StatusCode, HeaderMap, Json<SubmitResponse>)> {
    let form = read_form(mp).await?;
    let period = Period::current();
    let cert = services::submit_certificate(&state, &user, period, form).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/certificates/{}", cert.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(SubmitResponse {
            message: services::confirmation(period),
            certificate: cert.into(),
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, extract::FromRequest, http::Request};

    use super::*;
    use crate::auth::{dto::RegisterRequest, services::register};
    use crate::state::fake::FakeStorage;

    const BOUNDARY: &str = "lifecert-boundary";

    fn text_part(name: &str, value: &str) -> String {
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
    }

    fn multipart_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/certificates")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn submission_body(photo_field: &str) -> Vec<u8> {
        let mut body = String::new();
        body.push_str(&text_part("witness_name", "Jane Doe"));
        body.push_str(&text_part("witness_phone", "555-0100"));
        body.push_str(&text_part("witness_relationship", "Neighbor"));
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{photo_field}\"; \
             filename=\"scan.png\"\r\nContent-Type: image/png\r\n\r\n"
        ));
        let mut bytes = body.into_bytes();
        bytes.extend_from_slice(b"\x89PNG\r\n");
        bytes.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        bytes
    }

    async fn submit_multipart(photo_field: &str) {
        let storage = Arc::new(FakeStorage::default());
        let state = AppState::fake_with(storage.clone());
        let user = register(&state, RegisterRequest::sample("mp@example.com"))
            .await
            .unwrap()
            .user;

        let mp = Multipart::from_request(multipart_request(submission_body(photo_field)), &state)
            .await
            .unwrap();
        let (status, headers, Json(resp)) =
            submit_certificate(State(state.clone()), PensionerUser(user), mp)
                .await
                .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let cert = &resp.certificate.certificate;
        assert_eq!(
            headers.get(header::LOCATION).unwrap(),
            format!("/api/v1/certificates/{}", cert.id).as_str()
        );
        assert_eq!(cert.witness_name, "Jane Doe");
        assert_eq!(cert.witness_relationship, "Neighbor");
        let url = cert.certificate_photo_url.as_deref().unwrap();
        assert!(url.ends_with(".png"), "{url}");
        assert_eq!(storage.objects.lock().unwrap().len(), 1);
        assert!(resp.message.starts_with("Your life certificate for "));
    }

    #[tokio::test]
    async fn multipart_submission_accepts_photo_field() {
        submit_multipart("photo").await;
    }

    #[tokio::test]
    async fn multipart_submission_accepts_certificate_photo_field() {
        submit_multipart("certificate_photo").await;
    }

    #[tokio::test]
    async fn oversized_body_is_payload_too_large() {
        let state = AppState::fake();
        // past the 2 MiB default applied when no body limit layer is present
        let mut body = text_part("witness_name", "Jane Doe").into_bytes();
        body.extend(std::iter::repeat(b'a').take(3 * 1024 * 1024));
        let mp = Multipart::from_request(multipart_request(body), &state)
            .await
            .unwrap();

        let err = read_form(mp).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn truncated_body_is_bad_request() {
        let state = AppState::fake();
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"witness_name\"\r\n\r\nJane"
        );
        let mp = Multipart::from_request(multipart_request(body.into_bytes()), &state)
            .await
            .unwrap();

        let err = read_form(mp).await.err().unwrap();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_handler_wraps_badges() {
        let state = AppState::fake();
        let user = register(&state, RegisterRequest::sample("h@example.com"))
            .await
            .unwrap()
            .user;
        services::submit_certificate(
            &state,
            &user,
            Period::new(6, 2024).unwrap(),
            SubmissionForm {
                witness_name: "Jane Doe".into(),
                witness_phone: "555".into(),
                witness_relationship: "Friend".into(),
                photo: None,
            },
        )
        .await
        .unwrap();

        let Json(items) = list_certificates(State(state.clone()), PensionerUser(user))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);

        let json = serde_json::to_value(&items[0]).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["month_name"], "June");
        assert_eq!(json["badge"]["color"], "gray");
        assert_eq!(json["badge"]["label"], "PENDING");
        assert!(json["certificate_photo_url"].is_null());
    }

    #[tokio::test]
    async fn period_handler_reports_not_submitted() {
        let state = AppState::fake();
        let user = register(&state, RegisterRequest::sample("p@example.com"))
            .await
            .unwrap()
            .user;
        let Json(p) = current_period(State(state), PensionerUser(user)).await.unwrap();
        assert!(!p.submitted);
        assert!((1..=12).contains(&p.month));
    }
}
