use crate::Rsvp;
use crate::dto::{RsvpRequest, RsvpResponse};
use crate::error::{INFRA_FAILURE_MESSAGE, RsvpError};
use crate::form::RsvpForm;
use crate::service::{Receipt, SUCCESS_MESSAGE};
use axum::Json;
use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, header};
use tracing::{error, info, warn};
use wed_derive::api_handler;
use wed_domain::constants::RSVP_TAG;
use wed_kernel::server::ApiState;

#[api_handler(
    post,
    path = "/rsvp",
    request_body(
        content = RsvpRequest,
        content_type = "application/json",
        description = "Structured submission. The flat legacy form is accepted as \
                       application/x-www-form-urlencoded."
    ),
    responses((status = OK, description = "Outcome of the submission", body = RsvpResponse)),
    tag = RSVP_TAG,
)]
pub(crate) async fn submit_rsvp(
    State(state): State<ApiState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Json<RsvpResponse> {
    let rsvp = match state.try_get_slice::<Rsvp>() {
        Ok(rsvp) => rsvp,
        Err(err) => {
            error!(error = %err, "RSVP slice is not registered");
            return Json(RsvpResponse::failure(INFRA_FAILURE_MESSAGE));
        },
    };

    let outcome = match decode(&headers, query.as_deref(), &body) {
        Ok(form) => rsvp.service.submit(&form).await,
        Err(err) => Err(err),
    };

    Json(respond(outcome))
}

/// JSON when the content type says so, the flat form otherwise. Query parameters are read
/// after the body, so body values win.
fn decode(headers: &HeaderMap, query: Option<&str>, body: &[u8]) -> Result<RsvpForm, RsvpError> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.trim_start().starts_with("application/json"));

    if is_json {
        return serde_json::from_slice::<RsvpRequest>(body).map(RsvpForm::from).map_err(|err| {
            RsvpError::Malformed { message: err.to_string().into(), context: Some("json".into()) }
        });
    }

    let malformed = |err: serde_urlencoded::de::Error| RsvpError::Malformed {
        message: err.to_string().into(),
        context: Some("form".into()),
    };
    let mut pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body).map_err(malformed)?;
    if let Some(query) = query {
        pairs.extend(serde_urlencoded::from_str::<Vec<(String, String)>>(query).map_err(malformed)?);
    }

    Ok(RsvpForm::from_pairs(pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))))
}

fn respond(outcome: Result<Receipt, RsvpError>) -> RsvpResponse {
    match outcome {
        Ok(receipt) => {
            if !receipt.acknowledged {
                warn!(rsvp = %receipt.rsvp_id, "RSVP stored without acknowledgement email");
            }
            RsvpResponse::success(SUCCESS_MESSAGE)
        },
        Err(err) if err.is_rejection() => {
            info!(reason = %err, "RSVP rejected");
            RsvpResponse::failure(err.public_message())
        },
        Err(err) => {
            error!(error = %err, "RSVP submission failed");
            RsvpResponse::failure(err.public_message())
        },
    }
}
