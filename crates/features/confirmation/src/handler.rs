use crate::Confirmation;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::error;
use wed_derive::api_handler;
use wed_domain::constants::CONFIRMATION_TAG;
use wed_kernel::server::ApiState;

#[api_handler(
    post,
    path = "/confirmations",
    responses(
        (status = OK, description = "Progress report, one line per party", body = String, content_type = "text/plain"),
        (status = INTERNAL_SERVER_ERROR, description = "Confirmation slice not registered"),
    ),
    tag = CONFIRMATION_TAG,
)]
pub(crate) async fn run_sweep(State(state): State<ApiState>) -> Response {
    let sweeper = match state.try_get_slice::<Confirmation>() {
        Ok(slice) => slice.sweeper.clone(),
        Err(err) => {
            error!(error = %err, "Confirmation slice is not registered");
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("error: {err}\n")).into_response();
        },
    };

    // The sweep runs to completion even if the client stops reading.
    let (tx, rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        // Fatal errors are already logged and streamed as the last line.
        let _summary = sweeper
            .run(move |line| {
                // A closed receiver means the client went away; keep sweeping.
                let _ = tx.send(format!("{line}\n"));
            })
            .await;
    });

    let stream = UnboundedReceiverStream::new(rx).map(Ok::<_, Infallible>);
    ([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], Body::from_stream(stream)).into_response()
}
