//! JSON request bodies that reject in the service's error format.

use axum::extract::{FromRequest, Request, rejection::JsonRejection};
use serde::de::DeserializeOwned;

use crate::errors::Error;

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// `axum::Json` as an extractor, except that a body which does not deserialize is a
/// [`Error::Validation`] (400) naming the offending field where one can be told.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> Error {
    let message = rejection.body_text();
    let fields = match rejection {
        JsonRejection::JsonDataError(_) => offending_field(&message).into_iter().collect(),
        _ => vec![],
    };
    Error::Validation { message, fields }
}

/// The field path serde reported, e.g. `semester_id` in
/// `...target type: semester_id: invalid type: string "one", expected i64`.
/// Errors about the body as a whole carry no path.
fn offending_field(message: &str) -> Option<String> {
    let detail = message.strip_prefix(DATA_ERROR_PREFIX)?;
    let (path, _) = detail.split_once(": ")?;
    (!path.is_empty() && !path.contains(char::is_whitespace)).then(|| path.to_string())
}
