use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use libris_core::AppError;

/// JSON body extractor that runs `validator` rules. Every rejection is a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(rejection_to_error)?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return AppError::validation("Missing 'Content-Type: application/json' header");
    }

    let error_msg = rejection.body_text();

    if let Some(field) = error_msg
        .split("missing field `")
        .nth(1)
        .and_then(|s| s.split('`').next())
    {
        return AppError::validation(format!("{}: is required", field));
    }

    if error_msg.contains("invalid type") {
        return AppError::validation("Invalid field type in request");
    }

    AppError::validation("Invalid request body").with_detail(error_msg)
}
