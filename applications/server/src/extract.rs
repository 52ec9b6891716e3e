/// Request body extractors
use crate::error::ServerError;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

/// JSON body whose rejections render as API errors instead of plain text
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(
                ServerError::UnsupportedMediaType(
                    "Expected request with `Content-Type: application/json`".to_string(),
                ),
            ),
            Err(rejection) => Err(ServerError::BadRequest(format!(
                "JSON parse error - {}",
                rejection.body_text()
            ))),
        }
    }
}
