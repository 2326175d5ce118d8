//! services/api/src/web/envelope.rs
//!
//! The response envelope shared by every endpoint.
//!
//! Successes are `{"Status": 200, "Data": ...}`, business errors are
//! `{"Status": <code>, "Msg": <english>, "MsgRus": <russian>}`. Both are sent
//! with HTTP 200; clients read the real outcome from `Status`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cooking_assistant_core::ports::PortError;
use serde::Serialize;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(Serialize)]
pub struct DataEnvelope<T> {
    #[serde(rename = "Status")]
    pub status: u16,
    #[serde(rename = "Data")]
    pub data: T,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorEnvelope {
    #[serde(rename = "Status")]
    pub status: u16,
    #[serde(rename = "Msg")]
    pub msg: String,
    #[serde(rename = "MsgRus")]
    pub msg_rus: String,
}

/// A successful result, rendered as a data envelope.
pub struct Success<T>(pub T);

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            Json(DataEnvelope {
                status: StatusCode::OK.as_u16(),
                data: self.0,
            }),
        )
            .into_response()
    }
}

/// A failed result, rendered as an error envelope.
#[derive(Debug)]
pub struct Failure(pub PortError);

impl From<PortError> for Failure {
    fn from(err: PortError) -> Self {
        Failure(err)
    }
}

impl Failure {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Failure(PortError::InvalidInput(message.into()))
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            status: status_code(&self.0),
            msg: self.0.to_string(),
            msg_rus: russian_message(&self.0).to_string(),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        let envelope = self.envelope();
        if envelope.status >= 500 && !matches!(self.0, PortError::OutOfRange) {
            error!("Request failed: {}", self.0);
        } else {
            debug!("Request rejected with {}: {}", envelope.status, self.0);
        }
        (StatusCode::OK, Json(envelope)).into_response()
    }
}

pub type EnvelopeResult<T> = Result<Success<T>, Failure>;

/// The envelope status for each error kind.
pub fn status_code(err: &PortError) -> u16 {
    match err {
        PortError::InvalidInput(_) => 400,
        PortError::Unauthenticated => 401,
        PortError::NoActiveSession
        | PortError::RecipeNotFound
        | PortError::StepNotFound
        | PortError::TimerNotFound
        | PortError::NotFound(_) => 404,
        PortError::AlreadyCooking | PortError::TimerAlreadyExists | PortError::Conflict(_) => 409,
        PortError::RecipeHasNoSteps => 422,
        PortError::OutOfRange | PortError::StoreUnavailable(_) | PortError::Unexpected(_) => 500,
    }
}

/// The user-facing message shown by the client.
pub fn russian_message(err: &PortError) -> &'static str {
    match err {
        PortError::Unauthenticated => "Пользователь не авторизован",
        PortError::NoActiveSession => "Вы сейчас ничего не готовите",
        PortError::AlreadyCooking => "Вы уже готовите другой рецепт. Сначала завершите его",
        PortError::RecipeNotFound => "Рецепт не найден",
        PortError::RecipeHasNoSteps => "В рецепте нет шагов",
        PortError::OutOfRange => "Такого шага нет",
        PortError::StepNotFound => "Шаг не найден",
        PortError::TimerAlreadyExists => "Таймер для этого шага уже установлен",
        PortError::TimerNotFound => "Таймер не найден",
        PortError::StoreUnavailable(_) => "Сервис временно недоступен, попробуйте позже",
        PortError::NotFound(_) => "Не найдено",
        PortError::InvalidInput(_) => "Некорректный запрос",
        PortError::Conflict(_) => "Такая запись уже существует",
        PortError::Unexpected(_) => "Что-то пошло не так",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn errors_are_sent_with_http_200() {
        let response = Failure(PortError::AlreadyCooking).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["Status"], 409);
        assert_eq!(body["Msg"], "a recipe is already being cooked");
        assert!(body["MsgRus"].as_str().unwrap().contains("уже готовите"));
    }

    #[tokio::test]
    async fn success_wraps_data() {
        let body = body_json(Success(serde_json::json!({"stepNum": 1})).into_response()).await;
        assert_eq!(body["Status"], 200);
        assert_eq!(body["Data"]["stepNum"], 1);
    }

    #[test]
    fn unauthenticated_uses_the_documented_message() {
        let envelope = Failure(PortError::Unauthenticated).envelope();
        assert_eq!(envelope.status, 401);
        assert_eq!(envelope.msg, "user not authenticated");
    }

    #[test]
    fn out_of_range_is_a_server_status() {
        assert_eq!(status_code(&PortError::OutOfRange), 500);
        assert_eq!(status_code(&PortError::StepNotFound), 404);
        assert_eq!(status_code(&PortError::RecipeHasNoSteps), 422);
    }
}
