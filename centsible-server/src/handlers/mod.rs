pub mod auth;
pub mod budget;
pub mod health;
pub mod transaction;
pub mod user;

pub mod error {
    use centsible_common::token::TokenError;

    use actix_web::http::{header, StatusCode};
    use actix_web::{HttpResponse, HttpResponseBuilder};
    use serde::Serialize;
    use std::fmt;

    #[derive(Debug)]
    pub enum ServerError {
        // 400 errors
        InvalidFormat(Option<String>),
        InputRejected(Option<String>),
        AlreadyExists(Option<String>),
        UserUnauthorized(Option<String>),
        AccessForbidden(Option<String>),
        NotFound(Option<String>),

        // 500 errors
        InternalError(Option<String>),
        DatabaseTransactionError(Option<String>),
    }

    impl std::error::Error for ServerError {}

    impl fmt::Display for ServerError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                ServerError::InvalidFormat(msg) => format_err(f, "Invalid request format", msg),
                ServerError::InputRejected(msg) => format_err(f, "Input rejected", msg),
                ServerError::AlreadyExists(msg) => format_err(f, "Already exists", msg),
                ServerError::UserUnauthorized(msg) => format_err(f, "User unauthorized", msg),
                ServerError::AccessForbidden(msg) => format_err(f, "Access forbidden", msg),
                ServerError::NotFound(msg) => format_err(f, "Not found", msg),
                ServerError::InternalError(msg) => format_err(f, "Internal server error", msg),
                ServerError::DatabaseTransactionError(msg) => {
                    format_err(f, "Database transaction failed", msg)
                }
            }
        }
    }

    #[derive(Serialize)]
    struct ErrorBody<'a> {
        error_msg: &'a str,
    }

    impl actix_web::error::ResponseError for ServerError {
        fn error_response(&self) -> HttpResponse {
            let error_msg = self.to_string();
            let body = serde_json::to_string(&ErrorBody {
                error_msg: &error_msg,
            })
            .unwrap_or_else(|_| String::from("{\"error_msg\": \"Internal server error\"}"));

            HttpResponseBuilder::new(self.status_code())
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .body(body)
        }

        fn status_code(&self) -> StatusCode {
            match *self {
                ServerError::InvalidFormat(_) | ServerError::AlreadyExists(_) => {
                    StatusCode::BAD_REQUEST
                }
                ServerError::InputRejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ServerError::UserUnauthorized(_) => StatusCode::UNAUTHORIZED,
                ServerError::AccessForbidden(_) => StatusCode::FORBIDDEN,
                ServerError::NotFound(_) => StatusCode::NOT_FOUND,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            }
        }
    }

    impl From<actix_web::error::BlockingError> for ServerError {
        fn from(_error: actix_web::error::BlockingError) -> Self {
            ServerError::InternalError(Some(String::from("Actix thread pool failure")))
        }
    }

    impl From<tokio::sync::oneshot::error::RecvError> for ServerError {
        fn from(_error: tokio::sync::oneshot::error::RecvError) -> Self {
            ServerError::InternalError(Some(String::from("Rayon thread pool failure")))
        }
    }

    impl From<TokenError> for ServerError {
        fn from(error: TokenError) -> Self {
            match error {
                TokenError::TokenExpired => {
                    ServerError::UserUnauthorized(Some(String::from("Token expired")))
                }
                _ => ServerError::UserUnauthorized(Some(String::from("Token is invalid"))),
            }
        }
    }

    fn format_err(
        f: &mut fmt::Formatter<'_>,
        error_txt: &str,
        msg: &Option<String>,
    ) -> fmt::Result {
        write!(
            f,
            "{}{}",
            error_txt,
            if msg.is_some() {
                format!(": {}", msg.as_ref().unwrap())
            } else {
                String::new()
            }
        )
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        use actix_web::error::ResponseError;

        #[test]
        fn test_validation_failure_maps_to_422() {
            let error = ServerError::InputRejected(Some(String::from("Passwords don't match")));
            assert_eq!(error.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        }

        #[test]
        fn test_conflict_and_malformed_input_map_to_400() {
            let error = ServerError::AlreadyExists(None);
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);

            let error = ServerError::InvalidFormat(None);
            assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        }

        #[test]
        fn test_auth_failures_map_to_401_and_403() {
            let error = ServerError::UserUnauthorized(None);
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);

            let error = ServerError::AccessForbidden(None);
            assert_eq!(error.status_code(), StatusCode::FORBIDDEN);
        }

        #[test]
        fn test_not_found_maps_to_404() {
            let error = ServerError::NotFound(None);
            assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
        }

        #[test]
        fn test_infrastructure_failures_map_to_500() {
            let error = ServerError::InternalError(None);
            assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

            let error = ServerError::DatabaseTransactionError(None);
            assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[test]
        fn test_expired_and_invalid_tokens_map_to_401() {
            let error = ServerError::from(TokenError::TokenExpired);
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);

            let error = ServerError::from(TokenError::TokenInvalid);
            assert_eq!(error.status_code(), StatusCode::UNAUTHORIZED);
        }

        #[test]
        fn test_error_response_body_is_json() {
            let error = ServerError::NotFound(Some(String::from("No budget with given ID")));
            let response = error.error_response();

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            assert_eq!(
                response
                    .headers()
                    .get(header::CONTENT_TYPE)
                    .unwrap()
                    .to_str()
                    .unwrap(),
                "application/json"
            );
        }
    }
}
