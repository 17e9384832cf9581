// SPDX-License-Identifier: MIT

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tapfolio::error::AppError;

fn status_of(err: AppError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn test_error_status_mapping() {
    assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
    assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
    assert_eq!(
        status_of(AppError::NotFound("card".to_string())),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        status_of(AppError::BadRequest("bad".to_string())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AppError::NotAuthorized("pro only".to_string())),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_of(AppError::LimitExceeded {
            tier: "free",
            limit: 1
        }),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        status_of(AppError::Conflict("race".to_string())),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AppError::RetryExhausted("slug allocation")),
        StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(
        status_of(AppError::Unavailable("down".to_string())),
        StatusCode::SERVICE_UNAVAILABLE
    );
}

#[test]
fn test_limit_exceeded_names_tier_and_limit() {
    let err = AppError::LimitExceeded {
        tier: "free",
        limit: 1,
    };
    let msg = err.to_string();
    assert!(msg.contains("free"));
    assert!(msg.contains('1'));
}
