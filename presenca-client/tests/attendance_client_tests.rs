//! AttendanceClient retry behavior
//!
//! Runs on a paused clock so the fixed retry delay can be measured exactly
//! without slowing the suite down.

mod helpers;

use helpers::*;
use presenca_client::client::{AttendanceClient, SubmitError, TransportError};
use presenca_client::utils::RetryPolicy;
use presenca_common::api::AttendanceResult;
use presenca_common::cpf::validate;
use presenca_common::AttendancePeriod;
use std::time::Duration;
use tokio::time::Instant;

fn ok(message: &str) -> Result<AttendanceResult, TransportError> {
    Ok(AttendanceResult {
        complete: false,
        message: Some(message.to_string()),
    })
}

#[tokio::test(start_paused = true)]
async fn test_two_failures_then_success() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Network("connection reset".to_string())),
        Err(TransportError::Status(503)),
        ok("Presença registrada na manhã"),
    ]);
    let client = AttendanceClient::new(transport.clone(), RetryPolicy::new(3, Duration::from_secs(1)));
    let cpf = validate(VALID_CPF).unwrap();

    let start = Instant::now();
    let result = client
        .submit(&cpf, AttendancePeriod::Morning, &token())
        .await
        .unwrap();
    let elapsed = start.elapsed();

    assert_eq!(result.message.as_deref(), Some("Presença registrada na manhã"));
    assert_eq!(transport.calls(), 3);
    // Two retries, one fixed delay before each
    assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(3), "elapsed {:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_stops_at_attempt_budget() {
    for attempts in [1u32, 3, 5] {
        let transport = ScriptedTransport::new(Vec::new());
        let client = AttendanceClient::new(
            transport.clone(),
            RetryPolicy::new(attempts, Duration::from_millis(500)),
        );
        let cpf = validate(VALID_CPF).unwrap();

        let err = client
            .submit(&cpf, AttendancePeriod::Afternoon, &token())
            .await
            .unwrap_err();

        assert_eq!(transport.calls(), attempts as usize);
        match err {
            SubmitError::Exhausted { attempts: made, last } => {
                assert_eq!(made, attempts);
                assert_eq!(last, TransportError::Network("connection refused".to_string()));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_rejection_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Rejected {
        status: 404,
        message: "Usuário não encontrado".to_string(),
    })]);
    let client = AttendanceClient::new(transport.clone(), RetryPolicy::default());
    let cpf = validate(VALID_CPF).unwrap();

    let start = Instant::now();
    let err = client
        .submit(&cpf, AttendancePeriod::Morning, &token())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Rejected {
            status: 404,
            message: "Usuário não encontrado".to_string()
        }
    );
    assert_eq!(transport.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_unauthorized_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Unauthorized)]);
    let client = AttendanceClient::new(transport.clone(), RetryPolicy::default());
    let cpf = validate(VALID_CPF).unwrap();

    let err = client
        .submit(&cpf, AttendancePeriod::Morning, &token())
        .await
        .unwrap_err();

    assert_eq!(err, SubmitError::Unauthenticated);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_undecodable_success_is_not_retried() {
    let transport = ScriptedTransport::new(vec![Err(TransportError::Decode(
        "expected value at line 1".to_string(),
    ))]);
    let client = AttendanceClient::new(transport.clone(), RetryPolicy::default());
    let cpf = validate(VALID_CPF).unwrap();

    let err = client
        .submit(&cpf, AttendancePeriod::Morning, &token())
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::InvalidResponse(_)));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_transient_then_rejection_stops() {
    let transport = ScriptedTransport::new(vec![
        Err(TransportError::Status(502)),
        Err(TransportError::Rejected {
            status: 409,
            message: "Presença já registrada".to_string(),
        }),
        ok("never reached"),
    ]);
    let client = AttendanceClient::new(transport.clone(), RetryPolicy::new(5, Duration::from_secs(1)));
    let cpf = validate(VALID_CPF).unwrap();

    let err = client
        .submit(&cpf, AttendancePeriod::Morning, &token())
        .await
        .unwrap_err();

    assert!(matches!(err, SubmitError::Rejected { status: 409, .. }));
    assert_eq!(transport.calls(), 2);
}
