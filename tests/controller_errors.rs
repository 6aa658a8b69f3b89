//! Checks the messages surfaced by controller errors.

use std::error::Error as _;
use std::time::Duration;

use rgctl::{ApiError, ControllerError, Operation, ResourceHandle, SchemaError};
use rstest::rstest;

#[rstest]
#[case(
    ControllerError::Timeout {
        operation: Operation::Create,
        handle: ResourceHandle::from("cache1"),
        waited: Duration::from_secs(3600),
    },
    "timed out after 3600s waiting for create of replication group cache1"
)]
#[case(
    ControllerError::Vanished {
        operation: Operation::Update,
        handle: ResourceHandle::from("cache1"),
    },
    "replication group cache1 disappeared during update"
)]
#[case(
    ControllerError::UnexpectedStatus {
        operation: Operation::Delete,
        handle: ResourceHandle::from("cache1"),
        status: String::from("modifying"),
    },
    "replication group cache1 reported unexpected status 'modifying' during delete"
)]
#[case(
    ControllerError::NotManaged { operation: Operation::Update },
    "update requires a managed replication group"
)]
#[case(
    ControllerError::Schema(SchemaError::MissingRequired { field: String::from("description") }),
    "invalid replication group attributes: missing required attribute description"
)]
fn error_messages_name_operation_and_handle(#[case] error: ControllerError, #[case] expected: &str) {
    assert_eq!(error.to_string(), expected);
}

#[test]
fn api_errors_keep_their_source() {
    let error = ControllerError::Api {
        operation: Operation::Read,
        handle: ResourceHandle::from("cache1"),
        source: ApiError::Service {
            code: String::from("Throttling"),
            message: String::from("rate exceeded"),
        },
    };

    assert_eq!(
        error.to_string(),
        "read of replication group cache1 failed: Throttling: rate exceeded"
    );
    let source = error.source().map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("Throttling: rate exceeded"));
}
