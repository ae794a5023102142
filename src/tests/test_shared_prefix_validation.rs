use crate::{FermataError, SharedKeyPrefix};

#[test]
fn valid_prefix_is_accepted() {
    let prefix = SharedKeyPrefix::try_from("myapp".to_string());

    assert!(prefix.is_ok());
}

#[test]
fn prefix_at_the_length_limit_is_accepted() {
    let prefix = SharedKeyPrefix::try_from("p".repeat(255));

    assert!(prefix.is_ok());
}

#[test]
fn empty_prefix_is_rejected() {
    let result = SharedKeyPrefix::try_from(String::new());

    assert!(matches!(
        result,
        Err(FermataError::InvalidSharedPrefix(_))
    ));
}

#[test]
fn overlong_prefix_is_rejected() {
    let result = SharedKeyPrefix::try_from("p".repeat(256));

    assert!(matches!(
        result,
        Err(FermataError::InvalidSharedPrefix(_))
    ));
}

#[test]
fn prefix_containing_a_colon_is_rejected() {
    let result = SharedKeyPrefix::try_from("my:app".to_string());

    assert!(matches!(
        result,
        Err(FermataError::InvalidSharedPrefix(_))
    ));
}

#[test]
fn default_prefix_is_usable() {
    // The default must itself satisfy the key constraints.
    let roundtrip = SharedKeyPrefix::try_from("fermata".to_string()).unwrap();

    assert_eq!(roundtrip, SharedKeyPrefix::default_prefix());
}
