use linkdigest::errors::DigestError;
use std::error::Error;

#[test]
fn test_digest_error_implements_error_trait() {
    fn assert_error<T: Error>(_: &T) {}

    let error = DigestError::ParseError("test error".to_string());
    assert_error(&error);
}

#[test]
fn test_digest_error_display() {
    let error = DigestError::TelegramError("sendMessage error (400): Bad Request".to_string());
    assert_eq!(
        format!("{error}"),
        "Failed to access Telegram API: sendMessage error (400): Bad Request"
    );

    let error = DigestError::ExtractionFailed("no extractable content".to_string());
    assert_eq!(
        format!("{error}"),
        "Could not extract content: no extractable content"
    );

    assert_eq!(
        format!("{}", DigestError::UnknownWorkUnit(42)),
        "Unknown work unit for message 42"
    );
}

#[test]
fn test_only_skips_are_silent() {
    assert!(DigestError::AccessDenied.is_silent());
    assert!(DigestError::NoLinkFound.is_silent());
    assert!(DigestError::DuplicatePost.is_silent());
    assert!(!DigestError::TracingFailed("x".into()).is_silent());
    assert!(!DigestError::UnknownWorkUnit(1).is_silent());
}

#[test]
fn test_digest_error_from_conversions() {
    let err = anyhow::anyhow!("test error");
    let digest_err: DigestError = err.into();

    match digest_err {
        DigestError::GeneralError(msg) => assert!(msg.contains("test error")),
        _ => panic!("Unexpected error type"),
    }

    // Compile-time check that the reqwest conversion exists.
    #[allow(unused)]
    #[allow(clippy::items_after_statements)]
    fn _check_reqwest_conversion(err: reqwest::Error) -> DigestError {
        DigestError::from(err)
    }
}
