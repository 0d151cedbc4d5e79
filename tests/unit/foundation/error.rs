use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        KenBurnsError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        KenBurnsError::audio_init("x")
            .to_string()
            .contains("audio init error:")
    );
    assert!(
        KenBurnsError::encoder_unsupported("x")
            .to_string()
            .contains("encoder unsupported:")
    );
    assert!(
        KenBurnsError::encoding("x")
            .to_string()
            .contains("encoding failure:")
    );
    assert_eq!(
        KenBurnsError::AlreadyRunning.to_string(),
        "render already running"
    );
    assert_eq!(KenBurnsError::Cancelled.to_string(), "render cancelled");
}

#[test]
fn only_audio_init_is_recoverable() {
    assert!(!KenBurnsError::audio_init("no music").is_fatal());
    assert!(KenBurnsError::validation("x").is_fatal());
    assert!(KenBurnsError::encoding("x").is_fatal());
    assert!(KenBurnsError::AlreadyRunning.is_fatal());
    assert!(KenBurnsError::Cancelled.is_fatal());
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = KenBurnsError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
