//! Global subscriber installation, kept in its own test binary.

#[test]
fn second_init_is_rejected() {
    assert!(caas_provider::logging::init());
    assert!(!caas_provider::logging::init());
}
