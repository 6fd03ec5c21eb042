//! Container-backed integration tests for both stores.

/// Container suites only run when `OFFICE_CONTAINER_TESTS` is set.
pub fn containers_enabled() -> bool {
    std::env::var_os("OFFICE_CONTAINER_TESTS").is_some()
}
