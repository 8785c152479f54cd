//! Shared test utilities for the domain crates
//!
//! - `TestDatabase`: PostgreSQL container with the schema migrated (feature: "postgres")
//! - `TestDataBuilder`: deterministic emails, names and tokens
//!
//! ```rust,ignore
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("my_postgres_test");
//!
//!     let email = data.email("visitor", 1);
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Seeded test data so that parallel tests sharing a database never collide.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name.
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `<label>-<seed>-<n>@test.charity.local`
    pub fn email(&self, label: &str, n: usize) -> String {
        format!("{}-{}-{}@test.charity.local", label, self.seed, n)
    }

    /// `test-<prefix>-<seed>-<suffix>`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// Hex token shaped like the reset and verification tokens.
    pub fn token(&self, purpose: &str) -> String {
        format!("{:016x}{}", self.seed, purpose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_is_deterministic() {
        let a = TestDataBuilder::from_test_name("bulk_dispatch");
        let b = TestDataBuilder::from_test_name("bulk_dispatch");
        assert_eq!(a.email("visitor", 1), b.email("visitor", 1));
        assert_eq!(a.token("reset"), b.token("reset"));
    }

    #[test]
    fn test_different_tests_get_different_data() {
        let a = TestDataBuilder::from_test_name("test1");
        let b = TestDataBuilder::from_test_name("test2");
        assert_ne!(a.email("visitor", 1), b.email("visitor", 1));
    }

    #[test]
    fn test_email_shape() {
        let email = TestDataBuilder::new(7).email("org", 3);
        assert_eq!(email, "org-7-3@test.charity.local");
    }
}
