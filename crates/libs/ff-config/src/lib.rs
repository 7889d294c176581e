//! Configuration management for the ff test pipeline.
//!
//! Provides the build descriptors (one per test program), the global
//! toolchain settings and the build profile, loaded from TOML or taken from
//! the built-in table.
//!
//! # Usage
//!
//! ```rust
//! use ff_config::{FfConfig, FfUserConfig};
//! use std::path::Path;
//!
//! let user_config = FfUserConfig::from_toml(
//!     r#"
//!     [[tests]]
//!     name = "fftests"
//!     entry = "tests/fftests/fftests.cpp"
//!     sources = ["src/ff/*.cpp"]
//!     output = "bin/fftests_test"
//!     "#,
//! )
//! .unwrap();
//!
//! let config = FfConfig::from_user_config(user_config, Path::new("/work/ff")).unwrap();
//! assert_eq!(config.tests[0].name, "fftests");
//! ```

pub mod descriptor;
pub mod error;
pub mod ff_config;
pub mod prelude;
pub mod profile;

pub use descriptor::BuildDescriptor;
pub use ff_config::{FfConfig, FfGlobalConfig, FfUserConfig, ToolchainConfig};
pub use profile::BuildProfile;
