//! Build identification exported by `build.rs`

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Abbreviated commit, `+` suffixed for a dirty tree, or `unknown`
pub const GIT_HASH: &str = env!("GIT_HASH");

/// RFC 3339 local time of the build
pub const BUILD_TIMESTAMP: &str = env!("BUILD_TIMESTAMP");

pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

/// Startup line logged right after the subscriber is installed
pub fn identity() -> String {
    format!(
        "presenca-client v{} [{}] built {} ({})",
        VERSION, GIT_HASH, BUILD_TIMESTAMP, BUILD_PROFILE
    )
}
