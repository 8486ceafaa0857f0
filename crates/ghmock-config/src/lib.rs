//! # ghmock-config
//!
//! Review workflow settings resolved key by key.
//!
//! Sources (highest wins):
//! 1. Environment variables (`WIGGUM_*`)
//! 2. `<home>/config/config.json`, under the `review` key
//! 3. Built-in defaults
//!
//! Each source is read through `figment` into a [`ReviewLayer`] of
//! optional values; resolution is the pure function [`resolve`] over
//! those layers.
//! A key that is present wins even when its value is falsy, so
//! `"auto_commit_after_fix": false` in the file beats the default `true`.

mod error;
mod review;

pub use error::ConfigError;
pub use review::{
    CONFIG_FILE_RELATIVE_PATH, DEFAULT_AUTO_COMMIT_AFTER_FIX, DEFAULT_FIX_MAX_ITERATIONS,
    DEFAULT_FIX_MAX_TURNS, ENV_APPROVED_USER_IDS, ENV_AUTO_COMMIT_AFTER_FIX,
    ENV_FIX_MAX_ITERATIONS, ENV_FIX_MAX_TURNS, ENV_PREFIX, ReviewConfig, ReviewLayer,
    config_file_path, env_layer, env_provider, file_layer, load_review_config, resolve,
};
