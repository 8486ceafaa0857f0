pub mod entity;
pub mod issue;
pub mod pr;
pub mod review_config;
