pub mod dependencies;
pub mod domain;
