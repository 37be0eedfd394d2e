//! DevOps console operations built on the Jenkins client

pub mod settings;

pub use settings::{EmailServerConfig, ExecutesResult, mail_server_script, set_mail_server};
