//! Command-line argument parsing

use crate::config::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "devops-clients")]
#[command(about = "Inspect container registries and provision Jenkins")]
#[command(version, author)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        global = true,
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: Option<u64>,

    /// Use plain http for registries given without a scheme
    #[arg(long = "insecure", global = true, help = "Use http instead of https")]
    pub insecure: bool,

    /// Skip TLS verification
    #[arg(
        long = "skip-tls",
        short = 'k',
        global = true,
        help = "Skip TLS certificate verification"
    )]
    pub skip_tls: bool,

    #[arg(
        long = "verbose",
        short = 'v',
        global = true,
        help = "Enable verbose output"
    )]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the config digest of an image
    Digest {
        image: String,
        #[arg(long = "username", short = 'u', help = "Registry username")]
        username: Option<String>,
        #[arg(long = "password", short = 'p', help = "Registry password")]
        password: Option<String>,
    },
    /// Print the config blob of an image as JSON
    Inspect {
        image: String,
        #[arg(
            long = "secret",
            help = "Kubernetes dockerconfigjson secret (JSON) holding the pull credentials"
        )]
        secret: Option<PathBuf>,
    },
    /// Verify registry credentials
    Login {
        server: String,
        #[arg(long = "username", short = 'u', help = "Registry username")]
        username: String,
        #[arg(long = "password", short = 'p', help = "Registry password")]
        password: String,
    },
    /// Configure the Jenkins mailer
    MailServer {
        #[arg(long = "jenkins-url", help = "Jenkins base URL")]
        jenkins_url: String,
        #[arg(long = "jenkins-user", default_value = "", help = "Jenkins username")]
        jenkins_user: String,
        #[arg(long = "jenkins-password", default_value = "", help = "Jenkins password or API token")]
        jenkins_password: String,
        #[arg(long = "smtp-host", help = "SMTP server host")]
        smtp_host: String,
        #[arg(long = "smtp-port", default_value = "25", help = "SMTP server port")]
        smtp_port: u16,
        #[arg(long = "smtp-password", default_value = "", help = "SMTP password")]
        smtp_password: String,
        #[arg(long = "from-name", help = "Sender display name")]
        from_name: String,
        #[arg(long = "from-addr", help = "Sender address")]
        from_addr: String,
        #[arg(long = "ssl", help = "Use SSL for SMTP")]
        ssl: bool,
    },
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == Some(0) {
            return Err("Timeout must be greater than 0".to_string());
        }
        if let Command::MailServer { smtp_port: 0, .. } = self.command {
            return Err("SMTP port must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Environment configuration overridden by the flags given on the command line
    pub fn app_config(&self) -> AppConfig {
        self.merge(AppConfig::from_env())
    }

    fn merge(&self, mut config: AppConfig) -> AppConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if self.insecure {
            config.use_ssl = false;
        }
        if self.skip_tls {
            config.skip_tls = true;
        }
        if self.verbose {
            config.verbose = true;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_digest() {
        let args = Args::try_parse_from([
            "devops-clients",
            "digest",
            "alpine:3.18",
            "-u",
            "user",
            "-p",
            "secret",
            "--timeout",
            "10",
        ])
        .unwrap();
        match &args.command {
            Command::Digest {
                image,
                username,
                password,
            } => {
                assert_eq!(image, "alpine:3.18");
                assert_eq!(username.as_deref(), Some("user"));
                assert_eq!(password.as_deref(), Some("secret"));
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(args.timeout, Some(10));
    }

    #[test]
    fn test_flags_override_config() {
        let args = Args::try_parse_from([
            "devops-clients",
            "--insecure",
            "--verbose",
            "inspect",
            "localhost:5000/app",
        ])
        .unwrap();
        let config = args.merge(AppConfig::default());
        assert!(!config.use_ssl);
        assert!(config.verbose);
        assert_eq!(config.timeout, 30);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args =
            Args::try_parse_from(["devops-clients", "-t", "0", "digest", "alpine"]).unwrap();
        assert!(args.validate().is_err());
    }
}
