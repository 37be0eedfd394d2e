//! Runs the parsed command

use crate::cli::args::{Args, Command};
use crate::config::AppConfig;
use crate::devops::{EmailServerConfig, set_mail_server};
use crate::error::AppError;
use crate::jenkins::{Jenkins, JenkinsConfig};
use crate::logging::Logger;
use crate::registries::{
    AuthInfo, ImageNameAndSecret, registry_image_blob, registry_verify,
};
use crate::registry::{Registry, RegistryOptions, parse_image};
use k8s_openapi::api::core::v1::Secret;
use std::path::Path;
use std::time::Duration;

pub type Result<T> = std::result::Result<T, AppError>;

pub struct Runner {
    args: Args,
    config: AppConfig,
    output: Logger,
}

impl Runner {
    pub fn new(args: Args) -> Result<Self> {
        args.validate().map_err(AppError::Failed)?;
        let config = args.app_config();
        config.validate()?;
        let output = Logger::new(config.verbose);
        Ok(Self {
            args,
            config,
            output,
        })
    }

    pub async fn run(&self) -> Result<()> {
        match &self.args.command {
            Command::Digest {
                image,
                username,
                password,
            } => {
                self.digest(
                    image,
                    username.as_deref().unwrap_or_default(),
                    password.as_deref().unwrap_or_default(),
                )
                .await
            }
            Command::Inspect { image, secret } => self.inspect(image, secret.as_deref()).await,
            Command::Login {
                server,
                username,
                password,
            } => self.login(server, username, password).await,
            Command::MailServer {
                jenkins_url,
                jenkins_user,
                jenkins_password,
                smtp_host,
                smtp_port,
                smtp_password,
                from_name,
                from_addr,
                ssl,
            } => {
                let jenkins = JenkinsConfig::new(jenkins_url)
                    .with_auth(jenkins_user, jenkins_password)
                    .with_max_connections(self.config.jenkins_max_connections)
                    .with_timeout(Duration::from_secs(self.config.timeout))
                    .with_skip_tls(self.config.skip_tls);
                let server = EmailServerConfig {
                    email: from_name.clone(),
                    password: smtp_password.clone(),
                    email_host: smtp_host.clone(),
                    port: *smtp_port,
                    from_email_addr: from_addr.clone(),
                    ssl_enable: *ssl,
                    reply_to: crate::devops::settings::DEFAULT_REPLY_TO.to_string(),
                };
                self.mail_server(&jenkins, &server).await
            }
        }
    }

    fn registry_options(&self) -> RegistryOptions {
        RegistryOptions::default()
            .with_timeout(Duration::from_secs(self.config.timeout))
            .with_use_ssl(self.config.use_ssl)
            .with_skip_tls(self.config.skip_tls)
    }

    async fn digest(&self, name: &str, username: &str, password: &str) -> Result<()> {
        let image = parse_image(name)?;
        let mut options = self.registry_options();
        options.domain = image.domain.clone();

        let registry = Registry::create("", username, password, options, self.output.clone())?;
        let token = registry.token(&registry.digest_url(&image)).await?;
        let digest = registry.digest(&image, &token).await?;
        if digest.is_empty() {
            return Err(AppError::Failed(format!("no manifest found for {}", image)));
        }

        println!("{}", digest);
        self.output.verbose(&format!(
            "Resolved in {}",
            self.output.format_duration(self.output.elapsed())
        ));
        Ok(())
    }

    async fn inspect(&self, name: &str, secret: Option<&Path>) -> Result<()> {
        let secret = match secret {
            Some(path) => serde_json::from_str::<Secret>(&std::fs::read_to_string(path)?)?,
            None => Secret::default(),
        };
        let request = ImageNameAndSecret {
            image_name: name.to_string(),
            secret,
        };

        let info = registry_image_blob(&request, &self.registry_options(), self.output.clone()).await;
        println!("{}", serde_json::to_string_pretty(&info)?);
        if info.is_success() {
            Ok(())
        } else {
            Err(AppError::Failed(format!("could not inspect {}", name)))
        }
    }

    async fn login(&self, server: &str, username: &str, password: &str) -> Result<()> {
        let auth = AuthInfo {
            username: username.to_string(),
            password: password.to_string(),
            server_host: server.to_string(),
        };
        registry_verify(&auth, &self.registry_options(), self.output.clone()).await?;
        Ok(())
    }

    async fn mail_server(&self, config: &JenkinsConfig, server: &EmailServerConfig) -> Result<()> {
        let jenkins = Jenkins::new(config, self.output.clone())?.init().await?;
        let result = set_mail_server(&jenkins, server).await?;
        println!("{}", serde_json::to_string_pretty(&result)?);
        if result.success {
            self.output.success("Mail server configured");
            Ok(())
        } else {
            Err(AppError::Failed(result.message))
        }
    }
}
