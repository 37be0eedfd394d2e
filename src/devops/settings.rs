//! Jenkins mailer provisioning

use crate::error::JenkinsResult;
use crate::jenkins::Jenkins;
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPLY_TO: &str = "no-reply@k8s.kubesphere.io";

/// SMTP settings for the Jenkins mailer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailServerConfig {
    /// Sender display name
    pub email: String,
    pub password: String,
    pub email_host: String,
    pub port: u16,
    pub from_email_addr: String,
    #[serde(default)]
    pub ssl_enable: bool,
    #[serde(default = "default_reply_to")]
    pub reply_to: String,
}

fn default_reply_to() -> String {
    DEFAULT_REPLY_TO.to_string()
}

/// Outcome of a script console run; the script succeeded when it printed nothing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutesResult {
    pub success: bool,
    pub message: String,
}

impl ExecutesResult {
    pub fn from_output(output: String) -> Self {
        Self {
            success: output.is_empty(),
            message: output,
        }
    }
}

/// Escape a value for a Groovy double-quoted string
fn groovy_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Groovy script that configures the admin address and the mailer
pub fn mail_server_script(server: &EmailServerConfig) -> String {
    format!(
        r#"
import jenkins.model.*

def emailFromName = "{name}"
def emailFromAddr = "{addr}"
def emailFromPass = "{pass}"
def emailSmtpHost = "{host}"
def emailSmtpPort = "{port}"
def ssl = {ssl}

def locationConfig = JenkinsLocationConfiguration.get()
locationConfig.adminAddress = "${{emailFromName}} <${{emailFromAddr}}>"
locationConfig.save()

def mailer = Jenkins.instance.getDescriptor("hudson.tasks.Mailer")
mailer.setSmtpAuth(emailFromAddr, emailFromPass)
mailer.setReplyToAddress("{reply_to}")
mailer.setSmtpHost(emailSmtpHost)
mailer.setUseSsl(ssl)
mailer.setSmtpPort(emailSmtpPort)
mailer.save()"#,
        name = groovy_escape(&server.email),
        addr = groovy_escape(&server.from_email_addr),
        pass = groovy_escape(&server.password),
        host = groovy_escape(&server.email_host),
        port = server.port,
        ssl = server.ssl_enable,
        reply_to = groovy_escape(&server.reply_to),
    )
}

/// Configure the Jenkins mailer through the script console
pub async fn set_mail_server(
    jenkins: &Jenkins,
    server: &EmailServerConfig,
) -> JenkinsResult<ExecutesResult> {
    let output = jenkins.execute_script(&mail_server_script(server)).await?;
    let result = ExecutesResult::from_output(output);
    if !result.success {
        jenkins
            .output
            .warning(&format!("Mail server script printed: {}", result.message));
    }
    Ok(result)
}
