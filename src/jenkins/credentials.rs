//! Credential payloads understood by the Jenkins credentials plugin

use crate::error::{JenkinsError, JenkinsResult};
use crate::jenkins::client::Jenkins;
use serde_json::{Value, json};

const SSH_CLASS: &str = "com.cloudbees.jenkins.plugins.sshcredentials.impl.BasicSSHUserPrivateKey";
const SSH_KEY_SOURCE_CLASS: &str = "com.cloudbees.jenkins.plugins.sshcredentials.impl.BasicSSHUserPrivateKey$DirectEntryPrivateKeySource";
const USERNAME_PASSWORD_CLASS: &str =
    "com.cloudbees.plugins.credentials.impl.UsernamePasswordCredentialsImpl";
const SECRET_TEXT_CLASS: &str = "org.jenkinsci.plugins.plaincredentials.impl.StringCredentialsImpl";
const KUBECONFIG_CLASS: &str = "com.microsoft.jenkins.kubernetes.credentials.KubeconfigCredentials";
const KUBECONFIG_SOURCE_CLASS: &str = "com.microsoft.jenkins.kubernetes.credentials.KubeconfigCredentials$DirectEntryKubeconfigSource";

pub const GLOBAL_SCOPE: &str = "GLOBAL";

/// A credential to store in Jenkins
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Ssh {
        id: String,
        username: String,
        passphrase: String,
        private_key: String,
        description: String,
    },
    UsernamePassword {
        id: String,
        username: String,
        password: String,
        description: String,
    },
    SecretText {
        id: String,
        secret: String,
        description: String,
    },
    Kubeconfig {
        id: String,
        content: String,
        description: String,
    },
}

impl Credential {
    pub fn id(&self) -> &str {
        match self {
            Credential::Ssh { id, .. }
            | Credential::UsernamePassword { id, .. }
            | Credential::SecretText { id, .. }
            | Credential::Kubeconfig { id, .. } => id,
        }
    }

    /// The credential object as posted to `updateSubmit`
    pub fn to_json(&self) -> Value {
        match self {
            Credential::Ssh {
                id,
                username,
                passphrase,
                private_key,
                description,
            } => json!({
                "scope": GLOBAL_SCOPE,
                "id": id,
                "username": username,
                "passphrase": passphrase,
                "privateKeySource": {
                    "stapler-class": SSH_KEY_SOURCE_CLASS,
                    "privateKey": private_key,
                },
                "description": description,
                "stapler-class": SSH_CLASS,
                "$class": SSH_CLASS,
            }),
            Credential::UsernamePassword {
                id,
                username,
                password,
                description,
            } => json!({
                "scope": GLOBAL_SCOPE,
                "id": id,
                "username": username,
                "password": password,
                "description": description,
                "stapler-class": USERNAME_PASSWORD_CLASS,
                "$class": USERNAME_PASSWORD_CLASS,
            }),
            Credential::SecretText {
                id,
                secret,
                description,
            } => json!({
                "scope": GLOBAL_SCOPE,
                "id": id,
                "secret": secret,
                "description": description,
                "stapler-class": SECRET_TEXT_CLASS,
                "$class": SECRET_TEXT_CLASS,
            }),
            Credential::Kubeconfig {
                id,
                content,
                description,
            } => json!({
                "scope": GLOBAL_SCOPE,
                "id": id,
                "description": description,
                "kubeconfigSource": {
                    "stapler-class": KUBECONFIG_SOURCE_CLASS,
                    "content": content,
                },
                "stapler-class": KUBECONFIG_CLASS,
                "$class": KUBECONFIG_CLASS,
            }),
        }
    }

    /// The credential wrapped as posted to `createCredentials`
    pub fn to_create_json(&self) -> Value {
        json!({
            "": "0",
            "credentials": self.to_json(),
        })
    }
}

/// `/job/a/job/b` prefix of the folder store; at least one folder is required
pub(crate) fn folder_store_path(domain: &str, folders: &[&str]) -> Option<String> {
    if folders.is_empty() {
        return None;
    }
    let domain = if domain.is_empty() { "_" } else { domain };
    let prefix: String = folders.iter().map(|f| format!("/job/{}", f)).collect();
    Some(format!(
        "{}/credentials/store/folder/domain/{}",
        prefix, domain
    ))
}

fn require_folder_store(domain: &str, folders: &[&str]) -> JenkinsResult<String> {
    folder_store_path(domain, folders)
        .ok_or_else(|| JenkinsError::Validation("folder name should not be empty".to_string()))
}

impl Jenkins {
    /// Store `credential` in the system store; returns its id
    pub async fn create_credential(&self, credential: &Credential) -> JenkinsResult<String> {
        let json = credential.to_create_json().to_string();
        self.requester
            .post_form(
                "/credentials/store/system/domain/_/createCredentials",
                &[],
                &[("json", json.as_str())],
            )
            .await?
            .ensure_ok()?;
        Ok(credential.id().to_string())
    }

    /// Store `credential` in the innermost of `folders`; an empty domain means `_`
    pub async fn create_credential_in_folder(
        &self,
        domain: &str,
        credential: &Credential,
        folders: &[&str],
    ) -> JenkinsResult<String> {
        let store = require_folder_store(domain, folders)?;
        let json = credential.to_create_json().to_string();
        self.requester
            .post_form(
                &format!("{}/createCredentials", store),
                &[],
                &[("json", json.as_str())],
            )
            .await?
            .ensure_ok()?;
        self.output
            .verbose(&format!("Created credential {}", credential.id()));
        Ok(credential.id().to_string())
    }

    pub async fn update_credential_in_folder(
        &self,
        domain: &str,
        credential: &Credential,
        folders: &[&str],
    ) -> JenkinsResult<String> {
        let store = require_folder_store(domain, folders)?;
        let json = credential.to_json().to_string();
        self.requester
            .post_form(
                &format!("{}/credential/{}/updateSubmit", store, credential.id()),
                &[],
                &[("json", json.as_str())],
            )
            .await?
            .ensure_ok()?;
        Ok(credential.id().to_string())
    }

    pub async fn delete_credential_in_folder(
        &self,
        domain: &str,
        id: &str,
        folders: &[&str],
    ) -> JenkinsResult<String> {
        let store = require_folder_store(domain, folders)?;
        self.requester
            .post_form(&format!("{}/credential/{}/doDelete", store, id), &[], &[])
            .await?
            .ensure_ok()?;
        Ok(id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_payload() {
        let credential = Credential::Ssh {
            id: "git-key".to_string(),
            username: "git".to_string(),
            passphrase: String::new(),
            private_key: "-----BEGIN KEY-----".to_string(),
            description: "deploy key".to_string(),
        };
        let create = credential.to_create_json();
        assert_eq!(create[""], "0");
        assert_eq!(create["credentials"]["id"], "git-key");
        assert_eq!(create["credentials"]["$class"], SSH_CLASS);
        assert_eq!(
            create["credentials"]["privateKeySource"]["privateKey"],
            "-----BEGIN KEY-----"
        );
    }

    #[test]
    fn test_kubeconfig_payload() {
        let credential = Credential::Kubeconfig {
            id: "kc".to_string(),
            content: "apiVersion: v1".to_string(),
            description: String::new(),
        };
        let payload = credential.to_json();
        assert_eq!(payload["kubeconfigSource"]["content"], "apiVersion: v1");
        assert_eq!(payload["stapler-class"], KUBECONFIG_CLASS);
        assert_eq!(credential.id(), "kc");
    }

    #[test]
    fn test_folder_store_path() {
        assert_eq!(
            folder_store_path("", &["project", "team"]).unwrap(),
            "/job/project/job/team/credentials/store/folder/domain/_"
        );
        assert_eq!(
            folder_store_path("github", &["project"]).unwrap(),
            "/job/project/credentials/store/folder/domain/github"
        );
        assert!(folder_store_path("", &[]).is_none());
    }
}
