//! Role management through the role-strategy plugin
//!
//! Permission sets are plain structs of flags. Each flag maps to its Jenkins permission id
//! through a table generated at compile time, so the ids sent on the wire follow the
//! declaration order of the flags.

use crate::error::{JenkinsError, JenkinsResult};
use crate::jenkins::client::Jenkins;
use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ROLE_STRATEGY: &str = "/role-strategy/strategy";

macro_rules! permission_table {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $field:ident => $id:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name {
            $( pub $field: bool, )*
        }

        impl $name {
            /// Every permission id of the table, in declaration order
            pub const IDS: &'static [&'static str] = &[$($id),*];

            pub fn all() -> Self {
                Self { $( $field: true, )* }
            }

            /// Ids of the granted permissions, in declaration order
            pub fn granted(&self) -> Vec<&'static str> {
                let mut ids = Vec::new();
                $( if self.$field { ids.push($id); } )*
                ids
            }

            /// Flags set from permission ids; unknown ids are ignored
            pub fn from_ids<'a, I>(ids: I) -> Self
            where
                I: IntoIterator<Item = &'a str>,
            {
                let mut permissions = Self::default();
                for id in ids {
                    match id {
                        $( $id => permissions.$field = true, )*
                        _ => {}
                    }
                }
                permissions
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let values = [$( self.$field ),*];
                serializer.collect_map(Self::IDS.iter().zip(values))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let map = BTreeMap::<String, bool>::deserialize(deserializer)?;
                Ok(Self::from_ids(
                    map.iter().filter(|(_, granted)| **granted).map(|(id, _)| id.as_str()),
                ))
            }
        }
    };
}

permission_table! {
    /// Permissions of a global role
    GlobalPermissionIds {
        administer => "hudson.model.Hudson.Administer",
        global_read => "hudson.model.Hudson.Read",
        credential_create => "com.cloudbees.plugins.credentials.CredentialsProvider.Create",
        credential_update => "com.cloudbees.plugins.credentials.CredentialsProvider.Update",
        credential_view => "com.cloudbees.plugins.credentials.CredentialsProvider.View",
        credential_delete => "com.cloudbees.plugins.credentials.CredentialsProvider.Delete",
        credential_manage_domains => "com.cloudbees.plugins.credentials.CredentialsProvider.ManageDomains",
        slave_create => "hudson.model.Computer.Create",
        slave_configure => "hudson.model.Computer.Configure",
        slave_delete => "hudson.model.Computer.Delete",
        slave_build => "hudson.model.Computer.Build",
        slave_connect => "hudson.model.Computer.Connect",
        slave_disconnect => "hudson.model.Computer.Disconnect",
        item_build => "hudson.model.Item.Build",
        item_create => "hudson.model.Item.Create",
        item_delete => "hudson.model.Item.Delete",
        item_configure => "hudson.model.Item.Configure",
        item_cancel => "hudson.model.Item.Cancel",
        item_move => "hudson.model.Item.Move",
        item_discover => "hudson.model.Item.Discover",
        item_read => "hudson.model.Item.Read",
        item_workspace => "hudson.model.Item.Workspace",
        run_delete => "hudson.model.Run.Delete",
        run_update => "hudson.model.Run.Update",
        run_replay => "hudson.model.Run.Replay",
        view_create => "hudson.model.View.Create",
        view_delete => "hudson.model.View.Delete",
        view_configure => "hudson.model.View.Configure",
        view_read => "hudson.model.View.Read",
        scm_tag => "hudson.scm.SCM.Tag",
    }
}

permission_table! {
    /// Permissions of a project role
    ProjectPermissionIds {
        credential_create => "com.cloudbees.plugins.credentials.CredentialsProvider.Create",
        credential_update => "com.cloudbees.plugins.credentials.CredentialsProvider.Update",
        credential_view => "com.cloudbees.plugins.credentials.CredentialsProvider.View",
        credential_delete => "com.cloudbees.plugins.credentials.CredentialsProvider.Delete",
        credential_manage_domains => "com.cloudbees.plugins.credentials.CredentialsProvider.ManageDomains",
        item_build => "hudson.model.Item.Build",
        item_create => "hudson.model.Item.Create",
        item_delete => "hudson.model.Item.Delete",
        item_configure => "hudson.model.Item.Configure",
        item_cancel => "hudson.model.Item.Cancel",
        item_move => "hudson.model.Item.Move",
        item_discover => "hudson.model.Item.Discover",
        item_read => "hudson.model.Item.Read",
        item_workspace => "hudson.model.Item.Workspace",
        run_delete => "hudson.model.Run.Delete",
        run_update => "hudson.model.Run.Update",
        run_replay => "hudson.model.Run.Replay",
        scm_tag => "hudson.scm.SCM.Tag",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleType {
    Global,
    Project,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Global => "globalRoles",
            RoleType::Project => "projectRoles",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRole {
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub permission_ids: GlobalPermissionIds,
    #[serde(default)]
    pub sids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRole {
    #[serde(default)]
    pub role_name: String,
    #[serde(default)]
    pub permission_ids: ProjectPermissionIds,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub sids: Vec<String>,
}

impl Jenkins {
    async fn get_role<T>(&self, role_name: &str, role_type: RoleType) -> JenkinsResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = self
            .requester
            .get(
                &format!("{}/getRole", ROLE_STRATEGY),
                &[("roleName", role_name), ("type", role_type.as_str())],
            )
            .await?
            .ensure_ok()?;

        // the plugin answers `{}` for unknown roles
        if response.body.trim() == "{}" {
            return Ok(None);
        }
        Ok(Some(response.json()?))
    }

    pub async fn get_global_role(&self, role_name: &str) -> JenkinsResult<Option<GlobalRole>> {
        let role: Option<GlobalRole> = self.get_role(role_name, RoleType::Global).await?;
        Ok(role.map(|role| GlobalRole {
            role_name: role_name.to_string(),
            ..role
        }))
    }

    pub async fn get_project_role(&self, role_name: &str) -> JenkinsResult<Option<ProjectRole>> {
        let role: Option<ProjectRole> = self.get_role(role_name, RoleType::Project).await?;
        Ok(role.map(|role| ProjectRole {
            role_name: role_name.to_string(),
            ..role
        }))
    }

    pub async fn add_global_role(
        &self,
        role_name: &str,
        permissions: GlobalPermissionIds,
        overwrite: bool,
    ) -> JenkinsResult<GlobalRole> {
        let ids = permissions.granted().join(",");
        let overwrite = overwrite.to_string();
        self.requester
            .post_form(
                &format!("{}/addRole", ROLE_STRATEGY),
                &[],
                &[
                    ("roleName", role_name),
                    ("type", RoleType::Global.as_str()),
                    ("permissionIds", ids.as_str()),
                    ("overwrite", overwrite.as_str()),
                ],
            )
            .await?
            .ensure_ok()?;

        Ok(GlobalRole {
            role_name: role_name.to_string(),
            permission_ids: permissions,
            sids: Vec::new(),
        })
    }

    pub async fn add_project_role(
        &self,
        role_name: &str,
        pattern: &str,
        permissions: ProjectPermissionIds,
        overwrite: bool,
    ) -> JenkinsResult<ProjectRole> {
        let ids = permissions.granted().join(",");
        let overwrite = overwrite.to_string();
        self.requester
            .post_form(
                &format!("{}/addRole", ROLE_STRATEGY),
                &[],
                &[
                    ("roleName", role_name),
                    ("type", RoleType::Project.as_str()),
                    ("permissionIds", ids.as_str()),
                    ("overwrite", overwrite.as_str()),
                    ("pattern", pattern),
                ],
            )
            .await?
            .ensure_ok()?;

        Ok(ProjectRole {
            role_name: role_name.to_string(),
            permission_ids: permissions,
            pattern: pattern.to_string(),
            sids: Vec::new(),
        })
    }

    pub async fn delete_project_roles(&self, role_names: &[&str]) -> JenkinsResult<()> {
        if role_names.is_empty() {
            return Err(JenkinsError::Validation(
                "at least one role name is required".to_string(),
            ));
        }
        let names = role_names.join(",");
        self.requester
            .post_form(
                &format!("{}/removeRoles", ROLE_STRATEGY),
                &[],
                &[("type", RoleType::Project.as_str()), ("roleNames", names.as_str())],
            )
            .await?
            .ensure_ok()?;
        Ok(())
    }

    /// Remove `username` from every project role
    pub async fn delete_user_in_project(&self, username: &str) -> JenkinsResult<()> {
        self.requester
            .post_form(
                &format!("{}/deleteSid", ROLE_STRATEGY),
                &[],
                &[("type", RoleType::Project.as_str()), ("sid", username)],
            )
            .await?
            .ensure_ok()?;
        Ok(())
    }

    pub async fn assign_role(
        &self,
        role_type: RoleType,
        role_name: &str,
        sid: &str,
    ) -> JenkinsResult<()> {
        self.sid_change("assignRole", role_type, role_name, sid).await
    }

    pub async fn unassign_role(
        &self,
        role_type: RoleType,
        role_name: &str,
        sid: &str,
    ) -> JenkinsResult<()> {
        self.sid_change("unassignRole", role_type, role_name, sid)
            .await
    }

    async fn sid_change(
        &self,
        action: &str,
        role_type: RoleType,
        role_name: &str,
        sid: &str,
    ) -> JenkinsResult<()> {
        self.requester
            .post_form(
                &format!("{}/{}", ROLE_STRATEGY, action),
                &[],
                &[
                    ("type", role_type.as_str()),
                    ("roleName", role_name),
                    ("sid", sid),
                ],
            )
            .await?
            .ensure_ok()?;
        Ok(())
    }
}
