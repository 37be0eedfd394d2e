mod common;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use common::{FakeServer, Seen};
use devops_clients::devops::{EmailServerConfig, set_mail_server};
use devops_clients::jenkins::{
    BuildOptions, CreateJobOptions, Credential, Jenkins, JenkinsConfig, ProjectPermissionIds,
};
use devops_clients::logging::Logger;
use devops_clients::JenkinsError;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

const ROOT: &str = r#"{"mode":"NORMAL","nodeDescription":"the master Jenkins node","numExecutors":2,"jobs":[{"_class":"com.cloudbees.hudson.plugins.folder.Folder","name":"project","url":"http://jenkins/job/project/"}],"useCrumbs":true,"useSecurity":true}"#;
const CRUMB: &str = r#"{"_class":"hudson.security.csrf.DefaultCrumbIssuer","crumb":"c0ffee","crumbRequestField":"Jenkins-Crumb"}"#;

fn jenkins(server: &FakeServer) -> Jenkins {
    let config = JenkinsConfig::new(&format!("{}/", server.url)).with_auth("admin", "token");
    Jenkins::new(&config, Logger::new_quiet()).unwrap()
}

fn form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

/// Jenkins with CSRF protection that accepts every POST
fn with_crumb(seen: &Seen) -> Response {
    match (seen.method.as_str(), seen.path.as_str()) {
        ("GET", "/crumbIssuer/api/json") => (StatusCode::OK, CRUMB).into_response(),
        ("GET", "/api/json") => {
            (StatusCode::OK, [("X-Jenkins", "2.401.3")], ROOT).into_response()
        }
        ("POST", _) => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

#[tokio::test]
async fn test_init_reads_version() {
    let server = FakeServer::start(with_crumb).await;
    let jenkins = jenkins(&server).init().await.unwrap();

    assert_eq!(jenkins.version, "2.401.3");
    assert_eq!(jenkins.server, server.url);
    assert_eq!(jenkins.raw.jobs.len(), 1);
    assert!(jenkins.raw.use_crumbs);

    let requests = server.requests();
    assert_eq!(requests[0].path, "/api/json");
    // YWRtaW46dG9rZW4= is base64("admin:token")
    assert_eq!(
        requests[0].authorization.as_deref(),
        Some("Basic YWRtaW46dG9rZW4=")
    );
}

#[tokio::test]
async fn test_credential_post_carries_crumb() {
    let server = FakeServer::start(with_crumb).await;
    let jenkins = jenkins(&server);
    let credential = Credential::UsernamePassword {
        id: "registry".to_string(),
        username: "robot".to_string(),
        password: "s3cret".to_string(),
        description: "pull secret".to_string(),
    };

    let id = jenkins
        .create_credential_in_folder("", &credential, &["project"])
        .await
        .unwrap();
    assert_eq!(id, "registry");

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/crumbIssuer/api/json");

    let post = &requests[1];
    assert_eq!(post.method, "POST");
    assert_eq!(
        post.path,
        "/job/project/credentials/store/folder/domain/_/createCredentials"
    );
    assert_eq!(post.header("Jenkins-Crumb"), Some("c0ffee"));

    let payload: serde_json::Value = serde_json::from_str(&form(&post.body)["json"]).unwrap();
    assert_eq!(payload["credentials"]["id"], "registry");
    assert_eq!(payload["credentials"]["username"], "robot");
}

#[tokio::test]
async fn test_credential_in_folder_requires_folder() {
    let server = FakeServer::start(with_crumb).await;
    let jenkins = jenkins(&server);

    let result = jenkins
        .delete_credential_in_folder("", "registry", &[])
        .await;
    assert!(matches!(result, Err(JenkinsError::Validation(_))));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_post_without_csrf_protection() {
    let server = FakeServer::start(|seen: &Seen| match seen.method.as_str() {
        "POST" => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);

    jenkins.delete_job("app", &["project"]).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].path, "/job/project/job/app/doDelete");
    assert_eq!(requests[1].header("Jenkins-Crumb"), None);
}

#[tokio::test]
async fn test_build_with_parameters_returns_queue_id() {
    let server = FakeServer::start(|seen: &Seen| match seen.method.as_str() {
        "POST" => {
            let location = format!("http://{}/queue/item/17/", seen.host);
            (StatusCode::CREATED, [("Location", location)], "").into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);

    let options = BuildOptions::default().with_parameter("BRANCH", "main");
    let queue_id = jenkins.build_job("project/app", &options).await.unwrap();
    assert_eq!(queue_id, 17);

    let post = server.requests().pop().unwrap();
    assert_eq!(post.path, "/job/project/job/app/buildWithParameters");
    assert_eq!(post.query, "BRANCH=main");

    jenkins
        .build_job("project/app", &BuildOptions::default())
        .await
        .unwrap();
    let post = server.requests().pop().unwrap();
    assert_eq!(post.path, "/job/project/job/app/build");
}

#[tokio::test]
async fn test_create_job_posts_config_xml() {
    let server = FakeServer::start(|seen: &Seen| match (seen.method.as_str(), seen.path.as_str()) {
        ("POST", "/job/project/createItem") => StatusCode::OK.into_response(),
        ("GET", "/job/project/job/app/api/json") => (
            StatusCode::OK,
            r#"{"_class":"hudson.model.FreeStyleProject","name":"app","fullName":"project/app","buildable":true}"#,
        )
            .into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);

    let options = CreateJobOptions::new("app", "<project></project>").in_folder("project");
    let job = jenkins.create_job(&options).await.unwrap();
    assert_eq!(job.full_name, "project/app");

    let post = server
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .unwrap();
    assert_eq!(post.query, "name=app");
    assert_eq!(post.body, "<project></project>");
    assert_eq!(post.header("content-type"), Some("application/xml"));
}

#[tokio::test]
async fn test_create_job_requires_name() {
    let server = FakeServer::start(with_crumb).await;
    let jenkins = jenkins(&server);

    let result = jenkins
        .create_job(&CreateJobOptions::new("", "<project/>"))
        .await;
    assert!(matches!(result, Err(JenkinsError::Validation(_))));
    assert!(server.requests().is_empty());
}

#[tokio::test]
async fn test_missing_job_is_status_error() {
    let server = FakeServer::start(|_: &Seen| StatusCode::NOT_FOUND.into_response()).await;
    let jenkins = jenkins(&server);

    let none: [&str; 0] = [];
    match jenkins.get_job("ghost", &none).await {
        Err(err @ JenkinsError::Status { .. }) => assert_eq!(err.status_code(), 404),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_project_roles() {
    let server = FakeServer::start(|seen: &Seen| match (seen.method.as_str(), seen.path.as_str()) {
        ("GET", "/role-strategy/strategy/getRole") if seen.query.contains("roleName=viewer") => (
            StatusCode::OK,
            r#"{"permissionIds":{"hudson.model.Item.Read":true,"hudson.model.Item.Build":false},"sids":["alice"],"pattern":"project-.*"}"#,
        )
            .into_response(),
        ("GET", "/role-strategy/strategy/getRole") => (StatusCode::OK, "{}").into_response(),
        ("POST", _) => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);

    let viewer = jenkins.get_project_role("viewer").await.unwrap().unwrap();
    assert_eq!(viewer.role_name, "viewer");
    assert!(viewer.permission_ids.item_read);
    assert!(!viewer.permission_ids.item_build);
    assert_eq!(viewer.pattern, "project-.*");

    assert!(jenkins.get_project_role("unknown").await.unwrap().is_none());

    let permissions = ProjectPermissionIds {
        item_read: true,
        item_build: true,
        ..Default::default()
    };
    jenkins
        .add_project_role("developer", "project-.*", permissions, true)
        .await
        .unwrap();

    let post = server.requests().pop().unwrap();
    assert_eq!(post.path, "/role-strategy/strategy/addRole");
    let fields = form(&post.body);
    assert_eq!(fields["type"], "projectRoles");
    assert_eq!(
        fields["permissionIds"],
        "hudson.model.Item.Build,hudson.model.Item.Read"
    );
    assert_eq!(fields["overwrite"], "true");
    assert_eq!(fields["pattern"], "project-.*");
}

#[tokio::test]
async fn test_mail_server_script_execution() {
    let server = FakeServer::start(|seen: &Seen| match seen.path.as_str() {
        "/scriptText" => StatusCode::OK.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);
    let config = EmailServerConfig {
        email: "DevOps".to_string(),
        password: "smtp-pass".to_string(),
        email_host: "smtp.example.com".to_string(),
        port: 587,
        from_email_addr: "devops@example.com".to_string(),
        ssl_enable: false,
        reply_to: "no-reply@example.com".to_string(),
    };

    let result = set_mail_server(&jenkins, &config).await.unwrap();
    assert!(result.success);
    assert_eq!(result.message, "");

    let post = server.requests().pop().unwrap();
    let fields = form(&post.body);
    let script = &fields["script"];
    assert!(script.contains(r#"def emailSmtpHost = "smtp.example.com""#));
    assert!(script.contains("def ssl = false"));
}

#[tokio::test]
async fn test_script_output_means_failure() {
    let server = FakeServer::start(|seen: &Seen| match seen.path.as_str() {
        "/scriptText" => (StatusCode::OK, "No such property: mailer").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    })
    .await;
    let jenkins = jenkins(&server);

    assert_eq!(
        jenkins.execute_script("println 'hi'").await.unwrap(),
        "No such property: mailer"
    );
}

#[tokio::test]
async fn test_connection_gate_bounds_in_flight_requests() {
    let server = FakeServer::start_with_delay(Duration::from_millis(100), with_crumb).await;
    let config = JenkinsConfig::new(&server.url).with_max_connections(2);
    let jenkins = Jenkins::new(&config, Logger::new_quiet()).unwrap();

    let started = Instant::now();
    let mut set = JoinSet::new();
    for _ in 0..6 {
        let jenkins = jenkins.clone();
        set.spawn(async move { jenkins.poll().await });
    }
    while let Some(result) = set.join_next().await {
        assert_eq!(result.unwrap().unwrap(), 200);
    }

    assert_eq!(server.requests().len(), 6);
    assert_eq!(server.peak_in_flight(), 2);
    // six requests through two slots take at least three rounds
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(jenkins.available_connections(), 2);
}
