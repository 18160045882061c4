use std::time::Duration;

use metricizer::jenkins::JenkinsClient;
use metricizer::load_config::JenkinsConfig;
use metricizer_core::assemble::{BuildType, StaticMetadata};
use metricizer_core::collect::{collect_metrics, CollectOptions};
use metricizer_core::contract::Fetcher;
use metricizer_core::model::{Arch, Credentials, Distro, JobLocator, Variant};
use metricizer_core::MetricsError;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOB: &str = "rhsm-rhel-7.5-AllDistros-Tier1Tests";
const CONFIGURATION: &str = "PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm";
/// base64("ci-bot:secret")
const BASIC_AUTH: &str = "Basic Y2ktYm90OnNlY3JldA==";

fn credentials() -> Credentials {
    Credentials {
        user: "ci-bot".into(),
        password: "secret".into(),
    }
}

fn client() -> JenkinsClient {
    JenkinsClient::new(&JenkinsConfig {
        url: String::new(),
        credentials: credentials(),
        accept_invalid_certs: false,
        request_timeout: Some(Duration::from_secs(5)),
    })
    .expect("failed to create client")
}

#[tokio::test]
async fn test_fetch_sends_basic_auth_and_accept_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/view/QE/job/J/43/api/json"))
        .and(query_param("tree", "timestamp"))
        .and(header("authorization", BASIC_AUTH))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"timestamp":1}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/view/QE/job/J/43/api/json?tree=timestamp", mock_server.uri());
    let body = client()
        .fetch(&url, &credentials())
        .await
        .expect("fetch failed");
    assert_eq!(body, br#"{"timestamp":1}"#);
}

#[tokio::test]
async fn test_fetch_maps_error_status_to_fetch_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid password/token"))
        .mount(&mock_server)
        .await;

    let url = format!("{}/view/QE/job/J/43/api/json?pretty=true", mock_server.uri());
    let err = client().fetch(&url, &credentials()).await.unwrap_err();
    match err {
        MetricsError::Fetch { url: failed, message } => {
            assert_eq!(failed, url);
            assert!(message.contains("401"), "got: {message}");
            assert!(message.contains("Invalid password"), "got: {message}");
        }
        other => panic!("expected Fetch error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_reports_unreachable_server() {
    let mock_server = MockServer::start().await;
    let url = format!("{}/view/QE/job/J/43/api/json", mock_server.uri());
    drop(mock_server);

    let err = client().fetch(&url, &credentials()).await.unwrap_err();
    assert!(matches!(err, MetricsError::Fetch { .. }), "got {err:?}");
}

async fn mount_build(mock_server: &MockServer) {
    let build = format!("/view/QE-RHEL7.5/job/{JOB}/13");
    let configuration = format!("/view/QE-RHEL7.5/job/{JOB}/{CONFIGURATION}/13");
    let runs = format!(
        r#"{{"runs":[{{"number":13,"url":"{uri}/view/QE-RHEL7.5/job/{JOB}/{CONFIGURATION}/13/"}}]}}"#,
        uri = mock_server.uri()
    );

    let mounts = [
        (
            format!("{build}/api/json"),
            Some(("pretty", "true")),
            r#"{"actions":[{"causes":[{"shortDescription":"Started by Timer"}]}]}"#.to_string(),
        ),
        (
            format!("{build}/api/json"),
            Some(("tree", "timestamp")),
            r#"{"timestamp":1507597918523}"#.to_string(),
        ),
        (
            format!("{build}/api/json"),
            Some(("tree", "runs[number,url]")),
            runs,
        ),
        (
            format!("{build}/injectedEnvVars/export"),
            None,
            "JOB_NAME=rhsm-rhel-7.5-AllDistros-Tier1Tests\nBUILD_URL=https://jenkins/job/x/13/\n".to_string(),
        ),
        (
            format!("{configuration}/artifact/test-output/testng-polarion.xml"),
            None,
            r#"<testsuites><testsuite tests="4" failures="1" errors="0" skipped="0" time="2.0"/></testsuites>"#.to_string(),
        ),
        (
            format!("{configuration}/artifact/test-output/CI_MESSAGE.json"),
            None,
            r#"{"build":{"task_id":42},"rpms":{"x86_64":["subscription-manager-1.20.2-1.el7.x86_64.rpm"]}}"#.to_string(),
        ),
    ];

    for (endpoint, query, body) in mounts {
        let mut mock = Mock::given(method("GET"))
            .and(path(endpoint.as_str()))
            .and(header("authorization", BASIC_AUTH));
        if let Some((key, value)) = query {
            mock = mock.and(query_param(key, value));
        }
        mock.respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(mock_server)
            .await;
    }
}

#[tokio::test]
async fn test_collects_record_over_http() {
    let mock_server = MockServer::start().await;
    mount_build(&mock_server).await;

    let locator = JobLocator {
        jenkins_url: format!("{}/", mock_server.uri()),
        tab: "QE-RHEL7.5".into(),
        job: JOB.into(),
        build: 13,
        credentials: credentials(),
    };
    let distro = Distro {
        major: 7,
        minor: Some(5),
        variant: Variant::Server,
        arch: Arch::X86_64,
    };

    let record = collect_metrics(
        &client(),
        &locator,
        &distro,
        &StaticMetadata::default(),
        &CollectOptions::default(),
    )
    .await
    .expect("collection should succeed");

    assert_eq!(record.trigger, "timer");
    assert_eq!(record.build_type, BuildType::Internal);
    assert_eq!(record.brew_task_id, "42");
    assert_eq!(record.component, "subscription-manager-1.20.2-1.el7.x86_64.rpm");
    assert_eq!(record.tests[0].executed, 4);
    assert_eq!(record.tests[0].failed, 1);
    assert_eq!(record.tests[0].passed, 3);
    assert_eq!(record.ci_tier, 1);
    assert_eq!(record.base_distro, "RHEL 7.5");
    assert_eq!(record.create_time, "2017-10-10T01:11:58.523Z");
    assert_eq!(record.completion_time, "2017-10-10T01:12:00.523Z");
    assert_eq!(record.job_name, JOB);
    assert_eq!(record.jenkins_build_url, "https://jenkins/job/x/13/");
}
