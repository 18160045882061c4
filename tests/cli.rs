use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{read_to_string, write};
use tempfile::{NamedTempFile, TempDir};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOB: &str = "rhsm-rhel-7.5-x86_64-Tier2Tests";
const CONFIGURATION: &str = "PLATFORM=RedHatEnterpriseLinux7-Server-x86_64,label=rhsm";

/// Creates a config file pointing at `jenkins_url`.
fn create_config(jenkins_url: &str) -> NamedTempFile {
    let config = NamedTempFile::new().expect("Creating temp config file failed");
    write(
        config.path(),
        format!(
            "jenkins:\n  url: {jenkins_url}\n  user: ci-bot\n  timeout_secs: 5\nmetadata:\n  team: rhsm-qe\n  recipients: [rhsm-qe]\n"
        ),
    )
    .expect("Writing temp config failed");
    config
}

async fn mount_build(mock_server: &MockServer) {
    let build = format!("/view/job/{JOB}/7");
    let configuration = format!("/view/job/{JOB}/{CONFIGURATION}/7");
    let get = |p: String| Mock::given(method("GET")).and(path(p));

    get(format!("{build}/api/json"))
        .and(query_param("pretty", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"actions":[{"causes":[{"shortDescription":"Triggered by CI message."}]}]}"#,
        ))
        .mount(mock_server)
        .await;
    get(format!("{build}/api/json"))
        .and(query_param("tree", "timestamp"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"timestamp":1507597918523}"#))
        .mount(mock_server)
        .await;
    get(format!("{build}/api/json"))
        .and(query_param("tree", "runs[number,url]"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"runs":[{{"number":7,"url":"{}/job/{JOB}/{CONFIGURATION}/7/"}}]}}"#,
            mock_server.uri()
        )))
        .mount(mock_server)
        .await;
    get(format!("{build}/injectedEnvVars/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"envMap":{"JOB_NAME":"rhsm"}}"#))
        .mount(mock_server)
        .await;
    get(format!("{configuration}/artifact/test-output/testng-polarion.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<testsuites><testsuite tests="3" failures="0" errors="0" skipped="1" time="1.0"/></testsuites>"#,
        ))
        .mount(mock_server)
        .await;
    // The CI message is missing, so the bundled fallback applies unless disabled.
    get(format!("{configuration}/artifact/test-output/CI_MESSAGE.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(mock_server)
        .await;
}

fn collect_args(cmd: &mut Command, config: &NamedTempFile) {
    cmd.arg("collect")
        .arg("--config")
        .arg(config.path())
        .args(["--job", JOB, "--build", "7", "--major", "7", "--minor", "5"])
        .args(["--variant", "Server", "--arch", "x86_64"])
        .env("JENKINS_PASSWORD", "secret");
}

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("collect"))
        .stdout(predicate::str::contains("serve"));
}

#[test]
fn collect_fails_on_missing_config() {
    let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
    cmd.args(["collect", "--config", "/nonexistent/metricizer.yaml"])
        .args(["--job", JOB, "--build", "7", "--major", "7"])
        .args(["--variant", "Server", "--arch", "x86_64"])
        .env("JENKINS_PASSWORD", "secret")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn collect_rejects_unknown_variant() {
    let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
    cmd.args(["collect", "--config", "c.yaml", "--job", JOB, "--build", "7"])
        .args(["--major", "7", "--variant", "Desktop", "--arch", "x86_64"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown variant"));
}

#[tokio::test(flavor = "multi_thread")]
async fn collect_prints_record_to_stdout() {
    let mock_server = MockServer::start().await;
    mount_build(&mock_server).await;
    let config = create_config(&mock_server.uri());

    let output = tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
        collect_args(&mut cmd, &config);
        cmd.output().expect("Running metricizer failed")
    })
    .await
    .unwrap();

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let record: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(record["trigger"], "brew");
    assert_eq!(record["build_type"], "official");
    assert_eq!(record["CI_tier"], 2);
    assert_eq!(record["base_distro"], "RHEL 7.5");
    assert_eq!(record["brew_task_id"], "14287541");
    assert_eq!(record["tests"][0]["executed"], 3);
    assert_eq!(record["tests"][0]["passed"], 2);
    assert_eq!(record["job_name"], "rhsm");
    assert_eq!(record["team"], "rhsm-qe");
}

#[tokio::test(flavor = "multi_thread")]
async fn collect_writes_output_file_and_honours_no_fallback() {
    let mock_server = MockServer::start().await;
    mount_build(&mock_server).await;
    let config = create_config(&mock_server.uri());
    let out_dir = TempDir::new().expect("temp dir");
    let out_path = out_dir.path().join("metrics.json");

    let (written, strict) = tokio::task::spawn_blocking(move || {
        let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
        collect_args(&mut cmd, &config);
        cmd.arg("--output").arg(&out_path);
        let written = cmd.output().expect("Running metricizer failed");

        let mut cmd = Command::cargo_bin("metricizer").expect("Binary exists");
        collect_args(&mut cmd, &config);
        cmd.arg("--no-fallback");
        let strict = cmd.output().expect("Running metricizer failed");

        let content = read_to_string(&out_path).unwrap_or_default();
        ((written, content), strict)
    })
    .await
    .unwrap();

    let (written, content) = written;
    assert!(written.status.success());
    assert!(String::from_utf8_lossy(&written.stdout).contains("Metrics record written to"));
    let record: serde_json::Value = serde_json::from_str(&content).expect("file is JSON");
    assert_eq!(record["brew_task_id"], "14287541");

    assert!(!strict.status.success());
    assert!(String::from_utf8_lossy(&strict.stderr).contains("404"));
}
