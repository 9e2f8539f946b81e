//! Full pipeline against a local HTTP stub speaking the GitHub REST shapes.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use depreport_core::{
    get_dependabot_data, Affiliation, AggregateError, AggregateOptions, AlertSource, HtmlFilter,
};
use depreport_github::{GithubClient, GithubError};

// ── Stub Server ──

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

impl Reply {
    fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn with_next(mut self, url: String) -> Self {
        self.headers
            .push(("Link".into(), format!("<{url}>; rel=\"next\"")));
        self
    }
}

struct Request {
    target: String,
    authorization: Option<String>,
}

struct Stub {
    base: String,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl Stub {
    fn targets(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.target.clone())
            .collect()
    }

    fn client(&self, token: &str) -> GithubClient {
        GithubClient::builder(token)
            .api_url(&self.base)
            .proxy_from_env(false)
            .build()
    }
}

fn serve<F>(handler: F) -> Stub
where
    F: Fn(&str, &str) -> Reply + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    let handler_base = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Some(request) = read_request(&mut stream) else {
                continue;
            };
            let reply = handler(&handler_base, &request.target);
            log.lock().unwrap().push(request);
            write_reply(&mut stream, &reply);
        }
    });
    Stub { base, requests }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf).to_string();
    let mut lines = head.split("\r\n");
    let target = lines.next()?.split_whitespace().nth(1)?.to_string();
    let authorization = lines.find_map(|l| {
        let (name, value) = l.split_once(':')?;
        name.eq_ignore_ascii_case("authorization")
            .then(|| value.trim().to_string())
    });
    Some(Request {
        target,
        authorization,
    })
}

fn write_reply(stream: &mut TcpStream, reply: &Reply) {
    let mut out = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str("\r\n");
    out.push_str(&reply.body);
    let _ = stream.write_all(out.as_bytes());
    let _ = stream.flush();
}

// ── Fixtures ──

fn repo(full_name: &str, fork: bool) -> serde_json::Value {
    let (owner, name) = full_name.split_once('/').unwrap();
    serde_json::json!({
        "id": 1,
        "name": name,
        "full_name": full_name,
        "private": false,
        "fork": fork,
        "archived": false,
        "html_url": format!("https://github.com/{full_name}"),
        "owner": {
            "login": owner,
            "type": "User",
            "html_url": format!("https://github.com/{owner}"),
            "avatar_url": "https://avatars.githubusercontent.com/u/1"
        }
    })
}

fn alert(number: u64, severity: &str, cwe: &str) -> serde_json::Value {
    serde_json::json!({
        "number": number,
        "state": "open",
        "html_url": format!("https://github.com/x/y/security/dependabot/{number}"),
        "created_at": "2024-05-01T08:00:00Z",
        "dependency": {"package": {"ecosystem": "pip", "name": "jinja2"}, "manifest_path": "requirements.txt"},
        "security_advisory": {
            "ghsa_id": format!("GHSA-{number}"),
            "cve_id": null,
            "summary": "Template injection",
            "severity": severity,
            "cwes": [{"cwe_id": cwe, "name": "n/a"}]
        },
        "security_vulnerability": {"severity": severity, "vulnerable_version_range": "< 3.1.4"}
    })
}

fn github_like(base: &str, target: &str) -> Reply {
    let path = target.split('?').next().unwrap_or(target);
    match path {
        "/user" => Reply::json(200, serde_json::json!({"login": "octocat"})),
        "/user/repos" if target.contains("cursor=p2") => {
            Reply::json(200, serde_json::json!([repo("bob/fork", true)]))
        }
        "/user/repos" => Reply::json(
            200,
            serde_json::json!([repo("alice/api", false), repo("alice/legacy", false)]),
        )
        .with_next(format!("{base}/user/repos?cursor=p2")),
        "/repos/alice/api/dependabot/alerts" if target.contains("after=c2") => {
            Reply::json(200, serde_json::json!([alert(2, "medium", "CWE-79")]))
        }
        "/repos/alice/api/dependabot/alerts" => {
            Reply::json(200, serde_json::json!([alert(1, "HIGH", "CWE-502")])).with_next(
                format!("{base}/repos/alice/api/dependabot/alerts?state=open&after=c2"),
            )
        }
        "/repos/alice/legacy/dependabot/alerts" => Reply::json(
            403,
            serde_json::json!({"message": "Dependabot alerts are disabled for this repository."}),
        ),
        "/repos/bob/fork/dependabot/alerts" => {
            Reply::json(200, serde_json::json!([alert(5, "low", "CWE-1")]))
        }
        _ => Reply::json(404, serde_json::json!({"message": "Not Found"})),
    }
}

fn options() -> AggregateOptions {
    AggregateOptions::new(Affiliation::new(true, true, false).unwrap())
}

// ── Tests ──

#[test]
fn two_owners_three_repos_end_to_end() {
    let stub = serve(github_like);
    let client = stub.client("ghp_test");

    let ctx = get_dependabot_data(&client, &options()).unwrap();

    assert_eq!(ctx.namespaces.len(), 2);
    let alice = ctx.namespace("alice").unwrap();
    let api = alice.repo("alice/api").unwrap();
    assert_eq!(api.alerts.len(), 2);
    assert_eq!(api.alerts_stats.high, 1);
    assert_eq!(api.alerts_stats.medium, 1);
    assert!(api.html_filters.is_empty());
    assert!(depreport_core::has_cisa_cwe(api.alert(1).unwrap()));
    assert!(depreport_core::has_owasp_cwe(api.alert(2).unwrap()));

    let legacy = alice.repo("alice/legacy").unwrap();
    assert!(legacy.alerts_error);
    assert!(legacy.alerts.is_empty());
    assert!(legacy.has_filter(HtmlFilter::RepoError));
    assert!(legacy.has_filter(HtmlFilter::RepoEmpty));
    assert_eq!(legacy.html_filters.len(), 2);

    let fork = ctx.namespace("bob").unwrap().repo("bob/fork").unwrap();
    assert_eq!(fork.alerts_stats.low, 1);
    assert_eq!(fork.html_filters.len(), 1);
    assert!(fork.has_filter(HtmlFilter::RepoFork));

    let targets = stub.targets();
    let listing = targets
        .iter()
        .find(|t| t.starts_with("/user/repos"))
        .unwrap();
    assert!(listing.contains("affiliation=owner"), "{listing}");
    assert!(listing.contains("sort=full_name"), "{listing}");
    assert!(listing.contains("direction=asc"), "{listing}");
    assert!(targets
        .iter()
        .any(|t| t.starts_with("/repos/alice/api/dependabot/alerts") && t.contains("state=open")));
}

#[test]
fn requests_carry_bearer_token() {
    let stub = serve(github_like);
    let client = stub.client("ghp_test");
    assert_eq!(client.authenticated_login().unwrap(), "octocat");
    let requests = stub.requests.lock().unwrap();
    assert_eq!(requests[0].authorization.as_deref(), Some("Bearer ghp_test"));
}

#[test]
fn repositories_are_streamed_across_pages() {
    let stub = serve(github_like);
    let client = stub.client("t");
    let affiliation = Affiliation::new(true, false, false).unwrap();
    let names: Vec<String> = client
        .list_repositories(&affiliation)
        .map(|r| r.unwrap().full_name)
        .collect();
    assert_eq!(names, vec!["alice/api", "alice/legacy", "bob/fork"]);
}

#[test]
fn fork_exclusion_against_live_listing() {
    let stub = serve(github_like);
    let client = stub.client("t");
    let mut opts = options();
    opts.exclude_forks = true;
    opts.exclude_owners = vec!["nobody".into()];
    let ctx = get_dependabot_data(&client, &opts).unwrap();
    assert!(ctx.namespace("bob").unwrap().repos.is_empty());
    assert!(!stub
        .targets()
        .iter()
        .any(|t| t.starts_with("/repos/bob/fork")));
}

#[test]
fn server_error_on_alerts_aborts_run() {
    let stub = serve(|base, target| {
        if target.starts_with("/repos/alice/legacy") {
            Reply::json(500, serde_json::json!({"message": "Server Error"}))
        } else {
            github_like(base, target)
        }
    });
    let client = stub.client("t");
    let err = get_dependabot_data(&client, &options()).unwrap_err();
    match err {
        AggregateError::Alerts { repo, source } => {
            assert_eq!(repo, "alice/legacy");
            let gh = source.downcast_ref::<GithubError>().unwrap();
            assert_eq!(gh.status(), Some(500));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn bad_credentials_abort_before_listing() {
    let stub = serve(|_, _| Reply::json(401, serde_json::json!({"message": "Bad credentials"})));
    let client = stub.client("expired");
    let err = get_dependabot_data(&client, &options()).unwrap_err();
    assert!(matches!(err, AggregateError::Authentication(_)));
    assert_eq!(stub.targets(), vec!["/user".to_string()]);
}

#[test]
fn pagination_link_to_another_host_is_not_followed() {
    let elsewhere = serve(|_, _| Reply::json(200, serde_json::json!([])));
    let foreign = format!("{}/user/repos?page=2", elsewhere.base);
    let stub = serve(move |_, _| {
        Reply::json(200, serde_json::json!([repo("alice/api", false)])).with_next(foreign.clone())
    });
    let client = stub.client("ghp_secret");
    let affiliation = Affiliation::new(true, false, false).unwrap();

    let results: Vec<_> = client.list_repositories(&affiliation).collect();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().full_name, "alice/api");
    assert!(matches!(results[1], Err(GithubError::ForeignLink { .. })));
    assert!(elsewhere.targets().is_empty());
}

#[test]
fn malformed_listing_is_a_decode_error() {
    let stub = serve(|base, target| {
        if target.starts_with("/user/repos") {
            Reply::json(200, serde_json::json!({"unexpected": true}))
        } else {
            github_like(base, target)
        }
    });
    let client = stub.client("t");
    let affiliation = Affiliation::new(true, false, false).unwrap();
    let results: Vec<_> = client.list_repositories(&affiliation).collect();
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0], Err(GithubError::Decode { .. })));
}
