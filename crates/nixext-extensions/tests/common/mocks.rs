//! Mock implementations for testing
//!
//! Provides a scripted command runner and helpers that wire the resolver and
//! pipeline against a wiremock server instead of the real upstream services.

#![allow(dead_code)]

use async_trait::async_trait;
use nixext_core::types::{NetworkConfig, SourceEndpoints};
use nixext_core::{CommandRunner, ProcessError};
use nixext_extensions::{
    ExtensionPipeline, ExtensionSourceResolver, HttpClients, LocalSriHasher, StaticTokenProvider,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock command result
#[derive(Clone, Debug)]
pub enum MockCommandResult {
    Success(String),
    Failure { code: i32, stderr: String },
}

impl MockCommandResult {
    pub fn success(stdout: &str) -> Self {
        Self::Success(stdout.to_string())
    }

    pub fn failure(stderr: &str, code: i32) -> Self {
        Self::Failure {
            code,
            stderr: stderr.to_string(),
        }
    }
}

/// Scripted [`CommandRunner`]
///
/// Responses are keyed by `"{command} {first arg}"`; unknown commands fail
/// with exit code 127.
#[derive(Default)]
pub struct MockCommandRunner {
    responses: Mutex<HashMap<String, MockCommandResult>>,
    invocations: Mutex<Vec<String>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to `command` whose args start with `first_arg`
    pub fn on(self, command: &str, first_arg: &str, result: MockCommandResult) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(format!("{} {}", command, first_arg), result);
        self
    }

    /// Every `"{command} {args}"` run so far
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn was_called(&self, command: &str) -> bool {
        self.invocations()
            .iter()
            .any(|i| i.split(' ').next() == Some(command))
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, command: &str, args: &str) -> Result<String, ProcessError> {
        self.invocations
            .lock()
            .unwrap()
            .push(format!("{} {}", command, args));

        let first_arg = args.split(' ').next().unwrap_or_default();
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&format!("{} {}", command, first_arg))
            .cloned();

        match response {
            Some(MockCommandResult::Success(stdout)) => Ok(stdout),
            Some(MockCommandResult::Failure { code, stderr }) => Err(ProcessError::Failed {
                command: command.to_string(),
                code,
                stderr,
            }),
            None => Err(ProcessError::Failed {
                command: command.to_string(),
                code: 127,
                stderr: "command not mocked".to_string(),
            }),
        }
    }
}

/// Source endpoints all pointing at `server`
pub fn mock_endpoints(server: &MockServer) -> SourceEndpoints {
    let base = server.uri();
    SourceEndpoints {
        chrome_store_url: format!("{}/service/update2/crx", base),
        amo_api_url: format!("{}/api/v5", base),
        github_api_url: base.clone(),
        github_url: format!("{}/gh", base),
        bpc_repo: "https://example.invalid/bpc_uploads.git".to_string(),
        bpc_raw_url: format!("{}/bpc/blob/raw", base),
    }
}

pub fn test_clients() -> HttpClients {
    HttpClients::new(&NetworkConfig::default()).unwrap()
}

/// Resolver against `server` with the given runner and no GitHub token
pub fn mock_resolver(server: &MockServer, runner: Arc<MockCommandRunner>) -> ExtensionSourceResolver {
    ExtensionSourceResolver::new(
        test_clients(),
        mock_endpoints(server),
        runner,
        Arc::new(StaticTokenProvider::default()),
    )
}

/// Pipeline against `server` hashing in process
pub fn mock_pipeline(server: &MockServer, max_concurrent: usize) -> ExtensionPipeline {
    let clients = test_clients();
    let resolver = Arc::new(mock_resolver(server, Arc::new(MockCommandRunner::new())));
    ExtensionPipeline::new(resolver, clients.general, Arc::new(LocalSriHasher))
        .with_max_concurrent(max_concurrent)
}

/// Serve `body` at `route`
pub async fn mount_package(server: &MockServer, route: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .mount(server)
        .await;
}
