// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Tests for the GitHub read-through client against a mock API.

mod common;

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use showcase_environment::error::Error;
use showcase_environment::github::{GitHubClient, GitHubConfig};

#[tokio::test]
async fn test_list_repos_sends_query_and_sorts_by_recency() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .and(query_param("sort", "updated"))
        .and(query_param("per_page", "100"))
        .and(query_param("type", "owner"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json(1, "middle", Some("Rust"), 1, "2024-03-01T00:00:00Z"),
            repo_json(2, "oldest", None, 0, "2023-03-01T00:00:00Z"),
            repo_json(3, "newest", Some("Go"), 9, "2024-09-01T00:00:00Z"),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(github_config(&server.uri())).unwrap();
    let repos = client.list_own_repos().await.unwrap();

    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["newest", "middle", "oldest"]);
    assert_eq!(repos[0].topics, vec!["demo".to_string()]);
    assert!(repos[1].language.is_some());
    assert!(repos[2].language.is_none());
}

#[tokio::test]
async fn test_token_is_sent_as_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .and(header("authorization", "Bearer s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = GitHubClient::new(GitHubConfig {
        token: Some("s3cret".to_string()),
        ..github_config(&server.uri())
    })
    .unwrap();

    assert!(client.list_own_repos().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_repo_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/octocat/hello"))
        .respond_with(ResponseTemplate::new(200).set_body_json(repo_json(
            7,
            "hello",
            Some("Rust"),
            5,
            "2024-01-01T00:00:00Z",
        )))
        .mount(&server)
        .await;

    let client = GitHubClient::new(github_config(&server.uri())).unwrap();

    assert!(client.get_repo("octocat", "missing").await.unwrap().is_none());
    let repo = client.get_repo("octocat", "hello").await.unwrap().unwrap();
    assert_eq!(repo.full_name, "octocat/hello");
    assert_eq!(repo.stargazers_count, 5);
}

#[tokio::test]
async fn test_upstream_error_is_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let client = GitHubClient::new(github_config(&server.uri())).unwrap();
    let err = client.list_own_repos().await.unwrap_err();

    assert!(matches!(err, Error::Http(_)));
    assert!(!err.is_client_error());
}

#[tokio::test]
async fn test_stats_for_other_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/someone/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            repo_json(1, "a", Some("Rust"), 10, "2024-01-01T00:00:00Z"),
            repo_json(2, "b", Some("TypeScript"), 2, "2024-02-01T00:00:00Z"),
        ])))
        .mount(&server)
        .await;

    let client = GitHubClient::new(github_config(&server.uri())).unwrap();
    let stats = client.stats("someone").await.unwrap();

    assert_eq!(stats.total_stars, 12);
    assert_eq!(stats.total_forks, 2);
    assert_eq!(stats.total_repos, 2);
    assert_eq!(stats.languages.get("TypeScript"), Some(&1));
}
