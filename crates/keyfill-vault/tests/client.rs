// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wire-level tests for the vault client against a mock vault.

use keyfill_vault::{SecretString, VaultClient, VaultConfig, VaultError};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn preshared_client(server: &MockServer) -> VaultClient {
	let config = VaultConfig::new(server.uri()).with_preshared_token("test-token".into());
	VaultClient::new(&config).unwrap()
}

#[tokio::test]
async fn get_secret_sends_encoded_name_and_bearer_token() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets/user---example--test-email-com"))
		.and(query_param("api-version", "7.1"))
		.and(header("authorization", "Bearer test-token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "p@ssw0rd"})))
		.expect(1)
		.mount(&server)
		.await;

	let value = preshared_client(&server)
		.get_secret("user_example@test.email.com")
		.await
		.unwrap();

	assert_eq!(value.expose(), "p@ssw0rd");
}

#[tokio::test]
async fn get_secret_error_carries_remote_message() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets/missing--corp-com"))
		.respond_with(ResponseTemplate::new(404).set_body_json(json!({
			"error": {"code": "SecretNotFound", "message": "A secret with (name/id) missing--corp-com was not found in this key vault."}
		})))
		.mount(&server)
		.await;

	let err = preshared_client(&server)
		.get_secret("missing@corp.com")
		.await
		.unwrap_err();

	match err {
		VaultError::Api { status, message } => {
			assert_eq!(status, 404);
			assert_eq!(
				message,
				"A secret with (name/id) missing--corp-com was not found in this key vault."
			);
		}
		other => panic!("expected Api error, got {other:?}"),
	}
}

#[tokio::test]
async fn set_secret_puts_json_value() {
	let server = MockServer::start().await;
	Mock::given(method("PUT"))
		.and(path("/secrets/admin--corp-com"))
		.and(query_param("api-version", "7.1"))
		.and(header("authorization", "Bearer test-token"))
		.and(body_json(json!({"value": "n3w-secret"})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "n3w-secret"})))
		.expect(1)
		.mount(&server)
		.await;

	preshared_client(&server)
		.set_secret("admin@corp.com", &SecretString::from("n3w-secret"))
		.await
		.unwrap();
}

#[tokio::test]
async fn set_secret_failure_is_api_error() {
	let server = MockServer::start().await;
	Mock::given(method("PUT"))
		.respond_with(ResponseTemplate::new(403).set_body_json(json!({
			"error": {"code": "Forbidden", "message": "The user does not have secrets set permission."}
		})))
		.mount(&server)
		.await;

	let err = preshared_client(&server)
		.set_secret("admin@corp.com", &SecretString::from("x"))
		.await
		.unwrap_err();

	assert_eq!(
		err.api_message(),
		Some("The user does not have secrets set permission.")
	);
}

#[tokio::test]
async fn list_secrets_follows_next_link_once_per_page() {
	let server = MockServer::start().await;
	let next_link = format!("{}/secrets?api-version=7.1&$skiptoken=page2", server.uri());

	Mock::given(method("GET"))
		.and(path("/secrets"))
		.and(query_param("$skiptoken", "page2"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"value": [{"id": format!("{}/secrets/third--corp-com", server.uri())}],
			"nextLink": null
		})))
		.with_priority(1)
		.expect(1)
		.mount(&server)
		.await;

	Mock::given(method("GET"))
		.and(path("/secrets"))
		.and(query_param("api-version", "7.1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"value": [{"name": "first--corp-com"}, {"name": "second--corp-com"}],
			"nextLink": next_link
		})))
		.expect(1)
		.mount(&server)
		.await;

	let items = preshared_client(&server).list_secrets().await.unwrap();

	let names: Vec<String> = items.iter().filter_map(|i| i.name()).collect();
	assert_eq!(
		names,
		vec!["first--corp-com", "second--corp-com", "third--corp-com"]
	);
}

#[tokio::test]
async fn list_secrets_refuses_next_link_on_another_origin() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"value": [{"name": "first--corp-com"}],
			"nextLink": "https://elsewhere.example/secrets?api-version=7.1&$skiptoken=x"
		})))
		.expect(1)
		.mount(&server)
		.await;

	let err = preshared_client(&server).list_secrets().await.unwrap_err();

	assert!(matches!(err, VaultError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn list_secrets_rejects_unparseable_next_link() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"value": [],
			"nextLink": "not a url"
		})))
		.expect(1)
		.mount(&server)
		.await;

	let err = preshared_client(&server).list_secrets().await.unwrap_err();

	assert!(matches!(err, VaultError::InvalidResponse(_)), "got {err:?}");
}

#[tokio::test]
async fn list_secrets_error_reproduces_remote_message_verbatim() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets"))
		.respond_with(ResponseTemplate::new(401).set_body_json(json!({
			"error": {"code": "Unauthorized", "message": "AKV10032: Invalid issuer."}
		})))
		.mount(&server)
		.await;

	let err = preshared_client(&server).list_secrets().await.unwrap_err();

	assert!(matches!(err, VaultError::Api { status: 401, .. }));
	assert_eq!(err.api_message(), Some("AKV10032: Invalid issuer."));
}

#[tokio::test]
async fn non_json_error_body_is_reported_as_text() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.respond_with(ResponseTemplate::new(502).set_body_string("upstream unavailable"))
		.mount(&server)
		.await;

	let err = preshared_client(&server).list_secrets().await.unwrap_err();
	assert_eq!(err.api_message(), Some("upstream unavailable"));
}

#[tokio::test]
async fn client_credentials_token_is_exchanged_once_and_cached() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/contoso/oauth2/v2.0/token"))
		.and(body_string_contains("grant_type=client_credentials"))
		.and(body_string_contains("client_id=app-id"))
		.and(body_string_contains("client_secret=app-secret"))
		.and(body_string_contains(
			"scope=https%3A%2F%2Fvault.azure.net%2F.default",
		))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"token_type": "Bearer",
			"expires_in": 3599,
			"access_token": "exchanged-token"
		})))
		.expect(1)
		.mount(&server)
		.await;

	Mock::given(method("GET"))
		.and(path("/secrets/admin--corp-com"))
		.and(header("authorization", "Bearer exchanged-token"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "pw"})))
		.expect(2)
		.mount(&server)
		.await;

	let config = VaultConfig::new(server.uri())
		.with_client_credentials("app-id", "app-secret".into(), "contoso")
		.with_scope("https://vault.azure.net");
	let client = VaultClient::new(&config)
		.unwrap()
		.with_authority(server.uri());

	assert_eq!(client.get_secret("admin@corp.com").await.unwrap().expose(), "pw");
	assert_eq!(client.get_secret("admin@corp.com").await.unwrap().expose(), "pw");
}

#[tokio::test]
async fn token_response_without_access_token_is_auth_error() {
	let server = MockServer::start().await;
	Mock::given(method("POST"))
		.and(path("/contoso/oauth2/v2.0/token"))
		.respond_with(ResponseTemplate::new(400).set_body_json(json!({
			"error": "invalid_client",
			"error_description": "AADSTS7000215: Invalid client secret provided."
		})))
		.mount(&server)
		.await;

	let config = VaultConfig::new(server.uri()).with_client_credentials(
		"app-id",
		"wrong".into(),
		"contoso",
	);
	let client = VaultClient::new(&config)
		.unwrap()
		.with_authority(server.uri());

	let err = client.get_secret("admin@corp.com").await.unwrap_err();
	match err {
		VaultError::Auth(message) => {
			assert_eq!(message, "AADSTS7000215: Invalid client secret provided.")
		}
		other => panic!("expected Auth error, got {other:?}"),
	}
}
