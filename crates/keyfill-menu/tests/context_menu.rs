// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{GatedResolver, HostEvent, MapResolver, RecordingHost};
use keyfill_credentials::{
	AdditionalMenu, CredentialManager, MemoryOptionsStore, Options, OptionsStore,
};
use keyfill_menu::{
	ContextMenu, CredentialResolver, MemoryMenuBuilder, TabId, HELP_URL, ROOT_TITLE,
};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn standard() -> Value {
	json!({
		"Names": {"Alice": "Alice", "Unicode": "Ñandú"},
		"Numbers": ["0", "-1"],
		"Lorem": {"_type": "lorem", "words": 3},
		"Admin password": {"keyVaultSecret": "admin@corp.com"}
	})
}

struct Fixture {
	store: Arc<MemoryOptionsStore>,
	builder: Arc<MemoryMenuBuilder>,
	host: Arc<RecordingHost>,
	menu: Arc<ContextMenu>,
}

fn fixture(options: Options, resolver: Arc<dyn CredentialResolver>, paste_supported: bool) -> Fixture {
	let store = Arc::new(MemoryOptionsStore::with_options(options));
	let builder = Arc::new(MemoryMenuBuilder::new());
	let host = Arc::new(RecordingHost::granting(true));
	let menu = Arc::new(ContextMenu::new(
		standard(),
		store.clone(),
		builder.clone(),
		host.clone(),
		resolver,
		paste_supported,
	));
	Fixture {
		store,
		builder,
		host,
		menu,
	}
}

fn resolver() -> Arc<dyn CredentialResolver> {
	Arc::new(MapResolver::with(&[("admin@corp.com", "s3cret")]))
}

#[tokio::test]
async fn builds_standard_additional_and_generic_menus() {
	let options = Options {
		additional_menus: vec![AdditionalMenu {
			name: "Team".into(),
			config: json!({"Greeting": "hi"}),
		}],
		..Default::default()
	};
	let f = fixture(options, resolver(), true);
	f.menu.init().await.unwrap();

	assert_eq!(
		f.builder.render().await,
		"\
Keyfill >
  Names >
    Alice
    Unicode
  Numbers >
    0
    -1
  Lorem
  Admin password
  Team >
    Greeting
  ---
  Operational mode >
    (*) Inject value
    ( ) Simulate pasting
    ( ) Copy to clipboard
  Customise menus
  Help/Support
"
	);
}

#[tokio::test]
async fn skip_standard_and_no_paste_support() {
	let options = Options {
		skip_standard: true,
		..Default::default()
	};
	let f = fixture(options, resolver(), false);
	f.menu.init().await.unwrap();

	let root = f.builder.find_by_path(&[ROOT_TITLE]).await.unwrap();
	assert_eq!(
		f.builder.child_titles(Some(&root)).await,
		vec!["", "Customise menus", "Help/Support"]
	);
}

#[tokio::test]
async fn rebuilding_unchanged_options_is_structurally_identical() {
	let f = fixture(Options::default(), resolver(), true);
	f.menu.init().await.unwrap();
	let first = f.builder.render().await;

	f.menu.rebuild().await.unwrap();
	f.menu.rebuild().await.unwrap();

	assert_eq!(f.builder.render().await, first);
	assert_eq!(f.builder.child_titles(None).await, vec![ROOT_TITLE]);
}

#[tokio::test]
async fn literal_and_secret_leaves_deliver_resolved_values() {
	let f = fixture(Options::default(), resolver(), true);
	f.menu.init().await.unwrap();

	let alice = f.builder.find_by_path(&[ROOT_TITLE, "Names", "Alice"]).await.unwrap();
	let secret = f.builder.find_by_path(&[ROOT_TITLE, "Admin password"]).await.unwrap();
	let lorem = f.builder.find_by_path(&[ROOT_TITLE, "Lorem"]).await.unwrap();

	f.builder.click(&alice, TabId(1)).await.unwrap();
	f.builder.click(&secret, TabId(1)).await.unwrap();
	f.builder.click(&lorem, TabId(2)).await.unwrap();

	assert_eq!(
		f.host.events(),
		vec![
			HostEvent::Inject(TabId(1), "Alice".into()),
			HostEvent::Inject(TabId(1), "s3cret".into()),
			HostEvent::Inject(TabId(2), "<lorem>".into()),
		]
	);
}

#[tokio::test]
async fn secret_failure_is_reported_without_breaking_the_menu() {
	let f = fixture(Options::default(), Arc::new(MapResolver::default()), true);
	f.menu.init().await.unwrap();

	let secret = f.builder.find_by_path(&[ROOT_TITLE, "Admin password"]).await.unwrap();
	f.builder.click(&secret, TabId(1)).await.unwrap();

	let events = f.host.take_events();
	assert_eq!(events.len(), 1);
	match &events[0] {
		HostEvent::Message(text) => {
			assert!(text.starts_with("Failed to fetch secret admin@corp.com"), "{text}")
		}
		other => panic!("expected a message, got {other:?}"),
	}

	let alice = f.builder.find_by_path(&[ROOT_TITLE, "Names", "Alice"]).await.unwrap();
	f.builder.click(&alice, TabId(1)).await.unwrap();
	assert_eq!(f.host.events(), vec![HostEvent::Inject(TabId(1), "Alice".into())]);
}

#[tokio::test]
async fn mode_choices_route_clicks() {
	let f = fixture(Options::default(), resolver(), true);
	f.menu.init().await.unwrap();

	let copy = f
		.builder
		.find_by_path(&[ROOT_TITLE, "Operational mode", "Copy to clipboard"])
		.await
		.unwrap();
	f.builder.click(&copy, TabId(1)).await.unwrap();

	let alice = f.builder.find_by_path(&[ROOT_TITLE, "Names", "Alice"]).await.unwrap();
	f.builder.click(&alice, TabId(1)).await.unwrap();
	assert_eq!(f.host.take_events(), vec![HostEvent::Copy("Alice".into())]);

	// The rebuilt menu shows the mode in effect.
	f.menu.rebuild().await.unwrap();
	assert!(f.builder.render().await.contains("(*) Copy to clipboard"));
}

#[tokio::test]
async fn denied_paste_choice_reverts_selection() {
	let f = fixture(Options::default(), resolver(), true);
	f.host.set_grant(false);
	f.menu.init().await.unwrap();

	let paste = f
		.builder
		.find_by_path(&[ROOT_TITLE, "Operational mode", "Simulate pasting"])
		.await
		.unwrap();
	f.builder.click(&paste, TabId(1)).await.unwrap();

	assert!(f.builder.render().await.contains("(*) Inject value"));
	assert_eq!(
		f.host.events(),
		vec![
			HostEvent::RequestPermissions,
			HostEvent::Message("Could not access clipboard".into()),
		]
	);
}

#[tokio::test]
async fn utility_items_call_the_host() {
	let f = fixture(Options::default(), resolver(), true);
	f.menu.init().await.unwrap();

	let settings = f.builder.find_by_path(&[ROOT_TITLE, "Customise menus"]).await.unwrap();
	let help = f.builder.find_by_path(&[ROOT_TITLE, "Help/Support"]).await.unwrap();
	f.builder.click(&settings, TabId(1)).await.unwrap();
	f.builder.click(&help, TabId(1)).await.unwrap();

	assert_eq!(
		f.host.events(),
		vec![HostEvent::OpenSettings, HostEvent::OpenUrl(HELP_URL.into())]
	);
}

#[tokio::test]
async fn options_change_triggers_rebuild() {
	let f = fixture(Options::default(), resolver(), true);
	f.menu.init().await.unwrap();
	let watcher = f.menu.clone().watch();

	let mut options = f.store.load().await.unwrap();
	options.skip_standard = true;
	f.store.save(&options).await.unwrap();

	tokio::time::timeout(Duration::from_secs(5), async {
		while f.builder.find_by_path(&[ROOT_TITLE, "Names"]).await.is_some() {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
	})
	.await
	.expect("menu was not rebuilt");

	assert!(f.builder.find_by_path(&[ROOT_TITLE, "Help/Support"]).await.is_some());
	watcher.abort();
}

#[tokio::test]
async fn resolution_from_a_replaced_menu_is_dropped() {
	let gated = Arc::new(GatedResolver::default());
	let f = fixture(Options::default(), gated.clone(), true);
	f.menu.init().await.unwrap();

	let secret = f.builder.find_by_path(&[ROOT_TITLE, "Admin password"]).await.unwrap();
	let builder = f.builder.clone();
	let click = tokio::spawn(async move { builder.click(&secret, TabId(1)).await });

	gated.entered.notified().await;
	f.menu.rebuild().await.unwrap();
	gated.gate.notify_one();
	click.await.unwrap().unwrap();

	assert!(f.host.events().is_empty());
}

#[tokio::test]
async fn secret_leaf_reads_through_credential_manager() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/secrets/admin--corp-com"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": "from-vault"})))
		.expect(1)
		.mount(&server)
		.await;

	let options = Options {
		vault_url: Some(server.uri()),
		preshared_token: Some("tok".into()),
		..Default::default()
	};
	let store = Arc::new(MemoryOptionsStore::with_options(options.clone()));
	let manager = Arc::new(CredentialManager::new(store));
	let f = fixture(options, manager, true);
	f.menu.init().await.unwrap();

	let secret = f.builder.find_by_path(&[ROOT_TITLE, "Admin password"]).await.unwrap();
	f.builder.click(&secret, TabId(4)).await.unwrap();
	f.builder.click(&secret, TabId(4)).await.unwrap();

	assert_eq!(
		f.host.events(),
		vec![
			HostEvent::Inject(TabId(4), "from-vault".into()),
			HostEvent::Inject(TabId(4), "from-vault".into()),
		]
	);
}
