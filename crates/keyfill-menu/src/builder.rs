// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The rendering boundary: where menu items are created and clicks come from.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{MenuError, MenuResult};

/// Identifier of a created menu item, unique within one builder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MenuId(pub String);

impl fmt::Display for MenuId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// The tab (page) a click happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TabId(pub i64);

impl fmt::Display for TabId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// What the host knows about a click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickContext {
	pub menu_item_id: MenuId,
	pub tab: TabId,
}

/// Callback registered on a menu item or choice.
#[async_trait]
pub trait ClickHandler: Send + Sync {
	async fn on_click(&self, ctx: &ClickContext) -> MenuResult<()>;
}

/// Creates and removes native menu items.
#[async_trait]
pub trait MenuBuilder: Send + Sync {
	async fn root_menu(&self, title: &str) -> MenuId;

	async fn sub_menu(&self, title: &str, parent: &MenuId) -> MenuId;

	async fn separator(&self, parent: &MenuId) -> MenuId;

	async fn menu_item(&self, title: &str, parent: &MenuId, handler: Arc<dyn ClickHandler>) -> MenuId;

	/// A radio choice; choices under the same parent form one group.
	async fn choice(
		&self,
		title: &str,
		parent: &MenuId,
		handler: Arc<dyn ClickHandler>,
		checked: bool,
	) -> MenuId;

	/// Checks `id` and unchecks the other choices in its group.
	async fn select_choice(&self, id: &MenuId);

	/// Removes `id` and everything below it.
	async fn remove(&self, id: &MenuId);

	async fn remove_all(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
	Root,
	Submenu,
	Separator,
	Item,
	Choice { checked: bool },
}

struct Item {
	id: MenuId,
	parent: Option<MenuId>,
	title: String,
	kind: ItemKind,
	handler: Option<Arc<dyn ClickHandler>>,
}

#[derive(Default)]
struct BuilderState {
	items: Vec<Item>,
	next_id: u64,
}

impl BuilderState {
	fn add(
		&mut self,
		prefix: &str,
		title: &str,
		parent: Option<&MenuId>,
		kind: ItemKind,
		handler: Option<Arc<dyn ClickHandler>>,
	) -> MenuId {
		self.next_id += 1;
		let id = MenuId(format!("{prefix}-{}", self.next_id));
		debug!(id = %id, title, kind = ?kind, "creating menu item");
		self.items.push(Item {
			id: id.clone(),
			parent: parent.cloned(),
			title: title.to_string(),
			kind,
			handler,
		});
		id
	}

	fn children<'a>(&'a self, parent: Option<&'a MenuId>) -> impl Iterator<Item = &'a Item> + 'a {
		self.items
			.iter()
			.filter(move |item| item.parent.as_ref() == parent)
	}

	fn get(&self, id: &MenuId) -> Option<&Item> {
		self.items.iter().find(|item| &item.id == id)
	}

	fn check(&mut self, id: &MenuId) {
		let Some(parent) = self.get(id).map(|item| item.parent.clone()) else {
			return;
		};
		for item in self.items.iter_mut().filter(|item| item.parent == parent) {
			if let ItemKind::Choice { checked } = &mut item.kind {
				*checked = &item.id == id;
			}
		}
	}

	fn render_into(&self, parent: Option<&MenuId>, depth: usize, out: &mut String) {
		for item in self.children(parent) {
			let indent = "  ".repeat(depth);
			let line = match item.kind {
				ItemKind::Separator => "---".to_string(),
				ItemKind::Choice { checked: true } => format!("(*) {}", item.title),
				ItemKind::Choice { checked: false } => format!("( ) {}", item.title),
				ItemKind::Root | ItemKind::Submenu => format!("{} >", item.title),
				ItemKind::Item => item.title.clone(),
			};
			out.push_str(&indent);
			out.push_str(&line);
			out.push('\n');
			self.render_into(Some(&item.id), depth + 1, out);
		}
	}
}

/// A menu builder that keeps the tree in memory.
///
/// Used by tests and by hosts without native menus, which drive clicks
/// through [`MemoryMenuBuilder::click`].
#[derive(Default)]
pub struct MemoryMenuBuilder {
	state: Mutex<BuilderState>,
}

impl MemoryMenuBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// Runs the handler registered on `id`.
	pub async fn click(&self, id: &MenuId, tab: TabId) -> MenuResult<()> {
		let handler = {
			let mut state = self.state.lock().await;
			let item = state
				.get(id)
				.ok_or_else(|| MenuError::UnknownItem(id.to_string()))?;
			let handler = item.handler.clone();
			if matches!(item.kind, ItemKind::Choice { .. }) {
				state.check(id);
			}
			handler
		};

		match handler {
			Some(handler) => {
				let ctx = ClickContext {
					menu_item_id: id.clone(),
					tab,
				};
				handler.on_click(&ctx).await
			}
			None => Ok(()),
		}
	}

	/// Finds an item by the titles leading to it from a root menu.
	pub async fn find_by_path(&self, path: &[&str]) -> Option<MenuId> {
		let state = self.state.lock().await;
		let mut parent: Option<MenuId> = None;
		for title in path {
			let next = state
				.children(parent.as_ref())
				.find(|item| item.title == *title)?
				.id
				.clone();
			parent = Some(next);
		}
		parent
	}

	pub async fn title(&self, id: &MenuId) -> Option<String> {
		self.state.lock().await.get(id).map(|item| item.title.clone())
	}

	pub async fn kind(&self, id: &MenuId) -> Option<ItemKind> {
		self.state.lock().await.get(id).map(|item| item.kind)
	}

	/// Titles of the direct children of `parent` (of the roots when `None`).
	pub async fn child_titles(&self, parent: Option<&MenuId>) -> Vec<String> {
		self.state
			.lock()
			.await
			.children(parent)
			.map(|item| item.title.clone())
			.collect()
	}

	pub async fn len(&self) -> usize {
		self.state.lock().await.items.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.state.lock().await.items.is_empty()
	}

	/// Indented text rendering of every menu.
	pub async fn render(&self) -> String {
		let mut out = String::new();
		self.state.lock().await.render_into(None, 0, &mut out);
		out
	}
}

#[async_trait]
impl MenuBuilder for MemoryMenuBuilder {
	async fn root_menu(&self, title: &str) -> MenuId {
		self.state
			.lock()
			.await
			.add("root", title, None, ItemKind::Root, None)
	}

	async fn sub_menu(&self, title: &str, parent: &MenuId) -> MenuId {
		self.state
			.lock()
			.await
			.add("submenu", title, Some(parent), ItemKind::Submenu, None)
	}

	async fn separator(&self, parent: &MenuId) -> MenuId {
		self.state
			.lock()
			.await
			.add("separator", "", Some(parent), ItemKind::Separator, None)
	}

	async fn menu_item(&self, title: &str, parent: &MenuId, handler: Arc<dyn ClickHandler>) -> MenuId {
		self.state
			.lock()
			.await
			.add("item", title, Some(parent), ItemKind::Item, Some(handler))
	}

	async fn choice(
		&self,
		title: &str,
		parent: &MenuId,
		handler: Arc<dyn ClickHandler>,
		checked: bool,
	) -> MenuId {
		let mut state = self.state.lock().await;
		let id = state.add(
			"choice",
			title,
			Some(parent),
			ItemKind::Choice { checked: false },
			Some(handler),
		);
		if checked {
			state.check(&id);
		}
		id
	}

	async fn select_choice(&self, id: &MenuId) {
		self.state.lock().await.check(id);
	}

	async fn remove(&self, id: &MenuId) {
		let mut state = self.state.lock().await;
		let mut doomed = vec![id.clone()];
		let mut idx = 0;
		while idx < doomed.len() {
			let children: Vec<MenuId> = state
				.children(Some(&doomed[idx]))
				.map(|item| item.id.clone())
				.collect();
			doomed.extend(children);
			idx += 1;
		}
		state.items.retain(|item| !doomed.contains(&item.id));
	}

	async fn remove_all(&self) {
		self.state.lock().await.items.clear();
	}
}

impl fmt::Debug for MemoryMenuBuilder {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("MemoryMenuBuilder").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct Counter {
		clicks: AtomicUsize,
	}

	#[async_trait]
	impl ClickHandler for Counter {
		async fn on_click(&self, ctx: &ClickContext) -> MenuResult<()> {
			assert_eq!(ctx.tab, TabId(7));
			self.clicks.fetch_add(1, Ordering::SeqCst);
			Ok(())
		}
	}

	#[tokio::test]
	async fn builds_finds_and_clicks() {
		let builder = MemoryMenuBuilder::new();
		let counter = Arc::new(Counter::default());

		let root = builder.root_menu("Keyfill").await;
		let names = builder.sub_menu("Names", &root).await;
		let item = builder.menu_item("Alice", &names, counter.clone()).await;

		assert_eq!(builder.find_by_path(&["Keyfill", "Names", "Alice"]).await, Some(item.clone()));
		assert_eq!(builder.find_by_path(&["Keyfill", "Nope"]).await, None);

		builder.click(&item, TabId(7)).await.unwrap();
		assert_eq!(counter.clicks.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn clicking_unknown_item_fails() {
		let builder = MemoryMenuBuilder::new();
		let err = builder.click(&MenuId("item-99".into()), TabId(1)).await.unwrap_err();
		assert!(matches!(err, MenuError::UnknownItem(_)));
	}

	#[tokio::test]
	async fn choices_form_radio_group() {
		let builder = MemoryMenuBuilder::new();
		let handler = Arc::new(Counter::default());
		let root = builder.root_menu("Root").await;
		let a = builder.choice("A", &root, handler.clone(), true).await;
		let b = builder.choice("B", &root, handler.clone(), false).await;

		assert_eq!(builder.kind(&a).await, Some(ItemKind::Choice { checked: true }));

		builder.click(&b, TabId(7)).await.unwrap();
		assert_eq!(builder.kind(&a).await, Some(ItemKind::Choice { checked: false }));
		assert_eq!(builder.kind(&b).await, Some(ItemKind::Choice { checked: true }));

		builder.select_choice(&a).await;
		assert_eq!(builder.kind(&a).await, Some(ItemKind::Choice { checked: true }));
		assert_eq!(builder.kind(&b).await, Some(ItemKind::Choice { checked: false }));
	}

	#[tokio::test]
	async fn remove_takes_descendants() {
		let builder = MemoryMenuBuilder::new();
		let handler = Arc::new(Counter::default());
		let first = builder.root_menu("First").await;
		let sub = builder.sub_menu("Sub", &first).await;
		builder.menu_item("Leaf", &sub, handler.clone()).await;
		let second = builder.root_menu("Second").await;
		builder.separator(&second).await;

		builder.remove(&first).await;
		assert_eq!(builder.len().await, 2);
		assert_eq!(builder.child_titles(None).await, vec!["Second"]);

		builder.remove_all().await;
		assert!(builder.is_empty().await);
	}

	#[tokio::test]
	async fn renders_indented_tree() {
		let builder = MemoryMenuBuilder::new();
		let handler = Arc::new(Counter::default());
		let root = builder.root_menu("Keyfill").await;
		let sub = builder.sub_menu("Names", &root).await;
		builder.menu_item("Alice", &sub, handler.clone()).await;
		builder.separator(&root).await;
		builder.choice("Inject value", &root, handler, true).await;

		assert_eq!(
			builder.render().await,
			"Keyfill >\n  Names >\n    Alice\n  ---\n  (*) Inject value\n"
		);
	}
}
