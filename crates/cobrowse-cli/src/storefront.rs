//! Demo storefront document driven by the CLI peer.
//!
//! Both peers build the same tree, so selectors resolved on one side
//! locate the same element on the other.

use std::collections::HashMap;

use tokio::sync::mpsc;

use cobrowse_sync::{Document, Interaction, MemoryPage, NodeId};

pub struct Storefront {
    pub page: MemoryPage,
    targets: HashMap<String, NodeId>,
}

impl Storefront {
    pub fn build(path: &str) -> (Self, mpsc::UnboundedReceiver<Interaction>) {
        let (page, rx) = MemoryPage::new(path);
        let mut targets = HashMap::new();

        let html = page.append(page.root(), "html", None);
        let body = page.append(html, "body", None);

        let nav = page.append(body, "nav", Some("main-nav"));
        for name in ["home", "products", "cart", "account"] {
            targets.insert(format!("nav-{name}"), page.append(nav, "a", None));
        }

        let main = page.append(body, "main", Some("content"));
        targets.insert("search".into(), page.append_input(main, Some("search"), false));
        let list = page.append(main, "ul", Some("products"));
        for n in 1..=3 {
            let item = page.append(list, "li", None);
            let add = page.append(item, "button", None);
            targets.insert(format!("add-{n}"), add);
        }

        let form = page.append(body, "form", Some("checkout-form"));
        targets.insert("email".into(), page.append_input(form, Some("email"), false));
        targets.insert("password".into(), page.append_input(form, Some("password"), true));
        targets.insert("submit".into(), page.append(form, "button", Some("submit-btn")));

        (Self { page, targets }, rx)
    }

    /// Look up a named element.
    pub fn target(&self, name: &str) -> Option<NodeId> {
        self.targets.get(name).copied()
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(String::as_str)
    }
}
