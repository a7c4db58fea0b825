#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use catalog_engine::{build_url, FailureKind, FetchError, FetchedPage, Fetcher};

pub const ROOT: &str = "https://catalog.test/katalog-firem/";

#[derive(Clone)]
enum Canned {
    Page { status: u16, body: String },
    Timeout,
}

/// In-memory site. Unknown URLs answer 404; registered section prefixes
/// answer with an empty result page.
#[derive(Default)]
pub struct StubFetcher {
    pages: Mutex<HashMap<String, Canned>>,
    empty_sections: Mutex<Vec<String>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, body: impl Into<String>) {
        self.insert(url, &[], Canned::Page { status: 200, body: body.into() });
    }

    pub fn status(&self, url: &str, status: u16) {
        self.insert(url, &[], Canned::Page { status, body: String::new() });
    }

    pub fn timeout(&self, url: &str) {
        self.insert(url, &[], Canned::Timeout);
    }

    /// Registers result pages `1..=pages.len()` of a section, each holding the
    /// given contact urls. Every other page of the section is empty.
    pub fn section(&self, url: &str, pages: &[Vec<String>]) {
        for (idx, contacts) in pages.iter().enumerate() {
            let page = (idx + 1).to_string();
            self.insert(
                url,
                &[("p", page.as_str())],
                Canned::Page { status: 200, body: section_html(contacts) },
            );
        }
        self.empty_sections.lock().unwrap().push(url.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_starting_with(&self, prefix: &str) -> usize {
        self.requests().iter().filter(|r| r.starts_with(prefix)).count()
    }

    fn insert(&self, url: &str, query: &[(&str, &str)], canned: Canned) {
        let key = build_url(url, query).unwrap().to_string();
        self.pages.lock().unwrap().insert(key, canned);
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, url: &str, query: &[(&str, &str)]) -> Result<FetchedPage, FetchError> {
        let key = build_url(url, query)?.to_string();
        self.requests.lock().unwrap().push(key.clone());

        let canned = self.pages.lock().unwrap().get(&key).cloned();
        match canned {
            Some(Canned::Page { status, body }) => Ok(FetchedPage { status, body, final_url: key }),
            Some(Canned::Timeout) => Err(FetchError::new(
                FailureKind::Timeout,
                "operation timed out",
            )),
            None => {
                let is_section = self
                    .empty_sections
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|prefix| key.starts_with(prefix.as_str()));
                let (status, body) = if is_section {
                    (200, section_html(&[]))
                } else {
                    (404, String::new())
                };
                Ok(FetchedPage { status, body, final_url: key })
            }
        }
    }
}

pub fn catalog_html(sections: &[(&str, &str)]) -> String {
    let headers: String = sections
        .iter()
        .map(|(name, href)| format!(r#"<h3><a href="{href}">{name}</a></h3>"#))
        .collect();
    format!(
        r#"<html><body><div class="row"><div class="col">{headers}</div></div></body></html>"#
    )
}

pub fn section_html(contacts: &[String]) -> String {
    let rows: String = contacts
        .iter()
        .map(|url| {
            format!(
                r#"<div itemscope itemtype="https://schema.org/Organization">
                     <h2 itemprop="name">Firma</h2><a href="{url}">Kontakt</a>
                   </div>"#
            )
        })
        .collect();
    format!(r#"<html><body><div id="divFirmy">{rows}</div></body></html>"#)
}

pub fn card_html(name: &str, emails: &[&str]) -> String {
    let rows: String = emails
        .iter()
        .map(|email| {
            format!(
                r#"<tr><td>E-mail</td><td>
                     <span itemprop="email"><a href="mailto:{email}">{email}</a></span>
                   </td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<html><body><h3 id="h3CompanyName">{name}</h3>
           <table class="contact-table">{rows}</table></body></html>"#
    )
}

pub fn contact_urls(section: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("https://catalog.test/{section}/firma-{i}/kontakt"))
        .collect()
}
