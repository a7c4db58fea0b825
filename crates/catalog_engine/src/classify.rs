use regex::Regex;
use scraper::Html;

use catalog_core::{CatalogError, Company};

use crate::dom::{DomNode, Query};

/// Shown on legal-name pages of businesses that no longer trade.
pub const TERMINATED_BUSINESS: &str = "Živnost subjektu byla ukončena.";

/// The three contact page layouts the catalog serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVariant {
    /// Company name card with a contact table.
    CompanyCard,
    /// Contacts division with the name inside its heading.
    ContactsDivision,
    /// Legal-name heading, emails as plain mailto links around it.
    LegalName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub variant: LayoutVariant,
    pub name: String,
    pub emails: Vec<String>,
}

impl ContactDetails {
    pub fn into_company(
        self,
        section_name: &str,
        contact_url: &str,
    ) -> Result<Company, CatalogError> {
        Company::new(self.name, section_name, contact_url, self.emails)
    }
}

/// Recognises a contact page layout and pulls out the company name and emails.
///
/// Markers are checked in a fixed order (card, contacts division, legal name)
/// and the first hit decides the layout.
#[derive(Debug, Clone)]
pub struct ContactPageClassifier {
    company_name: Query,
    contact_table: Query,
    contacts_division: Query,
    heading: Query,
    name_span: Query,
    legal_name: Query,
    email_field: Query,
    link: Query,
    mailto_link: Query,
    terminated: Query,
}

impl ContactPageClassifier {
    pub fn new() -> Self {
        let mailto = Regex::new("(?i)^\\s*mailto:").expect("static pattern");
        Self {
            company_name: Query::id("h3CompanyName"),
            contact_table: Query::class("contact-table"),
            contacts_division: Query::id("divContacts"),
            heading: Query::tag("h1"),
            name_span: Query::tag("span"),
            legal_name: Query::id("h1Nadpis").with_attr("itemprop", "legalName"),
            email_field: Query::any().with_attr("itemprop", "email"),
            link: Query::tag("a"),
            mailto_link: Query::tag("a").with_attr_matching("href", mailto),
            terminated: Query::any().with_own_text(TERMINATED_BUSINESS),
        }
    }

    pub fn classify_html(&self, html: &str, url: &str) -> Result<ContactDetails, CatalogError> {
        let document = Html::parse_document(html);
        self.classify(document.root_element(), url)
    }

    pub fn classify<N: DomNode>(&self, root: N, url: &str) -> Result<ContactDetails, CatalogError> {
        if let Some(marker) = root.find_first(&self.company_name) {
            let name = required_name(marker.text_content(), url)?;
            let emails = root
                .find_first(&self.contact_table)
                .map(|table| self.email_field_links(table))
                .unwrap_or_default();
            return Ok(ContactDetails {
                variant: LayoutVariant::CompanyCard,
                name,
                emails,
            });
        }

        if let Some(container) = root.find_first(&self.contacts_division) {
            let heading = container
                .find_first(&self.heading)
                .ok_or_else(|| malformed_division(url, "h1"))?;
            let name_elem = heading
                .find_first(&self.name_span)
                .ok_or_else(|| malformed_division(url, "name span"))?;
            let name = required_name(name_elem.text_content(), url)?;
            return Ok(ContactDetails {
                variant: LayoutVariant::ContactsDivision,
                name,
                emails: self.email_field_links(container),
            });
        }

        if let Some(heading) = root.find_first(&self.legal_name) {
            let name = required_name(heading.text_content(), url)?;
            let emails = if root.find_first(&self.terminated).is_some() {
                Vec::new()
            } else {
                let scope = heading
                    .parent_element()
                    .and_then(|parent| parent.parent_element())
                    .unwrap_or(root);
                scope
                    .find_all(&self.mailto_link)
                    .iter()
                    .filter_map(|anchor| anchor.attr("href").and_then(email_address))
                    .collect()
            };
            return Ok(ContactDetails {
                variant: LayoutVariant::LegalName,
                name,
                emails,
            });
        }

        Err(CatalogError::UnknownPageLayout {
            url: url.to_string(),
        })
    }

    /// Links inside `itemprop="email"` fields beneath `scope`.
    fn email_field_links<N: DomNode>(&self, scope: N) -> Vec<String> {
        scope
            .find_all(&self.email_field)
            .iter()
            .flat_map(|field| field.find_all(&self.link))
            .filter_map(|anchor| anchor.attr("href").and_then(email_address))
            .collect()
    }
}

impl Default for ContactPageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn required_name(text: String, url: &str) -> Result<String, CatalogError> {
    let name = text.trim();
    if name.is_empty() {
        return Err(CatalogError::MissingCompanyName {
            url: url.to_string(),
        });
    }
    Ok(name.to_string())
}

fn malformed_division(url: &str, missing: &str) -> CatalogError {
    CatalogError::MalformedLayoutB {
        url: url.to_string(),
        missing: missing.to_string(),
    }
}

/// `mailto:Info@Firma.cz?subject=x` becomes `Info@Firma.cz`.
pub fn email_address(href: &str) -> Option<String> {
    let href = href.trim();
    let address = match href.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &href[7..],
        _ => href,
    };
    let address = address.split('?').next().unwrap_or(address).trim();
    (!address.is_empty()).then(|| address.to_string())
}
