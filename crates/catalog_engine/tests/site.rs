mod support;

use catalog_core::{CatalogError, Listing, SectionId};
use catalog_engine::{
    CatalogDirectory, CatalogSite, ContactSource, ListingParser, SectionPageSource,
};
use pretty_assertions::assert_eq;

use support::{card_html, catalog_html, contact_urls, section_html, StubFetcher, ROOT};

#[test]
fn sections_are_read_in_catalog_order() {
    let html = r##"<html><body>
      <div class="col">
        <h3><a href="/doprava/">Doprava</a></h3>
        <h3><a href="https://other.test/stavby/">Stavby</a></h3>
      </div>
      <div class="col">
        <h3>Bez odkazu</h3>
        <h3><a href="/doprava-2/">Doprava</a></h3>
        <h3><a href="/potraviny/"> Potraviny </a></h3>
      </div>
      <h3><a href="/mimo-sloupec/">Mimo sloupec</a></h3>
    </body></html>"##;

    let sections = CatalogDirectory::new(ROOT).parse_sections(html, ROOT);

    assert_eq!(
        sections,
        vec![
            SectionId::new("Doprava", "https://catalog.test/doprava/"),
            SectionId::new("Stavby", "https://other.test/stavby/"),
            SectionId::new("Potraviny", "https://catalog.test/potraviny/"),
        ]
    );
}

#[tokio::test]
async fn catalog_failure_carries_status() {
    let stub = StubFetcher::new();
    stub.status(ROOT, 503);

    let err = CatalogDirectory::new(ROOT).list_sections(&stub).await.unwrap_err();

    assert_eq!(
        err,
        CatalogError::CatalogFetch {
            url: ROOT.into(),
            status: 503,
        }
    );
}

#[tokio::test]
async fn catalog_lists_sections_from_fetcher() {
    let stub = StubFetcher::new();
    stub.page(ROOT, catalog_html(&[("Doprava", "/doprava/"), ("Potraviny", "/potraviny/")]));

    let sections = CatalogDirectory::new(ROOT).list_sections(&stub).await.unwrap();

    assert_eq!(sections.len(), 2);
    assert_eq!(sections[1].url, "https://catalog.test/potraviny/");
}

#[test]
fn listing_parser_resolves_contact_links() {
    let html = r#"<div id="divFirmy">
      <div itemtype="https://schema.org/Organization">
        <a href="/firma-a/">Detail</a><a href="/firma-a/kontakt">Kontakt</a>
      </div>
      <div itemtype="https://schema.org/Organization">
        <a href="https://catalog.test/firma-b/kontakt">Kontakt</a>
      </div>
    </div>"#;
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");

    let page = ListingParser::new()
        .parse(html, &section, 2, "https://catalog.test/doprava/?p=2")
        .unwrap();

    assert_eq!(page.listing_count, 2);
    assert_eq!(
        page.listings,
        vec![
            Listing { contact_url: "https://catalog.test/firma-a/kontakt".into() },
            Listing { contact_url: "https://catalog.test/firma-b/kontakt".into() },
        ]
    );
}

#[test]
fn listing_without_contact_link_stops_the_page() {
    let html = r#"<div id="divFirmy">
      <div itemtype="https://schema.org/Organization"><a href="/firma-a/kontakt">Kontakt</a></div>
      <div itemtype="https://schema.org/Organization"><span>bez kontaktu</span></div>
      <div itemtype="https://schema.org/Organization"><a href="/firma-c/kontakt">Kontakt</a></div>
    </div>"#;
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");

    let page = ListingParser::new()
        .parse(html, &section, 1, "https://catalog.test/doprava/?p=1")
        .unwrap();

    assert_eq!(page.listing_count, 3);
    assert_eq!(page.listings.len(), 1);
}

#[test]
fn page_without_container_is_malformed() {
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");
    let err = ListingParser::new()
        .parse(
            "<html><body>Údržba</body></html>",
            &section,
            7,
            "https://catalog.test/doprava/?p=7",
        )
        .unwrap_err();

    assert_eq!(
        err,
        CatalogError::MalformedSectionPage {
            section: "Doprava".into(),
            page: 7,
            url: "https://catalog.test/doprava/?p=7".into(),
        }
    );
}

#[tokio::test]
async fn site_fetches_numbered_section_pages() {
    let stub = StubFetcher::new();
    let url = "https://catalog.test/doprava/";
    stub.section(url, &[contact_urls("doprava", 25), contact_urls("doprava", 3)]);
    let site = CatalogSite::new(&stub);
    let section = SectionId::new("Doprava", url);

    let second = site.section_page(&section, 2).await.unwrap();
    let beyond = site.section_page(&section, 9).await.unwrap();

    assert_eq!(second.listing_count, 3);
    assert_eq!(beyond, catalog_engine::SectionPage::default());
    assert_eq!(
        stub.requests(),
        vec![
            "https://catalog.test/doprava/?p=2".to_string(),
            "https://catalog.test/doprava/?p=9".to_string(),
        ]
    );
}

#[tokio::test]
async fn section_page_error_status_names_the_page() {
    let stub = StubFetcher::new();
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");

    let err = CatalogSite::new(&stub).section_page(&section, 4).await.unwrap_err();

    assert_eq!(
        err,
        CatalogError::SectionPage {
            section: "Doprava".into(),
            page: 4,
            status: 404,
            url: "https://catalog.test/doprava/?p=4".into(),
        }
    );
}

#[tokio::test]
async fn contact_page_becomes_company() {
    let stub = StubFetcher::new();
    let contact = "https://catalog.test/doprava/firma-0/kontakt";
    stub.page(contact, card_html("Rychlá Doprava s.r.o.", &["info@rychla.cz"]));
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");
    let listing = Listing { contact_url: contact.into() };

    let company = CatalogSite::new(&stub).company(&section, &listing).await.unwrap();

    assert_eq!(company.name(), "Rychlá Doprava s.r.o.");
    assert_eq!(company.section_name(), "Doprava");
    assert_eq!(company.contact_url(), contact);
    assert_eq!(company.emails(), ["info@rychla.cz".to_string()]);
}

#[tokio::test]
async fn contact_transport_failures_keep_their_kind() {
    let stub = StubFetcher::new();
    let slow = "https://catalog.test/doprava/pomala/kontakt";
    let gone = "https://catalog.test/doprava/zrusena/kontakt";
    stub.timeout(slow);
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");
    let site = CatalogSite::new(&stub);

    let timeout = site
        .company(&section, &Listing { contact_url: slow.into() })
        .await
        .unwrap_err();
    let missing = site
        .company(&section, &Listing { contact_url: gone.into() })
        .await
        .unwrap_err();

    assert!(timeout.is_timeout());
    assert_eq!(missing, CatalogError::HttpStatus { url: gone.into(), status: 404 });
}

#[test]
fn section_html_fixture_parses() {
    let section = SectionId::new("Doprava", "https://catalog.test/doprava/");
    let page = ListingParser::new()
        .parse(
            &section_html(&contact_urls("doprava", 2)),
            &section,
            1,
            "https://catalog.test/doprava/?p=1",
        )
        .unwrap();
    assert_eq!(page.listings.len(), 2);
}
