use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8};

use catalog_logging::catalog_debug;

/// Turns a response body into text.
///
/// Order of trust: byte order mark, then the `charset` of the Content-Type
/// header, then a `chardetng` guess. Malformed sequences are replaced rather
/// than rejected so one stray byte cannot cost a whole page.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_label)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| guess_encoding(bytes));

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        catalog_debug!("body had malformed {} sequences, replaced", used.name());
    }
    text.into_owned()
}

fn guess_encoding(bytes: &[u8]) -> &'static Encoding {
    if std::str::from_utf8(bytes).is_ok() {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    detector.guess(Some(b"cz".as_slice()), true)
}

fn charset_label(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}
