//! Tests for XmlPart: lazy parsing, caching and whole-document output

mod fixtures;

use fixtures::{
    libreoffice_container, sample_container, CONTENT_XML, LIBREOFFICE_CONTENT_XML, META_XML,
    STYLES_XML,
};
use odfxml::{Container, MemoryContainer, OdfError, OdfResult, XmlPart};
use pretty_assertions::assert_eq;
use std::cell::Cell;
use std::rc::Rc;

/// Container that counts part fetches
struct CountingContainer {
    inner: MemoryContainer,
    fetches: Cell<usize>,
}

impl CountingContainer {
    fn new() -> Self {
        Self {
            inner: sample_container(),
            fetches: Cell::new(0),
        }
    }
}

impl Container for CountingContainer {
    fn get_part(&self, name: &str) -> OdfResult<Vec<u8>> {
        self.fetches.set(self.fetches.get() + 1);
        self.inner.get_part(name)
    }
}

#[test]
fn get_element_list() {
    let part = XmlPart::new("content.xml", sample_container());
    let elements = part.get_element_list("//text:p").unwrap();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].text(), "This is an example.");
}

#[test]
fn part_is_fetched_once() {
    let container = Rc::new(CountingContainer::new());
    let part = XmlPart::new("content.xml", Rc::clone(&container));
    assert_eq!(part.part_name(), "content.xml");
    assert!(!part.is_loaded());

    part.get_element_list("//text:p").unwrap();
    part.get_element("//office:body").unwrap();
    part.root().unwrap();
    part.serialize(true).unwrap();
    assert_eq!(container.fetches.get(), 1);
}

#[test]
fn serialize_unmodified_parts() {
    for (name, xml) in [
        ("content.xml", CONTENT_XML),
        ("meta.xml", META_XML),
        ("styles.xml", STYLES_XML),
    ] {
        let part = XmlPart::new(name, sample_container());
        assert_eq!(
            String::from_utf8(part.serialize(false).unwrap()).unwrap(),
            xml,
            "part {} should round trip",
            name
        );
    }
}

#[test]
fn serialize_libreoffice_part_unchanged() {
    let part = XmlPart::new("content.xml", libreoffice_container());
    let paragraphs = part.get_element_list("//text:p").unwrap();
    assert_eq!(paragraphs[0].text(), "Caf\u{e9} & cr\u{e8}me> 10\u{20ac}");
    assert_eq!(paragraphs[2].text(), "\"Quoted\" text");
    assert_eq!(
        String::from_utf8(part.serialize(false).unwrap()).unwrap(),
        LIBREOFFICE_CONTENT_XML
    );
}

#[test]
fn serialize_libreoffice_part_after_edit() {
    let part = XmlPart::new("content.xml", libreoffice_container());
    let paragraphs = part.get_element_list("//text:p").unwrap();
    paragraphs[2].set_text("Plain");
    paragraphs[1].set_attribute("text:style-name", "P1").unwrap();

    // Only the edited nodes are written differently
    let expected = LIBREOFFICE_CONTENT_XML
        .replace("&quot;Quoted&quot; text", "Plain")
        .replace(
            r#"<text:p text:style-name="Standard"></text:p>"#,
            r#"<text:p text:style-name="P1"></text:p>"#,
        );
    assert_eq!(
        String::from_utf8(part.serialize(false).unwrap()).unwrap(),
        expected
    );
}

#[test]
fn serialize_keeps_declarations() {
    let part = XmlPart::new("content.xml", sample_container());
    let paragraph = part.get_element("//text:p").unwrap().unwrap();
    paragraph.set_text("Edited");
    let xml = String::from_utf8(part.serialize(false).unwrap()).unwrap();
    assert!(xml.contains(r#"xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0""#));
    assert!(xml.contains(r#"<text:p text:style-name="Standard">Edited</text:p>"#));
}

#[test]
fn serialize_pretty() {
    let container = MemoryContainer::new().with_part(
        "content.xml",
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0"><office:body><office:text><text:p>Mixed <text:span>content</text:span></text:p></office:text></office:body></office:document-content>"#,
    );
    let part = XmlPart::new("content.xml", container);
    let expected = concat!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n",
        "<office:document-content xmlns:office=\"urn:oasis:names:tc:opendocument:xmlns:office:1.0\" ",
        "xmlns:text=\"urn:oasis:names:tc:opendocument:xmlns:text:1.0\">\n",
        "  <office:body>\n",
        "    <office:text>\n",
        "      <text:p>Mixed <text:span>content</text:span></text:p>\n",
        "    </office:text>\n",
        "  </office:body>\n",
        "</office:document-content>\n"
    );
    assert_eq!(String::from_utf8(part.serialize(true).unwrap()).unwrap(), expected);
}

#[test]
fn delete_child() {
    let part = XmlPart::new("content.xml", sample_container());
    let scripts = part.get_element("office:scripts").unwrap().unwrap();
    part.delete_child(&scripts).unwrap();
    assert!(part.get_element("office:scripts").unwrap().is_none());
    assert!(matches!(part.delete_child(&scripts), Err(OdfError::NotAChild)));

    let xml = String::from_utf8(part.serialize(false).unwrap()).unwrap();
    assert!(!xml.contains("office:scripts"));
}

#[test]
fn clear_cache_discards_edits() {
    let container = CountingContainer::new();
    let part = XmlPart::new("content.xml", &container);
    let paragraph = part.get_element("//text:p").unwrap().unwrap();
    paragraph.set_text("Edited");

    part.clear_cache();
    assert!(!part.is_loaded());
    let fresh = part.get_element("//text:p").unwrap().unwrap();
    assert_eq!(fresh.text(), "This is an example.");
    assert_ne!(fresh, paragraph);
    assert_eq!(container.fetches.get(), 2);
}

#[test]
fn missing_part() {
    let part = XmlPart::new("settings.xml", sample_container());
    assert!(matches!(
        part.get_element_list("//config:config-item"),
        Err(OdfError::PartNotFound(_))
    ));
}

#[test]
fn malformed_part_is_not_cached() {
    let container = MemoryContainer::new().with_part("content.xml", "<office:document-content>");
    let part = XmlPart::new("content.xml", container);
    assert!(matches!(
        part.serialize(false),
        Err(OdfError::MalformedPart { .. })
    ));
    assert!(!part.is_loaded());
}
