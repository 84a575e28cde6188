//! Sample ODF parts shared by the integration tests

#![allow(dead_code)]

use odfxml::MemoryContainer;

/// `content.xml` of a text document with a single paragraph
pub const CONTENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.2"><office:scripts/><office:font-face-decls><style:font-face xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0" style:name="DejaVu Sans" svg:font-family="&apos;DejaVu Sans&apos;"/></office:font-face-decls><office:automatic-styles/><office:body><office:text><text:sequence-decls><text:sequence-decl text:display-outline-level="0" text:name="Illustration"/><text:sequence-decl text:display-outline-level="0" text:name="Table"/></text:sequence-decls><text:p text:style-name="Standard">This is an example.</text:p></office:text></office:body></office:document-content>
"#;

/// `content.xml` as LibreOffice writes it: entity-escaped quotes in
/// attributes, character references, explicit empty end tags
pub const LIBREOFFICE_CONTENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:svg="urn:oasis:names:tc:opendocument:xmlns:svg-compatible:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.3"><office:scripts></office:scripts><office:font-face-decls><style:font-face style:name="Liberation Serif" svg:font-family="&apos;Liberation Serif&apos;" style:font-family-generic="roman" style:font-pitch="variable"/><style:font-face style:name="Noto Sans CJK SC" svg:font-family='"Noto Sans CJK SC"' style:font-family-generic="system"/></office:font-face-decls><office:automatic-styles><style:style style:name="P1" style:family="paragraph" style:parent-style-name="Standard"><style:text-properties fo:font-weight="bold"/></style:style></office:automatic-styles><office:body><office:text><text:sequence-decls><text:sequence-decl text:display-outline-level="0" text:name="Illustration"/></text:sequence-decls><text:p text:style-name="P1">Caf&#233; &amp; cr&#xE8;me<text:s text:c="2"/>&gt; 10&#x20AC;</text:p><text:p text:style-name="Standard"></text:p><text:p text:style-name="Standard">&quot;Quoted&quot; text</text:p></office:text></office:body></office:document-content>
"#;

/// `meta.xml` with creator and date
pub const META_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0" office:version="1.2">
  <office:meta>
    <meta:generator>OpenOffice.org/3.0$Linux OpenOffice.org_project/300m15$Build-9379</meta:generator>
    <meta:creation-date>2009-06-22T16:12:07</meta:creation-date>
    <dc:creator>Romain Gauthier</dc:creator>
    <dc:date>2009-06-22T16:22:33</dc:date>
    <meta:document-statistic meta:paragraph-count="1" meta:word-count="4" meta:character-count="19"/>
  </office:meta>
</office:document-meta>
"#;

/// `styles.xml` with a paragraph style, a date style and a properties child
pub const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-styles xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:number="urn:oasis:names:tc:opendocument:xmlns:datastyle:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0" office:version="1.2">
  <office:styles>
    <style:style style:name="Standard" style:family="paragraph">
      <style:paragraph-properties fo:margin-top="0cm"/>
    </style:style>
    <number:date-style style:name="N37">
      <number:day/>
    </number:date-style>
  </office:styles>
</office:document-styles>
"#;

/// Container holding the three sample parts
pub fn sample_container() -> MemoryContainer {
    MemoryContainer::new()
        .with_part("content.xml", CONTENT_XML)
        .with_part("meta.xml", META_XML)
        .with_part("styles.xml", STYLES_XML)
}

/// Container holding the LibreOffice-style content part
pub fn libreoffice_container() -> MemoryContainer {
    MemoryContainer::new().with_part("content.xml", LIBREOFFICE_CONTENT_XML)
}
