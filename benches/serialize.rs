use criterion::{criterion_group, criterion_main, Criterion};
use odfxml::{create_element, InsertPosition, MemoryContainer, XmlPart};
use std::hint::black_box;

const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:table="urn:oasis:names:tc:opendocument:xmlns:table:1.0" office:version="1.2"><office:body><office:text/></office:body></office:document-content>
"#;

fn create_part(paragraphs: usize) -> XmlPart<MemoryContainer> {
    let part = XmlPart::new(
        "content.xml",
        MemoryContainer::new().with_part("content.xml", CONTENT),
    );
    let office_text = part.get_element("//office:text").unwrap().unwrap();
    for i in 0..paragraphs {
        let paragraph = create_element(r#"<text:p text:style-name="Standard"/>"#).unwrap();
        paragraph.set_text(&format!("Paragraph {} with <special> & \"quoted\" text", i));
        office_text
            .insert(&paragraph, InsertPosition::LastChild)
            .unwrap();
    }
    part
}

fn bench_serialize_compact(c: &mut Criterion) {
    let part = create_part(500);
    c.bench_function("serialize_compact", |b| {
        b.iter(|| {
            let _bytes = part.serialize(black_box(false)).unwrap();
        });
    });
}

fn bench_serialize_pretty(c: &mut Criterion) {
    let part = create_part(500);
    c.bench_function("serialize_pretty", |b| {
        b.iter(|| {
            let _bytes = part.serialize(black_box(true)).unwrap();
        });
    });
}

fn bench_serialize_fragment(c: &mut Criterion) {
    let part = create_part(50);
    let office_text = part.get_element("//office:text").unwrap().unwrap();
    c.bench_function("serialize_fragment", |b| {
        b.iter(|| {
            let _bytes = black_box(&office_text).serialize().unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_serialize_compact,
    bench_serialize_pretty,
    bench_serialize_fragment
);
criterion_main!(benches);
