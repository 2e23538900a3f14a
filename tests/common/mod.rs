//! Fixture builders shared by the integration tests.
//!
//! PDFs are assembled with lopdf using the built-in Courier font so
//! pdf-extract can decode them without embedded font programs. DOCX files
//! are minimal OOXML packages written with the zip crate.

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// Build a PDF with one page per entry; each entry holds that page's lines,
/// drawn top to bottom. An empty entry yields a page with no text layer.
pub fn pdf(pages: &[&[&str]]) -> Vec<u8> {
    pdf_with_info(pages, &[])
}

/// Like [`pdf`], with `(key, value)` pairs written to the `/Info` dictionary.
pub fn pdf_with_info(pages: &[&[&str]], info: &[(&str, &str)]) -> Vec<u8> {
    let placed: Vec<Vec<(i64, &str)>> = pages
        .iter()
        .map(|lines| {
            lines
                .iter()
                .enumerate()
                .map(|(i, line)| (720 - 16 * i as i64, *line))
                .collect()
        })
        .collect();
    let placed: Vec<&[(i64, &str)]> = placed.iter().map(|p| p.as_slice()).collect();
    build_pdf(&placed, info)
}

/// Build a PDF whose lines are drawn at explicit baselines `(y, text)`, in
/// the given stream order.
pub fn pdf_at(pages: &[&[(i64, &str)]]) -> Vec<u8> {
    build_pdf(pages, &[])
}

fn build_pdf(pages: &[&[(i64, &str)]], info: &[(&str, &str)]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for &(y, line) in lines.iter() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("Td", vec![72.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    if !info.is_empty() {
        let mut dict = lopdf::Dictionary::new();
        for (key, value) in info {
            dict.set(*key, Object::string_literal(*value));
        }
        let info_id = doc.add_object(dict);
        doc.trailer.set("Info", info_id);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Minimal DOCX whose body holds one `w:p` per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    docx_with_core(paragraphs, None)
}

/// Minimal DOCX with optional core properties `(title, creator, subject)`.
pub fn docx_with_core(paragraphs: &[&str], core: Option<(&str, &str, &str)>) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    let mut entries = vec![("word/document.xml".to_string(), document)];
    if let Some((title, creator, subject)) = core {
        entries.push((
            "docProps/core.xml".to_string(),
            format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
                 <cp:coreProperties \
                 xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
                 xmlns:dc=\"http://purl.org/dc/elements/1.1/\">\
                 <dc:title>{}</dc:title><dc:creator>{}</dc:creator><dc:subject>{}</dc:subject>\
                 </cp:coreProperties>",
                title, creator, subject
            ),
        ));
        entries.push((
            "docProps/app.xml".to_string(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\">\
             <Application>Microsoft Office Word</Application></Properties>"
                .to_string(),
        ));
    }
    zip_entries(&entries)
}

/// A ZIP archive with arbitrary entries.
pub fn zip_entries(entries: &[(String, String)]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
        for (name, content) in entries {
            zip.start_file(name.as_str(), zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

/// Path of the `ragdoc` binary built alongside the test executable.
pub fn ragdoc_binary() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop();
    path.pop();
    path.push("ragdoc");
    path
}
