use super::ooxml::{event_text, Package};
use crate::registry::DocumentParser;
use docchat_core::{DocumentFormat, LoadError};
use quick_xml::events::Event;
use quick_xml::Reader;

const FORMAT: DocumentFormat = DocumentFormat::Docx;

/// Word documents: every paragraph of `word/document.xml`, each followed by a
/// newline. Tabs and breaks inside runs are kept.
pub struct DocxParser;

impl DocumentParser for DocxParser {
    fn format(&self) -> DocumentFormat {
        FORMAT
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let xml = Package::open(bytes, FORMAT)?.required_part("word/document.xml")?;
        paragraphs(&xml)
    }
}

/// Body paragraphs in document order. Text-box content (`w:txbxContent`) is
/// anchored inside a run of another paragraph and is left out, so the
/// surrounding paragraph keeps its own runs intact.
fn paragraphs(xml: &str) -> Result<String, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut open: Vec<String> = Vec::new();
    let mut in_run = false;
    let mut in_text = false;
    let mut text_box_depth = 0usize;

    loop {
        let event = reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))?;
        if text_box_depth > 0 {
            match &event {
                Event::Start(e) if e.local_name().as_ref() == b"txbxContent" => {
                    text_box_depth += 1;
                }
                Event::End(e) if e.local_name().as_ref() == b"txbxContent" => {
                    text_box_depth -= 1;
                }
                Event::Eof => break,
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => in_run = true,
                b"t" => in_text = in_run,
                b"txbxContent" => text_box_depth = 1,
                _ => {}
            },
            Event::Empty(e) if e.local_name().as_ref() == b"p" => text.push('\n'),
            Event::Empty(e) if in_run => match e.local_name().as_ref() {
                b"tab" => push(&mut open, "\t"),
                b"br" | b"cr" => push(&mut open, "\n"),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        text.push_str(&paragraph);
                        text.push('\n');
                    }
                }
                b"r" => in_run = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            other if in_text => {
                if let Some(chunk) = event_text(&other, FORMAT)? {
                    push(&mut open, &chunk);
                }
            }
            _ => {}
        }
    }

    Ok(text)
}

fn push(open: &mut [String], chunk: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(chunk);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parsers::ooxml::fixture::package;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p>
      <w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>
      <w:r><w:t>Quarterly</w:t></w:r><w:r><w:t xml:space="preserve"> report</w:t></w:r>
    </w:p>
    <w:p><w:r><w:t>Revenue</w:t><w:tab/><w:t>R&amp;D</w:t></w:r></w:p>
    <w:p/>
  </w:body>
</w:document>"#;

    #[test]
    fn test_paragraphs_with_runs_and_tabs() {
        let bytes = package(&[("word/document.xml", DOC)]);
        let text = DocxParser.parse(&bytes).unwrap();
        assert_eq!(text, "Quarterly report\nRevenue\tR&D\n\n");
    }

    #[test]
    fn test_text_box_does_not_split_paragraph() {
        let doc = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
          <w:body>
            <w:p>
              <w:r><w:t xml:space="preserve">Before </w:t></w:r>
              <w:r><w:pict><v:shape><v:textbox><w:txbxContent>
                <w:p><w:r><w:t>Box</w:t></w:r></w:p>
              </w:txbxContent></v:textbox></v:shape></w:pict></w:r>
              <w:r><w:t>After</w:t></w:r>
            </w:p>
            <w:p><w:r><w:t>Next</w:t></w:r></w:p>
          </w:body>
        </w:document>"#;
        let bytes = package(&[("word/document.xml", doc)]);
        assert_eq!(DocxParser.parse(&bytes).unwrap(), "Before After\nNext\n");
    }

    #[test]
    fn test_missing_document_part() {
        let bytes = package(&[("word/styles.xml", "<w:styles/>")]);
        let err = DocxParser.parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("missing part word/document.xml"));
    }

    #[test]
    fn test_not_a_zip() {
        let err = DocxParser.parse(b"plain text pretending").unwrap_err();
        assert!(matches!(
            err,
            LoadError::ParseFailure {
                format: DocumentFormat::Docx,
                ..
            }
        ));
    }
}
