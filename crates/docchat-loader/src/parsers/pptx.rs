use super::ooxml::{event_text, relationship_id, relationships, Package};
use crate::registry::DocumentParser;
use docchat_core::{DocumentFormat, LoadError};
use quick_xml::events::Event;
use quick_xml::Reader;

const FORMAT: DocumentFormat = DocumentFormat::Pptx;

/// PowerPoint decks: slides in deck order, the text of every shape that has
/// a text body. A shape's paragraphs are joined with `\n` and each shape is
/// followed by `\n`.
pub struct PptxParser;

impl DocumentParser for PptxParser {
    fn format(&self) -> DocumentFormat {
        FORMAT
    }

    fn parse(&self, bytes: &[u8]) -> Result<String, LoadError> {
        let mut package = Package::open(bytes, FORMAT)?;

        let slides = match package.part("ppt/presentation.xml")? {
            Some(presentation) => match listed_slides(&mut package, &presentation)? {
                listed if listed.is_empty() => numbered_slides(&package),
                listed => listed,
            },
            None => {
                let numbered = numbered_slides(&package);
                if numbered.is_empty() {
                    return Err(LoadError::parse(FORMAT, "missing part ppt/presentation.xml"));
                }
                numbered
            }
        };

        let mut text = String::new();
        for name in slides {
            let xml = package.required_part(&name)?;
            text.push_str(&slide_text(&xml)?);
        }
        Ok(text)
    }
}

/// Slide parts in the order of the presentation's `sldIdLst`.
fn listed_slides(package: &mut Package<'_>, presentation: &str) -> Result<Vec<String>, LoadError> {
    let mut ids = Vec::new();
    let mut reader = Reader::from_str(presentation);
    loop {
        match reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sldId" => {
                if let Some(id) = relationship_id(&e, FORMAT)? {
                    ids.push(id);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if ids.is_empty() {
        return Ok(ids);
    }

    let Some(rels) = package.part("ppt/_rels/presentation.xml.rels")? else {
        return Ok(Vec::new());
    };
    let targets = relationships(&rels, "ppt", FORMAT)?;
    Ok(ids.iter().filter_map(|id| targets.get(id).cloned()).collect())
}

/// Slide parts sorted by file number, for decks without a usable slide list.
fn numbered_slides(package: &Package<'_>) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = package
        .part_names()
        .into_iter()
        .filter_map(|name| slide_number(&name).map(|n| (n, name)))
        .collect();
    slides.sort_by_key(|(n, _)| *n);
    slides.into_iter().map(|(_, name)| name).collect()
}

/// `ppt/slides/slide12.xml` -> 12
fn slide_number(name: &str) -> Option<u32> {
    name.strip_prefix("ppt/slides/slide")?
        .strip_suffix(".xml")?
        .parse()
        .ok()
}

fn slide_text(xml: &str) -> Result<String, LoadError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut has_body = false;
    let mut in_text = false;

    loop {
        match reader.read_event().map_err(|e| LoadError::parse(FORMAT, e))? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"sp" => {
                    paragraphs.clear();
                    has_body = false;
                }
                b"txBody" => has_body = true,
                b"p" => paragraph.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"br" => paragraph.push('\n'),
                b"p" if has_body => paragraphs.push(String::new()),
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" if has_body => paragraphs.push(std::mem::take(&mut paragraph)),
                b"sp" if has_body => {
                    text.push_str(&paragraphs.join("\n"));
                    text.push('\n');
                    has_body = false;
                }
                _ => {}
            },
            Event::Eof => break,
            other if in_text => {
                if let Some(chunk) = event_text(&other, FORMAT)? {
                    paragraph.push_str(&chunk);
                }
            }
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parsers::ooxml::fixture::package;

    fn slide(shapes: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
       xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main">
  <p:cSld><p:spTree>{shapes}</p:spTree></p:cSld>
</p:sld>"#
        )
    }

    fn shape(paragraphs: &[&str]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<a:p><a:r><a:t>{p}</a:t></a:r></a:p>"))
            .collect();
        format!("<p:sp><p:nvSpPr/><p:txBody><a:bodyPr/>{body}</p:txBody></p:sp>")
    }

    #[test]
    fn test_slides_in_numeric_order() {
        let s2 = slide(&shape(&["Second slide"]));
        let s10 = slide(&shape(&["Tenth slide"]));
        let s1 = slide(&format!(
            "{}{}<p:pic><p:nvPicPr/></p:pic>",
            shape(&["Title"]),
            shape(&["Bullet one", "Bullet two"])
        ));
        let bytes = package(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/slides/slide10.xml", s10.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
        ]);

        let text = PptxParser.parse(&bytes).unwrap();
        assert_eq!(
            text,
            "Title\nBullet one\nBullet two\nSecond slide\nTenth slide\n"
        );
    }

    #[test]
    fn test_slides_follow_presentation_order() {
        let presentation = r#"<p:presentation
            xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"
            xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
          <p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>
          <p:sldIdLst>
            <p:sldId id="257" r:id="rId3"/>
            <p:sldId id="256" r:id="rId2"/>
          </p:sldIdLst>
        </p:presentation>"#;
        let rels = r#"<Relationships>
          <Relationship Id="rId1" Target="slideMasters/slideMaster1.xml"/>
          <Relationship Id="rId2" Target="slides/slide1.xml"/>
          <Relationship Id="rId3" Target="/ppt/slides/slide2.xml"/>
        </Relationships>"#;
        let s1 = slide(&shape(&["Moved to the end"]));
        let s2 = slide(&shape(&["Now the opener"]));
        let bytes = package(&[
            ("ppt/presentation.xml", presentation),
            ("ppt/_rels/presentation.xml.rels", rels),
            ("ppt/slides/slide1.xml", s1.as_str()),
            ("ppt/slides/slide2.xml", s2.as_str()),
        ]);

        assert_eq!(
            PptxParser.parse(&bytes).unwrap(),
            "Now the opener\nMoved to the end\n"
        );
    }

    #[test]
    fn test_shape_without_text_body_is_skipped() {
        let s1 = slide("<p:sp><p:nvSpPr/><p:spPr/></p:sp>");
        let bytes = package(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/slides/slide1.xml", s1.as_str()),
        ]);
        assert_eq!(PptxParser.parse(&bytes).unwrap(), "");
    }

    #[test]
    fn test_not_a_presentation() {
        let bytes = package(&[("word/document.xml", "<w:document/>")]);
        let err = PptxParser.parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            LoadError::ParseFailure {
                format: DocumentFormat::Pptx,
                ..
            }
        ));
    }

    #[test]
    fn test_slide_number() {
        assert_eq!(slide_number("ppt/slides/slide7.xml"), Some(7));
        assert_eq!(slide_number("ppt/slides/_rels/slide7.xml.rels"), None);
        assert_eq!(slide_number("ppt/slideLayouts/slideLayout1.xml"), None);
    }
}
