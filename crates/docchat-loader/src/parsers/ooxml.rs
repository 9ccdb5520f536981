//! Shared plumbing for Office Open XML containers (docx, pptx, xlsx).

use docchat_core::{DocumentFormat, LoadError};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub(crate) struct Package<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    format: DocumentFormat,
}

impl<'a> Package<'a> {
    pub(crate) fn open(bytes: &'a [u8], format: DocumentFormat) -> Result<Self, LoadError> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| LoadError::parse(format, format!("not an OOXML package: {e}")))?;
        Ok(Self { archive, format })
    }

    /// Read a part as UTF-8, `None` when the part is absent.
    pub(crate) fn part(&mut self, name: &str) -> Result<Option<String>, LoadError> {
        let format = self.format;
        let mut file = match self.archive.by_name(name) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(LoadError::parse(format, e)),
        };
        let mut xml = String::new();
        file.read_to_string(&mut xml)
            .map_err(|e| LoadError::parse(format, format!("{name}: {e}")))?;
        Ok(Some(xml))
    }

    /// Like [`Package::part`] but absence is an error.
    pub(crate) fn required_part(&mut self, name: &str) -> Result<String, LoadError> {
        self.part(name)?
            .ok_or_else(|| LoadError::parse(self.format, format!("missing part {name}")))
    }

    pub(crate) fn part_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }
}

/// Character data carried by a text-like event, with entity references resolved.
pub(crate) fn event_text(
    event: &Event<'_>,
    format: DocumentFormat,
) -> Result<Option<String>, LoadError> {
    let fail = |e: &dyn std::fmt::Display| LoadError::parse(format, e);
    match event {
        Event::Text(t) => Ok(Some(t.decode().map_err(|e| fail(&e))?.into_owned())),
        Event::CData(c) => Ok(Some(c.decode().map_err(|e| fail(&e))?.into_owned())),
        Event::GeneralRef(r) => {
            if let Some(ch) = r.resolve_char_ref().map_err(|e| fail(&e))? {
                return Ok(Some(ch.to_string()));
            }
            let name = r.decode().map_err(|e| fail(&e))?;
            Ok(resolve_predefined_entity(&name).map(str::to_string))
        }
        _ => Ok(None),
    }
}

/// Value of the attribute whose local name is `local`.
pub(crate) fn attr(
    start: &BytesStart<'_>,
    local: &[u8],
    format: DocumentFormat,
) -> Result<Option<String>, LoadError> {
    find_attr(start, format, |key| key.local_name().as_ref() == local)
}

/// The relationship id (`r:id`) of an element. Unprefixed `id` attributes,
/// such as the numeric one on `p:sldId`, are not relationship ids.
pub(crate) fn relationship_id(
    start: &BytesStart<'_>,
    format: DocumentFormat,
) -> Result<Option<String>, LoadError> {
    find_attr(start, format, |key| {
        key.prefix().is_some() && key.local_name().as_ref() == b"id"
    })
}

fn find_attr(
    start: &BytesStart<'_>,
    format: DocumentFormat,
    matches: impl Fn(&quick_xml::name::QName<'_>) -> bool,
) -> Result<Option<String>, LoadError> {
    for a in start.attributes() {
        let a = a.map_err(|e| LoadError::parse(format, e))?;
        if matches(&a.key) {
            let value = a
                .unescape_value()
                .map_err(|e| LoadError::parse(format, e))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Relationship id -> part name for a `.rels` part. Relative targets are
/// resolved against `base`, the folder of the part that owns the rels.
pub(crate) fn relationships(
    xml: &str,
    base: &str,
    format: DocumentFormat,
) -> Result<HashMap<String, String>, LoadError> {
    let mut targets = HashMap::new();
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event().map_err(|e| LoadError::parse(format, e))? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"Relationship" => {
                if let (Some(id), Some(target)) =
                    (attr(&e, b"Id", format)?, attr(&e, b"Target", format)?)
                {
                    let part = match target.strip_prefix('/') {
                        Some(absolute) => absolute.to_string(),
                        None => format!("{base}/{target}"),
                    };
                    targets.insert(id, part);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(targets)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_relationship_targets() {
        let rels = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
          <Relationship Id="rId1" Type="slide" Target="slides/slide1.xml"/>
          <Relationship Id="rId2" Type="slide" Target="/ppt/slides/slide9.xml"/>
          <Relationship Id="rId3" Type="external"/>
        </Relationships>"#;
        let map = relationships(rels, "ppt", DocumentFormat::Pptx).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["rId1"], "ppt/slides/slide1.xml");
        assert_eq!(map["rId2"], "ppt/slides/slide9.xml");
    }

    #[test]
    fn test_relationship_id_needs_prefix() {
        let xml = r#"<p:sldId xmlns:p="p" xmlns:r="r" id="256" r:id="rId7"/>"#;
        let mut reader = Reader::from_str(xml);
        let Event::Empty(e) = reader.read_event().unwrap() else {
            panic!("expected an empty element");
        };
        assert_eq!(
            relationship_id(&e, DocumentFormat::Pptx).unwrap().as_deref(),
            Some("rId7")
        );
        assert_eq!(
            attr(&e, b"id", DocumentFormat::Pptx).unwrap().as_deref(),
            Some("256")
        );
    }
}
