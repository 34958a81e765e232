// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::io;
use std::str::from_utf8;

use quick_xml::events::{BytesStart, Event};

use super::model::{Element, NodeElement, WayElement};
use crate::{Error, Result};

/// Parser is a trait for objects which can parse XML.
///
/// This trait only exists to fix the mismatch of
/// [quick_xml::Reader::read_event] when working on buffered data
/// and [quick_xml::Reader::read_event_into] when working on IO.
trait Parser {
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>>;
}

/// IoParser implements [Parser] over an [std::io::BufRead].
struct IoParser<R: io::BufRead>(quick_xml::Reader<R>, Vec<u8>);

impl<R: io::BufRead> IoParser<R> {
    #[inline]
    fn new(reader: R) -> Self {
        Self(quick_xml::Reader::from_reader(reader), Vec::default())
    }
}

impl<R: io::BufRead> Parser for IoParser<R> {
    #[inline]
    fn read_event<'a>(&'a mut self) -> quick_xml::Result<Event<'a>> {
        self.1.clear();
        self.0.read_event_into(&mut self.1)
    }
}

/// BufParser implements [Parser] over a slice of bytes (`&[u8]`).
struct BufParser<'a>(quick_xml::Reader<&'a [u8]>);

impl<'a> BufParser<'a> {
    #[inline]
    fn new(data: &'a [u8]) -> Self {
        Self(quick_xml::Reader::from_reader(data))
    }
}

impl<'a> Parser for BufParser<'a> {
    #[inline]
    fn read_event<'b>(&'b mut self) -> quick_xml::Result<Event<'b>> {
        self.0.read_event()
    }
}

/// Reader reads map [Elements](Element) from an
/// [OSM XML](https://wiki.openstreetmap.org/wiki/OSM_XML) document.
///
/// Relations (and any other elements) are skipped, together with their children.
struct Reader<P: Parser> {
    parser: P,
    eof: bool,
}

impl<P: Parser> Reader<P> {
    #[inline]
    fn new(parser: P) -> Self {
        Self { parser, eof: false }
    }

    fn next_element(&mut self) -> Result<Option<Element>> {
        let mut e: Option<Element> = None;

        while !self.eof {
            match self.parser.read_event()? {
                Event::Empty(start) => match start.local_name().as_ref() {
                    // "way" can't be self-closing
                    b"node" => return parse_node(&start).map(|n| Some(Element::Node(n))),
                    b"tag" => {
                        if let Some(tags) = element_tags(&mut e) {
                            let (k, v) = parse_tag(&start)?;
                            tags.insert(k, v);
                        }
                    }
                    b"nd" => {
                        if let Some(nodes) = element_nodes(&mut e) {
                            nodes.push(parse_nd(&start)?);
                        }
                    }
                    _ => {}
                },

                Event::Start(start) => match start.local_name().as_ref() {
                    b"node" => e = Some(Element::Node(parse_node(&start)?)),
                    b"way" => e = Some(Element::Way(parse_way(&start)?)),
                    b"relation" => e = None,
                    // "tag" and "nd" must be self-closing
                    _ => {}
                },

                Event::End(end) => match end.local_name().as_ref() {
                    b"node" | b"way" => {
                        if let Some(e) = e.take() {
                            return Ok(Some(e));
                        }
                    }
                    _ => {}
                },

                Event::Eof => {
                    self.eof = true;
                }

                _ => {}
            }
        }

        match e {
            Some(Element::Node(n)) => Err(Error::MalformedSource(format!(
                "unexpected end of document inside node {}",
                n.id
            ))),
            Some(Element::Way(w)) => Err(Error::MalformedSource(format!(
                "unexpected end of document inside way {}",
                w.id
            ))),
            None => Ok(None),
        }
    }
}

impl<P: Parser> Iterator for Reader<P> {
    type Item = Result<Element>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_element() {
            Ok(Some(e)) => Some(Ok(e)),
            Ok(None) => None,
            Err(err) => {
                self.eof = true;
                Some(Err(err))
            }
        }
    }
}

impl<'a> Reader<BufParser<'a>> {
    #[inline]
    fn from_buffer(data: &'a [u8]) -> Self {
        Self::new(BufParser::new(data))
    }
}

impl<R: io::BufRead> Reader<IoParser<R>> {
    #[inline]
    fn from_io(reader: R) -> Self {
        Self::new(IoParser::new(reader))
    }
}

/// Parses all elements from an XML document provided by a buffered reader.
pub(super) fn elements_from_io<R: io::BufRead>(reader: R) -> Result<Vec<Element>> {
    Reader::from_io(reader).collect()
}

/// Parses all elements from an in-memory XML document.
pub(super) fn elements_from_buffer(data: &[u8]) -> Result<Vec<Element>> {
    Reader::from_buffer(data).collect()
}

fn attr_str<'a>(value: &'a [u8], what: &str) -> Result<&'a str> {
    from_utf8(value).map_err(|_| Error::malformed(format!("{what}: invalid utf-8")))
}

fn required<T>(value: Option<T>, element: &str, attribute: &str) -> Result<T> {
    value.ok_or_else(|| Error::malformed(format!("<{element}> without {attribute:?} attribute")))
}

fn parse_node(start: &BytesStart<'_>) -> Result<NodeElement> {
    let mut id = None;
    let mut lat = None;
    let mut lon = None;

    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"id" => id = Some(attr_str(&attr.value, "node id")?.to_string()),
            b"lat" => lat = Some(parse_coordinate(&attr.value, "lat")?),
            b"lon" => lon = Some(parse_coordinate(&attr.value, "lon")?),
            _ => {}
        }
    }

    Ok(NodeElement {
        id: required(id, "node", "id")?,
        lat: required(lat, "node", "lat")?,
        lon: required(lon, "node", "lon")?,
        tags: HashMap::default(),
    })
}

fn parse_coordinate(value: &[u8], what: &str) -> Result<f64> {
    let s = attr_str(value, what)?;
    match s.parse::<f64>() {
        Ok(x) if x.is_finite() => Ok(x),
        _ => Err(Error::malformed(format!("invalid node {what}: {s:?}"))),
    }
}

fn parse_way(start: &BytesStart<'_>) -> Result<WayElement> {
    let mut id = None;

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"id" {
            id = Some(attr_str(&attr.value, "way id")?.to_string());
        }
    }

    Ok(WayElement {
        id: required(id, "way", "id")?,
        nodes: Vec::default(),
        tags: HashMap::default(),
    })
}

fn parse_tag(start: &BytesStart<'_>) -> Result<(String, String)> {
    let mut k = None;
    let mut v = None;

    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"k" => k = Some(attr.unescape_value()?.into_owned()),
            b"v" => v = Some(attr.unescape_value()?.into_owned()),
            _ => {}
        }
    }

    Ok((required(k, "tag", "k")?, v.unwrap_or_default()))
}

fn parse_nd(start: &BytesStart<'_>) -> Result<String> {
    let mut ref_ = None;

    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == b"ref" {
            ref_ = Some(attr_str(&attr.value, "nd ref")?.to_string());
        }
    }

    required(ref_, "nd", "ref")
}

fn element_tags(e: &mut Option<Element>) -> Option<&mut HashMap<String, String>> {
    match e {
        Some(Element::Node(ref mut n)) => Some(&mut n.tags),
        Some(Element::Way(ref mut w)) => Some(&mut w.tags),
        None => None,
    }
}

fn element_nodes(e: &mut Option<Element>) -> Option<&mut Vec<String>> {
    match e {
        Some(Element::Way(ref mut w)) => Some(&mut w.nodes),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_XML: &[u8] = include_bytes!("test_fixtures/simple.osm");
    const SIMPLE_JSON: &[u8] = include_bytes!("test_fixtures/simple.json");

    #[test]
    fn parse_from_buf() -> Result<()> {
        let expected = super::super::json::elements_from_buffer(SIMPLE_JSON)?;
        assert_eq!(elements_from_buffer(SIMPLE_XML)?, expected);
        Ok(())
    }

    #[test]
    fn parse_from_io() -> Result<()> {
        let expected = super::super::json::elements_from_buffer(SIMPLE_JSON)?;
        assert_eq!(elements_from_io(io::Cursor::new(SIMPLE_XML))?, expected);
        Ok(())
    }

    #[test]
    fn escaped_tag_values() -> Result<()> {
        let data = br#"<osm><way id="7"><nd ref="1"/><nd ref="2"/><tag k="name" v="Smith &amp; Sons Rd"/></way></osm>"#;
        let elements = elements_from_buffer(data)?;
        match &elements[..] {
            [Element::Way(w)] => assert_eq!(w.tags["name"], "Smith & Sons Rd"),
            other => panic!("expected a single way, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn relation_tags_are_not_attached_to_previous_elements() -> Result<()> {
        let data = br#"<osm>
            <node id="1" lat="1" lon="2"/>
            <relation id="3"><member type="node" ref="1" role=""/><tag k="highway" v="stop"/></relation>
        </osm>"#;
        let elements = elements_from_buffer(data)?;
        match &elements[..] {
            [Element::Node(n)] => assert!(n.tags.is_empty()),
            other => panic!("expected a single node, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn node_without_lat_is_malformed() {
        let err = elements_from_buffer(br#"<osm><node id="1" lon="2"/></osm>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn node_with_invalid_lon_is_malformed() {
        let err =
            elements_from_buffer(br#"<osm><node id="1" lat="1" lon="east"/></osm>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn unclosed_way_is_malformed() {
        let data = br#"<osm><node id="1" lat="1" lon="2"/><way id="7"><nd ref="1"/>"#;
        let err = elements_from_buffer(data).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }

    #[test]
    fn nd_without_ref_is_malformed() {
        let err = elements_from_buffer(br#"<osm><way id="1"><nd/></way></osm>"#).unwrap_err();
        assert!(matches!(err, Error::MalformedSource(_)), "{err:?}");
    }
}
