// 行の解析
//
// A vertical file line is either a structure tag or a token. The tag grammar
// is deliberately loose (this is not xml): a tag is anything starting with
// '<' and ending with '>', everything else is a token with tab separated
// positional attributes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    accumulator::StructAttrAccumulator,
    error::{LineError, TagKind},
    model::{AttrMap, Event, Structure, StructureClose, Token},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Open,
    Close,
    SelfClose,
    Token,
}

pub fn is_element(src: &str) -> bool {
    src.starts_with('<') && src.ends_with('>')
}

pub fn classify_line(src: &str) -> LineKind {
    if !is_element(src) {
        LineKind::Token
    } else if src.starts_with("</") {
        LineKind::Close
    } else if src.ends_with("/>") {
        LineKind::SelfClose
    } else {
        LineKind::Open
    }
}

// anything but `key="value"` (spaces around '=', no quotes, empty value) is skipped
pub fn parse_attr_val(src: &str) -> AttrMap {
    static REGEX_ATTR_VAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(\w+)="([^"]+)""#).unwrap());

    REGEX_ATTR_VAL
        .captures_iter(src)
        .map(|c| (c[1].to_owned(), c[2].to_owned()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub event: Event,
    pub error: Option<LineError>,
}

impl ParsedLine {
    fn ok(event: Event) -> Self {
        ParsedLine { event, error: None }
    }

    fn with_error(event: Event, error: LineError) -> Self {
        ParsedLine {
            event,
            error: Some(error),
        }
    }
}

fn parse_tag(src: &str, kind: TagKind) -> Result<Structure, LineError> {
    static REGEX_OPEN_TAG: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^<([\w\d\p{Po}]+)(\s+.*?|)>$").unwrap());
    static REGEX_SELF_CLOSE_TAG: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^<([\w\d\p{Po}]+)(\s+.*?|)/>$").unwrap());

    let regex = match kind {
        TagKind::SelfClose => &REGEX_SELF_CLOSE_TAG,
        _ => &REGEX_OPEN_TAG,
    };
    let c = regex.captures(src).ok_or_else(|| LineError::MalformedTag {
        kind,
        src: src.to_owned(),
    })?;

    let name = c[1].to_owned();
    let attrs = parse_attr_val(&c[2]);
    Ok(match kind {
        TagKind::SelfClose => Structure::self_closing(name, attrs),
        _ => Structure::new(name, attrs),
    })
}

fn parse_close_tag(src: &str) -> Result<String, LineError> {
    static REGEX_CLOSE_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^</([^>\s]+)\s*>$").unwrap());

    REGEX_CLOSE_TAG
        .captures(src)
        .map(|c| c[1].to_owned())
        .ok_or_else(|| LineError::MalformedTag {
            kind: TagKind::Close,
            src: src.to_owned(),
        })
}

// `token_idx` is used only if the line turns out to be a token
pub fn parse_line<A: StructAttrAccumulator + ?Sized>(
    line: &str,
    acc: &mut A,
    token_idx: usize,
) -> ParsedLine {
    let line = line.trim_end_matches(['\n', '\r', ' ']);

    match classify_line(line) {
        LineKind::Open => match parse_tag(line, TagKind::Open) {
            Ok(structure) => match acc.begin(structure.clone()) {
                Ok(()) => ParsedLine::ok(Event::Structure(structure)),
                Err(err) => ParsedLine::with_error(Event::Structure(structure), err),
            },
            Err(err) => ParsedLine::with_error(
                Event::Structure(Structure::new("", AttrMap::new())),
                err,
            ),
        },

        LineKind::Close => {
            let name = match parse_close_tag(line) {
                Ok(name) => name,
                Err(err) => {
                    return ParsedLine::with_error(
                        Event::StructureClose(StructureClose::new("")),
                        err,
                    )
                }
            };
            match acc.end(&name) {
                Ok(closed) => {
                    ParsedLine::ok(Event::StructureClose(StructureClose::new(closed.name)))
                }
                Err(err) => {
                    ParsedLine::with_error(Event::StructureClose(StructureClose::new(name)), err)
                }
            }
        }

        LineKind::SelfClose => match parse_tag(line, TagKind::SelfClose) {
            Ok(structure) => ParsedLine::ok(Event::Structure(structure)),
            Err(err) => ParsedLine::with_error(
                Event::Structure(Structure::self_closing("", AttrMap::new())),
                err,
            ),
        },

        LineKind::Token => {
            let mut items = line.split('\t');
            let word = items.next().unwrap_or_default().to_owned();
            let attrs = items.map(|s| s.to_owned()).collect();
            ParsedLine::ok(Event::Token(Token {
                idx: token_idx,
                word,
                attrs,
                struct_attrs: acc.current_attrs(),
            }))
        }
    }
}

#[derive(Debug)]
pub struct LineParser<A> {
    acc: A,
    next_token_idx: usize,
}

impl<A: StructAttrAccumulator> LineParser<A> {
    pub fn new(acc: A) -> Self {
        LineParser {
            acc,
            next_token_idx: 0,
        }
    }

    pub fn parse(&mut self, line: &str) -> ParsedLine {
        let parsed = parse_line(line, &mut self.acc, self.next_token_idx);
        if matches!(parsed.event, Event::Token(_)) {
            self.next_token_idx += 1;
        }
        parsed
    }

    pub fn num_tokens(&self) -> usize {
        self.next_token_idx
    }

    pub fn accumulator(&self) -> &A {
        &self.acc
    }
}
