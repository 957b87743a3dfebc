use crate::error::ParseError;
use crate::ir::{
    LayoutInput, NativeInput, NativePerson, NativeRelationship, PartnerStatus, RelationshipKind,
    Sex,
};
use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^genogram\s*$").unwrap());
static INIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^%%\{\s*init\s*:\s*(\{.*\})\s*\}%%").unwrap());
static STYLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^style\s+(?P<id>\w+)\s+(?P<flags>.+)$").unwrap());
static EDGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<left>\w+(?:\[[^\]]*\])?)\s*(?P<arrow>-->|===|-\.-)(?:\|(?P<status>[^|]*)\|)?\s*(?P<right>\w+(?:\[[^\]]*\])?)$",
    )
    .unwrap()
});
static NODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<id>\w+)(?:\[(?P<label>[^\]]*)\])?$").unwrap());

#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutput {
    pub input: LayoutInput,
    /// Contents of a `%%{init: {...}}%%` directive, merged over the config.
    pub init_config: Option<serde_json::Value>,
}

impl ParseOutput {
    pub fn native(&self) -> Option<&NativeInput> {
        match &self.input {
            LayoutInput::Native(native) => Some(native),
            LayoutInput::Generic(_) => None,
        }
    }
}

/// Accepts either a JSON/JSON5 layout document (first non-blank character
/// `{`) or the line-oriented genogram notation.
pub fn parse_source(source: &str) -> anyhow::Result<ParseOutput> {
    if source.trim_start().starts_with('{') {
        let value: serde_json::Value =
            json5::from_str(source).context("failed to parse JSON input")?;
        let input: LayoutInput = serde_json::from_value(value)
            .context("input is neither a {persons, relationships} nor a {nodes, edges} document")?;
        return Ok(ParseOutput {
            input,
            init_config: None,
        });
    }
    Ok(parse_genogram(source)?)
}

#[derive(Default)]
struct Document {
    persons: Vec<NativePerson>,
    index: HashMap<String, usize>,
    relationships: Vec<NativeRelationship>,
}

impl Document {
    /// Declares `id` if needed; an explicit label always wins over the
    /// implicit one.
    fn ensure_person(&mut self, id: &str, label: Option<&str>) -> &mut NativePerson {
        let idx = match self.index.get(id) {
            Some(&idx) => idx,
            None => {
                self.persons.push(NativePerson {
                    id: id.to_string(),
                    name: id.to_string(),
                    sex: Sex::Male,
                    is_ego: false,
                    is_deceased: false,
                });
                self.index.insert(id.to_string(), self.persons.len() - 1);
                self.persons.len() - 1
            }
        };
        let person = &mut self.persons[idx];
        if let Some(label) = label {
            person.name = label.to_string();
        }
        person
    }

    fn endpoint(&mut self, token: &str) -> String {
        let (id, label) = split_endpoint(token);
        self.ensure_person(&id, label.as_deref());
        id
    }
}

pub fn parse_genogram(input: &str) -> Result<ParseOutput, ParseError> {
    let mut doc = Document::default();
    let mut init_config = None;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(caps) = INIT_RE.captures(trimmed) {
            if let Some(json_str) = caps.get(1).map(|m| m.as_str()) {
                match json5::from_str::<serde_json::Value>(json_str) {
                    Ok(value) => init_config = Some(value),
                    Err(err) => tracing::warn!(line = line_no, %err, "ignoring malformed init directive"),
                }
            }
            continue;
        }
        let line = strip_trailing_comment(trimmed);
        if line.is_empty() || HEADER_RE.is_match(&line) {
            continue;
        }

        if let Some(caps) = STYLE_RE.captures(&line) {
            let id = &caps["id"];
            let person = doc.ensure_person(id, None);
            for flag in caps["flags"]
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|f| !f.is_empty())
            {
                apply_style_flag(person, flag).ok_or_else(|| ParseError::UnknownStyle {
                    line: line_no,
                    flag: flag.to_string(),
                })?;
            }
            continue;
        }

        if let Some(caps) = EDGE_RE.captures(&line) {
            let kind = match &caps["arrow"] {
                "-->" => RelationshipKind::ParentChild,
                "===" => RelationshipKind::Partner,
                _ => RelationshipKind::Sibling,
            };
            let status = match caps.name("status").map(|m| m.as_str().trim()) {
                None => None,
                Some(token) if kind == RelationshipKind::Partner => {
                    Some(PartnerStatus::from_token(token).ok_or_else(|| {
                        ParseError::UnknownStatus {
                            line: line_no,
                            status: token.to_string(),
                        }
                    })?)
                }
                Some(_) => {
                    return Err(ParseError::UnrecognizedLine {
                        line: line_no,
                        text: line.clone(),
                    });
                }
            };
            let from = doc.endpoint(&caps["left"]);
            let to = doc.endpoint(&caps["right"]);
            doc.relationships.push(NativeRelationship {
                from,
                to,
                kind,
                status,
            });
            continue;
        }

        if let Some(caps) = NODE_RE.captures(&line) {
            let label = caps.name("label").map(|m| clean_label(m.as_str()));
            doc.ensure_person(&caps["id"], label.as_deref());
            continue;
        }

        return Err(ParseError::UnrecognizedLine {
            line: line_no,
            text: line,
        });
    }

    tracing::debug!(
        persons = doc.persons.len(),
        relationships = doc.relationships.len(),
        "genogram notation parsed"
    );
    Ok(ParseOutput {
        input: LayoutInput::Native(NativeInput {
            persons: doc.persons,
            relationships: doc.relationships,
        }),
        init_config,
    })
}

fn apply_style_flag(person: &mut NativePerson, flag: &str) -> Option<()> {
    match flag.to_ascii_lowercase().as_str() {
        "female" | "f" | "shape:circle" => person.sex = Sex::Female,
        "male" | "m" | "shape:rect" | "shape:square" => person.sex = Sex::Male,
        "deceased" | "dead" => person.is_deceased = true,
        "ego" | "focal" | "self" => person.is_ego = true,
        _ => return None,
    }
    Some(())
}

fn split_endpoint(token: &str) -> (String, Option<String>) {
    match NODE_RE.captures(token.trim()) {
        Some(caps) => (
            caps["id"].to_string(),
            caps.name("label").map(|m| clean_label(m.as_str())),
        ),
        None => (token.trim().to_string(), None),
    }
}

fn clean_label(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Drops a trailing `%%` comment unless it sits inside a `[...]` label.
fn strip_trailing_comment(line: &str) -> String {
    let mut in_label = false;
    let mut chars = line.chars().peekable();
    let mut out = String::new();
    while let Some(ch) = chars.next() {
        match ch {
            '[' => in_label = true,
            ']' => in_label = false,
            '%' if !in_label && chars.peek() == Some(&'%') => break,
            _ => {}
        }
        out.push(ch);
    }
    out.trim().to_string()
}
