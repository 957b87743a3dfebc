//! Wire form of a [`Layout`]: `{ people, connectors }` with camelCase keys.

use crate::ir::PartnerStatus;
use crate::layout::{Layout, Segment};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub people: Vec<PersonDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDump {
    pub id: String,
    pub name: String,
    pub shape: &'static str,
    pub x: f32,
    pub y: f32,
    pub is_ego: bool,
    pub is_deceased: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDump {
    pub from_x: f32,
    pub from_y: f32,
    pub to_x: f32,
    pub to_y: f32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PartnerStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub waypoints: Vec<[f32; 2]>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub decorations: Vec<[f32; 4]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<String>,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let people = layout
            .people
            .iter()
            .map(|person| PersonDump {
                id: person.id.clone(),
                name: person.name.clone(),
                shape: person.shape.as_str(),
                x: person.x,
                y: person.y,
                is_ego: person.is_ego,
                is_deceased: person.is_deceased,
            })
            .collect();

        let connectors = layout
            .connectors
            .iter()
            .map(|connector| ConnectorDump {
                from_x: connector.from.x,
                from_y: connector.from.y,
                to_x: connector.to.x,
                to_y: connector.to.y,
                kind: connector.kind.as_str(),
                status: connector.status,
                id: connector.id.clone(),
                from_id: connector.from_id.clone(),
                to_id: connector.to_id.clone(),
                waypoints: connector.waypoints.iter().map(|p| [p.x, p.y]).collect(),
                decorations: connector
                    .decorations
                    .iter()
                    .map(|Segment { from, to }| [from.x, from.y, to.x, to.y])
                    .collect(),
                dash: connector.stroke.dash_array(),
            })
            .collect();

        LayoutDump { people, connectors }
    }
}

pub fn to_json_string(layout: &Layout) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&LayoutDump::from_layout(layout))
}

/// Writes the dump to `path`, or to stdout when `None`.
pub fn write_layout_json(path: Option<&Path>, layout: &Layout) -> anyhow::Result<()> {
    let dump = LayoutDump::from_layout(layout);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, &dump)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}
