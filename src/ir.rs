use serde::{Deserialize, Deserializer, Serialize};

/// Person ids are opaque on the wire (string or integer) and normalised to strings.
pub type PersonId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    #[serde(alias = "m")]
    Male,
    #[serde(alias = "f")]
    Female,
}

impl Sex {
    pub fn shape(self) -> Shape {
        match self {
            Self::Male => Shape::Rect,
            Self::Female => Shape::Circle,
        }
    }
}

/// Symbol primitive the renderer draws for a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Circle,
    Rect,
}

impl Shape {
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "rect" | "rectangle" | "square" => Self::Rect,
            _ => Self::Circle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Rect => "rect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RelationshipKind {
    #[serde(rename = "partner")]
    Partner,
    #[serde(rename = "parent-child")]
    ParentChild,
    #[serde(rename = "sibling")]
    Sibling,
}

impl RelationshipKind {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "partner" => Some(Self::Partner),
            "parent-child" | "parent_child" | "parent" => Some(Self::ParentChild),
            "sibling" => Some(Self::Sibling),
            _ => None,
        }
    }

    pub fn is_directed(self) -> bool {
        matches!(self, Self::ParentChild)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartnerStatus {
    #[default]
    Married,
    Divorced,
    Conflicted,
    Separated,
}

impl PartnerStatus {
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "married" => Some(Self::Married),
            "divorced" => Some(Self::Divorced),
            "conflicted" => Some(Self::Conflicted),
            "separated" => Some(Self::Separated),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Married => "married",
            Self::Divorced => "divorced",
            Self::Conflicted => "conflicted",
            Self::Separated => "separated",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub sex: Sex,
    pub is_deceased: bool,
    pub is_focal: bool,
    /// Sequence index assigned at ingestion; every tie-break uses it.
    pub order: usize,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>, sex: Sex) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            sex,
            is_deceased: false,
            is_focal: false,
            order: 0,
        }
    }

    pub fn deceased(mut self, value: bool) -> Self {
        self.is_deceased = value;
        self
    }

    pub fn focal(mut self, value: bool) -> Self {
        self.is_focal = value;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub from: PersonId,
    pub to: PersonId,
    pub kind: RelationshipKind,
    /// Only meaningful for partner relationships.
    pub status: Option<PartnerStatus>,
    pub order: usize,
}

impl Relationship {
    pub fn new(
        from: impl Into<PersonId>,
        to: impl Into<PersonId>,
        kind: RelationshipKind,
        status: Option<PartnerStatus>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            kind,
            status,
            order: 0,
        }
    }

    pub fn partner(a: impl Into<PersonId>, b: impl Into<PersonId>, status: PartnerStatus) -> Self {
        Self::new(a, b, RelationshipKind::Partner, Some(status))
    }

    pub fn parent_child(parent: impl Into<PersonId>, child: impl Into<PersonId>) -> Self {
        Self::new(parent, child, RelationshipKind::ParentChild, None)
    }

    pub fn sibling(a: impl Into<PersonId>, b: impl Into<PersonId>) -> Self {
        Self::new(a, b, RelationshipKind::Sibling, None)
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<PersonId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Int(value) => value.to_string(),
        RawId::Float(value) => value.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativePerson {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: PersonId,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "gender")]
    pub sex: Sex,
    #[serde(default, alias = "isFocal")]
    pub is_ego: bool,
    #[serde(default)]
    pub is_deceased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeRelationship {
    #[serde(deserialize_with = "deserialize_id")]
    pub from: PersonId,
    #[serde(deserialize_with = "deserialize_id")]
    pub to: PersonId,
    #[serde(rename = "type")]
    pub kind: RelationshipKind,
    #[serde(default, alias = "relationshipStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<PartnerStatus>,
}

/// `{ persons, relationships }`, the shape produced by the data-entry side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeInput {
    pub persons: Vec<NativePerson>,
    #[serde(default)]
    pub relationships: Vec<NativeRelationship>,
}

impl NativeInput {
    /// Removes a person together with every relationship that names them.
    /// Returns `false` when no such person exists.
    pub fn remove_person(&mut self, id: &str) -> bool {
        let before = self.persons.len();
        self.persons.retain(|p| p.id != id);
        if self.persons.len() == before {
            return false;
        }
        self.relationships.retain(|r| r.from != id && r.to != id);
        true
    }

    /// Converts the wire records into domain values, stamping input order.
    pub fn to_parts(&self) -> (Vec<Person>, Vec<Relationship>) {
        let people = self
            .persons
            .iter()
            .enumerate()
            .map(|(order, p)| Person {
                id: p.id.clone(),
                name: p.name.clone(),
                sex: p.sex,
                is_deceased: p.is_deceased,
                is_focal: p.is_ego,
                order,
            })
            .collect();
        let relationships = self
            .relationships
            .iter()
            .enumerate()
            .map(|(order, r)| Relationship {
                from: r.from.clone(),
                to: r.to.clone(),
                kind: r.kind,
                status: r.status,
                order,
            })
            .collect();
        (people, relationships)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericNode {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub shape: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    #[serde(default)]
    pub is_ego: bool,
    #[serde(default)]
    pub is_dummy: bool,
    #[serde(default)]
    pub is_deceased: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericEdge {
    #[serde(deserialize_with = "deserialize_id")]
    pub from: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub to: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, alias = "relationshipStatus", skip_serializing_if = "Option::is_none")]
    pub status: Option<PartnerStatus>,
}

impl GenericEdge {
    pub fn relationship_kind(&self) -> Option<RelationshipKind> {
        self.kind.as_deref().and_then(RelationshipKind::from_token)
    }
}

/// `{ nodes, edges }`, the shape handed to a hierarchical graph-layout backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenericInput {
    pub nodes: Vec<GenericNode>,
    #[serde(default)]
    pub edges: Vec<GenericEdge>,
}

/// Either input shape, resolved once when the document is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LayoutInput {
    Native(NativeInput),
    Generic(GenericInput),
}

impl From<NativeInput> for LayoutInput {
    fn from(input: NativeInput) -> Self {
        Self::Native(input)
    }
}

impl From<GenericInput> for LayoutInput {
    fn from(input: GenericInput) -> Self {
        Self::Generic(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_input_accepts_numeric_ids_and_legacy_field_names() {
        let json = r#"{
            "persons": [
                {"id": 1, "name": "Ego", "gender": "female", "isEgo": true},
                {"id": "2", "name": "Partner", "sex": "male"}
            ],
            "relationships": [
                {"from": 1, "to": 2, "type": "partner", "relationshipStatus": "divorced"}
            ]
        }"#;
        let input: LayoutInput = serde_json::from_str(json).unwrap();
        let LayoutInput::Native(native) = input else {
            panic!("expected native input");
        };
        assert_eq!(native.persons[0].id, "1");
        assert!(native.persons[0].is_ego);
        assert_eq!(native.persons[1].sex, Sex::Male);
        assert_eq!(native.relationships[0].status, Some(PartnerStatus::Divorced));
    }

    #[test]
    fn generic_input_is_resolved_by_shape() {
        let json = r#"{
            "nodes": [{"id": "person-1", "label": "A", "shape": "square"}],
            "edges": []
        }"#;
        let input: LayoutInput = serde_json::from_str(json).unwrap();
        assert!(matches!(input, LayoutInput::Generic(_)));
    }

    #[test]
    fn to_parts_stamps_input_order() {
        let input = NativeInput {
            persons: vec![
                NativePerson {
                    id: "b".into(),
                    name: "B".into(),
                    sex: Sex::Male,
                    is_ego: false,
                    is_deceased: true,
                },
                NativePerson {
                    id: "a".into(),
                    name: "A".into(),
                    sex: Sex::Female,
                    is_ego: false,
                    is_deceased: false,
                },
            ],
            relationships: Vec::new(),
        };
        let (people, _) = input.to_parts();
        assert_eq!(people[0].order, 0);
        assert_eq!(people[1].order, 1);
        assert!(people[0].is_deceased);
    }

    #[test]
    fn removing_a_person_drops_their_relationships() {
        let json = r#"{
            "persons": [
                {"id": "mom", "name": "Mom", "sex": "female"},
                {"id": "dad", "name": "Dad", "sex": "male"},
                {"id": "kid", "name": "Kid", "sex": "male"}
            ],
            "relationships": [
                {"from": "mom", "to": "dad", "type": "partner"},
                {"from": "mom", "to": "kid", "type": "parent-child"},
                {"from": "dad", "to": "kid", "type": "parent-child"}
            ]
        }"#;
        let mut input: NativeInput = serde_json::from_str(json).unwrap();

        assert!(input.remove_person("dad"));
        assert_eq!(input.persons.len(), 2);
        assert_eq!(input.relationships.len(), 1);
        assert_eq!(input.relationships[0].from, "mom");
        assert_eq!(input.relationships[0].to, "kid");

        assert!(!input.remove_person("dad"));
        assert_eq!(input.relationships.len(), 1);
    }

    #[test]
    fn shape_tokens() {
        assert_eq!(Shape::from_token("square"), Shape::Rect);
        assert_eq!(Shape::from_token("rect"), Shape::Rect);
        assert_eq!(Shape::from_token("circle"), Shape::Circle);
        assert_eq!(Sex::Female.shape(), Shape::Circle);
    }
}
