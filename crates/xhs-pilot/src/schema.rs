//! Allow-listed extraction schemas.
//!
//! The client state object is cyclic and unbounded, so it is never serialized
//! wholesale. Each use case declares a [`Recipe`]: a root path inside the
//! hydrated state, a path to re-wrap the result under, and a [`Shape`] tree
//! naming every leaf that may be copied. Every node degrades to a
//! type-appropriate default when the source is absent or of the wrong type.
//!
//! The same shape tree drives two walkers that must agree: the in-page
//! JavaScript generated by [`crate::extractor`], and [`Shape::project`] here,
//! which is the reference implementation used by the scripted driver and tests.

use serde::Serialize;
use serde_json::{Map, Value};

/// Nodes deeper than this take their default.
pub const MAX_DEPTH: usize = 12;

/// Lists are truncated to this many accepted items.
pub const MAX_LIST_ITEMS: usize = 1000;

/// One node of an extraction schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    /// Non-empty string, default `""`.
    Text,
    /// Counter rendered as a string; numbers are stringified. Default `"0"`.
    Count,
    /// Finite number, default `0`.
    Number,
    /// Boolean, default `false`.
    Flag,
    /// Object with allow-listed fields. Default `{}`, or `null` when nullable.
    Record { fields: Vec<FieldSpec>, nullable: bool },
    /// Array; items that project to nothing are dropped. Default `[]`.
    List { item: Box<Shape> },
    /// Object used as a map; entries that project to nothing are dropped. Default `{}`.
    Keyed { value: Box<Shape> },
}

/// A named field of a [`Shape::Record`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Dotted source paths tried in order; the first one that projects wins.
    pub sources: Vec<&'static str>,
    pub shape: Shape,
    /// A required field that cannot be projected rejects the whole record.
    pub required: bool,
}

impl FieldSpec {
    pub fn new(name: &'static str, shape: Shape) -> Self {
        Self {
            name,
            sources: vec![name],
            shape,
            required: false,
        }
    }

    pub fn from(mut self, sources: &[&'static str]) -> Self {
        self.sources = sources.to_vec();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn project_from(&self, obj: &Map<String, Value>, depth: usize) -> Option<Value> {
        let found = self
            .sources
            .iter()
            .find_map(|path| self.shape.project_at(lookup_in(obj, path), depth + 1));
        match found {
            Some(v) => Some(v),
            None if self.required => None,
            None => Some(self.shape.default_value()),
        }
    }
}

impl Shape {
    pub fn record(fields: Vec<FieldSpec>) -> Self {
        Shape::Record {
            fields,
            nullable: false,
        }
    }

    pub fn nullable_record(fields: Vec<FieldSpec>) -> Self {
        Shape::Record {
            fields,
            nullable: true,
        }
    }

    pub fn list(item: Shape) -> Self {
        Shape::List {
            item: Box::new(item),
        }
    }

    pub fn keyed(value: Shape) -> Self {
        Shape::Keyed {
            value: Box::new(value),
        }
    }

    /// The value substituted when this node cannot be projected.
    pub fn default_value(&self) -> Value {
        match self {
            Shape::Text => Value::String(String::new()),
            Shape::Count => Value::String("0".to_string()),
            Shape::Number => Value::from(0),
            Shape::Flag => Value::Bool(false),
            Shape::Record { nullable: true, .. } => Value::Null,
            Shape::Record { .. } | Shape::Keyed { .. } => Value::Object(Map::new()),
            Shape::List { .. } => Value::Array(Vec::new()),
        }
    }

    /// Project `raw` through this shape. `None` means absent, mistyped or rejected.
    pub fn project(&self, raw: Option<&Value>) -> Option<Value> {
        self.project_at(raw, 0)
    }

    fn project_at(&self, raw: Option<&Value>, depth: usize) -> Option<Value> {
        if depth > MAX_DEPTH {
            return None;
        }
        let raw = raw?;

        match self {
            Shape::Text => raw
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string())),
            Shape::Count => match raw {
                Value::String(s) if !s.is_empty() => Some(Value::String(s.clone())),
                Value::Number(n) => Some(Value::String(n.to_string())),
                _ => None,
            },
            Shape::Number => raw.is_number().then(|| raw.clone()),
            Shape::Flag => raw.as_bool().map(Value::Bool),
            Shape::Record { fields, .. } => {
                let obj = raw.as_object()?;
                let mut out = Map::new();
                for field in fields {
                    out.insert(field.name.to_string(), field.project_from(obj, depth)?);
                }
                Some(Value::Object(out))
            }
            Shape::List { item } => {
                let items = raw.as_array()?;
                Some(Value::Array(
                    items
                        .iter()
                        .filter_map(|v| item.project_at(Some(v), depth + 1))
                        .take(MAX_LIST_ITEMS)
                        .collect(),
                ))
            }
            Shape::Keyed { value } => {
                let obj = raw.as_object()?;
                Some(Value::Object(
                    obj.iter()
                        .filter_map(|(k, v)| {
                            value.project_at(Some(v), depth + 1).map(|p| (k.clone(), p))
                        })
                        .collect(),
                ))
            }
        }
    }
}

/// Resolve a dotted path. Numeric segments index into arrays.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |cur, seg| match cur {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn lookup_in<'a>(obj: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    match path.split_once('.') {
        Some((head, rest)) => obj.get(head).and_then(|v| lookup(v, rest)),
        None => obj.get(path),
    }
}

/// A named extraction use case.
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub name: &'static str,
    /// Path of the subtree inside the hydrated state object.
    pub root: &'static str,
    /// Path the projected subtree is re-wrapped under in the output.
    pub output: &'static str,
    pub shape: Shape,
    /// When the root is absent but its parent object exists, yield the
    /// shape's default instead of the sentinel.
    pub empty_when_absent: bool,
}

impl Recipe {
    /// Search results: `search.feeds._value`.
    pub fn search() -> Self {
        Self {
            name: "search",
            root: "search.feeds",
            output: "search.feeds",
            shape: feeds_ref_shape(),
            empty_when_absent: false,
        }
    }

    /// Home page recommendations: `feed.feeds._value`.
    pub fn home_feeds() -> Self {
        Self {
            name: "home_feeds",
            root: "feed.feeds",
            output: "feed.feeds",
            shape: feeds_ref_shape(),
            empty_when_absent: false,
        }
    }

    /// Detail view: `note.noteDetailMap`, keyed by feed id. A hydrated `note`
    /// without the map reads as an empty map.
    pub fn feed_detail() -> Self {
        Self {
            name: "feed_detail",
            root: "note.noteDetailMap",
            output: "note.noteDetailMap",
            shape: Shape::keyed(detail_entry_shape()),
            empty_when_absent: true,
        }
    }

    /// Profile page: `user.userPageData` and `user.notes`.
    pub fn user_profile() -> Self {
        Self {
            name: "user_profile",
            root: "user",
            output: "user",
            shape: Shape::record(vec![
                FieldSpec::new("userPageData", page_data_shape())
                    .from(&[
                        "userPageData._rawValue",
                        "userPageData._value",
                        "userPageData.value",
                        "userPageData",
                    ])
                    .required(),
                FieldSpec::new("notes", Shape::list(Shape::list(feed_shape()))).from(&[
                    "notes._rawValue",
                    "notes._value",
                    "notes.value",
                    "notes",
                ]),
            ]),
            empty_when_absent: false,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "search" => Some(Self::search()),
            "home_feeds" => Some(Self::home_feeds()),
            "feed_detail" => Some(Self::feed_detail()),
            "user_profile" => Some(Self::user_profile()),
            _ => None,
        }
    }

    /// Reference projection over a whole state object.
    ///
    /// Returns the JSON string the in-page routine would return, including
    /// the `""` sentinel.
    pub fn run(&self, state: Option<&Value>) -> String {
        let state = match state {
            Some(v) if !v.is_null() => v,
            _ => return String::new(),
        };

        let raw = lookup(state, self.root);
        let projected = match self.shape.project(raw) {
            Some(v) => Some(v),
            None if self.empty_when_absent
                && raw.map_or(true, Value::is_null)
                && self.parent_present(state) =>
            {
                Some(self.shape.default_value())
            }
            None => None,
        };
        match projected {
            Some(projected) => {
                serde_json::to_string(&wrap(self.output, projected)).unwrap_or_default()
            }
            None => String::new(),
        }
    }

    /// Path of the object holding the root, `None` when the root is top-level.
    pub fn root_parent(&self) -> Option<&'static str> {
        self.root.rsplit_once('.').map(|(parent, _)| parent)
    }

    fn parent_present(&self, state: &Value) -> bool {
        match self.root_parent() {
            Some(parent) => lookup(state, parent).is_some_and(Value::is_object),
            None => state.is_object(),
        }
    }
}

/// Nest `value` under each segment of `path`.
pub fn wrap(path: &str, value: Value) -> Value {
    path.rsplit('.').fold(value, |inner, seg| {
        let mut map = Map::new();
        map.insert(seg.to_string(), inner);
        Value::Object(map)
    })
}

fn text(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, Shape::Text)
}

fn count(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, Shape::Count)
}

fn number(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, Shape::Number)
}

fn flag(name: &'static str) -> FieldSpec {
    FieldSpec::new(name, Shape::Flag)
}

fn user_shape() -> Shape {
    Shape::record(vec![
        text("userId"),
        text("nickname").from(&["nickname", "nickName"]),
        text("avatar").from(&["avatar", "image"]),
    ])
}

fn interact_shape() -> Shape {
    Shape::record(vec![
        flag("liked"),
        count("likedCount"),
        count("sharedCount").from(&["sharedCount", "shareCount"]),
        count("commentCount"),
        count("collectedCount"),
        flag("collected"),
    ])
}

fn cover_shape() -> Shape {
    Shape::record(vec![
        number("width"),
        number("height"),
        text("url"),
        text("fileId"),
        text("urlPre"),
        text("urlDefault"),
        FieldSpec::new(
            "infoList",
            Shape::list(Shape::record(vec![text("imageScene"), text("url")])),
        ),
    ])
}

fn feed_shape() -> Shape {
    Shape::record(vec![
        text("xsecToken"),
        text("id"),
        text("modelType"),
        number("index"),
        FieldSpec::new(
            "noteCard",
            Shape::record(vec![
                text("type"),
                text("displayTitle").from(&["displayTitle", "title"]),
                FieldSpec::new("user", user_shape()),
                FieldSpec::new("interactInfo", interact_shape()),
                FieldSpec::new("cover", cover_shape()),
                FieldSpec::new(
                    "video",
                    Shape::nullable_record(vec![FieldSpec::new(
                        "capa",
                        Shape::record(vec![number("duration")]),
                    )]),
                ),
            ]),
        ),
    ])
}

fn feeds_ref_shape() -> Shape {
    Shape::record(vec![FieldSpec::new("_value", Shape::list(feed_shape()))
        .from(&["_value", "value", "_rawValue"])
        .required()])
}

fn note_shape() -> Shape {
    Shape::record(vec![
        text("id").from(&["id", "noteId"]),
        text("title"),
        text("desc"),
        text("type"),
        number("time"),
        number("lastUpdateTime"),
        text("ipLocation"),
        FieldSpec::new("user", user_shape()),
        FieldSpec::new(
            "imageList",
            Shape::list(Shape::record(vec![
                number("width"),
                number("height"),
                text("urlDefault").from(&["urlDefault", "url"]),
                text("urlPre"),
                flag("livePhoto"),
            ])),
        )
        .from(&["imageList", "images"]),
        FieldSpec::new(
            "video",
            Shape::nullable_record(vec![FieldSpec::new(
                "media",
                Shape::record(vec![FieldSpec::new(
                    "stream",
                    Shape::record(vec![FieldSpec::new(
                        "h264",
                        Shape::record(vec![text("url").from(&["masterUrl", "url"])]),
                    )
                    .from(&["h264.0", "h264"])]),
                )]),
            )]),
        ),
        FieldSpec::new("interactInfo", interact_shape()),
        FieldSpec::new(
            "tagList",
            Shape::list(Shape::record(vec![text("id"), text("name"), text("type")])),
        ),
    ])
}

fn comment_shape() -> Shape {
    Shape::record(vec![
        text("id"),
        text("content"),
        FieldSpec::new("user", user_shape()).from(&["userInfo", "user"]),
        number("createTime").from(&["createTime", "time"]),
        text("ipLocation"),
        flag("liked"),
        count("likeCount").from(&["likeCount", "likedCount"]),
        count("subCommentCount"),
    ])
}

fn detail_entry_shape() -> Shape {
    Shape::record(vec![
        FieldSpec::new("note", note_shape()).required(),
        FieldSpec::new(
            "comments",
            Shape::record(vec![
                FieldSpec::new("comments", Shape::list(comment_shape())).from(&["list", "comments"]),
                flag("hasMore"),
                text("cursor"),
            ]),
        ),
    ])
}

fn page_data_shape() -> Shape {
    Shape::record(vec![
        FieldSpec::new(
            "basicInfo",
            Shape::record(vec![
                text("nickname"),
                text("images").from(&["images", "imageb", "avatar"]),
                text("redId"),
                text("desc"),
                number("gender"),
                text("ipLocation"),
            ]),
        ),
        FieldSpec::new(
            "interactions",
            Shape::list(Shape::record(vec![text("type"), text("name"), count("count")])),
        ),
    ])
}
