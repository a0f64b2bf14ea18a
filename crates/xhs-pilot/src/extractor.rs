//! In-page state extraction.
//!
//! Turns a [`Recipe`] into a self-contained script that walks the hydrated
//! state object with the recipe's shape and returns a JSON string. The result
//! is either a complete projection or the empty string; nothing partial leaks
//! out.

use crate::browser::PageHandle;
use crate::platform::STATE_GLOBAL;
use crate::schema::{Recipe, MAX_DEPTH, MAX_LIST_ITEMS};

const MARKER: &str = "// xhs-pilot:recipe=";

const WALKER: &str = r#"
    const isObj = (v) => typeof v === "object" && v !== null && !Array.isArray(v);
    const lookup = (v, path) => {
      let cur = v;
      for (const seg of path.split(".")) {
        if (Array.isArray(cur) && /^\d+$/.test(seg)) cur = cur[Number(seg)];
        else if (isObj(cur)) cur = cur[seg];
        else return undefined;
      }
      return cur;
    };
    const fallback = (s) => {
      switch (s.kind) {
        case "text": return "";
        case "count": return "0";
        case "number": return 0;
        case "flag": return false;
        case "record": return s.nullable ? null : {};
        case "list": return [];
        default: return {};
      }
    };
    const project = (s, raw, depth) => {
      if (depth > MAX_DEPTH || raw === undefined || raw === null) return undefined;
      switch (s.kind) {
        case "text":
          return typeof raw === "string" && raw !== "" ? raw : undefined;
        case "count":
          if (typeof raw === "string" && raw !== "") return raw;
          if (typeof raw === "number" && isFinite(raw)) return String(raw);
          return undefined;
        case "number":
          return typeof raw === "number" && isFinite(raw) ? raw : undefined;
        case "flag":
          return typeof raw === "boolean" ? raw : undefined;
        case "record": {
          if (!isObj(raw)) return undefined;
          const out = Object.create(null);
          for (const f of s.fields) {
            let v;
            for (const src of f.sources) {
              v = project(f.shape, lookup(raw, src), depth + 1);
              if (v !== undefined) break;
            }
            if (v === undefined) {
              if (f.required) return undefined;
              v = fallback(f.shape);
            }
            out[f.name] = v;
          }
          return out;
        }
        case "list": {
          if (!Array.isArray(raw)) return undefined;
          const out = [];
          for (const item of raw) {
            if (out.length >= MAX_ITEMS) break;
            const v = project(s.item, item, depth + 1);
            if (v !== undefined) out.push(v);
          }
          return out;
        }
        case "keyed": {
          if (!isObj(raw)) return undefined;
          const out = Object.create(null);
          for (const key of Object.keys(raw)) {
            const v = project(s.value, raw[key], depth + 1);
            if (v !== undefined) out[key] = v;
          }
          return out;
        }
      }
      return undefined;
    };
"#;

/// Generate the in-page script for `recipe`.
pub fn script_for(recipe: &Recipe) -> String {
    let shape = serde_json::to_string(&recipe.shape).unwrap_or_else(|_| "null".to_string());
    let root = js_string(recipe.root);
    let output = js_string(recipe.output);
    let parent = match recipe.root_parent() {
        Some(path) => format!("lookup(state, {})", js_string(path)),
        None => "state".to_string(),
    };

    format!(
        r#"{MARKER}{name}
(() => {{
  try {{
    const state = window.{STATE_GLOBAL};
    if (!state) return "";
    const MAX_DEPTH = {MAX_DEPTH};
    const MAX_ITEMS = {MAX_LIST_ITEMS};
{WALKER}
    const shape = {shape};
    const raw = lookup(state, {root});
    let projected = project(shape, raw, 0);
    if (projected === undefined && {empty_when_absent} && (raw === undefined || raw === null) && isObj({parent})) {{
      projected = fallback(shape);
    }}
    if (projected === undefined) return "";
    let wrapped = projected;
    for (const seg of {output}.split(".").reverse()) wrapped = {{ [seg]: wrapped }};
    return JSON.stringify(wrapped);
  }} catch (e) {{
    return "";
  }}
}})()"#,
        name = recipe.name,
        empty_when_absent = recipe.empty_when_absent,
    )
}

/// The recipe a generated script was built from.
pub fn recipe_of(script: &str) -> Option<Recipe> {
    let first = script.lines().next()?;
    let name = first.strip_prefix(MARKER)?;
    Recipe::by_name(name.trim())
}

/// Run `recipe` in the page. Returns `""` when the state is unavailable or
/// anything goes wrong inside the page.
pub async fn extract(page: &dyn PageHandle, recipe: &Recipe) -> String {
    match page.evaluate(&script_for(recipe)).await {
        Ok(serde_json::Value::String(json)) => json,
        Ok(other) => {
            tracing::debug!("{} extraction returned non-string {other}", recipe.name);
            String::new()
        }
        Err(e) => {
            tracing::debug!("{} extraction failed: {e}", recipe.name);
            String::new()
        }
    }
}

fn js_string(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}
