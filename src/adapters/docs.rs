//! Usage documentation from stylesheet comments
//!
//! Each `/* topdoc ... */` comment holds a YAML document describing one
//! component (`name`, `description`, `markup`, `modifiers`). A block with a
//! `title` and no `name` titles the page. Every non-minified `.css` file in
//! `source` becomes `destination/<stem>.html`, rendered through `template`.

use crate::adapters::{read_text, write_text, Adapter, AdapterKind};
use crate::config::ConfigStore;
use crate::error::{AdapterError, AdapterResult};
use crate::runner::{Context, FilePair, TargetConfig};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};

static TOPDOC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*\s*topdoc(.*?)\*/").unwrap());

pub struct Docs;

/// One documented component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Component {
    pub name: String,
    pub description: Option<String>,
    pub markup: Option<String>,
    /// Modifier name and description, in declaration order
    pub modifiers: Vec<(String, String)>,
}

/// Everything documented in one stylesheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub title: Option<String>,
    pub components: Vec<Component>,
}

impl Adapter for Docs {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Docs
    }

    fn apply(&self, ctx: &Context, target: &TargetConfig, _files: &[FilePair]) -> AdapterResult<()> {
        let source = ctx.base_dir.join(target.required_str("source")?);
        let destination = ctx.base_dir.join(target.required_str("destination")?);
        let template_path = ctx.base_dir.join(target.required_str("template")?);
        let template = read_text(&template_path)?;
        let template_data = match target.option("templateData") {
            None => Mapping::new(),
            Some(Value::Mapping(map)) => map.clone(),
            Some(_) => {
                return Err(AdapterError::InvalidOption {
                    name: "templateData".to_string(),
                    error: "expected a mapping".to_string(),
                })
            }
        };

        let stylesheets = stylesheets_in(&source)?;
        if stylesheets.is_empty() {
            ctx.print_warn(&format!(
                "No stylesheets found in \"{}\".",
                ctx.display_path(&source)
            ));
        }

        for css_path in stylesheets {
            let document = parse_document(&read_text(&css_path)?).map_err(|message| {
                AdapterError::Parse {
                    path: css_path.clone(),
                    message,
                }
            })?;

            let file_name = css_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let stem = file_name.strip_suffix(".css").unwrap_or(&file_name);

            let mut data = template_data.clone();
            data.insert(
                Value::from("title"),
                Value::from(document.title.clone().unwrap_or_else(|| stem.to_string())),
            );
            data.insert(Value::from("filename"), Value::from(file_name.clone()));
            data.insert(
                Value::from("components"),
                Value::from(render_components(&document.components)),
            );

            let html = ConfigStore::new(Value::Mapping(data))
                .process_str(&template)
                .map_err(|e| AdapterError::Parse {
                    path: template_path.clone(),
                    message: e.to_string(),
                })?;

            write_text(ctx, &destination.join(format!("{}.html", stem)), &html)?;
        }
        Ok(())
    }
}

/// Non-minified stylesheets directly inside `dir`, sorted
fn stylesheets_in(dir: &Path) -> AdapterResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| AdapterError::read(dir, e))? {
        let path = entry.map_err(|e| AdapterError::read(dir, e))?.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if path.is_file() && name.ends_with(".css") && !name.ends_with(".min.css") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Collect the topdoc blocks of a stylesheet
pub fn parse_document(css: &str) -> Result<Document, String> {
    let mut document = Document::default();

    for capture in TOPDOC_RE.captures_iter(css) {
        let body = dedent(&capture[1]);
        let value: Value = serde_yaml::from_str(&body).map_err(|e| e.to_string())?;
        let Value::Mapping(map) = value else {
            continue;
        };

        let text = |key: &str| map.get(key).and_then(scalar_text);
        match text("name") {
            Some(name) => document.components.push(Component {
                name,
                description: text("description"),
                markup: text("markup"),
                modifiers: match map.get("modifiers") {
                    Some(Value::Mapping(mods)) => mods
                        .iter()
                        .filter_map(|(k, v)| Some((scalar_text(k)?, scalar_text(v)?)))
                        .collect(),
                    _ => Vec::new(),
                },
            }),
            None => {
                if document.title.is_none() {
                    document.title = text("title");
                }
            }
        }
    }

    Ok(document)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim_end().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strip the indentation shared by every non-blank line
fn dedent(text: &str) -> String {
    let indent = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| if l.len() >= indent { &l[indent..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
}

/// HTML for every component, in order
pub fn render_components(components: &[Component]) -> String {
    let mut html = String::new();
    for component in components {
        let _ = writeln!(
            html,
            "<section class=\"component\" id=\"{}\">",
            slug(&component.name)
        );
        let _ = writeln!(html, "  <h2>{}</h2>", escape_html(&component.name));
        if let Some(description) = &component.description {
            let _ = writeln!(html, "  <p>{}</p>", escape_html(description));
        }
        if !component.modifiers.is_empty() {
            html.push_str("  <ul class=\"modifiers\">\n");
            for (name, description) in &component.modifiers {
                let _ = writeln!(
                    html,
                    "    <li><code>{}</code> {}</li>",
                    escape_html(name),
                    escape_html(description)
                );
            }
            html.push_str("  </ul>\n");
        }
        if let Some(markup) = &component.markup {
            let _ = writeln!(html, "  <div class=\"component-example\">{}</div>", markup);
            let _ = writeln!(html, "  <pre><code>{}</code></pre>", escape_html(markup));
        }
        html.push_str("</section>\n");
    }
    html
}

fn slug(name: &str) -> String {
    let mut slug = String::new();
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
