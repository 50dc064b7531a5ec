use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default lane colors, cycled by creation order when no color is given.
pub const PALETTE: [&str; 6] = [
    "#0f172a", "#0ea5e9", "#1e293b", "#14b8a6", "#f59e0b", "#6366f1",
];

/// Display identity of the synthetic bucket for tasks without a valid lane.
/// Never persisted.
pub const UNCATEGORIZED_ID: &str = "uncategorized";
pub const UNCATEGORIZED_NAME: &str = "No category";
pub const UNCATEGORIZED_COLOR: &str = PALETTE[2];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// Mutable fields of a category; the id survives edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryDraft {
    pub name: String,
    pub color: String,
}

impl Category {
    pub fn new(name: &str, color: String, id: String) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            color,
        }
    }

    pub fn apply(&mut self, draft: CategoryDraft) {
        self.name = draft.name.trim().to_string();
        self.color = draft.color;
    }

    pub fn draft(&self) -> CategoryDraft {
        CategoryDraft {
            name: self.name.clone(),
            color: self.color.clone(),
        }
    }
}

/// Lowercases the name and collapses every non-alphanumeric run to a single
/// `-`. Edge separators are kept (`Work!` becomes `work-`).
pub fn slugify(name: &str) -> anyhow::Result<String> {
    let re = Regex::new("[^a-z0-9]+")
        .map_err(|e| anyhow!("internal regex compile failure: {e}"))?;
    let lowered = name.trim().to_lowercase();
    Ok(re.replace_all(&lowered, "-").into_owned())
}

/// Derives a unique category id from a display name. Collisions take the
/// smallest free `-<n>` suffix with n starting at 2.
pub fn derive_id(name: &str, existing: &[Category]) -> anyhow::Result<String> {
    let mut base = slugify(name)?;
    if base.is_empty() {
        base = "category".to_string();
    }
    let taken = |candidate: &str| existing.iter().any(|c| c.id == candidate);
    if !taken(&base) {
        return Ok(base);
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return Ok(candidate);
        }
        n += 1;
    }
}

/// Accepts `#rgb` and `#rrggbb`.
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let hex = value.strip_prefix('#')?;
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut it = hex.chars();
            let r = it.next()?.to_digit(16)? as u8;
            let g = it.next()?.to_digit(16)? as u8;
            let b = it.next()?.to_digit(16)? as u8;
            Some((r * 17, g * 17, b * 17))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}
