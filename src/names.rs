use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

fn whitespace() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// Uppercase, drop dots, spell out `&`, and collapse whitespace.
pub fn normalize_company(raw: &str) -> String {
    let upper = raw.trim().to_uppercase().replace('.', "").replace('&', " AND ");
    whitespace().replace_all(upper.trim(), " ").into_owned()
}

/// Many-to-one map from normalized name variants to canonical names.
#[derive(Debug, Clone, Default)]
pub struct Canonicalizer {
    map: HashMap<String, String>,
}

impl Canonicalizer {
    pub fn new(equivalences: &BTreeMap<String, String>) -> Self {
        let mut map = HashMap::new();
        // Canonical names resolve to themselves so canonicalizing is idempotent.
        for canonical in equivalences.values() {
            map.insert(normalize_company(canonical), canonical.clone());
        }
        for (variant, canonical) in equivalences {
            map.insert(normalize_company(variant), canonical.clone());
        }
        Self { map }
    }

    /// Canonical identity of a raw company name. Unknown names come back in
    /// normalized form.
    pub fn canonical(&self, raw: &str) -> String {
        let key = normalize_company(raw);
        match self.map.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }
}
