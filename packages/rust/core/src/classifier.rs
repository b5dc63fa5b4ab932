//! Company, icon, and tag resolution.
//!
//! All three resolvers are pure and driven by ordered tables. The tables are
//! slices, not maps: declaration order is the tie-break wherever keyword
//! sets overlap, and it must stay stable across runs.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use componentry_shared::{Category, Document, ParsedDocument};

/// Company used when no keyword matches.
pub const DEFAULT_COMPANY: &str = "Community";

/// Icon used when no tier matches.
pub const DEFAULT_ICON: &str = "📄";

/// Maximum number of tags on a record, sub-category included.
pub const MAX_TAGS: usize = 5;

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Company attribution, scanned top to bottom. Generic keywords go last so
/// they cannot shadow a more specific company.
const COMPANY_KEYWORDS: &[(&str, &[&str])] = &[
    ("Anthropic", &["anthropic", "claude api", "claude sdk", "claude-sdk"]),
    ("OpenAI", &["openai", "chatgpt", "gpt-4", "gpt-5", "dall-e"]),
    ("Google", &["google", "gemini", "firebase", "bigquery", "vertex ai"]),
    ("Microsoft", &["microsoft", "azure", "playwright", "vscode"]),
    ("AWS", &["aws", "amazon", "dynamodb", "cloudformation"]),
    ("Vercel", &["vercel", "next.js", "nextjs"]),
    ("Meta", &["react native", "pytorch", "facebook", "llama"]),
    ("Stripe", &["stripe"]),
    ("Supabase", &["supabase"]),
    ("MongoDB", &["mongodb"]),
    ("Docker", &["docker"]),
    ("Cloudflare", &["cloudflare"]),
    ("Sentry", &["sentry"]),
    ("GitHub", &["github"]),
    ("Postman", &["postman", "api"]),
];

/// Tier 1: keyword in the lowercased component name.
const NAME_ICONS: &[(&str, &str)] = &[
    ("security", "🔒"),
    ("audit", "🔒"),
    ("test", "🧪"),
    ("debug", "🐛"),
    ("database", "🗄️"),
    ("sql", "🗄️"),
    ("docker", "🐳"),
    ("kubernetes", "☸️"),
    ("react", "⚛️"),
    ("python", "🐍"),
    ("rust", "🦀"),
    ("git", "🌿"),
    ("deploy", "🚀"),
    ("performance", "⚡"),
    ("doc", "📝"),
    ("api", "🔌"),
    ("design", "🎨"),
    ("data", "📊"),
    ("review", "🔍"),
    ("ai", "🤖"),
];

/// Tier 2: exact (lowercased) sub-category.
const SUB_CATEGORY_ICONS: &[(&str, &str)] = &[
    ("security", "🔒"),
    ("testing", "🧪"),
    ("database", "🗄️"),
    ("devops", "🚀"),
    ("deployment", "🚀"),
    ("documentation", "📝"),
    ("development", "💻"),
    ("development-tools", "🛠️"),
    ("automation", "⚙️"),
    ("ai-specialists", "🤖"),
    ("data-ai", "📊"),
    ("git", "🌿"),
    ("git-workflow", "🌿"),
    ("performance", "⚡"),
    ("monitoring", "📈"),
    ("web-tools", "🌐"),
    ("statusline", "📟"),
];

/// Tier 3: category.
const CATEGORY_ICONS: &[(Category, &str)] = &[
    (Category::Agents, "🤖"),
    (Category::Subagents, "🧩"),
    (Category::Commands, "⚡"),
    (Category::Settings, "⚙️"),
    (Category::Hooks, "🪝"),
    (Category::Mcps, "🔌"),
    (Category::Skills, "🎯"),
    (Category::Plugins, "📦"),
];

/// Technology vocabulary: `(tag, case-insensitive pattern)`, in tag order.
const TAG_VOCABULARY: &[(&str, &str)] = &[
    ("javascript", r"\bjavascript\b|\bnode\.?js\b"),
    ("typescript", r"\btypescript\b"),
    ("python", r"\bpython\b"),
    ("rust", r"\brust\b"),
    ("go", r"\bgolang\b"),
    ("java", r"\bjava\b"),
    ("react", r"\breact\b"),
    ("vue", r"\bvue(?:\.js)?\b"),
    ("angular", r"\bangular\b"),
    ("nextjs", r"\bnext\.?js\b"),
    ("docker", r"\bdocker\b"),
    ("kubernetes", r"\bkubernetes\b|\bk8s\b"),
    ("aws", r"\baws\b"),
    ("database", r"\bdatabases?\b|\bsql\b|\bpostgres(?:ql)?\b|\bmysql\b|\bmongodb\b"),
    ("api", r"\bapis?\b|\bgraphql\b"),
    ("testing", r"\btest(?:s|ing)?\b|\bjest\b|\bpytest\b"),
    ("security", r"\bsecurity\b|\bvulnerabilit(?:y|ies)\b"),
    ("git", r"\bgit\b|\bgithub\b"),
    ("ci/cd", r"\bci/cd\b|\bcontinuous integration\b"),
    ("performance", r"\bperformance\b|\boptimi[sz]ation\b"),
    ("documentation", r"\bdocumentation\b"),
    ("ai", r"\bai\b|\bllms?\b|\bmachine learning\b"),
];

static TAG_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    TAG_VOCABULARY
        .iter()
        .map(|(tag, pattern)| {
            let re = Regex::new(&format!("(?i){pattern}")).expect("valid tag regex");
            (*tag, re)
        })
        .collect()
});

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

/// Company, icon, and tags for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub company: String,
    pub icon: String,
    pub tags: Vec<String>,
}

/// Run all three resolvers.
pub fn classify(
    parsed: &ParsedDocument,
    path: &str,
    name: &str,
    category: Category,
    sub_category: &str,
) -> Classification {
    Classification {
        company: resolve_company(parsed, path).to_string(),
        icon: resolve_icon(name, category, sub_category).to_string(),
        tags: extract_tags(parsed, sub_category),
    }
}

/// The text the resolvers scan, per document variant.
pub fn classification_text(parsed: &ParsedDocument) -> String {
    match &parsed.document {
        Document::Markdown { frontmatter, body } => {
            let mut text = frontmatter
                .iter()
                .flat_map(|map| map.values())
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n");
            text.push('\n');
            text.push_str(body);
            text
        }
        Document::Json { value } => {
            let mut parts = Vec::new();
            collect_json_text(value, &mut parts);
            parts.join("\n")
        }
    }
}

/// Keys and string leaves of a JSON value, in document order.
fn collect_json_text<'a>(value: &'a Value, out: &mut Vec<&'a str>) {
    match value {
        Value::String(s) => out.push(s),
        Value::Array(items) => items.iter().for_each(|v| collect_json_text(v, out)),
        Value::Object(map) => {
            for (key, v) in map {
                out.push(key);
                collect_json_text(v, out);
            }
        }
        _ => {}
    }
}

/// First company in declaration order with a keyword in `content + path`.
pub fn resolve_company(parsed: &ParsedDocument, path: &str) -> &'static str {
    let haystack = format!("{}\n{}", classification_text(parsed), path);
    resolve_company_in(&haystack)
}

/// Company resolution over raw text.
pub fn resolve_company_in(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    COMPANY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(company, _)| *company)
        .unwrap_or(DEFAULT_COMPANY)
}

/// Four-tier icon lookup: name keyword, sub-category, category, default.
pub fn resolve_icon(name: &str, category: Category, sub_category: &str) -> &'static str {
    let name = name.to_lowercase();
    if let Some((_, icon)) = NAME_ICONS.iter().find(|(kw, _)| name.contains(kw)) {
        return icon;
    }

    let sub = sub_category.to_lowercase();
    if let Some((_, icon)) = SUB_CATEGORY_ICONS.iter().find(|(s, _)| *s == sub) {
        return icon;
    }

    CATEGORY_ICONS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, icon)| *icon)
        .unwrap_or(DEFAULT_ICON)
}

/// Sub-category with hyphens replaced by spaces.
pub fn normalize_sub_category(sub_category: &str) -> String {
    sub_category.replace('-', " ")
}

/// Sub-category first, then vocabulary matches in vocabulary order, at most
/// [`MAX_TAGS`] in total.
pub fn extract_tags(parsed: &ParsedDocument, sub_category: &str) -> Vec<String> {
    extract_tags_from(&classification_text(parsed), sub_category)
}

/// Tag extraction over raw text.
pub fn extract_tags_from(text: &str, sub_category: &str) -> Vec<String> {
    let mut tags = vec![normalize_sub_category(sub_category)];

    for (tag, re) in TAG_PATTERNS.iter() {
        if tags.len() >= MAX_TAGS {
            break;
        }
        if tags.iter().any(|t| t == tag) {
            continue;
        }
        if re.is_match(text) {
            tags.push((*tag).to_string());
        }
    }

    tags
}
