//! Component id assignment.
//!
//! File-sourced ids are `category-subCategory-slug(baseName)`, lowercased.
//! Manifest-sourced plugin ids are `plugin-slug(name)`. Uniqueness is not
//! checked here; the assembler rejects collisions.

use componentry_shared::Category;

/// Sub-category for files directly under the category's pattern base.
pub const DEFAULT_SUB_CATEGORY: &str = "general";

/// File name whose parent directory names the component (skills layout).
const NAMED_BY_PARENT: &str = "SKILL.md";

/// Where a file sits relative to its category's pattern base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIdentity {
    pub sub_category: String,
    pub base_name: String,
}

/// Derive sub-category and base name from a walked path.
///
/// `relative` is the root-relative path, `base` the literal prefix of the
/// category's pattern.
pub fn file_identity(relative: &str, base: &str) -> FileIdentity {
    let rest = if base.is_empty() {
        relative
    } else {
        relative
            .strip_prefix(base)
            .and_then(|r| r.strip_prefix('/'))
            .unwrap_or(relative)
    };

    let mut segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let file_name = segments.pop().unwrap_or_default();

    let base_name = if file_name.eq_ignore_ascii_case(NAMED_BY_PARENT) && !segments.is_empty() {
        segments.pop().unwrap_or_default().to_string()
    } else {
        file_stem(file_name).to_string()
    };

    let sub_category = segments
        .first()
        .map(|s| (*s).to_string())
        .unwrap_or_else(|| DEFAULT_SUB_CATEGORY.to_string());

    FileIdentity {
        sub_category,
        base_name,
    }
}

/// Id for a file-sourced component.
pub fn component_id(category: Category, sub_category: &str, base_name: &str) -> String {
    format!("{category}-{sub_category}-{}", slug(base_name)).to_lowercase()
}

/// Id for a plugin declared in the manifest.
pub fn plugin_id(name: &str) -> String {
    format!("plugin-{}", slug(name)).to_lowercase()
}

/// Replace every run of non-alphanumeric characters with one hyphen.
/// Leading and trailing hyphens are dropped.
pub fn slug(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_hyphen = false;

    for c in s.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Human-readable name from a base name: `foo-bar_baz` → `Foo Bar Baz`.
pub fn display_name(base_name: &str) -> String {
    base_name
        .split(|c: char| c == '-' || c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_id_from_path() {
        let identity = file_identity("commands/automation/foo-bar.md", "commands");
        assert_eq!(identity.sub_category, "automation");
        assert_eq!(identity.base_name, "foo-bar");
        assert_eq!(
            component_id(Category::Commands, &identity.sub_category, &identity.base_name),
            "commands-automation-foo-bar"
        );
    }

    #[test]
    fn file_directly_under_base_is_general() {
        let identity = file_identity("components/agents/reviewer.md", "components/agents");
        assert_eq!(identity.sub_category, DEFAULT_SUB_CATEGORY);
        assert_eq!(identity.base_name, "reviewer");
    }

    #[test]
    fn deeper_nesting_uses_first_directory() {
        let identity = file_identity("agents/web/react/hooks-expert.md", "agents");
        assert_eq!(identity.sub_category, "web");
        assert_eq!(identity.base_name, "hooks-expert");
    }

    #[test]
    fn skill_named_by_parent_directory() {
        let identity =
            file_identity("components/skills/development/code-review/SKILL.md", "components/skills");
        assert_eq!(identity.sub_category, "development");
        assert_eq!(identity.base_name, "code-review");

        let identity = file_identity("skills/pdf/SKILL.md", "skills");
        assert_eq!(identity.sub_category, DEFAULT_SUB_CATEGORY);
        assert_eq!(identity.base_name, "pdf");
    }

    #[test]
    fn empty_base_uses_whole_path() {
        let identity = file_identity("security/audit.md", "");
        assert_eq!(identity.sub_category, "security");
        assert_eq!(identity.base_name, "audit");
    }

    #[test]
    fn slug_collapses_runs() {
        assert_eq!(slug("foo  bar__baz"), "foo-bar-baz");
        assert_eq!(slug("--Hello, World!--"), "Hello-World");
        assert_eq!(slug("v1.2.3"), "v1-2-3");
        assert_eq!(slug("***"), "");
    }

    #[test]
    fn ids_are_lowercase() {
        assert_eq!(
            component_id(Category::Agents, "Data-AI", "ML Engineer"),
            "agents-data-ai-ml-engineer"
        );
        assert_eq!(plugin_id("Git Workflow!"), "plugin-git-workflow");
    }

    #[test]
    fn display_name_title_cases() {
        assert_eq!(display_name("foo-bar"), "Foo Bar");
        assert_eq!(display_name("api_reference  guide"), "Api Reference Guide");
        assert_eq!(display_name("x"), "X");
    }

    #[test]
    fn file_stem_keeps_dotfiles() {
        assert_eq!(file_stem(".env"), ".env");
        assert_eq!(file_stem("a.b.md"), "a.b");
    }
}
