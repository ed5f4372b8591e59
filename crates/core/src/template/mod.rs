//! Template composition for generated project artifacts.
//!
//! Artifacts (launch scripts, plugin configuration, bootstrap scripts) are
//! assembled from named fragments. A fragment is plain text plus three
//! line-oriented directives:
//!
//! - `@include <name>` expands another fragment in place (depth-first).
//! - `@if <expr>` / `@else` / `@end` delimit conditional blocks evaluated
//!   against the project configuration.
//! - `@plugin <Name>` registers a plugin directive. The first registration
//!   of a name emits an `add_plugin("Name")` line at that position; later
//!   registrations of the same name are no-ops, so fragments can safely
//!   request shared dependencies.
//!
//! Text lines substitute `{{key}}` references from the configuration. A
//! reference to an absent key is a hard error, never a silent empty
//! string.
//!
//! Rendering the same `(root, config)` pair twice yields byte-identical
//! output: fragment storage and configuration are ordered maps, and
//! directive order is first-registration order.

pub mod builtin;

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::config::{ConfigValue, ProjectConfig};

/// Error type for template composition.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An `@include` referenced a fragment that does not exist.
    #[error("no such template fragment `{name}`")]
    MissingInclude { name: String },

    /// A substitution or conditional referenced a key absent from the
    /// configuration.
    #[error("template fragment `{fragment}` references undefined variable `{name}`")]
    UndefinedVariable { name: String, fragment: String },

    /// A fragment included itself, directly or through other fragments.
    #[error("cyclic include of template fragment `{name}`")]
    CyclicInclude { name: String },

    /// Malformed directive or unbalanced conditional block.
    #[error("template fragment `{fragment}` line {line}: {message}")]
    Syntax { fragment: String, line: usize, message: String },
}

/// Convenience result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Named collection of template fragments.
///
/// The built-in set ships embedded in the crate; tests and embedding code
/// may insert additional fragments.
#[derive(Debug, Clone, Default)]
pub struct FragmentStore {
    fragments: BTreeMap<String, String>,
}

impl FragmentStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The store pre-populated with the built-in fragment set.
    pub fn builtin() -> Self {
        let mut store = Self::new();
        for (name, source) in builtin::FRAGMENTS {
            store.insert(*name, *source);
        }
        store
    }

    /// Register (or replace) a fragment.
    pub fn insert(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.fragments.insert(name.into(), source.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    /// Fragment names in stable (sorted) order.
    pub fn names(&self) -> Vec<&str> {
        self.fragments.keys().map(String::as_str).collect()
    }

    /// Render the named root fragment against `config`.
    ///
    /// Expands includes depth-first, evaluates conditionals, substitutes
    /// variables, and deduplicates plugin directives by name. Trailing
    /// whitespace is stripped per line and the output ends with a single
    /// newline.
    pub fn render(&self, root: &str, config: &ProjectConfig) -> TemplateResult<String> {
        let mut composer = Composer {
            store: self,
            config,
            stack: Vec::new(),
            registered: BTreeSet::new(),
            out: Vec::new(),
        };
        composer.expand(root)?;

        let mut rendered = String::new();
        for line in &composer.out {
            rendered.push_str(line.trim_end());
            rendered.push('\n');
        }
        Ok(rendered)
    }
}

/// One `@if` block currently being processed.
struct Frame {
    /// Whether the enclosing scope was active when the block opened.
    parent_active: bool,
    /// Whether any branch of this block has been taken.
    taken: bool,
    /// Whether we are past the `@else`.
    in_else: bool,
    /// Whether lines in the current branch are emitted.
    active: bool,
}

/// Single-use expansion state for one `render` call.
struct Composer<'a> {
    store: &'a FragmentStore,
    config: &'a ProjectConfig,
    /// Active include chain, used to reject cyclic includes.
    stack: Vec<String>,
    /// Plugin directive names already emitted, in first-seen order.
    registered: BTreeSet<String>,
    out: Vec<String>,
}

impl<'a> Composer<'a> {
    fn expand(&mut self, name: &str) -> TemplateResult<()> {
        if self.stack.iter().any(|entry| entry == name) {
            return Err(TemplateError::CyclicInclude { name: name.to_string() });
        }

        let source = self
            .store
            .fragments
            .get(name)
            .ok_or_else(|| TemplateError::MissingInclude { name: name.to_string() })?
            .clone();

        self.stack.push(name.to_string());
        let result = self.expand_source(name, &source);
        self.stack.pop();
        result
    }

    fn expand_source(&mut self, fragment: &str, source: &str) -> TemplateResult<()> {
        let mut frames: Vec<Frame> = Vec::new();

        for (idx, raw_line) in source.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = raw_line.trim_start();
            let active = frames.last().map_or(true, |frame| frame.active);

            if let Some(directive) = trimmed.strip_prefix('@') {
                let directive = directive.trim_start();
                let mut words = directive.split_whitespace();
                let keyword = words.next().unwrap_or("");
                let rest = directive[keyword.len()..].trim();

                match keyword {
                    "if" => {
                        if rest.is_empty() {
                            return Err(syntax(fragment, line_no, "`@if` needs a condition"));
                        }
                        // Conditions inside inactive branches are not
                        // evaluated, matching strict-undefined template
                        // semantics: only rendered paths are validated.
                        let cond = if active { self.eval(fragment, rest)? } else { false };
                        frames.push(Frame {
                            parent_active: active,
                            taken: cond,
                            in_else: false,
                            active: active && cond,
                        });
                    }
                    "else" => {
                        let frame = frames
                            .last_mut()
                            .ok_or_else(|| syntax(fragment, line_no, "`@else` without `@if`"))?;
                        if frame.in_else {
                            return Err(syntax(fragment, line_no, "duplicate `@else`"));
                        }
                        frame.in_else = true;
                        frame.active = frame.parent_active && !frame.taken;
                    }
                    "end" => {
                        if frames.pop().is_none() {
                            return Err(syntax(fragment, line_no, "`@end` without `@if`"));
                        }
                    }
                    "include" => {
                        if rest.is_empty() {
                            return Err(syntax(fragment, line_no, "`@include` needs a fragment name"));
                        }
                        if active {
                            self.expand(rest)?;
                        }
                    }
                    "plugin" => {
                        if rest.is_empty() {
                            return Err(syntax(fragment, line_no, "`@plugin` needs a plugin name"));
                        }
                        if active && self.registered.insert(rest.to_string()) {
                            let indent = &raw_line[..raw_line.len() - trimmed.len()];
                            self.out.push(format!("{indent}add_plugin(\"{rest}\")"));
                        }
                    }
                    other => {
                        return Err(syntax(
                            fragment,
                            line_no,
                            &format!("unknown directive `@{other}`"),
                        ));
                    }
                }
                continue;
            }

            if active {
                let substituted = self.substitute(fragment, line_no, raw_line)?;
                self.out.push(substituted);
            }
        }

        if !frames.is_empty() {
            return Err(syntax(fragment, source.lines().count(), "unterminated `@if` block"));
        }
        Ok(())
    }

    /// Evaluate a conditional expression: `key`, `!key`, `key == literal`,
    /// or `key != literal`.
    fn eval(&self, fragment: &str, expr: &str) -> TemplateResult<bool> {
        if let Some(negated) = expr.strip_prefix('!') {
            return Ok(!self.eval(fragment, negated.trim())?);
        }

        if let Some((key, literal)) = split_comparison(expr, "==") {
            return Ok(self.lookup(fragment, key)?.to_string() == literal);
        }
        if let Some((key, literal)) = split_comparison(expr, "!=") {
            return Ok(self.lookup(fragment, key)?.to_string() != literal);
        }

        Ok(self.lookup(fragment, expr)?.is_truthy())
    }

    fn lookup(&self, fragment: &str, key: &str) -> TemplateResult<&ConfigValue> {
        self.config.get(key).ok_or_else(|| TemplateError::UndefinedVariable {
            name: key.to_string(),
            fragment: fragment.to_string(),
        })
    }

    /// Replace every `{{key}}` reference in `line`.
    fn substitute(&self, fragment: &str, line_no: usize, line: &str) -> TemplateResult<String> {
        let mut rendered = String::with_capacity(line.len());
        let mut rest = line;

        while let Some(open) = rest.find("{{") {
            rendered.push_str(&rest[..open]);
            let after = &rest[open + 2..];
            let close = after
                .find("}}")
                .ok_or_else(|| syntax(fragment, line_no, "unterminated `{{` substitution"))?;
            let key = after[..close].trim();
            if key.is_empty() {
                return Err(syntax(fragment, line_no, "empty substitution"));
            }
            rendered.push_str(&self.lookup(fragment, key)?.to_string());
            rest = &after[close + 2..];
        }
        rendered.push_str(rest);
        Ok(rendered)
    }
}

fn syntax(fragment: &str, line: usize, message: &str) -> TemplateError {
    TemplateError::Syntax { fragment: fragment.to_string(), line, message: message.to_string() }
}

/// Split `key <op> literal`, stripping optional quotes from the literal.
fn split_comparison<'e>(expr: &'e str, op: &str) -> Option<(&'e str, String)> {
    let (key, literal) = expr.split_once(op)?;
    let literal = literal.trim();
    let literal = literal
        .strip_prefix('"')
        .and_then(|l| l.strip_suffix('"'))
        .unwrap_or(literal);
    Some((key.trim(), literal.to_string()))
}
