//! Tree-sitter based Python extractor (§4.1).
//!
//! Parses a single source file and walks the resulting tree once, emitting
//! `SymbolFact`s top-to-bottom and a `ControlFlowFact` per function/method
//! body. No network calls, no cache reads, no LLM involvement — every field
//! is derived purely from the parse.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use tree_sitter::{Node, Parser, Tree};

use crate::checksum::compute_checksum;
use crate::error::ExtractError;
use crate::model::{ControlFlowFact, ModuleFacts, SymbolFact, SymbolKind};

/// Parses `path` and extracts a [`ModuleFacts`] (§4.1 contract).
///
/// Determinism is mandatory: calling this twice on identical source bytes
/// produces a `ModuleFacts` with an identical `checksum`.
pub fn extract(path: &Path) -> Result<ModuleFacts, ExtractError> {
    let display_path = path.to_string_lossy().to_string();

    let source = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::FileNotFound(display_path.clone())
        } else {
            ExtractError::Io {
                path: display_path.clone(),
                source: e,
            }
        }
    })?;
    let code = String::from_utf8_lossy(&source).into_owned();

    debug!(path = %display_path, bytes = code.len(), "extracting facts");

    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .expect("tree-sitter-python grammar is statically linked and always loads");

    let tree: Tree = parser.parse(&code, None).ok_or_else(|| ExtractError::ParseError {
        path: display_path.clone(),
        line: 0,
        detail: "tree-sitter returned no tree".to_string(),
    })?;

    let root = tree.root_node();
    if root.has_error() {
        let bad = first_error_node(root).unwrap_or(root);
        return Err(ExtractError::ParseError {
            path: display_path,
            line: bad.start_position().row as u32 + 1,
            detail: format!("unexpected syntax near {:?}", bad.kind()),
        });
    }

    let mut walker = Walker {
        code: &code,
        path: &display_path,
        symbols: Vec::new(),
        control_flow: Vec::new(),
        imports: BTreeSet::new(),
    };
    walker.walk_module(root);

    let module_docstring = leading_docstring(root, &code);

    walker.record_usages(root);

    let mut facts = ModuleFacts {
        path: display_path,
        symbols: walker.symbols,
        control_flow: walker.control_flow,
        imports: walker.imports,
        module_docstring,
        checksum: String::new(),
    };
    facts.checksum = compute_checksum(&facts);
    Ok(facts)
}

fn first_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error_node(child) {
            return Some(found);
        }
    }
    None
}

fn node_text<'a>(node: Node, code: &'a str) -> &'a str {
    &code[node.start_byte()..node.end_byte()]
}

fn leading_docstring(root: Node, code: &str) -> Option<String> {
    let mut cursor = root.walk();
    let first = root.children(&mut cursor).next()?;
    extract_string_expression(first, code)
}

fn extract_string_expression(stmt: Node, code: &str) -> Option<String> {
    if stmt.kind() != "expression_statement" {
        return None;
    }
    let expr = stmt.child(0)?;
    if expr.kind() == "string" {
        Some(strip_quotes(node_text(expr, code)))
    } else {
        None
    }
}

fn strip_quotes(raw: &str) -> String {
    let trimmed = raw.trim();
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if trimmed.len() >= quote.len() * 2
            && trimmed.starts_with(quote)
            && trimmed.ends_with(quote)
        {
            return trimmed[quote.len()..trimmed.len() - quote.len()]
                .trim()
                .to_string();
        }
    }
    trimmed.to_string()
}

struct Walker<'a> {
    code: &'a str,
    path: &'a str,
    symbols: Vec<(String, SymbolFact)>,
    control_flow: Vec<(String, ControlFlowFact)>,
    imports: BTreeSet<String>,
}

impl<'a> Walker<'a> {
    fn walk_module(&mut self, root: Node) {
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            self.walk_statement(child, None);
        }
    }

    /// `owner` is the enclosing class name, if any (for method parenting).
    fn walk_statement(&mut self, node: Node, owner: Option<&str>) {
        match node.kind() {
            "function_definition" => self.on_function(node, owner),
            "class_definition" => self.on_class(node),
            "import_statement" | "import_from_statement" => self.on_import(node),
            "expression_statement" => self.on_expression_statement(node, owner),
            "decorated_definition" => {
                if let Some(inner) = node.child_by_field_name("definition") {
                    self.walk_statement(inner, owner);
                }
            }
            "if_statement" | "try_statement" | "with_statement" => {
                // Top-level control blocks: descend into their suite(s) so
                // module-level defs nested in `if TYPE_CHECKING:` etc. are
                // still found, without emitting a ControlFlowFact (only
                // function/method bodies get one, per §4.1).
                let mut cursor = node.walk();
                for child in node.children(&mut cursor) {
                    if child.kind() == "block" {
                        let mut inner_cursor = child.walk();
                        for stmt in child.children(&mut inner_cursor) {
                            self.walk_statement(stmt, owner);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn on_function(&mut self, node: Node, owner: Option<&str>) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.code).to_string();
        let defined_at = node.start_position().row as u32 + 1;

        let kind = if owner.is_some() {
            SymbolKind::Method
        } else {
            SymbolKind::Function
        };

        let mut fact = SymbolFact::new(kind, name.clone(), defined_at);
        if let Some(params) = node.child_by_field_name("parameters") {
            fact.signature = Some(node_text(params, self.code).trim().to_string());
        }
        fact.parent = owner.map(str::to_string);

        self.symbols.push((name.clone(), fact));

        if let Some(body) = node.child_by_field_name("body") {
            let cf = self.control_flow_for_body(body);
            self.control_flow.push((name, cf));
        }
    }

    fn on_class(&mut self, node: Node) {
        let Some(name_node) = node.child_by_field_name("name") else {
            return;
        };
        let name = node_text(name_node, self.code).to_string();
        let defined_at = node.start_position().row as u32 + 1;

        self.symbols
            .push((name.clone(), SymbolFact::new(SymbolKind::Class, name.clone(), defined_at)));

        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.children(&mut cursor) {
                self.walk_statement(child, Some(&name));
            }
        }
    }

    fn on_import(&mut self, node: Node) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "dotted_name" | "identifier" => {
                    self.imports.insert(node_text(child, self.code).to_string());
                }
                "aliased_import" => {
                    if let Some(alias) = child.child_by_field_name("alias") {
                        self.imports.insert(node_text(alias, self.code).to_string());
                    } else if let Some(name) = child.child_by_field_name("name") {
                        self.imports.insert(node_text(name, self.code).to_string());
                    }
                }
                _ => {}
            }
        }
    }

    /// Module-level `name = literal` assignment (§4.1: constant if uppercase,
    /// else variable).
    fn on_expression_statement(&mut self, node: Node, owner: Option<&str>) {
        if owner.is_some() {
            return;
        }
        let Some(expr) = node.child(0) else { return };
        if expr.kind() != "assignment" {
            return;
        }
        let Some(left) = expr.child_by_field_name("left") else {
            return;
        };
        if left.kind() != "identifier" {
            return;
        }
        let Some(right) = expr.child_by_field_name("right") else {
            return;
        };
        if !is_literal(right) {
            return;
        }

        let name = node_text(left, self.code).to_string();
        let defined_at = node.start_position().row as u32 + 1;
        let kind = if name.chars().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
            SymbolKind::Constant
        } else {
            SymbolKind::Variable
        };

        let mut fact = SymbolFact::new(kind, name.clone(), defined_at);
        fact.value = Some(node_text(right, self.code).trim().to_string());
        self.symbols.push((name, fact));
    }

    /// Summarizes raise sites, guard conditions, and loop count for one
    /// function/method body, without descending into nested defs (those
    /// get their own entry when `walk_statement` visits them separately).
    fn control_flow_for_body(&self, body: Node) -> ControlFlowFact {
        let mut fact = ControlFlowFact::default();
        self.collect_control_flow(body, &mut fact);
        fact
    }

    fn collect_control_flow(&self, node: Node, fact: &mut ControlFlowFact) {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            match child.kind() {
                "function_definition" | "class_definition" | "lambda" => continue,
                "raise_statement" => {
                    if let Some(arg) = child.child(1) {
                        fact.raise_sites.push(node_text(arg, self.code).trim().to_string());
                    }
                }
                "if_statement" => {
                    if let Some(cond) = child.child_by_field_name("condition") {
                        fact.guard_conditions
                            .push(node_text(cond, self.code).trim().to_string());
                    }
                    self.collect_control_flow(child, fact);
                    continue;
                }
                "while_statement" => {
                    fact.loop_count += 1;
                    if let Some(cond) = child.child_by_field_name("condition") {
                        fact.guard_conditions
                            .push(node_text(cond, self.code).trim().to_string());
                    }
                    self.collect_control_flow(child, fact);
                    continue;
                }
                "for_statement" => {
                    fact.loop_count += 1;
                    self.collect_control_flow(child, fact);
                    continue;
                }
                _ => {}
            }
            self.collect_control_flow(child, fact);
        }
    }

    /// Second pass: every bare `identifier` read (not a def/target/param
    /// name) that matches a known symbol name records its line in `used_at`.
    fn record_usages(&mut self, root: Node) {
        let mut hits: Vec<(String, u32)> = Vec::new();
        self.find_usages(root, &mut hits);
        for (name, line) in hits {
            if let Some((_, fact)) = self.symbols.iter_mut().find(|(n, _)| *n == name) {
                fact.used_at.insert(line);
            }
        }
    }

    fn find_usages(&self, node: Node, hits: &mut Vec<(String, u32)>) {
        if node.kind() == "identifier" && !is_definition_site(node) {
            let name = node_text(node, self.code).to_string();
            hits.push((name, node.start_position().row as u32 + 1));
        }
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.find_usages(child, hits);
        }
    }
}

fn is_literal(node: Node) -> bool {
    matches!(
        node.kind(),
        "string" | "integer" | "float" | "true" | "false" | "none" | "list" | "tuple" | "dictionary" | "set"
    )
}

/// True when `node` is an identifier acting as a binding site (def name,
/// parameter name, assignment target, import name) rather than a read.
fn is_definition_site(node: Node) -> bool {
    let Some(parent) = node.parent() else {
        return false;
    };
    match parent.kind() {
        "function_definition" | "class_definition" => {
            parent.child_by_field_name("name") == Some(node)
        }
        "parameters" | "typed_parameter" | "default_parameter" | "typed_default_parameter" => true,
        "assignment" => parent.child_by_field_name("left") == Some(node),
        "import_statement" | "import_from_statement" | "aliased_import" | "dotted_name" => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn extract_src(src: &str) -> ModuleFacts {
        let mut tmp = tempfile_py(src);
        let facts = extract(tmp.path()).expect("extraction should succeed");
        tmp.flush_and_keep();
        facts
    }

    struct TempPy {
        path: std::path::PathBuf,
    }
    impl TempPy {
        fn path(&self) -> &Path {
            &self.path
        }
        fn flush_and_keep(&mut self) {}
    }
    impl Drop for TempPy {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn next_id() -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        COUNTER.fetch_add(1, Ordering::Relaxed)
    }

    fn tempfile_py(src: &str) -> TempPy {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "scout_facts_test_{}_{}.py",
            std::process::id(),
            next_id()
        ));
        std::fs::write(&path, src).expect("write temp py file");
        TempPy { path }
    }

    #[test]
    fn extracts_function_and_constant() {
        let facts = extract_src("MAX_RETRIES = 3\n\n\ndef fetch(url):\n    return url\n");
        assert!(facts.symbol("MAX_RETRIES").is_some());
        assert_eq!(facts.symbol("MAX_RETRIES").unwrap().kind, SymbolKind::Constant);
        let f = facts.symbol("fetch").expect("fetch present");
        assert_eq!(f.kind, SymbolKind::Function);
        assert_eq!(f.defined_at, 4);
    }

    #[test]
    fn records_usage_line_for_module_level_name() {
        let facts = extract_src("TIMEOUT = 30\n\n\ndef run():\n    return TIMEOUT\n");
        let fact = facts.symbol("TIMEOUT").unwrap();
        assert!(fact.used_at.contains(&5));
    }

    #[test]
    fn methods_get_parent_and_class_gets_symbol() {
        let facts = extract_src("class Widget:\n    def render(self):\n        pass\n");
        assert!(facts.symbol("Widget").is_some());
        let method = facts.symbol("render").unwrap();
        assert_eq!(method.kind, SymbolKind::Method);
        assert_eq!(method.parent.as_deref(), Some("Widget"));
    }

    #[test]
    fn control_flow_counts_loops_and_raises() {
        let facts = extract_src(
            "def process(items):\n    for item in items:\n        if not item:\n            raise ValueError('bad')\n",
        );
        let (_, cf) = facts
            .control_flow
            .iter()
            .find(|(n, _)| n == "process")
            .expect("control flow recorded");
        assert_eq!(cf.loop_count, 1);
        assert_eq!(cf.guard_conditions.len(), 1);
        assert_eq!(cf.raise_sites.len(), 1);
    }

    #[test]
    fn checksum_is_deterministic_across_identical_parses() {
        let src = "def a():\n    pass\n";
        let a = extract_src(src);
        let b = extract_src(src);
        assert_eq!(a.checksum, b.checksum);
    }

    #[test]
    fn syntax_error_is_reported_with_line() {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "scout_facts_bad_{}_{}.py",
            std::process::id(),
            next_id()
        ));
        std::fs::write(&path, "def broken(:\n    pass\n").unwrap();
        let err = extract(&path).unwrap_err();
        let _ = std::fs::remove_file(&path);
        match err {
            ExtractError::ParseError { line, .. } => assert_eq!(line, 1),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_reported() {
        let err = extract(Path::new("/nonexistent/path/to/file.py")).unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound(_)));
    }
}
