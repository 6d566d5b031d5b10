//! Runtime module assembly.
//!
//! Builds the ordered list of statement blocks constituting the page
//! runtime: the fixed dependency declarations, a `run(window, document)`
//! function interleaving inline bodies and cached-module invocations in
//! original declaration order, and the verbatim page-declaration
//! template appended at the end.

/// Simulated-DOM adapter capabilities loaded by the runtime.
pub const ADAPTER_CAPABILITIES: [&str; 5] = ["Window", "Document", "cache", "tool", "Event"];

/// Page-declaration template appended verbatim to every runtime.
pub const PAGE_TEMPLATE: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/templates/page.js.tmpl"
));

/// Assembles the page runtime text block by block.
///
/// Blocks are emitted in exactly the order they are pushed; the original
/// page's behavior may depend on script execution sequence.
pub struct RuntimeBuilder {
    blocks: Vec<String>,
    indent: String,
}

impl RuntimeBuilder {
    /// Seeds the builder with the dependency declarations, the page-key
    /// constant, the `run` opening, and the `global` shadow binding.
    ///
    /// The shadow starts as null so a sandboxed script cannot reach the
    /// host's true global scope through that name before an outer script
    /// reassigns it.
    pub fn new(entry_key: &str, indent: &str) -> Self {
        let blocks = vec![
            dependency_block(),
            format!("const pageKey = '{entry_key}';\nconst run = function(window, document) {{"),
            format!("{indent}const global = null;"),
        ];

        Self {
            blocks,
            indent: indent.to_string(),
        }
    }

    /// Appends an adjusted inline script body.
    pub fn push_inline(&mut self, adjusted: &str) {
        self.blocks
            .push(format!("{}/* inline script */\n{adjusted}", self.indent));
    }

    /// Appends an invocation of a cached external-script module.
    pub fn push_outer(&mut self, src: &str, filename: &str) {
        self.blocks.push(format!(
            "{indent}/* outer script: {src} */\n{indent}require('../../common/js/{filename}')(window, document);",
            indent = self.indent
        ));
    }

    /// Closes `run`, appends the page-declaration template, and joins the
    /// blocks into the final runtime text.
    pub fn finish(mut self) -> String {
        self.blocks.push("};".to_string());
        self.blocks.push(PAGE_TEMPLATE.to_string());
        self.blocks.join("\n\n")
    }
}

fn dependency_block() -> String {
    let capabilities: Vec<String> = ADAPTER_CAPABILITIES
        .iter()
        .map(|name| format!("const {name} = load('{name}');"))
        .collect();

    [
        "const ast = require('./ast');".to_string(),
        "const config = require('../../config');".to_string(),
        "const initGlobalVar = require('../../common/js/init-global-var');".to_string(),
        "const initDocumentVar = require('../../common/js/init-document-var');".to_string(),
        "const load = require('../../adapter/index');\n".to_string(),
        capabilities.join("\n"),
    ]
    .join("\n")
}
