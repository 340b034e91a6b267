//! Harness Generation
//!
//! The harness is a small ES module written into the call's workspace. It
//! loads the user script with the loader chosen up front, picks the entry
//! point from [`ENTRY_STRATEGIES`], awaits it with `(content, options)` and
//! prints the JSON result as the only line on stdout. Everything the script
//! prints itself is moved to stderr behind [`LOG_TAG`].

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

/// Prefix of stderr lines that carry script diagnostics rather than errors.
pub const LOG_TAG: &str = "[fileflow:log]";

/// Printed on stderr alongside [`NO_ENTRY_EXIT_CODE`] when no entry resolves.
pub const NO_ENTRY_MARKER: &str = "[fileflow:no-entry]";

/// Exit code the harness uses when no entry point resolves.
pub const NO_ENTRY_EXIT_CODE: i32 = 3;

/// File names inside the workspace.
pub const CONTENT_FILE: &str = "content.json";
pub const OPTIONS_FILE: &str = "options.json";
pub const HARNESS_FILE: &str = "harness.mjs";

/// How the harness loads the user script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoaderKind {
    /// `await import(url)`
    EsModule,
    /// `createRequire(...)(path)`
    CommonJs,
}

static ESM_SYNTAX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(export\s+(default\b|const\b|let\b|var\b|function\b|async\b|class\b|\{|\*)|import\s+[\w*{][^;]*\bfrom\s+['\x22]|import\s+['\x22])")
        .expect("module syntax pattern is valid")
});

impl LoaderKind {
    /// Decides the loader from the file extension and, for `.js`, from a
    /// scan of the source for top-level `import`/`export` statements.
    pub fn detect(script: &Path, source: &str) -> Self {
        let extension = script
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("mjs") => LoaderKind::EsModule,
            Some("cjs") => LoaderKind::CommonJs,
            _ if ESM_SYNTAX.is_match(source) => LoaderKind::EsModule,
            _ => LoaderKind::CommonJs,
        }
    }

    fn load_expression(&self) -> &'static str {
        match self {
            LoaderKind::EsModule => "await import(pathToFileURL(scriptPath).href)",
            LoaderKind::CommonJs => "nodeModule.createRequire(import.meta.url)(scriptPath)",
        }
    }

    /// True when Node would not pick the ES module format on its own, so
    /// the harness has to pin it with a load hook.
    pub fn needs_format_hook(&self, script: &Path) -> bool {
        let is_mjs = script
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("mjs"));
        *self == LoaderKind::EsModule && !is_mjs
    }
}

/// Load hook that serves the user script as an ES module regardless of
/// `package.json` `type` or the runtime's syntax detection.
const MODULE_FORMAT_HOOK: &str = r#"import { readFile } from 'node:fs/promises';
import { fileURLToPath } from 'node:url';

let target;
export async function initialize(data) { target = data.url; }
export async function load(url, context, nextLoad) {
  if (url !== target) return nextLoad(url, context);
  const source = await readFile(fileURLToPath(url));
  return { format: 'module', source, shortCircuit: true };
}
"#;

/// One way of finding the callable inside a loaded module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStrategy {
    /// Shown in diagnostics when nothing resolves
    pub name: &'static str,
    /// Property to read from the module, or `None` for the module itself
    pub property: Option<&'static str>,
}

impl EntryStrategy {
    fn extractor(&self) -> String {
        match self.property {
            Some(property) => format!(
                "(m) => (m == null ? undefined : m[{}])",
                js_string(property)
            ),
            None => "(m) => m".to_string(),
        }
    }
}

/// Entry-point strategies, tried in order. The first candidate that is a
/// function wins.
pub const ENTRY_STRATEGIES: &[EntryStrategy] = &[
    EntryStrategy {
        name: "default export",
        property: Some("default"),
    },
    EntryStrategy {
        name: "named export 'step1'",
        property: Some("step1"),
    },
    EntryStrategy {
        name: "module value",
        property: None,
    },
];

/// Comma separated strategy names, used in error messages.
pub fn strategy_names() -> String {
    ENTRY_STRATEGIES
        .iter()
        .map(|strategy| strategy.name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Encodes a string as a JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

/// Renders the harness source for `script`.
pub fn render_harness(script: &Path, workspace: &Path, loader: LoaderKind) -> String {
    let strategies = ENTRY_STRATEGIES
        .iter()
        .map(|strategy| {
            format!(
                "  {{ name: {}, extract: {} }},",
                js_string(strategy.name),
                strategy.extractor()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"import {{ readFileSync }} from 'node:fs';
import * as nodeModule from 'node:module';
import {{ join }} from 'node:path';
import {{ pathToFileURL }} from 'node:url';
import {{ format }} from 'node:util';

const LOG_TAG = {log_tag};
const scriptPath = {script};
const workspace = {workspace};
const writeResult = process.stdout.write.bind(process.stdout);
const writeDiagnostic = process.stderr.write.bind(process.stderr);

const emit = (level, text) => {{
  for (const line of String(text).split(/\r?\n/)) {{
    if (line.length > 0) writeDiagnostic(`${{LOG_TAG}} ${{level}} ${{line}}\n`);
  }}
}};

for (const level of ['log', 'info', 'warn', 'error', 'debug', 'trace']) {{
  console[level] = (...args) => emit(level, format(...args));
}}
process.stdout.write = (chunk, encoding, callback) => {{
  emit('log', Buffer.isBuffer(chunk) ? chunk.toString() : chunk);
  if (typeof encoding === 'function') encoding();
  else if (typeof callback === 'function') callback();
  return true;
}};

const strategies = [
{strategies}
];

const pinModuleFormat = () => {{
  if (typeof nodeModule.register !== 'function') {{
    emit('warn', `runtime ${{process.version}} cannot pin the ES module format`);
    return;
  }}
  const hook = `data:text/javascript,${{encodeURIComponent({format_hook})}}`;
  nodeModule.register(hook, import.meta.url, {{
    data: {{ url: pathToFileURL(scriptPath).href }},
  }});
}};

const main = async () => {{
  const content = JSON.parse(readFileSync(join(workspace, {content_file}), 'utf8'));
  const options = JSON.parse(readFileSync(join(workspace, {options_file}), 'utf8'));
  if ({pin_format}) pinModuleFormat();
  const mod = {load};

  let entry;
  for (const strategy of strategies) {{
    const candidate = strategy.extract(mod);
    if (typeof candidate === 'function') {{
      entry = candidate;
      break;
    }}
  }}

  if (entry === undefined) {{
    writeDiagnostic(`{marker} tried: ${{strategies.map((s) => s.name).join(', ')}}\n`);
    process.exitCode = {no_entry};
    return;
  }}

  const result = await entry(content, options);
  const json = JSON.stringify(result === undefined ? null : result);
  writeResult(`${{json === undefined ? 'null' : json}}\n`);
}};

main().catch((err) => {{
  writeDiagnostic(`${{(err && err.stack) || String(err)}}\n`);
  process.exitCode = 1;
}});
"#,
        log_tag = js_string(LOG_TAG),
        script = js_string(&script.to_string_lossy()),
        workspace = js_string(&workspace.to_string_lossy()),
        content_file = js_string(CONTENT_FILE),
        options_file = js_string(OPTIONS_FILE),
        load = loader.load_expression(),
        pin_format = loader.needs_format_hook(script),
        format_hook = js_string(MODULE_FORMAT_HOOK),
        strategies = strategies,
        marker = NO_ENTRY_MARKER,
        no_entry = NO_ENTRY_EXIT_CODE,
    )
}
