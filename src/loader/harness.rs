//! Generated crate root for the extension sidecar.
//!
//! Every accepted file is mounted as its own `#[path]` module named after
//! its file stem, so `taskfiles/shared.rs` is reachable from sibling files
//! as `super::shared`. Stems that are not lowercase identifiers, keywords or
//! repeats fall back to `taskfile_<index>`. The root
//! embeds the manifest and a dispatch table keyed by symbol, and answers two
//! requests on its command line:
//!
//! - `manifest` prints the manifest JSON on stdout
//! - `invoke <symbol> [args...]` runs one command; exit 0 on success, 1 when
//!   the command returned an error, 127 for an unknown symbol, 2 for bad usage

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::manifest::{CommandKind, Manifest, ManifestCommand, ManifestMethod, method_symbol};
use super::{Candidate, LoaderError, SkippedCandidate};
use crate::scanner::Shape;

const PRELUDE: &str = "#![allow(dead_code, unused_imports, unused_variables, unused_mut, \
non_snake_case, non_camel_case_types, non_upper_case_globals)]\n";

const RUNTIME: &str = r#"
trait __TaskforgeOutcome {
    fn __taskforge_outcome(self) -> ::std::result::Result<(), ::std::string::String>;
}

impl __TaskforgeOutcome for () {
    fn __taskforge_outcome(self) -> ::std::result::Result<(), ::std::string::String> {
        Ok(())
    }
}

impl<E: ::std::fmt::Display> __TaskforgeOutcome for ::std::result::Result<(), E> {
    fn __taskforge_outcome(self) -> ::std::result::Result<(), ::std::string::String> {
        self.map_err(|e| e.to_string())
    }
}

fn main() {
    let mut argv = ::std::env::args().skip(1);
    let code = match argv.next().as_deref() {
        Some("manifest") => {
            println!("{}", MANIFEST);
            0
        }
        Some("invoke") => match argv.next() {
            Some(symbol) => match dispatch(&symbol, argv.collect()) {
                Some(Ok(())) => 0,
                Some(Err(message)) => {
                    eprintln!("Error: {}", message);
                    1
                }
                None => {
                    eprintln!("unknown command symbol: {}", symbol);
                    127
                }
            },
            None => {
                eprintln!("usage: invoke <symbol> [args...]");
                2
            }
        },
        _ => {
            eprintln!("usage: manifest | invoke <symbol> [args...]");
            2
        }
    };
    ::std::process::exit(code);
}
"#;

/// Rendered crate root plus the manifest it embeds.
#[derive(Debug)]
pub(crate) struct Harness {
    pub source: String,
    pub manifest: Manifest,
    /// Candidates with a dispatch arm, in source order.
    pub dispatched: Vec<Candidate>,
    /// Candidates left out of the dispatch table, with the reason.
    pub skipped: Vec<SkippedCandidate>,
}

struct NamespaceType {
    module: String,
    unit: bool,
    default: bool,
    entry: usize,
}

const KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
    "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type",
    "unsafe", "use", "where", "while", "abstract", "become", "box", "do", "final", "macro",
    "override", "priv", "typeof", "unsized", "virtual", "yield", "std", "core", "alloc",
];

fn is_module_ident(stem: &str) -> bool {
    let mut chars = stem.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && stem != "_"
        && !KEYWORDS.contains(&stem)
}

/// One module name per file, in order.
fn module_names(files: &[PathBuf]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    files
        .iter()
        .enumerate()
        .map(|(i, file)| {
            let stem = file
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| is_module_ident(s) && !used.contains(*s));
            let mut name = match stem {
                Some(stem) => stem.to_string(),
                None => format!("taskfile_{}", i),
            };
            while !used.insert(name.clone()) {
                name.push('_');
            }
            name
        })
        .collect()
}

pub(crate) fn render(files: &[PathBuf], candidates: &[Candidate]) -> Result<Harness, LoaderError> {
    let names = module_names(files);
    let modules: HashMap<&Path, &str> = files
        .iter()
        .map(PathBuf::as_path)
        .zip(names.iter().map(String::as_str))
        .collect();

    let mut skipped = Vec::new();
    let mut accepted: Vec<(&Candidate, &str)> = Vec::new();
    let mut seen: HashMap<String, &Candidate> = HashMap::new();

    for candidate in candidates {
        if let Shape::Unsupported(reason) = &candidate.info.shape {
            skipped.push(SkippedCandidate::new(candidate, reason.clone()));
            continue;
        }
        let Some(module) = modules.get(candidate.file.as_path()) else {
            skipped.push(SkippedCandidate::new(
                candidate,
                "source file is not part of the extension set",
            ));
            continue;
        };
        let full_name = candidate.info.full_name();
        if let Some(first) = seen.get(&full_name) {
            skipped.push(SkippedCandidate::new(
                candidate,
                format!(
                    "duplicate of '{}' declared at {}:{}",
                    full_name,
                    first.file.display(),
                    first.info.line
                ),
            ));
            continue;
        }
        seen.insert(full_name, candidate);
        accepted.push((candidate, *module));
    }

    let mut manifest = Manifest::default();
    let mut types: HashMap<&str, NamespaceType> = HashMap::new();
    for (candidate, module) in &accepted {
        if let Shape::Type { unit, default } = candidate.info.shape {
            types.insert(
                candidate.info.name.as_str(),
                NamespaceType {
                    module: module.to_string(),
                    unit,
                    default,
                    entry: manifest.commands.len(),
                },
            );
            manifest.commands.push(ManifestCommand {
                symbol: candidate.info.name.clone(),
                kind: CommandKind::Namespace,
                description: candidate.info.description.clone(),
                methods: Vec::new(),
            });
        }
    }

    let mut arms = Vec::new();
    let mut dispatched = Vec::new();
    for (candidate, module) in &accepted {
        let info = &candidate.info;
        match info.shape {
            Shape::Unit if info.is_method() => {
                let Some(ty) = types.get(info.namespace.as_str()) else {
                    skipped.push(SkippedCandidate::new(
                        candidate,
                        format!("`{}` is not an exported namespace type", info.namespace),
                    ));
                    continue;
                };
                if !ty.unit && !ty.default {
                    skipped.push(SkippedCandidate::new(
                        candidate,
                        format!("namespace type `{}` does not implement Default", info.namespace),
                    ));
                    continue;
                }
                let construct = if ty.unit {
                    format!("{}::{}", ty.module, info.namespace)
                } else {
                    format!(
                        "<{}::{} as ::core::default::Default>::default()",
                        ty.module, info.namespace
                    )
                };
                arms.push(format!(
                    "        {:?} => {{ let mut __ns = {}; __ns.{}().__taskforge_outcome() }}",
                    method_symbol(&info.namespace, &info.method),
                    construct,
                    info.method
                ));
                manifest.commands[ty.entry].methods.push(ManifestMethod {
                    name: info.method.clone(),
                    description: info.description.clone(),
                });
                dispatched.push((*candidate).clone());
            }
            Shape::Unit => {
                arms.push(format!(
                    "        {:?} => {}::{}().__taskforge_outcome(),",
                    info.name, module, info.name
                ));
                manifest.commands.push(flat_entry(candidate, CommandKind::Func));
                dispatched.push((*candidate).clone());
            }
            Shape::Variadic { borrowed } => {
                let pass = if borrowed { "&args" } else { "args" };
                arms.push(format!(
                    "        {:?} => {}::{}({}).__taskforge_outcome(),",
                    info.name, module, info.name, pass
                ));
                manifest.commands.push(flat_entry(candidate, CommandKind::Args));
                dispatched.push((*candidate).clone());
            }
            Shape::Type { .. } | Shape::Unsupported(_) => {}
        }
    }

    manifest.commands.retain(|cmd| {
        let keep = cmd.kind != CommandKind::Namespace || !cmd.methods.is_empty();
        if !keep {
            tracing::debug!(symbol = %cmd.symbol, "Namespace type has no public methods");
        }
        keep
    });

    let source = assemble(files, &names, &manifest, &arms)?;
    Ok(Harness {
        source,
        manifest,
        dispatched,
        skipped,
    })
}

fn flat_entry(candidate: &Candidate, kind: CommandKind) -> ManifestCommand {
    ManifestCommand {
        symbol: candidate.info.name.clone(),
        kind,
        description: candidate.info.description.clone(),
        methods: Vec::new(),
    }
}

fn assemble(
    files: &[PathBuf],
    modules: &[String],
    manifest: &Manifest,
    arms: &[String],
) -> Result<String, LoaderError> {
    let mut out = String::from(PRELUDE);
    out.push('\n');
    for (file, module) in files.iter().zip(modules) {
        out.push_str(&format!(
            "#[path = {:?}]\nmod {};\n",
            file.to_string_lossy(),
            module
        ));
    }
    out.push_str(&format!(
        "\nconst MANIFEST: &str = {:?};\n",
        manifest.to_json()?
    ));
    out.push_str(RUNTIME);
    out.push_str(
        "\nfn dispatch(symbol: &str, args: Vec<String>) -> Option<Result<(), String>> {\n    \
         let outcome = match symbol {\n",
    );
    for arm in arms {
        out.push_str(arm);
        out.push('\n');
    }
    out.push_str("        _ => return None,\n    };\n    Some(outcome)\n}\n");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::CommandInfo;

    fn candidate(file: &str, info: CommandInfo, line: usize) -> Candidate {
        Candidate {
            info: CommandInfo { line, ..info },
            file: PathBuf::from(file),
        }
    }

    #[test]
    fn test_render_dispatch_table() {
        let files = vec![PathBuf::from("/p/taskfiles/deploy.rs"), PathBuf::from("/p/taskfiles/ci.rs")];
        let candidates = vec![
            candidate("/p/taskfiles/deploy.rs", CommandInfo::flat("Deploy", Shape::Unit), 2),
            candidate(
                "/p/taskfiles/deploy.rs",
                CommandInfo::flat("Release", Shape::Variadic { borrowed: true }),
                6,
            ),
            candidate("/p/taskfiles/ci.rs", CommandInfo::method("Pipeline", "CI", Shape::Unit), 4),
            candidate(
                "/p/taskfiles/ci.rs",
                CommandInfo::namespace_type("Pipeline", Shape::Type { unit: true, default: false }),
                1,
            ),
            candidate(
                "/p/taskfiles/ci.rs",
                CommandInfo::namespace_type("Config", Shape::Type { unit: false, default: true }),
                9,
            ),
            candidate("/p/taskfiles/ci.rs", CommandInfo::method("Config", "show", Shape::Unit), 12),
        ];

        let harness = render(&files, &candidates).unwrap();
        assert!(harness.skipped.is_empty());
        assert_eq!(harness.dispatched.len(), 4);

        let src = &harness.source;
        assert!(src.contains("#[path = \"/p/taskfiles/deploy.rs\"]\nmod deploy;"));
        assert!(src.contains("#[path = \"/p/taskfiles/ci.rs\"]\nmod ci;"));
        assert!(src.contains("\"Deploy\" => deploy::Deploy().__taskforge_outcome(),"));
        assert!(src.contains("\"Release\" => deploy::Release(&args)"));
        assert!(src.contains("let mut __ns = ci::Pipeline; __ns.CI()"));
        assert!(src.contains("<ci::Config as ::core::default::Default>::default()"));

        let symbols: Vec<&str> = harness
            .manifest
            .commands
            .iter()
            .map(|c| c.symbol.as_str())
            .collect();
        assert_eq!(symbols, vec!["Pipeline", "Config", "Deploy", "Release"]);
        assert_eq!(harness.manifest.find("Pipeline").unwrap().methods[0].name, "CI");
        assert_eq!(harness.manifest.find("Release").unwrap().kind, CommandKind::Args);
    }

    #[test]
    fn test_render_skips_bad_candidates() {
        let files = vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")];
        let candidates = vec![
            candidate("a.rs", CommandInfo::flat("build", Shape::Unit), 1),
            candidate("b.rs", CommandInfo::flat("Build", Shape::Unit), 3),
            candidate(
                "a.rs",
                CommandInfo::flat("fetch", Shape::Unsupported("`async` functions are not supported".into())),
                5,
            ),
            candidate("a.rs", CommandInfo::method("Hidden", "run", Shape::Unit), 8),
            candidate("c.rs", CommandInfo::flat("stray", Shape::Unit), 1),
            candidate(
                "a.rs",
                CommandInfo::namespace_type("Empty", Shape::Type { unit: true, default: false }),
                10,
            ),
        ];

        let harness = render(&files, &candidates).unwrap();
        let reasons: Vec<(&str, &str)> = harness
            .skipped
            .iter()
            .map(|s| (s.name.as_str(), s.reason.as_str()))
            .collect();
        assert_eq!(reasons.len(), 4);
        assert!(reasons[0].0 == "build" && reasons[0].1.starts_with("duplicate of 'build' declared at a.rs:1"));
        assert!(reasons[1].1.contains("async"));
        assert!(reasons[2].1.contains("not part of the extension set"));
        assert_eq!(reasons[3].0, "hidden:run");

        // A type with no methods produces no commands.
        assert!(harness.manifest.find("Empty").is_none());
        assert_eq!(harness.manifest.commands.len(), 1);
    }

    #[test]
    fn test_render_skips_methods_without_default() {
        let files = vec![PathBuf::from("/p/taskfile.rs")];
        let candidates = vec![
            candidate("/p/taskfile.rs", CommandInfo::flat("deploy", Shape::Unit), 1),
            candidate(
                "/p/taskfile.rs",
                CommandInfo::namespace_type("Settings", Shape::Type { unit: false, default: false }),
                3,
            ),
            candidate("/p/taskfile.rs", CommandInfo::method("Settings", "show", Shape::Unit), 6),
        ];

        let harness = render(&files, &candidates).unwrap();
        assert_eq!(harness.skipped.len(), 1);
        assert_eq!(harness.skipped[0].name, "settings:show");
        assert_eq!(
            harness.skipped[0].reason,
            "namespace type `Settings` does not implement Default"
        );
        assert!(!harness.source.contains("Settings"));
        assert!(harness.source.contains("\"deploy\" => taskfile::deploy().__taskforge_outcome(),"));
        assert_eq!(harness.dispatched.len(), 1);
        assert!(harness.manifest.find("Settings").is_none());
    }

    #[test]
    fn test_module_names_follow_file_stems() {
        let files: Vec<PathBuf> = [
            "/p/taskfiles/shared.rs",
            "/p/taskfiles/release-notes.rs",
            "/p/taskfiles/nested/shared.rs",
            "/p/taskfiles/type.rs",
            "/p/taskfiles/Vec.rs",
            "/p/taskfiles/taskfile_6.rs",
            "/p/taskfiles/7.rs",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect();

        assert_eq!(
            module_names(&files),
            vec![
                "shared",
                "taskfile_1",
                "taskfile_2",
                "taskfile_3",
                "taskfile_4",
                "taskfile_6",
                "taskfile_6_",
            ]
        );
    }

    #[test]
    fn test_empty_harness_still_renders() {
        let harness = render(&[], &[]).unwrap();
        assert!(harness.manifest.is_empty());
        assert!(harness.source.contains("_ => return None,"));
        assert!(harness.source.contains("const MANIFEST: &str = \"{\\\"version\\\":1,\\\"commands\\\":[]}\";"));
    }
}
