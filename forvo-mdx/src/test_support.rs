//! Test doubles and workspace fixtures for driving builds without network or tools.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow, bail};
use serde_json::json;
use tempfile::TempDir;

use crate::core::locale::LocaleCode;
use crate::io::config::BuildConfig;
use crate::io::paths::ArtifactPaths;
use crate::io::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::io::prompt::Prompter;
use crate::io::toolchain::{ToolLocator, venv_executable};
use crate::pipeline::{BuildContext, Services};

/// Reduced mledoze/countries dataset served for the countries URL.
pub const COUNTRIES_JSON: &str = r#"[
  {"cca2": "ES", "cca3": "ESP", "name": {"common": "Spain", "official": "Kingdom of Spain"},
   "altSpellings": ["ES", "España"],
   "translations": {"spa": {"common": "España", "official": "Reino de España"}}},
  {"cca2": "MX", "cca3": "MEX", "name": {"common": "Mexico", "official": "United Mexican States"},
   "altSpellings": ["MX", "México"], "translations": {}},
  {"cca2": "US", "cca3": "USA", "name": {"common": "United States", "official": "United States of America"},
   "altSpellings": ["US", "USA"], "translations": {}}
]"#;

/// Circle flag served for every flag URL.
pub const FLAG_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="512" height="512" viewBox="0 0 512 512"><mask id="m"><circle cx="256" cy="256" r="256" fill="#fff"/></mask><g mask="url(#m)"><path fill="#ffda44" d="M0 0h512v512H0z"/></g></svg>"##;

/// Resolves only the listed programs, to `/fake/bin/<name>`.
pub struct StaticLocator {
    known: Vec<String>,
}

impl StaticLocator {
    pub fn new(programs: &[&str]) -> Self {
        Self {
            known: programs.iter().map(|p| p.to_string()).collect(),
        }
    }
}

impl ToolLocator for StaticLocator {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.known
            .iter()
            .any(|known| known == program)
            .then(|| Path::new("/fake/bin").join(program))
    }
}

/// Answers questions from a fixed script and records what was asked.
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.borrow().clone()
    }

    pub fn assert_drained(&self) -> Result<()> {
        let left = self.answers.borrow();
        if !left.is_empty() {
            bail!("unused scripted answers: {:?}", *left);
        }
        Ok(())
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> Result<String> {
        self.asked.borrow_mut().push(question.to_string());
        self.answers
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for: {question}"))
    }
}

/// Emulates the external tools a build spawns and records every call.
///
/// - `curl`: writes [`COUNTRIES_JSON`] or [`FLAG_SVG`] to the `-o` path;
/// - `python3 -c ...`: succeeds;
/// - `python3 -m venv <dir>`: creates `python` and `mdict` in the environment;
/// - `python -m pip ...`: succeeds;
/// - `mdict ... <out>`: writes a placeholder to `<out>`.
///
/// Anything else exits with 127.
#[derive(Default)]
pub struct FakeCommandRunner {
    calls: RefCell<Vec<CommandSpec>>,
    failing_urls: Vec<String>,
    failing_programs: Vec<String>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make downloads whose URL contains `pattern` fail like `curl -f` on a 404.
    pub fn fail_urls_containing(mut self, pattern: &str) -> Self {
        self.failing_urls.push(pattern.to_string());
        self
    }

    /// Make every invocation of `program` exit with status 1.
    pub fn fail_program(mut self, program: &str) -> Self {
        self.failing_programs.push(program.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.borrow().clone()
    }

    /// Names of the programs called, in order.
    pub fn programs(&self) -> Vec<String> {
        self.calls.borrow().iter().map(CommandSpec::program_name).collect()
    }

    fn curl(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let url = last_arg(spec)?;
        if self.failing_urls.iter().any(|pattern| url.contains(pattern)) {
            return Ok(failure(22, "curl: (22) The requested URL returned error: 404"));
        }
        let dest = spec
            .arg_after("-o")
            .ok_or_else(|| anyhow!("curl called without -o"))?;
        let body = if url.ends_with(".svg") {
            FLAG_SVG
        } else {
            COUNTRIES_JSON
        };
        fs::write(spec.workdir.join(dest), body)?;
        Ok(success())
    }

    fn python(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        if spec.arg_after("-m").is_some_and(|module| module == "venv") {
            let env_dir = spec.workdir.join(last_arg(spec)?);
            for program in ["python", "mdict"] {
                let exe = venv_executable(&env_dir, program);
                if let Some(parent) = exe.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(exe, "")?;
            }
        }
        Ok(success())
    }

    fn mdict(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let out = spec.workdir.join(last_arg(spec)?);
        fs::write(out, "compiled")?;
        Ok(success())
    }
}

impl CommandRunner for FakeCommandRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(spec.clone());
        let name = spec.program_name();
        if self.failing_programs.contains(&name) {
            return Ok(failure(1, &format!("{name}: scripted failure")));
        }
        match name.as_str() {
            "curl" => self.curl(spec),
            "python3" | "python" => self.python(spec),
            "mdict" => self.mdict(spec),
            _ => Ok(failure(127, &format!("{name}: command not found"))),
        }
    }
}

fn last_arg(spec: &CommandSpec) -> Result<String> {
    spec.args
        .last()
        .map(|arg| arg.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} called without arguments", spec.program_name()))
}

fn success() -> CommandOutput {
    CommandOutput {
        exit_code: Some(0),
        ..CommandOutput::default()
    }
}

fn failure(code: i32, stderr: &str) -> CommandOutput {
    CommandOutput {
        exit_code: Some(code),
        stderr: stderr.as_bytes().to_vec(),
        ..CommandOutput::default()
    }
}

/// One metadata line as found in the dump.
pub fn metadata_line(
    language: &str,
    headword: &str,
    origin: [&str; 3],
    votes: i64,
    id: i64,
) -> String {
    json!({
        "language": language,
        "headword": headword,
        "origin": origin,
        "votes": votes,
        "download_url": format!("https://forvo.com/download/{id}"),
        "id": id,
    })
    .to_string()
}

/// Temporary working directory holding a Forvo dump.
pub struct Workspace {
    temp: TempDir,
}

impl Workspace {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp: tempfile::tempdir()?,
        })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    pub fn write_metadata(&self, lines: &[String]) -> Result<()> {
        let mut body = lines.join("\n");
        body.push('\n');
        fs::write(self.path("metadata.jsonl"), body)?;
        Ok(())
    }

    /// Create `<code>/<user>/<word>.<ext>`.
    pub fn add_audio(&self, code: &str, user: &str, word: &str, ext: &str) -> Result<()> {
        let dir = self.root().join(code).join(user);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(format!("{word}.{ext}")), b"audio")?;
        Ok(())
    }

    /// Spanish dump: three speakers from two mapped countries and one
    /// unmapped one, plus noise the build must ignore.
    pub fn spanish() -> Result<Self> {
        let ws = Self::new()?;
        let mut lines = vec![
            metadata_line("es", "hola", ["ana", "Female", "Spain"], 3, 1),
            metadata_line("es", "hola", ["luis", "Male", "Mexico"], 5, 2),
            metadata_line("es", "gracias", ["ana", "Female", "Spain"], 0, 3),
            metadata_line("es", "casa", ["zoe", "Female", "Atlantis"], 1, 4),
            metadata_line("es", "perro", ["ana", "Female", "Spain"], 2, 5),
            metadata_line("en", "hello", ["bob", "Male", "United States"], 9, 6),
        ];
        lines.push(
            json!({
                "language": "es",
                "headword": "adios",
                "query_word": "adi%C3%B3s",
                "origin": ["luis", "Male", "Mexico"],
                "votes": 1,
                "download_url": "https://forvo.com/download/7",
                "id": 7,
            })
            .to_string(),
        );
        lines.push("{not json".to_string());
        ws.write_metadata(&lines)?;

        ws.add_audio("es", "ana", "hola", "mp3")?;
        ws.add_audio("es", "luis", "hola", "opus")?;
        ws.add_audio("es", "ana", "gracias", "ogg")?;
        ws.add_audio("es", "zoe", "casa", "mp3")?;
        ws.add_audio("es", "luis", "adiós", "mp3")?;
        // "perro" has no audio file and is dropped.
        Ok(ws)
    }
}

/// Default config, a fixed locale and fake services rooted at a directory.
///
/// Only `python3` and `curl` are on the fake `PATH`; swap `locator` to
/// change that.
pub struct Harness {
    pub config: BuildConfig,
    pub paths: ArtifactPaths,
    pub locale: LocaleCode,
    pub runner: FakeCommandRunner,
    pub prompter: ScriptedPrompter,
    pub locator: StaticLocator,
}

impl Harness {
    pub fn new(root: &Path, code: &str, answers: &[&str]) -> Result<Self> {
        let config = BuildConfig::default();
        let locale = LocaleCode::parse(code)?;
        let paths = ArtifactPaths::new(root, &locale, &config);
        Ok(Self {
            config,
            paths,
            locale,
            runner: FakeCommandRunner::new(),
            prompter: ScriptedPrompter::new(answers),
            locator: StaticLocator::new(&["python3", "curl"]),
        })
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            runner: &self.runner,
            prompter: &self.prompter,
            locator: &self.locator,
        }
    }

    pub fn context(&self, dry_run: bool) -> BuildContext<'_> {
        BuildContext {
            config: &self.config,
            paths: &self.paths,
            locale: &self.locale,
            dry_run,
            services: self.services(),
        }
    }
}
