//! Glue between the compiler and the outside world: reads sources,
//! runs the parse → emit pipeline, shells out to the system C
//! toolchain, and in evaluate mode loads the freshly linked shared
//! object and runs it in-process.

use std::env;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::common::source::Source;
use crate::common::span::Spanned;
use crate::compiler::ast::Expr;
use crate::compiler::{emit_program, parse_expression, parse_program, Labels};
use crate::error::Error;
use crate::runtime;

/// The system C compiler used to assemble and link.
const CC: &str = "cc";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Dump the generated assembly to standard output.
    pub dump_asm: bool,
    /// Keep temporary files after the run and report their paths.
    pub keep_temps: bool,
}

enum Artifact {
    Executable,
    SharedObject,
}

/// Compiles the program at `input` into a standalone executable at
/// `output`.
pub fn compile_file(input: &Path, output: &Path, settings: &Settings) -> Result<(), Error> {
    let source = Source::path(input)?;
    let ast = parse_program(source)?;
    let asm = translate(&ast, settings)?;
    assemble(&asm, output, Artifact::Executable, settings)
}

/// Compiles `expr` into a temporary shared object, loads it, resolves
/// `runtime_startup`, and calls it. The program's output lands on this
/// process's stdout.
pub fn evaluate(expr: &str, settings: &Settings) -> Result<(), Error> {
    let source = Source::source(expr);
    let ast = parse_expression(source)?;
    let asm = translate(&ast, settings)?;

    let shared = temp_file("junco", ".so")?;
    assemble(&asm, shared.path(), Artifact::SharedObject, settings)?;
    run_shared_object(shared.path())?;

    if settings.keep_temps {
        let path = keep(shared)?;
        println!("kept temporary shared object at `{}`", path.display());
    }
    Ok(())
}

/// Runs the compiler proper. Everything that can go wrong at compile
/// time goes wrong here, before any temporary file exists.
fn translate(ast: &Spanned<Expr>, settings: &Settings) -> Result<String, Error> {
    let mut labels = Labels::new();
    let asm = emit_program(ast, &mut labels)?;
    if settings.dump_asm {
        print!("{}", asm);
    }
    Ok(asm)
}

fn assemble(
    asm: &str,
    output: &Path,
    artifact: Artifact,
    settings: &Settings,
) -> Result<(), Error> {
    let mut asm_file = temp_file("junco", ".s")?;
    asm_file.write_all(asm.as_bytes())?;
    asm_file.flush()?;

    let mut runtime_file = temp_file("junco-runtime", ".c")?;
    runtime_file.write_all(runtime::c_source().as_bytes())?;
    runtime_file.flush()?;

    let mut command = Command::new(CC);
    if let Artifact::SharedObject = artifact {
        command.args(["-shared", "-fPIC"]);
    }
    command
        .arg("-o")
        .arg(output)
        .arg(asm_file.path())
        .arg(runtime_file.path());

    debug!(?command, "invoking the C toolchain");
    let status = command.status()?;
    if !status.success() {
        return Err(Error::Toolchain {
            command: format!("{:?}", command),
            status,
        });
    }

    if settings.keep_temps {
        let asm_path = keep(asm_file)?;
        let runtime_path = keep(runtime_file)?;
        println!("kept temporary assembly at `{}`", asm_path.display());
        println!("kept temporary runtime source at `{}`", runtime_path.display());
    }
    Ok(())
}

fn run_shared_object(path: &Path) -> Result<(), Error> {
    // Calling into freshly compiled machine code can't be checked by
    // the loader; the contract is that the object exports the
    // `runtime_startup` the generated runtime defines.
    unsafe {
        let library =
            libloading::Library::new(path).map_err(|err| Error::Loader(err.to_string()))?;
        let startup: libloading::Symbol<unsafe extern "C" fn()> = library
            .get(b"runtime_startup")
            .map_err(|err| Error::Loader(err.to_string()))?;
        startup();
    }
    Ok(())
}

/// A uniquely named file in the system temporary directory. It goes
/// away when dropped unless [`keep`] persists it first.
fn temp_file(prefix: &str, suffix: &str) -> Result<NamedTempFile, Error> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix)
        .tempfile_in(system_tmpdir())?;
    debug!(path = %file.path().display(), "created temporary file");
    Ok(file)
}

fn keep(file: NamedTempFile) -> Result<PathBuf, Error> {
    let (_file, path) = file.keep().map_err(|err| Error::Io(err.error))?;
    Ok(path)
}

/// `TMPDIR`, `TMP`, `TEMPFILE`, `TEMP`, consulted in that order; the
/// first non-empty one wins, and `/tmp` is the fallback.
fn system_tmpdir() -> PathBuf {
    for var in ["TMPDIR", "TMP", "TEMPFILE", "TEMP"] {
        if let Ok(dir) = env::var(var) {
            if !dir.is_empty() {
                return PathBuf::from(dir);
            }
        }
    }
    PathBuf::from("/tmp")
}
