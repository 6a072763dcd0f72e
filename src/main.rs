use anyhow::Context;
use clap::Parser;
use loxc::{debug, Chunk, Heap};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

const EXIT_COMPILE_ERROR: i32 = 65;
const EXIT_IO_ERROR: i32 = 74;

/// Compile Lox source to bytecode.
#[derive(Parser, Debug)]
#[command(name = "loxc", version, about)]
struct Args {
    /// Source file; starts a REPL when omitted.
    path: Option<PathBuf>,

    /// Print the compiled chunk.
    #[arg(short, long)]
    disassemble: bool,
}

fn compile_and_show(source: &str, name: &str, disassemble: bool) -> bool {
    let mut heap = Heap::new();
    let mut chunk = Chunk::new();
    let ok = loxc::compile(source, &mut chunk, &mut heap).is_ok();
    if ok && disassemble {
        print!("{}", debug::disassemble_chunk(&chunk, &heap, name));
    }
    chunk.free();
    heap.free_objects();
    ok
}

fn run_repl() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let input = match lines.next() {
            Some(line) => line?,
            None => {
                println!();
                return Ok(());
            }
        };
        compile_and_show(&input, "repl", true);
    }
}

fn run_file(path: &Path, disassemble: bool) -> anyhow::Result<bool> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("could not read file \"{}\"", path.display()))?;
    log::info!("compiling {} ({} bytes)", path.display(), source.len());
    Ok(compile_and_show(&source, &path.display().to_string(), disassemble))
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    match args.path {
        None => {
            if let Err(err) = run_repl() {
                eprintln!("{:#}", err);
                std::process::exit(EXIT_IO_ERROR);
            }
        }
        Some(ref path) => match run_file(path, args.disassemble) {
            Ok(true) => {}
            Ok(false) => std::process::exit(EXIT_COMPILE_ERROR),
            Err(err) => {
                eprintln!("{:#}", err);
                std::process::exit(EXIT_IO_ERROR);
            }
        },
    }
}
