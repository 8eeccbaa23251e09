use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lzs_rs::*;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Compress
    C,
    /// Decompress
    D,
}

#[derive(Parser, Debug)]
#[command(name = "lzs-demo")]
#[command(version)]
#[command(about = "Compress or decompress a file with LZS", long_about = None)]
struct Args {
    mode: Mode,

    input: PathBuf,

    output: PathBuf,

    /// Output buffer size for decompression (grows as needed if unset)
    #[arg(long)]
    capacity: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let inp = std::fs::read(&args.input)?;
    let outp = match args.mode {
        Mode::C => compress_to_vec(&inp)?,
        Mode::D => match args.capacity {
            Some(capacity) => {
                let mut buf = vec![0u8; capacity];
                let len = decompress(&inp, &mut buf)?;
                buf.truncate(len);
                buf
            }
            None => decompress_to_vec(&inp, None)?,
        },
    };

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        input_len = inp.len(),
        output_len = outp.len(),
        "done"
    );

    let mut outp_f = BufWriter::new(File::create(&args.output)?);
    outp_f.write_all(&outp)?;
    outp_f.flush()?;

    Ok(())
}
