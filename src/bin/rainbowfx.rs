use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use rainbowfx::{EffectOpts, OutputSize, Palette, render_effect};

#[derive(Parser, Debug)]
#[command(name = "rainbowfx", version, about = "Add an animated rainbow effect to an image")]
struct Cli {
    /// Path to the input image file.
    input_file: PathBuf,

    /// Output file path; the extension selects the container (.gif or .mp4).
    output_file: PathBuf,

    /// FPS of the output.
    #[arg(short, long, default_value_t = 60.0)]
    speed: f64,

    /// Output duration in seconds.
    #[arg(short, long, default_value_t = 10.0)]
    duration: f64,

    /// Output size: WIDTHxHEIGHT, or a scale factor from the input image.
    #[arg(short, long, default_value = "1.0")]
    output_size: OutputSize,

    /// Meme text to add across the top of the output.
    #[arg(short = 't', long, default_value = "")]
    meme_text: String,

    /// Built-in color scheme.
    #[arg(long, value_enum, default_value_t = SchemeChoice::PartyParrot)]
    scheme: SchemeChoice,

    /// Custom palette JSON file: an ordered array of "#RRGGBB" strings or
    /// [b, g, r] triples. Overrides --scheme.
    #[arg(long)]
    palette: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SchemeChoice {
    /// 6-color spectrum.
    Rainbow,
    /// 9-color pastel scheme.
    PartyParrot,
    /// Red, white and blue.
    Patriotic,
}

impl SchemeChoice {
    fn palette(self) -> Palette {
        match self {
            Self::Rainbow => Palette::six_color_rainbow(),
            Self::PartyParrot => Palette::party_parrot(),
            Self::Patriotic => Palette::patriotic(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let palette = match &cli.palette {
        Some(path) => Palette::from_json_file(path)?,
        None => cli.scheme.palette(),
    };

    let opts = EffectOpts {
        output_size: cli.output_size,
        speed: cli.speed,
        duration: cli.duration,
        palette,
        caption: cli.meme_text,
    };
    render_effect(&cli.input_file, &cli.output_file, &opts)?;

    eprintln!("wrote {}", cli.output_file.display());
    Ok(())
}
